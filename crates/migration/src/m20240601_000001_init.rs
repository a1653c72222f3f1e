//! Initial schema.
//!
//! - `users`: identity and profile
//! - `groups`, `group_members`: rotating contribution groups
//! - `payments`: monthly due submissions
//! - `progress`: one row per (user, group, month)
//! - `savings_accounts`, `savings_members`, `savings_transactions`,
//!   `savings_messages`: shared savings pools
//! - `notifications`: in-app notifications

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Email,
    Name,
    PasswordHash,
    Role,
    LoanCategory,
    BankAccount,
    Stars,
    AvatarUrl,
    CreatedAt,
}

#[derive(Iden)]
enum Groups {
    Table,
    Id,
    Name,
    MonthlyContribution,
    MaxMembers,
    CreatedBy,
    CreatedAt,
}

#[derive(Iden)]
enum GroupMembers {
    Table,
    GroupId,
    UserId,
    RotationOrder,
    JoinedAt,
}

#[derive(Iden)]
enum Payments {
    Table,
    Id,
    UserId,
    GroupId,
    Amount,
    Method,
    Status,
    Note,
    CreatedAt,
}

#[derive(Iden)]
enum Progress {
    Table,
    Id,
    UserId,
    GroupId,
    Month,
    Paid,
    Note,
}

#[derive(Iden)]
enum SavingsAccounts {
    Table,
    Id,
    Name,
    CreatedBy,
    CreatedAt,
}

#[derive(Iden)]
enum SavingsMembers {
    Table,
    AccountId,
    UserId,
    Status,
    JoinedAt,
}

#[derive(Iden)]
enum SavingsTransactions {
    Table,
    Id,
    AccountId,
    UserId,
    Amount,
    Method,
    Note,
    CreatedAt,
}

#[derive(Iden)]
enum SavingsMessages {
    Table,
    Id,
    AccountId,
    UserId,
    Content,
    CreatedAt,
}

#[derive(Iden)]
enum Notifications {
    Table,
    Id,
    UserId,
    Kind,
    Title,
    Message,
    Data,
    IsRead,
    CreatedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Users::Email).string().not_null())
                    .col(ColumnDef::new(Users::Name).string().not_null())
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(
                        ColumnDef::new(Users::Role)
                            .string()
                            .not_null()
                            .default("user"),
                    )
                    .col(ColumnDef::new(Users::LoanCategory).string())
                    .col(ColumnDef::new(Users::BankAccount).string())
                    .col(
                        ColumnDef::new(Users::Stars)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Users::AvatarUrl).string())
                    .col(ColumnDef::new(Users::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-users-email-unique")
                    .table(Users::Table)
                    .col(Users::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Groups
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Groups::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Groups::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Groups::Name).string().not_null())
                    .col(
                        ColumnDef::new(Groups::MonthlyContribution)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Groups::MaxMembers).integer().not_null())
                    .col(ColumnDef::new(Groups::CreatedBy).string())
                    .col(ColumnDef::new(Groups::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-groups-created_by")
                            .from(Groups::Table, Groups::CreatedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-groups-created_by")
                    .table(Groups::Table)
                    .col(Groups::CreatedBy)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Group members
        // ───────────────────────────────────────────────────────────────────
        // Rotation order is not unique: leaving members leave gaps and the
        // order is never recomputed.
        manager
            .create_table(
                Table::create()
                    .table(GroupMembers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(GroupMembers::GroupId).string().not_null())
                    .col(ColumnDef::new(GroupMembers::UserId).string().not_null())
                    .col(
                        ColumnDef::new(GroupMembers::RotationOrder)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(GroupMembers::JoinedAt).timestamp().not_null())
                    .primary_key(
                        Index::create()
                            .col(GroupMembers::GroupId)
                            .col(GroupMembers::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-group_members-group_id")
                            .from(GroupMembers::Table, GroupMembers::GroupId)
                            .to(Groups::Table, Groups::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-group_members-user_id")
                            .from(GroupMembers::Table, GroupMembers::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-group_members-user_id")
                    .table(GroupMembers::Table)
                    .col(GroupMembers::UserId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Payments
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Payments::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Payments::UserId).string().not_null())
                    .col(ColumnDef::new(Payments::GroupId).string().not_null())
                    .col(ColumnDef::new(Payments::Amount).big_integer().not_null())
                    .col(ColumnDef::new(Payments::Method).string().not_null())
                    .col(ColumnDef::new(Payments::Status).string().not_null())
                    .col(ColumnDef::new(Payments::Note).string())
                    .col(ColumnDef::new(Payments::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-payments-user_id")
                            .from(Payments::Table, Payments::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-payments-group_id")
                            .from(Payments::Table, Payments::GroupId)
                            .to(Groups::Table, Groups::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-payments-status-created_at")
                    .table(Payments::Table)
                    .col(Payments::Status)
                    .col(Payments::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-payments-user_id")
                    .table(Payments::Table)
                    .col(Payments::UserId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Progress
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Progress::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Progress::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Progress::UserId).string().not_null())
                    .col(ColumnDef::new(Progress::GroupId).string().not_null())
                    .col(ColumnDef::new(Progress::Month).string().not_null())
                    .col(
                        ColumnDef::new(Progress::Paid)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Progress::Note).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-progress-user_id")
                            .from(Progress::Table, Progress::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-progress-group_id")
                            .from(Progress::Table, Progress::GroupId)
                            .to(Groups::Table, Groups::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Conflict target of the progress upsert.
        manager
            .create_index(
                Index::create()
                    .name("idx-progress-user_id-group_id-month-unique")
                    .table(Progress::Table)
                    .col(Progress::UserId)
                    .col(Progress::GroupId)
                    .col(Progress::Month)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Savings accounts
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(SavingsAccounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SavingsAccounts::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SavingsAccounts::Name).string().not_null())
                    .col(ColumnDef::new(SavingsAccounts::CreatedBy).string().not_null())
                    .col(
                        ColumnDef::new(SavingsAccounts::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-savings_accounts-created_by")
                            .from(SavingsAccounts::Table, SavingsAccounts::CreatedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 7. Savings members
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(SavingsMembers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(SavingsMembers::AccountId).string().not_null())
                    .col(ColumnDef::new(SavingsMembers::UserId).string().not_null())
                    .col(ColumnDef::new(SavingsMembers::Status).string().not_null())
                    .col(
                        ColumnDef::new(SavingsMembers::JoinedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(SavingsMembers::AccountId)
                            .col(SavingsMembers::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-savings_members-account_id")
                            .from(SavingsMembers::Table, SavingsMembers::AccountId)
                            .to(SavingsAccounts::Table, SavingsAccounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-savings_members-user_id")
                            .from(SavingsMembers::Table, SavingsMembers::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-savings_members-user_id")
                    .table(SavingsMembers::Table)
                    .col(SavingsMembers::UserId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 8. Savings transactions (append-only)
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(SavingsTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SavingsTransactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SavingsTransactions::AccountId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SavingsTransactions::UserId).string().not_null())
                    .col(
                        ColumnDef::new(SavingsTransactions::Amount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SavingsTransactions::Method).string().not_null())
                    .col(ColumnDef::new(SavingsTransactions::Note).string())
                    .col(
                        ColumnDef::new(SavingsTransactions::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-savings_transactions-account_id")
                            .from(SavingsTransactions::Table, SavingsTransactions::AccountId)
                            .to(SavingsAccounts::Table, SavingsAccounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-savings_transactions-user_id")
                            .from(SavingsTransactions::Table, SavingsTransactions::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-savings_transactions-account_id")
                    .table(SavingsTransactions::Table)
                    .col(SavingsTransactions::AccountId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 9. Savings messages
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(SavingsMessages::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SavingsMessages::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SavingsMessages::AccountId).string().not_null())
                    .col(ColumnDef::new(SavingsMessages::UserId).string().not_null())
                    .col(ColumnDef::new(SavingsMessages::Content).text().not_null())
                    .col(
                        ColumnDef::new(SavingsMessages::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-savings_messages-account_id")
                            .from(SavingsMessages::Table, SavingsMessages::AccountId)
                            .to(SavingsAccounts::Table, SavingsAccounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-savings_messages-user_id")
                            .from(SavingsMessages::Table, SavingsMessages::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-savings_messages-account_id-created_at")
                    .table(SavingsMessages::Table)
                    .col(SavingsMessages::AccountId)
                    .col(SavingsMessages::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 10. Notifications
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Notifications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Notifications::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Notifications::UserId).string().not_null())
                    .col(ColumnDef::new(Notifications::Kind).string().not_null())
                    .col(ColumnDef::new(Notifications::Title).string().not_null())
                    .col(ColumnDef::new(Notifications::Message).text().not_null())
                    .col(
                        ColumnDef::new(Notifications::Data)
                            .text()
                            .not_null()
                            .default("{}"),
                    )
                    .col(
                        ColumnDef::new(Notifications::IsRead)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Notifications::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-notifications-user_id")
                            .from(Notifications::Table, Notifications::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-notifications-user_id-is_read")
                    .table(Notifications::Table)
                    .col(Notifications::UserId)
                    .col(Notifications::IsRead)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Reverse order of creation (FK dependencies)
        manager
            .drop_table(Table::drop().table(Notifications::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SavingsMessages::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SavingsTransactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SavingsMembers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SavingsAccounts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Progress::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Payments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(GroupMembers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Groups::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
