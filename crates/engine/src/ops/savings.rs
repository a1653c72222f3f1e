//! Shared savings pools: roster, invitations, deposits and chat.
//!
//! Only `active` members may read a pool or act on it. An invitation is a
//! `savings_members` row in status `invited` plus a notification to the
//! invitee; answering it goes through the notification.

use std::collections::HashMap;

use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    prelude::*, sea_query::Expr,
};

use crate::{
    EngineError, MemberStatus, Notification, NotificationKind, ResultEngine, SavingsAccount,
    SavingsDetail, SavingsMember, SavingsMessage, SavingsPayload, SavingsSummary,
    SavingsTransaction, Tugrik, notifications, savings_accounts, savings_members, savings_messages,
    savings_transactions,
    savings_transactions::DEPOSIT_METHOD,
    users,
    util::{new_id, normalize_email, normalize_optional_text, normalize_required_text, require_positive},
};

use super::{Engine, with_tx};

impl Engine {
    /// Creates a pool; the creator becomes its first active member.
    pub async fn create_savings_account(
        &self,
        user_id: &str,
        name: &str,
    ) -> ResultEngine<SavingsAccount> {
        let name = normalize_required_text(name, "name")?;
        let now = self.now();
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let account = savings_accounts::ActiveModel {
                id: ActiveValue::Set(new_id()),
                name: ActiveValue::Set(name.clone()),
                created_by: ActiveValue::Set(user_id.to_string()),
                created_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;
            savings_members::ActiveModel {
                account_id: ActiveValue::Set(account.id.clone()),
                user_id: ActiveValue::Set(user_id.to_string()),
                status: ActiveValue::Set(MemberStatus::Active.as_str().to_string()),
                joined_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;
            tracing::info!("savings account {} created by {user_id}", account.id);
            Ok(SavingsAccount::from(account))
        })
    }

    /// Invites a user, found by email, into a pool.
    pub async fn add_savings_member(
        &self,
        user_id: &str,
        account_id: &str,
        email: &str,
    ) -> ResultEngine<SavingsMember> {
        let email = normalize_email(email)?;
        let now = self.now();
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let account = self.require_active_saver(&db_tx, account_id, user_id).await?;

            let invitee = users::Entity::find()
                .filter(users::Column::Email.eq(email.clone()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound("User not found".to_string()))?;
            if self
                .savings_membership(&db_tx, account_id, &invitee.id)
                .await?
                .is_some()
            {
                return Err(EngineError::AlreadyExists("Already a member".to_string()));
            }

            let member = savings_members::ActiveModel {
                account_id: ActiveValue::Set(account_id.to_string()),
                user_id: ActiveValue::Set(invitee.id.clone()),
                status: ActiveValue::Set(MemberStatus::Invited.as_str().to_string()),
                joined_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;

            let payload = SavingsPayload {
                account_id: account.id.clone(),
                account_name: account.name.clone(),
                actor_id: user_id.to_string(),
            };
            self.notify(
                &db_tx,
                &invitee.id,
                NotificationKind::SavingsInvite,
                "Savings invitation",
                &format!("You were invited to join \"{}\"", account.name),
                &payload,
            )
            .await?;
            tracing::info!("user {} invited to savings account {account_id}", invitee.id);

            Ok(SavingsMember {
                user_id: member.user_id,
                name: invitee.name,
                email: invitee.email,
                status: MemberStatus::Invited,
                joined_at: member.joined_at,
            })
        })
    }

    /// Accepts the invitation carried by a notification.
    pub async fn accept_invite(
        &self,
        user_id: &str,
        notification_id: &str,
    ) -> ResultEngine<SavingsAccount> {
        self.answer_invite(user_id, notification_id, true).await
    }

    /// Declines the invitation carried by a notification.
    pub async fn reject_invite(
        &self,
        user_id: &str,
        notification_id: &str,
    ) -> ResultEngine<SavingsAccount> {
        self.answer_invite(user_id, notification_id, false).await
    }

    async fn answer_invite(
        &self,
        user_id: &str,
        notification_id: &str,
        accept: bool,
    ) -> ResultEngine<SavingsAccount> {
        with_tx!(self, |db_tx| {
            let user = self.require_user(&db_tx, user_id).await?;
            let model = self
                .require_own_notification(&db_tx, notification_id, user_id)
                .await?;
            let notification = Notification::try_from(model.clone())?;
            let account_id = notification
                .account_id()
                .ok_or_else(|| {
                    EngineError::ValidationFailed(
                        "notification does not reference a savings account".to_string(),
                    )
                })?
                .to_string();
            let account = self.require_savings_account(&db_tx, &account_id).await?;

            let (member, status) = self
                .savings_membership(&db_tx, &account_id, user_id)
                .await?
                .ok_or_else(|| EngineError::NotFound("Invitation not found".to_string()))?;
            let next = status.respond(accept)?;

            let mut active: savings_members::ActiveModel = member.into();
            active.status = ActiveValue::Set(next.as_str().to_string());
            active.update(&db_tx).await?;

            let mut read: notifications::ActiveModel = model.into();
            read.is_read = ActiveValue::Set(true);
            read.update(&db_tx).await?;

            if accept {
                let payload = SavingsPayload {
                    account_id: account.id.clone(),
                    account_name: account.name.clone(),
                    actor_id: user_id.to_string(),
                };
                self.notify(
                    &db_tx,
                    &account.created_by,
                    NotificationKind::SavingsInviteAccepted,
                    "Invitation accepted",
                    &format!("{} joined \"{}\"", user.name, account.name),
                    &payload,
                )
                .await?;
            }
            tracing::info!(
                "user {user_id} {} savings account {account_id}",
                if accept { "joined" } else { "declined" }
            );
            Ok(SavingsAccount::from(account))
        })
    }

    /// Deposits into a pool. Settlement is simulated, the row is final.
    pub async fn add_deposit(
        &self,
        user_id: &str,
        account_id: &str,
        amount: i64,
        note: Option<&str>,
    ) -> ResultEngine<SavingsTransaction> {
        let amount = require_positive(amount, "amount")?;
        let note = normalize_optional_text(note);
        let now = self.now();
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            self.require_active_saver(&db_tx, account_id, user_id).await?;
            let balance = self
                .savings_balance(&db_tx, account_id)
                .await?
                .checked_add(Tugrik::new(amount))
                .ok_or_else(|| {
                    EngineError::ValidationFailed(
                        "deposit would overflow the pool balance".to_string(),
                    )
                })?;
            let model = savings_transactions::ActiveModel {
                id: ActiveValue::Set(new_id()),
                account_id: ActiveValue::Set(account_id.to_string()),
                user_id: ActiveValue::Set(user_id.to_string()),
                amount: ActiveValue::Set(amount),
                method: ActiveValue::Set(DEPOSIT_METHOD.to_string()),
                note: ActiveValue::Set(note.clone()),
                created_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;
            tracing::info!(
                "deposit of {} into savings account {account_id} by {user_id}, balance {balance}",
                Tugrik::new(amount)
            );
            Ok(SavingsTransaction::from(model))
        })
    }

    /// Pool page: balance, roster and deposits (newest first).
    pub async fn savings_account(
        &self,
        user_id: &str,
        account_id: &str,
    ) -> ResultEngine<SavingsDetail> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let account = self.require_active_saver(&db_tx, account_id, user_id).await?;

            let members = savings_members::Entity::find()
                .filter(savings_members::Column::AccountId.eq(account_id.to_string()))
                .order_by_asc(savings_members::Column::JoinedAt)
                .all(&db_tx)
                .await?;
            let people: HashMap<String, users::Model> = users::Entity::find()
                .filter(users::Column::Id.is_in(members.iter().map(|m| m.user_id.clone())))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|u| (u.id.clone(), u))
                .collect();
            let members = members
                .into_iter()
                .map(|m| {
                    let person = people.get(&m.user_id);
                    Ok(SavingsMember {
                        name: person.map(|u| u.name.clone()).unwrap_or_default(),
                        email: person.map(|u| u.email.clone()).unwrap_or_default(),
                        status: MemberStatus::try_from(m.status.as_str())?,
                        user_id: m.user_id,
                        joined_at: m.joined_at,
                    })
                })
                .collect::<ResultEngine<Vec<_>>>()?;

            let transactions: Vec<SavingsTransaction> = savings_transactions::Entity::find()
                .filter(savings_transactions::Column::AccountId.eq(account_id.to_string()))
                .order_by_desc(savings_transactions::Column::CreatedAt)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(SavingsTransaction::from)
                .collect();
            let balance = self.savings_balance(&db_tx, account_id).await?.amount();

            Ok(SavingsDetail {
                account: SavingsAccount::from(account),
                balance,
                members,
                transactions,
            })
        })
    }

    /// Pools the caller is an active member of, with balances.
    pub async fn my_savings_accounts(&self, user_id: &str) -> ResultEngine<Vec<SavingsSummary>> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let account_ids: Vec<String> = savings_members::Entity::find()
                .filter(savings_members::Column::UserId.eq(user_id.to_string()))
                .filter(savings_members::Column::Status.eq(MemberStatus::Active.as_str()))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|m| m.account_id)
                .collect();
            if account_ids.is_empty() {
                return Ok(Vec::new());
            }

            let accounts = savings_accounts::Entity::find()
                .filter(savings_accounts::Column::Id.is_in(account_ids.clone()))
                .order_by_asc(savings_accounts::Column::CreatedAt)
                .all(&db_tx)
                .await?;
            let balances = self.savings_balances(&db_tx, account_ids).await?;

            Ok(accounts
                .into_iter()
                .map(|a| SavingsSummary {
                    balance: balances.get(&a.id).copied().unwrap_or(0),
                    account: SavingsAccount::from(a),
                })
                .collect())
        })
    }

    /// Posts a chat message to a pool.
    pub async fn send_message(
        &self,
        user_id: &str,
        account_id: &str,
        content: &str,
    ) -> ResultEngine<SavingsMessage> {
        let content = normalize_required_text(content, "message")?;
        let now = self.now();
        with_tx!(self, |db_tx| {
            let user = self.require_user(&db_tx, user_id).await?;
            self.require_active_saver(&db_tx, account_id, user_id).await?;
            let model = savings_messages::ActiveModel {
                id: ActiveValue::Set(new_id()),
                account_id: ActiveValue::Set(account_id.to_string()),
                user_id: ActiveValue::Set(user_id.to_string()),
                content: ActiveValue::Set(content.clone()),
                created_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;
            Ok(SavingsMessage {
                id: model.id,
                account_id: model.account_id,
                user_id: model.user_id,
                author_name: user.name,
                content: model.content,
                created_at: model.created_at,
            })
        })
    }

    /// Chat history of a pool, oldest first.
    pub async fn messages(
        &self,
        user_id: &str,
        account_id: &str,
    ) -> ResultEngine<Vec<SavingsMessage>> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            self.require_active_saver(&db_tx, account_id, user_id).await?;
            let rows = savings_messages::Entity::find()
                .filter(savings_messages::Column::AccountId.eq(account_id.to_string()))
                .order_by_asc(savings_messages::Column::CreatedAt)
                .all(&db_tx)
                .await?;
            let authors: HashMap<String, String> = users::Entity::find()
                .filter(users::Column::Id.is_in(rows.iter().map(|m| m.user_id.clone())))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|u| (u.id, u.name))
                .collect();
            Ok(rows
                .into_iter()
                .map(|m| SavingsMessage {
                    author_name: authors.get(&m.user_id).cloned().unwrap_or_default(),
                    id: m.id,
                    account_id: m.account_id,
                    user_id: m.user_id,
                    content: m.content,
                    created_at: m.created_at,
                })
                .collect())
        })
    }

    pub async fn rename_savings_account(
        &self,
        actor_id: &str,
        account_id: &str,
        name: &str,
    ) -> ResultEngine<SavingsAccount> {
        let name = normalize_required_text(name, "name")?;
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, actor_id).await?;
            let model = self.require_savings_account(&db_tx, account_id).await?;
            let mut active: savings_accounts::ActiveModel = model.into();
            active.name = ActiveValue::Set(name.clone());
            let model = active.update(&db_tx).await?;
            Ok(SavingsAccount::from(model))
        })
    }

    /// Admin delete of a pool with its roster, deposits and chat.
    pub async fn delete_savings_account(
        &self,
        actor_id: &str,
        account_id: &str,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, actor_id).await?;
            self.require_savings_account(&db_tx, account_id).await?;
            self.delete_savings_dependents(&db_tx, vec![account_id.to_string()])
                .await?;
            savings_accounts::Entity::delete_by_id(account_id.to_string())
                .exec(&db_tx)
                .await?;
            tracing::info!("savings account {account_id} deleted by {actor_id}");
            Ok(())
        })
    }

    pub(super) async fn delete_savings_dependents(
        &self,
        db: &DatabaseTransaction,
        account_ids: Vec<String>,
    ) -> ResultEngine<()> {
        savings_transactions::Entity::delete_many()
            .filter(savings_transactions::Column::AccountId.is_in(account_ids.clone()))
            .exec(db)
            .await?;
        savings_messages::Entity::delete_many()
            .filter(savings_messages::Column::AccountId.is_in(account_ids.clone()))
            .exec(db)
            .await?;
        savings_members::Entity::delete_many()
            .filter(savings_members::Column::AccountId.is_in(account_ids))
            .exec(db)
            .await?;
        Ok(())
    }

    /// SUM(amount) per account.
    /// Summed deposits of one pool. Deposits are checked on insert, so the
    /// sum always fits.
    async fn savings_balance(
        &self,
        db: &DatabaseTransaction,
        account_id: &str,
    ) -> ResultEngine<Tugrik> {
        let balance = savings_transactions::Entity::find()
            .select_only()
            .column_as(Expr::col(savings_transactions::Column::Amount).sum(), "balance")
            .filter(savings_transactions::Column::AccountId.eq(account_id.to_string()))
            .into_tuple::<Option<i64>>()
            .one(db)
            .await?
            .flatten()
            .unwrap_or(0);
        Ok(Tugrik::new(balance))
    }

    async fn savings_balances(
        &self,
        db: &DatabaseTransaction,
        account_ids: Vec<String>,
    ) -> ResultEngine<HashMap<String, i64>> {
        let rows: Vec<(String, Option<i64>)> = savings_transactions::Entity::find()
            .select_only()
            .column(savings_transactions::Column::AccountId)
            .column_as(Expr::col(savings_transactions::Column::Amount).sum(), "balance")
            .filter(savings_transactions::Column::AccountId.is_in(account_ids))
            .group_by(savings_transactions::Column::AccountId)
            .into_tuple()
            .all(db)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(id, balance)| (id, balance.unwrap_or(0)))
            .collect())
    }
}
