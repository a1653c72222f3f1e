//! Guards shared by every operation.
//!
//! Each public operation starts with [`Engine::require_user`] or
//! [`Engine::require_admin`]; admin-only entry points never check the role
//! themselves.

use sea_orm::{ActiveValue, DatabaseTransaction, QueryFilter, prelude::*, sea_query::OnConflict};

use crate::{
    EngineError, MemberStatus, Month, ResultEngine, group_members, groups, progress, savings_accounts,
    savings_members, users,
    users::Role,
    util::new_id,
};

use super::Engine;

impl Engine {
    /// Resolves the acting user; an unknown id is treated as an absent session.
    pub(super) async fn require_user(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
    ) -> ResultEngine<users::Model> {
        users::Entity::find_by_id(user_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::Unauthorized("unknown user".to_string()))
    }

    /// Resolves the acting user and requires the admin role.
    pub(super) async fn require_admin(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
    ) -> ResultEngine<users::Model> {
        let user = self.require_user(db, user_id).await?;
        if !Role::try_from(user.role.as_str())?.is_admin() {
            tracing::debug!("user {user_id} denied admin operation");
            return Err(EngineError::PermissionDenied(
                "admin role required".to_string(),
            ));
        }
        Ok(user)
    }

    pub(super) async fn require_target_user(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
    ) -> ResultEngine<users::Model> {
        users::Entity::find_by_id(user_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound("User not found".to_string()))
    }

    pub(super) async fn require_group(
        &self,
        db: &DatabaseTransaction,
        group_id: &str,
    ) -> ResultEngine<groups::Model> {
        groups::Entity::find_by_id(group_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound("Group not found".to_string()))
    }

    pub(super) async fn group_membership(
        &self,
        db: &DatabaseTransaction,
        group_id: &str,
        user_id: &str,
    ) -> ResultEngine<Option<group_members::Model>> {
        group_members::Entity::find_by_id((group_id.to_string(), user_id.to_string()))
            .one(db)
            .await
            .map_err(Into::into)
    }

    /// Requires the group to exist and the user to be one of its members.
    pub(super) async fn require_group_member(
        &self,
        db: &DatabaseTransaction,
        group_id: &str,
        user_id: &str,
    ) -> ResultEngine<(groups::Model, group_members::Model)> {
        let group = self.require_group(db, group_id).await?;
        let membership = self
            .group_membership(db, group_id, user_id)
            .await?
            .ok_or_else(|| {
                EngineError::PermissionDenied("not a member of this group".to_string())
            })?;
        Ok((group, membership))
    }

    pub(super) async fn require_savings_account(
        &self,
        db: &DatabaseTransaction,
        account_id: &str,
    ) -> ResultEngine<savings_accounts::Model> {
        savings_accounts::Entity::find_by_id(account_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound("Savings account not found".to_string()))
    }

    pub(super) async fn savings_membership(
        &self,
        db: &DatabaseTransaction,
        account_id: &str,
        user_id: &str,
    ) -> ResultEngine<Option<(savings_members::Model, MemberStatus)>> {
        let row = savings_members::Entity::find_by_id((account_id.to_string(), user_id.to_string()))
            .one(db)
            .await?;
        row.map(|m| {
            let status = MemberStatus::try_from(m.status.as_str())?;
            Ok((m, status))
        })
        .transpose()
    }

    /// Requires the account to exist and the user to be an `active` member.
    pub(super) async fn require_active_saver(
        &self,
        db: &DatabaseTransaction,
        account_id: &str,
        user_id: &str,
    ) -> ResultEngine<savings_accounts::Model> {
        let account = self.require_savings_account(db, account_id).await?;
        match self.savings_membership(db, account_id, user_id).await? {
            Some((_, MemberStatus::Active)) => Ok(account),
            _ => Err(EngineError::PermissionDenied(
                "not a member of this savings account".to_string(),
            )),
        }
    }

    /// Marks `(user, group, month)` as paid, creating the row if needed.
    ///
    /// A single `INSERT .. ON CONFLICT DO UPDATE` on the unique
    /// `(user_id, group_id, month)` index, so concurrent callers cannot create
    /// duplicates. An existing row keeps its note.
    pub(super) async fn mark_progress_paid(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
        group_id: &str,
        month: Month,
        note: &str,
    ) -> ResultEngine<progress::Model> {
        let row = progress::ActiveModel {
            id: ActiveValue::Set(new_id()),
            user_id: ActiveValue::Set(user_id.to_string()),
            group_id: ActiveValue::Set(group_id.to_string()),
            month: ActiveValue::Set(month.to_string()),
            paid: ActiveValue::Set(true),
            note: ActiveValue::Set(Some(note.to_string())),
        };
        progress::Entity::insert(row)
            .on_conflict(
                OnConflict::columns([
                    progress::Column::UserId,
                    progress::Column::GroupId,
                    progress::Column::Month,
                ])
                .update_column(progress::Column::Paid)
                .to_owned(),
            )
            .exec_without_returning(db)
            .await?;

        progress::Entity::find()
            .filter(progress::Column::UserId.eq(user_id.to_string()))
            .filter(progress::Column::GroupId.eq(group_id.to_string()))
            .filter(progress::Column::Month.eq(month.to_string()))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::Internal("progress row missing after upsert".to_string()))
    }
}
