use std::collections::{HashMap, HashSet};

use sea_orm::{
    ActiveValue, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};

use crate::{
    EngineError, Group, GroupMember, GroupSummary, ResultEngine, Role, group_members, groups,
    payments, progress, users,
    util::{new_id, normalize_required_text, require_positive},
};

use super::{Engine, with_tx};

/// Admin edit of a group. `None` leaves a field untouched.
#[derive(Clone, Debug, Default)]
pub struct GroupUpdate {
    pub name: Option<String>,
    pub monthly_contribution: Option<i64>,
    pub max_members: Option<i32>,
}

fn validate_max_members(max_members: i32) -> ResultEngine<i32> {
    if max_members < 1 {
        return Err(EngineError::ValidationFailed(
            "max_members must be >= 1".to_string(),
        ));
    }
    Ok(max_members)
}

impl Engine {
    /// Creates a rotating group.
    ///
    /// A non-admin may have created at most one group; admins are exempt. The
    /// creator is not joined automatically.
    pub async fn create_group(
        &self,
        user_id: &str,
        name: &str,
        monthly_contribution: i64,
        max_members: i32,
    ) -> ResultEngine<Group> {
        let name = normalize_required_text(name, "name")?;
        let monthly_contribution = require_positive(monthly_contribution, "monthly contribution")?;
        let max_members = validate_max_members(max_members)?;
        let created_at = self.now();

        with_tx!(self, |db_tx| {
            let user = self.require_user(&db_tx, user_id).await?;
            if !Role::try_from(user.role.as_str())?.is_admin() {
                let created = groups::Entity::find()
                    .filter(groups::Column::CreatedBy.eq(user_id.to_string()))
                    .count(&db_tx)
                    .await?;
                if created >= 1 {
                    tracing::debug!("user {user_id} hit the group creation limit");
                    return Err(EngineError::LimitExceeded(
                        "You can only create one group".to_string(),
                    ));
                }
            }

            let model = groups::ActiveModel {
                id: ActiveValue::Set(new_id()),
                name: ActiveValue::Set(name.clone()),
                monthly_contribution: ActiveValue::Set(monthly_contribution),
                max_members: ActiveValue::Set(max_members),
                created_by: ActiveValue::Set(Some(user_id.to_string())),
                created_at: ActiveValue::Set(created_at),
            }
            .insert(&db_tx)
            .await?;
            tracing::info!("group {} created by {user_id}", model.id);
            Ok(Group::from(model))
        })
    }

    /// Joins a group; rotation order is the member count + 1.
    pub async fn join_group(&self, user_id: &str, group_id: &str) -> ResultEngine<GroupMember> {
        let joined_at = self.now();
        with_tx!(self, |db_tx| {
            let user = self.require_user(&db_tx, user_id).await?;
            let group = self.require_group(&db_tx, group_id).await?;

            if self
                .group_membership(&db_tx, group_id, user_id)
                .await?
                .is_some()
            {
                return Err(EngineError::AlreadyExists("Already a member".to_string()));
            }

            let count = group_members::Entity::find()
                .filter(group_members::Column::GroupId.eq(group_id.to_string()))
                .count(&db_tx)
                .await?;
            if count >= u64::try_from(group.max_members).unwrap_or(0) {
                tracing::debug!("user {user_id} rejected from full group {group_id}");
                return Err(EngineError::CapacityExceeded("Group is full".to_string()));
            }
            let rotation_order = i32::try_from(count + 1)
                .map_err(|_| EngineError::Internal("rotation order overflow".to_string()))?;

            let model = group_members::ActiveModel {
                group_id: ActiveValue::Set(group_id.to_string()),
                user_id: ActiveValue::Set(user_id.to_string()),
                rotation_order: ActiveValue::Set(rotation_order),
                joined_at: ActiveValue::Set(joined_at),
            }
            .insert(&db_tx)
            .await?;
            tracing::info!("user {user_id} joined group {group_id} at position {rotation_order}");
            Ok(GroupMember {
                user_id: model.user_id,
                name: user.name,
                rotation_order: model.rotation_order,
                joined_at: model.joined_at,
            })
        })
    }

    /// Leaves a group. Other members keep their rotation order.
    pub async fn leave_group(&self, user_id: &str, group_id: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let (_, membership) = self.require_group_member(&db_tx, group_id, user_id).await?;
            group_members::Entity::delete_by_id((membership.group_id, membership.user_id))
                .exec(&db_tx)
                .await?;
            tracing::info!("user {user_id} left group {group_id}");
            Ok(())
        })
    }

    /// Every group with its member count and whether the caller joined.
    pub async fn list_groups(&self, user_id: &str) -> ResultEngine<Vec<GroupSummary>> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let groups = groups::Entity::find()
                .order_by_asc(groups::Column::CreatedAt)
                .all(&db_tx)
                .await?;
            let memberships = group_members::Entity::find().all(&db_tx).await?;

            let mut counts: HashMap<String, u64> = HashMap::new();
            let mut joined: HashSet<String> = HashSet::new();
            for m in memberships {
                if m.user_id == user_id {
                    joined.insert(m.group_id.clone());
                }
                *counts.entry(m.group_id).or_default() += 1;
            }

            let summaries = groups
                .into_iter()
                .map(|g| GroupSummary {
                    member_count: counts.get(&g.id).copied().unwrap_or(0),
                    joined: joined.contains(&g.id),
                    group: Group::from(g),
                })
                .collect();
            Ok(summaries)
        })
    }

    pub async fn group(&self, user_id: &str, group_id: &str) -> ResultEngine<Group> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let model = self.require_group(&db_tx, group_id).await?;
            Ok(Group::from(model))
        })
    }

    /// Members of a group in rotation order.
    pub async fn group_members(
        &self,
        user_id: &str,
        group_id: &str,
    ) -> ResultEngine<Vec<GroupMember>> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            self.require_group(&db_tx, group_id).await?;
            let rows = group_members::Entity::find()
                .filter(group_members::Column::GroupId.eq(group_id.to_string()))
                .order_by_asc(group_members::Column::RotationOrder)
                .find_also_related(users::Entity)
                .all(&db_tx)
                .await?;
            let members = rows
                .into_iter()
                .map(|(m, user)| GroupMember {
                    name: user.map(|u| u.name).unwrap_or_default(),
                    user_id: m.user_id,
                    rotation_order: m.rotation_order,
                    joined_at: m.joined_at,
                })
                .collect();
            Ok(members)
        })
    }

    /// Admin edit of a group's terms.
    pub async fn update_group(
        &self,
        actor_id: &str,
        group_id: &str,
        update: GroupUpdate,
    ) -> ResultEngine<Group> {
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, actor_id).await?;
            let model = self.require_group(&db_tx, group_id).await?;
            let mut active: groups::ActiveModel = model.into();
            if let Some(name) = update.name.as_deref() {
                active.name = ActiveValue::Set(normalize_required_text(name, "name")?);
            }
            if let Some(amount) = update.monthly_contribution {
                active.monthly_contribution =
                    ActiveValue::Set(require_positive(amount, "monthly contribution")?);
            }
            if let Some(max_members) = update.max_members {
                let max_members = validate_max_members(max_members)?;
                let count = group_members::Entity::find()
                    .filter(group_members::Column::GroupId.eq(group_id.to_string()))
                    .count(&db_tx)
                    .await?;
                if u64::try_from(max_members).unwrap_or(0) < count {
                    return Err(EngineError::ValidationFailed(format!(
                        "max_members cannot be below the current member count ({count})"
                    )));
                }
                active.max_members = ActiveValue::Set(max_members);
            }
            let model = active.update(&db_tx).await?;
            tracing::info!("group {group_id} updated by {actor_id}");
            Ok(Group::from(model))
        })
    }

    /// Admin delete of a group with its memberships, payments and progress.
    pub async fn delete_group(&self, actor_id: &str, group_id: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, actor_id).await?;
            self.require_group(&db_tx, group_id).await?;
            group_members::Entity::delete_many()
                .filter(group_members::Column::GroupId.eq(group_id.to_string()))
                .exec(&db_tx)
                .await?;
            payments::Entity::delete_many()
                .filter(payments::Column::GroupId.eq(group_id.to_string()))
                .exec(&db_tx)
                .await?;
            progress::Entity::delete_many()
                .filter(progress::Column::GroupId.eq(group_id.to_string()))
                .exec(&db_tx)
                .await?;
            groups::Entity::delete_by_id(group_id.to_string())
                .exec(&db_tx)
                .await?;
            tracing::info!("group {group_id} deleted by {actor_id}");
            Ok(())
        })
    }
}
