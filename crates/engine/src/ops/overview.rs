use std::collections::{HashMap, HashSet};

use sea_orm::{
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use serde::{Deserialize, Serialize};

use crate::{
    Group, Month, PaymentStatus, ResultEngine, User, group_members, groups, notifications,
    payments, progress, savings_accounts, users,
};

use super::{Engine, with_tx};

/// Home screen of a member.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dashboard {
    pub user: User,
    pub month: Month,
    pub groups: Vec<DashboardGroup>,
    pub unread_notifications: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardGroup {
    pub group: Group,
    pub rotation_order: i32,
    /// Progress for [`Dashboard::month`].
    pub paid_this_month: bool,
    pub latest_payment_status: Option<PaymentStatus>,
}

/// Admin totals.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overview {
    pub users: u64,
    pub groups: u64,
    pub savings_accounts: u64,
    /// Sum of `verified` and `approved` payment amounts.
    pub settled_revenue: i64,
    pub pending_payments: u64,
}

impl Engine {
    pub async fn dashboard(&self, user_id: &str) -> ResultEngine<Dashboard> {
        let month = self.current_month();
        with_tx!(self, |db_tx| {
            let user = self.require_user(&db_tx, user_id).await?;

            let memberships = group_members::Entity::find()
                .filter(group_members::Column::UserId.eq(user_id.to_string()))
                .find_also_related(groups::Entity)
                .order_by_asc(group_members::Column::JoinedAt)
                .all(&db_tx)
                .await?;

            let paid: HashSet<String> = progress::Entity::find()
                .filter(progress::Column::UserId.eq(user_id.to_string()))
                .filter(progress::Column::Month.eq(month.to_string()))
                .filter(progress::Column::Paid.eq(true))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|p| p.group_id)
                .collect();

            let mut latest: HashMap<String, PaymentStatus> = HashMap::new();
            let payments = payments::Entity::find()
                .filter(payments::Column::UserId.eq(user_id.to_string()))
                .order_by_desc(payments::Column::CreatedAt)
                .all(&db_tx)
                .await?;
            for p in payments {
                if !latest.contains_key(&p.group_id) {
                    let status = PaymentStatus::try_from(p.status.as_str())?;
                    latest.insert(p.group_id, status);
                }
            }

            let groups = memberships
                .into_iter()
                .filter_map(|(m, g)| g.map(|g| (m, g)))
                .map(|(m, g)| DashboardGroup {
                    paid_this_month: paid.contains(&g.id),
                    latest_payment_status: latest.get(&g.id).copied(),
                    rotation_order: m.rotation_order,
                    group: Group::from(g),
                })
                .collect();

            let unread_notifications = notifications::Entity::find()
                .filter(notifications::Column::UserId.eq(user_id.to_string()))
                .filter(notifications::Column::IsRead.eq(false))
                .count(&db_tx)
                .await?;

            Ok(Dashboard {
                user: User::try_from(user)?,
                month,
                groups,
                unread_notifications,
            })
        })
    }

    pub async fn overview(&self, actor_id: &str) -> ResultEngine<Overview> {
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, actor_id).await?;
            let users = users::Entity::find().count(&db_tx).await?;
            let groups = groups::Entity::find().count(&db_tx).await?;
            let savings_accounts = savings_accounts::Entity::find().count(&db_tx).await?;
            let pending_payments = payments::Entity::find()
                .filter(payments::Column::Status.eq(PaymentStatus::Pending.as_str()))
                .count(&db_tx)
                .await?;
            let settled_revenue: Option<i64> = payments::Entity::find()
                .select_only()
                .column_as(Expr::col(payments::Column::Amount).sum(), "revenue")
                .filter(payments::Column::Status.is_in([
                    PaymentStatus::Verified.as_str(),
                    PaymentStatus::Approved.as_str(),
                ]))
                .into_tuple::<Option<i64>>()
                .one(&db_tx)
                .await?
                .flatten();

            Ok(Overview {
                users,
                groups,
                savings_accounts,
                settled_revenue: settled_revenue.unwrap_or(0),
                pending_payments,
            })
        })
    }
}
