//! Append-only deposit log of a savings pool.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Method recorded for deposits; settlement is simulated.
pub const DEPOSIT_METHOD: &str = "qpay";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingsTransaction {
    pub id: String,
    pub account_id: String,
    pub user_id: String,
    pub amount: i64,
    pub method: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Model> for SavingsTransaction {
    fn from(value: Model) -> Self {
        Self {
            id: value.id,
            account_id: value.account_id,
            user_id: value.user_id,
            amount: value.amount,
            method: value.method,
            note: value.note,
            created_at: value.created_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "savings_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub account_id: String,
    pub user_id: String,
    pub amount: i64,
    pub method: String,
    pub note: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::savings_accounts::Entity",
        from = "Column::AccountId",
        to = "super::savings_accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Accounts,
}

impl Related<super::savings_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
