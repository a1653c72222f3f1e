//! Shared savings pools.
//!
//! A pool has no stored balance: the balance is always the sum of its
//! transactions.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{SavingsMember, SavingsTransaction};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingsAccount {
    pub id: String,
    pub name: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl From<Model> for SavingsAccount {
    fn from(value: Model) -> Self {
        Self {
            id: value.id,
            name: value.name,
            created_by: value.created_by,
            created_at: value.created_at,
        }
    }
}

/// A pool with its summed balance, as listed to a member.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingsSummary {
    pub account: SavingsAccount,
    pub balance: i64,
}

/// Everything a member sees on the pool page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingsDetail {
    pub account: SavingsAccount,
    pub balance: i64,
    pub members: Vec<SavingsMember>,
    pub transactions: Vec<SavingsTransaction>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "savings_accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub created_by: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::savings_members::Entity")]
    Members,
    #[sea_orm(has_many = "super::savings_transactions::Entity")]
    Transactions,
    #[sea_orm(has_many = "super::savings_messages::Entity")]
    Messages,
}

impl Related<super::savings_members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl Related<super::savings_transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::savings_messages::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Messages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
