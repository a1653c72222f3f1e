//! Rotating contribution groups.
//!
//! A group collects a fixed monthly contribution from each member. The member
//! cap is a business rule checked at join time, not a store constraint.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub monthly_contribution: i64,
    pub max_members: i32,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Model> for Group {
    fn from(value: Model) -> Self {
        Self {
            id: value.id,
            name: value.name,
            monthly_contribution: value.monthly_contribution,
            max_members: value.max_members,
            created_by: value.created_by,
            created_at: value.created_at,
        }
    }
}

/// A group as listed to a user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub group: Group,
    pub member_count: u64,
    pub joined: bool,
}

impl GroupSummary {
    pub fn is_full(&self) -> bool {
        self.member_count >= u64::try_from(self.group.max_members).unwrap_or(0)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "groups")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub monthly_contribution: i64,
    pub max_members: i32,
    pub created_by: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::group_members::Entity")]
    Members,
    #[sea_orm(has_many = "super::payments::Entity")]
    Payments,
    #[sea_orm(has_many = "super::progress::Entity")]
    Progress,
}

impl Related<super::group_members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl Related<super::payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl Related<super::progress::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Progress.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
