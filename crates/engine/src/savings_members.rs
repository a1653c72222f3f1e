//! Savings pool roster.
//!
//! Membership status moves `invited -> active` or `invited -> rejected` and
//! stays there. The pool creator starts as `active`.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    Invited,
    Active,
    Rejected,
}

impl MemberStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Invited => "invited",
            Self::Active => "active",
            Self::Rejected => "rejected",
        }
    }

    /// Answers an invitation.
    pub fn respond(self, accept: bool) -> Result<Self, EngineError> {
        match self {
            Self::Invited if accept => Ok(Self::Active),
            Self::Invited => Ok(Self::Rejected),
            other => Err(EngineError::InvalidTransition(format!(
                "invitation already {}",
                other.as_str()
            ))),
        }
    }
}

impl TryFrom<&str> for MemberStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "invited" => Ok(Self::Invited),
            "active" => Ok(Self::Active),
            "rejected" => Ok(Self::Rejected),
            other => Err(EngineError::ValidationFailed(format!(
                "invalid member status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingsMember {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub status: MemberStatus,
    pub joined_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "savings_members")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub account_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    pub status: String,
    pub joined_at: DateTimeUtc,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invited_members_can_answer_once() {
        assert_eq!(MemberStatus::Invited.respond(true), Ok(MemberStatus::Active));
        assert_eq!(MemberStatus::Invited.respond(false), Ok(MemberStatus::Rejected));
        assert!(matches!(
            MemberStatus::Active.respond(false),
            Err(EngineError::InvalidTransition(_))
        ));
        assert!(matches!(
            MemberStatus::Rejected.respond(true),
            Err(EngineError::InvalidTransition(_))
        ));
    }
}
