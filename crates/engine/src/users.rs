//! Users table.
//!
//! A user is identified by a generated id; the email is the login name and is
//! stored normalized (see [`crate::util::normalize_email`]).

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::EngineError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    pub fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl TryFrom<&str> for Role {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(EngineError::ValidationFailed(format!(
                "invalid role: {other}"
            ))),
        }
    }
}

/// Public view of a user (never carries the password hash).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub loan_category: Option<String>,
    pub bank_account: Option<String>,
    pub stars: i32,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<Model> for User {
    type Error = EngineError;

    fn try_from(value: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            role: Role::try_from(value.role.as_str())?,
            id: value.id,
            email: value.email,
            name: value.name,
            loan_category: value.loan_category,
            bank_account: value.bank_account,
            stars: value.stars,
            avatar_url: value.avatar_url,
            created_at: value.created_at,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub role: String,
    pub loan_category: Option<String>,
    pub bank_account: Option<String>,
    pub stars: i32,
    pub avatar_url: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_storage_strings() {
        assert_eq!(Role::try_from("admin").unwrap(), Role::Admin);
        assert_eq!(Role::try_from("user").unwrap(), Role::User);
        assert!(Role::try_from("root").is_err());
        assert!(Role::Admin.is_admin());
        assert!(!Role::User.is_admin());
    }
}
