//! In-app notifications.
//!
//! Notifications drive the invite accept/reject flow. There is no delivery
//! guarantee: a row is inserted and read back by the UI, nothing more. The
//! structured payload is stored as JSON text.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    SavingsInvite,
    SavingsInviteAccepted,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SavingsInvite => "savings_invite",
            Self::SavingsInviteAccepted => "savings_invite_accepted",
        }
    }
}

impl TryFrom<&str> for NotificationKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "savings_invite" => Ok(Self::SavingsInvite),
            "savings_invite_accepted" => Ok(Self::SavingsInviteAccepted),
            other => Err(EngineError::ValidationFailed(format!(
                "invalid notification type: {other}"
            ))),
        }
    }
}

/// Payload attached to savings notifications.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingsPayload {
    pub account_id: String,
    pub account_name: String,
    /// User who triggered the notification (inviter or invitee).
    pub actor_id: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub data: serde_json::Value,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Savings account referenced by the payload, if any.
    pub fn account_id(&self) -> Option<&str> {
        self.data.get("account_id").and_then(serde_json::Value::as_str)
    }
}

impl TryFrom<Model> for Notification {
    type Error = EngineError;

    fn try_from(value: Model) -> Result<Self, Self::Error> {
        let data = serde_json::from_str(&value.data).map_err(|err| {
            EngineError::ValidationFailed(format!("invalid notification payload: {err}"))
        })?;
        Ok(Self {
            kind: NotificationKind::try_from(value.kind.as_str())?,
            id: value.id,
            user_id: value.user_id,
            title: value.title,
            message: value.message,
            data,
            is_read: value.is_read,
            created_at: value.created_at,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub data: String,
    pub is_read: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
