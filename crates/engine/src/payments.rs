//! Payment submissions for a group's monthly due.
//!
//! A payment is a member's claim of having paid. Its status follows a small
//! state machine:
//!
//! ```text
//! bank_transfer -> pending -> approved
//!                          \-> rejected
//! qpay          -> verified
//! ```
//!
//! Every state except `pending` is terminal.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    BankTransfer,
    Qpay,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BankTransfer => "bank_transfer",
            Self::Qpay => "qpay",
        }
    }

    /// Status a freshly submitted payment gets.
    ///
    /// QPay is settled on submission (there is no settlement callback);
    /// bank transfers wait for an admin.
    pub fn initial_status(self) -> PaymentStatus {
        match self {
            Self::Qpay => PaymentStatus::Verified,
            Self::BankTransfer => PaymentStatus::Pending,
        }
    }
}

impl TryFrom<&str> for PaymentMethod {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "bank_transfer" => Ok(Self::BankTransfer),
            "qpay" => Ok(Self::Qpay),
            other => Err(EngineError::ValidationFailed(format!(
                "invalid payment method: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Verified,
    Approved,
    Rejected,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Money counted as received.
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Verified | Self::Approved)
    }

    /// Validates an admin decision against the current status.
    ///
    /// Returns `Ok(true)` when the status changes, `Ok(false)` when the
    /// decision re-applies the current status.
    pub fn review(self, decision: PaymentDecision) -> Result<bool, EngineError> {
        let target = decision.status();
        match (self, target) {
            (current, target) if current == target => Ok(false),
            (Self::Pending, _) => Ok(true),
            (current, target) => Err(EngineError::InvalidTransition(format!(
                "payment is {}, cannot become {}",
                current.as_str(),
                target.as_str()
            ))),
        }
    }
}

impl TryFrom<&str> for PaymentStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "verified" => Ok(Self::Verified),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(EngineError::ValidationFailed(format!(
                "invalid payment status: {other}"
            ))),
        }
    }
}

/// Outcome an admin can assign to a pending payment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentDecision {
    Approved,
    Rejected,
}

impl PaymentDecision {
    pub fn status(self) -> PaymentStatus {
        match self {
            Self::Approved => PaymentStatus::Approved,
            Self::Rejected => PaymentStatus::Rejected,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub user_id: String,
    pub group_id: String,
    pub amount: i64,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<Model> for Payment {
    type Error = EngineError;

    fn try_from(value: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            method: PaymentMethod::try_from(value.method.as_str())?,
            status: PaymentStatus::try_from(value.status.as_str())?,
            id: value.id,
            user_id: value.user_id,
            group_id: value.group_id,
            amount: value.amount,
            note: value.note,
            created_at: value.created_at,
        })
    }
}

/// Payment with the payer and group names resolved, for review screens.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentView {
    pub payment: Payment,
    pub payer_name: String,
    pub group_name: String,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub group_id: String,
    pub amount: i64,
    pub method: String,
    pub status: String,
    pub note: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::groups::Entity",
        from = "Column::GroupId",
        to = "super::groups::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Groups,
}

impl Related<super::groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Groups.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qpay_settles_immediately_and_bank_transfer_waits() {
        assert_eq!(PaymentMethod::Qpay.initial_status(), PaymentStatus::Verified);
        assert_eq!(
            PaymentMethod::BankTransfer.initial_status(),
            PaymentStatus::Pending
        );
    }

    #[test]
    fn pending_accepts_either_decision() {
        assert_eq!(PaymentStatus::Pending.review(PaymentDecision::Approved), Ok(true));
        assert_eq!(PaymentStatus::Pending.review(PaymentDecision::Rejected), Ok(true));
    }

    #[test]
    fn repeating_a_decision_is_a_no_op() {
        assert_eq!(PaymentStatus::Approved.review(PaymentDecision::Approved), Ok(false));
        assert_eq!(PaymentStatus::Rejected.review(PaymentDecision::Rejected), Ok(false));
    }

    #[test]
    fn terminal_states_refuse_a_different_decision() {
        assert!(matches!(
            PaymentStatus::Approved.review(PaymentDecision::Rejected),
            Err(EngineError::InvalidTransition(_))
        ));
        assert!(matches!(
            PaymentStatus::Rejected.review(PaymentDecision::Approved),
            Err(EngineError::InvalidTransition(_))
        ));
        assert!(matches!(
            PaymentStatus::Verified.review(PaymentDecision::Approved),
            Err(EngineError::InvalidTransition(_))
        ));
    }

    #[test]
    fn settled_statuses() {
        assert!(PaymentStatus::Verified.is_settled());
        assert!(PaymentStatus::Approved.is_settled());
        assert!(!PaymentStatus::Pending.is_settled());
        assert!(!PaymentStatus::Rejected.is_settled());
    }

    #[test]
    fn method_storage_strings() {
        for method in [PaymentMethod::BankTransfer, PaymentMethod::Qpay] {
            assert_eq!(PaymentMethod::try_from(method.as_str()).unwrap(), method);
        }
        assert!(PaymentMethod::try_from("cash").is_err());
    }
}
