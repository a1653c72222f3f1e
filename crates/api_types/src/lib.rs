//! Request bodies and query strings of the Hamtdaa HTTP API.
//!
//! Amounts are whole tugrik (`i64`). Enums serialize as `snake_case` strings
//! and expose `as_str()` returning the canonical string the engine stores.

use serde::{Deserialize, Serialize};

pub mod user {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Role {
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
    }

    /// Public registration; the only unauthenticated endpoint.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct SignUp {
        pub email: String,
        pub password: String,
        pub name: String,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ProfileUpdate {
        pub name: Option<String>,
        pub bank_account: Option<String>,
        /// Public URL of an already uploaded image.
        pub avatar_url: Option<String>,
    }

    /// Admin edit of any user.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct UserUpdate {
        pub name: Option<String>,
        pub role: Option<Role>,
        pub loan_category: Option<String>,
        pub bank_account: Option<String>,
        pub stars: Option<i32>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RoleUpdate {
        pub role: Role,
    }
}

pub mod group {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupNew {
        pub name: String,
        pub monthly_contribution: i64,
        pub max_members: i32,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct GroupUpdate {
        pub name: Option<String>,
        pub monthly_contribution: Option<i64>,
        pub max_members: Option<i32>,
    }
}

pub mod payment {
    use super::*;

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
    }

    /// Decision an admin takes on a pending payment.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum PaymentDecision {
        Approved,
        Rejected,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaymentNew {
        pub group_id: String,
        pub method: PaymentMethod,
        pub note: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaymentStatusUpdate {
        pub status: PaymentDecision,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct PaymentUpdate {
        pub amount: Option<i64>,
        pub note: Option<String>,
    }

    /// Query string of the admin payment list.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct PaymentList {
        pub status: Option<PaymentStatus>,
    }
}

pub mod progress {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MarkPaid {
        pub group_id: String,
        pub note: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ProgressQuery {
        pub group_id: Option<String>,
    }
}

pub mod savings {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SavingsAccountNew {
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SavingsRename {
        pub name: String,
    }

    /// Invite a user, looked up by email (case-insensitive).
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberInvite {
        pub email: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DepositNew {
        pub amount: i64,
        pub note: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MessageNew {
        pub content: String,
    }
}

pub mod notification {
    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct NotificationQuery {
        #[serde(default)]
        pub unread_only: bool,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_method_uses_storage_names() {
        let method: payment::PaymentMethod = serde_json::from_str("\"bank_transfer\"").unwrap();
        assert_eq!(method, payment::PaymentMethod::BankTransfer);
        assert_eq!(method.as_str(), "bank_transfer");
    }

    #[test]
    fn notification_query_defaults_to_all() {
        let query: notification::NotificationQuery = serde_json::from_str("{}").unwrap();
        assert!(!query.unread_only);
    }
}
