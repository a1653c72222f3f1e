//! Business rules of the Hamtdaa community finance service.
//!
//! Two savings mechanisms live here:
//!
//! - rotating contribution **groups**: fixed monthly dues, capped membership,
//!   payment submissions reviewed by admins and a per-month progress ledger;
//! - shared **savings pools**: invitation based rosters, an append-only
//!   deposit log and a chat.
//!
//! The [`Engine`] keeps no state between calls. Each operation opens one
//! database transaction, re-derives every invariant from the store and
//! commits, so multi-step rules (count-then-insert, find-then-upsert) are
//! atomic.

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::EngineError;
pub use group_members::GroupMember;
pub use groups::{Group, GroupSummary};
pub use money::Tugrik;
pub use month::Month;
pub use notifications::{Notification, NotificationKind, SavingsPayload};
pub use ops::{
    Dashboard, DashboardGroup, Engine, EngineBuilder, GroupUpdate, MIN_PASSWORD_LEN, Overview,
    PaymentUpdate, ProfileUpdate, UserUpdate,
};
pub use payments::{Payment, PaymentDecision, PaymentMethod, PaymentStatus, PaymentView};
pub use progress::Progress;
pub use savings_accounts::{SavingsAccount, SavingsDetail, SavingsSummary};
pub use savings_members::{MemberStatus, SavingsMember};
pub use savings_messages::SavingsMessage;
pub use savings_transactions::SavingsTransaction;
pub use users::{Role, User};

mod clock;
mod error;
mod group_members;
mod groups;
mod money;
mod month;
mod notifications;
mod ops;
mod payments;
mod progress;
mod savings_accounts;
mod savings_members;
mod savings_messages;
mod savings_transactions;
mod users;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
