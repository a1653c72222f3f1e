use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;

use crate::{Clock, Month, SystemClock};

mod access;
mod groups;
mod notifications;
mod overview;
mod payments;
mod progress;
mod savings;
mod users;

pub use groups::GroupUpdate;
pub use overview::{Dashboard, DashboardGroup, Overview};
pub use payments::PaymentUpdate;
pub use users::{MIN_PASSWORD_LEN, ProfileUpdate, UserUpdate};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    clock: Arc<dyn Clock>,
    password_cost: u32,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn current_month(&self) -> Month {
        self.clock.current_month()
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    clock: Option<Arc<dyn Clock>>,
    password_cost: Option<u32>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Replace the wall clock, e.g. with a [`crate::FixedClock`] in tests.
    pub fn clock(mut self, clock: impl Clock + 'static) -> EngineBuilder {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// bcrypt cost used when hashing new passwords.
    pub fn password_cost(mut self, cost: u32) -> EngineBuilder {
        self.password_cost = Some(cost);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> crate::ResultEngine<Engine> {
        let password_cost = self.password_cost.unwrap_or(bcrypt::DEFAULT_COST);
        if !(4..=31).contains(&password_cost) {
            return Err(crate::EngineError::ValidationFailed(format!(
                "invalid bcrypt cost: {password_cost}"
            )));
        }
        Ok(Engine {
            database: self.database,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            password_cost,
        })
    }
}
