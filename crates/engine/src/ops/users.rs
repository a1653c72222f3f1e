use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    EngineError, ResultEngine, Role, User, group_members, groups, notifications, payments,
    progress, savings_accounts, savings_members, savings_messages, savings_transactions, users,
    util::{new_id, normalize_email, normalize_optional_text, normalize_required_text},
};

use super::{Engine, with_tx};

/// Shortest password accepted at sign-up.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Fields a user may change on their own profile. `None` leaves a field
/// untouched; a blank optional field clears it.
#[derive(Clone, Debug, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub bank_account: Option<String>,
    pub avatar_url: Option<String>,
}

/// Fields an admin may change on any user.
#[derive(Clone, Debug, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub role: Option<Role>,
    pub loan_category: Option<String>,
    pub bank_account: Option<String>,
    pub stars: Option<i32>,
}

impl Engine {
    /// Registers a new ordinary user.
    pub async fn sign_up(&self, email: &str, password: &str, name: &str) -> ResultEngine<User> {
        self.create_user(email, password, name, Role::User).await
    }

    /// Inserts a user with the given role.
    ///
    /// Not guarded: used by [`Engine::sign_up`] and by operator tooling with
    /// direct database access.
    pub async fn create_user(
        &self,
        email: &str,
        password: &str,
        name: &str,
        role: Role,
    ) -> ResultEngine<User> {
        let email = normalize_email(email)?;
        let name = normalize_required_text(name, "name")?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(EngineError::ValidationFailed(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        let password_hash = hash_password(password, self.password_cost).await?;
        let created_at = self.now();

        with_tx!(self, |db_tx| {
            let taken = users::Entity::find()
                .filter(users::Column::Email.eq(email.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            if taken {
                return Err(EngineError::AlreadyExists(
                    "Email already registered".to_string(),
                ));
            }

            let model = users::ActiveModel {
                id: ActiveValue::Set(new_id()),
                email: ActiveValue::Set(email.clone()),
                name: ActiveValue::Set(name.clone()),
                password_hash: ActiveValue::Set(password_hash.clone()),
                role: ActiveValue::Set(role.as_str().to_string()),
                loan_category: ActiveValue::Set(None),
                bank_account: ActiveValue::Set(None),
                stars: ActiveValue::Set(0),
                avatar_url: ActiveValue::Set(None),
                created_at: ActiveValue::Set(created_at),
            }
            .insert(&db_tx)
            .await?;
            tracing::info!("registered user {} ({})", model.id, role.as_str());
            User::try_from(model)
        })
    }

    /// Checks credentials and returns the matching user.
    pub async fn authenticate(&self, email: &str, password: &str) -> ResultEngine<User> {
        let invalid = || EngineError::Unauthorized("invalid credentials".to_string());
        let email = normalize_email(email).map_err(|_| invalid())?;

        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.database)
            .await?
            .ok_or_else(invalid)?;
        let matches = verify_password(password, &model.password_hash).await?;
        if !matches {
            return Err(invalid());
        }
        User::try_from(model)
    }

    /// Returns the caller's profile.
    pub async fn profile(&self, user_id: &str) -> ResultEngine<User> {
        with_tx!(self, |db_tx| {
            let model = self.require_user(&db_tx, user_id).await?;
            User::try_from(model)
        })
    }

    /// Updates the caller's own profile.
    pub async fn update_profile(&self, user_id: &str, update: ProfileUpdate) -> ResultEngine<User> {
        with_tx!(self, |db_tx| {
            let model = self.require_user(&db_tx, user_id).await?;
            let mut active: users::ActiveModel = model.into();
            if let Some(name) = update.name.as_deref() {
                active.name = ActiveValue::Set(normalize_required_text(name, "name")?);
            }
            if let Some(bank_account) = update.bank_account.as_deref() {
                active.bank_account = ActiveValue::Set(normalize_optional_text(Some(bank_account)));
            }
            if let Some(avatar_url) = update.avatar_url.as_deref() {
                active.avatar_url = ActiveValue::Set(normalize_optional_text(Some(avatar_url)));
            }
            let model = active.update(&db_tx).await?;
            User::try_from(model)
        })
    }

    /// Lists every user (admin-only).
    pub async fn list_users(&self, actor_id: &str) -> ResultEngine<Vec<User>> {
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, actor_id).await?;
            let rows = users::Entity::find()
                .order_by_asc(users::Column::CreatedAt)
                .all(&db_tx)
                .await?;
            rows.into_iter().map(User::try_from).collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Edits any user's profile fields (admin-only).
    pub async fn update_user(
        &self,
        actor_id: &str,
        user_id: &str,
        update: UserUpdate,
    ) -> ResultEngine<User> {
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, actor_id).await?;
            let model = self.require_target_user(&db_tx, user_id).await?;
            let mut active: users::ActiveModel = model.into();
            if let Some(name) = update.name.as_deref() {
                active.name = ActiveValue::Set(normalize_required_text(name, "name")?);
            }
            if let Some(role) = update.role {
                active.role = ActiveValue::Set(role.as_str().to_string());
            }
            if let Some(loan_category) = update.loan_category.as_deref() {
                active.loan_category =
                    ActiveValue::Set(normalize_optional_text(Some(loan_category)));
            }
            if let Some(bank_account) = update.bank_account.as_deref() {
                active.bank_account = ActiveValue::Set(normalize_optional_text(Some(bank_account)));
            }
            if let Some(stars) = update.stars {
                if stars < 0 {
                    return Err(EngineError::ValidationFailed(
                        "stars must be >= 0".to_string(),
                    ));
                }
                active.stars = ActiveValue::Set(stars);
            }
            let model = active.update(&db_tx).await?;
            User::try_from(model)
        })
    }

    /// Changes a user's role (admin-only).
    pub async fn update_user_role(
        &self,
        actor_id: &str,
        user_id: &str,
        role: Role,
    ) -> ResultEngine<User> {
        self.update_user(
            actor_id,
            user_id,
            UserUpdate {
                role: Some(role),
                ..Default::default()
            },
        )
        .await
    }

    /// Sets a role by email without an acting admin.
    ///
    /// Operator tooling only: this is how the first admin gets promoted.
    pub async fn bootstrap_role(&self, email: &str, role: Role) -> ResultEngine<User> {
        let email = normalize_email(email)?;
        with_tx!(self, |db_tx| {
            let model = users::Entity::find()
                .filter(users::Column::Email.eq(email.clone()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound("User not found".to_string()))?;
            let mut active: users::ActiveModel = model.into();
            active.role = ActiveValue::Set(role.as_str().to_string());
            let model = active.update(&db_tx).await?;
            User::try_from(model)
        })
    }

    /// Deletes a user and everything that depends on them (admin-only).
    ///
    /// Groups and savings accounts the user created go away with their
    /// members, payments, progress, deposits and messages; then every row
    /// the user took part in elsewhere.
    pub async fn delete_user(&self, actor_id: &str, user_id: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, actor_id).await?;
            if actor_id == user_id {
                return Err(EngineError::ValidationFailed(
                    "cannot delete your own account".to_string(),
                ));
            }
            self.require_target_user(&db_tx, user_id).await?;

            let group_ids: Vec<String> = groups::Entity::find()
                .filter(groups::Column::CreatedBy.eq(user_id.to_string()))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|g| g.id)
                .collect();
            if !group_ids.is_empty() {
                group_members::Entity::delete_many()
                    .filter(group_members::Column::GroupId.is_in(group_ids.clone()))
                    .exec(&db_tx)
                    .await?;
                payments::Entity::delete_many()
                    .filter(payments::Column::GroupId.is_in(group_ids.clone()))
                    .exec(&db_tx)
                    .await?;
                progress::Entity::delete_many()
                    .filter(progress::Column::GroupId.is_in(group_ids.clone()))
                    .exec(&db_tx)
                    .await?;
                groups::Entity::delete_many()
                    .filter(groups::Column::Id.is_in(group_ids))
                    .exec(&db_tx)
                    .await?;
            }

            let account_ids: Vec<String> = savings_accounts::Entity::find()
                .filter(savings_accounts::Column::CreatedBy.eq(user_id.to_string()))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|a| a.id)
                .collect();
            if !account_ids.is_empty() {
                self.delete_savings_dependents(&db_tx, account_ids.clone())
                    .await?;
                savings_accounts::Entity::delete_many()
                    .filter(savings_accounts::Column::Id.is_in(account_ids))
                    .exec(&db_tx)
                    .await?;
            }

            notifications::Entity::delete_many()
                .filter(notifications::Column::UserId.eq(user_id.to_string()))
                .exec(&db_tx)
                .await?;
            progress::Entity::delete_many()
                .filter(progress::Column::UserId.eq(user_id.to_string()))
                .exec(&db_tx)
                .await?;
            payments::Entity::delete_many()
                .filter(payments::Column::UserId.eq(user_id.to_string()))
                .exec(&db_tx)
                .await?;
            savings_transactions::Entity::delete_many()
                .filter(savings_transactions::Column::UserId.eq(user_id.to_string()))
                .exec(&db_tx)
                .await?;
            savings_messages::Entity::delete_many()
                .filter(savings_messages::Column::UserId.eq(user_id.to_string()))
                .exec(&db_tx)
                .await?;
            savings_members::Entity::delete_many()
                .filter(savings_members::Column::UserId.eq(user_id.to_string()))
                .exec(&db_tx)
                .await?;
            group_members::Entity::delete_many()
                .filter(group_members::Column::UserId.eq(user_id.to_string()))
                .exec(&db_tx)
                .await?;
            users::Entity::delete_by_id(user_id.to_string())
                .exec(&db_tx)
                .await?;

            tracing::info!("user {user_id} deleted by {actor_id}");
            Ok(())
        })
    }
}

// bcrypt takes hundreds of milliseconds at the default cost. Run it on the
// blocking pool, never on an async worker.
async fn hash_password(password: &str, cost: u32) -> ResultEngine<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|err| EngineError::Internal(format!("password hashing task failed: {err}")))?
        .map_err(|err| EngineError::Internal(format!("password hashing failed: {err}")))
}

async fn verify_password(password: &str, hash: &str) -> ResultEngine<bool> {
    let (password, hash) = (password.to_string(), hash.to_string());
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|err| EngineError::Internal(format!("password check task failed: {err}")))?
        .map_err(|err| EngineError::Internal(format!("password check failed: {err}")))
}
