use std::collections::HashMap;

use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    EngineError, Payment, PaymentDecision, PaymentMethod, PaymentStatus, PaymentView,
    ResultEngine, groups, payments,
    progress::{NOTE_ADMIN_APPROVAL, NOTE_QPAY},
    users,
    util::{new_id, normalize_optional_text, require_positive},
};

use super::{Engine, with_tx};

/// Admin correction of a payment. Progress is not adjusted.
#[derive(Clone, Debug, Default)]
pub struct PaymentUpdate {
    pub amount: Option<i64>,
    pub note: Option<String>,
}

impl Engine {
    /// Records a member's payment of the group's monthly contribution.
    ///
    /// The status follows from the method. A QPay payment is settled at once
    /// and marks the current month as paid in the same transaction.
    pub async fn submit_payment(
        &self,
        user_id: &str,
        group_id: &str,
        method: PaymentMethod,
        note: Option<&str>,
    ) -> ResultEngine<Payment> {
        let created_at = self.now();
        let month = self.current_month();
        let note = normalize_optional_text(note);

        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let (group, _) = self.require_group_member(&db_tx, group_id, user_id).await?;
            let status = method.initial_status();

            let model = payments::ActiveModel {
                id: ActiveValue::Set(new_id()),
                user_id: ActiveValue::Set(user_id.to_string()),
                group_id: ActiveValue::Set(group_id.to_string()),
                amount: ActiveValue::Set(group.monthly_contribution),
                method: ActiveValue::Set(method.as_str().to_string()),
                status: ActiveValue::Set(status.as_str().to_string()),
                note: ActiveValue::Set(note.clone()),
                created_at: ActiveValue::Set(created_at),
            }
            .insert(&db_tx)
            .await?;

            if status.is_settled() {
                self.mark_progress_paid(&db_tx, user_id, group_id, month, NOTE_QPAY)
                    .await?;
            }
            tracing::info!(
                "payment {} submitted by {user_id} via {} ({})",
                model.id,
                method.as_str(),
                status.as_str()
            );
            Payment::try_from(model)
        })
    }

    /// Admin decision on a pending payment.
    ///
    /// Re-applying the current decision changes nothing on the payment, but an
    /// approval always re-asserts the current month's progress.
    pub async fn update_payment_status(
        &self,
        actor_id: &str,
        payment_id: &str,
        decision: PaymentDecision,
    ) -> ResultEngine<Payment> {
        let month = self.current_month();
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, actor_id).await?;
            let model = self.require_payment(&db_tx, payment_id).await?;
            let current = PaymentStatus::try_from(model.status.as_str())?;
            let changed = current.review(decision)?;

            let model = if changed {
                let mut active: payments::ActiveModel = model.into();
                active.status = ActiveValue::Set(decision.status().as_str().to_string());
                let model = active.update(&db_tx).await?;
                tracing::info!(
                    "payment {payment_id} {} by {actor_id}",
                    decision.status().as_str()
                );
                model
            } else {
                model
            };

            if decision == PaymentDecision::Approved {
                self.mark_progress_paid(
                    &db_tx,
                    &model.user_id,
                    &model.group_id,
                    month,
                    NOTE_ADMIN_APPROVAL,
                )
                .await?;
            }
            Payment::try_from(model)
        })
    }

    /// Admin correction of amount or note.
    pub async fn update_payment_details(
        &self,
        actor_id: &str,
        payment_id: &str,
        update: PaymentUpdate,
    ) -> ResultEngine<Payment> {
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, actor_id).await?;
            let model = self.require_payment(&db_tx, payment_id).await?;
            let mut active: payments::ActiveModel = model.into();
            if let Some(amount) = update.amount {
                active.amount = ActiveValue::Set(require_positive(amount, "amount")?);
            }
            if let Some(note) = update.note.as_deref() {
                active.note = ActiveValue::Set(normalize_optional_text(Some(note)));
            }
            let model = active.update(&db_tx).await?;
            Payment::try_from(model)
        })
    }

    pub async fn delete_payment(&self, actor_id: &str, payment_id: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, actor_id).await?;
            self.require_payment(&db_tx, payment_id).await?;
            payments::Entity::delete_by_id(payment_id.to_string())
                .exec(&db_tx)
                .await?;
            tracing::info!("payment {payment_id} deleted by {actor_id}");
            Ok(())
        })
    }

    /// All payments, newest first, optionally filtered by status (admin-only).
    pub async fn list_payments(
        &self,
        actor_id: &str,
        status: Option<PaymentStatus>,
    ) -> ResultEngine<Vec<PaymentView>> {
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, actor_id).await?;
            let mut query = payments::Entity::find().order_by_desc(payments::Column::CreatedAt);
            if let Some(status) = status {
                query = query.filter(payments::Column::Status.eq(status.as_str()));
            }
            let rows = query.find_also_related(groups::Entity).all(&db_tx).await?;

            let payer_names: HashMap<String, String> = users::Entity::find()
                .filter(
                    users::Column::Id.is_in(rows.iter().map(|(p, _)| p.user_id.clone())),
                )
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|u| (u.id, u.name))
                .collect();

            rows.into_iter()
                .map(|(payment, group)| {
                    Ok(PaymentView {
                        payer_name: payer_names
                            .get(&payment.user_id)
                            .cloned()
                            .unwrap_or_default(),
                        group_name: group.map(|g| g.name).unwrap_or_default(),
                        payment: Payment::try_from(payment)?,
                    })
                })
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// The caller's own payments, newest first.
    pub async fn my_payments(&self, user_id: &str) -> ResultEngine<Vec<Payment>> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let rows = payments::Entity::find()
                .filter(payments::Column::UserId.eq(user_id.to_string()))
                .order_by_desc(payments::Column::CreatedAt)
                .all(&db_tx)
                .await?;
            rows.into_iter()
                .map(Payment::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    async fn require_payment(
        &self,
        db: &sea_orm::DatabaseTransaction,
        payment_id: &str,
    ) -> ResultEngine<payments::Model> {
        payments::Entity::find_by_id(payment_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound("Payment not found".to_string()))
    }
}
