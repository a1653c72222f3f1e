use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use serde::Serialize;

use crate::{
    EngineError, Notification, NotificationKind, ResultEngine, notifications, util::new_id,
};

use super::{Engine, with_tx};

impl Engine {
    /// The caller's notifications, newest first.
    pub async fn notifications(
        &self,
        user_id: &str,
        unread_only: bool,
    ) -> ResultEngine<Vec<Notification>> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let mut query = notifications::Entity::find()
                .filter(notifications::Column::UserId.eq(user_id.to_string()))
                .order_by_desc(notifications::Column::CreatedAt);
            if unread_only {
                query = query.filter(notifications::Column::IsRead.eq(false));
            }
            let rows = query.all(&db_tx).await?;
            rows.into_iter()
                .map(Notification::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    pub async fn mark_notification_read(
        &self,
        user_id: &str,
        notification_id: &str,
    ) -> ResultEngine<Notification> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let model = self
                .require_own_notification(&db_tx, notification_id, user_id)
                .await?;
            let mut active: notifications::ActiveModel = model.into();
            active.is_read = ActiveValue::Set(true);
            let model = active.update(&db_tx).await?;
            Notification::try_from(model)
        })
    }

    /// Someone else's notification is reported as missing.
    pub(super) async fn require_own_notification(
        &self,
        db: &DatabaseTransaction,
        notification_id: &str,
        user_id: &str,
    ) -> ResultEngine<notifications::Model> {
        notifications::Entity::find_by_id(notification_id.to_string())
            .filter(notifications::Column::UserId.eq(user_id.to_string()))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound("Notification not found".to_string()))
    }

    pub(super) async fn notify<P: Serialize>(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
        kind: NotificationKind,
        title: &str,
        message: &str,
        payload: &P,
    ) -> ResultEngine<notifications::Model> {
        let data = serde_json::to_string(payload)
            .map_err(|err| EngineError::Internal(format!("notification payload: {err}")))?;
        let model = notifications::ActiveModel {
            id: ActiveValue::Set(new_id()),
            user_id: ActiveValue::Set(user_id.to_string()),
            kind: ActiveValue::Set(kind.as_str().to_string()),
            title: ActiveValue::Set(title.to_string()),
            message: ActiveValue::Set(message.to_string()),
            data: ActiveValue::Set(data),
            is_read: ActiveValue::Set(false),
            created_at: ActiveValue::Set(self.now()),
        }
        .insert(db)
        .await?;
        Ok(model)
    }
}
