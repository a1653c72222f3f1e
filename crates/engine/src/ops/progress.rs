use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{Progress, ResultEngine, progress, util::normalize_optional_text};

use super::{Engine, with_tx};

const NOTE_SELF_REPORTED: &str = "Marked as paid";

impl Engine {
    /// Member self-report: marks the current month paid for a group.
    pub async fn mark_as_paid(
        &self,
        user_id: &str,
        group_id: &str,
        note: Option<&str>,
    ) -> ResultEngine<Progress> {
        let month = self.current_month();
        let note = normalize_optional_text(note).unwrap_or_else(|| NOTE_SELF_REPORTED.to_string());
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            self.require_group_member(&db_tx, group_id, user_id).await?;
            let model = self
                .mark_progress_paid(&db_tx, user_id, group_id, month, &note)
                .await?;
            tracing::info!("user {user_id} marked {month} paid in group {group_id}");
            Progress::try_from(model)
        })
    }

    /// The caller's progress rows, newest month first.
    pub async fn progress_for(
        &self,
        user_id: &str,
        group_id: Option<&str>,
    ) -> ResultEngine<Vec<Progress>> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let mut query = progress::Entity::find()
                .filter(progress::Column::UserId.eq(user_id.to_string()))
                .order_by_desc(progress::Column::Month);
            if let Some(group_id) = group_id {
                query = query.filter(progress::Column::GroupId.eq(group_id.to_string()));
            }
            let rows = query.all(&db_tx).await?;
            rows.into_iter()
                .map(Progress::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }
}
