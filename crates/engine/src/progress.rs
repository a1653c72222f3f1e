//! Monthly progress: whether a member's due for a group is covered.
//!
//! At most one row exists per `(user_id, group_id, month)`; the migration backs
//! this with a unique index and writes go through an upsert on it. `paid`
//! only ever moves from `false` to `true`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{EngineError, Month};

/// Note stored when a QPay submission settles the month.
pub const NOTE_QPAY: &str = "Paid via QPay";
/// Note stored when an admin approves a bank transfer.
pub const NOTE_ADMIN_APPROVAL: &str = "Approved by admin";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub id: String,
    pub user_id: String,
    pub group_id: String,
    pub month: Month,
    pub paid: bool,
    pub note: Option<String>,
}

impl TryFrom<Model> for Progress {
    type Error = EngineError;

    fn try_from(value: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            month: value.month.parse()?,
            id: value.id,
            user_id: value.user_id,
            group_id: value.group_id,
            paid: value.paid,
            note: value.note,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "progress")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub group_id: String,
    pub month: String,
    pub paid: bool,
    pub note: Option<String>,
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
