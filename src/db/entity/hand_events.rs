use sea_orm::entity::prelude::*;

/// Append-only event log. `(hand_id, event_id)` is unique, which is what makes
/// replaying an append idempotent: retrying a publish after a crash just hits
/// a conflict instead of double-applying.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "hand_events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub hand_id: i64,
    pub event_id: i64,
    pub sequence: i64,
    pub payload: Json,
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::hands::Entity",
        from = "Column::HandId",
        to = "super::hands::Column::Id"
    )]
    Hand,
}

impl ActiveModelBehavior for ActiveModel {}
