use sea_orm::entity::prelude::*;

/// The latest materialized `BettingState` for a hand, kept in lockstep with
/// `hand_events` by the single writer per hand in `LedgerWorker`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "hand_snapshots")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub hand_id: i64,
    pub sequence: i64,
    pub state: Json,
    pub updated_at: ChronoDateTimeUtc,
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
