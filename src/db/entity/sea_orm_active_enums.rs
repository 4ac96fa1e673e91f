use sea_orm::entity::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "hand_status")]
pub enum HandStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "dealing")]
    Dealing,
    #[sea_orm(string_value = "betting")]
    Betting,
    #[sea_orm(string_value = "showdown")]
    Showdown,
    #[sea_orm(string_value = "complete")]
    Complete,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl From<crate::ledger::types::HandStatus> for HandStatus {
    fn from(s: crate::ledger::types::HandStatus) -> Self {
        use crate::ledger::types::HandStatus as H;
        match s {
            H::Pending => Self::Pending,
            H::Dealing => Self::Dealing,
            H::Betting => Self::Betting,
            H::Showdown => Self::Showdown,
            H::Complete => Self::Complete,
            H::Cancelled => Self::Cancelled,
        }
    }
}

impl From<HandStatus> for crate::ledger::types::HandStatus {
    fn from(s: HandStatus) -> Self {
        use crate::ledger::types::HandStatus as H;
        match s {
            HandStatus::Pending => H::Pending,
            HandStatus::Dealing => H::Dealing,
            HandStatus::Betting => H::Betting,
            HandStatus::Showdown => H::Showdown,
            HandStatus::Complete => H::Complete,
            HandStatus::Cancelled => H::Cancelled,
        }
    }
}
