pub mod chat_messages;
pub mod hand_events;
pub mod hand_snapshots;
pub mod hands;
pub mod sea_orm_active_enums;
pub mod seats;
pub mod tables;
