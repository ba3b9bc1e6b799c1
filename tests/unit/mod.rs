pub mod auth;
pub mod board_order;
pub mod cards;
pub mod checklists;
pub mod rooms;
pub mod uploads;
pub mod service_rules;
