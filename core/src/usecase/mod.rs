pub mod analytics;
pub mod board;
pub mod drag;
pub mod table;
