pub mod card;
pub mod config;
