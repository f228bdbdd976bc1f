//! Value Object Module

pub mod identifier;
pub mod user_id;
