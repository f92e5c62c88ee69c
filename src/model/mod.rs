pub mod candidates;
pub mod case;
pub mod config;
pub mod result;
pub mod rule;
