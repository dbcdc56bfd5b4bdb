pub mod client;
pub mod error;
pub mod provision;
pub mod types;
