pub mod config;
pub mod pubsub;
