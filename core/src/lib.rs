pub mod calculator;
pub mod codec;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod performance_calculator;
pub mod period_chain;
pub mod potential_calculator;
pub mod ranking;
pub mod record;
pub mod rng;
pub mod store;
pub mod summary;
pub mod synthetic;
pub mod tier;
pub mod types;
