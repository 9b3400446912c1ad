// Library entry point for swap-quoter

pub mod cache;
pub mod config;
pub mod engine;
pub mod loadable;
pub mod pool;
pub mod provider;
pub mod quoter;
pub mod resolver;
pub mod route;
pub mod tracker;
pub mod types;

#[cfg(feature = "api")]
pub mod api;

pub use alloy_primitives::{Address, B256, U256};
