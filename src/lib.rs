//! Convenience helpers over Amazon DynamoDB.
//!
//! See [`DynamoDb`] for the operations and [`StoreConfig`] for connection
//! settings.

pub mod config;
pub mod dynamodb;
pub mod error;
pub mod logging;

pub use config::{StaticCredentials, StoreConfig};
pub use dynamodb::{Comparison, DynamoDb, Item, Table, DEFAULT_BATCH_SIZE};
pub use error::{Error, Result};
