//! # DynamoDB Module
//!
//! Helpers over Amazon DynamoDB that build expressions and placeholder maps
//! so callers don't have to.
//!
//! ## Components
//!
//! - `DynamoDb`: The operation facade (upsert, delete, lookups, scans).
//! - `ClientFactory`: Holds the connection settings and rebuilds the client when they change.
//! - `DocumentStore`: The request/response seam over the SDK client, implemented by `SdkStore`.
//! - `Item`: A DynamoDB item, with `serde` marshalling to and from native types.
//! - `Table`: A table's key layout.
//! - `expression`: Pure builders for update, key-condition and filter expressions.
//!
//! ## Usage
//!
//! The client reads the following environment variables on startup:
//!
//! - `AWS_REGION`: The AWS region where your DynamoDB tables are located.
//! - `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY`: Static credentials. When absent
//!   the SDK's default provider chain is used.
//! - `AWS_SESSION_TOKEN`: If you're using temporary credentials.
//! - `AWS_ENDPOINT_URL`: For using a custom endpoint (e.g., for local development).
//!
//! ## Example
//!
//! ```no_run
//! use dynamodb_helpers::{DynamoDb, Item, Table};
//! use futures_util::StreamExt;
//!
//! # async fn example() -> dynamodb_helpers::Result<()> {
//! let ddb = DynamoDb::from_env().await;
//!
//! ddb.create_table_if_not_exists(&Table::new("users", "user_id", None))
//!     .await?;
//!
//! let item = Item::new()
//!     .set_string("user_id", "123")
//!     .set_string("email", "user@example.com");
//! ddb.insert_or_update("users", "user_id", &item, None).await?;
//!
//! let found = ddb.find_one("users", "user_id", "123").await?;
//! assert!(found.is_some());
//!
//! let mut batches = Box::pin(ddb.find_all("users", 25));
//! while let Some(batch) = batches.next().await {
//!     println!("{} items", batch.len());
//! }
//! # Ok(())
//! # }
//! ```

mod client;
pub mod expression;
mod factory;
mod item;
mod store;
mod table;

pub use client::{DynamoDb, DEFAULT_BATCH_SIZE};
pub use expression::Comparison;
pub use factory::{ClientFactory, SdkStoreBuilder, StoreBuilder};
pub use item::{to_attribute, Item};
pub use store::{
    DeleteRequest, DocumentStore, Key, Page, QueryRequest, ScanRequest, SdkStore, UpdateRequest,
};
pub use table::Table;
