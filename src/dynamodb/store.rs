use async_trait::async_trait;
use aws_sdk_dynamodb::{
    types::{
        AttributeDefinition, AttributeValue, BillingMode, KeySchemaElement, KeyType,
        ScalarAttributeType,
    },
    Client,
};
use std::collections::HashMap;
use tracing::debug;

use crate::dynamodb::{Item, Table};
use crate::error::{Error, Result};

/// Primary key or continuation token, as DynamoDB returns it.
pub type Key = HashMap<String, AttributeValue>;

/// Parameters of an `UpdateItem` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateRequest {
    pub table_name: String,
    pub key: Key,
    pub update_expression: String,
    pub expression_attribute_names: HashMap<String, String>,
    pub expression_attribute_values: HashMap<String, AttributeValue>,
}

/// Parameters of a `DeleteItem` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteRequest {
    pub table_name: String,
    pub key: Key,
}

/// Parameters of a single `Query` page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryRequest {
    pub table_name: String,
    pub key_condition_expression: String,
    pub expression_attribute_names: HashMap<String, String>,
    pub expression_attribute_values: HashMap<String, AttributeValue>,
    pub limit: Option<i32>,
    pub exclusive_start_key: Option<Key>,
}

/// Parameters of a single `Scan` page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanRequest {
    pub table_name: String,
    pub filter_expression: Option<String>,
    pub expression_attribute_names: HashMap<String, String>,
    pub expression_attribute_values: HashMap<String, AttributeValue>,
    pub limit: Option<i32>,
    pub exclusive_start_key: Option<Key>,
}

/// One page of results. `last_evaluated_key` is `None` on the final page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub items: Vec<Item>,
    pub last_evaluated_key: Option<Key>,
}

/// Low-level document store interface.
///
/// One method per request kind. Implementations send exactly one request per
/// call and never retry.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn update_item(&self, request: UpdateRequest) -> Result<()>;

    async fn delete_item(&self, request: DeleteRequest) -> Result<()>;

    async fn query(&self, request: QueryRequest) -> Result<Page>;

    async fn scan(&self, request: ScanRequest) -> Result<Page>;

    async fn list_tables(&self) -> Result<Vec<String>>;

    /// Creates an on-demand table with string key attributes.
    async fn create_table(&self, table: &Table<'_>) -> Result<()>;

    async fn delete_table(&self, table_name: &str) -> Result<()>;
}

/// [`DocumentStore`] backed by the AWS SDK client.
#[derive(Debug, Clone)]
pub struct SdkStore {
    client: Client,
}

impl SdkStore {
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: Client::new(sdk_config),
        }
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

impl From<Client> for SdkStore {
    fn from(client: Client) -> Self {
        Self::from_client(client)
    }
}

fn sdk_error<E>(err: E) -> Error
where
    aws_sdk_dynamodb::Error: From<E>,
{
    Error::store(aws_sdk_dynamodb::Error::from(err))
}

// DynamoDB rejects empty placeholder maps, so they are omitted instead.
fn non_empty<K, V>(map: HashMap<K, V>) -> Option<HashMap<K, V>> {
    if map.is_empty() {
        None
    } else {
        Some(map)
    }
}

fn into_items(items: Option<Vec<HashMap<String, AttributeValue>>>) -> Vec<Item> {
    items
        .unwrap_or_default()
        .into_iter()
        .map(Item::from)
        .collect()
}

#[async_trait]
impl DocumentStore for SdkStore {
    async fn update_item(&self, request: UpdateRequest) -> Result<()> {
        debug!(
            table = %request.table_name,
            expression = %request.update_expression,
            "UpdateItem"
        );
        self.client
            .update_item()
            .table_name(request.table_name)
            .set_key(Some(request.key))
            .update_expression(request.update_expression)
            .set_expression_attribute_names(non_empty(request.expression_attribute_names))
            .set_expression_attribute_values(non_empty(request.expression_attribute_values))
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }

    async fn delete_item(&self, request: DeleteRequest) -> Result<()> {
        debug!(table = %request.table_name, "DeleteItem");
        self.client
            .delete_item()
            .table_name(request.table_name)
            .set_key(Some(request.key))
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }

    async fn query(&self, request: QueryRequest) -> Result<Page> {
        debug!(
            table = %request.table_name,
            condition = %request.key_condition_expression,
            "Query"
        );
        let response = self
            .client
            .query()
            .table_name(request.table_name)
            .key_condition_expression(request.key_condition_expression)
            .set_expression_attribute_names(non_empty(request.expression_attribute_names))
            .set_expression_attribute_values(non_empty(request.expression_attribute_values))
            .set_limit(request.limit)
            .set_exclusive_start_key(request.exclusive_start_key)
            .send()
            .await
            .map_err(sdk_error)?;

        Ok(Page {
            items: into_items(response.items),
            last_evaluated_key: response.last_evaluated_key,
        })
    }

    async fn scan(&self, request: ScanRequest) -> Result<Page> {
        debug!(
            table = %request.table_name,
            filter = ?request.filter_expression,
            limit = ?request.limit,
            "Scan"
        );
        let response = self
            .client
            .scan()
            .table_name(request.table_name)
            .set_filter_expression(request.filter_expression)
            .set_expression_attribute_names(non_empty(request.expression_attribute_names))
            .set_expression_attribute_values(non_empty(request.expression_attribute_values))
            .set_limit(request.limit)
            .set_exclusive_start_key(request.exclusive_start_key)
            .send()
            .await
            .map_err(sdk_error)?;

        Ok(Page {
            items: into_items(response.items),
            last_evaluated_key: response.last_evaluated_key,
        })
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        let tables = self.client.list_tables().send().await.map_err(sdk_error)?;
        Ok(tables.table_names().to_vec())
    }

    async fn create_table(&self, table: &Table<'_>) -> Result<()> {
        let mut attribute_definitions = vec![AttributeDefinition::builder()
            .attribute_name(table.partition_key())
            .attribute_type(ScalarAttributeType::S)
            .build()?];

        let mut key_schema = vec![KeySchemaElement::builder()
            .attribute_name(table.partition_key())
            .key_type(KeyType::Hash)
            .build()?];

        if let Some(sort_key) = table.sort_key() {
            attribute_definitions.push(
                AttributeDefinition::builder()
                    .attribute_name(sort_key)
                    .attribute_type(ScalarAttributeType::S)
                    .build()?,
            );
            key_schema.push(
                KeySchemaElement::builder()
                    .attribute_name(sort_key)
                    .key_type(KeyType::Range)
                    .build()?,
            );
        }

        self.client
            .create_table()
            .table_name(table.name())
            .billing_mode(BillingMode::PayPerRequest)
            .set_attribute_definitions(Some(attribute_definitions))
            .set_key_schema(Some(key_schema))
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }

    async fn delete_table(&self, table_name: &str) -> Result<()> {
        self.client
            .delete_table()
            .table_name(table_name)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }
}
