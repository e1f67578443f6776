use async_stream::stream;
use aws_sdk_dynamodb::types::AttributeValue;
use futures_util::{pin_mut, Stream, StreamExt};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{error, info};

use crate::config::StoreConfig;
use crate::dynamodb::{
    expression::{self, Comparison, Expression},
    item::to_attribute,
    ClientFactory, DeleteRequest, DocumentStore, Item, QueryRequest, ScanRequest, SdkStoreBuilder,
    StoreBuilder, Table, UpdateRequest,
};
use crate::error::{Error, Result};

/// Batch size used by [`DynamoDb::find_all`] callers that have no preference.
pub const DEFAULT_BATCH_SIZE: usize = 10;

static SHARED: OnceCell<DynamoDb> = OnceCell::const_new();

/// High-level helpers over a DynamoDB table.
///
/// Each operation builds the request parameters (expressions and
/// placeholder maps), sends it through the current store client and
/// reshapes the response into [`Item`]s.
///
/// # Operations
///
/// - **Upsert**: [`insert_or_update`](Self::insert_or_update)
/// - **Delete**: [`delete_one`](Self::delete_one)
/// - **Key lookups**: [`find_one`](Self::find_one), [`find_many`](Self::find_many)
/// - **Filtered scans**: [`find_many_by_field`](Self::find_many_by_field),
///   [`find_many_plain`](Self::find_many_plain), [`find_operated`](Self::find_operated),
///   [`find_within`](Self::find_within)
/// - **Paginated scan**: [`find_all`](Self::find_all), [`try_find_all`](Self::try_find_all)
///
/// List operations return an empty `Vec` when nothing matches; only
/// `find_one` returns `None`.
///
/// # Configuration
///
/// Region and credentials can be changed at runtime with
/// [`set_region`](Self::set_region) and [`set_credentials`](Self::set_credentials).
/// Each operation captures the client once when it starts, so a change only
/// affects operations issued after it.
///
/// # Error Handling
///
/// Validation errors are returned before any request is sent. Store errors
/// are returned as [`Error::Store`] wrapping the SDK's error, except in
/// [`find_all`](Self::find_all), which logs them and ends the stream.
#[derive(Debug, Clone)]
pub struct DynamoDb {
    factory: Arc<ClientFactory>,
}

impl DynamoDb {
    /// Creates a `DynamoDb` backed by the AWS SDK.
    pub async fn new(config: StoreConfig) -> Self {
        Self::with_builder(config, Arc::new(SdkStoreBuilder)).await
    }

    /// Creates a `DynamoDb` whose store clients come from `builder`.
    pub async fn with_builder(config: StoreConfig, builder: Arc<dyn StoreBuilder>) -> Self {
        Self {
            factory: Arc::new(ClientFactory::new(config, builder).await),
        }
    }

    /// Creates a `DynamoDb` from the `AWS_*` environment variables.
    pub async fn from_env() -> Self {
        Self::new(StoreConfig::from_env()).await
    }

    /// Process-wide instance, built from the environment on first use.
    pub async fn shared() -> &'static DynamoDb {
        SHARED.get_or_init(DynamoDb::from_env).await
    }

    pub fn factory(&self) -> &ClientFactory {
        &self.factory
    }

    /// Changes the region for every operation issued from now on.
    pub async fn set_region(&self, region: impl Into<String>) {
        self.factory.set_region(region).await;
    }

    /// Switches to static credentials for every operation issued from now on.
    pub async fn set_credentials(
        &self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) {
        self.factory
            .set_credentials(access_key_id, secret_access_key)
            .await;
    }

    // --- Table Operations ---

    /// Verifies authentication by attempting to list tables.
    pub async fn check_auth(&self) -> Result<()> {
        self.factory.store().list_tables().await.map_err(|e| {
            error!("Authentication failed: {}", e);
            Error::Authentication
        })?;
        info!("Authentication successful");
        Ok(())
    }

    /// Checks if a table exists.
    pub async fn table_exists(&self, table_name: &str) -> Result<bool> {
        let tables = self.factory.store().list_tables().await?;
        Ok(tables.iter().any(|name| name == table_name))
    }

    /// Creates a table if it doesn't exist. Returns `false` when it already did.
    pub async fn create_table_if_not_exists(&self, table: &Table<'_>) -> Result<bool> {
        let store = self.factory.store();
        if store
            .list_tables()
            .await?
            .iter()
            .any(|name| name == table.name())
        {
            info!("Table '{}' exists", table.name());
            return Ok(false);
        }

        store.create_table(table).await?;
        info!("Table '{}' created", table.name());
        Ok(true)
    }

    /// Deletes a table.
    pub async fn delete_table(&self, table_name: &str) -> Result<()> {
        self.factory.store().delete_table(table_name).await?;
        info!("Table '{table_name}' deleted");
        Ok(())
    }

    // --- Item Operations ---

    /// Writes every non-key attribute of `item`, creating the item if needed.
    ///
    /// The key is taken from the item itself. Fails with
    /// [`Error::NoFieldsToUpdate`] when the item holds only key attributes.
    pub async fn insert_or_update(
        &self,
        table_name: &str,
        partition_key: &str,
        item: &Item,
        sort_key: Option<&str>,
    ) -> Result<()> {
        let key_fields: Vec<&str> = std::iter::once(partition_key).chain(sort_key).collect();
        let update = expression::update_expression(item, &key_fields)?;

        let mut key = HashMap::with_capacity(key_fields.len());
        for field in key_fields {
            let value = item.get(field).ok_or_else(|| Error::MissingKey {
                field: field.to_string(),
            })?;
            key.insert(field.to_string(), value.clone());
        }

        self.factory
            .store()
            .update_item(UpdateRequest {
                table_name: table_name.to_string(),
                key,
                update_expression: update.expression,
                expression_attribute_names: update.names,
                expression_attribute_values: update.values,
            })
            .await?;

        info!("Item updated in '{table_name}'");
        Ok(())
    }

    /// Deletes the item whose partition key equals `key_value`.
    pub async fn delete_one<V>(
        &self,
        table_name: &str,
        partition_key: &str,
        key_value: &V,
    ) -> Result<()>
    where
        V: Serialize + ?Sized,
    {
        let key = HashMap::from([(partition_key.to_string(), to_attribute(key_value)?)]);

        self.factory
            .store()
            .delete_item(DeleteRequest {
                table_name: table_name.to_string(),
                key,
            })
            .await?;

        info!("Item deleted from '{table_name}'");
        Ok(())
    }

    // --- Query and Scan Operations ---

    /// First item whose partition key equals `key_value`, if any.
    pub async fn find_one<V>(
        &self,
        table_name: &str,
        partition_key: &str,
        key_value: &V,
    ) -> Result<Option<Item>>
    where
        V: Serialize + ?Sized,
    {
        let condition = expression::key_equals(partition_key, to_attribute(key_value)?);
        let page = self
            .factory
            .store()
            .query(QueryRequest {
                table_name: table_name.to_string(),
                key_condition_expression: condition.expression,
                expression_attribute_names: condition.names,
                expression_attribute_values: condition.values,
                limit: Some(1),
                ..Default::default()
            })
            .await?;
        Ok(page.items.into_iter().next())
    }

    /// Every item whose partition key equals `key_value`.
    pub async fn find_many<V>(
        &self,
        table_name: &str,
        partition_key: &str,
        key_value: &V,
    ) -> Result<Vec<Item>>
    where
        V: Serialize + ?Sized,
    {
        let condition = expression::key_equals(partition_key, to_attribute(key_value)?);
        query_all(
            self.factory.store().as_ref(),
            QueryRequest {
                table_name: table_name.to_string(),
                key_condition_expression: condition.expression,
                expression_attribute_names: condition.names,
                expression_attribute_values: condition.values,
                ..Default::default()
            },
        )
        .await
    }

    /// Scans for items whose `field` equals `value`.
    pub async fn find_many_by_field<V>(
        &self,
        table_name: &str,
        field: &str,
        value: &V,
    ) -> Result<Vec<Item>>
    where
        V: Serialize + ?Sized,
    {
        let filter = expression::field_equals(field, to_attribute(value)?);
        self.scan_filtered(table_name, filter).await
    }

    /// Scans with a caller-written filter expression.
    ///
    /// `filter_expression` and `values` are passed through untouched; a
    /// placeholder without a value is reported by DynamoDB, not here.
    pub async fn find_many_plain(
        &self,
        table_name: &str,
        filter_expression: &str,
        values: HashMap<String, AttributeValue>,
    ) -> Result<Vec<Item>> {
        let filter = Expression {
            expression: filter_expression.to_string(),
            names: HashMap::new(),
            values,
        };
        self.scan_filtered(table_name, filter).await
    }

    /// Scans with one comparison per field, joined by `AND`.
    ///
    /// Every field in `values` needs an operator in `operators`, and every
    /// value must marshal to a string or a number.
    pub async fn find_operated<V>(
        &self,
        table_name: &str,
        values: &HashMap<String, V>,
        operators: &HashMap<String, Comparison>,
    ) -> Result<Vec<Item>>
    where
        V: Serialize,
    {
        let values = values
            .iter()
            .map(|(field, value)| to_attribute(value).map(|value| (field.clone(), value)))
            .collect::<Result<HashMap<_, _>>>()?;
        let filter = expression::conjunction(&values, operators)?;
        self.scan_filtered(table_name, filter).await
    }

    /// Scans for items whose numeric `field` lies in `[start, end]`.
    ///
    /// Both bounds must marshal to finite numbers; anything else fails with
    /// [`Error::UnsupportedValue`] before a request is sent.
    pub async fn find_within<S, E>(
        &self,
        table_name: &str,
        field: &str,
        start: &S,
        end: &E,
    ) -> Result<Vec<Item>>
    where
        S: Serialize + ?Sized,
        E: Serialize + ?Sized,
    {
        let filter = expression::between(field, to_attribute(start)?, to_attribute(end)?)?;
        self.scan_filtered(table_name, filter).await
    }

    /// Streams the whole table in batches of at most `batch_size` items.
    ///
    /// Each step fetches one scan page. The stream ends after the page that
    /// carries no continuation key. A failed page is logged and ends the
    /// stream without surfacing the error; use
    /// [`try_find_all`](Self::try_find_all) to observe it.
    pub fn find_all(
        &self,
        table_name: &str,
        batch_size: usize,
    ) -> impl Stream<Item = Vec<Item>> + Send + 'static {
        let table = table_name.to_string();
        let pages = self.try_find_all(table_name, batch_size);

        stream! {
            pin_mut!(pages);
            while let Some(page) = pages.next().await {
                match page {
                    Ok(items) => {
                        yield items;
                    }
                    Err(e) => {
                        error!(table = %table, "Paginated scan stopped: {}", e);
                        break;
                    }
                }
            }
        }
    }

    /// Like [`find_all`](Self::find_all), but yields the error that ends
    /// the stream.
    pub fn try_find_all(
        &self,
        table_name: &str,
        batch_size: usize,
    ) -> impl Stream<Item = Result<Vec<Item>>> + Send + 'static {
        let store = self.factory.store();
        let table = table_name.to_string();
        let limit = i32::try_from(batch_size).unwrap_or(i32::MAX).max(1);

        stream! {
            let mut exclusive_start_key = None;
            loop {
                let request = ScanRequest {
                    table_name: table.clone(),
                    limit: Some(limit),
                    exclusive_start_key: exclusive_start_key.take(),
                    ..Default::default()
                };

                match store.scan(request).await {
                    Ok(page) => {
                        let last_page = page.last_evaluated_key.is_none();
                        exclusive_start_key = page.last_evaluated_key;
                        yield Ok(page.items);
                        if last_page {
                            break;
                        }
                    }
                    Err(e) => {
                        yield Err(e);
                        break;
                    }
                }
            }
        }
    }

    async fn scan_filtered(&self, table_name: &str, filter: Expression) -> Result<Vec<Item>> {
        scan_all(
            self.factory.store().as_ref(),
            ScanRequest {
                table_name: table_name.to_string(),
                filter_expression: (!filter.is_empty()).then_some(filter.expression),
                expression_attribute_names: filter.names,
                expression_attribute_values: filter.values,
                ..Default::default()
            },
        )
        .await
    }
}

/// Follows continuation keys until the last query page.
async fn query_all(store: &dyn DocumentStore, mut request: QueryRequest) -> Result<Vec<Item>> {
    let mut items = Vec::new();

    loop {
        let page = store.query(request.clone()).await?;
        items.extend(page.items);

        match page.last_evaluated_key {
            Some(key) => request.exclusive_start_key = Some(key),
            None => break,
        }
    }

    Ok(items)
}

/// Follows continuation keys until the last scan page.
async fn scan_all(store: &dyn DocumentStore, mut request: ScanRequest) -> Result<Vec<Item>> {
    let mut items = Vec::new();

    loop {
        let page = store.scan(request.clone()).await?;
        items.extend(page.items);

        match page.last_evaluated_key {
            Some(key) => request.exclusive_start_key = Some(key),
            None => break,
        }
    }

    Ok(items)
}
