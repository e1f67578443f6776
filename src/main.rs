use anyhow::Result;
use dynamodb_helpers::{logging, DynamoDb, Item, Table, DEFAULT_BATCH_SIZE};
use futures_util::StreamExt;
use tracing::info;

const TABLE_NAME: &str = "testing-products";
const PARTITION_KEY: &str = "category";
const SORT_KEY: &str = "product_name";

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_logging()?;
    dotenv::dotenv().ok();

    let ddb = DynamoDb::shared().await;
    info!("Target: {}", ddb.factory().config().await.target_display());

    ddb.check_auth().await?;

    let table = Table::new(TABLE_NAME, PARTITION_KEY, Some(SORT_KEY));
    if ddb.create_table_if_not_exists(&table).await? {
        info!("Created table '{}'", TABLE_NAME);
    }

    let item = Item::new()
        .set_string(PARTITION_KEY, "Electronics")
        .set_string(SORT_KEY, "Smartphone")
        .set_number("price", 599.99);
    ddb.insert_or_update(TABLE_NAME, PARTITION_KEY, &item, Some(SORT_KEY))
        .await?;

    match ddb.find_one(TABLE_NAME, PARTITION_KEY, "Electronics").await? {
        Some(found) => info!("Found: {:?}", found.get_number("price")),
        None => info!("Item not found"),
    }

    let affordable = ddb.find_within(TABLE_NAME, "price", &0, &1000).await?;
    info!("{} items priced between 0 and 1000", affordable.len());

    let mut batches = Box::pin(ddb.find_all(TABLE_NAME, DEFAULT_BATCH_SIZE));
    let mut page = 1;
    while let Some(batch) = batches.next().await {
        info!("Page {}: {} items", page, batch.len());
        page += 1;
    }

    Ok(())
}
