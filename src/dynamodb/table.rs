/// DynamoDB table key layout.
///
/// Only the key attributes are described; every other attribute is
/// schemaless and lives in the items themselves.
///
/// - **Partition Key**: Determines the partition where the item is stored.
/// - **Sort Key**: Optional. Orders items sharing a partition key.
///
/// Tables created from this description use on-demand billing and string key
/// attributes.
///
/// # Example
///
/// ```
/// use dynamodb_helpers::Table;
///
/// let table = Table::new("user_messages", "user_id", Some("timestamp"));
/// assert_eq!(table.key_fields(), vec!["user_id", "timestamp"]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Table<'a> {
    name: &'a str,
    partition_key: &'a str,
    sort_key: Option<&'a str>,
}

impl<'a> Table<'a> {
    /// Creates a new `Table` instance.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the DynamoDB table.
    /// * `partition_key` - The name of the partition key attribute.
    /// * `sort_key` - The name of the sort key attribute, if any.
    pub fn new(name: &'a str, partition_key: &'a str, sort_key: Option<&'a str>) -> Self {
        Self {
            name,
            partition_key,
            sort_key,
        }
    }

    /// Returns the name of the table.
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// Returns the partition key of the table.
    pub fn partition_key(&self) -> &'a str {
        self.partition_key
    }

    /// Returns the sort key of the table, if any.
    pub fn sort_key(&self) -> Option<&'a str> {
        self.sort_key
    }

    /// Partition key followed by the sort key, if any.
    pub fn key_fields(&self) -> Vec<&'a str> {
        std::iter::once(self.partition_key)
            .chain(self.sort_key)
            .collect()
    }
}
