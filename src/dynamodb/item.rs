use aws_sdk_dynamodb::types::AttributeValue;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;

use crate::error::Result;

/// Represents a DynamoDB item: a map from attribute name to typed value.
///
/// No schema is enforced. Any attribute type DynamoDB accepts can be stored,
/// and native Rust values move in and out through `serde`:
///
/// - [`Item::from_serde`] marshals a serializable value into typed attributes.
/// - [`Item::to_serde`] unmarshals the attributes back into a native type.
///
/// # Example
///
/// ```
/// use dynamodb_helpers::Item;
///
/// let item = Item::new()
///     .set_string("user_id", "12345")
///     .set_string("username", "johndoe")
///     .set_number("age", 30.0);
///
/// assert_eq!(item.get_number("age"), Some(30.0));
/// ```
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Item {
    pub(crate) attributes: HashMap<String, AttributeValue>,
}

impl Item {
    /// Creates a new empty `Item`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marshals any serializable value into an item.
    ///
    /// The value must serialize as a map or struct.
    pub fn from_serde<T: Serialize>(value: &T) -> Result<Self> {
        let attributes: HashMap<String, AttributeValue> = serde_dynamo::to_item(value)?;
        Ok(Self { attributes })
    }

    /// Unmarshals the item into a native type.
    pub fn to_serde<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_dynamo::from_item(self.attributes.clone())?)
    }

    /// Sets a string attribute.
    pub fn set_string(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes
            .insert(key.into(), AttributeValue::S(value.into()));
        self
    }

    /// Sets a number attribute.
    ///
    /// DynamoDB stores numbers as decimal strings; this uses `f64` formatting.
    pub fn set_number(mut self, key: impl Into<String>, value: impl Into<f64>) -> Self {
        self.attributes
            .insert(key.into(), AttributeValue::N(value.into().to_string()));
        self
    }

    /// Sets an attribute of any type.
    pub fn set(mut self, key: impl Into<String>, value: AttributeValue) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Gets the raw attribute value.
    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    /// Gets the value of an attribute as a string.
    ///
    /// Returns `None` if the attribute doesn't exist or is not a string.
    pub fn get_string(&self, key: &str) -> Option<&String> {
        self.attributes.get(key).and_then(|av| av.as_s().ok())
    }

    /// Gets the value of an attribute as a number (f64).
    ///
    /// Returns `None` if the attribute doesn't exist, is not a number, or can't be parsed as f64.
    pub fn get_number(&self, key: &str) -> Option<f64> {
        self.attributes
            .get(key)
            .and_then(|av| av.as_n().ok())
            .and_then(|n| n.parse().ok())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Borrows the underlying attribute map.
    pub fn attributes(&self) -> &HashMap<String, AttributeValue> {
        &self.attributes
    }

    /// Consumes the item, returning the underlying attribute map.
    pub fn into_attributes(self) -> HashMap<String, AttributeValue> {
        self.attributes
    }
}

impl From<HashMap<String, AttributeValue>> for Item {
    fn from(attributes: HashMap<String, AttributeValue>) -> Self {
        Self { attributes }
    }
}

impl From<Item> for HashMap<String, AttributeValue> {
    fn from(item: Item) -> Self {
        item.attributes
    }
}

/// Marshals a single native value into an attribute value.
///
/// Strings become `S`, numbers `N`, booleans `BOOL`, maps and structs `M`.
pub fn to_attribute<T: Serialize + ?Sized>(value: &T) -> Result<AttributeValue> {
    Ok(serde_dynamo::to_attribute_value(value)?)
}
