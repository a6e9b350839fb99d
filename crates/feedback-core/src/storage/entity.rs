//! Table entity model

use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// One row in a partitioned table: keys plus string attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableEntity {
    partition_key: String,
    row_key: String,
    attributes: BTreeMap<String, String>,
}

impl TableEntity {
    #[must_use]
    pub fn new(partition_key: impl Into<String>, row_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            row_key: row_key.into(),
            attributes: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn partition_key(&self) -> &str {
        &self.partition_key
    }

    pub fn row_key(&self) -> &str {
        &self.row_key
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// JSON body for the table service's insert operation.
    ///
    /// Keys are emitted as `PartitionKey` / `RowKey`; attributes keep their names.
    pub fn to_wire_json(&self) -> Value {
        let mut object = Map::new();
        object.insert(
            "PartitionKey".to_string(),
            Value::String(self.partition_key.clone()),
        );
        object.insert("RowKey".to_string(), Value::String(self.row_key.clone()));
        for (name, value) in &self.attributes {
            object.insert(name.clone(), Value::String(value.clone()));
        }
        Value::Object(object)
    }
}
