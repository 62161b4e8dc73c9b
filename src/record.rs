//! Host record capabilities.
//!
//! The behavior never sees a record's schema. It reads and writes single
//! fields through [`Record`] and updates one column through [`RecordStore`].

use std::{
    collections::{HashMap, HashSet},
    fmt,
};

use async_trait::async_trait;

use crate::{
    error::RecordError,
    events::FileEvent,
    field::AttributeValue,
    naming::tableize,
};

/// Primary key as an ordered list of `(column, value)` pairs.
pub type PrimaryKey = Vec<(String, String)>;

/// Field access a record must offer to file behaviors.
pub trait Record: Send {
    /// Record type name, such as `UserProfile`.
    fn type_name(&self) -> &str;

    /// Backing table name.
    fn table_name(&self) -> String {
        tableize(self.type_name())
    }

    /// Primary key of the stored row.
    fn primary_key(&self) -> PrimaryKey;

    /// Reads a field. `None` means the record has no such field.
    fn field(&self, name: &str) -> Option<&AttributeValue>;

    /// Writes a field and returns the value it replaced.
    fn set_field(&mut self, name: &str, value: AttributeValue) -> AttributeValue;

    /// Whether the field accepts input in the current scenario.
    fn is_field_writable(&self, name: &str) -> bool;

    /// Whether the field exists.
    fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Marks a field as matching the stored row.
    fn mark_persisted(&mut self, _name: &str) {}

    /// Broadcasts a file event to listeners attached to the record.
    fn trigger(&mut self, _event: &mut FileEvent) {}
}

/// Direct column updates against the record's backing store.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Sets `column` to `value` on the row identified by `key`.
    ///
    /// Returns the number of rows affected.
    async fn update_column(
        &self,
        table: &str,
        key: &PrimaryKey,
        column: &str,
        value: Option<&str>,
    ) -> Result<u64, RecordError>;
}

/// Listener invoked by [`MapRecord::trigger`].
pub type FileListener = Box<dyn FnMut(&mut FileEvent) + Send>;

/// Map-backed [`Record`] for hosts without static record types.
pub struct MapRecord {
    type_name: String,
    table_name: Option<String>,
    key_columns: Vec<String>,
    fields: HashMap<String, AttributeValue>,
    read_only: HashSet<String>,
    dirty: HashSet<String>,
    listeners: Vec<FileListener>,
}

impl MapRecord {
    /// Creates an empty record of the given type keyed by `id`.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            table_name: None,
            key_columns: vec!["id".to_owned()],
            fields: HashMap::new(),
            read_only: HashSet::new(),
            dirty: HashSet::new(),
            listeners: Vec::new(),
        }
    }

    /// Overrides the table name derived from the type name.
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table_name = Some(table.into());
        self
    }

    /// Sets the primary key columns.
    pub fn with_key_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Sets a field value as loaded from storage.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Marks a field as not accepting input.
    pub fn with_read_only(mut self, name: impl Into<String>) -> Self {
        self.read_only.insert(name.into());
        self
    }

    /// Registers a file event listener.
    pub fn on_file_event<F>(&mut self, listener: F)
    where
        F: FnMut(&mut FileEvent) + Send + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Whether the field changed since it was loaded or last persisted.
    pub fn is_dirty(&self, name: &str) -> bool {
        self.dirty.contains(name)
    }

    /// Text value of a field.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(AttributeValue::as_text)
    }
}

impl Record for MapRecord {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn table_name(&self) -> String {
        self.table_name
            .clone()
            .unwrap_or_else(|| tableize(&self.type_name))
    }

    fn primary_key(&self) -> PrimaryKey {
        self.key_columns
            .iter()
            .map(|column| {
                let value = match self.fields.get(column) {
                    Some(AttributeValue::Text(value)) => value.clone(),
                    Some(AttributeValue::Int(value)) => value.to_string(),
                    _ => String::new(),
                };
                (column.clone(), value)
            })
            .collect()
    }

    fn field(&self, name: &str) -> Option<&AttributeValue> {
        self.fields.get(name)
    }

    fn set_field(&mut self, name: &str, value: AttributeValue) -> AttributeValue {
        self.dirty.insert(name.to_owned());
        self.fields.insert(name.to_owned(), value).unwrap_or_default()
    }

    fn is_field_writable(&self, name: &str) -> bool {
        !self.read_only.contains(name)
    }

    fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    fn mark_persisted(&mut self, name: &str) {
        self.dirty.remove(name);
    }

    fn trigger(&mut self, event: &mut FileEvent) {
        for listener in &mut self.listeners {
            listener(event);
        }
    }
}

impl fmt::Debug for MapRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapRecord")
            .field("type_name", &self.type_name)
            .field("table_name", &self.table_name)
            .field("key_columns", &self.key_columns)
            .field("fields", &self.fields)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
