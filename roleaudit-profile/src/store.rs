//! # Record Store
//!
//! The seam between the profile builder and the instance that holds the role
//! and ACL metadata. A store answers two questions: "which records of this
//! table match these filters" and "give me this record by sys_id".
//!
//! ## Implementations
//!
//! - [`MemoryStore`]: in-process tables, used by tests and demos
//! - `roleaudit_client::TableApiClient`: the instance REST Table API

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::{StoreError, StoreResult};
use crate::schema::SYS_ID;

/// A single record as a flat field-name to value mapping.
///
/// Values are kept as the store returns them; blank values read as absent.
///
/// # Example
///
/// ```
/// use roleaudit_profile::store::Record;
///
/// let record = Record::new()
///     .with("sys_id", "0123456789abcdef0123456789abcdef")
///     .with("name", "itil")
///     .with("description", "");
///
/// assert_eq!(record.field("name"), Some("itil"));
/// assert_eq!(record.field("description"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    fields: HashMap<String, String>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field setter.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a field value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Get a field value.
    ///
    /// # Returns
    ///
    /// `None` when the field is missing or blank
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    /// The record's sys_id, if present.
    pub fn id(&self) -> Option<&str> {
        self.field(SYS_ID)
    }

    /// Raw (possibly blank) field value.
    pub fn raw(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut record = Record::new();
        for (name, value) in iter {
            record.set(name, value);
        }
        record
    }
}

/// A query condition on one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Filter {
    /// `field = value`
    Eq {
        /// Field name
        field: String,
        /// Expected value
        value: String,
    },
    /// `field IN (values...)`
    In {
        /// Field name
        field: String,
        /// Accepted values
        values: Vec<String>,
    },
}

impl Filter {
    /// Equality condition.
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Membership condition, used for batch fetches by sys_id.
    pub fn one_of<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Filter::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Check whether a record satisfies this condition.
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Filter::Eq { field, value } => record.raw(field) == Some(value.as_str()),
            Filter::In { field, values } => record
                .raw(field)
                .map(|actual| values.iter().any(|v| v == actual))
                .unwrap_or(false),
        }
    }
}

/// Read-only access to the instance's records.
///
/// Calls are awaited one at a time by the profile builder; implementations
/// need not be reentrant-fast, only `Send + Sync`.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Return every record of `table` matching all `filters`, in store order.
    async fn query(&self, table: &str, filters: &[Filter]) -> StoreResult<Vec<Record>>;

    /// Fetch one record by sys_id.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when the record does not exist
    async fn get(&self, table: &str, id: &str) -> StoreResult<Option<Record>>;
}

#[async_trait]
impl<S: RecordStore + ?Sized> RecordStore for Arc<S> {
    async fn query(&self, table: &str, filters: &[Filter]) -> StoreResult<Vec<Record>> {
        (**self).query(table, filters).await
    }

    async fn get(&self, table: &str, id: &str) -> StoreResult<Option<Record>> {
        (**self).get(table, id).await
    }
}

/// One call observed by a [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    /// A filtered query
    Query {
        /// Table name
        table: String,
        /// Filters passed
        filters: Vec<Filter>,
    },
    /// A get by sys_id
    Get {
        /// Table name
        table: String,
        /// Requested sys_id
        id: String,
    },
}

/// In-memory record store.
///
/// Tables keep insertion order so query results are deterministic. Tables can
/// be made to fail (access denied, or any other store error) to exercise error
/// handling, and every call is recorded for inspection.
///
/// # Example
///
/// ```rust,no_run
/// use roleaudit_profile::store::{Filter, MemoryStore, Record, RecordStore};
///
/// async fn example() {
///     let store = MemoryStore::new()
///         .with_record("sys_user_role", Record::new().with("sys_id", "r1").with("name", "itil"));
///
///     let found = store
///         .query("sys_user_role", &[Filter::eq("name", "itil")])
///         .await
///         .unwrap();
///     assert_eq!(found.len(), 1);
/// }
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Records per table
    tables: HashMap<String, Vec<Record>>,
    /// Tables that answer with an error
    failures: HashMap<String, StoreError>,
    /// Call log
    calls: Mutex<Vec<StoreCall>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with_record(mut self, table: impl Into<String>, record: Record) -> Self {
        self.insert(table, record);
        self
    }

    /// Builder-style access denial for a table.
    pub fn with_denied_table(self, table: impl Into<String>) -> Self {
        let table = table.into();
        let error = StoreError::AccessDenied(table.clone());
        self.with_failing_table(table, error)
    }

    /// Builder-style failure: every call on `table` answers `error`.
    pub fn with_failing_table(mut self, table: impl Into<String>, error: StoreError) -> Self {
        self.failures.insert(table.into(), error);
        self
    }

    /// Append a record to a table.
    pub fn insert(&mut self, table: impl Into<String>, record: Record) {
        self.tables.entry(table.into()).or_default().push(record);
    }

    /// All calls made so far, in order.
    pub async fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().await.clone()
    }

    /// Number of queries issued against `table`.
    pub async fn query_count(&self, table: &str) -> usize {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|call| matches!(call, StoreCall::Query { table: t, .. } if t == table))
            .count()
    }

    fn check_access(&self, table: &str) -> StoreResult<()> {
        match self.failures.get(table) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn query(&self, table: &str, filters: &[Filter]) -> StoreResult<Vec<Record>> {
        self.calls.lock().await.push(StoreCall::Query {
            table: table.to_string(),
            filters: filters.to_vec(),
        });
        self.check_access(table)?;

        Ok(self
            .tables
            .get(table)
            .map(|records| {
                records
                    .iter()
                    .filter(|record| filters.iter().all(|f| f.matches(record)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get(&self, table: &str, id: &str) -> StoreResult<Option<Record>> {
        self.calls.lock().await.push(StoreCall::Get {
            table: table.to_string(),
            id: id.to_string(),
        });
        self.check_access(table)?;

        Ok(self
            .tables
            .get(table)
            .and_then(|records| records.iter().find(|r| r.raw(SYS_ID) == Some(id)))
            .cloned())
    }
}
