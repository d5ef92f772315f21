//! # Identifier Resolver
//!
//! ACL fields sometimes hold an opaque sys_id (a UI action, a business rule,
//! ...) instead of a readable name. The resolver finds which table owns such an
//! id and turns it into a label like `Business Rule: Close incident`.
//!
//! ## Lookup order
//!
//! 1. `sys_metadata` tells which table owns the id; the owning record is read
//!    and the first non-blank field of [`NAME_FIELDS`] names it
//! 2. Otherwise each table of [`FALLBACK_TABLES`] is asked for the id directly
//! 3. Otherwise the id is unresolved
//!
//! Store errors never escape: a table we may not read is skipped and the search
//! moves on. Table-scoped errors (access denied, unknown table) are routine and
//! logged at `debug`; anything else (transport, malformed responses) is logged
//! at `warn` so a broken session stays visible.
//!
//! A resolver memoises its answers. One resolver lives for exactly one profile
//! build, so every rule sharing an operation id gets the same label.

use std::collections::HashMap;
use tracing::{debug, warn};

use crate::labels::{table_label, FALLBACK_NAME_FIELDS, FALLBACK_TABLES, NAME_FIELDS, UNKNOWN_NAME, UNNAMED_RECORD};
use crate::schema::{fields, looks_like_sys_id, METADATA_TABLE, SYS_ID};
use crate::store::{Filter, Record, RecordStore};
use crate::error::{StoreError, StoreResult};

/// A sys_id resolved to its owning table and a readable name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRecord {
    /// Owning table
    pub table: String,
    /// Readable record name
    pub name: String,
    /// `<table label>: <name>`
    pub display_name: String,
}

impl ResolvedRecord {
    fn new(table: &str, name: &str) -> Self {
        Self {
            table: table.to_string(),
            name: name.to_string(),
            display_name: format!("{}: {}", table_label(table), name),
        }
    }
}

/// Resolves opaque sys_ids to readable labels.
pub struct IdentifierResolver<'a, S: RecordStore + ?Sized> {
    store: &'a S,
    cache: HashMap<String, Option<ResolvedRecord>>,
}

impl<'a, S: RecordStore + ?Sized> IdentifierResolver<'a, S> {
    /// Create a resolver with an empty cache.
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            cache: HashMap::new(),
        }
    }

    /// Resolve a sys_id.
    ///
    /// The caller decides whether `id` is an identifier at all (see
    /// [`looks_like_sys_id`]); this method always performs the lookup on a
    /// cache miss.
    ///
    /// # Returns
    ///
    /// `None` when neither the metadata index nor any fallback table knows the id
    pub async fn resolve(&mut self, id: &str) -> Option<ResolvedRecord> {
        if let Some(cached) = self.cache.get(id) {
            return cached.clone();
        }

        let resolved = match self.from_metadata(id).await {
            Some(found) => Some(found),
            None => self.from_fallback_tables(id).await,
        };

        if resolved.is_none() {
            debug!(sys_id = %id, "Identifier did not resolve");
        }
        self.cache.insert(id.to_string(), resolved.clone());
        resolved
    }

    /// Label for an ACL operation.
    ///
    /// Readable operations are returned unchanged. Opaque ones resolve to their
    /// owning record, or to an `Unknown Operation` label naming the table.
    pub async fn operation_label(&mut self, operation: &str, table: &str) -> String {
        if !looks_like_sys_id(operation) {
            return operation.to_string();
        }

        match self.resolve(operation).await {
            Some(found) => found.display_name,
            None => {
                let prefix: String = operation.chars().take(8).collect();
                let table = if table.is_empty() { "unknown" } else { table };
                format!("Unknown Operation: {}... (on table: {})", prefix, table)
            }
        }
    }

    /// Label for an ACL name.
    ///
    /// Only 32-character names without a field separator are treated as ids.
    pub async fn table_label(&mut self, table: &str) -> String {
        if looks_like_sys_id(table) && !table.contains('.') {
            if let Some(found) = self.resolve(table).await {
                return found.display_name;
            }
        }
        table.to_string()
    }

    /// Label for an ACL type.
    pub async fn type_label(&mut self, rule_type: &str) -> String {
        if looks_like_sys_id(rule_type) {
            if let Some(found) = self.resolve(rule_type).await {
                return found.display_name;
            }
        }
        rule_type.to_string()
    }

    async fn from_metadata(&self, id: &str) -> Option<ResolvedRecord> {
        let owner = match self.owning_table(id).await {
            Ok(Some(table)) => table,
            Ok(None) => return None,
            Err(e) => {
                log_store_error(METADATA_TABLE, &e);
                return None;
            }
        };

        match self.store.get(&owner, id).await {
            Ok(Some(record)) => {
                let name = first_field(&record, NAME_FIELDS).unwrap_or(UNNAMED_RECORD);
                Some(ResolvedRecord::new(&owner, name))
            }
            Ok(None) => {
                debug!(table = %owner, sys_id = %id, "Owning record missing, searching known tables");
                None
            }
            Err(e) => {
                log_store_error(&owner, &e);
                None
            }
        }
    }

    async fn owning_table(&self, id: &str) -> StoreResult<Option<String>> {
        let rows = self
            .store
            .query(METADATA_TABLE, &[Filter::eq(SYS_ID, id)])
            .await?;
        Ok(rows
            .first()
            .and_then(|row| row.field(fields::CLASS_NAME))
            .map(str::to_string))
    }

    async fn from_fallback_tables(&self, id: &str) -> Option<ResolvedRecord> {
        for table in FALLBACK_TABLES {
            match self.store.get(table, id).await {
                Ok(Some(record)) => {
                    let name = first_field(&record, FALLBACK_NAME_FIELDS).unwrap_or(UNKNOWN_NAME);
                    return Some(ResolvedRecord::new(table, name));
                }
                Ok(None) => continue,
                Err(e) => {
                    log_store_error(table, &e);
                    continue;
                }
            }
        }
        None
    }
}

fn log_store_error(table: &str, error: &StoreError) {
    if error.is_table_scoped() {
        debug!(table = %table, error = %error, "Skipping unreadable table");
    } else {
        warn!(table = %table, error = %error, "Store request failed during identifier lookup");
    }
}

fn first_field<'r>(record: &'r Record, candidates: &[&str]) -> Option<&'r str> {
    candidates.iter().find_map(|field| record.field(field))
}
