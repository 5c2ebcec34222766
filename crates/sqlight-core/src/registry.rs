//! Per-database registry of table metadata and statement hooks.
//!
//! One [`Registry`] belongs to one logical database handle. It is cloned
//! into every composer and schema built against that handle, so all of them
//! see the same tables and hooks.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::hooks::{Hook, HookPhase};
use crate::metadata::{ColumnMetadata, TableColumns};

/// Receives the column map of every table once it is defined.
///
/// This is the boundary towards code generators that derive typed row
/// shapes from the schema.
pub trait SchemaObserver: Send + Sync {
    /// Called after `table` has been fully defined.
    fn table_defined(&self, table: &str, columns: &TableColumns);
}

#[derive(Default)]
struct RegistryState {
    tables: HashMap<String, TableColumns>,
    hooks: HashMap<HookPhase, Vec<(String, Hook)>>,
    observer: Option<Arc<dyn SchemaObserver>>,
}

/// Shared, append-only store of table metadata and hooks.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<RwLock<RegistryState>>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read();
        let mut tables: Vec<&str> = state.tables.keys().map(String::as_str).collect();
        tables.sort_unstable();
        f.debug_struct("Registry")
            .field("tables", &tables)
            .field("hook_phases", &state.hooks.len())
            .finish()
    }
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // The registry is only ever appended to, so a poisoned lock still
    // guards consistent data.
    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Marks `table` as defined.
    ///
    /// Redefining a table keeps its recorded columns; new columns are added
    /// through [`Registry::register_column`].
    pub fn define_table(&self, table: &str) {
        self.write().tables.entry(table.to_string()).or_default();
    }

    /// Records a column of `table`, creating the table entry if needed.
    pub fn register_column(&self, table: &str, column: &str, meta: ColumnMetadata) {
        self.write()
            .tables
            .entry(table.to_string())
            .or_default()
            .insert(column, meta);
    }

    /// Whether `table` has been defined.
    #[must_use]
    pub fn has_table(&self, table: &str) -> bool {
        self.read().tables.contains_key(table)
    }

    /// Returns a snapshot of the columns of `table`.
    #[must_use]
    pub fn table(&self, table: &str) -> Option<TableColumns> {
        self.read().tables.get(table).cloned()
    }

    /// Returns the metadata of `table.column`.
    #[must_use]
    pub fn column(&self, table: &str, column: &str) -> Option<ColumnMetadata> {
        self.read()
            .tables
            .get(table)
            .and_then(|cols| cols.get(column))
            .cloned()
    }

    /// Appends a hook to `phase` for `key`.
    ///
    /// `key` is a table name, or `table.field` for per-field select hooks.
    pub fn register_hook(&self, phase: HookPhase, key: &str, hook: Hook) {
        self.write()
            .hooks
            .entry(phase)
            .or_default()
            .push((key.to_string(), hook));
    }

    /// Hooks registered for `phase` under `key`, in registration order.
    #[must_use]
    pub fn hooks(&self, phase: HookPhase, key: &str) -> Vec<Hook> {
        self.read()
            .hooks
            .get(&phase)
            .map(|bucket| {
                bucket
                    .iter()
                    .filter(|(k, _)| k == key)
                    .map(|(_, hook)| Arc::clone(hook))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Installs the observer notified on table definition.
    pub fn set_observer(&self, observer: Arc<dyn SchemaObserver>) {
        self.write().observer = Some(observer);
    }

    /// Notifies the observer, if any, that `table` is complete.
    pub fn notify_table_defined(&self, table: &str) {
        let (observer, columns) = {
            let state = self.read();
            (state.observer.clone(), state.tables.get(table).cloned())
        };
        if let (Some(observer), Some(columns)) = (observer, columns) {
            observer.table_defined(table, &columns);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::QueryPart;
    use crate::metadata::SqlType;
    use std::sync::Mutex;

    #[test]
    fn test_define_and_lookup() {
        let registry = Registry::new();
        registry.define_table("users");
        registry.register_column("users", "id", ColumnMetadata::new(SqlType::Integer).primary());

        assert!(registry.has_table("users"));
        assert!(!registry.has_table("posts"));
        assert!(registry.column("users", "id").is_some_and(|m| m.is_primary));
        assert!(registry.column("users", "name").is_none());
    }

    #[test]
    fn test_redefine_keeps_columns() {
        let registry = Registry::new();
        registry.register_column("users", "name", ColumnMetadata::new(SqlType::Text));
        registry.define_table("users");
        registry.register_column("users", "age", ColumnMetadata::new(SqlType::Integer));

        let columns = registry.table("users").unwrap();
        assert_eq!(columns.names(), vec!["name", "age"]);
    }

    #[test]
    fn test_define_without_columns() {
        let registry = Registry::new();
        registry.define_table("empty");
        assert!(registry.has_table("empty"));
        assert!(registry.table("empty").is_some_and(|t| t.is_empty()));
    }

    #[test]
    fn test_clones_share_state() {
        let registry = Registry::new();
        let other = registry.clone();
        other.register_column("posts", "title", ColumnMetadata::new(SqlType::Text));
        assert!(registry.has_table("posts"));
    }

    #[test]
    fn test_hooks_filtered_by_key_in_order() {
        let registry = Registry::new();
        let hook: Hook = Arc::new(|parts: &mut Vec<QueryPart>| parts.clear());
        registry.register_hook(HookPhase::BeforeInsert, "users", Arc::clone(&hook));
        registry.register_hook(HookPhase::BeforeInsert, "posts", Arc::clone(&hook));
        registry.register_hook(HookPhase::BeforeInsert, "users", hook);

        assert_eq!(registry.hooks(HookPhase::BeforeInsert, "users").len(), 2);
        assert_eq!(registry.hooks(HookPhase::BeforeInsert, "posts").len(), 1);
        assert!(registry.hooks(HookPhase::BeforeUpdate, "users").is_empty());
    }

    struct Recorder(Mutex<Vec<(String, Vec<String>)>>);

    impl SchemaObserver for Recorder {
        fn table_defined(&self, table: &str, columns: &TableColumns) {
            let names = columns.names().into_iter().map(String::from).collect();
            self.0.lock().unwrap().push((table.to_string(), names));
        }
    }

    #[test]
    fn test_observer_notified() {
        let registry = Registry::new();
        let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
        registry.set_observer(recorder.clone());

        registry.register_column("users", "id", ColumnMetadata::new(SqlType::Integer));
        registry.notify_table_defined("users");
        registry.notify_table_defined("missing");

        let seen = recorder.0.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], (String::from("users"), vec![String::from("id")]));
    }
}
