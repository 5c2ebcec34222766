//! Statement rewrite hooks.
//!
//! Schema features install hooks that rewrite a statement before it renders.
//! Hooks are keyed by table and grouped by phase. They receive the
//! in-progress part list and mutate it in place.
//!
//! Only the `Before*` phases are fired. The `After*` buckets accept
//! registrations but nothing invokes them yet.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::builder::{Fragment, QueryBuilder, QueryPart};
use crate::value::quote;

/// A table-scoped statement rewrite.
pub type Hook = Arc<dyn Fn(&mut Vec<QueryPart>) + Send + Sync>;

/// The statement phase a hook is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPhase {
    /// Before an `INSERT` renders.
    BeforeInsert,
    /// Reserved.
    AfterInsert,
    /// Before an `UPDATE` renders.
    BeforeUpdate,
    /// Reserved.
    AfterUpdate,
    /// Before a `SELECT` renders.
    BeforeSelect,
    /// Reserved.
    AfterSelect,
}

impl HookPhase {
    /// Bucket name used in log output.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::BeforeInsert => "beforeInsert",
            Self::AfterInsert => "afterInsert",
            Self::BeforeUpdate => "beforeUpdate",
            Self::AfterUpdate => "afterUpdate",
            Self::BeforeSelect => "beforeSelect",
            Self::AfterSelect => "afterSelect",
        }
    }
}

/// Adds `column` with a fresh v4 UUID to the `INSERT` being built.
///
/// Does nothing when there is no insert or the column is already supplied.
#[must_use]
pub fn generated_identifier(column: &str) -> Hook {
    let column = column.to_string();
    Arc::new(move |parts: &mut Vec<QueryPart>| {
        let Some(insert) = parts.iter_mut().find_map(|part| match &mut part.fragment {
            Fragment::Insert(insert) => Some(insert),
            _ => None,
        }) else {
            return;
        };
        if insert.columns.contains(&column) {
            return;
        }
        insert.columns.push(column.clone());
        insert.values.push(quote(&Uuid::new_v4().to_string()));
    })
}

/// Appends `updated_at = CURRENT_TIMESTAMP` to an `UPDATE` that has a
/// `WHERE` condition.
#[must_use]
pub fn touch_updated_at() -> Hook {
    Arc::new(|parts: &mut Vec<QueryPart>| {
        let filtered = parts
            .iter()
            .any(|part| matches!(part.fragment, Fragment::Filter(_)));
        if !filtered {
            return;
        }
        let Some(update) = parts.iter_mut().find_map(|part| match &mut part.fragment {
            Fragment::Update(update) => Some(update),
            _ => None,
        }) else {
            return;
        };
        if update.assignments.iter().any(|(c, _)| c == "updated_at") {
            return;
        }
        update
            .assignments
            .push((String::from("updated_at"), String::from("CURRENT_TIMESTAMP")));
    })
}

/// Identifies the hook phase and table of the statement held in `parts`.
#[must_use]
pub fn statement_phase(parts: &[QueryPart]) -> Option<(HookPhase, String)> {
    let mut projection = false;
    let mut from = None;
    for part in parts {
        match &part.fragment {
            Fragment::Insert(insert) => {
                return Some((HookPhase::BeforeInsert, insert.table.clone()))
            }
            Fragment::Update(update) => {
                return Some((HookPhase::BeforeUpdate, update.table.clone()))
            }
            Fragment::Projection(_) => projection = true,
            Fragment::From { table, .. } if from.is_none() => from = Some(table.clone()),
            _ => {}
        }
    }
    match (projection, from) {
        (true, Some(table)) => Some((HookPhase::BeforeSelect, table)),
        _ => None,
    }
}

fn invoke(hooks: &[Hook], parts: &mut Vec<QueryPart>) {
    for hook in hooks {
        hook(parts);
    }
}

/// Runs the `Before*` hooks matching the statement held by `statement`.
///
/// Insert and update hooks run once for the target table. Select hooks
/// registered under the table run once, and hooks registered under
/// `table.field` run once per filter on that field.
///
/// Returns the phase that was fired, if any.
pub fn run_before_hooks(statement: &mut QueryBuilder) -> Option<HookPhase> {
    if statement.has_literal() {
        return None;
    }
    let registry = statement.registry().clone();
    let parts = statement.parts_mut();
    let (phase, table) = statement_phase(parts)?;

    let hooks = registry.hooks(phase, &table);
    debug!(
        table = %table,
        phase = phase.name(),
        hooks = hooks.len(),
        "Running statement hooks"
    );
    invoke(&hooks, parts);

    if phase == HookPhase::BeforeSelect {
        let fields: Vec<String> = parts
            .iter()
            .filter_map(|part| match &part.fragment {
                Fragment::Filter(filter) => Some(filter.field.clone()),
                _ => None,
            })
            .collect();
        for field in fields {
            let hooks = registry.hooks(phase, &format!("{table}.{field}"));
            if !hooks.is_empty() {
                debug!(table = %table, field = %field, hooks = hooks.len(), "Running field hooks");
                invoke(&hooks, parts);
            }
        }
    }

    Some(phase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{InsertClause, UpdateClause};
    use crate::registry::Registry;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn insert_part(columns: &[&str]) -> QueryPart {
        QueryPart::new(Fragment::Insert(InsertClause {
            table: String::from("logs"),
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
            values: columns.iter().map(|_| String::from("1")).collect(),
        }))
    }

    #[test]
    fn test_generated_identifier_appends_column() {
        let mut parts = vec![insert_part(&["name"])];
        generated_identifier("id")(&mut parts);

        let Fragment::Insert(insert) = &parts[0].fragment else {
            panic!("expected insert");
        };
        assert_eq!(insert.columns, vec!["name", "id"]);
        let id = &insert.values[1];
        assert!(id.starts_with('"') && id.ends_with('"'));
        assert!(Uuid::parse_str(id.trim_matches('"')).is_ok());
    }

    #[test]
    fn test_generated_identifier_is_unique() {
        let mut first = vec![insert_part(&["name"])];
        let mut second = vec![insert_part(&["name"])];
        let hook = generated_identifier("id");
        hook(&mut first);
        hook(&mut second);
        assert_ne!(first, second);
    }

    #[test]
    fn test_generated_identifier_noop_without_insert() {
        let mut parts = vec![QueryPart::new(Fragment::Delete {
            table: String::from("logs"),
        })];
        let before = parts.clone();
        generated_identifier("id")(&mut parts);
        assert_eq!(parts, before);
    }

    #[test]
    fn test_generated_identifier_keeps_supplied_column() {
        let mut parts = vec![insert_part(&["id", "name"])];
        generated_identifier("id")(&mut parts);
        let Fragment::Insert(insert) = &parts[0].fragment else {
            panic!("expected insert");
        };
        assert_eq!(insert.columns.len(), 2);
    }

    fn update_parts(with_filter: bool) -> Vec<QueryPart> {
        let mut parts = vec![QueryPart::new(Fragment::Update(UpdateClause {
            table: String::from("users"),
            assignments: vec![(String::from("name"), String::from("\"John\""))],
        }))];
        if with_filter {
            parts.push(QueryPart::new(Fragment::Filter(crate::builder::Filter {
                field: String::from("id"),
                op: crate::builder::CompareOp::Eq,
                value: String::from("1"),
                alternate: false,
            })));
        }
        parts
    }

    #[test]
    fn test_touch_updated_at() {
        let mut parts = update_parts(true);
        touch_updated_at()(&mut parts);
        assert_eq!(parts.len(), 2);
        assert_eq!(
            parts[0].text(),
            "UPDATE users SET name = \"John\", updated_at = CURRENT_TIMESTAMP"
        );
    }

    #[test]
    fn test_touch_updated_at_requires_filter() {
        let mut parts = update_parts(false);
        touch_updated_at()(&mut parts);
        assert_eq!(parts[0].text(), "UPDATE users SET name = \"John\"");
    }

    #[test]
    fn test_statement_phase() {
        assert_eq!(
            statement_phase(&[insert_part(&["a"])]),
            Some((HookPhase::BeforeInsert, String::from("logs")))
        );
        assert_eq!(
            statement_phase(&update_parts(true)),
            Some((HookPhase::BeforeUpdate, String::from("users")))
        );
        let select = [
            QueryPart::new(Fragment::From {
                table: String::from("users"),
                alias: None,
            }),
            QueryPart::new(Fragment::Projection(vec![String::from("*")])),
        ];
        assert_eq!(
            statement_phase(&select),
            Some((HookPhase::BeforeSelect, String::from("users")))
        );
        assert_eq!(statement_phase(&[]), None);
    }

    #[test]
    fn test_select_field_hooks_fire_per_filter() {
        let registry = Registry::new();
        let table_calls = Arc::new(AtomicUsize::new(0));
        let field_calls = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&table_calls);
        registry.register_hook(
            HookPhase::BeforeSelect,
            "users",
            Arc::new(move |_: &mut Vec<QueryPart>| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        let counter = Arc::clone(&field_calls);
        registry.register_hook(
            HookPhase::BeforeSelect,
            "users.age",
            Arc::new(move |_: &mut Vec<QueryPart>| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        let mut qb = QueryBuilder::with_registry(registry);
        qb.select(&["*"])
            .from("users")
            .filter("age", 18)
            .or_filter("age", 21)
            .filter("name", "Ann");

        assert_eq!(run_before_hooks(&mut qb), Some(HookPhase::BeforeSelect));
        assert_eq!(table_calls.load(Ordering::SeqCst), 1);
        assert_eq!(field_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_after_buckets_are_never_fired() {
        let registry = Registry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        registry.register_hook(
            HookPhase::AfterInsert,
            "logs",
            Arc::new(move |_: &mut Vec<QueryPart>| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        let mut qb = QueryBuilder::with_registry(registry);
        qb.insert("logs", [("name", "x")]);
        run_before_hooks(&mut qb);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
