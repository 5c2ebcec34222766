#![allow(dead_code)]

use sqlight_core::builder::{Fragment, QueryBuilder};
use sqlight_core::schema::ColumnOptions;
use sqlight_core::{hooks, Registry};

/// Renders whatever `build` composes on a fresh composer.
pub fn render_with(build: impl FnOnce(&mut QueryBuilder)) -> String {
    let mut qb = QueryBuilder::new();
    build(&mut qb);
    qb.render()
}

/// A registry holding `users (id, name, age)` defined through the DSL.
pub fn users_registry() -> Registry {
    let mut qb = QueryBuilder::new();
    qb.create_table_with("users", |t| {
        t.id();
        t.text_column("name", ColumnOptions::new());
        t.integer_column("age", ColumnOptions::new().nullable());
        Ok(())
    })
    .unwrap_or_else(|e| panic!("Failed to define users: {e}"));
    let _ = qb.render();
    qb.registry().clone()
}

/// Runs the before hooks, then renders.
pub fn render_hooked(qb: &mut QueryBuilder) -> String {
    let mut statement = qb.take();
    hooks::run_before_hooks(&mut statement);
    statement.build()
}

/// Columns and values of the first INSERT fragment.
pub fn insert_columns(qb: &QueryBuilder) -> (Vec<String>, Vec<String>) {
    qb.parts()
        .iter()
        .find_map(|part| match &part.fragment {
            Fragment::Insert(insert) => Some((insert.columns.clone(), insert.values.clone())),
            _ => None,
        })
        .unwrap_or_else(|| panic!("Expected an INSERT fragment in {:?}", qb.parts()))
}
