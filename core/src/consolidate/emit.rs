//! Serialization of catalog objects into consolidated up/down SQL pairs.

use std::collections::BTreeSet;

use crate::catalog::{Catalog, Domain, EnumType, Index, Table, View};
use crate::consolidate::graph::{DependencyGraph, ObjectKind};
use crate::migrate::ConsolidatedMigration;

/// Walks the sorted object list and renders one migration pair per
/// surviving domain, table, and view.
///
/// Enums are never emitted standalone: each is inlined into the up SQL of
/// the first table that requires it, tracked so it appears exactly once.
pub struct Emitter<'a> {
    catalog: &'a Catalog,
    graph: &'a DependencyGraph,
    enums_emitted: BTreeSet<String>,
}

impl<'a> Emitter<'a> {
    pub fn new(catalog: &'a Catalog, graph: &'a DependencyGraph) -> Self {
        Self {
            catalog,
            graph,
            enums_emitted: BTreeSet::new(),
        }
    }

    pub fn generate(&mut self, ordered: &[String]) -> Vec<ConsolidatedMigration> {
        let mut migrations = Vec::new();
        let mut number = 1;

        for name in ordered {
            let Some(node) = self.graph.node(name) else {
                continue;
            };
            let migration = match node.kind {
                ObjectKind::Domain => self.catalog.domains.get(name).map(|domain| {
                    ConsolidatedMigration {
                        number,
                        name: format!("create-{}-domain", domain.name),
                        up_sql: domain_sql(domain),
                        down_sql: format!("DROP DOMAIN IF EXISTS {};\n", domain.name),
                    }
                }),
                ObjectKind::Enum => None,
                ObjectKind::Table => self.catalog.tables.get(name).map(|table| {
                    ConsolidatedMigration {
                        number,
                        name: format!("create-{}", table.name),
                        up_sql: self.table_up_sql(table),
                        down_sql: format!("DROP TABLE IF EXISTS {} CASCADE;\n", table.name),
                    }
                }),
                ObjectKind::View => self.catalog.views.get(name).map(|view| {
                    ConsolidatedMigration {
                        number,
                        name: format!("create-{}-view", view.name),
                        up_sql: view_sql(view),
                        down_sql: format!("DROP VIEW IF EXISTS {} CASCADE;\n", view.name),
                    }
                }),
            };
            if let Some(migration) = migration {
                migrations.push(migration);
                number += 1;
            }
        }

        migrations
    }

    fn table_up_sql(&mut self, table: &Table) -> String {
        let mut sql = String::new();

        let enum_block = self.required_enum_sql(table);
        if !enum_block.is_empty() {
            sql.push_str(&enum_block);
            sql.push('\n');
        }

        sql.push_str(&table_sql(table));
        sql
    }

    /// CREATE TYPE blocks for the table's required enums that no earlier
    /// migration has already inlined.
    fn required_enum_sql(&mut self, table: &Table) -> String {
        let mut sql = String::new();
        for enum_name in &table.required_enums {
            if self.enums_emitted.contains(enum_name) {
                continue;
            }
            let Some(enum_type) = self.catalog.enums.get(enum_name) else {
                continue;
            };
            sql.push_str(&enum_sql(enum_type));
            sql.push_str("\n\n");
            self.enums_emitted.insert(enum_name.clone());
        }
        sql.trim().to_string()
    }
}

fn enum_sql(enum_type: &EnumType) -> String {
    let mut sql = String::new();
    sql.push_str(&format!("DROP TYPE IF EXISTS {};\n", enum_type.name));
    sql.push_str(&format!("CREATE TYPE {} AS ENUM (\n", enum_type.name));
    for (i, value) in enum_type.values.iter().enumerate() {
        sql.push_str(&format!("    '{}'", value));
        if i < enum_type.values.len() - 1 {
            sql.push(',');
        }
        sql.push('\n');
    }
    sql.push_str(");\n");

    if let Some(comment) = non_empty(&enum_type.comment) {
        sql.push_str(&format!(
            "\nCOMMENT ON TYPE {} IS '{}';\n",
            enum_type.name,
            escape_comment(comment)
        ));
    }

    sql
}

fn table_sql(table: &Table) -> String {
    let mut sql = String::new();
    sql.push_str(&format!("CREATE TABLE {} (\n", table.name));

    for (i, column_name) in table.column_order.iter().enumerate() {
        let Some(column) = table.columns.get(column_name) else {
            continue;
        };
        sql.push_str("    ");
        sql.push_str(&column_def(column));

        let needs_comma = i < table.column_order.len() - 1
            || table.primary_key.is_some()
            || !table.checks.is_empty()
            || !table.uniques.is_empty()
            || !table.foreign_keys.is_empty();
        if needs_comma {
            sql.push(',');
        }
        sql.push('\n');
    }

    if let Some(pk) = &table.primary_key {
        sql.push_str(&format!("    PRIMARY KEY ({})", pk.join(", ")));
        let needs_comma =
            !table.checks.is_empty() || !table.uniques.is_empty() || !table.foreign_keys.is_empty();
        if needs_comma {
            sql.push(',');
        }
        sql.push('\n');
    }

    for (i, unique) in table.uniques.iter().enumerate() {
        sql.push_str(&format!("    UNIQUE ({})", unique.columns.join(", ")));
        let needs_comma = i < table.uniques.len() - 1
            || !table.checks.is_empty()
            || !table.foreign_keys.is_empty();
        if needs_comma {
            sql.push(',');
        }
        sql.push('\n');
    }

    for (i, check) in table.checks.iter().enumerate() {
        sql.push_str(&format!("    CHECK ({})", check.expression));
        let needs_comma = i < table.checks.len() - 1 || !table.foreign_keys.is_empty();
        if needs_comma {
            sql.push(',');
        }
        sql.push('\n');
    }

    for (i, fk) in table.foreign_keys.iter().enumerate() {
        sql.push_str(&format!(
            "    FOREIGN KEY ({}) REFERENCES {} ({})",
            fk.columns.join(", "),
            fk.referenced_table,
            fk.referenced_columns.join(", ")
        ));
        if let Some(action) = &fk.on_delete {
            sql.push_str(&format!(" ON DELETE {}", action));
        }
        if let Some(action) = &fk.on_update {
            sql.push_str(&format!(" ON UPDATE {}", action));
        }
        if i < table.foreign_keys.len() - 1 {
            sql.push(',');
        }
        sql.push('\n');
    }

    sql.push_str(");\n");

    for index in &table.indexes {
        sql.push('\n');
        sql.push_str(&index_sql(index, &table.name));
    }

    if let Some(comment) = non_empty(&table.comment) {
        sql.push_str(&format!(
            "\nCOMMENT ON TABLE {} IS '{}';\n",
            table.name,
            escape_comment(comment)
        ));
    }

    // column comments follow column order so output stays deterministic
    for column_name in &table.column_order {
        if let Some(comment) = table.column_comments.get(column_name) {
            sql.push_str(&format!(
                "COMMENT ON COLUMN {}.{} IS '{}';\n",
                table.name,
                column_name,
                escape_comment(comment)
            ));
        }
    }

    sql
}

/// `<name> <type> [DEFAULT <expr>] [NOT NULL]`
fn column_def(column: &crate::catalog::Column) -> String {
    let mut def = String::new();
    def.push_str(&column.name);
    def.push(' ');
    def.push_str(&column.data_type);
    if let Some(default) = &column.default {
        def.push_str(" DEFAULT ");
        def.push_str(default);
    }
    if !column.nullable {
        def.push_str(" NOT NULL");
    }
    def
}

fn index_sql(index: &Index, table_name: &str) -> String {
    let mut sql = String::new();
    if index.unique {
        sql.push_str("CREATE UNIQUE INDEX ");
    } else {
        sql.push_str("CREATE INDEX ");
    }
    sql.push_str(&format!(
        "{} ON {} ({})",
        index.name,
        table_name,
        index.columns.join(", ")
    ));
    if let Some(predicate) = &index.predicate {
        sql.push_str(&format!(" WHERE {}", predicate));
    }
    sql.push_str(";\n");
    sql
}

fn domain_sql(domain: &Domain) -> String {
    let mut sql = String::new();
    sql.push_str(&format!("DROP DOMAIN IF EXISTS {};\n", domain.name));
    sql.push_str(&format!("CREATE DOMAIN {} AS {}", domain.name, domain.base_type));
    if let Some(default) = &domain.default {
        sql.push_str(&format!(" DEFAULT {}", default));
    }
    if let Some(check) = &domain.check {
        sql.push_str(&format!(" CHECK ({})", check));
    }
    sql.push_str(";\n");

    if let Some(comment) = non_empty(&domain.comment) {
        sql.push_str(&format!(
            "\nCOMMENT ON DOMAIN {} IS '{}';\n",
            domain.name,
            escape_comment(comment)
        ));
    }

    sql
}

fn view_sql(view: &View) -> String {
    let mut sql = String::new();
    sql.push_str(&view.definition);
    if !view.definition.trim_end().ends_with(';') {
        // the terminator was consumed when statements were split
        sql.push(';');
    }
    sql.push('\n');

    if let Some(comment) = non_empty(&view.comment) {
        sql.push_str(&format!(
            "\nCOMMENT ON VIEW {} IS '{}';\n",
            view.name,
            escape_comment(comment)
        ));
    }

    sql
}

fn escape_comment(comment: &str) -> String {
    comment.replace('\'', "''")
}

fn non_empty(comment: &Option<String>) -> Option<&str> {
    comment.as_deref().filter(|c| !c.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Column;
    use crate::consolidate::graph::analyze_enum_usage;

    fn consolidate(catalog: &mut Catalog) -> Vec<ConsolidatedMigration> {
        analyze_enum_usage(catalog);
        let graph = DependencyGraph::build(catalog);
        let ordered = graph.topological_sort().unwrap();
        Emitter::new(catalog, &graph).generate(&ordered)
    }

    #[test]
    fn column_serialization_puts_default_before_not_null() {
        let mut column = Column::new("n", "int");
        column.nullable = false;
        column.default = Some("0".into());
        assert_eq!(column_def(&column), "n int DEFAULT 0 NOT NULL");
    }

    #[test]
    fn table_body_has_no_trailing_comma() {
        let mut table = Table::new("users");
        table.add_column(Column::new("id", "int"));
        let mut name = Column::new("name", "text");
        name.nullable = false;
        table.add_column(name);
        table.primary_key = Some(vec!["id".into()]);

        assert_eq!(
            table_sql(&table),
            "CREATE TABLE users (\n    id int,\n    name text NOT NULL,\n    PRIMARY KEY (id)\n);\n"
        );
    }

    #[test]
    fn enum_is_inlined_into_first_requiring_table_only() {
        let mut catalog = Catalog::new();
        let mut status = EnumType::new("status");
        status.created_in = 1;
        status.add_value("a");
        catalog.insert_enum(status);
        for (name, number) in [("first", 2), ("second", 3)] {
            let mut table = Table::new(name);
            table.created_in = number;
            table.add_column(Column::new("s", "status"));
            catalog.insert_table(table);
        }

        let migrations = consolidate(&mut catalog);
        assert_eq!(migrations.len(), 2);
        assert_eq!(migrations[0].name, "create-first");
        assert!(migrations[0].up_sql.starts_with("DROP TYPE IF EXISTS status;\n"));
        assert!(migrations[0].up_sql.contains("CREATE TYPE status AS ENUM"));
        assert!(!migrations[1].up_sql.contains("CREATE TYPE"));
    }

    #[test]
    fn enum_required_by_no_table_is_absent_from_output() {
        let mut catalog = Catalog::new();
        catalog.insert_enum(EnumType::new("orphan"));
        let mut table = Table::new("t");
        table.created_in = 1;
        table.add_column(Column::new("id", "int"));
        catalog.insert_table(table);

        let migrations = consolidate(&mut catalog);
        assert_eq!(migrations.len(), 1);
        assert!(!migrations[0].up_sql.contains("orphan"));
    }

    #[test]
    fn numbers_run_sequentially_across_kinds() {
        let mut catalog = Catalog::new();
        catalog.insert_domain(Domain {
            name: "d".into(),
            base_type: "int".into(),
            ..Domain::default()
        });
        let mut table = Table::new("t");
        table.add_column(Column::new("id", "int"));
        catalog.insert_table(table);
        let mut view = View::new("v");
        view.definition = "CREATE VIEW v AS SELECT * FROM t".into();
        view.extract_dependencies();
        catalog.insert_view(view);

        let migrations = consolidate(&mut catalog);
        let numbers: Vec<u32> = migrations.iter().map(|m| m.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(migrations[0].name, "create-d-domain");
        assert_eq!(migrations[1].name, "create-t");
        assert_eq!(migrations[2].name, "create-v-view");
    }

    #[test]
    fn domain_sql_carries_default_and_check() {
        let domain = Domain {
            name: "pct".into(),
            base_type: "numeric(5,2)".into(),
            default: Some("0".into()),
            check: Some("VALUE >= 0".into()),
            ..Domain::default()
        };
        assert_eq!(
            domain_sql(&domain),
            "DROP DOMAIN IF EXISTS pct;\nCREATE DOMAIN pct AS numeric(5,2) DEFAULT 0 CHECK (VALUE >= 0);\n"
        );
    }

    #[test]
    fn view_sql_appends_missing_terminator() {
        let mut view = View::new("v");
        view.definition = "CREATE VIEW v AS SELECT 1".into();
        assert_eq!(view_sql(&view), "CREATE VIEW v AS SELECT 1;\n");
    }

    #[test]
    fn comments_escape_apostrophes() {
        let mut table = Table::new("t");
        table.add_column(Column::new("id", "int"));
        table.comment = Some("the 'main' table".into());
        table.set_column_comment("id", "it's the key");

        let sql = table_sql(&table);
        assert!(sql.contains("COMMENT ON TABLE t IS 'the ''main'' table';"));
        assert!(sql.contains("COMMENT ON COLUMN t.id IS 'it''s the key';"));
    }

    #[test]
    fn indexes_follow_the_create_table() {
        let mut table = Table::new("t");
        table.add_column(Column::new("a", "int"));
        table.add_index(Index {
            name: "ix_a".into(),
            columns: vec!["a".into()],
            unique: true,
            predicate: Some("a > 0".into()),
        });

        let sql = table_sql(&table);
        assert!(sql.contains("\nCREATE UNIQUE INDEX ix_a ON t (a) WHERE a > 0;\n"));
    }
}
