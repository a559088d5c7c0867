//! Folding recognized statements into the catalog.

use log::debug;

use crate::ast::{AlterOp, CommentTarget, Statement};
use crate::catalog::{Catalog, Column, Domain, EnumType, Index, Table, View};
use crate::parser::table_def::TableDefParser;

/// Applies statements to the catalog in migration order.
///
/// The current migration number is stamped as `created_in` on objects the
/// statement creates; later alterations never advance it.
pub struct Applier<'a> {
    catalog: &'a mut Catalog,
    table_def: TableDefParser,
    current_migration: u32,
}

impl<'a> Applier<'a> {
    pub fn new(catalog: &'a mut Catalog) -> Self {
        Self {
            catalog,
            table_def: TableDefParser::new(),
            current_migration: 0,
        }
    }

    pub fn set_current_migration(&mut self, number: u32) {
        self.current_migration = number;
    }

    pub fn apply(&mut self, stmt: &Statement) {
        match stmt {
            Statement::CreateTable { name, definition } => {
                let mut table = Table::new(name.clone());
                table.created_in = self.current_migration;
                self.table_def.parse(&mut table, definition);
                debug!("create table {} ({} columns)", name, table.column_order.len());
                self.catalog.insert_table(table);
            }
            Statement::AlterTable { name, operations } => {
                self.apply_alter_table(name, operations);
            }
            Statement::DropTable { name } => self.catalog.drop_table(name),
            Statement::CreateEnum { name, values } => {
                let mut enum_type = EnumType::new(name.clone());
                enum_type.created_in = self.current_migration;
                for value in values {
                    enum_type.add_value(value.clone());
                }
                self.catalog.insert_enum(enum_type);
            }
            Statement::AlterEnum { name, value } => {
                self.add_enum_value(name, value.as_deref());
            }
            Statement::DropEnum { name } => self.catalog.drop_enum(name),
            Statement::CreateDomain {
                name,
                base_type,
                default,
                check,
            } => {
                let mut domain = Domain::new(name.clone());
                domain.created_in = self.current_migration;
                domain.base_type = base_type.clone();
                domain.default = default.clone();
                domain.check = check.clone();
                self.catalog.insert_domain(domain);
            }
            Statement::DropDomain { name } => self.catalog.drop_domain(name),
            Statement::CreateView { name, definition } => {
                let mut view = View::new(name.clone());
                view.created_in = self.current_migration;
                view.definition = definition.clone();
                view.extract_dependencies();
                self.catalog.insert_view(view);
            }
            Statement::DropView { name } => self.catalog.drop_view(name),
            Statement::CreateIndex {
                name,
                table,
                columns,
                unique,
                predicate,
            } => {
                let index = Index {
                    name: name.clone(),
                    columns: columns.clone(),
                    unique: *unique,
                    predicate: predicate.clone(),
                };
                self.catalog.insert_index(index.clone());
                // an index on a table the catalog has never seen registers
                // globally only
                if let Some(table) = self.catalog.tables.get_mut(table) {
                    table.add_index(index);
                }
            }
            Statement::DropIndex { name } => self.catalog.drop_index(name),
            Statement::Comment {
                target,
                object,
                text,
            } => self.apply_comment(*target, object, text),
            Statement::DoBlock { enum_value, .. } => {
                if let Some((name, value)) = enum_value {
                    self.add_enum_value(name, Some(value));
                }
            }
        }
    }

    fn apply_alter_table(&mut self, name: &str, operations: &[AlterOp]) {
        if !self.catalog.tables.contains_key(name) {
            // altering a table the fold has never seen: keep going with an
            // empty stub rather than failing the whole run
            debug!("alter on unknown table {}, creating stub", name);
            self.catalog.insert_table(Table::new(name));
        }

        for op in operations {
            match op {
                AlterOp::AddColumn {
                    column,
                    data_type,
                    clause,
                } => {
                    let mut col = Column::new(column.clone(), data_type.clone());
                    if clause.to_uppercase().contains("NOT NULL") {
                        col.nullable = false;
                    }
                    col.default = self.table_def.default_of(clause);
                    if let Some(table) = self.catalog.tables.get_mut(name) {
                        table.add_column(col);
                    }
                }
                AlterOp::DropColumn { column } => {
                    // indexes covering the column leave the global registry
                    // before the table-local cascade runs
                    let doomed: Vec<String> = self
                        .catalog
                        .tables
                        .get(name)
                        .map(|t| {
                            t.indexes
                                .iter()
                                .filter(|ix| ix.columns.iter().any(|c| c == column))
                                .map(|ix| ix.name.clone())
                                .collect()
                        })
                        .unwrap_or_default();
                    for index_name in doomed {
                        self.catalog.drop_index(&index_name);
                    }
                    if let Some(table) = self.catalog.tables.get_mut(name) {
                        table.drop_column(column);
                    }
                }
                AlterOp::AlterColumn {
                    column,
                    data_type,
                    clause,
                } => {
                    if let Some(table) = self.catalog.tables.get_mut(name) {
                        if let Some(new_type) = data_type {
                            table.alter_column(column, |col| col.data_type = new_type.clone());
                        }
                        let upper = clause.to_uppercase();
                        if upper.contains("SET NOT NULL") {
                            table.alter_column(column, |col| col.nullable = false);
                        } else if upper.contains("DROP NOT NULL") {
                            table.alter_column(column, |col| col.nullable = true);
                        }
                    }
                }
            }
        }
    }

    fn add_enum_value(&mut self, name: &str, value: Option<&str>) {
        if !self.catalog.enums.contains_key(name) {
            let mut enum_type = EnumType::new(name);
            enum_type.created_in = self.current_migration;
            self.catalog.insert_enum(enum_type);
        }
        if let (Some(enum_type), Some(value)) = (self.catalog.enums.get_mut(name), value) {
            enum_type.add_value(value);
        }
    }

    /// Comments on objects the catalog does not know are dropped silently.
    fn apply_comment(&mut self, target: CommentTarget, object: &str, text: &str) {
        let comment = if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        };
        match target {
            CommentTarget::Table => {
                if let Some(table) = self.catalog.tables.get_mut(object) {
                    table.comment = comment;
                }
            }
            CommentTarget::Column => {
                let Some((table_name, column)) = object.split_once('.') else {
                    return;
                };
                if let Some(table) = self.catalog.tables.get_mut(table_name) {
                    if let Some(text) = comment {
                        table.set_column_comment(column, text);
                    }
                }
            }
            CommentTarget::Type => {
                if let Some(enum_type) = self.catalog.enums.get_mut(object) {
                    enum_type.comment = comment;
                }
            }
            CommentTarget::View => {
                if let Some(view) = self.catalog.views.get_mut(object) {
                    view.comment = comment;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn apply_all(catalog: &mut Catalog, migrations: &[(u32, &str)]) {
        let parser = Parser::new();
        let mut applier = Applier::new(catalog);
        for (number, sql) in migrations {
            applier.set_current_migration(*number);
            for stmt in parser.parse(sql).unwrap() {
                applier.apply(&stmt);
            }
        }
    }

    #[test]
    fn create_table_stamps_migration_number() {
        let mut catalog = Catalog::new();
        apply_all(
            &mut catalog,
            &[(3, "CREATE TABLE users (id int PRIMARY KEY);")],
        );
        assert_eq!(catalog.tables["users"].created_in, 3);
    }

    #[test]
    fn recreating_a_table_replaces_its_record() {
        let mut catalog = Catalog::new();
        apply_all(
            &mut catalog,
            &[
                (1, "CREATE TABLE t (a int);"),
                (2, "DROP TABLE t;"),
                (3, "CREATE TABLE t (b text);"),
            ],
        );
        let table = &catalog.tables["t"];
        assert_eq!(table.column_order, vec!["b"]);
        assert_eq!(table.created_in, 3);
        assert!(!catalog.dropped_tables.contains("t"));
    }

    #[test]
    fn alter_unknown_table_creates_stub() {
        let mut catalog = Catalog::new();
        apply_all(
            &mut catalog,
            &[(2, "ALTER TABLE ghost ADD COLUMN a int;")],
        );
        let table = &catalog.tables["ghost"];
        assert_eq!(table.created_in, 0);
        assert_eq!(table.column_order, vec!["a"]);
    }

    #[test]
    fn added_column_carries_modifiers() {
        let mut catalog = Catalog::new();
        apply_all(
            &mut catalog,
            &[
                (1, "CREATE TABLE t (id int);"),
                (2, "ALTER TABLE t ADD COLUMN email text NOT NULL DEFAULT 'x';"),
            ],
        );
        let col = &catalog.tables["t"].columns["email"];
        assert!(!col.nullable);
        assert_eq!(col.default.as_deref(), Some("'x'"));
    }

    #[test]
    fn dropping_a_column_removes_dependent_indexes_globally() {
        let mut catalog = Catalog::new();
        apply_all(
            &mut catalog,
            &[
                (1, "CREATE TABLE t (a int, b int);"),
                (1, "CREATE INDEX ix_a ON t (a); CREATE INDEX ix_b ON t (b);"),
                (2, "ALTER TABLE t DROP COLUMN a;"),
            ],
        );
        assert!(!catalog.indexes.contains_key("ix_a"));
        assert!(catalog.indexes.contains_key("ix_b"));
        let table = &catalog.tables["t"];
        assert_eq!(table.column_order, vec!["b"]);
        assert_eq!(table.indexes.len(), 1);
        assert_eq!(table.indexes[0].name, "ix_b");
    }

    #[test]
    fn alter_column_changes_type_and_nullability() {
        let mut catalog = Catalog::new();
        apply_all(
            &mut catalog,
            &[
                (1, "CREATE TABLE t (n int);"),
                (2, "ALTER TABLE t ALTER COLUMN n TYPE bigint;"),
                (3, "ALTER TABLE t ALTER COLUMN n SET NOT NULL;"),
            ],
        );
        let col = &catalog.tables["t"].columns["n"];
        assert_eq!(col.data_type, "bigint");
        assert!(!col.nullable);
    }

    #[test]
    fn enum_values_accumulate_without_duplicates() {
        let mut catalog = Catalog::new();
        apply_all(
            &mut catalog,
            &[
                (1, "CREATE TYPE e AS ENUM ('x');"),
                (2, "ALTER TYPE e ADD VALUE 'y';"),
                (3, "ALTER TYPE e ADD VALUE IF NOT EXISTS 'y';"),
                (4, "DO $$ BEGIN ALTER TYPE e ADD VALUE 'z'; END $$;"),
            ],
        );
        let enum_type = &catalog.enums["e"];
        assert_eq!(enum_type.values, vec!["x", "y", "z"]);
        assert_eq!(enum_type.created_in, 1);
    }

    #[test]
    fn alter_on_missing_enum_creates_it() {
        let mut catalog = Catalog::new();
        apply_all(&mut catalog, &[(5, "ALTER TYPE e ADD VALUE 'a';")]);
        assert_eq!(catalog.enums["e"].values, vec!["a"]);
        assert_eq!(catalog.enums["e"].created_in, 5);
    }

    #[test]
    fn view_redefinition_bumps_version_and_keeps_origin() {
        let mut catalog = Catalog::new();
        apply_all(
            &mut catalog,
            &[
                (1, "CREATE VIEW v AS SELECT 1;"),
                (4, "CREATE OR REPLACE VIEW v AS SELECT 2;"),
            ],
        );
        let view = &catalog.views["v"];
        assert_eq!(view.version, 1);
        assert_eq!(view.created_in, 1);
        assert!(view.definition.contains("SELECT 2"));
    }

    #[test]
    fn index_on_absent_table_registers_globally_only() {
        let mut catalog = Catalog::new();
        apply_all(&mut catalog, &[(1, "CREATE INDEX ix ON nope (a);")]);
        assert!(catalog.indexes.contains_key("ix"));
        assert!(catalog.tables.is_empty());
    }

    #[test]
    fn drop_index_leaves_table_local_copy() {
        let mut catalog = Catalog::new();
        apply_all(
            &mut catalog,
            &[
                (1, "CREATE TABLE t (a int); CREATE INDEX ix ON t (a);"),
                (2, "DROP INDEX ix;"),
            ],
        );
        assert!(!catalog.indexes.contains_key("ix"));
        assert_eq!(catalog.tables["t"].indexes.len(), 1);
    }

    #[test]
    fn comments_route_by_target_kind() {
        let mut catalog = Catalog::new();
        apply_all(
            &mut catalog,
            &[
                (1, "CREATE TABLE t (a int); CREATE TYPE e AS ENUM ('x'); CREATE VIEW v AS SELECT 1;"),
                (
                    2,
                    "COMMENT ON TABLE t IS 'tbl'; COMMENT ON COLUMN t.a IS 'col'; \
                     COMMENT ON TYPE e IS 'enum'; COMMENT ON VIEW v IS 'view';",
                ),
            ],
        );
        assert_eq!(catalog.tables["t"].comment.as_deref(), Some("tbl"));
        assert_eq!(catalog.tables["t"].column_comments["a"], "col");
        assert_eq!(catalog.enums["e"].comment.as_deref(), Some("enum"));
        assert_eq!(catalog.views["v"].comment.as_deref(), Some("view"));
    }

    #[test]
    fn comment_on_unknown_object_is_dropped() {
        let mut catalog = Catalog::new();
        apply_all(&mut catalog, &[(1, "COMMENT ON TABLE ghost IS 'x';")]);
        assert!(catalog.tables.is_empty());
    }

    #[test]
    fn drops_record_their_kind() {
        let mut catalog = Catalog::new();
        apply_all(
            &mut catalog,
            &[
                (
                    1,
                    "CREATE TABLE t (a int); CREATE TYPE e AS ENUM ('x'); \
                     CREATE DOMAIN d AS int; CREATE VIEW v AS SELECT 1;",
                ),
                (2, "DROP TABLE t; DROP TYPE e; DROP DOMAIN d; DROP VIEW v;"),
            ],
        );
        assert!(catalog.tables.is_empty());
        assert!(catalog.enums.is_empty());
        assert!(catalog.domains.is_empty());
        assert!(catalog.views.is_empty());
        assert!(catalog.dropped_tables.contains("t"));
        assert!(catalog.dropped_enums.contains("e"));
        assert!(catalog.dropped_domains.contains("d"));
        assert!(catalog.dropped_views.contains("v"));
    }
}
