use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog::Column;

/// A foreign key constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub columns: Vec<String>,
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
    pub on_delete: Option<String>,
    pub on_update: Option<String>,
}

/// A table-level unique constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniqueConstraint {
    pub columns: Vec<String>,
}

/// A check constraint with its expression captured verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckConstraint {
    pub expression: String,
}

/// An index over table columns, direction modifiers already stripped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Index {
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
    pub predicate: Option<String>,
}

/// A database table and everything attached to it.
///
/// `column_order` enumerates exactly the live columns in order of first
/// appearance; `columns` is the by-name record map. The pair stays in sync
/// through [`Table::add_column`] and [`Table::drop_column`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: BTreeMap<String, Column>,
    pub column_order: Vec<String>,
    pub primary_key: Option<Vec<String>>,
    pub foreign_keys: Vec<ForeignKey>,
    pub uniques: Vec<UniqueConstraint>,
    pub checks: Vec<CheckConstraint>,
    pub indexes: Vec<Index>,
    pub comment: Option<String>,
    pub column_comments: BTreeMap<String, String>,
    /// Migration number that first created this table; 0 for tables that
    /// only ever appeared as an ALTER target
    pub created_in: u32,
    /// Tables referenced through foreign keys, in first-seen order
    pub depends_on: Vec<String>,
    /// Enum types used by columns, filled in by usage analysis
    pub required_enums: Vec<String>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn add_column(&mut self, column: Column) {
        if !self.columns.contains_key(&column.name) {
            self.column_order.push(column.name.clone());
        }
        self.columns.insert(column.name.clone(), column);
    }

    /// Remove a column along with its comment, every index whose column
    /// list mentions it, and every unique constraint that covers it.
    pub fn drop_column(&mut self, name: &str) {
        self.columns.remove(name);
        self.column_order.retain(|c| c != name);
        self.column_comments.remove(name);
        self.indexes.retain(|ix| !ix.columns.iter().any(|c| c == name));
        self.uniques.retain(|u| !u.columns.iter().any(|c| c == name));
    }

    pub fn alter_column(&mut self, name: &str, update: impl FnOnce(&mut Column)) {
        if let Some(column) = self.columns.get_mut(name) {
            update(column);
        }
    }

    pub fn add_index(&mut self, index: Index) {
        self.indexes.push(index);
    }

    pub fn add_foreign_key(&mut self, fk: ForeignKey) {
        if !self.depends_on.contains(&fk.referenced_table) {
            self.depends_on.push(fk.referenced_table.clone());
        }
        self.foreign_keys.push(fk);
    }

    pub fn add_unique(&mut self, unique: UniqueConstraint) {
        self.uniques.push(unique);
    }

    pub fn add_check(&mut self, check: CheckConstraint) {
        self.checks.push(check);
    }

    pub fn set_column_comment(&mut self, column: &str, comment: impl Into<String>) {
        self.column_comments.insert(column.to_string(), comment.into());
    }

    pub fn add_required_enum(&mut self, enum_name: &str) {
        if !self.required_enums.iter().any(|e| e == enum_name) {
            self.required_enums.push(enum_name.to_string());
        }
    }
}
