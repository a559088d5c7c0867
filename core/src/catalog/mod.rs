//! Cumulative schema state built by folding migrations in order.
//!
//! The catalog is the materialized final schema: four name-keyed object maps
//! plus a global index registry. Ordered maps keep every iteration
//! deterministic, which the emitter relies on for byte-identical output.

pub mod column;
pub mod domain;
pub mod enum_type;
pub mod table;
pub mod view;

pub use self::column::Column;
pub use self::domain::Domain;
pub use self::enum_type::EnumType;
pub use self::table::{CheckConstraint, ForeignKey, Index, Table, UniqueConstraint};
pub use self::view::View;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// The evolving database schema.
///
/// The `dropped_*` sets record names that were ever removed during the fold.
/// They suppress nothing at emission time; they exist so a later undo-style
/// feature could consult them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    pub domains: BTreeMap<String, Domain>,
    pub enums: BTreeMap<String, EnumType>,
    pub tables: BTreeMap<String, Table>,
    pub views: BTreeMap<String, View>,

    /// Indexes registered globally, independent of table-local copies
    pub indexes: BTreeMap<String, Index>,

    pub dropped_tables: BTreeSet<String>,
    pub dropped_domains: BTreeSet<String>,
    pub dropped_enums: BTreeSet<String>,
    pub dropped_views: BTreeSet<String>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_table(&mut self, table: Table) {
        self.dropped_tables.remove(&table.name);
        self.tables.insert(table.name.clone(), table);
    }

    pub fn drop_table(&mut self, name: &str) {
        self.tables.remove(name);
        self.dropped_tables.insert(name.to_string());
    }

    pub fn insert_domain(&mut self, domain: Domain) {
        self.dropped_domains.remove(&domain.name);
        self.domains.insert(domain.name.clone(), domain);
    }

    pub fn drop_domain(&mut self, name: &str) {
        self.domains.remove(name);
        self.dropped_domains.insert(name.to_string());
    }

    pub fn insert_enum(&mut self, enum_type: EnumType) {
        self.dropped_enums.remove(&enum_type.name);
        self.enums.insert(enum_type.name.clone(), enum_type);
    }

    pub fn drop_enum(&mut self, name: &str) {
        self.enums.remove(name);
        self.dropped_enums.insert(name.to_string());
    }

    /// Install a view. A redefinition keeps the predecessor's `created_in`
    /// and bumps the version counter.
    pub fn insert_view(&mut self, mut view: View) {
        if let Some(prev) = self.views.get(&view.name) {
            view.version = prev.version + 1;
            view.created_in = prev.created_in;
        }
        self.dropped_views.remove(&view.name);
        self.views.insert(view.name.clone(), view);
    }

    pub fn drop_view(&mut self, name: &str) {
        self.views.remove(name);
        self.dropped_views.insert(name.to_string());
    }

    pub fn insert_index(&mut self, index: Index) {
        self.indexes.insert(index.name.clone(), index);
    }

    /// Remove an index from the global registry only. A table-local copy
    /// persists until the owning table is dropped or re-created.
    pub fn drop_index(&mut self, name: &str) {
        self.indexes.remove(name);
    }
}
