//! Dependency graph over surviving catalog objects and its ordering.

use std::collections::BTreeMap;

use crate::catalog::Catalog;
use crate::error::Error;

/// Kind of a schema object, in creation-priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Domain,
    Enum,
    Table,
    View,
}

impl ObjectKind {
    fn priority(self) -> u8 {
        match self {
            ObjectKind::Domain => 0,
            ObjectKind::Enum => 1,
            ObjectKind::Table => 2,
            ObjectKind::View => 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: ObjectKind,
    pub name: String,
    pub created_in: u32,
}

/// Directed dependency graph.
///
/// An edge `from -> to` means `from` depends on `to`; it is stored under
/// `to` as a list of dependents, which is the shape the sort consumes.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    nodes: BTreeMap<String, Node>,
    edges: BTreeMap<String, Vec<String>>,
}

/// Record which tables use each enum, filling `used_by` on the enum and
/// `required_enums` on the table. A column uses an enum when the first
/// token of its type names one.
pub fn analyze_enum_usage(catalog: &mut Catalog) {
    let Catalog { tables, enums, .. } = catalog;
    for (table_name, table) in tables.iter_mut() {
        for column_name in &table.column_order {
            let Some(column) = table.columns.get(column_name) else {
                continue;
            };
            let type_token = first_type_token(&column.data_type);
            if let Some(enum_type) = enums.get_mut(type_token) {
                enum_type.add_used_by(table_name);
                if !table.required_enums.iter().any(|e| e == type_token) {
                    table.required_enums.push(type_token.to_string());
                }
            }
        }
    }
}

impl DependencyGraph {
    /// Build the graph from the surviving catalog objects.
    pub fn build(catalog: &mut Catalog) -> Self {
        let mut graph = DependencyGraph::default();

        for (name, domain) in &catalog.domains {
            graph.add_node(ObjectKind::Domain, name, domain.created_in);
        }
        for (name, enum_type) in &catalog.enums {
            graph.add_node(ObjectKind::Enum, name, enum_type.created_in);
        }
        for (name, table) in &catalog.tables {
            graph.add_node(ObjectKind::Table, name, table.created_in);
        }
        for (name, view) in &catalog.views {
            graph.add_node(ObjectKind::View, name, view.created_in);
        }

        let Catalog {
            tables,
            enums,
            domains,
            views,
            ..
        } = catalog;

        for (table_name, table) in tables.iter() {
            for fk in &table.foreign_keys {
                if fk.referenced_table != *table_name {
                    graph.add_edge(table_name, &fk.referenced_table);
                }
            }
            for column_name in &table.column_order {
                let Some(column) = table.columns.get(column_name) else {
                    continue;
                };
                let type_token = first_type_token(&column.data_type);
                if let Some(enum_type) = enums.get_mut(type_token) {
                    graph.add_edge(table_name, type_token);
                    enum_type.add_used_by(table_name);
                }
                if domains.contains_key(type_token) {
                    graph.add_edge(table_name, type_token);
                }
            }
        }

        for (view_name, view) in views.iter() {
            for dep in &view.depends_on {
                if dep != view_name && graph.nodes.contains_key(dep) {
                    graph.add_edge(view_name, dep);
                }
            }
        }

        graph
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name)
    }

    fn add_node(&mut self, kind: ObjectKind, name: &str, created_in: u32) {
        self.nodes.insert(
            name.to_string(),
            Node {
                kind,
                name: name.to_string(),
                created_in,
            },
        );
    }

    fn add_edge(&mut self, from: &str, to: &str) {
        let dependents = self.edges.entry(to.to_string()).or_default();
        if !dependents.iter().any(|d| d == from) {
            dependents.push(from.to_string());
        }
    }

    /// Order the objects so every dependency precedes its dependents.
    ///
    /// Kahn's algorithm over the stored dependent lists; the ready queue is
    /// kept sorted by (type priority, created_in) so domains come first,
    /// then enums, tables, views, with authoring order breaking ties.
    pub fn topological_sort(&self) -> Result<Vec<String>, Error> {
        let mut in_degree: BTreeMap<&str, usize> =
            self.nodes.keys().map(|name| (name.as_str(), 0)).collect();
        for dependents in self.edges.values() {
            for dependent in dependents {
                if let Some(degree) = in_degree.get_mut(dependent.as_str()) {
                    *degree += 1;
                }
            }
        }

        let mut queue: Vec<String> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(name, _)| name.to_string())
            .collect();
        self.sort_queue(&mut queue);

        let mut result = Vec::with_capacity(self.nodes.len());
        while !queue.is_empty() {
            let name = queue.remove(0);
            if let Some(dependents) = self.edges.get(&name) {
                for dependent in dependents {
                    if let Some(degree) = in_degree.get_mut(dependent.as_str()) {
                        *degree -= 1;
                        if *degree == 0 {
                            queue.push(dependent.clone());
                        }
                    }
                }
                self.sort_queue(&mut queue);
            }
            result.push(name);
        }

        if result.len() != self.nodes.len() {
            return Err(Error::Cycle {
                remaining: self.nodes.len() - result.len(),
            });
        }

        Ok(result)
    }

    fn sort_queue(&self, queue: &mut [String]) {
        queue.sort_by_key(|name| {
            self.nodes
                .get(name)
                .map_or((u8::MAX, u32::MAX), |node| (node.kind.priority(), node.created_in))
        });
    }
}

/// First whitespace-separated token of a column type, the part that can
/// name an enum or domain.
fn first_type_token(data_type: &str) -> &str {
    data_type.trim().split(' ').next().unwrap_or(data_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Column, Domain, EnumType, ForeignKey, Table, View};

    fn table_in(catalog: &mut Catalog, name: &str, created_in: u32) {
        let mut table = Table::new(name);
        table.created_in = created_in;
        catalog.insert_table(table);
    }

    #[test]
    fn foreign_keys_order_referenced_tables_first() {
        let mut catalog = Catalog::new();
        table_in(&mut catalog, "b", 1);
        let mut a = Table::new("a");
        a.created_in = 2;
        a.add_foreign_key(ForeignKey {
            columns: vec!["bid".into()],
            referenced_table: "b".into(),
            referenced_columns: vec!["id".into()],
            on_delete: None,
            on_update: None,
        });
        catalog.insert_table(a);

        let order = DependencyGraph::build(&mut catalog)
            .topological_sort()
            .unwrap();
        assert_eq!(order, vec!["b", "a"]);
    }

    #[test]
    fn priority_orders_kinds_then_creation() {
        let mut catalog = Catalog::new();
        let mut view = View::new("v");
        view.created_in = 4;
        catalog.insert_view(view);
        table_in(&mut catalog, "t", 3);
        let mut e = EnumType::new("e");
        e.created_in = 2;
        catalog.insert_enum(e);
        let mut d = Domain::new("d");
        d.created_in = 1;
        catalog.insert_domain(d);

        let order = DependencyGraph::build(&mut catalog)
            .topological_sort()
            .unwrap();
        assert_eq!(order, vec!["d", "e", "t", "v"]);
    }

    #[test]
    fn creation_order_breaks_ties_within_a_kind() {
        let mut catalog = Catalog::new();
        table_in(&mut catalog, "zebra", 1);
        table_in(&mut catalog, "aardvark", 2);

        let order = DependencyGraph::build(&mut catalog)
            .topological_sort()
            .unwrap();
        assert_eq!(order, vec!["zebra", "aardvark"]);
    }

    #[test]
    fn enum_usage_links_both_directions() {
        let mut catalog = Catalog::new();
        catalog.insert_enum(EnumType::new("status"));
        let mut table = Table::new("orders");
        table.created_in = 2;
        table.add_column(Column::new("s", "status"));
        catalog.insert_table(table);

        analyze_enum_usage(&mut catalog);
        assert_eq!(catalog.enums["status"].used_by, vec!["orders"]);
        assert_eq!(catalog.tables["orders"].required_enums, vec!["status"]);

        let order = DependencyGraph::build(&mut catalog)
            .topological_sort()
            .unwrap();
        assert_eq!(order, vec!["status", "orders"]);
    }

    #[test]
    fn view_edges_only_point_at_known_objects() {
        let mut catalog = Catalog::new();
        table_in(&mut catalog, "t", 1);
        let mut view = View::new("v");
        view.created_in = 2;
        view.definition = "CREATE VIEW v AS SELECT * FROM t JOIN elsewhere ON 1=1".into();
        view.extract_dependencies();
        catalog.insert_view(view);

        let order = DependencyGraph::build(&mut catalog)
            .topological_sort()
            .unwrap();
        assert_eq!(order, vec!["t", "v"]);
    }

    #[test]
    fn self_reference_is_ignored() {
        let mut catalog = Catalog::new();
        let mut t = Table::new("node");
        t.created_in = 1;
        t.add_foreign_key(ForeignKey {
            columns: vec!["parent_id".into()],
            referenced_table: "node".into(),
            referenced_columns: vec!["id".into()],
            on_delete: None,
            on_update: None,
        });
        catalog.insert_table(t);

        let order = DependencyGraph::build(&mut catalog)
            .topological_sort()
            .unwrap();
        assert_eq!(order, vec!["node"]);
    }

    #[test]
    fn mutual_foreign_keys_report_a_cycle() {
        let mut catalog = Catalog::new();
        for (name, other) in [("a", "b"), ("b", "a")] {
            let mut table = Table::new(name);
            table.add_foreign_key(ForeignKey {
                columns: vec!["x".into()],
                referenced_table: other.into(),
                referenced_columns: vec!["id".into()],
                on_delete: None,
                on_update: None,
            });
            catalog.insert_table(table);
        }

        let err = DependencyGraph::build(&mut catalog)
            .topological_sort()
            .unwrap_err();
        assert!(matches!(err, Error::Cycle { remaining: 2 }));
    }
}
