//! CREATE TABLE body parsing.
//!
//! The paren content of a CREATE TABLE is split at top-level commas; each
//! part is either a table-level constraint (PRIMARY KEY, FOREIGN KEY,
//! UNIQUE, CHECK) or a column definition.

use regex::Regex;

use crate::catalog::{CheckConstraint, Column, ForeignKey, Table, UniqueConstraint};
use crate::parser::lexer::split_top_level;
use crate::parser::{pattern, ACTION_PATTERN};

pub struct TableDefParser {
    primary_key: Regex,
    foreign_key: Regex,
    unique: Regex,
    check: Regex,
    on_delete: Regex,
    on_update: Regex,
    references: Regex,
    default_expr: Regex,
}

impl Default for TableDefParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TableDefParser {
    pub fn new() -> Self {
        Self {
            primary_key: pattern(r"(?i)PRIMARY\s+KEY\s*\(([^)]+)\)"),
            foreign_key: pattern(
                r"(?i)FOREIGN\s+KEY\s*\(([^)]+)\)\s+REFERENCES\s+(\w+)\s*\(([^)]+)\)",
            ),
            unique: pattern(r"(?i)UNIQUE\s*\(([^)]+)\)"),
            check: pattern(r"(?i)CHECK\s*\((.+)\)"),
            on_delete: pattern(&format!(r"(?i)ON\s+DELETE\s+({ACTION_PATTERN})")),
            on_update: pattern(&format!(r"(?i)ON\s+UPDATE\s+({ACTION_PATTERN})")),
            references: pattern(&format!(
                r"(?i)REFERENCES\s+(\w+)\s*\((\w+)\)(?:\s+ON\s+DELETE\s+({ACTION_PATTERN}))?(?:\s+ON\s+UPDATE\s+({ACTION_PATTERN}))?"
            )),
            default_expr: pattern(r"(?i)DEFAULT\s+([^\s,]+(?:\([^)]*\))?)"),
        }
    }

    /// Fill a table from the paren content of its CREATE statement.
    pub fn parse(&self, table: &mut Table, definition: &str) {
        for part in split_top_level(definition, ',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            let upper = part.to_uppercase();
            if upper.starts_with("PRIMARY KEY") {
                self.parse_primary_key(table, part);
            } else if upper.starts_with("FOREIGN KEY") {
                self.parse_foreign_key(table, part);
            } else if upper.starts_with("UNIQUE") {
                self.parse_unique(table, part);
            } else if upper.starts_with("CHECK") {
                self.parse_check(table, part);
            } else {
                self.parse_column(table, part);
            }
        }
    }

    /// DEFAULT expression in a column clause, if any.
    pub(crate) fn default_of(&self, clause: &str) -> Option<String> {
        self.default_expr
            .captures(clause)
            .map(|caps| caps[1].to_string())
    }

    fn parse_primary_key(&self, table: &mut Table, part: &str) {
        if let Some(caps) = self.primary_key.captures(part) {
            table.primary_key = Some(split_names(&caps[1]));
        }
    }

    fn parse_foreign_key(&self, table: &mut Table, part: &str) {
        if let Some(caps) = self.foreign_key.captures(part) {
            let fk = ForeignKey {
                columns: split_names(&caps[1]),
                referenced_table: caps[2].to_string(),
                referenced_columns: split_names(&caps[3]),
                on_delete: self.on_delete.captures(part).map(|c| c[1].to_string()),
                on_update: self.on_update.captures(part).map(|c| c[1].to_string()),
            };
            table.add_foreign_key(fk);
        }
    }

    fn parse_unique(&self, table: &mut Table, part: &str) {
        if let Some(caps) = self.unique.captures(part) {
            table.add_unique(UniqueConstraint {
                columns: split_names(&caps[1]),
            });
        }
    }

    fn parse_check(&self, table: &mut Table, part: &str) {
        if let Some(caps) = self.check.captures(part) {
            table.add_check(CheckConstraint {
                expression: caps[1].to_string(),
            });
        }
    }

    /// Parse one column definition: name, type (with multi-word forms and a
    /// trailing parameter group), then the modifier clause.
    fn parse_column(&self, table: &mut Table, def: &str) {
        let parts: Vec<&str> = def.split_whitespace().collect();
        if parts.len() < 2 {
            return;
        }

        let name = parts[0].to_string();
        let mut type_idx = 1;
        let mut data_type = parts[1].to_string();

        if let Some(&next) = parts.get(type_idx + 1) {
            let next_lower = next.to_lowercase();
            if next_lower == "precision" || next_lower == "varying" {
                data_type.push(' ');
                data_type.push_str(next);
                type_idx += 1;
            } else if next_lower == "with" || next_lower == "without" {
                if parts
                    .get(type_idx + 2)
                    .is_some_and(|w| w.eq_ignore_ascii_case("time"))
                    && parts
                        .get(type_idx + 3)
                        .is_some_and(|w| w.eq_ignore_ascii_case("zone"))
                {
                    for word in &parts[type_idx + 1..type_idx + 4] {
                        data_type.push(' ');
                        data_type.push_str(word);
                    }
                    type_idx += 3;
                } else if parts
                    .get(type_idx + 2)
                    .is_some_and(|w| w.eq_ignore_ascii_case("zone"))
                {
                    for word in &parts[type_idx + 1..type_idx + 3] {
                        data_type.push(' ');
                        data_type.push_str(word);
                    }
                    type_idx += 2;
                }
            }
        }

        // a detached parameter group: `varchar (255)`
        if parts
            .get(type_idx + 1)
            .is_some_and(|p| p.starts_with('('))
        {
            data_type.push(' ');
            data_type.push_str(parts[type_idx + 1]);
            type_idx += 1;
        }

        let clause = parts[type_idx + 1..].join(" ");
        let clause_upper = clause.to_uppercase();

        let mut column = Column::new(name.clone(), data_type);
        if clause_upper.contains("NOT NULL") {
            column.nullable = false;
        }
        column.default = self.default_of(&clause);

        if clause_upper.contains("PRIMARY KEY") {
            table.primary_key = Some(vec![name.clone()]);
        }

        if let Some(caps) = self.references.captures(&clause) {
            table.add_foreign_key(ForeignKey {
                columns: vec![name.clone()],
                referenced_table: caps[1].to_string(),
                referenced_columns: vec![caps[2].to_string()],
                on_delete: caps.get(3).map(|m| m.as_str().to_string()),
                on_update: caps.get(4).map(|m| m.as_str().to_string()),
            });
        }

        table.add_column(column);
    }
}

fn split_names(list: &str) -> Vec<String> {
    list.split(',')
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}
