//! DDL statement recognition.
//!
//! Raw migration text is stripped of comments, split into statements, and
//! each statement is classified by the first matching pattern into a typed
//! [`Statement`]. Statement shapes the tool does not know are skipped
//! silently: this is a schema consolidator, not a SQL validator.

pub mod lexer;
pub mod table_def;

#[cfg(test)]
mod tests;

use regex::Regex;
use std::fs;
use std::path::Path;

use crate::ast::{AlterOp, CommentTarget, Statement};
use crate::error::Error;

/// Data type shape: single word, parameterized, array, or one of the fixed
/// multi-word forms (double precision, character varying, timestamp/time
/// with or without time zone).
const TYPE_PATTERN: &str = r"(?:(?:double|character|timestamp|time)\s+(?:precision|varying|with(?:\s+time)?\s+zone|without(?:\s+time)?\s+zone)|\w+)(?:\([^)]+\))?(?:\[\])?";

/// Referential action: one or two words from the closed SQL list.
pub(crate) const ACTION_PATTERN: &str = r"CASCADE|RESTRICT|SET\s+NULL|SET\s+DEFAULT|NO\s+ACTION";

pub(crate) fn pattern(src: &str) -> Regex {
    Regex::new(src).expect("hard-coded pattern must compile")
}

/// Recognizes DDL statements via a table of compiled patterns.
pub struct Parser {
    create_table: Regex,
    alter_table: Regex,
    drop_table: Regex,
    create_type: Regex,
    alter_type: Regex,
    drop_type: Regex,
    create_domain: Regex,
    drop_domain: Regex,
    create_view: Regex,
    drop_view: Regex,
    create_index: Regex,
    drop_index: Regex,
    comment_on: Regex,
    do_block: Regex,

    alter_tail: Regex,
    add_column: Regex,
    drop_column: Regex,
    alter_col_type: Regex,
    alter_col_null: Regex,

    add_value: Regex,
    domain_base: Regex,
    domain_default: Regex,
    domain_check: Regex,
    index_where: Regex,
    comment_text: Regex,
    do_alter_type: Regex,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Self {
        Self {
            create_table: pattern(r"(?i)^\s*CREATE\s+TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?(\w+)"),
            alter_table: pattern(r"(?i)^\s*ALTER\s+TABLE\s+(?:IF\s+EXISTS\s+)?(\w+)"),
            drop_table: pattern(r"(?i)^\s*DROP\s+TABLE\s+(?:IF\s+EXISTS\s+)?(\w+)"),
            create_type: pattern(r"(?i)^\s*CREATE\s+TYPE\s+(\w+)\s+AS\s+ENUM"),
            alter_type: pattern(r"(?i)^\s*ALTER\s+TYPE\s+(\w+)\s+ADD\s+VALUE"),
            drop_type: pattern(r"(?i)^\s*DROP\s+TYPE\s+(?:IF\s+EXISTS\s+)?(\w+)"),
            create_domain: pattern(r"(?i)^\s*CREATE\s+DOMAIN\s+(\w+)\s+AS"),
            drop_domain: pattern(r"(?i)^\s*DROP\s+DOMAIN\s+(?:IF\s+EXISTS\s+)?(\w+)"),
            create_view: pattern(r"(?i)^\s*CREATE\s+(?:OR\s+REPLACE\s+)?VIEW\s+(\w+)"),
            drop_view: pattern(r"(?i)^\s*DROP\s+VIEW\s+(?:IF\s+EXISTS\s+)?(\w+)"),
            create_index: pattern(r"(?i)^\s*CREATE\s+(UNIQUE\s+)?INDEX\s+(\w+)\s+ON\s+(\w+)"),
            drop_index: pattern(r"(?i)^\s*DROP\s+INDEX\s+(?:IF\s+EXISTS\s+)?(\w+)"),
            comment_on: pattern(r"(?i)^\s*COMMENT\s+ON\s+(TABLE|COLUMN|TYPE|VIEW)\s+(\S+)"),
            do_block: pattern(r"(?i)^\s*DO\s+\$\$"),

            alter_tail: pattern(r"(?is)ALTER\s+TABLE\s+(?:IF\s+EXISTS\s+)?\w+\s+(.+)"),
            add_column: pattern(&format!(
                r"(?i)ADD\s+COLUMN\s+(\w+)\s+({TYPE_PATTERN})"
            )),
            drop_column: pattern(r"(?i)DROP\s+COLUMN\s+(?:IF\s+EXISTS\s+)?(\w+)"),
            alter_col_type: pattern(&format!(
                r"(?i)ALTER\s+COLUMN\s+(\w+)\s+TYPE\s+({TYPE_PATTERN})(?:\s+USING\s+(.+))?"
            )),
            alter_col_null: pattern(r"(?i)ALTER\s+COLUMN\s+(\w+)\s+(SET|DROP)\s+NOT\s+NULL"),

            add_value: pattern(r"(?i)ADD\s+VALUE\s+(?:IF\s+NOT\s+EXISTS\s+)?'([^']+)'"),
            domain_base: pattern(
                r"(?i)AS\s+(.+?)(?:\s+DEFAULT|\s+CHECK|\s+NOT\s+NULL|\s+NULL|\s+CONSTRAINT|\s*;|\s*$)",
            ),
            domain_default: pattern(r"(?i)DEFAULT\s+(\S+(?:\([^)]+\))?)"),
            domain_check: pattern(r"(?i)CHECK\s*\(([^)]+)\)"),
            index_where: pattern(r"(?i)\bWHERE\s+(.+)"),
            comment_text: pattern(r"(?i)IS\s+'((?:[^']|'')+)'"),
            do_alter_type: pattern(
                r"(?i)ALTER\s+TYPE\s+(\w+)\s+ADD\s+VALUE\s+(?:IF\s+NOT\s+EXISTS\s+)?'([^']+)'",
            ),
        }
    }

    /// Parse a migration file into recognized statements.
    pub fn parse_file(&self, path: &Path) -> Result<Vec<Statement>, Error> {
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        self.parse(&content)
    }

    /// Parse SQL text into recognized statements, skipping unknown shapes.
    pub fn parse(&self, sql: &str) -> Result<Vec<Statement>, Error> {
        let sql = lexer::strip_comments(sql);
        let mut statements = Vec::new();
        for raw in lexer::split_statements(&sql) {
            if let Some(stmt) = self.recognize(&raw)? {
                statements.push(stmt);
            }
        }
        Ok(statements)
    }

    /// Classify one statement. `Ok(None)` means the shape is unknown and
    /// deliberately ignored.
    pub fn recognize(&self, sql: &str) -> Result<Option<Statement>, Error> {
        let sql = sql.trim();
        if sql.is_empty() {
            return Ok(None);
        }

        if self.create_table.is_match(sql) {
            return self.recognize_create_table(sql).map(Some);
        }
        if self.alter_table.is_match(sql) {
            return self.recognize_alter_table(sql).map(Some);
        }
        if self.drop_table.is_match(sql) {
            let name = self.captured_name(&self.drop_table, sql, "DROP TABLE")?;
            return Ok(Some(Statement::DropTable { name }));
        }
        if self.create_type.is_match(sql) {
            return self.recognize_create_enum(sql).map(Some);
        }
        if self.alter_type.is_match(sql) {
            let name = self.captured_name(&self.alter_type, sql, "ALTER TYPE")?;
            let value = self
                .add_value
                .captures(sql)
                .map(|caps| caps[1].to_string());
            return Ok(Some(Statement::AlterEnum { name, value }));
        }
        if self.drop_type.is_match(sql) {
            let name = self.captured_name(&self.drop_type, sql, "DROP TYPE")?;
            return Ok(Some(Statement::DropEnum { name }));
        }
        if self.create_domain.is_match(sql) {
            return self.recognize_create_domain(sql).map(Some);
        }
        if self.drop_domain.is_match(sql) {
            let name = self.captured_name(&self.drop_domain, sql, "DROP DOMAIN")?;
            return Ok(Some(Statement::DropDomain { name }));
        }
        if self.create_view.is_match(sql) {
            let name = self.captured_name(&self.create_view, sql, "CREATE VIEW")?;
            return Ok(Some(Statement::CreateView {
                name,
                definition: sql.to_string(),
            }));
        }
        if self.drop_view.is_match(sql) {
            let name = self.captured_name(&self.drop_view, sql, "DROP VIEW")?;
            return Ok(Some(Statement::DropView { name }));
        }
        if self.create_index.is_match(sql) {
            return self.recognize_create_index(sql).map(Some);
        }
        if self.drop_index.is_match(sql) {
            let name = self.captured_name(&self.drop_index, sql, "DROP INDEX")?;
            return Ok(Some(Statement::DropIndex { name }));
        }
        if self.comment_on.is_match(sql) {
            return self.recognize_comment(sql).map(Some);
        }
        if self.do_block.is_match(sql) {
            let enum_value = self
                .do_alter_type
                .captures(sql)
                .map(|caps| (caps[1].to_string(), caps[2].to_string()));
            return Ok(Some(Statement::DoBlock {
                body: sql.to_string(),
                enum_value,
            }));
        }

        Ok(None)
    }

    fn captured_name(&self, re: &Regex, sql: &str, kind: &'static str) -> Result<String, Error> {
        re.captures(sql)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| Error::Recognize {
                kind,
                sql: sql.to_string(),
            })
    }

    fn recognize_create_table(&self, sql: &str) -> Result<Statement, Error> {
        let name = self.captured_name(&self.create_table, sql, "CREATE TABLE")?;
        let definition = lexer::paren_content(sql).unwrap_or("").to_string();
        Ok(Statement::CreateTable { name, definition })
    }

    fn recognize_alter_table(&self, sql: &str) -> Result<Statement, Error> {
        let name = self.captured_name(&self.alter_table, sql, "ALTER TABLE")?;
        let operations = self.parse_alter_operations(sql);
        Ok(Statement::AlterTable { name, operations })
    }

    /// Collect the operations after the table name: at most one
    /// `ALTER COLUMN TYPE` / `SET|DROP NOT NULL`, otherwise any number of
    /// `ADD COLUMN` and `DROP COLUMN`.
    fn parse_alter_operations(&self, sql: &str) -> Vec<AlterOp> {
        let mut operations = Vec::new();

        let tail = match self.alter_tail.captures(sql) {
            Some(caps) => match caps.get(1) {
                Some(m) => m.as_str(),
                None => return operations,
            },
            None => return operations,
        };

        if let Some(caps) = self.alter_col_type.captures(tail) {
            operations.push(AlterOp::AlterColumn {
                column: caps[1].to_string(),
                data_type: Some(caps[2].to_string()),
                clause: tail.to_string(),
            });
            return operations;
        }

        if let Some(caps) = self.alter_col_null.captures(tail) {
            operations.push(AlterOp::AlterColumn {
                column: caps[1].to_string(),
                data_type: None,
                clause: tail.to_string(),
            });
            return operations;
        }

        let adds: Vec<(usize, String, String)> = self
            .add_column
            .captures_iter(tail)
            .filter_map(|caps| {
                let start = caps.get(0)?.start();
                Some((start, caps[1].to_string(), caps[2].to_string()))
            })
            .collect();
        let drops: Vec<(usize, String)> = self
            .drop_column
            .captures_iter(tail)
            .filter_map(|caps| {
                let start = caps.get(0)?.start();
                Some((start, caps[1].to_string()))
            })
            .collect();

        // each operation's clause runs up to the start of the next one, so
        // NOT NULL / DEFAULT modifiers stay with the column they belong to
        let mut boundaries: Vec<usize> = adds
            .iter()
            .map(|(s, _, _)| *s)
            .chain(drops.iter().map(|(s, _)| *s))
            .collect();
        boundaries.sort_unstable();

        for (start, column, data_type) in adds {
            let end = boundaries
                .iter()
                .copied()
                .find(|&b| b > start)
                .unwrap_or(tail.len());
            let clause = tail[start..end]
                .trim()
                .trim_end_matches(',')
                .trim()
                .to_string();
            operations.push(AlterOp::AddColumn {
                column,
                data_type,
                clause,
            });
        }

        for (_, column) in drops {
            operations.push(AlterOp::DropColumn { column });
        }

        operations
    }

    fn recognize_create_enum(&self, sql: &str) -> Result<Statement, Error> {
        let name = self.captured_name(&self.create_type, sql, "CREATE TYPE")?;
        let content = lexer::paren_content(sql).unwrap_or("");
        Ok(Statement::CreateEnum {
            name,
            values: parse_enum_values(content),
        })
    }

    fn recognize_create_domain(&self, sql: &str) -> Result<Statement, Error> {
        let name = self.captured_name(&self.create_domain, sql, "CREATE DOMAIN")?;
        let base_type = self
            .domain_base
            .captures(sql)
            .map(|caps| caps[1].trim().to_string())
            .unwrap_or_default();
        let default = self
            .domain_default
            .captures(sql)
            .map(|caps| caps[1].to_string());
        let check = self
            .domain_check
            .captures(sql)
            .map(|caps| caps[1].to_string());
        Ok(Statement::CreateDomain {
            name,
            base_type,
            default,
            check,
        })
    }

    fn recognize_create_index(&self, sql: &str) -> Result<Statement, Error> {
        let caps = self.create_index.captures(sql).ok_or_else(|| Error::Recognize {
            kind: "CREATE INDEX",
            sql: sql.to_string(),
        })?;
        let unique = caps.get(1).is_some();
        let name = caps[2].to_string();
        let table = caps[3].to_string();

        let columns = lexer::paren_content(sql)
            .unwrap_or("")
            .split(',')
            .filter_map(|col| {
                // strip direction modifiers like DESC
                let col = col.trim().split_whitespace().next()?;
                if col.is_empty() {
                    None
                } else {
                    Some(col.to_string())
                }
            })
            .collect();

        let predicate = self
            .index_where
            .captures(sql)
            .map(|caps| caps[1].trim().to_string());

        Ok(Statement::CreateIndex {
            name,
            table,
            columns,
            unique,
            predicate,
        })
    }

    fn recognize_comment(&self, sql: &str) -> Result<Statement, Error> {
        let caps = self.comment_on.captures(sql).ok_or_else(|| Error::Recognize {
            kind: "COMMENT",
            sql: sql.to_string(),
        })?;
        let target = match caps[1].to_uppercase().as_str() {
            "TABLE" => CommentTarget::Table,
            "COLUMN" => CommentTarget::Column,
            "TYPE" => CommentTarget::Type,
            _ => CommentTarget::View,
        };
        let object = caps[2].to_string();
        // doubled quotes inside the literal fold back to single ones
        let text = self
            .comment_text
            .captures(sql)
            .map(|caps| caps[1].replace("''", "'"))
            .unwrap_or_default();
        Ok(Statement::Comment {
            target,
            object,
            text,
        })
    }
}

/// Split an enum value list on commas outside quotes, dropping the quotes.
fn parse_enum_values(content: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;

    for ch in content.chars() {
        match ch {
            '\'' => in_quote = !in_quote,
            ',' if !in_quote => {
                let value = current.trim();
                if !value.is_empty() {
                    values.push(value.to_string());
                }
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    let value = current.trim();
    if !value.is_empty() {
        values.push(value.to_string());
    }

    values
}
