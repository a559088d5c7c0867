use serde::{Deserialize, Serialize};

/// A recognized DDL statement with its structured payload.
///
/// Every consumer dispatches over this enum exhaustively, so adding a
/// variant forces the applier and the tests to cover it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// `CREATE TABLE [IF NOT EXISTS] <name> ( ... )`
    CreateTable {
        name: String,
        /// Raw content of the outermost parenthesized group
        definition: String,
    },
    /// `ALTER TABLE [IF EXISTS] <name> <operations>`
    AlterTable {
        name: String,
        operations: Vec<AlterOp>,
    },
    /// `DROP TABLE [IF EXISTS] <name>`
    DropTable { name: String },
    /// `CREATE TYPE <name> AS ENUM ('v', ...)`
    CreateEnum {
        name: String,
        values: Vec<String>,
    },
    /// `ALTER TYPE <name> ADD VALUE [IF NOT EXISTS] '<v>'`
    AlterEnum {
        name: String,
        value: Option<String>,
    },
    /// `DROP TYPE [IF EXISTS] <name>`
    DropEnum { name: String },
    /// `CREATE DOMAIN <name> AS <type> [DEFAULT ...] [CHECK (...)]`
    CreateDomain {
        name: String,
        base_type: String,
        default: Option<String>,
        check: Option<String>,
    },
    /// `DROP DOMAIN [IF EXISTS] <name>`
    DropDomain { name: String },
    /// `CREATE [OR REPLACE] VIEW <name> ...` with the full original text
    CreateView {
        name: String,
        definition: String,
    },
    /// `DROP VIEW [IF EXISTS] <name>`
    DropView { name: String },
    /// `CREATE [UNIQUE] INDEX <name> ON <table> (...) [WHERE ...]`
    CreateIndex {
        name: String,
        table: String,
        columns: Vec<String>,
        unique: bool,
        predicate: Option<String>,
    },
    /// `DROP INDEX [IF EXISTS] <name>`
    DropIndex { name: String },
    /// `COMMENT ON <kind> <object> IS '...'`
    Comment {
        target: CommentTarget,
        object: String,
        text: String,
    },
    /// `DO $$ ... $$`, scanned for an embedded `ALTER TYPE ... ADD VALUE`
    DoBlock {
        body: String,
        /// `(type name, added value)` when the body alters an enum
        enum_value: Option<(String, String)>,
    },
}

/// A single operation inside an `ALTER TABLE` statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AlterOp {
    AddColumn {
        column: String,
        data_type: String,
        /// Full operation text, scanned later for NOT NULL and DEFAULT
        clause: String,
    },
    DropColumn {
        column: String,
    },
    AlterColumn {
        column: String,
        /// New type when the operation is `ALTER COLUMN ... TYPE ...`
        data_type: Option<String>,
        clause: String,
    },
}

/// Object kind named by a `COMMENT ON` statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommentTarget {
    Table,
    Column,
    Type,
    View,
}
