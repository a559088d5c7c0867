pub mod stmt;

pub use self::stmt::{AlterOp, CommentTarget, Statement};
