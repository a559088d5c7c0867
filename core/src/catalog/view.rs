use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static FROM_RE: LazyLock<Regex> = LazyLock::new(|| crate::parser::pattern(r"(?i)\bFROM\s+(\w+)"));
static JOIN_RE: LazyLock<Regex> = LazyLock::new(|| crate::parser::pattern(r"(?i)\bJOIN\s+(\w+)"));

/// A view, stored as the literal `CREATE VIEW` statement it came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct View {
    pub name: String,
    pub definition: String,
    /// Table or view names appearing after FROM or JOIN in the definition
    pub depends_on: Vec<String>,
    pub comment: Option<String>,
    pub created_in: u32,
    /// Bumped each time the view is redefined
    pub version: u32,
}

impl View {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Scan the definition for dependencies. Only the first identifier
    /// after each FROM or JOIN is considered; aliases, schema qualifiers
    /// and subqueries are not parsed.
    pub fn extract_dependencies(&mut self) {
        self.depends_on.clear();
        for re in [&*FROM_RE, &*JOIN_RE] {
            for caps in re.captures_iter(&self.definition) {
                let name = caps[1].to_string();
                if !self.depends_on.contains(&name) {
                    self.depends_on.push(name);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_from_and_join_targets() {
        let mut view = View::new("v");
        view.definition =
            "CREATE VIEW v AS SELECT * FROM orders JOIN users ON users.id = orders.user_id"
                .to_string();
        view.extract_dependencies();
        assert_eq!(view.depends_on, vec!["orders", "users"]);
    }

    #[test]
    fn dependencies_are_deduplicated() {
        let mut view = View::new("v");
        view.definition = "CREATE VIEW v AS SELECT * FROM t UNION SELECT * FROM t".to_string();
        view.extract_dependencies();
        assert_eq!(view.depends_on, vec!["t"]);
    }
}
