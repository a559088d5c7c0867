use serde::{Deserialize, Serialize};

/// A PostgreSQL enum type with its ordered value list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnumType {
    pub name: String,
    pub values: Vec<String>,
    pub comment: Option<String>,
    pub created_in: u32,
    /// Tables observed to use this enum, in analysis order
    pub used_by: Vec<String>,
}

impl EnumType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Append a value, silently skipping duplicates.
    pub fn add_value(&mut self, value: impl Into<String>) {
        let value = value.into();
        if !self.values.contains(&value) {
            self.values.push(value);
        }
    }

    pub fn add_used_by(&mut self, table: &str) {
        if !self.used_by.iter().any(|t| t == table) {
            self.used_by.push(table.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_value_skips_duplicates() {
        let mut e = EnumType::new("status");
        e.add_value("a");
        e.add_value("b");
        e.add_value("a");
        assert_eq!(e.values, vec!["a", "b"]);
    }
}
