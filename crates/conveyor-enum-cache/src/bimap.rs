use std::collections::HashMap;

/// A `{value -> description, description -> value}` pair for one enum
/// table. Snapshots are replaced wholesale on [`super::Cache::load`] — never
/// mutated in place — so a reader holding a clone of one never observes a
/// torn state.
#[derive(Default, Clone)]
pub struct Bimap {
    by_value: HashMap<i32, String>,
    by_description: HashMap<String, i32>,
}

impl Bimap {
    pub fn from_rows(rows: impl IntoIterator<Item = (i32, String)>) -> Self {
        let mut by_value = HashMap::new();
        let mut by_description = HashMap::new();
        for (value, description) in rows {
            by_value.insert(value, description.clone());
            by_description.insert(description, value);
        }
        Bimap {
            by_value,
            by_description,
        }
    }

    pub fn value_of(&self, description: &str) -> Option<i32> {
        self.by_description.get(description).copied()
    }

    pub fn description_of(&self, value: i32) -> Option<&str> {
        self.by_value.get(&value).map(String::as_str)
    }
}
