//! Tag values attached to graphemes and records.
//!
//! Older records store tags positionally, one slot per column of the tag
//! schema; newer ones key them by column name. Both shapes are accepted and
//! written back unchanged.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Tags of a grapheme, symbol or record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Tags {
    /// One slot per schema column; unset slots are null.
    Positional(Vec<Option<String>>),
    /// Keyed by column name.
    Named(BTreeMap<String, String>),
}

impl Default for Tags {
    fn default() -> Self {
        Tags::Named(BTreeMap::new())
    }
}

impl Tags {
    /// Empty positional tags.
    pub fn positional() -> Self {
        Tags::Positional(Vec::new())
    }

    /// Empty named tags.
    pub fn named() -> Self {
        Tags::Named(BTreeMap::new())
    }

    /// Value of schema column `column`, called `name`.
    pub fn get(&self, column: usize, name: &str) -> Option<&str> {
        match self {
            Tags::Positional(values) => values.get(column)?.as_deref(),
            Tags::Named(map) => map.get(name).map(String::as_str),
        }
    }

    /// Set schema column `column`, called `name`, to `value`.
    /// Positional tags grow with empty slots as needed.
    pub fn set(&mut self, column: usize, name: &str, value: impl Into<String>) {
        match self {
            Tags::Positional(values) => {
                if values.len() <= column {
                    values.resize(column + 1, None);
                }
                values[column] = Some(value.into());
            }
            Tags::Named(map) => {
                map.insert(name.to_string(), value.into());
            }
        }
    }

    /// Copy with column `column` set to `value`.
    pub fn with(&self, column: usize, name: &str, value: impl Into<String>) -> Self {
        let mut tags = self.clone();
        tags.set(column, name, value);
        tags
    }

    /// Whether no column has a value.
    pub fn is_empty(&self) -> bool {
        match self {
            Tags::Positional(values) => values.iter().all(Option::is_none),
            Tags::Named(map) => map.is_empty(),
        }
    }

    /// Keyed view of the tags. Positional slots are named after `columns`,
    /// or after their index when the schema is shorter.
    pub fn to_named(&self, columns: &[String]) -> BTreeMap<String, String> {
        match self {
            Tags::Named(map) => map.clone(),
            Tags::Positional(values) => values
                .iter()
                .enumerate()
                .filter_map(|(i, value)| {
                    let value = value.as_ref()?;
                    let name = columns.get(i).cloned().unwrap_or_else(|| i.to_string());
                    Some((name, value.clone()))
                })
                .collect(),
        }
    }
}
