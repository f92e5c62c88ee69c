use std::collections::BTreeSet;
use std::str::FromStr;

use crate::model::config::ConfigError;

/// Target-class-vs-rest grouping layered over the multi-class labels.
/// An object is positive iff its label is `positive_class` and its id is
/// not listed in `exception_ids`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryRule {
    pub positive_class: usize,
    pub positive_label: String,
    pub exception_ids: BTreeSet<String>,
}

impl BinaryRule {
    /// ModelNet40 "chair" (class 8) with the two chair models known to be
    /// mislabelled in the rendered dataset.
    pub fn modelnet40_chair() -> Self {
        Self {
            positive_class: 8,
            positive_label: "chair".to_string(),
            exception_ids: default_exception_ids(),
        }
    }

    pub fn is_positive(&self, target_class: usize, object_id: &str) -> bool {
        target_class == self.positive_class && !self.exception_ids.contains(object_id)
    }
}

pub fn default_exception_ids() -> BTreeSet<String> {
    ["chair_0944", "chair_0950"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// `--positive-class` as given on the command line; a name needs the
/// dataset class list to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PositiveClassSpec {
    Index(usize),
    Name(String),
}

impl FromStr for PositiveClassSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("positive class must not be empty".to_string());
        }
        match s.parse::<usize>() {
            Ok(idx) => Ok(PositiveClassSpec::Index(idx)),
            Err(_) => Ok(PositiveClassSpec::Name(s.to_string())),
        }
    }
}

impl PositiveClassSpec {
    pub fn resolve(
        &self,
        class_names: Option<&[String]>,
        num_classes: usize,
    ) -> Result<usize, ConfigError> {
        let index = match self {
            PositiveClassSpec::Index(idx) => *idx,
            PositiveClassSpec::Name(name) => class_names
                .and_then(|names| names.iter().position(|n| n == name))
                .ok_or_else(|| ConfigError::UnknownPositiveClass(name.clone()))?,
        };
        if index >= num_classes {
            return Err(ConfigError::PositiveClassRange { index, num_classes });
        }
        Ok(index)
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/rule.rs"]
mod tests;
