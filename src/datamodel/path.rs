use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A path into the data model of one module, e.g. `game:Player.Health.Current`.
///
/// The module id selects the data model, the dotted remainder is walked level by level.
/// An empty remainder addresses the module's root model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataModelPath {
    module: String,
    path: String,
}

impl DataModelPath {
    pub fn new(module: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            path: path.into(),
        }
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn segments(&self) -> Vec<&str> {
        split_segments(&self.path)
    }
}

/// Splits a dotted property path, ignoring empty segments.
pub fn split_segments(path: &str) -> Vec<&str> {
    path.split('.').filter(|s| !s.is_empty()).collect()
}

impl fmt::Display for DataModelPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.path)
    }
}

impl FromStr for DataModelPath {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((module, path)) if !module.is_empty() => Ok(Self::new(module, path)),
            _ => Err(format!("'{}' is not a data model path of the form module:Path.To.Value", s)),
        }
    }
}
