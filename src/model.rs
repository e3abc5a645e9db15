use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

pub const OUTPUT_DIR_KEY: &str = "output_dir";
pub const DATA_DIR_KEY: &str = "data_dir";
pub const DATASET_KEY: &str = "dataset";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl ParamValue {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Str(value) => f.write_str(value),
        }
    }
}

// Keys are parameter names; `None` is an unset optional parameter and is
// persisted as JSON null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunConfig {
    pub values: BTreeMap<String, Option<ParamValue>>,
}

impl RunConfig {
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name).and_then(Option::as_ref)
    }

    pub fn set(&mut self, name: &str, value: ParamValue) {
        self.values.insert(name.to_string(), Some(value));
    }

    pub fn dataset(&self) -> Result<&str> {
        match self.get(DATASET_KEY) {
            Some(ParamValue::Str(name)) => Ok(name.as_str()),
            Some(other) => bail!("{DATASET_KEY} must be a string, found {}", other.kind()),
            None => bail!("configuration has no {DATASET_KEY} value"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldUnit {
    pub name: String,
    pub data_dir: PathBuf,
    pub train_phases: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldOutcome {
    pub fold: String,
    pub exit_code: Option<i32>,
    pub success: bool,
}
