use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("parameter {name} is required and cannot also carry a default")]
    SchemaConflict { name: String },

    #[error("default for parameter {name} is {found}, expected {expected}")]
    DefaultTypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("parameter {name} depends on {target}, which is not a boolean switch")]
    UnsupportedDependency { name: String, target: String },

    #[error("parameter {name} depends on unknown parameter {target}")]
    UnknownDependency { name: String, target: String },

    #[error("--continue_dir cannot be combined with other parameters (got: {})", .supplied.join(", "))]
    ConflictingMode { supplied: Vec<String> },

    #[error("missing required parameters: {}", .names.join(", "))]
    MissingRequired { names: Vec<String> },

    #[error("parameter {name} must be a finite number")]
    NonFiniteValue { name: String },

    #[error("parameter {name} requires --{target} to be set")]
    MissingDependency { name: String, target: String },

    #[error("campaign already has a configuration document at {}", .path.display())]
    CampaignExists { path: PathBuf },

    #[error("no configuration document at {}", .path.display())]
    MissingStateFile { path: PathBuf },

    #[error("dataset {dataset} not found under {}", .root.display())]
    DatasetNotFound { dataset: String, root: PathBuf },

    #[error("fold {fold} has malformed training files: {reason}")]
    MalformedFold { fold: String, reason: String },
}
