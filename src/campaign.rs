use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::LaunchError;
use crate::model::{DATA_DIR_KEY, OUTPUT_DIR_KEY, RunConfig};
use crate::schema::{DefaultValue, Schema};
use crate::util::{ensure_directory, read_json, utc_compact_string, write_json_pretty};
use crate::validate::SuppliedValues;

pub const CONFIG_FILE_NAME: &str = "args.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Campaign {
    pub id: String,
    pub dir: PathBuf,
}

impl Campaign {
    pub fn create(runs_root: &Path, started: DateTime<Utc>, config: &RunConfig) -> Result<Self> {
        let id = format!("run-{}", utc_compact_string(started));
        let dir = runs_root.join(&id);
        ensure_directory(&dir)?;

        let campaign = Self { id, dir };
        if campaign.config_path().exists() {
            return Err(LaunchError::CampaignExists {
                path: campaign.config_path(),
            }
            .into());
        }
        write_json_pretty(&campaign.config_path(), config)?;
        info!(
            campaign = %campaign.id,
            path = %campaign.config_path().display(),
            "wrote campaign configuration"
        );

        Ok(campaign)
    }

    pub fn resume(continue_dir: &Path) -> Result<(Self, RunConfig)> {
        let config_path = continue_dir.join(CONFIG_FILE_NAME);
        if !config_path.is_file() {
            return Err(LaunchError::MissingStateFile { path: config_path }.into());
        }

        let config: RunConfig = read_json(&config_path)?;
        let id = continue_dir
            .file_name()
            .and_then(|name| name.to_str())
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| continue_dir.display().to_string());

        info!(campaign = %id, path = %config_path.display(), "resuming campaign");

        Ok((
            Self {
                id,
                dir: continue_dir.to_path_buf(),
            },
            config,
        ))
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE_NAME)
    }

    pub fn fold_output_dir(&self, fold: &str) -> PathBuf {
        self.dir.join(fold)
    }
}

// Supplied values win; otherwise the schema default, switches fall back to off,
// and anything else is persisted as null. The per-fold path keys are recorded
// as null and filled in at dispatch.
pub fn fresh_config(schema: &Schema, supplied: &SuppliedValues) -> RunConfig {
    let mut config = RunConfig::default();
    for spec in schema.iter() {
        let value = supplied
            .get(spec.name)
            .cloned()
            .or_else(|| spec.effective_default().map(DefaultValue::to_value));
        config.values.insert(spec.name.to_string(), value);
    }
    for key in [OUTPUT_DIR_KEY, DATA_DIR_KEY] {
        config.values.entry(key.to_string()).or_insert(None);
    }
    config
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::model::ParamValue;
    use crate::schema::{ParamSpec, SCHEMA};

    fn started() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 17, 13, 45, 0)
            .single()
            .expect("valid timestamp")
    }

    fn sample_supplied() -> SuppliedValues {
        [
            ("task_name", ParamValue::Str("webdetect".to_string())),
            ("dataset", ParamValue::Str("all_data".to_string())),
            ("do_train", ParamValue::Bool(true)),
            ("learning_rate", ParamValue::Float(0.001)),
            ("seed", ParamValue::Int(7)),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
    }

    #[test]
    fn fresh_config_applies_defaults_and_keeps_every_key() {
        let config = fresh_config(&SCHEMA, &sample_supplied());

        assert_eq!(config.values.len(), SCHEMA.len() + 2);
        assert_eq!(config.get("learning_rate"), Some(&ParamValue::Float(0.001)));
        assert_eq!(config.get("seed"), Some(&ParamValue::Int(7)));
        assert_eq!(config.get("max_seq_length"), Some(&ParamValue::Int(128)));
        assert_eq!(config.get("do_train"), Some(&ParamValue::Bool(true)));
        assert_eq!(config.get("do_eval"), Some(&ParamValue::Bool(false)));
        assert_eq!(config.values.get("focal_loss_gamma"), Some(&None));
        assert_eq!(config.values.get(OUTPUT_DIR_KEY), Some(&None));
        assert_eq!(config.values.get(DATA_DIR_KEY), Some(&None));
    }

    #[test]
    fn fresh_config_applies_boolean_defaults() {
        static SPECS: &[ParamSpec] = &[
            ParamSpec::flag("overwrite_cache", "").default(DefaultValue::Bool(true)),
            ParamSpec::flag("fp16", ""),
        ];

        let config = fresh_config(&Schema::new(SPECS), &SuppliedValues::new());
        assert_eq!(config.get("overwrite_cache"), Some(&ParamValue::Bool(true)));
        assert_eq!(config.get("fp16"), Some(&ParamValue::Bool(false)));
    }

    #[test]
    fn persisted_document_records_path_keys_as_null() {
        let root = tempfile::tempdir().expect("tempdir");
        let config = fresh_config(&SCHEMA, &sample_supplied());

        let campaign = Campaign::create(root.path(), started(), &config).expect("create campaign");
        let raw = std::fs::read_to_string(campaign.config_path()).expect("read config");
        let document: serde_json::Value = serde_json::from_str(&raw).expect("parse config");
        assert!(document[OUTPUT_DIR_KEY].is_null());
        assert!(document[DATA_DIR_KEY].is_null());
        assert!(document.get(OUTPUT_DIR_KEY).is_some());
    }

    #[test]
    fn persisted_configuration_reloads_unchanged() {
        let root = tempfile::tempdir().expect("tempdir");
        let config = fresh_config(&SCHEMA, &sample_supplied());

        let campaign = Campaign::create(root.path(), started(), &config).expect("create campaign");
        assert_eq!(campaign.id, "run-20240517T134500Z");
        assert!(campaign.config_path().is_file());

        let (resumed, reloaded) = Campaign::resume(&campaign.dir).expect("resume campaign");
        assert_eq!(resumed, campaign);
        assert_eq!(reloaded, config);

        let first = std::fs::read(campaign.config_path()).expect("read config");
        write_json_pretty(&campaign.config_path(), &reloaded).expect("rewrite config");
        let second = std::fs::read(campaign.config_path()).expect("read config");
        assert_eq!(first, second);
    }

    #[test]
    fn creating_into_an_empty_existing_directory_is_allowed() {
        let root = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(root.path().join("run-20240517T134500Z")).expect("create dir");
        let config = fresh_config(&SCHEMA, &sample_supplied());

        Campaign::create(root.path(), started(), &config).expect("create into empty dir");
    }

    #[test]
    fn creating_over_an_existing_campaign_is_refused() {
        let root = tempfile::tempdir().expect("tempdir");
        let config = fresh_config(&SCHEMA, &sample_supplied());
        let campaign = Campaign::create(root.path(), started(), &config).expect("first create");
        let before = std::fs::read(campaign.config_path()).expect("read config");

        let mut other = config.clone();
        other.set("seed", ParamValue::Int(99));
        let error = Campaign::create(root.path(), started(), &other).expect_err("should refuse");

        assert!(matches!(
            error.downcast_ref::<LaunchError>(),
            Some(LaunchError::CampaignExists { .. })
        ));
        let after = std::fs::read(campaign.config_path()).expect("read config");
        assert_eq!(before, after);
    }

    #[test]
    fn resume_without_configuration_document_fails() {
        let root = tempfile::tempdir().expect("tempdir");

        let error = Campaign::resume(root.path()).expect_err("resume should fail");
        assert!(matches!(
            error.downcast_ref::<LaunchError>(),
            Some(LaunchError::MissingStateFile { .. })
        ));
    }
}
