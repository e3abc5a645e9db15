use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;

use crate::error::LaunchError;
use crate::model::FoldUnit;

pub const RESULT_MARKER_PATTERN: &str = r"^eval_results.*\.txt$";

pub fn subset_dir(subset_root: &Path, dataset: &str) -> PathBuf {
    subset_root.join(dataset)
}

// Order follows directory enumeration and is not stable across runs.
pub fn discover_folds(subset_root: &Path, dataset: &str) -> Result<Vec<FoldUnit>> {
    let root = subset_dir(subset_root, dataset);
    if !root.is_dir() {
        return Err(LaunchError::DatasetNotFound {
            dataset: dataset.to_string(),
            root: subset_root.to_path_buf(),
        }
        .into());
    }

    let folds = child_directories(&root)?
        .into_iter()
        .map(|(name, data_dir)| FoldUnit {
            name,
            data_dir,
            train_phases: None,
        })
        .collect();

    Ok(folds)
}

// Only folds about to be dispatched are inspected; a finished fold's data
// layout no longer matters.
pub fn inspect_train_phases(folds: &mut [FoldUnit]) -> Result<()> {
    for fold in folds {
        fold.train_phases = Some(count_train_phases(&fold.name, &fold.data_dir)?);
    }
    Ok(())
}

pub fn completed_folds(campaign_dir: &Path) -> Result<BTreeSet<String>> {
    let pattern =
        Regex::new(RESULT_MARKER_PATTERN).context("failed to compile result marker regex")?;

    let mut completed = BTreeSet::new();
    for (name, output_dir) in child_directories(campaign_dir)? {
        if has_result_marker(&output_dir, &pattern)? {
            completed.insert(name);
        }
    }

    Ok(completed)
}

pub fn remaining_folds(folds: Vec<FoldUnit>, completed: &BTreeSet<String>) -> Vec<FoldUnit> {
    folds
        .into_iter()
        .filter(|fold| !completed.contains(&fold.name))
        .collect()
}

// A lone train.tsv is a single-phase fold (0); otherwise the files must run
// train1.tsv..trainN.tsv without gaps.
pub fn count_train_phases(fold: &str, data_dir: &Path) -> Result<usize> {
    let mut train_files = Vec::new();
    for entry in
        fs::read_dir(data_dir).with_context(|| format!("failed to read {}", data_dir.display()))?
    {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", data_dir.display()))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with("train") && name.ends_with(".tsv") {
            train_files.push(name);
        }
    }

    if train_files.len() == 1 && train_files[0] == "train.tsv" {
        return Ok(0);
    }

    let present = train_files.iter().map(String::as_str).collect::<BTreeSet<_>>();
    for phase in 1..=train_files.len() {
        let expected = format!("train{phase}.tsv");
        if !present.contains(expected.as_str()) {
            return Err(LaunchError::MalformedFold {
                fold: fold.to_string(),
                reason: format!(
                    "expected sequential train1.tsv..train{}.tsv, missing {expected} (found: {})",
                    train_files.len(),
                    train_files.join(", ")
                ),
            }
            .into());
        }
    }

    Ok(train_files.len())
}

fn child_directories(root: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut children = Vec::new();

    let entries =
        fs::read_dir(root).with_context(|| format!("failed to read {}", root.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read entry in {}", root.display()))?;
        let path = entry.path();

        if !entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?
            .is_dir()
        {
            continue;
        }

        let name = entry
            .file_name()
            .to_str()
            .map(ToOwned::to_owned)
            .with_context(|| format!("invalid UTF-8 directory name: {}", path.display()))?;
        children.push((name, path));
    }

    Ok(children)
}

fn has_result_marker(output_dir: &Path, pattern: &Regex) -> Result<bool> {
    let entries = fs::read_dir(output_dir)
        .with_context(|| format!("failed to read {}", output_dir.display()))?;
    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", output_dir.display()))?;
        let is_file = entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", entry.path().display()))?
            .is_file();
        if is_file && pattern.is_match(&entry.file_name().to_string_lossy()) {
            return Ok(true);
        }
    }

    Ok(false)
}
