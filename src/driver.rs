use std::fmt;
use std::io::Write;
use std::process::Command;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::campaign::Campaign;
use crate::model::{DATA_DIR_KEY, FoldOutcome, FoldUnit, OUTPUT_DIR_KEY, ParamValue, RunConfig};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramSpec {
    pub program: String,
    pub base_args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitReport {
    pub code: Option<i32>,
    pub success: bool,
}

pub trait FoldLauncher {
    fn launch(&mut self, invocation: &Invocation) -> Result<ExitReport>;
}

#[derive(Debug, Default)]
pub struct ProcessLauncher;

impl FoldLauncher for ProcessLauncher {
    fn launch(&mut self, invocation: &Invocation) -> Result<ExitReport> {
        let status = Command::new(&invocation.program)
            .args(&invocation.args)
            .status()
            .with_context(|| format!("failed to execute {}", invocation.program))?;

        Ok(ExitReport {
            code: status.code(),
            success: status.success(),
        })
    }
}

#[derive(Debug, Default)]
pub struct DryRunLauncher;

impl FoldLauncher for DryRunLauncher {
    fn launch(&mut self, _invocation: &Invocation) -> Result<ExitReport> {
        Ok(ExitReport {
            code: None,
            success: true,
        })
    }
}

// true switches become a bare flag; false switches and nulls are dropped.
pub fn render_args(config: &RunConfig) -> Vec<String> {
    let mut args = Vec::new();
    for (name, value) in &config.values {
        match value {
            Some(ParamValue::Bool(true)) => args.push(format!("--{name}")),
            Some(ParamValue::Bool(false)) | None => {}
            Some(other) => {
                args.push(format!("--{name}"));
                args.push(other.to_string());
            }
        }
    }
    args
}

pub fn fold_invocation(
    campaign: &Campaign,
    config: &RunConfig,
    fold: &FoldUnit,
    program: &ProgramSpec,
) -> Invocation {
    let mut fold_config = config.clone();
    fold_config.set(
        OUTPUT_DIR_KEY,
        ParamValue::Str(campaign.fold_output_dir(&fold.name).display().to_string()),
    );
    fold_config.set(
        DATA_DIR_KEY,
        ParamValue::Str(fold.data_dir.display().to_string()),
    );

    let mut args = program.base_args.clone();
    args.extend(render_args(&fold_config));
    Invocation {
        program: program.program.clone(),
        args,
    }
}

pub fn dispatch_folds<L: FoldLauncher, W: Write>(
    campaign: &Campaign,
    config: &RunConfig,
    folds: &[FoldUnit],
    program: &ProgramSpec,
    launcher: &mut L,
    out: &mut W,
) -> Result<Vec<FoldOutcome>> {
    let mut outcomes = Vec::with_capacity(folds.len());

    for (index, fold) in folds.iter().enumerate() {
        let invocation = fold_invocation(campaign, config, fold, program);
        info!(
            campaign = %campaign.id,
            fold = %fold.name,
            position = index + 1,
            total = folds.len(),
            train_phases = ?fold.train_phases,
            "dispatching fold"
        );
        writeln!(out, "{invocation}")?;
        out.flush()?;

        let report = launcher.launch(&invocation)?;
        if report.success {
            info!(fold = %fold.name, "fold program exited");
        } else {
            warn!(
                fold = %fold.name,
                exit_code = ?report.code,
                "fold program exited unsuccessfully"
            );
        }

        outcomes.push(FoldOutcome {
            fold: fold.name.clone(),
            exit_code: report.code,
            success: report.success,
        });
    }

    Ok(outcomes)
}
