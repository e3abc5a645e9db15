use std::collections::BTreeSet;
use std::io::{self, Write};

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::campaign::{Campaign, fresh_config};
use crate::cli::RunArgs;
use crate::driver::{DryRunLauncher, FoldLauncher, ProcessLauncher, ProgramSpec, dispatch_folds};
use crate::folds::{completed_folds, discover_folds, inspect_train_phases, remaining_folds};
use crate::model::FoldOutcome;
use crate::schema::{SCHEMA, Schema};
use crate::validate::{check_required, check_schema, validate_invocation};

#[derive(Debug)]
pub struct RunSummary {
    pub campaign: Campaign,
    pub already_completed: usize,
    pub outcomes: Vec<FoldOutcome>,
}

pub fn run(args: RunArgs) -> Result<()> {
    let mut out = io::BufWriter::new(io::stdout().lock());
    let started = Utc::now();

    let summary = if args.dry_run {
        execute(&args, &SCHEMA, started, &mut DryRunLauncher, &mut out)?
    } else {
        execute(&args, &SCHEMA, started, &mut ProcessLauncher, &mut out)?
    };

    info!(
        campaign = %summary.campaign.id,
        dispatched = summary.outcomes.len(),
        already_completed = summary.already_completed,
        "run complete"
    );
    Ok(())
}

pub fn execute<L: FoldLauncher, W: Write>(
    args: &RunArgs,
    schema: &Schema,
    started: DateTime<Utc>,
    launcher: &mut L,
    out: &mut W,
) -> Result<RunSummary> {
    check_schema(schema)?;
    info!(parameters = schema.len(), "parameter schema is consistent");
    validate_invocation(schema, args.continue_dir.as_deref(), &args.supplied)?;

    let (campaign, config, folds, completed) = match &args.continue_dir {
        Some(continue_dir) => {
            let (campaign, config) = Campaign::resume(continue_dir)?;
            let folds = discover_folds(&args.subset_root, config.dataset()?)?;
            let completed = completed_folds(&campaign.dir)?;
            (campaign, config, folds, completed)
        }
        None => {
            check_required(schema, &args.supplied)?;
            let config = fresh_config(schema, &args.supplied);
            let folds = discover_folds(&args.subset_root, config.dataset()?)?;
            let campaign = Campaign::create(&args.runs_root, started, &config)?;
            (campaign, config, folds, BTreeSet::new())
        }
    };

    let discovered = folds.len();
    let mut pending = remaining_folds(folds, &completed);
    inspect_train_phases(&mut pending)?;
    let already_completed = discovered - pending.len();
    let dataset = config.dataset()?;
    info!(
        campaign = %campaign.id,
        dataset = %dataset,
        discovered,
        already_completed,
        pending = pending.len(),
        dry_run = args.dry_run,
        "computed remaining folds"
    );

    let program = ProgramSpec {
        program: args.program.clone(),
        base_args: args.program_args.clone(),
    };
    let outcomes = dispatch_folds(&campaign, &config, &pending, &program, launcher, out)?;

    let failed = outcomes
        .iter()
        .filter(|outcome| !outcome.success)
        .map(|outcome| match outcome.exit_code {
            Some(code) => format!("{}(exit {code})", outcome.fold),
            None => format!("{}(signal)", outcome.fold),
        })
        .collect::<Vec<String>>();
    if !failed.is_empty() {
        warn!(
            campaign = %campaign.id,
            failed = %failed.join(","),
            continue_dir = %campaign.dir.display(),
            "some folds did not finish; rerun with --continue_dir to retry them"
        );
    }

    writeln!(
        out,
        "Campaign {} finished: dispatched {} fold(s), {} already completed. Resume with --continue_dir {}",
        campaign.id,
        outcomes.len(),
        already_completed,
        campaign.dir.display()
    )?;
    out.flush()?;

    Ok(RunSummary {
        campaign,
        already_completed,
        outcomes,
    })
}
