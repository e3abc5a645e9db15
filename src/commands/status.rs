use std::io::{self, Write};

use anyhow::Result;
use tracing::info;

use crate::campaign::Campaign;
use crate::cli::StatusArgs;
use crate::folds::{completed_folds, count_train_phases, discover_folds};

#[derive(Debug, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub completed: usize,
    pub pending: usize,
}

pub fn run(args: StatusArgs) -> Result<()> {
    let mut out = io::BufWriter::new(io::stdout().lock());
    report(&args, &mut out)?;
    Ok(())
}

pub fn report<W: Write>(args: &StatusArgs, out: &mut W) -> Result<StatusCounts> {
    info!(campaign_dir = %args.campaign_dir.display(), "status requested");

    let (campaign, config) = Campaign::resume(&args.campaign_dir)?;
    let dataset = config.dataset()?;
    let mut folds = discover_folds(&args.subset_root, dataset)?;
    folds.sort_by(|a, b| a.name.cmp(&b.name));
    let completed = completed_folds(&campaign.dir)?;

    writeln!(out, "Campaign: {}", campaign.id)?;
    writeln!(out, "Dataset: {dataset}")?;

    let mut counts = StatusCounts::default();
    for fold in &folds {
        if completed.contains(&fold.name) {
            counts.completed += 1;
            writeln!(out, "  {:<12} completed", fold.name)?;
            continue;
        }
        counts.pending += 1;
        match count_train_phases(&fold.name, &fold.data_dir) {
            Ok(phases) => {
                writeln!(out, "  {:<12} pending (train phases: {phases})", fold.name)?;
            }
            Err(error) => {
                writeln!(out, "  {:<12} pending (unusable: {error})", fold.name)?;
            }
        }
    }
    writeln!(
        out,
        "Folds: {} completed, {} pending, {} total",
        counts.completed,
        counts.pending,
        folds.len()
    )?;
    out.flush()?;

    info!(
        campaign = %campaign.id,
        completed = counts.completed,
        pending = counts.pending,
        "status complete"
    );

    Ok(counts)
}
