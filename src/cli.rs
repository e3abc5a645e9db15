use std::ffi::OsString;
use std::path::PathBuf;

use clap::builder::PossibleValuesParser;
use clap::{
    Arg, ArgAction, ArgMatches, Args, CommandFactory, FromArgMatches, Parser, Subcommand,
    value_parser,
};

use crate::model::ParamValue;
use crate::schema::{ParamSpec, Schema, ValueType};
use crate::validate::SuppliedValues;

#[derive(Parser, Debug)]
#[command(
    name = "foldlaunch",
    version,
    about = "Validate training parameters and run a training program over every data fold"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Run(RunArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[arg(long = "continue_dir")]
    pub continue_dir: Option<PathBuf>,

    #[arg(long, default_value = "runs")]
    pub runs_root: PathBuf,

    #[arg(long, default_value = "data_subsets")]
    pub subset_root: PathBuf,

    #[arg(long, default_value = "python")]
    pub program: String,

    #[arg(
        long = "program-arg",
        default_value = "run_classifier.py",
        allow_hyphen_values = true
    )]
    pub program_args: Vec<String>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    #[arg(skip)]
    pub supplied: SuppliedValues,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long)]
    pub campaign_dir: PathBuf,

    #[arg(long, default_value = "data_subsets")]
    pub subset_root: PathBuf,
}

pub fn parse(schema: &Schema) -> Cli {
    parse_from(schema, std::env::args_os()).unwrap_or_else(|err| err.exit())
}

pub fn parse_from<I, T>(schema: &Schema, args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let schema_args = schema.iter().map(schema_arg).collect::<Vec<Arg>>();
    let matches = Cli::command()
        .mut_subcommand("run", |run| run.args(schema_args))
        .try_get_matches_from(args)?;

    let mut cli = Cli::from_arg_matches(&matches)?;
    if let (Commands::Run(run_args), Some(run_matches)) =
        (&mut cli.command, matches.subcommand_matches("run"))
    {
        run_args.supplied = supplied_values(schema, run_matches);
    }

    Ok(cli)
}

fn schema_arg(spec: &'static ParamSpec) -> Arg {
    let help = match spec.default {
        Some(default) => format!("{} [default: {}]", spec.help, default.to_value()),
        None => spec.help.to_string(),
    };
    let arg = Arg::new(spec.name).long(spec.name).help(help);

    match spec.value_type {
        ValueType::Boolean => arg.action(ArgAction::SetTrue),
        ValueType::Integer => arg.value_parser(value_parser!(i64)),
        ValueType::Float => arg.value_parser(parse_finite_float),
        ValueType::String if !spec.choices.is_empty() => {
            arg.value_parser(PossibleValuesParser::new(spec.choices.iter().copied()))
        }
        ValueType::String => arg.value_parser(value_parser!(String)),
    }
}

fn parse_finite_float(raw: &str) -> Result<f64, String> {
    let value = raw
        .parse::<f64>()
        .map_err(|error| format!("invalid float {raw:?}: {error}"))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("{raw} is not a finite number"))
    }
}

// Only what appeared on the command line; schema defaults are applied later.
fn supplied_values(schema: &Schema, matches: &ArgMatches) -> SuppliedValues {
    let mut supplied = SuppliedValues::new();
    for spec in schema.iter() {
        let value = match spec.value_type {
            ValueType::Boolean => matches
                .get_flag(spec.name)
                .then_some(ParamValue::Bool(true)),
            ValueType::Integer => matches.get_one::<i64>(spec.name).copied().map(ParamValue::Int),
            ValueType::Float => matches.get_one::<f64>(spec.name).copied().map(ParamValue::Float),
            ValueType::String => matches
                .get_one::<String>(spec.name)
                .cloned()
                .map(ParamValue::Str),
        };
        if let Some(value) = value {
            supplied.insert(spec.name.to_string(), value);
        }
    }
    supplied
}
