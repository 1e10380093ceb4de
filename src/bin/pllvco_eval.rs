//! Evaluate one PLL VCO design point and print its cost.
//!
//! One process per trial: run many of these side by side with distinct
//! `--index` values to evaluate candidates in parallel.

use pllvco::{EvalError, Evaluator, EvaluatorConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: pllvco-eval [--config PATH] [--template DIR] [--real] \
[--index N] [--suffix S] [--keep] V1 V2 ... Vn";

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    template: Option<PathBuf>,
    real: bool,
    index: Option<u64>,
    suffix: Option<String>,
    keep: bool,
    values: Vec<f64>,
}

fn parse_args(mut raw: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut args = Args::default();

    while let Some(arg) = raw.next() {
        let mut value_of = |flag: &str| {
            raw.next()
                .ok_or_else(|| format!("{} needs a value", flag))
        };
        match arg.as_str() {
            "--config" => args.config = Some(PathBuf::from(value_of("--config")?)),
            "--template" => args.template = Some(PathBuf::from(value_of("--template")?)),
            "--suffix" => args.suffix = Some(value_of("--suffix")?),
            "--index" => {
                let v = value_of("--index")?;
                args.index = Some(v.parse().map_err(|_| format!("bad index '{}'", v))?);
            }
            "--real" => args.real = true,
            "--keep" => args.keep = true,
            "-h" | "--help" => return Err(USAGE.to_string()),
            value => args
                .values
                .push(value.parse().map_err(|_| format!("bad value '{}'", value))?),
        }
    }

    if args.values.is_empty() {
        return Err(USAGE.to_string());
    }
    Ok(args)
}

fn run(args: Args) -> Result<f64, EvalError> {
    let mut config = match &args.config {
        Some(path) => EvaluatorConfig::from_json_file(path)?,
        None => EvaluatorConfig::pll_vco("circuit"),
    };
    if let Some(template) = args.template {
        config.template_dir = template;
    }
    if let Some(suffix) = args.suffix {
        config.suffix = suffix;
    }
    if args.keep {
        config.delete_trials = false;
    }

    let evaluator = Evaluator::new(config)?;
    evaluator.evaluate(&args.values, args.real, args.index)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{}", msg);
            return ExitCode::from(2);
        }
    };

    match run(args) {
        Ok(cost) => {
            println!("{}", cost);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
