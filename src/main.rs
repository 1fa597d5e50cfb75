use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use rusty_tally::{load_file, run_query, FilterSpec};

const USAGE: &str = "\
Usage: rusty-tally <transactions.csv> [options]

Options:
  --start YYYY-MM-DD      only transactions on or after this date
  --end YYYY-MM-DD        only transactions up to and including this date
  --store NAME            restrict to a store (repeatable)
  --category NAME         restrict to a category (repeatable)
  --payment NAME          restrict to a payment mode (repeatable)
";

fn main() -> Result<()> {
    env_logger::init();

    let (path, spec) = parse_args(std::env::args().skip(1))?;
    let dataset = load_file(&path)?;

    if let Some((lo, hi)) = dataset.date_range() {
        log::info!("dataset covers {lo} to {hi}");
    }

    let bundle = run_query(&dataset, &spec);
    let json = serde_json::to_string_pretty(&bundle).context("serializing view bundle")?;
    println!("{json}");
    Ok(())
}

fn parse_args(args: impl Iterator<Item = String>) -> Result<(PathBuf, FilterSpec)> {
    let mut path: Option<PathBuf> = None;
    let mut spec = FilterSpec::new();
    let mut args = args;

    while let Some(arg) = args.next() {
        let mut value = |flag: &str| {
            args.next()
                .with_context(|| format!("{flag} expects a value\n\n{USAGE}"))
        };
        match arg.as_str() {
            "--start" => spec.start_date = Some(parse_date(&value("--start")?)?),
            "--end" => spec.end_date = Some(parse_date(&value("--end")?)?),
            "--store" => {
                spec.stores.insert(value("--store")?);
            }
            "--category" => {
                spec.categories.insert(value("--category")?);
            }
            "--payment" => {
                spec.payment_modes.insert(value("--payment")?);
            }
            "--help" | "-h" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            other if other.starts_with("--") => bail!("unknown option {other}\n\n{USAGE}"),
            other => {
                if path.is_some() {
                    bail!("unexpected extra argument {other}\n\n{USAGE}");
                }
                path = Some(PathBuf::from(other));
            }
        }
    }

    let path = path.with_context(|| format!("missing table path\n\n{USAGE}"))?;
    Ok((path, spec))
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("'{s}' is not a YYYY-MM-DD date"))
}
