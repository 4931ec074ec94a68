use std::env;
use std::path::PathBuf;
use std::process;

use insightrs::vis::{render_chart_data, render_pivot, ChartConfig};
use insightrs::{ColumnProfile, InsightConfig, InsightSession};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: insightrs <file.csv> [--json] [--config <path>] [--pivot <colA> <colB>]";

#[derive(Debug, Default)]
struct Args {
    input: Option<PathBuf>,
    json: bool,
    config: Option<PathBuf>,
    pivot: Option<(String, String)>,
}

fn parse_args(mut argv: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut args = Args::default();
    while let Some(arg) = argv.next() {
        match arg.as_str() {
            "--json" => args.json = true,
            "--config" => {
                let path = argv.next().ok_or("--config needs a path")?;
                args.config = Some(PathBuf::from(path));
            }
            "--pivot" => {
                let a = argv.next().ok_or("--pivot needs two column names")?;
                let b = argv.next().ok_or("--pivot needs two column names")?;
                args.pivot = Some((a, b));
            }
            "-h" | "--help" => return Err(USAGE.to_string()),
            flag if flag.starts_with("--") => return Err(format!("unknown option {}", flag)),
            _ if args.input.is_none() => args.input = Some(PathBuf::from(arg)),
            _ => return Err(format!("unexpected argument {}", arg)),
        }
    }
    Ok(args)
}

fn print_profile(profile: &ColumnProfile) {
    if let Some(p) = profile.as_numeric() {
        println!(
            "  {:<20} numeric      count={} mean={} median={} min={} max={} stdev={}",
            profile.name, p.count, p.mean, p.median, p.min, p.max, p.stdev
        );
    } else if let Some(p) = profile.as_categorical() {
        let top: Vec<String> = p
            .top
            .iter()
            .take(3)
            .map(|t| format!("{} ({})", t.value, t.count))
            .collect();
        println!(
            "  {:<20} categorical  unique={} top: {}",
            profile.name,
            p.unique_count,
            top.join(", ")
        );
    }
}

fn run(args: Args) -> insightrs::Result<()> {
    let config = match &args.config {
        Some(path) => InsightConfig::from_file(path)?,
        None => InsightConfig::load()?,
    };
    let Some(input) = args.input else {
        eprintln!("{}", USAGE);
        process::exit(2);
    };

    let mut session = InsightSession::new(config);
    let summary = session.load_path_with(&input, |progress| {
        tracing::debug!(batches = progress.batches, rows = progress.rows, "batch received");
    })?;
    if summary.capped {
        tracing::warn!(
            "only the first {} rows were analysed ({} dropped)",
            summary.rows,
            summary.discarded_rows
        );
    }

    if args.json {
        let mut report = serde_json::to_value(session.report())?;
        if let Some((a, b)) = &args.pivot {
            report["pivot"] = serde_json::to_value(session.pivot(a, b))?;
        }
        println!("{}", report);
        return Ok(());
    }

    let report = session.report();
    println!("{}: {} rows", summary.source, report.row_count);
    println!();
    for profile in report.profiles.columns() {
        print_profile(profile);
    }

    let chart_config = ChartConfig::default();
    for spec in report.chart_specs.specs() {
        if let Some(data) = session.chart_data(&spec.id)? {
            println!();
            print!("{}", render_chart_data(&data, &chart_config.titled(&spec.id)));
        }
    }

    if let Some((a, b)) = &args.pivot {
        let table = session.pivot(a, b);
        println!();
        print!(
            "{}",
            render_pivot(&table, &chart_config.titled(format!("{} x {}", a, b)))
        );
    }

    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = match parse_args(env::args().skip(1)) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{}", message);
            process::exit(2);
        }
    };

    if let Err(e) = run(args) {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}
