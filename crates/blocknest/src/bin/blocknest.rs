// ABOUTME: CLI binary for blocknest.
// ABOUTME: Decorates an HTML file or stdin and prints the relocated page or a JSON report.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use blocknest::{Decorator, PageReport};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "blocknest")]
#[command(about = "Decorate a page and nest blocks into accordion and tabs slots")]
struct Args {
    /// HTML file to decorate (default: stdin)
    #[arg()]
    input: Option<PathBuf>,

    /// Output file path (default: stdout)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Output the report and the page as JSON instead of raw HTML
    #[arg(long = "json")]
    json_output: bool,

    /// Bound on waiting for nested blocks to finish decoration, in ms
    #[arg(long = "settle-ms", default_value_t = 5000)]
    settle_ms: u64,

    /// Do not fall back to the last slot in embed-container sections
    #[arg(long = "no-embed-fallback")]
    no_embed_fallback: bool,

    /// Do not merge consecutive tabs-container sections
    #[arg(long = "no-merge-tabs")]
    no_merge_tabs: bool,

    /// Log relocation decisions to stderr
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Exit with status 2 when any directive was skipped
    #[arg(long = "strict")]
    strict: bool,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    report: &'a PageReport,
    html: &'a str,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "blocknest=debug" } else { "blocknest=info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false),
        )
        .init();
}

fn read_input(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            Ok(buf)
        }
    }
}

fn format_output(html: &str, report: &PageReport, json_output: bool) -> Result<String> {
    if json_output {
        let out = JsonOutput { report, html };
        Ok(serde_json::to_string_pretty(&out)?)
    } else {
        Ok(html.to_string())
    }
}

async fn run(args: &Args) -> Result<PageReport> {
    let input = read_input(args.input.as_ref())?;

    let decorator = Decorator::builder()
        .settle_timeout(Duration::from_millis(args.settle_ms))
        .embed_container_fallback(!args.no_embed_fallback)
        .merge_tab_sections(!args.no_merge_tabs)
        .build();

    let (html, report) = decorator.decorate_html(&input).await;
    let output = format_output(&html, &report, args.json_output)?;

    match &args.output {
        Some(path) => {
            fs::write(path, &output).with_context(|| format!("writing {}", path.display()))?
        }
        None => println!("{}", output),
    }

    Ok(report)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(&args).await {
        Ok(report) => {
            if args.strict && !report.is_clean() {
                ExitCode::from(2)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(1)
        }
    }
}
