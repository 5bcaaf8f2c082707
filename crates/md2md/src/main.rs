//! md2md CLI - Markdown-to-Markdown filter for lecture slides.
//!
//! Filters each `<name>.md` into `<name>-filtered.md` in the current
//! directory, removing notes, answers or code and processing images as
//! requested.

mod commands;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use commands::FilterArgs;
use output::Output;

/// md2md - Markdown-to-Markdown filter for lecture slides.
#[derive(Parser)]
#[command(name = "md2md", version, about)]
struct Cli {
    #[command(flatten)]
    args: FilterArgs,
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables DEBUG for md2md crates, otherwise use RUST_LOG or default to ERROR
    let filter = if cli.args.verbose() {
        EnvFilter::new("md2md=debug,md2md_filter=debug,md2md_config=debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = cli.args.execute(&output) {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
