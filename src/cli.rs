use crate::canvas::{Canvas, EventOutcome};
use crate::config::load_config;
use crate::project::{export_project, import_project, read_events, read_project, write_json};
use crate::summary::story_flow;
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "plotweave",
    version,
    about = "Replay canvas events against a plot project"
)]
pub struct Args {
    /// Project file (.json) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Event script: a JSON array of canvas events replayed in order
    #[arg(short = 's', long = "script")]
    pub script: Option<PathBuf>,

    /// Config JSON file (thresholds, node sizes, palette)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Write the story flow summary instead of the project
    #[arg(long = "summary")]
    pub summary: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // A subscriber may already be installed when embedded; that one wins.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn run() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    let project = read_project(args.input.as_deref())?;

    let mut canvas = Canvas::new(config);
    import_project(&mut canvas, project)?;

    if let Some(script) = args.script.as_deref() {
        let events = read_events(script)?;
        let total = events.len();
        let mut ignored = 0usize;
        for event in events {
            if canvas.apply(event) == EventOutcome::Ignored {
                ignored += 1;
            }
        }
        tracing::info!(total, ignored, "replayed event script");
    }

    if args.summary {
        write_json(&story_flow(canvas.graph()), args.output.as_deref())
    } else {
        write_json(&export_project(&canvas), args.output.as_deref())
    }
}
