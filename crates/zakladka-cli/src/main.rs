use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use zakladka_core::{
    AnnotationStore, Fragment, HighlightKind, HttpRemote, LocalCache, RemoteAnnotations,
    ReportedSelection, ReviewSession, StoreConfig, Toggle, load_transcript,
};

/// CLI wrapper for HighlightKind (needed for clap ValueEnum)
#[derive(Clone, Copy, Default, ValueEnum)]
enum CliKind {
    #[default]
    Transcript,
    Outline,
}

impl From<CliKind> for HighlightKind {
    fn from(cli: CliKind) -> Self {
        match cli {
            CliKind::Transcript => HighlightKind::Transcript,
            CliKind::Outline => HighlightKind::Outline,
        }
    }
}

#[derive(Parser)]
#[command(name = "zakladka")]
#[command(about = "Review transcripts: toggle highlights, derive outlines, and sync annotations")]
struct Cli {
    /// Transcript text file
    #[arg(short, long)]
    transcript: Option<PathBuf>,

    /// Resource identifier in the remote annotation store
    #[arg(short, long)]
    resource: Option<String>,

    /// Acting user id (required for remote pushes)
    #[arg(short, long)]
    user: Option<String>,

    /// Annotation API base URL (defaults to ZAKLADKA_API_URL; without
    /// either, the store runs cache-only)
    #[arg(long)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the transcript with highlighted runs
    Show,
    /// Print the synthesized outline with projected highlights
    Outline,
    /// Toggle a highlight by character offsets
    Toggle {
        #[arg(short, long, value_enum, default_value = "transcript")]
        kind: CliKind,
        #[arg(long)]
        start: usize,
        #[arg(long)]
        end: usize,
    },
    /// Toggle a highlight from a reported selection
    Select {
        #[arg(short, long, value_enum, default_value = "transcript")]
        kind: CliKind,
        /// Rendered characters before the selection start
        #[arg(long)]
        prefix: usize,
        /// The selected text
        text: String,
    },
    /// Dump both highlight sets as JSON
    Highlights,
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn print_fragments(fragments: &[Fragment]) {
    for fragment in fragments {
        if fragment.is_highlighted() {
            print!("{}", style(&fragment.text).black().on_yellow());
        } else {
            print!("{}", fragment.text);
        }
    }
}

fn report_toggle(outcome: Option<Toggle>) {
    match outcome {
        Some(Toggle::Added(id)) => println!(
            "{} Highlighted {}",
            style("✓").green().bold(),
            style(id).dim()
        ),
        Some(Toggle::Removed(id)) => println!(
            "{} Removed overlapping highlight {}",
            style("✓").green().bold(),
            style(id).dim()
        ),
        None => println!("{} Nothing to toggle", style("✗").red().bold()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let transcript = match &cli.transcript {
        Some(path) => Some(load_transcript(path).await?),
        None => None,
    };

    let remote = match cli.api_url.clone() {
        Some(url) => Some(HttpRemote::new(url)?),
        None => HttpRemote::from_env()?,
    }
    .map(|r| Arc::new(r) as Arc<dyn RemoteAnnotations>);

    let resource_key = cli
        .resource
        .clone()
        .or_else(|| cli.transcript.as_ref().map(|p| p.display().to_string()))
        .unwrap_or_else(|| "untitled".to_string());

    let store = AnnotationStore::new(
        StoreConfig {
            resource_key,
            resource_id: cli.resource.clone(),
            acting_user_id: cli.user.clone(),
        },
        LocalCache::in_default_root(),
        remote,
    );
    let mut session = ReviewSession::new(transcript, store);

    let spinner = create_spinner("Loading annotations...");
    session.load().await;
    spinner.finish_and_clear();

    match cli.command {
        Command::Show => {
            let fragments = session.transcript_fragments();
            if fragments.is_empty() {
                println!("{}", style("No transcript available").dim());
                return Ok(());
            }
            print_fragments(&fragments);
            println!();
        }
        Command::Outline => {
            let rendered = session.outline_render();
            if rendered.is_empty() {
                println!("{}", style("No outline could be derived").dim());
                return Ok(());
            }
            for section in rendered {
                print_fragments(&section.heading);
                println!();
                for bullet in section.bullets {
                    print!("  • ");
                    print_fragments(&bullet);
                    println!();
                }
                println!();
            }
        }
        Command::Toggle { kind, start, end } => {
            let outcome = session.store().toggle(kind.into(), start, end);
            report_toggle(outcome);
            session.store().flush().await;
        }
        Command::Select { kind, prefix, text } => {
            let selection = ReportedSelection::new(prefix, text);
            let outcome = session.select(kind.into(), &selection);
            if outcome.is_none() {
                println!(
                    "{} Selection could not be matched to the text",
                    style("✗").red().bold()
                );
            } else {
                report_toggle(outcome);
            }
            session.store().flush().await;
        }
        Command::Highlights => {
            let dump = serde_json::json!({
                "transcript": session.store().highlights(HighlightKind::Transcript),
                "outline": session.store().highlights(HighlightKind::Outline),
            });
            println!("{}", serde_json::to_string_pretty(&dump)?);
        }
    }

    Ok(())
}
