//! Slicer - Carve converted documents into clean, titled sections

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use slicer_core::{selection, Config, Disposition, Document, Side, SliceChoices, SlicePlan, TokenSelection};
use std::fs;
use std::path::{Path, PathBuf};

/// Edit the section layout of a segmented document
#[derive(Parser, Debug)]
#[command(name = "slicer")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Section state file (defaults to the configured file name)
    #[arg(long, short, value_name = "FILE", global = true)]
    state: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Segment a markdown file and write a fresh state file
    Init {
        #[arg(value_name = "MARKDOWN")]
        markdown: PathBuf,
        /// Deepest heading level that opens a section
        #[arg(long)]
        level: Option<usize>,
    },
    /// List sections
    List {
        /// Include discarded sections
        #[arg(long)]
        all: bool,
    },
    /// Print a section with its selection window
    Show { id: usize },
    /// Mark a section discarded
    Discard { id: usize },
    /// Join two adjacent sections
    Join {
        first: usize,
        second: usize,
        #[arg(long)]
        title: String,
    },
    /// Split a section at a global token index
    Split {
        id: usize,
        /// Token index that starts the second half (defaults to a suggestion)
        at: Option<usize>,
        #[arg(long)]
        first_title: Option<String>,
        #[arg(long)]
        second_title: Option<String>,
    },
    /// Re-cut a section to a global token range
    Slice {
        id: usize,
        start: usize,
        end: usize,
        /// Title for the selected range
        #[arg(long)]
        title: Option<String>,
        /// What to do with the leftover before the range: append, new, discard.
        /// Defaults to `[slicing] leading` from the config where allowed
        #[arg(long)]
        leading: Option<Disposition>,
        #[arg(long)]
        leading_title: Option<String>,
        /// What to do with the leftover after the range: append, new, discard.
        /// Defaults to `[slicing] trailing` from the config where allowed
        #[arg(long)]
        trailing: Option<Disposition>,
        #[arg(long)]
        trailing_title: Option<String>,
        /// Print the plan without committing it
        #[arg(long)]
        dry_run: bool,
    },
    /// Write active sections as JSON
    Export {
        /// Output file (stdout if omitted)
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;
    let state_path = args
        .state
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.state.file_name));

    run(args.command, &config, &state_path)
}

fn run(command: Command, config: &Config, state_path: &Path) -> Result<()> {
    match command {
        Command::Init { markdown, level } => {
            let content = fs::read_to_string(&markdown)
                .with_context(|| format!("Failed to read markdown: {}", markdown.display()))?;
            let level = level.unwrap_or(config.segment.heading_level);

            let doc = Document::from_markdown(&content, level);
            doc.save_state(state_path, config.state.pretty)?;
            info!("initialised {} from {}", state_path.display(), markdown.display());
            print_sections(&doc, false);
        }
        Command::List { all } => {
            let doc = open(state_path)?;
            print_sections(&doc, all);
        }
        Command::Show { id } => {
            let doc = open(state_path)?;
            let section = doc.section(id)?;
            let (lower, upper) = selection::window(section.spans, config.slicing.window, doc.token_count());

            println!("{section}");
            println!("selectable range: {lower}..={upper}");
            if let Some(at) = section.suggested_break(&TokenSelection::of_span(section.spans)) {
                println!("suggested split: {at}");
            }
            println!();
            println!("{}", section.text());
        }
        Command::Discard { id } => {
            edit(state_path, config, |doc| Ok(doc.discard(id)?))?;
        }
        Command::Join { first, second, title } => {
            edit(state_path, config, |doc| Ok(doc.join(first, second, title)?))?;
        }
        Command::Split {
            id,
            at,
            first_title,
            second_title,
        } => {
            edit(state_path, config, |doc| {
                let section = doc.section(id)?;
                let at = match at {
                    Some(at) => at,
                    None => section
                        .suggested_break(&TokenSelection::of_span(section.spans))
                        .with_context(|| format!("No split point to suggest for section {id}"))?,
                };
                let first_title = first_title.or_else(|| section.title.clone());
                Ok(doc.split(id, at, first_title, second_title)?)
            })?;
        }
        Command::Slice {
            id,
            start,
            end,
            title,
            leading,
            leading_title,
            trailing,
            trailing_title,
            dry_run,
        } => {
            let choices = SliceChoices {
                title,
                leading,
                leading_title,
                trailing,
                trailing_title,
            };

            if dry_run {
                let doc = open(state_path)?;
                print_plan(&doc.plan_slice(id, start, end)?);
                return Ok(());
            }

            edit(state_path, config, |doc| {
                let plan = doc.plan_slice(id, start, end)?;
                let choices = config.slicing.fill_defaults(&plan, choices);
                Ok(doc.commit_slice(&plan, choices)?)
            })?;
        }
        Command::Export { out } => {
            let doc = open(state_path)?;
            let json = doc.export_json(config.state.pretty)?;
            match out {
                Some(path) => fs::write(&path, json)
                    .with_context(|| format!("Failed to write export: {}", path.display()))?,
                None => println!("{json}"),
            }
        }
    }

    Ok(())
}

fn open(state_path: &Path) -> Result<Document> {
    Document::open(state_path).with_context(|| {
        format!(
            "Failed to open {} (run `slicer init` first?)",
            state_path.display()
        )
    })
}

/// Load the state, apply one edit, and write it back
fn edit<F>(state_path: &Path, config: &Config, apply: F) -> Result<()>
where
    F: FnOnce(&mut Document) -> Result<()>,
{
    let mut doc = open(state_path)?;
    apply(&mut doc)?;
    doc.save_state(state_path, config.state.pretty)?;
    print_sections(&doc, true);
    Ok(())
}

fn print_sections(doc: &Document, all: bool) {
    for section in doc.sections().iter().filter(|s| all || s.is_active()) {
        println!("{section}");
    }
}

fn print_plan(plan: &SlicePlan) {
    println!("range: {}", plan.range());
    if plan.leading_overflow {
        println!("takes the tail of section {}", plan.position() - 1);
    }
    if plan.trailing_overflow {
        println!("takes the head of section {}", plan.position() + 1);
    }
    for (side, text) in [
        (Side::Leading, plan.leading_fragment_text()),
        (Side::Trailing, plan.trailing_fragment_text()),
    ] {
        if let Some(text) = text {
            let options: Vec<String> = plan.options(side).iter().map(ToString::to_string).collect();
            println!("{side} fragment ({}): {text}", options.join("/"));
        }
    }
    println!();
    println!("{}", plan.selected_text());
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_slice_help_names_config_defaults() {
        let mut cmd = Args::command();
        let slice = cmd
            .find_subcommand_mut("slice")
            .expect("slice subcommand");
        let help = slice.render_long_help().to_string();
        assert!(help.contains("[slicing] leading"));
        assert!(help.contains("[slicing] trailing"));
    }

    #[test]
    fn test_parse_slice_dispositions() {
        let args = Args::try_parse_from(["slicer", "slice", "1", "4", "9", "--trailing", "append"])
            .expect("valid arguments");
        match args.command {
            Command::Slice { leading, trailing, .. } => {
                assert_eq!(leading, None);
                assert_eq!(trailing, Some(Disposition::AppendToAdjacent));
            }
            other => panic!("unexpected command {other:?}"),
        }

        assert!(Args::try_parse_from(["slicer", "slice", "1", "4", "9", "--leading", "keep"]).is_err());
    }
}
