use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use resume_intake::config::Config;
use resume_intake::intelligence::{FieldExtractor, SkillVocabulary};
use resume_intake::models::FileOutcome;
use resume_intake::ner::RecognizerProvider;
use resume_intake::processing::FileLoader;
use resume_intake::services::{open_workbook, IngestionOrchestrator};
use resume_intake::store::{ColumnKind, StoreOptions, TableView};
use resume_intake::workspace::Workspace;

const MAX_CELL_WIDTH: usize = 40;

#[derive(Parser)]
#[command(name = "resume-intake", version)]
#[command(about = "Extract candidate contact fields from resumes into an Excel workbook")]
struct Args {
    /// Workspace root [default: $INTAKE_WORKSPACE or ~/ResumeIntakeWorkspace]
    #[arg(long, global = true)]
    workspace: Option<PathBuf>,

    /// Workbook for this run only, instead of the configured one
    #[arg(long, global = true)]
    workbook: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process resume files and/or folders into the workbook
    Ingest {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Print the workbook as a table
    List {
        /// Case-insensitive text filter over whole rows
        #[arg(long)]
        search: Option<String>,
        /// Columns to show, comma-separated, in display order
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
    },
    /// Write the visible rows to a CSV file
    Export {
        destination: PathBuf,
        #[arg(long)]
        search: Option<String>,
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
    },
    /// Inspect or change the workbook's columns
    Columns {
        #[command(subcommand)]
        action: ColumnsCommand,
    },
    /// Inspect or change persisted settings
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
    /// Switch the active workbook, creating it if needed
    UseWorkbook { path: PathBuf },
}

#[derive(Subcommand)]
enum ColumnsCommand {
    Show,
    Add {
        name: String,
        /// 1-based position [default: last]
        #[arg(long)]
        at: Option<usize>,
    },
    Remove {
        name: String,
    },
    Rename {
        old: String,
        new: String,
    },
    Move {
        name: String,
        /// 1-based target position
        position: usize,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    Show,
    Set { key: String, value: String },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    let default_filter = if args.verbose {
        "resume_intake=debug"
    } else {
        "resume_intake=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let root = Workspace::resolve_root(args.workspace)?;
    let workspace = Workspace::init(root)?;

    let config_path = workspace.config_path();
    let mut config = Config::load(&config_path)?;
    let runtime = config.clone().with_env_overrides();

    let workbook_path = args
        .workbook
        .unwrap_or_else(|| workspace.workbook_path(&runtime));
    let open_store = || open_workbook(&workspace, &workbook_path, StoreOptions::from(&runtime));

    match args.command {
        Command::Ingest { paths } => {
            let store = open_store()?;
            let skills_path = runtime
                .skills_path
                .as_deref()
                .map(|p| resolve_in(workspace.root(), p));
            let extractor = FieldExtractor::new(
                SkillVocabulary::load(skills_path.as_deref()),
                RecognizerProvider::from_config(&runtime.recognizer).into_boxed(),
            );
            tracing::info!(
                recognizer = extractor.recognizer_name(),
                skills = extractor.vocabulary().len(),
                "Field extractor ready"
            );

            let mut orchestrator =
                IngestionOrchestrator::new(FileLoader::new(), extractor, store, workspace);
            let mut print_outcome =
                |outcome: &FileOutcome| println!("{}: {}", outcome.file, outcome.status);

            let report = orchestrator.run(&paths, &mut print_outcome)?;
            println!("{report}");
            println!("Workbook: {}", orchestrator.store().path().display());
        }
        Command::List { search, columns } => {
            let store = open_store()?;
            let view = store.view(search.as_deref(), selected(&columns))?;
            if view.is_empty() {
                println!("No matching rows in {}", store.path().display());
            } else {
                print_table(&view);
                println!("{} row(s)", view.rows().len());
            }
        }
        Command::Export {
            destination,
            search,
            columns,
        } => {
            let store = open_store()?;
            let view = store.view(search.as_deref(), selected(&columns))?;
            let count = store.export_visible(&view, &destination)?;
            println!("Exported {count} row(s) to {}", destination.display());
        }
        Command::Columns { action } => {
            let mut store = open_store()?;
            match action {
                ColumnsCommand::Show => {}
                ColumnsCommand::Add { name, at } => {
                    store.add_column(&name, at.map(|p| p.saturating_sub(1)))?
                }
                ColumnsCommand::Remove { name } => store.remove_column(&name)?,
                ColumnsCommand::Rename { old, new } => store.rename_column(&old, &new)?,
                ColumnsCommand::Move { name, position } => {
                    store.move_column(&name, position.saturating_sub(1))?
                }
            }
            for (i, column) in store.columns().iter().enumerate() {
                let role = match ColumnKind::from_header(column) {
                    Some(kind) if kind.canonical_name() == column.as_str() => String::new(),
                    Some(kind) => format!("  (filled as {})", kind.canonical_name()),
                    None => "  (user)".to_string(),
                };
                println!("{:>3}. {column}{role}", i + 1);
            }
        }
        Command::Config { action } => match action {
            ConfigCommand::Show => {
                let mut shown = config.clone();
                if let Some(llm) = shown.recognizer.llm.as_mut() {
                    if llm.api_key.is_some() {
                        llm.api_key = Some("********".to_string());
                    }
                }
                println!("{}", serde_json::to_string_pretty(&shown)?);
                println!("# {}", config_path.display());
            }
            ConfigCommand::Set { key, value } => {
                config.set(&key, &value)?;
                config.save(&config_path)?;
                println!("{key} = {value}");
            }
        },
        Command::UseWorkbook { path } => {
            config.active_workbook = Some(path);
            let target = workspace.workbook_path(&config);
            let store = open_workbook(&workspace, &target, StoreOptions::from(&runtime))?;
            config.save(&config_path)?;
            println!(
                "Active workbook: {} ({} row(s))",
                store.path().display(),
                store.len()
            );
        }
    }

    Ok(())
}

fn selected(columns: &[String]) -> Option<&[String]> {
    (!columns.is_empty()).then_some(columns)
}

fn resolve_in(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

fn print_table(view: &TableView) {
    let widths = view.column_widths(MAX_CELL_WIDTH);
    let render = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{:<w$}", clip(cell, w)))
            .collect::<Vec<_>>()
            .join(" | ")
    };

    println!("{}", render(view.columns()));
    println!(
        "{}",
        widths
            .iter()
            .map(|&w| "-".repeat(w))
            .collect::<Vec<_>>()
            .join("-+-")
    );
    for row in view.rows() {
        println!("{}", render(row));
    }
}

fn clip(cell: &str, width: usize) -> String {
    let flat = cell.replace(['\n', '\r'], " ");
    if flat.chars().count() <= width {
        return flat;
    }
    let mut clipped: String = flat.chars().take(width.saturating_sub(3)).collect();
    clipped.push_str("...");
    clipped
}
