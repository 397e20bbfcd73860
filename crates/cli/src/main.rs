use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::ArgAction;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use sortplan_core::{
    build_plan, execute_plan, identify_duplicates, preview_tree, scan_directory, undo_actions,
    Criterion, FileRecord, MediaCapabilities, MetadataProvider, NamingOptions,
    NullMetadataProvider, OperationKind, OrganizationConfig, ScanDepth, ScanOptions, UndoAction,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "sortplan",
    version,
    about = "Plan, execute, and undo rule-based file organization."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scan a directory and emit a JSON file report.
    Scan(ScanArgs),
    /// Scan a directory and flag duplicate files by content.
    Duplicates(ScanArgs),
    /// Print the planned folder tree without touching any file.
    Preview(OrganizeArgs),
    /// Execute the organization plan and write an undo log.
    Organize(OrganizeArgs),
    /// Replay an undo log, restoring the pre-organization state.
    Undo(UndoArgs),
}

#[derive(Debug, Copy, Clone, ValueEnum)]
enum CliOperation {
    Move,
    Copy,
}

impl From<CliOperation> for OperationKind {
    fn from(value: CliOperation) -> Self {
        match value {
            CliOperation::Move => OperationKind::Move,
            CliOperation::Copy => OperationKind::Copy,
        }
    }
}

#[derive(Debug, Args)]
struct ScanArgs {
    /// Directory to scan.
    path: PathBuf,

    /// Scan depth below the root; -1 means unlimited, 0 means top level only.
    #[arg(long, default_value_t = 0, value_name = "LEVELS", allow_hyphen_values = true)]
    depth: i64,

    /// Exclude glob patterns (repeatable).
    #[arg(long = "exclude", value_name = "GLOB", num_args = 1.., action = ArgAction::Append)]
    exclude: Vec<String>,

    /// Optional JSON report output file; stdout if omitted.
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct OrganizeArgs {
    /// Directory holding the files to organize.
    source: PathBuf,

    /// Directory the organized tree is built under.
    target: PathBuf,

    /// Primary grouping criterion (e.g. type, extension, size,
    /// date_modified_yyyy, duplicates).
    #[arg(long, default_value = "type")]
    primary: String,

    /// Optional secondary criterion nested inside each primary folder.
    #[arg(long)]
    secondary: Option<String>,

    /// Move or copy the files.
    #[arg(long, value_enum, default_value_t = CliOperation::Move)]
    operation: CliOperation,

    /// Scan depth below the source; -1 means unlimited.
    #[arg(long, default_value_t = 0, value_name = "LEVELS", allow_hyphen_values = true)]
    depth: i64,

    /// Exclude glob patterns (repeatable).
    #[arg(long = "exclude", value_name = "GLOB", num_args = 1.., action = ArgAction::Append)]
    exclude: Vec<String>,

    /// Static text placed before every folder name.
    #[arg(long, default_value = "")]
    folder_prefix: String,

    /// Static text placed after every folder name.
    #[arg(long, default_value = "")]
    folder_suffix: String,

    /// Static text joined before every filename stem.
    #[arg(long, default_value = "")]
    filename_prefix: String,

    /// Static text joined after every filename stem.
    #[arg(long, default_value = "")]
    filename_suffix: String,

    /// Number folders and files with an incremental prefix.
    #[arg(long)]
    incremental_prefix: bool,

    /// Number folders and files with an incremental suffix.
    #[arg(long)]
    incremental_suffix: bool,

    /// Window size for the files_per_folder criterion.
    #[arg(long, default_value_t = 100)]
    files_per_folder: usize,

    /// Character count for the first_n_chars criterion.
    #[arg(long, default_value_t = 3)]
    first_n_chars: usize,

    /// Remove source folders left empty after a move.
    #[arg(long)]
    delete_empty_folders: bool,

    /// Undo log output file (organize only).
    #[arg(long, default_value = "sortplan-undo.json", value_name = "FILE")]
    undo_log: PathBuf,
}

#[derive(Debug, Args)]
struct UndoArgs {
    /// Undo log written by a previous organize run.
    #[arg(long, default_value = "sortplan-undo.json", value_name = "FILE")]
    undo_log: PathBuf,

    /// Target directory of that organize run.
    target: PathBuf,
}

#[derive(Debug, Serialize)]
struct ScanReport {
    root: PathBuf,
    file_count: usize,
    files: Vec<FileRecord>,
    capabilities: MediaCapabilities,
    warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
struct DuplicateReport {
    root: PathBuf,
    duplicate_count: u64,
    files: Vec<FileRecord>,
    warnings: Vec<String>,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan(args) => run_scan_command(args),
        Commands::Duplicates(args) => run_duplicates_command(args),
        Commands::Preview(args) => run_preview_command(args),
        Commands::Organize(args) => run_organize_command(args),
        Commands::Undo(args) => run_undo_command(args),
    }
}

fn run_scan_command(args: ScanArgs) -> Result<()> {
    let provider = NullMetadataProvider;
    tracing::info!("media capabilities: {}", provider.capabilities().summary());
    let options = ScanOptions {
        root: args.path.clone(),
        depth: ScanDepth::from_flag(args.depth),
        excludes: args.exclude,
    };
    let output = scan_directory(&options, &provider)?;

    let report = ScanReport {
        root: args.path,
        file_count: output.files.len(),
        files: output.files,
        capabilities: provider.capabilities(),
        warnings: output.warnings,
    };
    emit_json(&report, args.output.as_deref())
}

fn run_duplicates_command(args: ScanArgs) -> Result<()> {
    let options = ScanOptions {
        root: args.path.clone(),
        depth: ScanDepth::from_flag(args.depth),
        excludes: args.exclude,
    };
    let mut output = scan_directory(&options, &NullMetadataProvider)?;
    let duplicate_count = identify_duplicates(&mut output.files, &mut output.warnings);

    let report = DuplicateReport {
        root: args.path,
        duplicate_count,
        files: output.files,
        warnings: output.warnings,
    };
    emit_json(&report, args.output.as_deref())
}

fn run_preview_command(args: OrganizeArgs) -> Result<()> {
    let config = build_config(&args)?;
    let tree = preview_tree(&build_plan(&config));
    let payload = serde_json::to_string_pretty(&tree).context("failed to serialize preview")?;
    println!("{payload}");
    Ok(())
}

fn run_organize_command(args: OrganizeArgs) -> Result<()> {
    let undo_path = args.undo_log.clone();
    let config = build_config(&args)?;
    let outcome = execute_plan(&config)?;

    for line in &outcome.log {
        println!("{line}");
    }

    let payload =
        serde_json::to_string_pretty(&outcome.undo_log).context("failed to serialize undo log")?;
    fs::write(&undo_path, payload)
        .with_context(|| format!("failed to write undo log to {}", undo_path.display()))?;
    println!("Undo log written to {}", undo_path.display());
    Ok(())
}

fn run_undo_command(args: UndoArgs) -> Result<()> {
    let data = fs::read_to_string(&args.undo_log)
        .with_context(|| format!("failed to read {}", args.undo_log.display()))?;
    let actions: Vec<UndoAction> = serde_json::from_str(&data)
        .with_context(|| format!("failed to parse {}", args.undo_log.display()))?;

    let outcome = undo_actions(&actions, &args.target);
    for line in &outcome.log {
        println!("{line}");
    }
    Ok(())
}

/// Scans the source and assembles the full organize config. Duplicate
/// detection runs up front when either criterion groups by duplicates.
fn build_config(args: &OrganizeArgs) -> Result<OrganizationConfig> {
    let options = ScanOptions {
        root: args.source.clone(),
        depth: ScanDepth::from_flag(args.depth),
        excludes: args.exclude.clone(),
    };
    let mut scanned = scan_directory(&options, &NullMetadataProvider)?;

    let primary = Criterion::from(args.primary.clone());
    let secondary = args
        .secondary
        .as_deref()
        .filter(|value| !value.eq_ignore_ascii_case("none"))
        .map(|value| Criterion::from(value.to_string()));

    if primary == Criterion::Duplicates || secondary == Some(Criterion::Duplicates) {
        identify_duplicates(&mut scanned.files, &mut scanned.warnings);
    }
    for warning in &scanned.warnings {
        eprintln!("warning: {warning}");
    }

    Ok(OrganizationConfig {
        source_directory: args.source.clone(),
        target_directory: args.target.clone(),
        operation: args.operation.into(),
        primary,
        secondary,
        options: NamingOptions {
            folder_prefix: args.folder_prefix.clone(),
            folder_suffix: args.folder_suffix.clone(),
            filename_prefix: args.filename_prefix.clone(),
            filename_suffix: args.filename_suffix.clone(),
            incremental_prefix: args.incremental_prefix,
            incremental_suffix: args.incremental_suffix,
            files_per_folder: args.files_per_folder,
            first_n_chars: args.first_n_chars,
        },
        delete_empty_folders: args.delete_empty_folders,
        files: scanned.files,
    })
}

fn emit_json<T: Serialize>(value: &T, output: Option<&std::path::Path>) -> Result<()> {
    let payload = serde_json::to_string_pretty(value).context("failed to serialize report")?;
    match output {
        Some(path) => {
            fs::write(path, payload)
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            println!("Report written to {}", path.display());
        }
        None => println!("{payload}"),
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
