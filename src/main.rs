use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use clap_complete::{generate, Shell};
use colored::*;
use spellguard::cli::output::{self, OutputFormat};
use spellguard::config::Overrides;
use spellguard::engine::{self, EngineKind};
use spellguard::{cli, dict, export, Config, Pipeline};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "spellguard")]
#[command(version, about = "Spellcheck every Word document in a folder", long_about = None)]
struct Cli {
    /// Folder to scan (recursively)
    #[arg(value_name = "FOLDER")]
    folder: Option<PathBuf>,

    /// Export results to an .xlsx file
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Spelling engine
    #[arg(short, long, value_enum)]
    engine: Option<EngineKind>,

    /// Language/dictionary to use (e.g., en_US, en_GB)
    #[arg(short, long)]
    language: Option<String>,

    /// Word list for the native engine (FST built by `dict download`)
    #[arg(long)]
    dictionary: Option<PathBuf>,

    /// Personal dictionary file
    #[arg(long)]
    personal_dict: Option<PathBuf>,

    /// Pattern to ignore (regex)
    #[arg(long)]
    ignore_pattern: Vec<String>,

    /// Maximum suggestions per misspelling
    #[arg(long)]
    max_suggestions: Option<usize>,

    /// Hunspell executable
    #[arg(long, value_name = "PATH")]
    hunspell: Option<PathBuf>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,

    /// Exit with code 0 even if errors are found
    #[arg(long)]
    no_fail: bool,

    /// Log debug diagnostics to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Generate shell completion script
    #[arg(long, value_name = "SHELL")]
    completion: Option<Shell>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Dictionary management
    Dict {
        #[command(subcommand)]
        action: DictCommands,
    },
}

#[derive(Parser, Debug)]
enum DictCommands {
    /// List installed dictionaries
    List,
    /// Download a dictionary
    Download {
        /// Language code (e.g., en_US, en_GB)
        language: String,
        /// URL or local file with one word per line
        #[arg(long)]
        from: Option<String>,
    },
    /// Update all dictionaries
    Update,
    /// Show dictionary info
    Info {
        /// Language code
        language: String,
        /// Inspect this file instead of the installed one
        #[arg(long)]
        dictionary: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(shell) = cli.completion {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "spellguard", &mut io::stdout());
        return Ok(());
    }

    if cli.no_color {
        colored::control::set_override(false);
    }

    if let Some(command) = cli.command {
        return handle_command(command);
    }

    cli::init_logging(cli.verbose);

    let config = Config::load(Overrides {
        engine: cli.engine,
        language: cli.language,
        dictionary: cli.dictionary,
        personal_dictionary: cli.personal_dict,
        ignore_patterns: cli.ignore_pattern,
        max_suggestions: cli.max_suggestions,
        hunspell_command: cli.hunspell,
    })?;
    config.validate()?;

    let Some(folder) = cli.folder else {
        anyhow::bail!("No folder specified. Use --help for usage information.");
    };

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        ctrlc::set_handler(move || cancel.store(true, Ordering::Relaxed))
            .context("Failed to install Ctrl-C handler")?;
    }

    let mut service = engine::create(&config);
    let pb = output::progress_bar(!cli.no_progress);

    let report = {
        let mut pipeline =
            Pipeline::new(service.as_mut(), &config.extensions).with_cancel(Arc::clone(&cancel));
        let result = pipeline.run(&folder, |progress| {
            pb.set_length(progress.total as u64);
            pb.set_position(progress.current as u64);
            if let Some(name) = progress.file.file_name() {
                pb.set_message(name.to_string_lossy().into_owned());
            }
        });
        pb.finish_and_clear();
        result?
    };

    let colored_output = !cli.no_color;
    output::print_results(&report, colored_output, cli.format)?;
    if cli.format == OutputFormat::Text {
        output::print_summary(&report, colored_output);
    }

    let export_path = match cli.output {
        Some(path) => Some(path),
        None if !report.records.is_empty() && console::user_attended() => {
            output::prompt_export_path()
        }
        None => None,
    };
    if let Some(path) = export_path {
        let written = export::write_xlsx(&path, &report.records)?;
        if cli.format == OutputFormat::Text {
            println!(
                "{} Results saved to {}",
                "✓".green().bold(),
                written.display().to_string().cyan()
            );
        }
    }

    if !report.records.is_empty() && !cli.no_fail {
        std::process::exit(1);
    }

    Ok(())
}

fn handle_command(command: Commands) -> Result<()> {
    match command {
        Commands::Dict { action } => match action {
            DictCommands::List => {
                dict::manager::list_dictionaries()?;
            }
            DictCommands::Download { language, from } => {
                dict::manager::download_dictionary(&language, from.as_deref())?;
            }
            DictCommands::Update => {
                dict::manager::update_dictionaries()?;
            }
            DictCommands::Info {
                language,
                dictionary,
            } => {
                dict::manager::show_info(&language, dictionary.as_deref())?;
            }
        },
    }
    Ok(())
}
