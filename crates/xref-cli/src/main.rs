//! # xref CLI
//!
//! Builds a cross-referenced HTML view of a source tree from translation
//! unit dumps produced by a compiler front end.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::field::display;

use xref_config::logging::{init_logging, LogLevel};
use xref_config::{
    log_cli_debug, log_cli_info, log_index_info, log_output_info, Config, ExternalLinkRule,
    PROJECT_CONFIG_FILE,
};
use xref_core::{ExternalRefLinker, Link, Markup, SimpleTemplate, XrefIndex};
use xref_index::{index_units, CursorRecord, DumpIndex};

mod units;

/// xref - cross-reference browser generator
#[derive(Parser)]
#[command(name = "xref")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file (default: ./xref.toml, then the global config)
    #[arg(long, global = true, env = "XREF_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index TU dumps and write the HTML output
    Index {
        /// TU dump files, or directories searched for *.json
        #[arg(value_name = "DUMP", required = true)]
        dumps: Vec<PathBuf>,

        /// Worker threads (default: half the cores, at most 8)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        /// HTML template overriding the configured one
        #[arg(long)]
        template: Option<PathBuf>,
    },

    /// Inspect or create configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Print the global config file path
    Path,
    /// Write a starter ./xref.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(LogLevel::from_verbosity(cli.verbose));

    match cli.command {
        Commands::Index {
            dumps,
            threads,
            template,
        } => {
            let config = Config::load(cli.config.as_deref())?;
            cmd_index(&config, &dumps, threads, template.as_deref())
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show => {
                let config = Config::load(cli.config.as_deref())?;
                print!(
                    "{}",
                    toml::to_string_pretty(&config).context("Failed to serialize config")?
                );
                Ok(())
            }
            ConfigCommands::Path => {
                match Config::global_config_path() {
                    Some(path) => println!("{}", path.display()),
                    None => bail!("No config directory on this platform"),
                }
                Ok(())
            }
            ConfigCommands::Init { force } => cmd_config_init(Path::new(PROJECT_CONFIG_FILE), force),
        },
    }
}

fn cmd_index(
    config: &Config,
    dumps: &[PathBuf],
    threads: Option<usize>,
    template: Option<&Path>,
) -> Result<()> {
    if config.roots.is_empty() {
        bail!("No source roots configured; run `xref config init` and edit xref.toml");
    }
    let units = units::collect_dumps(dumps)?;
    if units.is_empty() {
        bail!("No TU dumps found");
    }

    let template = match template.or(config.output.template.as_deref()) {
        Some(path) => SimpleTemplate::from_file(path)?,
        None => SimpleTemplate::builtin(),
    };

    let path_map = config.path_map();
    for root in path_map.roots() {
        log_cli_debug!(
            "root",
            source = display(root.source.display()),
            output = display(root.output.display())
        );
    }

    let mut index: DumpIndex = XrefIndex::new(path_map, external_linker(config.external.clone()));
    let threads = threads.or(config.index.threads);
    log_index_info!("indexing", units = units.len(), threads = threads);

    let stats = index_units(&index, &units, threads).context("Indexing failed")?;
    log_index_info!(
        "indexed",
        ok = stats.units_ok,
        failed = stats.units_failed,
        files = stats.files_claimed,
        definitions = stats.definitions
    );

    let output = index.write_output(&template)?;
    log_output_info!(
        "output written",
        written = output.files_written,
        skipped = output.files_skipped
    );

    println!(
        "Indexed {} TUs ({} failed), wrote {} files",
        stats.units_ok, stats.units_failed, output.files_written
    );
    Ok(())
}

/// Link references to entities outside every source root through the
/// configured `[[external]]` rules; the first matching rule wins.
fn external_linker(rules: Vec<ExternalLinkRule>) -> ExternalRefLinker<CursorRecord> {
    Box::new(move |markup: &mut Markup, cursor: &CursorRecord| {
        let usr = cursor
            .referenced
            .as_ref()
            .and_then(|r| r.usr.as_deref())
            .or(cursor.usr.as_deref());
        let Some(usr) = usr else { return };
        if let Some(url) = rules.iter().find_map(|r| r.link_for(usr, &cursor.spelling)) {
            markup.link = Link::External(url);
        }
    })
}

fn cmd_config_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    fs::write(path, Config::default_toml())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    log_cli_info!("config written", path = display(path.display()));
    println!("Wrote {}", path.display());
    Ok(())
}
