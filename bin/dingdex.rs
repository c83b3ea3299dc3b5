use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use dingdex::{
    check_for_ding_format, install_from_path, is_installed, remove_install, render,
    DingFormatCheck, EngineConfig, InstallOutcome, InstallState, Lookup,
};

#[derive(Parser)]
#[command(name = "dingdex")]
#[command(about = "German-English DING dictionary lookup", long_about = None)]
struct Args {
    /// Directory holding the installed dictionary data and index
    #[arg(long, env = "DINGDEX_ROOT", default_value = "./dingdex-data")]
    root_dir: PathBuf,

    /// Trace the prefix bag flushed for every indexed line
    #[arg(long)]
    trace_prefixes: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check whether a file looks like DING data
    Check { file: PathBuf },
    /// Copy and index a DING dictionary file
    Install { file: PathBuf },
    /// Remove the installed dictionary
    Remove,
    /// Look up dictionary entries for the given words
    Query {
        /// Maximum number of entries to print
        #[arg(long, env = "DINGDEX_MAX_RESULTS", default_value = "16")]
        max_results: usize,
        words: Vec<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    let config = EngineConfig::default().with_prefix_logging(args.trace_prefixes);

    match args.command {
        Command::Check { file } => {
            let verdict = check_for_ding_format(&file);
            info!("{}: {}", file.display(), verdict.describe());
            if verdict != DingFormatCheck::Ok {
                std::process::exit(1);
            }
        }

        Command::Install { file } => {
            let verdict = check_for_ding_format(&file);
            if verdict != DingFormatCheck::Ok {
                bail!("{}: {}", file.display(), verdict.describe());
            }

            let mut last_percent = -1;
            let outcome = install_from_path(
                &args.root_dir,
                &file,
                &config,
                &mut |state, progress| {
                    let percent = (progress * 100.0) as i32;
                    if state != InstallState::Indexing || percent != last_percent {
                        info!("{:>9} {:>3}%", state.as_str(), percent);
                        last_percent = percent;
                    }
                },
                &|| false,
            )?;
            if outcome == InstallOutcome::Installed {
                info!("installed under {}", args.root_dir.display());
            }
        }

        Command::Remove => {
            if !is_installed(&args.root_dir) {
                info!("nothing installed under {}", args.root_dir.display());
                return Ok(());
            }
            remove_install(&args.root_dir)?;
            info!("removed dictionary under {}", args.root_dir.display());
        }

        Command::Query { max_results, words } => {
            if words.is_empty() {
                bail!("no query words given");
            }
            let mut lookup = Lookup::open(&args.root_dir, config)?;
            let results = lookup.search(&words.join(" "), max_results)?;
            if results.is_empty() {
                info!("no matching entries");
                return Ok(());
            }

            let utf8_terminal = render::is_utf8_locale();
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            for result in results {
                render::write_text(&mut out, result.entry.german(), utf8_terminal)?;
                out.write_all(b" :: ")?;
                render::write_text(&mut out, result.entry.english(), utf8_terminal)?;
                out.write_all(b"\n")?;
            }
        }
    }

    Ok(())
}
