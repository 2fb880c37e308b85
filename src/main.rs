use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use charla::core::config::{self, ResolvedConfig};
use charla::core::identity::{FileIdentityStore, IdentityStore, Session};
use clap::{Parser, Subcommand};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

#[derive(Parser)]
#[command(name = "charla", about = "Terminal client for a chatbot conversation service")]
struct Args {
    /// Base URL of the chatbot service
    #[arg(short, long)]
    base_url: Option<String>,

    /// Config file to use instead of ~/.charla/config.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Subcommand)]
enum Cmd {
    /// Open the interactive session (default)
    Run,
    /// Store the identity records the session is resolved from
    Identify {
        #[arg(long)]
        username: String,
        #[arg(long, default_value = "")]
        person_id: String,
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        paternal_surname: String,
        #[arg(long, default_value = "")]
        maternal_surname: String,
    },
    /// Show the stored identity
    Whoami,
    /// Forget the stored identity
    Logout,
}

fn identity_store(config: &ResolvedConfig) -> io::Result<FileIdentityStore> {
    let dir = match &config.identity_dir {
        Some(dir) => dir.clone(),
        None => FileIdentityStore::default_dir()?,
    };
    Ok(FileIdentityStore::new(dir))
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Initialize file logger - writes to charla.log in current directory
    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .build();

    if let Ok(log_file) = File::create("charla.log") {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }

    let file_config = config::load_config(args.config.as_deref())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let resolved = config::resolve(&file_config, args.base_url.as_deref());
    log::info!("Charla starting up against {}", resolved.base_url);

    let store = identity_store(&resolved)?;

    match args.command.unwrap_or(Cmd::Run) {
        Cmd::Run => charla::cli::run(resolved, Arc::new(store)).await,
        Cmd::Identify {
            username,
            person_id,
            first_name,
            paternal_surname,
            maternal_surname,
        } => {
            let session = Session {
                person_id,
                first_name,
                paternal_surname,
                maternal_surname,
                username,
            };
            session.store(&store)?;
            println!("Identity stored in {}", store.dir().display());
            Ok(())
        }
        Cmd::Whoami => match Session::load(&store) {
            Ok(session) => {
                println!("{} ({})", session.display_name(), session.username);
                Ok(())
            }
            Err(e) => {
                eprintln!("{e}");
                Err(io::Error::new(io::ErrorKind::NotFound, e))
            }
        },
        Cmd::Logout => {
            store.clear()?;
            println!("Identity cleared");
            Ok(())
        }
    }
}
