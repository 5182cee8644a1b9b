use clap::{Args, Parser, Subcommand};
use kartoteka::api::DbApi;
use kartoteka::cli::{self, Command, OutputMode};
use kartoteka::config::{AppConfig, ConfigLayer};
use kartoteka::form::{CollectionBackend, Form};
use kartoteka::record::{KEY_COLUMN, Record};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "kartoteka", version, about = "Record form over an embedded document store", long_about = None)]
struct Cli {
    #[arg(long, help = "Path to a config file (TOML)")]
    config: Option<PathBuf>,
    #[arg(long, help = "Store URI: mem:// or file:///path/to/dir")]
    uri: Option<String>,
    #[arg(long, help = "Database name (file stem for file:// stores)")]
    database: Option<String>,
    #[arg(long, help = "Collection holding the records")]
    collection: Option<String>,
    #[arg(long, help = "Directory for app.log and audit.log")]
    log_dir: Option<PathBuf>,
    #[arg(long, help = "error|warn|info|debug|trace")]
    log_level: Option<String>,
    #[arg(long, default_value = "human", help = "Output for subcommands: human|plain|json")]
    format: OutputMode,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Debug)]
struct RecordArgs {
    id: String,
    nazwa: String,
    opis: String,
    kategoria: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Open the interactive form (default)")]
    Tui,
    #[command(about = "Insert a record")]
    Add(RecordArgs),
    #[command(about = "Find records by id, by JSON filter, or all")]
    Find {
        #[arg(long, conflicts_with = "filter")]
        id: Option<String>,
        #[arg(long, help = "JSON filter, e.g. '{\"kategoria\":\"a\"}'")]
        filter: Option<String>,
        #[arg(long, help = "JSON projection, e.g. '{\"nazwa\":1}'")]
        project: Option<String>,
        #[arg(long, help = "Return at most one record")]
        one: bool,
    },
    #[command(about = "Delete by id or JSON filter")]
    Delete {
        #[arg(long, conflicts_with = "filter", required_unless_present = "filter")]
        id: Option<String>,
        #[arg(long)]
        filter: Option<String>,
        #[arg(long, help = "Delete every match instead of the first")]
        many: bool,
    },
    #[command(about = "Update the record with the given id")]
    Update {
        id: String,
        #[arg(long)]
        nazwa: Option<String>,
        #[arg(long)]
        opis: Option<String>,
        #[arg(long)]
        kategoria: Option<String>,
        #[arg(long = "json", conflicts_with_all = ["nazwa", "opis", "kategoria"], help = "Raw update document")]
        update_json: Option<String>,
        #[arg(long, help = "Insert when no record matches")]
        upsert: bool,
    },
    #[command(about = "Print the last N records")]
    List {
        #[arg(long)]
        last: Option<usize>,
    },
    #[command(about = "List collections")]
    Collections,
}

impl Commands {
    fn into_command(self) -> Option<Command> {
        Some(match self {
            Self::Tui => return None,
            Self::Add(r) => Command::Add { record: Record::new(r.id, r.nazwa, r.opis, r.kategoria) },
            Self::Find { id, filter, project, one } => {
                Command::Find { id, filter_json: filter, projection_json: project, one }
            }
            Self::Delete { id, filter, many } => Command::Delete { id, filter_json: filter, many },
            Self::Update { id, nazwa, opis, kategoria, update_json, upsert } => {
                Command::Update { id, nazwa, opis, kategoria, update_json, upsert }
            }
            Self::List { last } => Command::List { last },
            Self::Collections => Command::Collections,
        })
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let overrides = ConfigLayer {
        uri: cli.uri,
        database: cli.database,
        collection: cli.collection,
        log_dir: cli.log_dir,
        log_level: cli.log_level,
        log_retention: None,
    };
    let cfg = match AppConfig::load(overrides, cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = kartoteka::logger::configure_logging(cfg.log_dir.as_deref(), cfg.log_level.as_deref(), cfg.log_retention) {
        eprintln!("warning: logging disabled: {e}");
    }

    let api = match DbApi::open(cfg.uri.as_str(), cfg.database.as_str()) {
        Ok(api) => Arc::new(api),
        Err(e) => {
            eprintln!("Nie udało się połączyć z bazą danych ({}): {e}", cfg.uri);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = api.ensure_unique(&cfg.collection, KEY_COLUMN) {
        eprintln!("warning: cannot enforce unique '{KEY_COLUMN}' on {}: {e}", cfg.collection);
    }

    let result: Result<(), Box<dyn std::error::Error>> =
        match cli.command.and_then(Commands::into_command) {
            Some(cmd) => {
                let mut stdout = std::io::stdout().lock();
                cli::run(&api, &cfg.collection, cmd, cli.format, &mut stdout)
            }
            None => {
                let title = format!("{} {}/{}", cfg.uri, cfg.database, cfg.collection);
                let form = Form::new(CollectionBackend::new(Arc::clone(&api), cfg.collection.as_str()));
                kartoteka::tui::run(form, &title).map_err(Into::into)
            }
        };

    let closed: Result<(), Box<dyn std::error::Error>> = api.disconnect().map_err(Into::into);
    match result.and(closed) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
