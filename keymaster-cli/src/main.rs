mod config;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use keymaster_core::{CatalogStore, JsonHistoryStore, SearchController, Shortcut, SqliteCatalog};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "keymaster", version, about = "Keyboard shortcut trainer CLI")]
struct Cli {
    /// Path to the catalog database
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Directory holding the persisted search history
    #[arg(long, global = true)]
    history_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the local database and seed the starter catalog
    InitDb,
    /// List catalogued applications
    Apps {
        #[arg(long)]
        json: bool,
    },
    /// List shortcuts for an application (the first one by default)
    List {
        #[arg(long)]
        app: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Search shortcuts and record the query in the history
    Search {
        query: String,
        #[arg(long)]
        app: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Show suggestions for a partial query
    Suggest { input: String },
    /// Mark a shortcut as learned
    Learn { id: i64 },
    /// Mark a shortcut as not learned
    Unlearn { id: i64 },
    /// Show mastery progress for an application
    Progress {
        #[arg(long)]
        app: Option<String>,
    },
    /// Show recent search queries, most recent first
    History,
}

type Store = CatalogStore<SqliteCatalog>;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = config::load_settings();
    let db = config::db_path(&settings, cli.db);
    let history_dir = config::history_dir(&settings, cli.history_dir);

    match cli.command {
        Commands::InitDb => {
            SqliteCatalog::open(&db)?;
            println!("database initialized at {}", db.display());
        }
        Commands::Apps { json } => {
            let store = open_store(&db).await?;
            let apps = store.applications();
            if json {
                println!("{}", serde_json::to_string_pretty(&apps)?);
            } else {
                for app in apps {
                    println!("{}\t{}", app.id.unwrap_or_default(), app.name);
                }
            }
        }
        Commands::List { app, category, json } => {
            let store = open_store(&db).await?;
            if let Some(name) = app {
                select_app(&store, &name).await?;
            }
            store.select_category(category);
            print_shortcuts(&store.filtered_shortcuts(), json)?;
        }
        Commands::Search { query, app, json } => {
            let store = open_store(&db).await?;
            if let Some(name) = app {
                select_app(&store, &name).await?;
            }
            let mut controller = controller(&settings, &history_dir);
            controller.choose(&query, &store).await;
            check(&store)?;
            print_shortcuts(&store.shortcuts(), json)?;
        }
        Commands::Suggest { input } => {
            let store = open_store(&db).await?;
            let mut controller = controller(&settings, &history_dir);
            controller.input_changed(&input, &store.shortcuts());
            for s in controller.suggestions() {
                match s.count {
                    Some(count) => println!("{}\t{}", s.text, count),
                    None => println!("{}", s.text),
                }
            }
            controller.cancel();
        }
        Commands::Learn { id } => {
            let store = open_store(&db).await?;
            store.toggle_learned(id, false).await;
            check(&store)?;
            println!("learned {id}");
        }
        Commands::Unlearn { id } => {
            let store = open_store(&db).await?;
            store.toggle_learned(id, true).await;
            check(&store)?;
            println!("unlearned {id}");
        }
        Commands::Progress { app } => {
            let store = open_store(&db).await?;
            if let Some(name) = app {
                select_app(&store, &name).await?;
            }
            let p = store.progress();
            println!("{}/{} learned ({:.0}%)", p.learned, p.total, p.percentage);
        }
        Commands::History => {
            let controller = controller(&settings, &history_dir);
            for query in controller.history() {
                println!("{query}");
            }
        }
    }

    Ok(())
}

/// Open the catalog and load the application list; the first application
/// is auto-selected, matching the interactive startup path.
async fn open_store(db: &Path) -> Result<Store> {
    let store = CatalogStore::new(SqliteCatalog::open(db)?);
    store.load_applications().await;
    check(&store)?;
    Ok(store)
}

fn check(store: &Store) -> Result<()> {
    let err = store.error();
    if err.is_empty() {
        Ok(())
    } else {
        bail!(err)
    }
}

async fn select_app(store: &Store, name: &str) -> Result<()> {
    let app = store
        .applications()
        .into_iter()
        .find(|a| a.name == name)
        .ok_or_else(|| anyhow!("no application named {name:?}"))?;
    store.select_application(&app.name, app.id).await;
    check(store)
}

fn controller(settings: &config::Settings, history_dir: &Path) -> SearchController<JsonHistoryStore> {
    let history = JsonHistoryStore::new(history_dir);
    match settings.debounce_ms {
        Some(ms) => SearchController::with_delay(history, Duration::from_millis(ms)),
        None => SearchController::new(history),
    }
}

fn print_shortcuts(shortcuts: &[Shortcut], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(shortcuts)?);
    } else {
        for sc in shortcuts {
            println!(
                "{}\t{}\t{}\t{} ({})",
                sc.id.unwrap_or_default(),
                if sc.learned { "*" } else { " " },
                sc.keys,
                sc.description,
                sc.category
            );
        }
    }
    Ok(())
}
