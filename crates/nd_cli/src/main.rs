use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use nd_core::{Article, Config, KeyValueStore, PreferenceItem, Result, SearchFilters};
use nd_sources::Aggregator;
use nd_storage::{JsonFileStore, PreferenceStore};
use nd_web::{create_app, AppState};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod duration;
mod output;

use duration::HumanDuration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headlines and search across NewsAPI, The Guardian and The New York Times", long_about = None)]
pub struct Cli {
    /// Where preferences are saved
    #[arg(long, global = true, env = "NEWSDESK_PREFS_FILE", default_value = "newsdesk-preferences.json")]
    prefs_file: PathBuf,
    /// Keep preferences in this SQLite database instead of the JSON file
    #[cfg(feature = "sqlite")]
    #[arg(long, global = true, env = "NEWSDESK_PREFS_DB")]
    prefs_db: Option<PathBuf>,
    /// Per-source request timeout (e.g. 10s, 1m30s)
    #[arg(long, global = true)]
    timeout: Option<HumanDuration>,
    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,
    #[arg(long, global = true, env = "NEWS_API_KEY", hide_env_values = true)]
    news_api_key: Option<String>,
    #[arg(long, global = true, env = "GUARDIAN_API_KEY", hide_env_values = true)]
    guardian_api_key: Option<String>,
    #[arg(long, global = true, env = "NYT_API_KEY", hide_env_values = true)]
    nyt_api_key: Option<String>,
    /// NYT top-stories section used for headlines
    #[arg(long, global = true)]
    nyt_section: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Latest articles from every enabled source
    Headlines {
        #[arg(long)]
        keyword: Option<String>,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Search every enabled source
    Search {
        keyword: String,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// List the known sources
    Sources,
    /// List the known categories
    Categories,
    /// Show or edit saved preferences
    Prefs {
        #[command(subcommand)]
        command: Option<PrefsCommands>,
    },
    /// Serve the JSON API
    Serve {
        #[arg(long, env = "NEWSDESK_ADDR", default_value = "127.0.0.1:3000")]
        addr: SocketAddr,
    },
}

#[derive(Subcommand, Debug)]
enum PrefsCommands {
    Show,
    ToggleSource { id: String },
    ToggleCategory { id: String },
    ToggleAuthor { id: String },
    /// Follow an author. The id defaults to the name.
    AddAuthor {
        name: String,
        #[arg(long)]
        id: Option<String>,
    },
    /// Back to the default sources and categories, no authors
    Reset,
    /// Delete the saved preferences
    Clear,
}

#[derive(Args, Debug, Clone, Default)]
struct FilterArgs {
    /// Comma-separated source ids
    #[arg(long, value_delimiter = ',')]
    sources: Vec<String>,
    /// Comma-separated categories
    #[arg(long, value_delimiter = ',')]
    categories: Vec<String>,
    /// Comma-separated author names
    #[arg(long, value_delimiter = ',')]
    authors: Vec<String>,
    /// Earliest publication date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    from: Option<String>,
    /// Latest publication date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    to: Option<String>,
}

fn parse_date(s: &str) -> std::result::Result<String, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|_| s.to_string())
        .map_err(|e| format!("expected YYYY-MM-DD: {}", e))
}

fn non_empty(list: Vec<String>) -> Option<Vec<String>> {
    let list: Vec<String> = list
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    (!list.is_empty()).then_some(list)
}

impl FilterArgs {
    fn into_filters(self, keyword: Option<String>) -> SearchFilters {
        SearchFilters {
            keyword: keyword.filter(|k| !k.trim().is_empty()),
            sources: non_empty(self.sources),
            categories: non_empty(self.categories),
            authors: non_empty(self.authors),
            from_date: self.from,
            to_date: self.to,
        }
    }
}

impl Cli {
    /// Environment first, then whatever was passed on the command line.
    fn config(&self) -> Result<Config> {
        let mut config = Config::from_env()?;
        if let Some(key) = &self.news_api_key {
            config.newsapi = config.newsapi.with_api_key(Some(key.clone()));
        }
        if let Some(key) = &self.guardian_api_key {
            config.guardian = config.guardian.with_api_key(Some(key.clone()));
        }
        if let Some(key) = &self.nyt_api_key {
            config.nytimes = config.nytimes.with_api_key(Some(key.clone()));
        }
        if let Some(timeout) = self.timeout {
            config.request_timeout = timeout.0;
        }
        if let Some(section) = &self.nyt_section {
            config.nyt_section = section.clone();
        }
        config.validate()?;
        Ok(config)
    }

    async fn preference_backend(&self) -> Result<Arc<dyn KeyValueStore>> {
        #[cfg(feature = "sqlite")]
        {
            if let Some(db) = &self.prefs_db {
                debug!(path = %db.display(), "using sqlite preference store");
                return Ok(Arc::new(nd_storage::SqliteStore::open(db).await?));
            }
        }
        Ok(Arc::new(JsonFileStore::new(&self.prefs_file)))
    }

    async fn preference_store(&self) -> Result<PreferenceStore> {
        PreferenceStore::load(self.preference_backend().await?).await
    }

    fn aggregator(&self) -> Result<Aggregator> {
        let config = self.config()?;
        debug!(timeout = %HumanDuration(config.request_timeout), ?config, "configured sources");
        Aggregator::from_config(&config)
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let json = cli.json;

    match &cli.command {
        Commands::Headlines { keyword, filters } => {
            let filters = filters.clone().into_filters(keyword.clone());
            let aggregator = cli.aggregator()?;
            let preferences = cli.preference_store().await?.get();
            let articles = aggregator
                .get_top_headlines(Some(&preferences), Some(&filters))
                .await;
            print_articles(&articles, json)?;
        }
        Commands::Search { keyword, filters } => {
            let filters = filters.clone().into_filters(Some(keyword.clone()));
            let aggregator = cli.aggregator()?;
            let preferences = cli.preference_store().await?.get();
            let articles = aggregator.search_all_sources(&filters, Some(&preferences)).await;
            print_articles(&articles, json)?;
        }
        Commands::Sources => print_items(&nd_core::default_sources(), json)?,
        Commands::Categories => print_items(&nd_core::default_categories(), json)?,
        Commands::Prefs { command } => {
            let store = cli.preference_store().await?;
            let preferences = match command {
                None | Some(PrefsCommands::Show) => store.get(),
                Some(PrefsCommands::ToggleSource { id }) => store.toggle_source(id).await?,
                Some(PrefsCommands::ToggleCategory { id }) => store.toggle_category(id).await?,
                Some(PrefsCommands::ToggleAuthor { id }) => store.toggle_author(id).await?,
                Some(PrefsCommands::AddAuthor { name, id }) => {
                    let id = id.clone().unwrap_or_else(|| name.clone());
                    store.add_author(PreferenceItem::new(id, name.clone(), true)).await?
                }
                Some(PrefsCommands::Reset) => store.reset().await?,
                Some(PrefsCommands::Clear) => store.clear().await?,
            };
            if json {
                println!("{}", output::to_json(&preferences)?);
            } else {
                print!("{}", output::render_preferences(&preferences));
            }
        }
        Commands::Serve { addr } => {
            let aggregator = Arc::new(cli.aggregator()?);
            let preferences = Arc::new(cli.preference_store().await?);
            let app = create_app(AppState::new(aggregator, preferences));

            let listener = tokio::net::TcpListener::bind(*addr).await?;
            info!(%addr, prefs = %cli.prefs_file.display(), "serving API");
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
    }

    Ok(())
}

fn print_articles(articles: &[Article], json: bool) -> Result<()> {
    if json {
        println!("{}", output::to_json(articles)?);
    } else {
        print!("{}", output::render_articles(articles));
    }
    Ok(())
}

fn print_items(items: &[PreferenceItem], json: bool) -> Result<()> {
    if json {
        println!("{}", output::to_json(items)?);
    } else {
        print!("{}", output::render_items(items));
    }
    Ok(())
}
