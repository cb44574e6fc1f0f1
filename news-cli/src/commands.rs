use std::path::PathBuf;
use std::sync::Arc;

use news_core::source::category_page;
use news_core::worker::{CacheStorage, HttpTransport, Request};
use news_core::{
    AppConfig, Article, Category, CategoryFeed, CategoryFilter, ConfigError, FavoritesStore,
    FeedConfig, FeedError, FeedState, LoadOutcome, OfflineWorker, PersonalizedFeed,
    PreferencesStore, ResponseCache, SimulatedSource, WorkerError,
};
use reqwest::{redirect, ClientBuilder};
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{FavoritesCommand, InterestsCommand};

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Feed(#[from] FeedError),
    #[error(transparent)]
    Worker(#[from] WorkerError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid path: {0}")]
    Url(#[from] url::ParseError),
    #[error("no article with id {0}")]
    ArticleNotFound(String),
}

fn simulated_source(config: &FeedConfig) -> Arc<SimulatedSource> {
    Arc::new(SimulatedSource::new(
        config.category_latency(),
        config.personalized_latency(),
    ))
}

fn store_path(file: &str) -> Result<PathBuf, CliError> {
    Ok(AppConfig::config_dir()?.join(file))
}

pub async fn headlines(
    config: &AppConfig,
    category: CategoryFilter,
    pages: u32,
) -> Result<(), CliError> {
    let cache = ResponseCache::new(config.feed.cache_ttl());
    let feed = CategoryFeed::new(category, simulated_source(&config.feed), cache, &config.feed);

    feed.start().await?;
    for _ in 1..pages {
        if feed.load_more().await? == LoadOutcome::Skipped {
            break;
        }
    }
    feed.close();

    print_feed(&format!("Headlines: {category}"), &feed.state());
    Ok(())
}

pub async fn for_you(config: &AppConfig, pages: u32) -> Result<(), CliError> {
    let prefs = PreferencesStore::load_from(store_path("preferences.json")?).await;
    let interests = prefs.interests().await;
    if interests.is_empty() {
        println!("No interests selected. Use `interests toggle <category>` first.");
        return Ok(());
    }

    let feed = PersonalizedFeed::new(
        interests.clone(),
        simulated_source(&config.feed),
        &config.feed,
    );
    feed.start().await?;
    for _ in 1..pages {
        if feed.load_more().await? == LoadOutcome::Skipped {
            break;
        }
    }
    feed.close();

    let names: Vec<_> = interests.iter().map(Category::as_str).collect();
    print_feed(&format!("For you: {}", names.join(", ")), &feed.state());
    Ok(())
}

pub async fn favorites(config: &AppConfig, command: FavoritesCommand) -> Result<(), CliError> {
    let store = FavoritesStore::load_from(store_path("favorites.json")?, &config.storage).await;

    match command {
        FavoritesCommand::List => {
            let items = store.list().await;
            if items.is_empty() {
                println!("No favorites yet.");
            }
            for item in items {
                println!(
                    "{:>20}  {}  ({}, saved {})",
                    item.id,
                    item.title,
                    item.source,
                    item.added_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        FavoritesCommand::Add { id, category } => {
            let article = find_article(&config.feed, category, &id)
                .ok_or_else(|| CliError::ArticleNotFound(id.clone()))?;
            if store.add(&article).await {
                println!("Saved \"{}\".", article.title);
            } else {
                println!("\"{}\" is already a favorite.", article.title);
            }
        }
        FavoritesCommand::Remove { id } => {
            if store.remove(&id).await {
                println!("Removed {id}.");
            } else {
                println!("{id} was not a favorite.");
            }
        }
        FavoritesCommand::Clear => {
            let count = store.count().await;
            store.clear().await;
            println!("Removed {count} favorites.");
        }
    }
    Ok(())
}

pub async fn interests(command: InterestsCommand) -> Result<(), CliError> {
    let prefs = PreferencesStore::load_from(store_path("preferences.json")?).await;

    match command {
        InterestsCommand::List => {
            let selected = prefs.interests().await;
            for category in Category::ALL {
                let mark = if selected.contains(&category) { 'x' } else { ' ' };
                println!("[{mark}] {category}");
            }
        }
        InterestsCommand::Toggle { category } => {
            if prefs.toggle_interest(category).await {
                println!("Added {category}.");
            } else {
                println!("Removed {category}.");
            }
        }
        InterestsCommand::Reset => {
            prefs.reset().await;
            println!("Interests reset to defaults.");
        }
    }
    Ok(())
}

pub async fn worker(config: &AppConfig, origin: Url, paths: Vec<String>) -> Result<(), CliError> {
    let client = ClientBuilder::new()
        .redirect(redirect::Policy::limited(5))
        .user_agent(concat!("newsreader/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let worker = OfflineWorker::new(
        origin.clone(),
        config.worker.clone(),
        Arc::new(HttpTransport::new(client)),
        CacheStorage::new(),
    );

    let report = worker.install().await?;
    info!(
        cached = report.cached.len(),
        failed = report.failed.len(),
        state = %worker.state(),
        "worker installed"
    );
    for path in &report.failed {
        println!("precache failed: {path}");
    }

    for path in paths {
        let url = origin.join(&path)?;
        match worker.fetch(Request::get(url)).await {
            Ok(response) => println!(
                "{:>4} {:>8}B  {}  {}",
                response.status,
                response.body.len(),
                response.header("content-type").unwrap_or("-"),
                path
            ),
            Err(e) => println!(" ERR {:>9}  {}  ({e})", "", path),
        }
    }

    worker.wait_until_idle().await;
    println!(
        "{} entries in {}",
        worker.caches().entry_count(worker.cache_name()).await,
        worker.cache_name()
    );
    Ok(())
}

/// Looks an article up by id in the pages a category feed would show.
fn find_article(config: &FeedConfig, category: CategoryFilter, id: &str) -> Option<Article> {
    (1..=config.max_pages)
        .flat_map(|page| category_page(category, page, config.page_size, false))
        .find(|article| article.id == id)
}

fn print_feed(title: &str, state: &FeedState) {
    println!("{title} (page {}, {} articles)", state.page, state.articles.len());
    if let Some(error) = &state.error {
        println!("  {error}");
    }
    for article in &state.articles {
        println!(
            "  [{:<13}] {}  ({}, {})",
            article.category.as_str(),
            article.title,
            article.source.name,
            article.published_at.format("%d/%m %H:%M")
        );
    }
    if !state.has_more {
        println!("  No hay más noticias.");
    }
}
