mod commands;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use news_core::{AppConfig, Category, CategoryFilter};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "newsreader", about = "Headless news reader", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Page through the headlines of one category.
    Headlines {
        #[arg(long, default_value = "all")]
        category: CategoryFilter,
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Mixed feed built from the saved interests.
    ForYou {
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    #[command(subcommand)]
    Favorites(FavoritesCommand),
    #[command(subcommand)]
    Interests(InterestsCommand),
    /// Install the offline worker against a site and fetch paths through it.
    Worker {
        origin: url::Url,
        paths: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum FavoritesCommand {
    List,
    Add {
        id: String,
        #[arg(long, default_value = "all")]
        category: CategoryFilter,
    },
    Remove {
        id: String,
    },
    Clear,
}

#[derive(Subcommand)]
pub enum InterestsCommand {
    List,
    Toggle { category: Category },
    Reset,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let config = AppConfig::load();

    let result = match cli.command {
        Command::Headlines { category, pages } => {
            commands::headlines(&config, category, pages).await
        }
        Command::ForYou { pages } => commands::for_you(&config, pages).await,
        Command::Favorites(cmd) => commands::favorites(&config, cmd).await,
        Command::Interests(cmd) => commands::interests(cmd).await,
        Command::Worker { origin, paths } => commands::worker(&config, origin, paths).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
