//! `exchange-trading`: serve, check, and inspect the trading app.
//!
//! ```bash
//! exchange-trading runserver --port 8000
//! exchange-trading --settings exchange.toml check
//! exchange-trading show-urls
//! exchange-trading reverse token-detail --kwarg slug=bitcoin-classic
//! ```

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use exchange_core::logging::setup_logging;
use exchange_core::settings_loader;
use exchange_core::SETTINGS;
use exchange_trading::commands;

#[derive(Parser)]
#[command(name = "exchange-trading", version, about = "Exchange trading app")]
struct Cli {
    /// Settings file (TOML, or JSON by extension). EXCHANGE_* variables
    /// override it.
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server
    Runserver {
        /// Address to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Port to bind to
        #[arg(long, default_value_t = 8000)]
        port: u16,
    },
    /// Run the system checks
    Check,
    /// List every route and its name
    ShowUrls,
    /// Print the URL for a named route
    Reverse {
        /// Route name, e.g. token-detail
        name: String,
        /// Positional route parameters
        args: Vec<String>,
        /// Keyword route parameter, repeatable
        #[arg(long = "kwarg", value_name = "KEY=VALUE", value_parser = commands::parse_kwarg)]
        kwargs: Vec<(String, String)>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.settings {
        Some(path) => settings_loader::from_file_with_env(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => settings_loader::from_env(),
    };
    setup_logging(&settings);
    SETTINGS.configure(settings);

    let app = commands::build_app(SETTINGS.get().clone()).context("loading ROOT_URLCONF")?;
    tracing::debug!(root_urlconf = %app.settings().root_urlconf, "app loaded");

    match cli.command {
        Command::Runserver { host, port } => {
            let addr = format!("{host}:{port}");
            app.run(&addr).await?;
        }
        Command::Check => {
            let report = commands::check(&app)?;
            println!("{report}");
        }
        Command::ShowUrls => {
            if let Some(urls) = app.url_conf() {
                println!("{}", commands::show_urls(urls));
            }
        }
        Command::Reverse { name, args, kwargs } => {
            let urls = app
                .url_conf()
                .context("no URL configuration loaded")?;
            let url = commands::reverse(urls, app.settings(), &name, &args, &kwargs)?;
            println!("{url}");
        }
    }

    Ok(())
}
