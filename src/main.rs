//! Command line entry point for the e2e harness.

use clap::{Parser, Subcommand};
use quix_e2e::{ChromeBrowser, Config, Driver, MockController, ServerProcess};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "quix-e2e")]
#[command(about = "Drive the application end to end: backend, browser and mocks")]
#[command(version)]
struct Cli {
    /// Application base URL
    #[arg(long, env = "E2E_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the backend in test mode and keep it running until Ctrl-C
    Serve {
        #[arg(short, long, env = "E2E_SERVER_PORT")]
        port: Option<u16>,

        /// Service checkout to run the backend from
        #[arg(long, env = "E2E_SERVICE_DIR")]
        service_dir: Option<PathBuf>,
    },
    /// Open the application at a state and report the page URL
    Smoke {
        /// Hash state to navigate to
        #[arg(long, default_value = "home")]
        state: String,

        /// Start the backend first and stop it afterwards
        #[arg(long)]
        start_server: bool,

        /// Reset the backend mocks on init even if E2E_MOCKED says otherwise
        #[arg(long)]
        mocked: bool,

        /// Attach to a running browser on this debugging port
        #[arg(long)]
        connect: Option<u16>,

        /// Show the browser window
        #[arg(long)]
        headed: bool,

        /// Also print the page HTML
        #[arg(long)]
        html: bool,
    },
    /// Register a mocked response for requests matching a pattern
    Mock {
        #[arg(long)]
        pattern: String,

        /// JSON payload returned for matching requests
        #[arg(long)]
        payload: String,
    },
    /// Drop every registered mock rule
    ResetMocks,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let mut config = Config::from_env()?;
    if let Some(base_url) = cli.base_url {
        config.driver.base_url = base_url;
    }

    match cli.command {
        Command::Serve { port, service_dir } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(dir) = service_dir {
                config.server.service_dir = dir;
            }
            serve(config).await
        }
        Command::Smoke {
            state,
            start_server,
            mocked,
            connect,
            headed,
            html,
        } => {
            if mocked {
                config.driver.mocked = true;
            }
            if headed {
                config.browser.headless = false;
            }
            if connect.is_some() {
                config.browser.connect_port = connect;
            }

            let server = if start_server {
                Some(quix_e2e::start_server(config.server.clone()).await?)
            } else {
                None
            };
            let result = smoke(config, &state, html).await;
            if let Some(server) = server {
                server.stop();
                server.wait_for_exit().await;
            }
            result
        }
        Command::Mock { pattern, payload } => {
            let payload: serde_json::Value = serde_json::from_str(&payload)?;
            let mock = MockController::new(&config.driver.base_url)?;
            mock.http(&pattern, &payload).await?;
            info!("Mocked {}", pattern);
            Ok(())
        }
        Command::ResetMocks => {
            MockController::new(&config.driver.base_url)?.reset().await?;
            info!("Mocks reset");
            Ok(())
        }
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let server = ServerProcess::spawn(config.server);
    if let Err(e) = server.wait_until_healthy().await {
        server.stop();
        server.wait_for_exit().await;
        return Err(e.into());
    }
    info!("Backend available at {}", server.base_url());

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
            server.stop();
            server.wait_for_exit().await;
        }
        _ = server.wait_for_exit() => {
            warn!("Backend exited on its own");
        }
    }
    Ok(())
}

async fn smoke(config: Config, state: &str, html: bool) -> anyhow::Result<()> {
    let browser = ChromeBrowser::launch(&config.browser).await?;
    let driver = Driver::init(&browser, config.driver).await?;

    driver.goto(state).await?;
    // fails with a timeout when the fragment never matches
    driver.url.matches(state).await?;

    let url = driver.log.url().await?;
    info!(session = driver.session_id(), "Reached {}", url);
    if html {
        println!("{}", driver.log.html().await?);
    }
    Ok(())
}
