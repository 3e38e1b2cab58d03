//! Sitecraft Bot - Main Entry Point
//!
//! Runs the site-building conversation in the terminal, one line per chat
//! message.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::style::Stylize;
use dialoguer::Input;
use qrcode::QrCode;
use qrcode::render::unicode::Dense1x2;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use sitecraft_bot::commands::{ConversationHandler, Reply};
use sitecraft_bot::config::{BotSettings, Catalog, GitHubConfig};
use sitecraft_bot::dialogue::State;
use sitecraft_bot::intent::KeywordMatcher;
use sitecraft_bot::publish::{
    ArtifactStore, GitHubPagesPublisher, LocalPublisher, LogoStore, RetryPolicy, SiteGenerator,
    SiteRenderer,
};
use sitecraft_bot::sessions::{SessionRegistry, SessionSweeper, SweeperMessage, UserId};

/// Conversational landing page builder.
#[derive(Parser, Debug)]
#[command(name = "sitecraft_bot")]
#[command(about = "Build and publish a project landing page by chatting")]
#[command(version)]
struct Args {
    /// Path to the template and theme catalog (built-in catalog if absent).
    #[arg(short, long)]
    catalog: Option<PathBuf>,

    /// Path to the .env file for environment variables.
    #[arg(long, default_value = ".env")]
    env_file: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Generate an example catalog file and exit.
    #[arg(long)]
    generate_config: bool,

    /// User id for this terminal session.
    #[arg(short, long, default_value_t = 1)]
    user: UserId,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level);

    if args.generate_config {
        return generate_example_config();
    }

    if let Err(e) = dotenvy::from_filename(&args.env_file) {
        debug!("Could not load .env file ({}): {}", args.env_file, e);
    }

    let settings = BotSettings::from_env_with_defaults();
    let catalog_path = args.catalog.unwrap_or_else(|| settings.catalog_path.clone());

    let catalog = Catalog::load_or_builtin(&catalog_path)
        .with_context(|| format!("Failed to load catalog from {}", catalog_path.display()))?;
    catalog.validate().context("Catalog validation failed")?;
    info!(
        "Loaded {} templates and {} themes",
        catalog.templates.len(),
        catalog.themes.len()
    );

    let retry = RetryPolicy::new(settings.publish_attempts, Duration::from_millis(500));
    let github = GitHubConfig::from_env()
        .context("Failed to load GitHub configuration from environment")?
        .map(|config| GitHubPagesPublisher::new(config, settings.publish_timeout(), retry))
        .transpose()
        .context("Failed to create GitHub client")?;
    if github.is_none() {
        info!("GITHUB_TOKEN not set, sites will be hosted locally");
    }

    let artifacts = Arc::new(ArtifactStore::new(settings.session_ttl()));
    let generator = Arc::new(SiteGenerator::new(
        SiteRenderer::new(&catalog).context("Failed to load site templates")?,
        LocalPublisher::new(&settings.sites_dir, &settings.public_base_url),
        github,
        retry,
        Arc::clone(&artifacts),
    ));
    let sessions = Arc::new(SessionRegistry::new(
        settings.session_ttl(),
        settings.transition_policy,
    ));
    let handler = ConversationHandler::new(
        settings.command_prefix.clone(),
        Arc::new(catalog),
        Arc::clone(&sessions),
        generator,
        LogoStore::new(
            &settings.uploads_dir,
            &settings.public_base_url,
            settings.max_logo_bytes,
        ),
        Box::new(KeywordMatcher::new().context("Failed to compile intent patterns")?),
    );

    let (sweeper_tx, sweeper_rx) = mpsc::channel::<SweeperMessage>(8);
    let sweeper = SessionSweeper::new(sessions, artifacts).with_interval(settings.sweep_interval());
    let sweeper_handle = tokio::spawn(async move {
        sweeper.run(sweeper_rx).await;
    });

    info!(
        "Starting sitecraft bot (prefix: {}, policy: {})",
        settings.command_prefix, settings.transition_policy
    );
    println!("{}", State::Idle.prompt().bold());
    println!(
        "{}",
        format!(
            "Type {0}help for commands, {0}quit to exit. Enter a file path to upload a logo.",
            settings.command_prefix
        )
        .dark_grey()
    );

    let quit = format!("{}quit", settings.command_prefix);
    let share = format!("{}share", settings.command_prefix);
    let interrupted = loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break true;
            }
            line = read_line() => line,
        };

        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("Input closed: {:#}", e);
                break false;
            }
        };
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if text.eq_ignore_ascii_case(&quit) {
            break false;
        }

        let reply = if Path::new(text).is_file() {
            match tokio::fs::read(text).await {
                Ok(bytes) => handler.handle_logo(args.user, &bytes).await,
                Err(e) => Reply::error(format!("Could not read {text}: {e}")),
            }
        } else {
            handler.handle_text(args.user, text).await
        };

        print_reply(&reply);
        if text.eq_ignore_ascii_case(&share) {
            if let Some(link) = &reply.link {
                print_qr(link);
            }
        }
    };

    info!("Shutting down...");
    let _ = sweeper_tx.send(SweeperMessage::Shutdown).await;
    let _ = sweeper_handle.await;

    if interrupted {
        // A line read may still be blocking a worker thread.
        std::process::exit(0);
    }
    Ok(())
}

/// Reads one line from the terminal without blocking the runtime.
async fn read_line() -> Result<String> {
    tokio::task::spawn_blocking(|| {
        Input::<String>::new()
            .with_prompt("you")
            .allow_empty(true)
            .interact_text()
    })
    .await
    .context("Input task failed")?
    .context("Failed to read input")
}

fn print_reply(reply: &Reply) {
    if reply.success {
        println!("{}", reply.message.as_str().cyan());
    } else {
        println!("{}", reply.message.as_str().red());
    }
}

fn print_qr(link: &str) {
    match QrCode::new(link.as_bytes()) {
        Ok(code) => {
            let image = code
                .render::<Dense1x2>()
                .dark_color(Dense1x2::Light)
                .light_color(Dense1x2::Dark)
                .build();
            println!("{image}");
        }
        Err(e) => warn!("Could not render QR code: {}", e),
    }
}

/// Initializes the logging subsystem.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Generates an example catalog file.
fn generate_example_config() -> Result<()> {
    let example = Catalog::example();
    example.save_to_file("catalog.example.json")?;

    println!("✓ Example catalog written to: catalog.example.json");
    println!("\nTo use this bot:");
    println!("1. Copy catalog.example.json to catalog.json");
    println!("2. Adjust the templates and themes to your liking");
    println!("3. Optionally create a .env file with GITHUB_TOKEN and GITHUB_USERNAME");
    println!("4. Run: sitecraft_bot");

    Ok(())
}
