//! `mechgenz-site` -- command-line stand-in for the public site.
//!
//! Resolves the images each section would show, refreshes the local image
//! cache from the backend and submits the footer contact form.
//!
//! # Environment variables
//!
//! See [`SiteConfig::from_env`]; a `.env` file in the working directory is
//! honoured.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use mechgenz_client::BackendApi;
use mechgenz_core::config::SiteConfig;
use mechgenz_core::contact::Attachment;
use mechgenz_images::{ImageResolver, RefreshOutcome};
use mechgenz_site::contact_form::{ContactFields, ContactForm, FormStatus};
use mechgenz_site::sections::{preload_section, site_sections, ResolvedPage};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "mechgenz-site")]
#[command(about = "MECHGENZ public site: images and contact form")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the URL each image key resolves to.
    Resolve {
        /// Keys to resolve; all known keys when omitted.
        keys: Vec<String>,
        /// URL to use for keys nobody knows.
        #[arg(long, default_value = "")]
        fallback: String,
    },
    /// Print every page section with its resolved images as JSON.
    Page {
        /// Check that each image loads, substituting fallbacks.
        #[arg(long)]
        preload: bool,
    },
    /// Fetch the registry from the backend and update the cache.
    Refresh,
    /// Forget the cached registry and go back to the built-in images.
    ClearCache,
    /// Submit the footer contact form.
    Contact {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long)]
        message: String,
        /// File to attach; repeat for several.
        #[arg(long = "file", value_name = "PATH")]
        files: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mechgenz_site=info,mechgenz_images=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = SiteConfig::from_env()?;
    let api = BackendApi::with_timeout(&config.api_base_url, config.request_timeout)?;

    tracing::debug!(api = %config.api_base_url, storage = %config.storage_path.display(), "Loaded configuration");

    match args.command {
        Command::Resolve { keys, fallback } => {
            let resolver = ImageResolver::from_config(&config, api)?;
            resolver.initialize().await;
            let keys = if keys.is_empty() {
                resolver.snapshot().keys().map(str::to_string).collect()
            } else {
                keys
            };
            for key in keys {
                println!("{key}\t{}", resolver.resolve(&key, &fallback));
            }
        }
        Command::Page { preload } => {
            let resolver = ImageResolver::from_config(&config, api)?;
            resolver.initialize().await;
            let page = if preload {
                let mut sections = Vec::new();
                for section in site_sections() {
                    sections.push(preload_section(&resolver, &section).await);
                }
                ResolvedPage { sections }
            } else {
                ResolvedPage::compose(&resolver)
            };
            println!("{}", serde_json::to_string_pretty(&page)?);
        }
        Command::Refresh => {
            let resolver = ImageResolver::from_config(&config, api)?;
            match resolver.invalidate().await {
                RefreshOutcome::Offline => println!("Backend offline; using built-in images"),
                RefreshOutcome::Failed(reason) => println!("Refresh failed: {reason}"),
                RefreshOutcome::Merged { replaced, kept } => {
                    println!("Refreshed: {} replaced, {} kept", replaced.len(), kept.len());
                    for key in replaced {
                        println!("  {key}");
                    }
                }
            }
        }
        Command::ClearCache => {
            let resolver = ImageResolver::from_config(&config, api)?;
            resolver.clear();
            println!("Image cache cleared");
        }
        Command::Contact {
            name,
            email,
            phone,
            message,
            files,
        } => {
            let mut form = ContactForm::new();
            form.fields = ContactFields {
                name,
                phone,
                email,
                message,
            };
            for path in files {
                let bytes = std::fs::read(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let content_type = Attachment::guess_content_type(&file_name);
                form.attach(Attachment::new(file_name, content_type, bytes));
            }

            match form.submit(&api, chrono::Utc::now()).await.clone() {
                FormStatus::Succeeded { message, .. } => println!("{message}"),
                FormStatus::Failed { message } => anyhow::bail!(message),
                FormStatus::Idle | FormStatus::Submitting => {
                    for (field, messages) in form.errors() {
                        for message in messages {
                            eprintln!("{field}: {message}");
                        }
                    }
                    anyhow::bail!("Please correct the highlighted fields");
                }
            }
        }
    }

    Ok(())
}
