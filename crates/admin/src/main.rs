//! `mechgenz-admin` -- command-line admin console.
//!
//! Every command except `login` needs an open gate; see [`AdminGate`].
//!
//! # Environment variables
//!
//! | Variable               | Required | Description                              |
//! |------------------------|----------|------------------------------------------|
//! | `API_BASE_URL`         | no       | Backend base URL                         |
//! | `STORAGE_PATH`         | no       | Local store for the image cache and gate |
//! | `ADMIN_EMAIL`          | no       | Email accepted by `login`                |
//! | `ADMIN_PASSWORD`       | no       | Password accepted by `login`             |
//!
//! The full list is on [`SiteConfig::from_env`].

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use mechgenz_admin::dashboard::Dashboard;
use mechgenz_admin::gallery::GalleryBoard;
use mechgenz_admin::gate::AdminGate;
use mechgenz_admin::inquiries::InquiryBoard;
use mechgenz_admin::settings::Settings;
use mechgenz_admin::AdminError;
use mechgenz_client::BackendApi;
use mechgenz_core::config::SiteConfig;
use mechgenz_core::contact::Attachment;
use mechgenz_core::inquiry::{InquiryStatus, StatusFilter};
use mechgenz_core::profile::ProfileUpdate;
use mechgenz_core::storage::FileStore;
use mechgenz_images::ImageResolver;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "mechgenz-admin")]
#[command(about = "MECHGENZ admin console")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    /// Headline numbers and the latest inquiries.
    Dashboard,
    /// List inquiries.
    Inquiries {
        /// `all`, `new` or `replied`.
        #[arg(long, default_value = "all")]
        status: StatusFilter,
        #[arg(long, default_value = "")]
        search: String,
    },
    /// Show one inquiry in full.
    Show { id: String },
    /// Email a reply and mark the inquiry replied.
    Reply { id: String, message: String },
    Status { id: String, status: InquiryStatus },
    Delete { id: String },
    /// Save an attachment of an inquiry.
    Download {
        id: String,
        file: String,
        /// Output path; defaults to the saved file name.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List website images.
    Gallery {
        #[arg(long)]
        category: Option<String>,
        #[arg(long, default_value = "")]
        search: String,
    },
    /// Replace the image of a key.
    Upload { key: String, path: PathBuf },
    /// Change the display name and description of an image.
    Edit {
        key: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Go back to the default image of a key.
    Reset { key: String },
    /// Remove the configuration of a key.
    Remove { key: String },
    Profile,
    UpdateProfile {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: Option<String>,
    },
}

fn print_errors(error: &AdminError) {
    if let AdminError::Validation(fields) = error {
        for (field, messages) in fields {
            for message in messages {
                eprintln!("{field}: {message}");
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mechgenz_admin=info,mechgenz_images=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = SiteConfig::from_env()?;
    let api = BackendApi::with_timeout(&config.api_base_url, config.request_timeout)?;
    let gate = AdminGate::new(
        Arc::new(FileStore::new(config.storage_path.clone())),
        config.admin.clone(),
    );

    if let Command::Login { email, password } = &args.command {
        gate.login(email, password)?;
        println!("Logged in");
        return Ok(());
    }
    gate.require()?;

    if let Err(e) = run(args.command, &config, api, &gate).await {
        print_errors(&e);
        anyhow::bail!(e.user_message());
    }
    Ok(())
}

async fn run(
    command: Command,
    config: &SiteConfig,
    api: BackendApi,
    gate: &AdminGate,
) -> Result<(), AdminError> {
    match command {
        Command::Login { .. } => {}
        Command::Logout => {
            gate.logout()?;
            println!("Logged out");
        }
        Command::Dashboard => {
            let dashboard = Dashboard::load(&api).await;
            println!("Total inquiries:  {}", dashboard.total_inquiries);
            println!("New:              {}", dashboard.new_inquiries);
            println!("Replied:          {}", dashboard.replied_inquiries);
            println!("Last 30 days:     {}", dashboard.last_30_days);
            println!();
            println!("Recent inquiries:");
            for inquiry in &dashboard.recent {
                println!(
                    "  {}  {:<8} {} <{}>",
                    inquiry.submitted_at.format("%Y-%m-%d"),
                    inquiry.status,
                    inquiry.name,
                    inquiry.email
                );
            }
        }
        Command::Inquiries { status, search } => {
            let mut board = InquiryBoard::new();
            board.filter = status;
            board.search = search;
            board.refresh(&api).await?;
            let visible = board.visible();
            println!("{} of {} inquiries", visible.len(), board.total_count());
            for inquiry in visible {
                println!(
                    "{}\t{}\t{}\t{}\t{} file(s)",
                    inquiry.id,
                    inquiry.submitted_at.format("%Y-%m-%d %H:%M"),
                    inquiry.status,
                    inquiry.name,
                    inquiry.uploaded_files.len()
                );
            }
        }
        Command::Show { id } => {
            let mut board = InquiryBoard::new();
            board.refresh(&api).await?;
            let inquiry = board.select(&id)?;
            println!("From:    {} <{}>", inquiry.name, inquiry.email);
            if let Some(phone) = &inquiry.phone {
                println!("Phone:   {phone}");
            }
            println!("Date:    {}", inquiry.submitted_at.to_rfc3339());
            println!("Status:  {}", inquiry.status);
            println!();
            println!("{}", inquiry.message);
            for file in &inquiry.uploaded_files {
                println!("  [{}] {} ({})", file.saved_name, file.original_name, file.size_label());
            }
        }
        Command::Reply { id, message } => {
            let mut board = InquiryBoard::new();
            board.refresh(&api).await?;
            board.reply(&api, &id, &message).await?;
            println!("Reply sent");
        }
        Command::Status { id, status } => {
            InquiryBoard::new().set_status(&api, &id, status).await?;
            println!("{id} marked {status}");
        }
        Command::Delete { id } => {
            InquiryBoard::new().delete(&api, &id).await?;
            println!("Deleted {id}");
        }
        Command::Download { id, file, out } => {
            let mut board = InquiryBoard::new();
            board.refresh(&api).await?;
            let bytes = board.download(&api, &id, &file).await?;
            let out = out.unwrap_or_else(|| PathBuf::from(&file));
            std::fs::write(&out, bytes).map_err(|e| {
                mechgenz_core::error::CoreError::Internal(format!(
                    "Failed to write {}: {e}",
                    out.display()
                ))
            })?;
            println!("Saved {}", out.display());
        }
        Command::Gallery { category, search } => {
            let mut board = GalleryBoard::new();
            board.category = category;
            board.search = search;
            board.refresh(&api).await?;
            for entry in board.visible() {
                println!(
                    "{}\t{}\t{}\t{}",
                    entry.id,
                    entry.category,
                    entry.name,
                    board.preview(entry, &config.api_base_url)
                );
            }
        }
        Command::Upload { key, path } => {
            let bytes = std::fs::read(&path).map_err(|e| {
                mechgenz_core::error::CoreError::Validation(format!(
                    "Failed to read {}: {e}",
                    path.display()
                ))
            })?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let content_type = Attachment::guess_content_type(&file_name);
            let resolver = session_resolver(config, api.clone())?;
            let url = GalleryBoard::new()
                .upload(&api, &resolver, &key, Attachment::new(file_name, content_type, bytes))
                .await?;
            println!("{key} -> {url}");
        }
        Command::Edit {
            key,
            name,
            description,
        } => {
            let resolver = session_resolver(config, api.clone())?;
            let mut board = GalleryBoard::new();
            board.refresh(&api).await?;
            board.edit(&api, &resolver, &key, &name, &description).await?;
            println!("Updated {key}");
        }
        Command::Reset { key } => {
            let resolver = session_resolver(config, api.clone())?;
            let url = GalleryBoard::new().reset(&api, &resolver, &key).await?;
            if url.is_empty() {
                println!("{key} removed; it has no default image");
            } else {
                println!("{key} -> {url}");
            }
        }
        Command::Remove { key } => {
            let resolver = session_resolver(config, api.clone())?;
            GalleryBoard::new().remove(&api, &resolver, &key).await?;
            println!("Removed {key}");
        }
        Command::Profile => {
            let settings = Settings::load(&api).await?;
            println!("{} <{}>", settings.profile.name, settings.profile.email);
        }
        Command::UpdateProfile {
            name,
            email,
            password,
        } => {
            let mut settings = Settings::default();
            settings
                .save(
                    &api,
                    ProfileUpdate {
                        name,
                        email,
                        password,
                    },
                )
                .await?;
            println!("Profile saved");
        }
    }
    Ok(())
}

/// Resolver over the shared local cache, so gallery edits reach the public
/// pages without a backend round trip.
fn session_resolver(config: &SiteConfig, api: BackendApi) -> Result<ImageResolver, AdminError> {
    let resolver = ImageResolver::from_config(config, api)?;
    resolver.load_cached();
    Ok(resolver)
}

