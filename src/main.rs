//! BoxCast command line client
//! Lists channel broadcasts and resolves stream views

// Use mimalloc for faster memory allocation (Linux, macOS)
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use boxcast::cache::{viewer_id, FileCache};
use boxcast::models::format_date;
use boxcast::{Broadcast, BoxCastClient, BoxCastError, BroadcastCatalog, Channel, ClientConfig};

#[derive(Parser)]
#[command(name = "boxcast", version, about = "Browse BoxCast broadcasts")]
struct Cli {
    /// Override the API base URL from the config file
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Broadcasts currently live or in preroll
    Live { channel: String },
    /// Broadcasts scheduled for the future
    Upcoming { channel: String },
    /// Past broadcasts
    Archived { channel: String },
    /// One page of a channel's broadcasts, newest first
    Episodes { channel: String },
    /// Details of a single broadcast
    Broadcast {
        id: String,
        #[arg(long)]
        channel: String,
    },
    /// Stream status and playlist of a broadcast
    View { id: String },
}

fn print_broadcasts(broadcasts: &[Broadcast]) {
    if broadcasts.is_empty() {
        println!("No broadcasts");
        return;
    }
    for b in broadcasts {
        println!("{}  {}  {}", b.id, format_date(&b.start_date), b.name);
    }
}

fn run(cli: Cli) -> Result<(), BoxCastError> {
    let mut config = ClientConfig::load();
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
    }
    let client = BoxCastClient::from_config(&config)?;

    match cli.command {
        Command::Live { channel } => print_broadcasts(&client.get_live_broadcasts(&channel)?),
        Command::Upcoming { channel } => print_broadcasts(&client.get_upcoming_broadcasts(&channel)?),
        Command::Archived { channel } => print_broadcasts(&client.get_archived_broadcasts(&channel)?),
        Command::Episodes { channel } => {
            let viewer = viewer_id(&FileCache::in_user_cache_dir());
            let catalog = BroadcastCatalog::new(client, config, viewer);
            let episodes = catalog.episodes(&Channel::new(&channel, &channel))?;
            if episodes.is_empty() {
                println!("No episodes");
            }
            for e in &episodes {
                println!("{}  {}  {}", e.id, format_date(&e.date), e.title);
            }
        }
        Command::Broadcast { id, channel } => {
            let b = client.get_broadcast(&id, &channel)?;
            println!("id:          {}", b.id);
            println!("name:        {}", b.name);
            println!("channel:     {}", b.channel_id);
            println!("account:     {}", b.account_id.as_deref().unwrap_or("-"));
            println!("starts:      {}", format_date(&b.start_date));
            println!("stops:       {}", format_date(&b.stop_date));
            if let Some(url) = &b.thumbnail_url {
                println!("thumbnail:   {}", url);
            }
            if !b.description.is_empty() {
                println!("\n{}", b.description);
            }
        }
        Command::View { id } => {
            let view = client.get_broadcast_view(&id)?;
            println!("status:   {:?}", view.status);
            match &view.playlist_url {
                Some(url) => println!("playlist: {}", url),
                None => println!("playlist: -"),
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "request failed");
            ExitCode::FAILURE
        }
    }
}
