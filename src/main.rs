use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use playhead::{
    AuthDecision, AuthGate, CallbackParams, Config, HttpAuthenticator, HttpPlayerClient,
    PlaybackSnapshot, PlayheadService, RetryingClient, Session, SqliteStore,
    store::ContextType,
};

#[derive(Parser)]
#[command(name = "playhead")]
#[command(about = "Save and restore your listening position across slots", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with the streaming provider
    Login,
    /// Forget the stored sign-in
    Logout,
    /// Save the current listening position
    Save {
        /// Overwrite an existing slot instead of appending a new one
        #[arg(short, long)]
        slot: Option<usize>,
    },
    /// Show all saved positions
    List,
    /// Resume playback from a saved position
    Restore {
        /// Slot to restore
        slot: usize,
        /// Device id to play on (see 'devices'); defaults to the active one
        #[arg(short, long)]
        device: Option<String>,
    },
    /// List available playback devices
    Devices,
    /// Delete one saved position
    Delete {
        /// Slot to delete
        slot: usize,
    },
    /// Print everything stored for you as JSON
    Export,
    /// Delete everything stored for you
    Wipe,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive("warn".parse().expect("valid log directive"))
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn auth_gate(config: &Config) -> Result<AuthGate> {
    let authenticator = HttpAuthenticator::new(&config.provider)?;
    Ok(AuthGate::new(Arc::new(authenticator), config.callback_path()))
}

fn bearer_client(config: &Config, session: &Session) -> Result<RetryingClient<HttpPlayerClient>> {
    let token = session
        .access_token
        .as_ref()
        .context("not signed in; run 'playhead login' first")?;
    Ok(RetryingClient::new(
        HttpPlayerClient::new(token.access_token.clone()),
        config.retry,
    ))
}

/// Pull the callback parameters out of the URL the provider redirected to.
fn callback_params_from_url(raw: &str) -> Result<CallbackParams> {
    let url = reqwest::Url::parse(raw.trim()).context("that does not look like a URL")?;

    let mut params = CallbackParams::default();
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => params.code = Some(value.to_string()),
            "state" => params.state = value.to_string(),
            "error" => params.error = Some(value.to_string()),
            _ => {}
        }
    }
    Ok(params)
}

async fn login(config: &Config) -> Result<()> {
    config.require_credentials()?;

    let gate = auth_gate(config)?;
    let session_path = config.session_path();
    let mut session = Session::load(&session_path)?;

    let location = match gate.evaluate(&mut session, "/") {
        AuthDecision::Authenticated => {
            println!("Already signed in. Run 'playhead logout' to start over.");
            return Ok(());
        }
        AuthDecision::Callback => {
            anyhow::bail!("the configured redirect URL must not have '/' as its path")
        }
        AuthDecision::Redirect { location } => location,
    };

    // The pending state has to survive until the callback comes back.
    session.save(&session_path)?;

    println!("Open this URL in your browser and authorize the app:\n");
    println!("  {location}\n");
    println!(
        "Your browser will end up on {} (the page may not load; that is fine).",
        config.provider.redirect_url
    );
    print!("Paste the full URL from the address bar here: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read the pasted URL")?;
    let params = callback_params_from_url(&line)?;

    gate.handle_callback(&mut session, &params).await?;
    session.save(&session_path)?;

    let client = bearer_client(config, &session)?;
    let user = gate.ensure_identity(&mut session, &client).await;
    session.save(&session_path)?;

    println!("Signed in as {}.", user?);
    Ok(())
}

/// Session, client and user id for a command that talks to the provider.
async fn authed(
    config: &Config,
) -> Result<(PlayheadService, RetryingClient<HttpPlayerClient>, String)> {
    let session_path = config.session_path();
    let mut session = Session::load(&session_path)?;
    let client = bearer_client(config, &session)?;

    let gate = auth_gate(config)?;
    let user_id = gate.ensure_identity(&mut session, &client).await;
    // Either the cached id or the dropped token needs to be persisted.
    session.save(&session_path)?;
    let user_id = user_id?;

    let store = SqliteStore::new(config.db_path())?;
    let service = PlayheadService::new(Arc::new(store));
    Ok((service, client, user_id))
}

fn format_ms(ms: u64) -> String {
    let total_secs = ms / 1000;
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}

fn print_slot(index: usize, snapshot: &PlaybackSnapshot) {
    let context_name = match snapshot.context_type {
        ContextType::Playlist if !snapshot.playlist_name.is_empty() => &snapshot.playlist_name,
        _ => &snapshot.album_name,
    };
    let position = if snapshot.track_index >= 0 {
        format!(" (track {}/{})", snapshot.track_index, snapshot.total_tracks)
    } else {
        String::new()
    };
    let saved_at = chrono::DateTime::from_timestamp(snapshot.captured_at, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "-".to_string());

    println!("{index:>3}  {} - {}", snapshot.track_name, snapshot.artists);
    println!(
        "     {} '{}'{}, at {} of {}",
        snapshot.context_type,
        context_name,
        position,
        format_ms(snapshot.progress_ms),
        format_ms(snapshot.duration_ms)
    );
    if snapshot.link_to_context.is_empty() {
        println!("     saved {saved_at}");
    } else {
        println!("     saved {saved_at} | {}", snapshot.link_to_context);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load()?;

    match cli.command {
        Commands::Login => {
            login(&config).await?;
        }
        Commands::Logout => {
            Session::default().save(&config.session_path())?;
            println!("Signed out.");
        }
        Commands::Save { slot } => {
            let (service, client, user_id) = authed(&config).await?;
            let written = service.save_slot(&client, &user_id, slot).await?;
            println!("Saved current position to slot {written}.");
        }
        Commands::List => {
            let (service, _client, user_id) = authed(&config).await?;
            let slots = service.list_slots(&user_id).await?;
            if slots.is_empty() {
                println!("No saved positions yet. Use 'playhead save' while listening.");
            }
            for (index, snapshot) in slots.iter().enumerate() {
                print_slot(index, snapshot);
            }
        }
        Commands::Restore { slot, device } => {
            let (service, client, user_id) = authed(&config).await?;
            let snapshot = service
                .restore_slot(&client, &user_id, slot, device.as_deref())
                .await?;
            println!("Resumed '{}' by {}.", snapshot.track_name, snapshot.artists);
        }
        Commands::Devices => {
            let (service, client, _user_id) = authed(&config).await?;
            let devices = service.active_devices(&client).await?;
            if devices.is_empty() {
                println!("No devices available. Open the player somewhere first.");
            }
            for device in devices {
                println!(
                    "{} {}  [{}]",
                    if device.active { "*" } else { " " },
                    device.name,
                    device.id.as_deref().unwrap_or("-")
                );
            }
        }
        Commands::Delete { slot } => {
            let (service, _client, user_id) = authed(&config).await?;
            service.delete_slot(&user_id, slot).await?;
            println!("Deleted slot {slot}.");
        }
        Commands::Export => {
            let (service, _client, user_id) = authed(&config).await?;
            let dump = service.export_user_data(&user_id).await?;
            io::stdout().write_all(&dump)?;
            println!();
        }
        Commands::Wipe => {
            let (service, _client, user_id) = authed(&config).await?;
            service.delete_user_data(&user_id).await?;
            println!("Deleted all stored data.");
        }
    }

    Ok(())
}
