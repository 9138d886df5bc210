//! deskchat terminal client entry point.

use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use clap::Parser;
use deskchat_cli::{TerminalBell, TerminalView, parse_line};
use deskchat_client::{ClientConfig, FilePreferenceStore, PREFERENCES_FILE, Runtime, UserInput};
use deskchat_core::{MemoryPreferenceStore, NotificationGate, PreferenceStore};
use tokio::sync::mpsc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

/// deskchat terminal client
#[derive(Parser, Debug)]
#[command(name = "deskchat")]
#[command(about = "Line-oriented terminal client for the deskchat backend")]
#[command(version)]
struct Args {
    /// Backend base URL (http or https)
    #[arg(short, long, env = "DESKCHAT_BASE_URL", default_value = "http://localhost:8080")]
    base_url: Url,

    /// Username to chat as
    #[arg(short, long, env = "DESKCHAT_USER")]
    user: String,

    /// JSON roster file of {UserName, FullName, ImageURL} records
    #[arg(long, env = "DESKCHAT_ROSTER")]
    roster: Option<PathBuf>,

    /// Preference file (mute flag)
    #[arg(long, env = "DESKCHAT_PREFS", default_value = PREFERENCES_FILE)]
    prefs: PathBuf,

    /// Delay before reconnecting after an unclean close, in milliseconds
    #[arg(long, default_value_t = 3000)]
    reconnect_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry().with(fmt::layer().with_writer(io::stderr)).with(filter).init();

    let mut config = ClientConfig::new(args.base_url, args.user);
    config.roster_path = args.roster;
    config.preferences_path = args.prefs;
    config.reconnect_delay = Duration::from_millis(args.reconnect_ms);

    let prefs: Box<dyn PreferenceStore> = match FilePreferenceStore::open(&config.preferences_path) {
        Ok(store) => Box::new(store),
        Err(e) => {
            tracing::warn!("Preferences unavailable, mute will not persist: {:?}", e);
            Box::new(MemoryPreferenceStore::new())
        },
    };
    let gate = NotificationGate::new(config.username.clone(), Some(Box::new(TerminalBell)), prefs);

    let view = TerminalView::new(io::stdout());
    let popup = view.popup_flag();
    let runtime = Runtime::new(&config, gate, view)?;

    let (tx, rx) = mpsc::channel(32);
    spawn_input_reader(tx, popup);

    tracing::info!(base_url = %config.base_url, user = %config.username, "starting");
    Ok(runtime.run(rx).await?)
}

/// Read stdin on a dedicated thread; EOF closes the channel, which quits.
fn spawn_input_reader(tx: mpsc::Sender<UserInput>, popup: Arc<AtomicBool>) {
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    tracing::warn!("Failed to read input: {:?}", e);
                    break;
                },
            };

            match parse_line(&line, popup.load(Ordering::SeqCst)) {
                Ok(input) => {
                    let quit = input == UserInput::Quit;
                    if tx.blocking_send(input).is_err() || quit {
                        break;
                    }
                },
                Err(e) => {
                    let _ = writeln!(io::stderr(), "{e}");
                },
            }
        }
    });
}
