// ── Hubchat: CLI ───────────────────────────────────────────────────────────
// Thin terminal front-end for the chat session core: stdin lines become
// sends, inbound events print as they settle, `/quit` tears down. All the
// actual behavior lives in the library.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use log::warn;
use tokio::io::{AsyncBufReadExt, BufReader};

use hubchat::{ChatSession, ConnectionState, FileStore, HubConfig};

#[derive(Parser)]
#[command(name = "hubchat", about = "Chat client for a real-time messaging hub")]
struct Cli {
    /// WebSocket endpoint of the messaging hub.
    #[arg(long, env = "HUBCHAT_URL", default_value = "ws://127.0.0.1:5001/chathub")]
    url: String,

    /// Display name used to tag sent messages and filter hub echoes.
    #[arg(long, env = "HUBCHAT_USERNAME")]
    username: String,

    /// Directory for the session history snapshot. Defaults to the
    /// platform data directory.
    #[arg(long, env = "HUBCHAT_STATE_DIR")]
    state_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = HubConfig { url: cli.url, ..HubConfig::default() };
    let state_dir = cli.state_dir.unwrap_or_else(|| {
        dirs::data_dir().unwrap_or_else(|| PathBuf::from(".")).join("hubchat")
    });
    let store = Arc::new(FileStore::new(state_dir, config.session_key.clone()));

    let mut session = ChatSession::start(config, cli.username.as_str(), store).await;
    if session.connection_state() != ConnectionState::Connected {
        warn!("[cli] Not connected; messages will fail until the hub is reachable");
    }

    let mut printed = 0;
    for message in session.history() {
        println!("{}", message.text);
        printed += 1;
    }
    println!("(connected as {}; /quit to exit)", session.username());

    let scroll = session.scroll().clone();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            // The scroll anchor fires once per settled batch of appends;
            // print everything new since the last wake.
            _ = scroll.settled() => {
                let history = session.history();
                for message in &history[printed..] {
                    println!("{}", message.text);
                }
                printed = history.len();
            }
            line = lines.next_line() => {
                let Ok(Some(line)) = line else { break };
                if line.trim() == "/quit" {
                    break;
                }
                session.set_input(line);
                if session.send_message().await.is_err() {
                    eprintln!("(not delivered; kept in input buffer, /quit to exit)");
                }
            }
        }
    }

    session.close().await;
}
