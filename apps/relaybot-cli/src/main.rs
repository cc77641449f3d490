//! relaybot: log a bot account on and drive it from the terminal.
//!
//! ```bash
//! RELAYBOT_PASSWORD=hunter2 relaybot --config relaybot.toml
//! BOT> message 76561198000000000 hello there
//! BOT> getsid 76561198000000000
//! ```
//!
//! End input (Ctrl-D) to log off. The process exits with status 0 once
//! the service confirms.

use std::path::PathBuf;

use clap::Parser;
use relaybot::prelude::*;

mod config;
mod console;
mod logging;

use config::Config;
use console::StdinConsole;

#[derive(Debug, Parser)]
#[command(name = "relaybot", version, about = "Session bot operator console")]
struct Cli {
    /// Configuration file.
    #[arg(short, long, default_value = "relaybot.toml")]
    config: PathBuf,

    /// Account name, overriding `login.username`.
    #[arg(short, long, env = "RELAYBOT_USERNAME")]
    username: Option<String>,

    /// Account password, overriding `login.password`.
    #[arg(long, env = "RELAYBOT_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Service URL, overriding `server.url`.
    #[arg(short, long)]
    server: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let cli = Cli::parse();
    let mut config = Config::load(&cli.config)?;
    config.override_with(cli.username, cli.password, cli.server);
    config.validate()?;

    run(config).await?;
    Ok(())
}

/// Runs the bot until the connection ends.
async fn run(config: Config) -> Result<(), RelaybotError> {
    let (transport, mut events) =
        WebSocketTransport::spawn(config.server.url.clone(), JsonCodec);
    let mut bot = RelayBot::builder()
        .credentials(config.login.username, config.login.password)
        .watch(config.watch.to_watched())
        .build(transport, FileSentryStore::new(config.sentry.dir))?;
    let mut console = StdinConsole::spawn();

    bot.start().await?;

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    tracing::warn!("Transport stopped");
                    break;
                };
                if bot.dispatch(event, &mut console).await.is_break() {
                    break;
                }
            }
            line = console.next_line(), if bot.interface_active() => {
                match line {
                    Some(line) => {
                        bot.handle_line(&line).await;
                    }
                    None => bot.close_interface().await,
                }
            }
        }
    }

    Ok(())
}
