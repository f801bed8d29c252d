use anyhow::{bail, Context, Result};
use chatstream::config::{self, ConnectionConfig};
use chatstream::{logging, ChatMessage, TwitchClient};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = config::load_config()?;
    logging::init(&cfg.logging);

    if cfg.twitch.normalized_channel().is_empty() {
        bail!(
            "No channel configured; set `channel` under [twitch] in {}",
            config::config_path().display()
        );
    }

    let mut client = TwitchClient::new(cfg.twitch.clone(), cfg.connection.clone());
    let printer = tokio::spawn(print_events(client.subscribe()));

    let result = tokio::select! {
        res = run_client(&mut client, &cfg.connection) => res,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, shutting down");
            Ok(())
        }
    };

    client.disconnect();
    // Dropping the client closes the subscriber channel so the printer ends.
    drop(client);
    if let Err(e) = printer.await {
        warn!(error = %e, "Event printer task failed");
    }
    result
}

/// Connect and keep the connection up, retrying per config when it drops.
async fn run_client(client: &mut TwitchClient, options: &ConnectionConfig) -> Result<()> {
    loop {
        let outcome = match client.connect().await {
            Ok(()) => client.closed().await,
            Err(e) => Err(e),
        };
        match outcome {
            Ok(()) => return Ok(()),
            Err(e) if options.auto_reconnect => {
                let delay = options.reconnect_delay();
                error!(error = %e, ?delay, "Chat connection failed, reconnecting");
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e).context("Chat connection failed"),
        }
    }
}

/// Write each classified message to stdout as one JSON object per line.
async fn print_events(mut events: mpsc::UnboundedReceiver<ChatMessage>) {
    while let Some(msg) = events.recv().await {
        match serde_json::to_string(&msg) {
            Ok(json) => println!("{}", json),
            Err(e) => warn!(error = %e, "Failed to serialize chat message"),
        }
    }
}
