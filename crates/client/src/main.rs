// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! carrier: headless offline-first messaging client.
//!
//! Runs the sync engine against a server and logs the change feed. Useful
//! for soak-testing a deployment and as the reference embedding of
//! [`carrier::CarrierClient`]; graphical frontends consume the same
//! facade.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use carrier::{CarrierClient, CarrierConfig, Notice};
use carrier_core::Session;

/// carrier: offline-first messaging client engine
#[derive(Parser, Debug)]
#[command(name = "carrier")]
#[command(about = "Headless offline-first messaging client")]
struct Args {
    /// Path to config.toml (default: ~/.config/carrier/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server base URL; overrides the config file
    #[arg(short, long)]
    server: Option<String>,

    /// Username for a fresh offline session when none is persisted
    #[arg(short, long, default_value = "offline")]
    username: String,

    /// Send one message to this channel id, then exit
    #[arg(long, requires = "message")]
    send_to: Option<i64>,

    /// Message content for --send-to
    #[arg(long)]
    message: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = resolve_config(&args)?;
    info!("carrier starting");
    info!("  Server: {}", config.server_url);
    info!("  Realtime: {}", config.resolved_realtime_url());
    info!("  Store: {}", config.resolved_store_path().display());

    let client = CarrierClient::start(&config)?;

    if client.session().session().is_none() {
        info!("no persisted session, signing in offline as '{}'", args.username);
        client
            .install_session(Session::offline(&args.username, &config.server_url))
            .await?;
    }

    if let (Some(channel_id), Some(message)) = (args.send_to, args.message) {
        let sent = client.send_message(channel_id, message).await?;
        info!(
            "message {} created with state {}",
            sent.client_id, sent.sync_state
        );
        client.shutdown(Duration::from_secs(5)).await;
        return Ok(());
    }

    let mut notices = client.subscribe();
    loop {
        tokio::select! {
            notice = notices.recv() => match notice {
                Ok(notice) => print_notice(&notice),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    info!("notice stream lagged by {}", n);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
        }
    }

    client.shutdown(Duration::from_secs(5)).await;
    Ok(())
}

fn resolve_config(args: &Args) -> Result<CarrierConfig, Box<dyn std::error::Error>> {
    if let Some(server) = &args.server {
        return Ok(CarrierConfig::for_server(server.clone()));
    }
    let path = args
        .config
        .clone()
        .or_else(CarrierConfig::default_path)
        .ok_or("no config path available; pass --config or --server")?;
    if path.exists() {
        Ok(CarrierConfig::load(&path)?)
    } else {
        Err(format!(
            "config file {} not found; pass --server to create one",
            path.display()
        )
        .into())
    }
}

fn print_notice(notice: &Notice) {
    match notice {
        Notice::MessageUpserted(message) => {
            info!(
                "[msg {}] {}: {} ({})",
                message.channel_id, message.sender_name, message.content, message.sync_state
            );
        }
        Notice::ChannelsChanged => info!("[channels] list changed"),
        Notice::AlertRaised { alert, audible } => {
            info!(
                "[ALERT {}] {}: {}{}",
                alert.level,
                alert.title,
                alert.body,
                if *audible { " (audible)" } else { "" }
            );
        }
        Notice::AlertUpdated(alert) => info!("[alert] {} updated", alert.title),
        Notice::NewsChanged => info!("[news] feed changed"),
        Notice::Connectivity(mode) => info!("[connection] {}", mode),
    }
}
