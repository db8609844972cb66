// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Zapbridge - WhatsApp to Chatwoot bridge.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod pipeline;
mod queue;
mod serve;
mod shutdown;
mod tenant;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use zapbridge_config::ZapbridgeConfig;

/// Zapbridge - WhatsApp to Chatwoot bridge.
#[derive(Parser, Debug)]
#[command(name = "zapbridge", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP gateway, bridge, and delivery engine.
    Serve,
    /// Manage tenants.
    Tenant {
        #[command(subcommand)]
        action: TenantCommand,
    },
    /// Inspect configuration.
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
    /// Inspect the durable queues.
    Queue {
        #[command(subcommand)]
        action: QueueCommand,
    },
}

#[derive(Subcommand, Debug)]
enum TenantCommand {
    /// Register a tenant.
    Add {
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
        /// Opaque token for webhook URLs and API auth. Generated when omitted.
        #[arg(long)]
        token: Option<String>,
        /// Target URL for outbound event webhooks.
        #[arg(long)]
        webhook_url: Option<String>,
        /// HMAC signing key; sealed with the vault key before storage.
        #[arg(long)]
        hmac_key: Option<String>,
    },
    /// Replace (or with no key, clear) a tenant's HMAC signing key.
    RotateHmac {
        #[arg(long)]
        id: String,
        #[arg(long)]
        key: Option<String>,
    },
    /// List tenants.
    List {
        #[arg(long)]
        json: bool,
    },
    /// Remove a tenant and its bridge configuration.
    Remove {
        #[arg(long)]
        id: String,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate configuration and print the effective values.
    Check,
}

#[derive(Subcommand, Debug)]
enum QueueCommand {
    /// List queue entries.
    List {
        /// Queue name; defaults to the dead-letter queue.
        #[arg(long)]
        queue: Option<String>,
        /// Only entries in this state (pending, processing, completed, failed).
        #[arg(long)]
        status: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: i64,
        #[arg(long)]
        json: bool,
    },
}

fn load_config(path: Option<&PathBuf>) -> ZapbridgeConfig {
    let loaded = match path {
        Some(path) => zapbridge_config::load_and_validate_path(path),
        None => zapbridge_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            zapbridge_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Tenant { action }) => match action {
            TenantCommand::Add {
                id,
                name,
                token,
                webhook_url,
                hmac_key,
            } => {
                tenant::run_add(
                    &config,
                    tenant::TenantArgs {
                        id,
                        name,
                        token,
                        webhook_url,
                        hmac_key,
                    },
                )
                .await
            }
            TenantCommand::RotateHmac { id, key } => {
                tenant::run_rotate_hmac(&config, &id, key.as_deref()).await
            }
            TenantCommand::List { json } => tenant::run_list(&config, json).await,
            TenantCommand::Remove { id } => tenant::run_remove(&config, &id).await,
        },
        Some(Commands::Config {
            action: ConfigCommand::Check,
        }) => {
            print_config(&config);
            Ok(())
        }
        Some(Commands::Queue {
            action:
                QueueCommand::List {
                    queue,
                    status,
                    limit,
                    json,
                },
        }) => {
            let queue = queue.unwrap_or_else(|| config.queue.errors_queue.clone());
            queue::run_list(&config, &queue, status.as_deref(), limit, json).await
        }
        None => {
            println!("zapbridge: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// Prints the effective configuration with secrets masked.
fn print_config(config: &ZapbridgeConfig) {
    let mut shown = config.clone();
    if let Some(key) = shown.vault.encryption_key.as_mut() {
        *key = zapbridge_core::mask_token(key);
    }
    match toml::to_string_pretty(&shown) {
        Ok(text) => println!("{text}"),
        Err(e) => eprintln!("error: failed to render configuration: {e}"),
    }
    eprintln!("zapbridge: configuration is valid");
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_tenant_add() {
        let cli = Cli::try_parse_from([
            "zapbridge",
            "tenant",
            "add",
            "--id",
            "t1",
            "--name",
            "Sales",
            "--hmac-key",
            "s3cret",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Tenant {
                action: TenantCommand::Add { id, hmac_key, token, .. },
            }) => {
                assert_eq!(id, "t1");
                assert_eq!(hmac_key.as_deref(), Some("s3cret"));
                assert!(token.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_global_config_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["zapbridge", "config", "check", "--config", "/tmp/z.toml"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/z.toml")));
    }

    #[test]
    fn queue_list_defaults() {
        let cli = Cli::try_parse_from(["zapbridge", "queue", "list"]).unwrap();
        match cli.command {
            Some(Commands::Queue {
                action: QueueCommand::List { queue, limit, json, .. },
            }) => {
                assert!(queue.is_none());
                assert_eq!(limit, 20);
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn default_config_is_valid() {
        let config = zapbridge_config::load_and_validate_str("").unwrap();
        assert_eq!(config.server.port, 8080);
    }
}
