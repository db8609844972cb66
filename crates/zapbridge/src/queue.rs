// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `zapbridge queue list` command implementation.

use std::io::IsTerminal;

use colored::Colorize;
use serde::Serialize;
use zapbridge_config::ZapbridgeConfig;
use zapbridge_core::BridgeError;
use zapbridge_storage::{QueueEntry, SqliteStorage};

const STATUSES: [&str; 4] = ["pending", "processing", "completed", "failed"];

#[derive(Debug, Serialize)]
struct EntryView<'a> {
    id: i64,
    status: &'a str,
    attempts: i32,
    created_at: &'a str,
    payload: serde_json::Value,
}

impl<'a> From<&'a QueueEntry> for EntryView<'a> {
    fn from(entry: &'a QueueEntry) -> Self {
        Self {
            id: entry.id,
            status: &entry.status,
            attempts: entry.attempts,
            created_at: &entry.created_at,
            payload: serde_json::from_str(&entry.payload)
                .unwrap_or_else(|_| serde_json::Value::String(entry.payload.clone())),
        }
    }
}

/// One-line summary of a dead-letter or event payload.
fn summarize(payload: &serde_json::Value) -> String {
    let url = payload.get("url").and_then(|v| v.as_str());
    let error = payload.get("errorMessage").and_then(|v| v.as_str());
    let tenant = payload.get("userID").and_then(|v| v.as_str());
    match (url, error) {
        (Some(url), Some(error)) => format!("{} {url}: {error}", tenant.unwrap_or("?")),
        _ => payload
            .get("type")
            .and_then(|v| v.as_str())
            .map(|t| format!("{} {t}", tenant.unwrap_or("?")))
            .unwrap_or_else(|| "-".to_string()),
    }
}

pub async fn run_list(
    config: &ZapbridgeConfig,
    queue: &str,
    status: Option<&str>,
    limit: i64,
    json: bool,
) -> Result<(), BridgeError> {
    if let Some(status) = status {
        if !STATUSES.contains(&status) {
            return Err(BridgeError::Validation(format!(
                "unknown status {status}; expected one of {}",
                STATUSES.join(", ")
            )));
        }
    }

    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    let entries = storage.list_queue(queue, status, limit.max(1)).await?;
    storage.close().await?;

    let views: Vec<EntryView<'_>> = entries.iter().map(EntryView::from).collect();
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&views).unwrap_or_else(|_| "[]".to_string())
        );
        return Ok(());
    }

    if views.is_empty() {
        println!("{queue}: empty");
        return Ok(());
    }
    let use_color = std::io::stdout().is_terminal();
    for view in &views {
        let status = if !use_color {
            view.status.to_string()
        } else if view.status == "failed" {
            view.status.red().to_string()
        } else if view.status == "completed" {
            view.status.green().to_string()
        } else {
            view.status.yellow().to_string()
        };
        println!(
            "#{:<6} {status:<10} {}  {}",
            view.id,
            view.created_at,
            summarize(&view.payload)
        );
    }
    Ok(())
}
