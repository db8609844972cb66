// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Failure reports for deliveries that exhausted their attempts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What an operator needs to replay a failed delivery.
///
/// The signing key is carried still sealed, hex-encoded; replaying requires
/// the same vault key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadLetterRecord {
    pub url: String,
    pub payload: Value,
    #[serde(rename = "userID")]
    pub user_id: String,
    #[serde(rename = "encryptedHmacKey")]
    pub encrypted_hmac_key: String,
    #[serde(rename = "filePath", default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(rename = "attemptTime")]
    pub attempt_time: DateTime<Utc>,
    #[serde(rename = "errorMessage")]
    pub error_message: String,
}
