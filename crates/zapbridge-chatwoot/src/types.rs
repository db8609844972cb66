// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request and response bodies of the Chatwoot REST API.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct InboxChannel<'a> {
    #[serde(rename = "type")]
    pub kind: &'a str,
    pub webhook_url: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateInboxRequest<'a> {
    pub name: &'a str,
    pub channel: InboxChannel<'a>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InboxResponse {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContactPayload {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub identifier: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContactSearchResponse {
    #[serde(default)]
    pub payload: Vec<ContactPayload>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateContactRequest<'a> {
    pub inbox_id: i64,
    pub name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<&'a str>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContactEnvelope {
    pub contact: ContactPayload,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateContactResponse {
    pub payload: ContactEnvelope,
}

/// Chatwoot expects the ids as strings here.
#[derive(Debug, Clone, Serialize)]
pub struct CreateConversationRequest<'a> {
    pub contact_id: String,
    pub inbox_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<&'a str>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConversationResponse {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateMessageRequest<'a> {
    pub content: &'a str,
    pub message_type: &'a str,
    pub private: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<&'a str>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    pub id: i64,
}

/// Error body returned by Chatwoot on 4xx/5xx.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}
