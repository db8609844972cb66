// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the account-scoped Chatwoot REST API.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use zapbridge_core::BridgeError;

use crate::types::{
    ApiErrorResponse, ContactSearchResponse, ConversationResponse, CreateContactRequest,
    CreateContactResponse, CreateConversationRequest, CreateInboxRequest, CreateMessageRequest,
    InboxChannel, InboxResponse, MessageResponse,
};

/// Header carrying the Chatwoot user/agent-bot access token.
const AUTH_HEADER: &str = "api_access_token";

/// Contact fields for [`ChatwootClient::create_contact`].
#[derive(Debug, Clone)]
pub struct NewContact<'a> {
    pub inbox_id: i64,
    pub name: &'a str,
    /// Phone number or WhatsApp address; group addresses are not sent as phones.
    pub phone: Option<&'a str>,
    pub identifier: Option<&'a str>,
    pub avatar_url: Option<&'a str>,
}

/// Typed client bound to one Chatwoot account.
#[derive(Clone)]
pub struct ChatwootClient {
    client: reqwest::Client,
    base_url: String,
    account_id: String,
}

impl std::fmt::Debug for ChatwootClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatwootClient")
            .field("base_url", &self.base_url)
            .field("account_id", &self.account_id)
            .finish_non_exhaustive()
    }
}

impl ChatwootClient {
    /// Builds a client; every request carries `token` and is bounded by `timeout`.
    pub fn new(
        base_url: &str,
        account_id: &str,
        token: &SecretString,
        timeout: Duration,
    ) -> Result<Self, BridgeError> {
        let mut token_value = HeaderValue::from_str(token.expose_secret())
            .map_err(|e| BridgeError::Config(format!("invalid Chatwoot token header: {e}")))?;
        token_value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTH_HEADER, token_value);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| BridgeError::Remote {
                message: format!("failed to build HTTP client: {e}"),
                status: None,
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            account_id: account_id.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/api/v1/accounts/{}{}",
            self.base_url, self.account_id, path
        )
    }

    async fn post_json<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, BridgeError> {
        let url = self.url(path);
        debug!(method = "POST", url = %url, "Chatwoot API request");
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;
        decode(response).await
    }

    /// Creates an API-channel inbox whose webhook points back at the bridge.
    pub async fn create_inbox(&self, name: &str, webhook_url: &str) -> Result<i64, BridgeError> {
        let inbox: InboxResponse = self
            .post_json(
                "/inboxes",
                &CreateInboxRequest {
                    name,
                    channel: InboxChannel {
                        kind: "api",
                        webhook_url,
                    },
                },
            )
            .await?;
        info!(inbox_id = inbox.id, name, "Chatwoot inbox created");
        Ok(inbox.id)
    }

    /// Searches contacts by phone; returns the first match.
    pub async fn search_contact(&self, phone: &str) -> Result<Option<i64>, BridgeError> {
        let query = if phone.starts_with('+') {
            phone.to_string()
        } else {
            format!("+{phone}")
        };
        let url = reqwest::Url::parse_with_params(
            &self.url("/contacts/search"),
            &[("q", query.as_str())],
        )
        .map_err(|e| BridgeError::Config(format!("invalid Chatwoot base URL: {e}")))?;
        debug!(method = "GET", url = %url, "Chatwoot API request");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(transport_error)?;
        let found: ContactSearchResponse = decode(response).await?;
        let id = found.payload.first().map(|c| c.id);
        debug!(phone = %query, contact_id = ?id, "contact search");
        Ok(id)
    }

    pub async fn create_contact(&self, contact: NewContact<'_>) -> Result<i64, BridgeError> {
        let phone_number = contact
            .phone
            .filter(|p| !p.is_empty() && !p.contains("@g.us"))
            .map(|p| {
                if p.starts_with('+') {
                    p.to_string()
                } else {
                    format!("+{p}")
                }
            });
        let created: CreateContactResponse = self
            .post_json(
                "/contacts",
                &CreateContactRequest {
                    inbox_id: contact.inbox_id,
                    name: contact.name,
                    identifier: contact.identifier.filter(|s| !s.is_empty()),
                    phone_number,
                    avatar_url: contact.avatar_url.filter(|s| !s.is_empty()),
                },
            )
            .await?;
        let id = created.payload.contact.id;
        info!(contact_id = id, name = contact.name, "Chatwoot contact created");
        Ok(id)
    }

    /// Opens a conversation; `pending` creates it in the pending state.
    pub async fn create_conversation(
        &self,
        contact_id: i64,
        inbox_id: i64,
        source_id: &str,
        pending: bool,
    ) -> Result<i64, BridgeError> {
        let conversation: ConversationResponse = self
            .post_json(
                "/conversations",
                &CreateConversationRequest {
                    contact_id: contact_id.to_string(),
                    inbox_id: inbox_id.to_string(),
                    status: pending.then_some("pending"),
                    source_id: Some(source_id).filter(|s| !s.is_empty()),
                },
            )
            .await?;
        info!(
            conversation_id = conversation.id,
            contact_id, inbox_id, "Chatwoot conversation created"
        );
        Ok(conversation.id)
    }

    /// Adds a text message. `message_type` is `incoming` or `outgoing`.
    pub async fn create_message(
        &self,
        conversation_id: i64,
        message_type: &str,
        content: &str,
        private: bool,
        source_id: &str,
    ) -> Result<i64, BridgeError> {
        let message: MessageResponse = self
            .post_json(
                &format!("/conversations/{conversation_id}/messages"),
                &CreateMessageRequest {
                    content,
                    message_type,
                    private,
                    source_id: Some(source_id).filter(|s| !s.is_empty()),
                },
            )
            .await?;
        debug!(
            message_id = message.id,
            conversation_id, message_type, "Chatwoot message created"
        );
        Ok(message.id)
    }

    /// Adds a message with one file attachment (multipart upload).
    #[allow(clippy::too_many_arguments)]
    pub async fn send_attachment(
        &self,
        conversation_id: i64,
        message_type: &str,
        data: Vec<u8>,
        file_name: &str,
        mime_type: &str,
        caption: Option<&str>,
        source_id: &str,
    ) -> Result<i64, BridgeError> {
        let size = data.len();
        let mut part = Part::bytes(data).file_name(file_name.to_string());
        if !mime_type.is_empty() {
            part = part.mime_str(mime_type).map_err(|e| {
                BridgeError::Validation(format!("invalid mime type `{mime_type}`: {e}"))
            })?;
        }

        let mut form = Form::new().text("message_type", message_type.to_string());
        if let Some(caption) = caption.filter(|c| !c.is_empty()) {
            form = form.text("content", caption.to_string());
        }
        if !source_id.is_empty() {
            form = form.text("source_id", source_id.to_string());
        }
        form = form.part("attachments[]", part);

        let url = self.url(&format!("/conversations/{conversation_id}/messages"));
        debug!(url = %url, file_name, mime_type, size, "sending media to Chatwoot");
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;
        let message: MessageResponse = decode(response).await?;
        info!(
            message_id = message.id,
            conversation_id, file_name, "Chatwoot media message sent"
        );
        Ok(message.id)
    }
}

fn transport_error(e: reqwest::Error) -> BridgeError {
    if e.is_timeout() {
        return BridgeError::Remote {
            message: format!("Chatwoot request timed out: {e}"),
            status: None,
            source: Some(Box::new(e)),
        };
    }
    BridgeError::Remote {
        message: format!("Chatwoot request failed: {e}"),
        status: None,
        source: Some(Box::new(e)),
    }
}

/// Maps non-2xx responses to `Remote` errors and decodes the rest.
async fn decode<R: DeserializeOwned>(response: reqwest::Response) -> Result<R, BridgeError> {
    let status = response.status();
    let body = response.text().await.map_err(transport_error)?;

    if !status.is_success() {
        let detail = serde_json::from_str::<ApiErrorResponse>(&body)
            .ok()
            .and_then(|e| e.message.or(e.error))
            .unwrap_or(body);
        return Err(BridgeError::remote(
            Some(status.as_u16()),
            format!("Chatwoot returned HTTP {}: {detail}", status.as_u16()),
        ));
    }

    serde_json::from_str(&body).map_err(|e| BridgeError::Remote {
        message: format!("failed to decode Chatwoot response: {e}"),
        status: Some(status.as_u16()),
        source: Some(Box::new(e)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> ChatwootClient {
        ChatwootClient::new(
            &server.uri(),
            "1",
            &SecretString::from("cw-secret"),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn search_contact_sends_token_and_plus_prefixed_phone() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/accounts/1/contacts/search"))
            .and(query_param("q", "+5511999999999"))
            .and(header("api_access_token", "cw-secret"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"payload": [{"id": 7}, {"id": 8}]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let id = client(&server).search_contact("5511999999999").await.unwrap();
        assert_eq!(id, Some(7));
    }

    #[tokio::test]
    async fn search_contact_miss_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/accounts/1/contacts/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"payload": []})))
            .mount(&server)
            .await;

        assert_eq!(client(&server).search_contact("+1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn create_contact_omits_phone_for_groups() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/accounts/1/contacts"))
            .and(body_json(serde_json::json!({
                "inbox_id": 3,
                "name": "Family",
                "identifier": "1203@g.us"
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"payload": {"contact": {"id": 12}}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let id = client(&server)
            .create_contact(NewContact {
                inbox_id: 3,
                name: "Family",
                phone: Some("1203@g.us"),
                identifier: Some("1203@g.us"),
                avatar_url: None,
            })
            .await
            .unwrap();
        assert_eq!(id, 12);
    }

    #[tokio::test]
    async fn create_conversation_pending_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/accounts/1/conversations"))
            .and(body_json(serde_json::json!({
                "contact_id": "7",
                "inbox_id": "3",
                "status": "pending",
                "source_id": "wa:5511@s.whatsapp.net"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 99})))
            .expect(1)
            .mount(&server)
            .await;

        let id = client(&server)
            .create_conversation(7, 3, "wa:5511@s.whatsapp.net", true)
            .await
            .unwrap();
        assert_eq!(id, 99);
    }

    #[tokio::test]
    async fn create_message_posts_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/accounts/1/conversations/99/messages"))
            .and(body_json(serde_json::json!({
                "content": "Hello",
                "message_type": "incoming",
                "private": false,
                "source_id": "WAID:3EB0"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 501})))
            .expect(1)
            .mount(&server)
            .await;

        let id = client(&server)
            .create_message(99, "incoming", "Hello", false, "WAID:3EB0")
            .await
            .unwrap();
        assert_eq!(id, 501);
    }

    #[tokio::test]
    async fn send_attachment_uses_multipart() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/accounts/1/conversations/99/messages"))
            .and(body_string_contains("name=\"attachments[]\"; filename=\"3EB0.jpg\""))
            .and(body_string_contains("WAID:3EB0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 502})))
            .expect(1)
            .mount(&server)
            .await;

        let id = client(&server)
            .send_attachment(
                99,
                "incoming",
                vec![0xff, 0xd8, 0xff],
                "3EB0.jpg",
                "image/jpeg",
                Some("look"),
                "WAID:3EB0",
            )
            .await
            .unwrap();
        assert_eq!(id, 502);
    }

    #[tokio::test]
    async fn api_error_carries_status_and_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/accounts/1/inboxes"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(serde_json::json!({"error": "Invalid Access Token"})),
            )
            .mount(&server)
            .await;

        let err = client(&server)
            .create_inbox("WhatsApp Inbox", "https://bridge/hook")
            .await
            .unwrap_err();
        match err {
            BridgeError::Remote { status, message, .. } => {
                assert_eq!(status, Some(401));
                assert!(message.contains("Invalid Access Token"));
            }
            other => panic!("expected Remote, got {other:?}"),
        }
    }
}
