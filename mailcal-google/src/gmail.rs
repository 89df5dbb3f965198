//! Gmail REST client: list unread mail, read a message, save a draft.

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use mailcal_core::mime::build_raw_message;
use mailcal_core::{DraftReply, IncomingEmail, Mailbox, MailcalError, MailcalResult, MessageRef};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::RequestBuilder;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

const GMAIL_API: &str = "https://gmail.googleapis.com/gmail/v1";

static HTML_BLOCKS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)>").expect("html block regex is valid")
});
static HTML_BREAKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<br\s*/?>|</p>|</div>").expect("html break regex is valid"));
static HTML_TAGS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]*>").expect("html tag regex is valid"));

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListMessagesResponse {
    #[serde(default)]
    messages: Vec<MessageId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageId {
    id: String,
    #[serde(default)]
    thread_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GmailMessage {
    id: String,
    #[serde(default)]
    thread_id: String,
    payload: Option<MessagePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessagePart {
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    headers: Vec<Header>,
    body: Option<PartBody>,
    #[serde(default)]
    parts: Vec<MessagePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartBody {
    attachment_id: Option<String>,
    // Base64url encoded
    data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Header {
    name: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct DraftResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Profile {
    email_address: String,
}

#[derive(Clone)]
pub struct GmailClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl GmailClient {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: GMAIL_API.to_string(),
            access_token: access_token.into(),
        }
    }

    /// Point the client at another API root (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/users/me/{}", self.base_url, path)
    }

    /// List message ids carrying all of `label_ids`, newest first.
    pub async fn list_messages(
        &self,
        max: u32,
        label_ids: &[String],
        query: Option<&str>,
    ) -> Result<Vec<MessageRef>> {
        let mut params: Vec<(&str, String)> = vec![("maxResults", max.to_string())];
        params.extend(label_ids.iter().map(|l| ("labelIds", l.clone())));
        if let Some(q) = query.filter(|q| !q.trim().is_empty()) {
            params.push(("q", q.to_string()));
        }

        let request = self.http.get(self.url("messages")).query(&params);
        let response: ListMessagesResponse = self
            .send(request)
            .await
            .context("Failed to list messages")?;

        Ok(response
            .messages
            .into_iter()
            .map(|m| MessageRef {
                id: m.id,
                thread_id: m.thread_id,
            })
            .collect())
    }

    pub async fn get_message(&self, id: &str) -> Result<IncomingEmail> {
        let request = self
            .http
            .get(self.url(&format!("messages/{id}")))
            .query(&[("format", "full")]);

        let message: GmailMessage = self
            .send(request)
            .await
            .with_context(|| format!("Failed to fetch message {id}"))?;

        Ok(to_incoming(message))
    }

    /// Save `draft` in the user's Drafts folder. Nothing is sent.
    pub async fn create_draft(&self, draft: &DraftReply) -> Result<String> {
        let mut message = serde_json::json!({ "raw": build_raw_message(draft) });
        if let Some(thread_id) = &draft.thread_id {
            message["threadId"] = serde_json::Value::String(thread_id.clone());
        }

        let request = self
            .http
            .post(self.url("drafts"))
            .json(&serde_json::json!({ "message": message }));

        let response: DraftResponse = self
            .send(request)
            .await
            .with_context(|| format!("Failed to create draft to {}", draft.to))?;

        Ok(response.id)
    }

    /// Address of the authenticated account.
    pub async fn profile_email(&self) -> Result<String> {
        let request = self.http.get(self.url("profile"));
        let profile: Profile = self
            .send(request)
            .await
            .context("Failed to fetch Gmail profile")?;
        Ok(profile.email_address)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.bearer_auth(&self.access_token).send().await?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if !status.is_success() {
            anyhow::bail!("Gmail API returned {}: {}", status, text);
        }

        debug!(%status, bytes = text.len(), "gmail response");
        serde_json::from_str(&text).context("Unexpected Gmail API response")
    }
}

#[async_trait]
impl Mailbox for GmailClient {
    async fn list_unread(
        &self,
        max: u32,
        label_ids: &[String],
        query: Option<&str>,
    ) -> MailcalResult<Vec<MessageRef>> {
        self.list_messages(max, label_ids, query)
            .await
            .map_err(|e| MailcalError::Mailbox(format!("{e:#}")))
    }

    async fn get_message(&self, message: &MessageRef) -> MailcalResult<IncomingEmail> {
        GmailClient::get_message(self, &message.id)
            .await
            .map_err(|e| MailcalError::Mailbox(format!("{e:#}")))
    }

    async fn create_draft(&self, draft: &DraftReply) -> MailcalResult<String> {
        GmailClient::create_draft(self, draft)
            .await
            .map_err(|e| MailcalError::Mailbox(format!("{e:#}")))
    }
}

fn to_incoming(message: GmailMessage) -> IncomingEmail {
    let payload = message.payload.unwrap_or_default();

    let header = |name: &str| {
        payload
            .headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.clone())
    };

    IncomingEmail {
        from: header("From").unwrap_or_default(),
        subject: header("Subject").unwrap_or_default(),
        message_id: header("Message-ID"),
        body: extract_body(&payload),
        id: message.id,
        thread_id: message.thread_id,
    }
}

/// Extract the readable body of a message.
///
/// A single-part message carries its text in `payload.body.data`. Multipart
/// messages nest it in `parts`, where plain text is preferred over HTML and
/// attachments are skipped.
fn extract_body(payload: &MessagePart) -> String {
    if let Some(text) = part_data(payload) {
        return if payload.mime_type.eq_ignore_ascii_case("text/html") {
            strip_html(&text)
        } else {
            text
        };
    }

    if let Some(text) = find_part(payload, "text/plain") {
        return text;
    }

    find_part(payload, "text/html")
        .map(|html| strip_html(&html))
        .unwrap_or_default()
}

fn find_part(part: &MessagePart, mime_type: &str) -> Option<String> {
    part.parts.iter().find_map(|child| {
        if child.mime_type.eq_ignore_ascii_case(mime_type) {
            if let Some(text) = part_data(child) {
                return Some(text);
            }
        }
        find_part(child, mime_type)
    })
}

fn part_data(part: &MessagePart) -> Option<String> {
    let body = part.body.as_ref()?;
    if body.attachment_id.is_some() {
        return None;
    }
    let data = body.data.as_deref().filter(|d| !d.is_empty())?;
    Some(decode_base64(data))
}

fn decode_base64(data: &str) -> String {
    match URL_SAFE_NO_PAD.decode(data.trim_end_matches('=')) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            debug!("base64 decode failed: {e}");
            String::new()
        }
    }
}

fn strip_html(html: &str) -> String {
    let text = HTML_BLOCKS.replace_all(html, "");
    let text = HTML_BREAKS.replace_all(&text, "\n");
    let text = HTML_TAGS.replace_all(&text, "");

    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
