//! Plain-text reply messages in the raw form Gmail drafts expect.

use base64::{Engine as _, engine::general_purpose::URL_SAFE};
use serde::{Deserialize, Serialize};

/// A reply waiting to be saved as a draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftReply {
    pub to: String,
    pub subject: String,
    pub body: String,
    /// Gmail thread the draft belongs to
    pub thread_id: Option<String>,
    /// `Message-ID` of the email being answered
    pub in_reply_to: Option<String>,
}

/// Build an RFC 2822 message and encode it as URL-safe base64.
pub fn build_raw_message(draft: &DraftReply) -> String {
    URL_SAFE.encode(render_message(draft))
}

fn render_message(draft: &DraftReply) -> String {
    let mut headers = vec![
        format!("To: {}", header_value(&draft.to)),
        format!("Subject: {}", header_value(&draft.subject)),
    ];

    if let Some(message_id) = &draft.in_reply_to {
        let message_id = header_value(message_id);
        headers.push(format!("In-Reply-To: {message_id}"));
        headers.push(format!("References: {message_id}"));
    }

    headers.push("MIME-Version: 1.0".to_string());
    headers.push("Content-Type: text/plain; charset=\"UTF-8\"".to_string());
    headers.push("Content-Transfer-Encoding: 8bit".to_string());

    let body = draft.body.replace("\r\n", "\n").replace('\n', "\r\n");

    format!("{}\r\n\r\n{}", headers.join("\r\n"), body)
}

/// Header values must stay on one line.
fn header_value(value: &str) -> String {
    value.replace(['\r', '\n'], " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> DraftReply {
        DraftReply {
            to: "alice@example.com".into(),
            subject: "Re: Lunch".into(),
            body: "Hi,\n\nSounds good.".into(),
            thread_id: Some("t1".into()),
            in_reply_to: Some("<abc@mail.example.com>".into()),
        }
    }

    fn decode(raw: &str) -> String {
        String::from_utf8(URL_SAFE.decode(raw).unwrap()).unwrap()
    }

    #[test]
    fn renders_headers_then_crlf_body() {
        let message = decode(&build_raw_message(&draft()));

        assert!(message.starts_with("To: alice@example.com\r\nSubject: Re: Lunch\r\n"));
        assert!(message.contains("In-Reply-To: <abc@mail.example.com>\r\n"));
        assert!(message.contains("References: <abc@mail.example.com>\r\n"));
        assert!(message.contains("Content-Type: text/plain; charset=\"UTF-8\""));
        assert!(message.ends_with("\r\n\r\nHi,\r\n\r\nSounds good."));
    }

    #[test]
    fn omits_threading_headers_without_message_id() {
        let mut d = draft();
        d.in_reply_to = None;
        let message = decode(&build_raw_message(&d));
        assert!(!message.contains("In-Reply-To"));
        assert!(!message.contains("References"));
    }

    #[test]
    fn header_injection_is_flattened() {
        let mut d = draft();
        d.subject = "Hello\r\nBcc: evil@example.com".into();
        let message = decode(&build_raw_message(&d));
        assert!(message.contains("Subject: Hello  Bcc: evil@example.com\r\n"));
        assert!(!message.contains("\r\nBcc:"));
    }

    #[test]
    fn encoding_is_url_safe() {
        let mut d = draft();
        d.body = "???>>>~~~ é".into();
        let raw = build_raw_message(&d);
        assert!(!raw.contains('+'));
        assert!(!raw.contains('/'));
    }
}
