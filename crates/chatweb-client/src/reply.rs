// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use serde_json::Value;

/// Reply fields in lookup order.  Different backend pipelines fill different
/// ones; the first present wins.
pub const REPLY_FIELDS: [&str; 3] = ["mensagem", "conteudo_markdown", "text"];

/// Which exchange a reply belongs to.  Only affects the placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    Text,
    Audio,
}

impl ReplyKind {
    pub fn placeholder(self) -> &'static str {
        match self {
            ReplyKind::Text => "(sem resposta)",
            ReplyKind::Audio => "(sem resposta de áudio)",
        }
    }
}

/// Normalised reply of one exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotReply {
    pub text: String,
    /// Field the text came from; `None` when the placeholder was used.
    pub field: Option<&'static str>,
}

impl BotReply {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), field: None }
    }
}

/// Pick the reply text out of a decoded response body.
///
/// `null` counts as absent.  Non-string values are kept in their JSON form.
pub fn extract_reply(body: &Value, kind: ReplyKind) -> BotReply {
    for field in REPLY_FIELDS {
        match body.get(field) {
            None | Some(Value::Null) => continue,
            Some(Value::String(s)) => return BotReply { text: s.clone(), field: Some(field) },
            Some(other) => return BotReply { text: other.to_string(), field: Some(field) },
        }
    }
    BotReply::new(kind.placeholder())
}
