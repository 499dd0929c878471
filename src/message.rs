//! Translatable messages with optional placeholder parameters.
//!
//! Check descriptions and deployment warnings are both expressed as a
//! [`Message`]: either a plain translatable key, or a key together with a
//! mapping from placeholder (`%latest%`) to substitution value. The
//! presentation layer translates the key and applies the parameters.
//!
//! Serialized untagged, so a plain message is a JSON string and a
//! parameterized one is a two-element array `[key, {params}]`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A translatable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
    /// A key translated as-is.
    Plain(String),
    /// A key plus placeholder substitutions.
    WithParams(String, BTreeMap<String, String>),
}

impl Message {
    /// Create a message without parameters.
    pub fn plain(key: impl Into<String>) -> Self {
        Message::Plain(key.into())
    }

    /// Create a message with placeholder substitutions.
    pub fn with_params<K, V>(
        key: impl Into<String>,
        params: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Message::WithParams(
            key.into(),
            params
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// The untranslated key.
    pub fn key(&self) -> &str {
        match self {
            Message::Plain(key) | Message::WithParams(key, _) => key,
        }
    }

    /// Value of a placeholder, if this message carries it.
    pub fn param(&self, name: &str) -> Option<&str> {
        match self {
            Message::Plain(_) => None,
            Message::WithParams(_, params) => params.get(name).map(String::as_str),
        }
    }

    /// The key with all placeholders substituted.
    pub fn render(&self) -> String {
        match self {
            Message::Plain(key) => key.clone(),
            Message::WithParams(key, params) => params
                .iter()
                .fold(key.clone(), |text, (name, value)| text.replace(name, value)),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<&str> for Message {
    fn from(key: &str) -> Self {
        Message::plain(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_message_renders_key() {
        let msg = Message::plain("ZLib");
        assert_eq!(msg.key(), "ZLib");
        assert_eq!(msg.render(), "ZLib");
        assert!(msg.param("%minimum%").is_none());
    }

    #[test]
    fn params_are_substituted() {
        let msg = Message::with_params(
            "PHP %minimum% or newer is needed. You are running: %current%",
            [("%minimum%", "7.4"), ("%current%", "8.2.1")],
        );
        assert_eq!(msg.param("%current%"), Some("8.2.1"));
        assert_eq!(
            msg.to_string(),
            "PHP 7.4 or newer is needed. You are running: 8.2.1"
        );
    }

    #[test]
    fn serializes_plain_as_string() {
        let json = serde_json::to_value(Message::plain("JSON support")).unwrap();
        assert_eq!(json, serde_json::json!("JSON support"));
    }

    #[test]
    fn serializes_params_as_pair() {
        let msg = Message::with_params("Update to %latest%", [("%latest%", "https://x/1")]);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            serde_json::json!(["Update to %latest%", {"%latest%": "https://x/1"}])
        );

        let back: Message = serde_json::from_value(json).unwrap();
        assert_eq!(back, msg);
    }
}
