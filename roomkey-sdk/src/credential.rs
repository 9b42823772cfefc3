//! The credential handed to a session handle.

use serde::{Deserialize, Serialize};

/// Opaque connection credential, kept exactly as the issuer returned it.
///
/// Nothing here validates fields; a well-formed JSON body that lacks a token
/// fails later, when the session handle tries to connect with it. Credentials
/// are never cached: every (re)connect asks the strategy again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(serde_json::Value);

impl Credential {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// `serverUrl`, if the issuer used the conventional field name.
    pub fn server_url(&self) -> Option<&str> {
        self.0.get("serverUrl").and_then(|v| v.as_str())
    }

    /// `participantToken`, if the issuer used the conventional field name.
    pub fn participant_token(&self) -> Option<&str> {
        self.0.get("participantToken").and_then(|v| v.as_str())
    }

    pub fn room_name(&self) -> Option<&str> {
        self.0.get("roomName").and_then(|v| v.as_str())
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn into_value(self) -> serde_json::Value {
        self.0
    }
}

impl From<serde_json::Value> for Credential {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn conventional_fields() {
        let c = Credential::new(json!({
            "serverUrl": "wss://rtc.example",
            "participantToken": "tok",
            "roomName": "room-1",
        }));
        assert_eq!(c.server_url(), Some("wss://rtc.example"));
        assert_eq!(c.participant_token(), Some("tok"));
        assert_eq!(c.room_name(), Some("room-1"));
    }

    #[test]
    fn unknown_shape_passes_through() {
        let c = Credential::new(json!({"token": "abc", "url": "wss://x"}));
        assert_eq!(c.server_url(), None);
        assert_eq!(serde_json::to_string(&c).unwrap(), r#"{"token":"abc","url":"wss://x"}"#);
    }
}
