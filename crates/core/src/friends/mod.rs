use std::{sync::Arc, time::Duration};

use reqwest::blocking::Client;
use serde_json::Value;

use crate::ServerConfig;

/// Friend entry exactly as the API returned it. The shape is not validated.
pub type FriendRecord = Value;

/// Fallback used when an error envelope carries no usable message.
pub const GENERIC_API_ERROR: &str = "Roblox returned an error response.";

/// Failure kinds for a single friends request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The request could not complete or the body was not a usable payload.
    #[error("transport failure: {0}")]
    Transport(String),
    /// The API answered with a 4xx or 5xx status.
    #[error("unexpected HTTP status {0}")]
    HttpStatus(u16),
    /// The API answered successfully but with an `errors` envelope.
    #[error("{0}")]
    Application(String),
}

/// Anything that can produce a user's friend list.
pub trait FriendSource: Send + Sync {
    fn fetch(&self, user_id: &str) -> Result<Vec<FriendRecord>, FetchError>;
}

impl<T: FriendSource + ?Sized> FriendSource for Arc<T> {
    fn fetch(&self, user_id: &str) -> Result<Vec<FriendRecord>, FetchError> {
        (**self).fetch(user_id)
    }
}

/// Blocking client for `GET /v1/users/{id}/friends`.
#[derive(Debug, Clone)]
pub struct FriendsFetcher {
    client: Client,
    base_url: String,
}

impl FriendsFetcher {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| FetchError::Transport(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ServerConfig) -> Result<Self, FetchError> {
        Self::new(config.api_base_url.clone(), config.request_timeout())
    }

    pub fn endpoint(&self, user_id: &str) -> String {
        format!("{}/v1/users/{user_id}/friends", self.base_url)
    }
}

impl FriendSource for FriendsFetcher {
    fn fetch(&self, user_id: &str) -> Result<Vec<FriendRecord>, FetchError> {
        let url = self.endpoint(user_id);
        tracing::debug!(%url, "requesting friend list");

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|err| FetchError::Transport(err.to_string()))?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            tracing::warn!(status = status.as_u16(), user_id, "friends request rejected");
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let body = response
            .bytes()
            .map_err(|err| FetchError::Transport(err.to_string()))?;
        parse_envelope(&body)
    }
}

/// Interprets a response body as a `data`/`errors` envelope.
pub fn parse_envelope(body: &[u8]) -> Result<Vec<FriendRecord>, FetchError> {
    let payload: Value = serde_json::from_slice(body)
        .map_err(|err| FetchError::Transport(format!("invalid JSON in Roblox response: {err}")))?;

    let Value::Object(mut envelope) = payload else {
        return Err(FetchError::Transport(
            "Roblox response is not a JSON object".to_string(),
        ));
    };

    if let Some(Value::Array(errors)) = envelope.get("errors") {
        if let Some(first) = errors.first() {
            let message = first
                .get("message")
                .and_then(Value::as_str)
                .filter(|message| !message.is_empty())
                .unwrap_or(GENERIC_API_ERROR);
            return Err(FetchError::Application(message.to_string()));
        }
    }

    match envelope.remove("data") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(records)) => Ok(records),
        Some(_) => Err(FetchError::Transport(
            "`data` in Roblox response is not a list".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn returns_data_records() {
        let records = parse_envelope(br#"{"data":[{"id":1},{"id":2}]}"#).unwrap();
        assert_eq!(records, vec![json!({"id": 1}), json!({"id": 2})]);
    }

    #[test]
    fn missing_data_is_empty() {
        assert!(parse_envelope(b"{}").unwrap().is_empty());
    }

    #[test]
    fn empty_errors_fall_back_to_data() {
        assert!(parse_envelope(br#"{"errors":[]}"#).unwrap().is_empty());

        let records = parse_envelope(br#"{"errors":[],"data":[{"id":3}]}"#).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn surfaces_first_error_message() {
        let err = parse_envelope(
            br#"{"errors":[{"code":0,"message":"rate limited"},{"message":"second"}]}"#,
        )
        .unwrap_err();
        assert_eq!(err, FetchError::Application("rate limited".to_string()));
    }

    #[test]
    fn error_without_message_uses_fallback() {
        for body in [
            &br#"{"errors":[{"code":3}]}"#[..],
            br#"{"errors":[{"message":""}]}"#,
            br#"{"errors":["boom"]}"#,
        ] {
            let err = parse_envelope(body).unwrap_err();
            assert_eq!(err, FetchError::Application(GENERIC_API_ERROR.to_string()));
        }
    }

    #[test]
    fn malformed_payloads_are_transport_failures() {
        for body in [&b"not json"[..], b"[1,2]", br#"{"data":"nope"}"#] {
            assert!(matches!(
                parse_envelope(body),
                Err(FetchError::Transport(_))
            ));
        }
    }

    #[test]
    fn endpoint_uses_user_id_and_trims_base() {
        let fetcher = FriendsFetcher::new("http://localhost:9/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            fetcher.endpoint("42"),
            "http://localhost:9/v1/users/42/friends"
        );
    }
}
