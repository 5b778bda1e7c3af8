use serde::Serialize;

use crate::friends::{FetchError, FriendRecord, FriendSource, GENERIC_API_ERROR};

pub const NO_FRIENDS_MESSAGE: &str = "No friends found for that user ID.";
pub const USER_NOT_FOUND_MESSAGE: &str = "Roblox user not found.";
pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch friends from Roblox.";
pub const UNREACHABLE_MESSAGE: &str = "Unable to contact the Roblox API. Please try again later.";

/// Rejections raised before any request is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please enter a Roblox user ID.")]
    Missing,
    #[error("The Roblox user ID must be a number.")]
    NotNumeric,
}

/// Display state for one lookup: the echoed id, the friends and an optional
/// message for the user.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LookupOutcome {
    pub user_id: String,
    pub friends: Vec<FriendRecord>,
    pub error: Option<String>,
}

/// Trims the raw input and checks it is a non-empty run of ASCII digits.
pub fn validate_user_id(raw: &str) -> Result<String, ValidationError> {
    let user_id = raw.trim();
    if user_id.is_empty() {
        return Err(ValidationError::Missing);
    }
    if !user_id.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(ValidationError::NotNumeric);
    }
    Ok(user_id.to_string())
}

/// Maps a fetch failure to the message shown to the user.
pub fn describe_fetch_error(error: &FetchError) -> String {
    match error {
        FetchError::Transport(_) => UNREACHABLE_MESSAGE.to_string(),
        FetchError::HttpStatus(404) => USER_NOT_FOUND_MESSAGE.to_string(),
        FetchError::HttpStatus(_) => FETCH_FAILED_MESSAGE.to_string(),
        FetchError::Application(message) if message.is_empty() => GENERIC_API_ERROR.to_string(),
        FetchError::Application(message) => message.clone(),
    }
}

/// Validates identifiers, fetches friends and picks the display state.
#[derive(Debug, Clone)]
pub struct FriendLookup<S> {
    source: S,
}

impl<S: FriendSource> FriendLookup<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn handle(&self, raw: &str) -> LookupOutcome {
        let mut outcome = LookupOutcome {
            user_id: raw.trim().to_string(),
            ..Default::default()
        };

        let user_id = match validate_user_id(raw) {
            Ok(user_id) => user_id,
            Err(err) => {
                outcome.error = Some(err.to_string());
                return outcome;
            }
        };

        match self.source.fetch(&user_id) {
            Ok(friends) if friends.is_empty() => {
                outcome.error = Some(NO_FRIENDS_MESSAGE.to_string());
            }
            Ok(friends) => {
                tracing::info!(%user_id, count = friends.len(), "friend lookup succeeded");
                outcome.friends = friends;
            }
            Err(err) => {
                tracing::warn!(%user_id, error = %err, "friend lookup failed");
                outcome.error = Some(describe_fetch_error(&err));
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;

    struct StubSource {
        response: Result<Vec<FriendRecord>, FetchError>,
        calls: AtomicUsize,
    }

    impl StubSource {
        fn new(response: Result<Vec<FriendRecord>, FetchError>) -> Self {
            Self {
                response,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl FriendSource for StubSource {
        fn fetch(&self, _user_id: &str) -> Result<Vec<FriendRecord>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response.clone()
        }
    }

    fn lookup(response: Result<Vec<FriendRecord>, FetchError>) -> FriendLookup<StubSource> {
        FriendLookup::new(StubSource::new(response))
    }

    #[test]
    fn blank_input_is_rejected_without_fetching() {
        for raw in ["", "   ", "\t\n"] {
            let lookup = lookup(Ok(vec![json!({"id": 1})]));
            let outcome = lookup.handle(raw);
            assert_eq!(outcome.error.as_deref(), Some("Please enter a Roblox user ID."));
            assert!(outcome.friends.is_empty());
            assert_eq!(lookup.source().calls(), 0);
        }
    }

    #[test]
    fn non_numeric_input_is_rejected_without_fetching() {
        for raw in ["abc", "12a", "-5", "1.0", "１２", "4 2"] {
            let lookup = lookup(Ok(vec![json!({"id": 1})]));
            let outcome = lookup.handle(raw);
            assert_eq!(
                outcome.error.as_deref(),
                Some("The Roblox user ID must be a number."),
                "input {raw:?}"
            );
            assert_eq!(lookup.source().calls(), 0);
        }
    }

    #[test]
    fn trims_and_echoes_identifier() {
        let lookup = lookup(Ok(vec![json!({"id": 9})]));
        let outcome = lookup.handle("  156 ");
        assert_eq!(outcome.user_id, "156");
        assert_eq!(outcome.error, None);
        assert_eq!(lookup.source().calls(), 1);
    }

    #[test]
    fn empty_list_reports_no_friends() {
        let outcome = lookup(Ok(Vec::new())).handle("1");
        assert!(outcome.friends.is_empty());
        assert_eq!(outcome.error.as_deref(), Some(NO_FRIENDS_MESSAGE));
    }

    #[test]
    fn returns_fetched_records() {
        let friends = vec![json!({"id": 1}), json!({"id": 2})];
        let outcome = lookup(Ok(friends.clone())).handle("1");
        assert_eq!(outcome.friends, friends);
        assert_eq!(outcome.error, None);
    }

    #[test]
    fn application_error_surfaces_message() {
        let outcome = lookup(Err(FetchError::Application("rate limited".into()))).handle("1");
        assert_eq!(outcome.error.as_deref(), Some("rate limited"));
        assert!(outcome.friends.is_empty());
    }

    #[test]
    fn classifies_fetch_errors() {
        assert_eq!(
            describe_fetch_error(&FetchError::HttpStatus(404)),
            USER_NOT_FOUND_MESSAGE
        );
        for status in [400, 429, 500, 503] {
            assert_eq!(
                describe_fetch_error(&FetchError::HttpStatus(status)),
                FETCH_FAILED_MESSAGE
            );
        }
        assert_eq!(
            describe_fetch_error(&FetchError::Transport("timed out".into())),
            UNREACHABLE_MESSAGE
        );
        assert_eq!(
            describe_fetch_error(&FetchError::Application(String::new())),
            GENERIC_API_ERROR
        );
    }
}
