//! HTML front end for the friend lookup.

pub mod page;

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Form, Router,
};
use serde::Deserialize;
use tokio::net::TcpListener;

use crate::{FriendLookup, FriendSource, LookupOutcome, Result, ServerConfig, ToolkitError};

/// Shared state handed to the router.
pub struct AppState {
    lookup: FriendLookup<Arc<dyn FriendSource>>,
}

impl AppState {
    pub fn new(source: Arc<dyn FriendSource>) -> Self {
        Self {
            lookup: FriendLookup::new(source),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LookupForm {
    #[serde(default)]
    pub user_id: String,
}

/// Builds the single-route router serving the lookup form.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(show_form).post(submit_form))
        .with_state(state)
}

/// Binds `config.host:config.port` and serves until the process exits.
///
/// `source` should be constructed outside the async runtime when it wraps a
/// blocking HTTP client.
pub async fn serve(config: &ServerConfig, source: Arc<dyn FriendSource>) -> Result<()> {
    let address = config.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|err| ToolkitError::Server(format!("failed to bind {address}: {err}")))?;
    tracing::info!(%address, "friend lookup service listening");

    let app = router(Arc::new(AppState::new(source)));
    axum::serve(listener, app)
        .await
        .map_err(|err| ToolkitError::Server(err.to_string()))
}

async fn show_form() -> Html<String> {
    Html(page::render(&LookupOutcome::default()))
}

async fn submit_form(State(state): State<Arc<AppState>>, Form(form): Form<LookupForm>) -> Response {
    let lookup = state.lookup.clone();
    match tokio::task::spawn_blocking(move || lookup.handle(&form.user_id)).await {
        Ok(outcome) => Html(page::render(&outcome)).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "lookup task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "lookup failed").into_response()
        }
    }
}
