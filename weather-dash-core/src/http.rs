//! Request decoration and response handling shared by the API clients.

use std::{fmt::Debug, sync::Arc, time::Duration};

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::{
    error::{DashboardError, Result},
    session::SharedSession,
};

/// Hook applied to every outgoing request, installed when a client is built.
pub trait RequestDecorator: Send + Sync + Debug {
    fn decorate(&self, request: RequestBuilder) -> RequestBuilder;
}

/// Adds `Authorization: Bearer <token>` whenever the session holds a token.
/// Without a token the request is sent as-is; the server decides.
#[derive(Debug, Clone)]
pub struct BearerAuth {
    session: SharedSession,
}

impl BearerAuth {
    pub fn new(session: SharedSession) -> Self {
        Self { session }
    }
}

impl RequestDecorator for BearerAuth {
    fn decorate(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session.get() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

/// Applies each decorator in order.
#[derive(Debug, Clone, Default)]
pub struct DecoratorChain {
    decorators: Vec<Arc<dyn RequestDecorator>>,
}

impl DecoratorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, decorator: impl RequestDecorator + 'static) -> Self {
        self.decorators.push(Arc::new(decorator));
        self
    }

    pub fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        self.decorators.iter().fold(request, |req, d| d.decorate(req))
    }
}

pub fn build_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder().timeout(timeout).build()?)
}

pub fn join_url(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Maps status codes onto the error taxonomy and decodes the body on success.
pub async fn read_json<T: DeserializeOwned>(res: Response, what: &str) -> Result<T> {
    let status = res.status();
    let body = res
        .text()
        .await
        .map_err(|e| DashboardError::NetworkOrServer(format!("Failed to read {what} body: {e}")))?;

    if status == StatusCode::UNAUTHORIZED {
        return Err(DashboardError::Unauthorized);
    }

    if !status.is_success() {
        return Err(DashboardError::NetworkOrServer(format!(
            "{what} request failed with status {}: {}",
            status,
            truncate_body(&body),
        )));
    }

    serde_json::from_str(&body)
        .map_err(|e| DashboardError::NetworkOrServer(format!("Failed to parse {what} JSON: {e}")))
}

pub fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
