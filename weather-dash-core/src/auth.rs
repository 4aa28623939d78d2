use async_trait::async_trait;
use reqwest::Client;

use crate::{
    error::{DashboardError, Result},
    http::{BearerAuth, DecoratorChain, join_url, read_json},
    model::{TokenResponse, User},
    session::SharedSession,
};

#[async_trait]
pub trait AuthApi: Send + Sync + std::fmt::Debug {
    /// Exchange credentials for a bearer token and store it in the session.
    async fn login(&self, username: &str, password: &str) -> Result<TokenResponse>;

    /// Profile of the session's user. Does not clear the session on 401.
    async fn current_user(&self) -> Result<User>;

    fn logout(&self);

    fn is_authenticated(&self) -> bool;
}

#[derive(Debug, Clone)]
pub struct AuthClient {
    base_url: String,
    http: Client,
    session: SharedSession,
    decorators: DecoratorChain,
}

impl AuthClient {
    pub fn new(base_url: impl Into<String>, http: Client, session: SharedSession) -> Self {
        let decorators = DecoratorChain::new().with(BearerAuth::new(session.clone()));
        Self { base_url: base_url.into(), http, session, decorators }
    }

    pub fn token(&self) -> Option<String> {
        self.session.get()
    }
}

#[async_trait]
impl AuthApi for AuthClient {
    async fn login(&self, username: &str, password: &str) -> Result<TokenResponse> {
        let url = join_url(&self.base_url, "/auth/token");
        tracing::debug!(%username, "requesting access token");

        // Token endpoint is called undecorated: a stale token must not ride along.
        let res = self
            .http
            .post(url)
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .map_err(|e| DashboardError::AuthenticationFailed(e.to_string()))?;

        let token: TokenResponse = read_json(res, "token")
            .await
            .map_err(|e| DashboardError::AuthenticationFailed(e.to_string()))?;

        self.session.set(&token.access_token);
        tracing::info!(%username, "logged in");
        Ok(token)
    }

    async fn current_user(&self) -> Result<User> {
        if !self.session.is_present() {
            return Err(DashboardError::NotAuthenticated);
        }

        let url = join_url(&self.base_url, "/auth/users/me");
        let res = self.decorators.apply(self.http.get(url)).send().await?;

        read_json(res, "current user").await
    }

    fn logout(&self) {
        self.session.clear();
        tracing::info!("logged out");
    }

    fn is_authenticated(&self) -> bool {
        self.session.is_present()
    }
}
