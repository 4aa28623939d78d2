//! Error taxonomy shared by the API clients and the view controller.

use thiserror::Error;

pub type Result<T, E = DashboardError> = std::result::Result<T, E>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DashboardError {
    /// Input rejected locally; never reaches the network.
    #[error("{0}")]
    Validation(String),

    /// A call that needs a session was made without a token.
    #[error("No authentication token found")]
    NotAuthenticated,

    /// Login failed. Wrong password and server failure are deliberately not told apart.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The server answered 401. The session must be invalidated by the caller.
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Request failed: {0}")]
    NetworkOrServer(String),
}

impl DashboardError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// Message suitable for showing next to the affected panel.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::NotAuthenticated | Self::Unauthorized => {
                "Please log in to view this data.".to_string()
            }
            Self::AuthenticationFailed(_) => {
                "Invalid username or password. Please try again.".to_string()
            }
            Self::NetworkOrServer(_) => {
                "Error fetching weather data. Please check the city name and try again."
                    .to_string()
            }
        }
    }
}

impl From<reqwest::Error> for DashboardError {
    fn from(err: reqwest::Error) -> Self {
        Self::NetworkOrServer(err.to_string())
    }
}
