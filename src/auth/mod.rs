use reqwest::RequestBuilder;

/// Header carrying the platform auth token.
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// Request credential that attaches a fixed token to outgoing calls.
/// Stateless at call time; construct a new value per token.
#[derive(Debug, Clone)]
pub struct TokenAuth {
    token: String,
}

impl TokenAuth {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Attach the token header to an outgoing request.
    pub fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(AUTH_TOKEN_HEADER, &self.token)
    }
}
