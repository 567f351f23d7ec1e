use std::collections::HashMap;

use serde::Serialize;

use crate::config::AuthConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: String,
}

/// Resolves a bearer token to the user it belongs to.
pub trait AuthService: Send + Sync {
    fn name(&self) -> &str;

    fn authenticate(&self, token: &str) -> Option<User>;
}

/// Fixed token table from configuration.
pub struct StaticTokenAuth {
    tokens: HashMap<String, String>,
}

impl StaticTokenAuth {
    pub fn new(tokens: HashMap<String, String>) -> Self {
        StaticTokenAuth { tokens }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        if config.tokens.is_empty() {
            log::warn!("No auth tokens configured; every API call will be rejected");
        }
        Self::new(config.tokens.clone())
    }
}

impl AuthService for StaticTokenAuth {
    fn name(&self) -> &str {
        "static-token"
    }

    fn authenticate(&self, token: &str) -> Option<User> {
        self.tokens.get(token).map(|id| User { id: id.clone() })
    }
}

/// Token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
