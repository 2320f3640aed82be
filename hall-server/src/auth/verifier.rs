//! Identity verification boundary
//!
//! The external identity provider is specified only at this seam: given
//! a bearer credential, produce a stable user identifier or fail. The
//! shipped implementation is a static token map from configuration;
//! production deployments plug a real provider in behind the trait.

use async_trait::async_trait;
use shared::{AppError, AppResult};
use std::collections::HashMap;

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Map a bearer credential to a stable uid
    async fn verify(&self, bearer: &str) -> AppResult<String>;
}

/// Token -> uid map loaded from configuration
pub struct StaticTokenVerifier {
    tokens: HashMap<String, String>,
}

impl StaticTokenVerifier {
    pub fn new(tokens: HashMap<String, String>) -> Self {
        Self { tokens }
    }

    /// Build from `token:uid` pairs (the `AUTH_TOKENS` config format)
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            tokens: pairs.iter().cloned().collect(),
        }
    }
}

#[async_trait]
impl IdentityVerifier for StaticTokenVerifier {
    async fn verify(&self, bearer: &str) -> AppResult<String> {
        self.tokens
            .get(bearer)
            .cloned()
            .ok_or_else(|| AppError::invalid_token("Unknown bearer token"))
    }
}
