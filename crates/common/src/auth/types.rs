//! Credential types

use std::fmt;

use privacyguard_domain::TokenResponse;
use serde::{Deserialize, Serialize};

/// Access/refresh credential pair.
///
/// The two values are only ever stored, replaced or cleared together. Both
/// are opaque strings; nothing here inspects or validates their contents.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl CredentialPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self { access_token: access_token.into(), refresh_token: refresh_token.into() }
    }
}

impl From<TokenResponse> for CredentialPair {
    fn from(response: TokenResponse) -> Self {
        Self { access_token: response.access_token, refresh_token: response.refresh_token }
    }
}

// Credentials must never reach logs.
impl fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}
