//! Conversions from external infrastructure errors into domain errors.

use privacyguard_domain::PrivacyGuardError;
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub PrivacyGuardError);

impl From<InfraError> for PrivacyGuardError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<PrivacyGuardError> for InfraError {
    fn from(value: PrivacyGuardError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoDomainError {
    fn into_domain(self) -> PrivacyGuardError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → PrivacyGuardError */
/* -------------------------------------------------------------------------- */

impl IntoDomainError for HttpError {
    fn into_domain(self) -> PrivacyGuardError {
        if self.is_timeout() {
            return PrivacyGuardError::Network("HTTP request timed out".into());
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return PrivacyGuardError::Network(format!("HTTP connection failure: {self}"));
        }

        if self.is_builder() {
            return PrivacyGuardError::InvalidInput(format!("invalid HTTP request: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => PrivacyGuardError::Auth(message),
                404 => PrivacyGuardError::NotFound(message),
                400..=499 => PrivacyGuardError::InvalidInput(message),
                _ => PrivacyGuardError::Network(message),
            };
        }

        PrivacyGuardError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_domain())
    }
}

/* -------------------------------------------------------------------------- */
/* url::ParseError → PrivacyGuardError */
/* -------------------------------------------------------------------------- */

impl IntoDomainError for url::ParseError {
    fn into_domain(self) -> PrivacyGuardError {
        PrivacyGuardError::Config(format!("invalid API base URL: {self}"))
    }
}

impl From<url::ParseError> for InfraError {
    fn from(value: url::ParseError) -> Self {
        InfraError(value.into_domain())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
