//! Reqwest-backed Google ID token verifier.
//!
//! This adapter owns transport details only: calling Google's `tokeninfo`
//! endpoint, HTTP error mapping, and decoding the claims the domain needs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use tracing::warn;

use crate::domain::ports::{GoogleClaims, GoogleTokenVerifier, TokenVerificationError};

const DEFAULT_TOKENINFO_ENDPOINT: &str = "https://oauth2.googleapis.com/tokeninfo";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Subset of the tokeninfo response the domain cares about.
#[derive(Debug, Deserialize)]
struct TokenInfoDto {
    email: Option<String>,
    email_verified: Option<String>,
    picture: Option<String>,
    aud: Option<String>,
}

/// Verifier that delegates to Google's `tokeninfo` endpoint.
///
/// When a client id is configured, tokens minted for a different OAuth
/// client are refused. Without one, the audience is logged and accepted,
/// which keeps local development working before credentials exist.
pub struct HttpGoogleTokenVerifier {
    client: Client,
    endpoint: Url,
    expected_client_id: Option<String>,
}

impl HttpGoogleTokenVerifier {
    /// Build a verifier against the production endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(expected_client_id: Option<String>) -> Result<Self, reqwest::Error> {
        let endpoint = Url::parse(DEFAULT_TOKENINFO_ENDPOINT).expect("static endpoint URL");
        Self::with_endpoint(endpoint, expected_client_id)
    }

    /// Build a verifier against an explicit endpoint, used by tests.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn with_endpoint(
        endpoint: Url,
        expected_client_id: Option<String>,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(DEFAULT_REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint,
            expected_client_id,
        })
    }

    fn check_audience(&self, audience: Option<&str>) -> Result<(), TokenVerificationError> {
        match (&self.expected_client_id, audience) {
            (Some(expected), Some(aud)) if expected != aud => {
                Err(TokenVerificationError::AudienceMismatch)
            }
            (Some(_), None) => Err(TokenVerificationError::AudienceMismatch),
            (None, aud) => {
                if let Some(aud) = aud {
                    warn!(audience = aud, "no OAuth client id configured, accepting any audience");
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl GoogleTokenVerifier for HttpGoogleTokenVerifier {
    async fn verify(&self, id_token: &str) -> Result<GoogleClaims, TokenVerificationError> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[("id_token", id_token)])
            .send()
            .await
            .map_err(|err| TokenVerificationError::unavailable(err.to_string()))?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            return Err(TokenVerificationError::rejected("token invalid or expired"));
        }
        if !status.is_success() {
            return Err(TokenVerificationError::unavailable(format!(
                "tokeninfo returned {status}"
            )));
        }

        let dto: TokenInfoDto = response
            .json()
            .await
            .map_err(|err| TokenVerificationError::unavailable(err.to_string()))?;

        self.check_audience(dto.aud.as_deref())?;

        if dto.email_verified.as_deref() != Some("true") {
            return Err(TokenVerificationError::rejected("email not verified"));
        }
        let email = dto
            .email
            .ok_or_else(|| TokenVerificationError::rejected("token carries no email claim"))?;

        Ok(GoogleClaims {
            email,
            picture: dto.picture,
            audience: dto.aud,
        })
    }
}
