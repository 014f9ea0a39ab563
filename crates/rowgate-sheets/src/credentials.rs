//! Service account key loading.
//!
//! Accepts the JSON key file Google issues for service accounts. Only the
//! fields needed for the JWT bearer flow are read; the rest are ignored.

use std::fmt;
use std::path::Path;

use jsonwebtoken::EncodingKey;
use serde::Deserialize;

use crate::error::SheetsError;

/// Token endpoint used when the key file does not carry one.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const SERVICE_ACCOUNT_TYPE: &str = "service_account";

#[derive(Deserialize)]
struct ServiceAccountInfo {
    #[serde(rename = "type", default)]
    key_type: Option<String>,
    client_email: String,
    private_key: String,
    #[serde(default)]
    private_key_id: Option<String>,
    #[serde(default)]
    token_uri: Option<String>,
    #[serde(default)]
    project_id: Option<String>,
}

/// A parsed service account key with its signing key ready for use.
#[derive(Clone)]
pub struct ServiceAccountKey {
    client_email: String,
    private_key_id: Option<String>,
    token_uri: String,
    project_id: Option<String>,
    encoding_key: EncodingKey,
}

impl ServiceAccountKey {
    /// Parses a key from its JSON representation.
    ///
    /// # Errors
    ///
    /// Returns `SheetsError::Credentials` if the JSON is malformed, the key is
    /// not a service account key, or the private key is not a valid RSA PEM.
    pub fn from_json(json: &str) -> Result<Self, SheetsError> {
        let info: ServiceAccountInfo = serde_json::from_str(json)
            .map_err(|e| SheetsError::credentials(format!("malformed key JSON: {e}")))?;

        if let Some(kind) = info.key_type.as_deref() {
            if kind != SERVICE_ACCOUNT_TYPE {
                return Err(SheetsError::credentials(format!(
                    "expected key type '{SERVICE_ACCOUNT_TYPE}', got '{kind}'"
                )));
            }
        }
        if info.client_email.trim().is_empty() {
            return Err(SheetsError::credentials("client_email is empty"));
        }

        let encoding_key = EncodingKey::from_rsa_pem(info.private_key.as_bytes())
            .map_err(|e| SheetsError::credentials(format!("invalid private_key: {e}")))?;

        Ok(Self {
            client_email: info.client_email,
            private_key_id: info.private_key_id,
            token_uri: info
                .token_uri
                .filter(|uri| !uri.is_empty())
                .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string()),
            project_id: info.project_id,
            encoding_key,
        })
    }

    /// Reads and parses a key file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SheetsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            SheetsError::credentials(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    pub fn client_email(&self) -> &str {
        &self.client_email
    }

    pub fn private_key_id(&self) -> Option<&str> {
        self.private_key_id.as_deref()
    }

    pub fn token_uri(&self) -> &str {
        &self.token_uri
    }

    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    pub(crate) fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .field("project_id", &self.project_id)
            .finish_non_exhaustive()
    }
}
