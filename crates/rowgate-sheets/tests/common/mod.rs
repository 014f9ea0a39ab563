use std::sync::OnceLock;

use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde_json::json;

pub const CLIENT_EMAIL: &str = "rowgate@test-project.iam.gserviceaccount.com";
pub const PRIVATE_KEY_ID: &str = "0123456789abcdef";

pub struct TestKey {
    pub private_pem: String,
    pub public_pem: String,
}

/// A throwaway RSA key shared by every test in the binary.
pub fn test_key() -> &'static TestKey {
    static KEY: OnceLock<TestKey> = OnceLock::new();
    KEY.get_or_init(|| {
        let private = RsaPrivateKey::new(&mut rand::rngs::OsRng, 2048).expect("generate key");
        let public = RsaPublicKey::from(&private);
        TestKey {
            private_pem: private
                .to_pkcs8_pem(LineEnding::LF)
                .expect("encode private key")
                .to_string(),
            public_pem: public
                .to_public_key_pem(LineEnding::LF)
                .expect("encode public key"),
        }
    })
}

/// Service account key JSON in the format Google issues.
pub fn service_account_json(token_uri: &str) -> String {
    json!({
        "type": "service_account",
        "project_id": "test-project",
        "private_key_id": PRIVATE_KEY_ID,
        "private_key": test_key().private_pem,
        "client_email": CLIENT_EMAIL,
        "client_id": "1234567890",
        "token_uri": token_uri,
    })
    .to_string()
}
