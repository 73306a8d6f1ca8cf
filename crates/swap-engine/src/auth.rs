use std::env;
use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{SecondsFormat, Utc};
use hmac::{Hmac, Mac};
use reqwest::header::{HeaderMap, HeaderValue, InvalidHeaderValue};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const API_KEY_VAR: &str = "OKX_API_KEY";
pub const API_SECRET_VAR: &str = "OKX_API_SECRET";
pub const API_PASSPHRASE_VAR: &str = "OKX_API_PASSPHRASE";

/// API credentials for the aggregator. Injected from the environment,
/// never part of the configuration file.
#[derive(Clone)]
pub struct Credentials {
    api_key: String,
    secret: String,
    passphrase: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials").field("api_key", &self.api_key).finish_non_exhaustive()
    }
}

impl Credentials {
    pub fn new(api_key: String, secret: String, passphrase: String) -> Self {
        Credentials { api_key, secret, passphrase }
    }

    /// Reads the three mandatory credential variables. Callers are expected
    /// to invoke this at startup, before any signed call is attempted.
    pub fn from_env() -> Result<Self, CredentialsError> {
        Ok(Credentials {
            api_key: require_var(API_KEY_VAR)?,
            secret: require_var(API_SECRET_VAR)?,
            passphrase: require_var(API_PASSPHRASE_VAR)?,
        })
    }

    /// Builds the signed header set for a request. The timestamp is generated
    /// here, at call time; `request_path` must be the exact path and query
    /// string sent on the wire since the signature covers it byte for byte.
    pub fn signed_headers(
        &self,
        method: &str,
        request_path: &str,
        body: &str,
    ) -> Result<HeaderMap, SignatureError> {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        self.signed_headers_at(&timestamp, method, request_path, body)
    }

    pub(crate) fn signed_headers_at(
        &self,
        timestamp: &str,
        method: &str,
        request_path: &str,
        body: &str,
    ) -> Result<HeaderMap, SignatureError> {
        let signature = sign(timestamp, method, request_path, body, &self.secret)?;

        // Lowercase header names: case-insensitive on the wire, and the
        // header map rejects uppercase static names.
        let mut headers = HeaderMap::new();
        headers.insert("ok-access-key", HeaderValue::from_str(&self.api_key)?);
        headers.insert("ok-access-passphrase", HeaderValue::from_str(&self.passphrase)?);
        headers.insert("ok-access-sign", HeaderValue::from_str(&signature)?);
        headers.insert("ok-access-timestamp", HeaderValue::from_str(timestamp)?);
        Ok(headers)
    }
}

/// `base64(HMAC-SHA256(timestamp + method + path + body, secret))`.
pub fn sign(
    timestamp: &str,
    method: &str,
    request_path: &str,
    body: &str,
    secret: &str,
) -> Result<String, SignatureError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| SignatureError::InvalidKeyLength)?;
    mac.update(timestamp.as_bytes());
    mac.update(method.as_bytes());
    mac.update(request_path.as_bytes());
    mac.update(body.as_bytes());
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

fn require_var(name: &'static str) -> Result<String, CredentialsError> {
    env::var(name).ok().filter(|value| !value.is_empty()).ok_or(CredentialsError::Missing(name))
}

#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("HMAC rejected the signing key")]
    InvalidKeyLength,

    #[error("Credential is not a valid header value: {0}")]
    InvalidHeaderValue(#[from] InvalidHeaderValue),
}

#[cfg(test)]
mod tests {
    use std::env;

    use serial_test::serial;

    use crate::auth::{
        sign, Credentials, CredentialsError, API_KEY_VAR, API_PASSPHRASE_VAR, API_SECRET_VAR,
    };

    const TIMESTAMP: &str = "2024-01-02T03:04:05.678Z";
    const QUOTE_PATH: &str =
        "/api/v5/dex/aggregator/quote?chainId=1&fromTokenAddress=0xa&toTokenAddress=0xb&amount=1";

    #[test]
    fn test_signature_matches_known_vector() {
        let signature = sign(TIMESTAMP, "GET", QUOTE_PATH, "", "test-secret").unwrap();
        assert_eq!(signature, "YOSetGafKRvr9Se6QjAwHYr4YhGfXUmhgIoUvWD2K4g=");

        let signature =
            sign("2024-01-01T00:00:00.000Z", "GET", "/api/v5/trade/order?ordId=abc", "", "secret")
                .unwrap();
        assert_eq!(signature, "vM/0BR24Gs2vfl0tDRt5aToLzfoBJgU3LHI71DhUaCw=");
    }

    #[test]
    fn test_signature_is_deterministic() {
        let first = sign(TIMESTAMP, "GET", QUOTE_PATH, "", "test-secret").unwrap();
        let second = sign(TIMESTAMP, "GET", QUOTE_PATH, "", "test-secret").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_any_input_change_changes_signature() {
        let base = sign(TIMESTAMP, "GET", QUOTE_PATH, "", "test-secret").unwrap();

        // One character difference in the signed path
        let mut other_path = QUOTE_PATH.to_string();
        other_path.pop();
        other_path.push('2');
        let changed_path = sign(TIMESTAMP, "GET", &other_path, "", "test-secret").unwrap();
        assert_eq!(changed_path, "KBh09YBGCU7spnMyATgC7cwiUDJUUFWZn9H0oc+90aE=");
        assert_ne!(base, changed_path);

        assert_ne!(base, sign("2024-01-02T03:04:05.679Z", "GET", QUOTE_PATH, "", "test-secret").unwrap());
        assert_ne!(base, sign(TIMESTAMP, "POST", QUOTE_PATH, "", "test-secret").unwrap());
        assert_ne!(base, sign(TIMESTAMP, "GET", QUOTE_PATH, "{}", "test-secret").unwrap());
        assert_ne!(base, sign(TIMESTAMP, "GET", QUOTE_PATH, "", "other-secret").unwrap());
    }

    #[test]
    fn test_signed_headers_carry_the_full_set() {
        let credentials = Credentials::new(
            "key".to_string(),
            "test-secret".to_string(),
            "passphrase".to_string(),
        );
        let headers = credentials.signed_headers_at(TIMESTAMP, "GET", QUOTE_PATH, "").unwrap();

        // Lookups are case insensitive; the upstream contract names them OK-ACCESS-*
        assert_eq!(headers.get("OK-ACCESS-KEY").unwrap(), "key");
        assert_eq!(headers.get("OK-ACCESS-PASSPHRASE").unwrap(), "passphrase");
        assert_eq!(headers.get("OK-ACCESS-TIMESTAMP").unwrap(), TIMESTAMP);
        assert_eq!(
            headers.get("OK-ACCESS-SIGN").unwrap(),
            "YOSetGafKRvr9Se6QjAwHYr4YhGfXUmhgIoUvWD2K4g="
        );
    }

    #[test]
    #[serial]
    fn test_from_env_requires_every_credential() {
        env::set_var(API_KEY_VAR, "key");
        env::set_var(API_SECRET_VAR, "secret");
        env::remove_var(API_PASSPHRASE_VAR);

        match Credentials::from_env() {
            Err(CredentialsError::Missing(name)) => assert_eq!(name, API_PASSPHRASE_VAR),
            other => panic!("Expected missing passphrase, got {:?}", other.map(|_| ())),
        }

        env::set_var(API_PASSPHRASE_VAR, "passphrase");
        assert!(Credentials::from_env().is_ok());

        env::remove_var(API_KEY_VAR);
        env::remove_var(API_SECRET_VAR);
        env::remove_var(API_PASSPHRASE_VAR);
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_empty_values() {
        env::set_var(API_KEY_VAR, "");
        env::set_var(API_SECRET_VAR, "secret");
        env::set_var(API_PASSPHRASE_VAR, "passphrase");

        assert!(matches!(
            Credentials::from_env(),
            Err(CredentialsError::Missing(name)) if name == API_KEY_VAR
        ));

        env::remove_var(API_KEY_VAR);
        env::remove_var(API_SECRET_VAR);
        env::remove_var(API_PASSPHRASE_VAR);
    }
}
