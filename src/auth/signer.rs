//! Request Signing
//!
//! Builds the time-bound, HMAC-SHA256 signed WebSocket URL the speech service
//! expects. The signed string is:
//!
//! ```text
//! host: {host}
//! date: {rfc1123 date}
//! GET {path} HTTP/1.1
//! ```

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use ring::hmac;
use std::sync::Arc;
use url::Url;

use crate::data::{Credentials, Endpoint};
use crate::error::{GatewayError, GatewayResult};

/// HTTP date format used in the signed string and the `date` query parameter
const RFC1123_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// A signed connection URL. Valid only around `date`; sign again per session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequestUrl {
    pub host: String,
    pub path: String,
    pub authorization: String,
    pub date: String,
    pub url: String,
}

impl SignedRequestUrl {
    pub fn as_str(&self) -> &str {
        &self.url
    }
}

/// Signs connection URLs with a shared credential set
#[derive(Debug, Clone)]
pub struct AuthSigner {
    credentials: Arc<Credentials>,
}

impl AuthSigner {
    pub fn new(credentials: Arc<Credentials>) -> Self {
        Self { credentials }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Sign `endpoint` at `now`
    pub fn sign_at(&self, endpoint: &Endpoint, now: DateTime<Utc>) -> GatewayResult<SignedRequestUrl> {
        sign(&endpoint.host, &endpoint.path, &self.credentials, now)
    }

    /// Sign `endpoint` with the current clock
    pub fn sign_now(&self, endpoint: &Endpoint) -> GatewayResult<SignedRequestUrl> {
        self.sign_at(endpoint, Utc::now())
    }
}

/// Format a timestamp as an RFC 1123 HTTP date
pub fn rfc1123(now: DateTime<Utc>) -> String {
    now.format(RFC1123_FORMAT).to_string()
}

/// Build the signed URL for `host_base` + `path`
pub fn sign(
    host_base: &str,
    path: &str,
    credentials: &Credentials,
    now: DateTime<Utc>,
) -> GatewayResult<SignedRequestUrl> {
    credentials.validate()?;

    let base = Url::parse(host_base)
        .map_err(|e| GatewayError::Config(format!("invalid host {:?}: {}", host_base, e)))?;
    let host = authority(&base)
        .ok_or_else(|| GatewayError::Config(format!("host {:?} has no authority", host_base)))?;

    let date = rfc1123(now);
    let signature_origin = format!("host: {}\ndate: {}\nGET {} HTTP/1.1", host, date, path);

    let key = hmac::Key::new(hmac::HMAC_SHA256, credentials.api_secret.as_bytes());
    let tag = hmac::sign(&key, signature_origin.as_bytes());
    let signature = STANDARD.encode(tag.as_ref());

    let authorization_origin = format!(
        "api_key=\"{}\", algorithm=\"hmac-sha256\", headers=\"host date request-line\", signature=\"{}\"",
        credentials.api_key, signature
    );
    let authorization = STANDARD.encode(authorization_origin.as_bytes());

    let mut url = Url::parse(&format!("{}{}", host_base.trim_end_matches('/'), path))
        .map_err(|e| GatewayError::Config(format!("invalid path {:?}: {}", path, e)))?;
    url.query_pairs_mut()
        .append_pair("authorization", &authorization)
        .append_pair("date", &date)
        .append_pair("host", &host);

    Ok(SignedRequestUrl {
        host,
        path: path.to_string(),
        authorization,
        date,
        url: url.to_string(),
    })
}

/// Host plus explicit port, as sent in the `Host` header
fn authority(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
    }

    fn creds() -> Credentials {
        Credentials::new("app", "test-key", "test-secret")
    }

    #[test]
    fn test_rfc1123() {
        assert_eq!(rfc1123(fixed_time()), "Tue, 02 Jan 2024 03:04:05 GMT");
    }

    #[test]
    fn test_known_signature() {
        let signed = sign("wss://iat-api.xfyun.cn", "/v2/iat", &creds(), fixed_time()).unwrap();

        assert_eq!(signed.host, "iat-api.xfyun.cn");
        assert_eq!(signed.date, "Tue, 02 Jan 2024 03:04:05 GMT");

        let descriptor = String::from_utf8(STANDARD.decode(&signed.authorization).unwrap()).unwrap();
        assert_eq!(
            descriptor,
            "api_key=\"test-key\", algorithm=\"hmac-sha256\", headers=\"host date request-line\", \
             signature=\"sApoUklZJmWsmwk0Lt/dLBSYTfQ42FNnHMVRJdkUNHk=\""
        );
        assert_eq!(
            signed.url,
            "wss://iat-api.xfyun.cn/v2/iat?authorization=YXBpX2tleT0idGVzdC1rZXkiLCBhbGdvcml0aG09ImhtYWMtc2hhMjU2IiwgaGVhZGVycz0iaG9zdCBkYXRlIHJlcXVlc3QtbGluZSIsIHNpZ25hdHVyZT0ic0Fwb1VrbFpKbVdzbXdrMEx0L2RMQlNZVGZRNDJGTm5ITVZSSmRrVU5Iaz0i&date=Tue%2C+02+Jan+2024+03%3A04%3A05+GMT&host=iat-api.xfyun.cn"
        );
    }

    #[test]
    fn test_signing_is_deterministic() {
        let a = sign("wss://tts-api.xfyun.cn", "/v2/tts", &creds(), fixed_time()).unwrap();
        let b = sign("wss://tts-api.xfyun.cn", "/v2/tts", &creds(), fixed_time()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_timestamp_changes_authorization() {
        let a = sign("wss://tts-api.xfyun.cn", "/v2/tts", &creds(), fixed_time()).unwrap();
        let later = fixed_time() + chrono::Duration::seconds(1);
        let b = sign("wss://tts-api.xfyun.cn", "/v2/tts", &creds(), later).unwrap();
        assert_ne!(a.authorization, b.authorization);
        assert_ne!(a.date, b.date);
    }

    #[test]
    fn test_explicit_port_is_part_of_host() {
        let signed = sign("ws://127.0.0.1:9001", "/v2/iat", &creds(), fixed_time()).unwrap();
        assert_eq!(signed.host, "127.0.0.1:9001");
        assert!(signed.url.starts_with("ws://127.0.0.1:9001/v2/iat?"));
        assert!(signed.url.ends_with("&host=127.0.0.1%3A9001"));
    }

    #[test]
    fn test_missing_credentials() {
        let empty = Credentials::default();
        let err = sign("wss://iat-api.xfyun.cn", "/v2/iat", &empty, fixed_time()).unwrap_err();
        assert!(matches!(err, GatewayError::Config(_)));
    }

    #[test]
    fn test_invalid_host() {
        let err = sign("not a url", "/v2/iat", &creds(), fixed_time()).unwrap_err();
        assert!(matches!(err, GatewayError::Config(_)));
    }

    #[test]
    fn test_signer_uses_shared_credentials() {
        let signer = AuthSigner::new(Arc::new(creds()));
        let endpoint = Endpoint::new("wss://iat-api.xfyun.cn", "/v2/iat");
        let signed = signer.sign_at(&endpoint, fixed_time()).unwrap();
        let direct = sign(&endpoint.host, &endpoint.path, &creds(), fixed_time()).unwrap();
        assert_eq!(signed, direct);
    }
}
