//! OAuth 1.0a request signing and the three-legged handshake
//!
//! The handshake runs in three calls:
//!
//! 1. [`OAuthClient::request_token`] obtains a temporary request token
//! 2. [`OAuthClient::authorization_url`] is shown to the user, who returns a PIN
//! 3. [`OAuthClient::access_token`] trades the PIN for a long-lived token pair
//!
//! Every signed request uses HMAC-SHA1 as described in RFC 5849.

use std::collections::{BTreeMap, HashMap};
use std::time::{SystemTime, UNIX_EPOCH};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rand::RngCore;
use reqwest::Client;
use sha1::Sha1;
use url::Url;

use crate::error::{ConfigError, Result, SocialError};
use crate::http::{map_http_failure, map_transport_error};

/// RFC 3986 unreserved characters stay as-is; everything else is encoded.
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Out-of-band callback: the platform shows the user a PIN instead of redirecting
pub const OOB_CALLBACK: &str = "oob";

/// Temporary token from the first handshake step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestToken {
    pub token: String,
    pub token_secret: String,
    pub callback_confirmed: bool,
}

/// Long-lived user token pair from the final handshake step
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub token_secret: String,
    pub user_id: Option<String>,
    pub screen_name: Option<String>,
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &self.token)
            .field("token_secret", &"[REDACTED]")
            .field("user_id", &self.user_id)
            .field("screen_name", &self.screen_name)
            .finish()
    }
}

/// Signs requests with the application's consumer key pair
#[derive(Clone)]
pub struct OAuthSigner {
    consumer_key: String,
    consumer_secret: String,
}

impl std::fmt::Debug for OAuthSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthSigner")
            .field("consumer_key", &self.consumer_key)
            .finish_non_exhaustive()
    }
}

impl OAuthSigner {
    pub fn new(consumer_key: impl Into<String>, consumer_secret: impl Into<String>) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
        }
    }

    /// Build the `Authorization` header for a request
    ///
    /// # Arguments
    ///
    /// * `method` - HTTP method
    /// * `url` - Full request URL; query parameters are included in the signature
    /// * `params` - Extra parameters. Keys starting with `oauth_` are sent in the
    ///   header; the rest (form body fields) are only signed.
    /// * `token` - User token and secret, if the request acts on behalf of a user
    pub fn authorization_header(
        &self,
        method: &str,
        url: &str,
        params: &[(&str, &str)],
        token: Option<(&str, &str)>,
    ) -> Result<String> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs().to_string())
            .unwrap_or_else(|_| "0".to_string());

        self.authorization_header_at(method, url, params, token, &timestamp, &generate_nonce())
    }

    fn authorization_header_at(
        &self,
        method: &str,
        url: &str,
        params: &[(&str, &str)],
        token: Option<(&str, &str)>,
        timestamp: &str,
        nonce: &str,
    ) -> Result<String> {
        let mut oauth_params: BTreeMap<String, String> = BTreeMap::new();
        oauth_params.insert("oauth_consumer_key".to_string(), self.consumer_key.clone());
        oauth_params.insert("oauth_nonce".to_string(), nonce.to_string());
        oauth_params.insert("oauth_signature_method".to_string(), "HMAC-SHA1".to_string());
        oauth_params.insert("oauth_timestamp".to_string(), timestamp.to_string());
        oauth_params.insert("oauth_version".to_string(), "1.0".to_string());

        if let Some((t, _)) = token {
            oauth_params.insert("oauth_token".to_string(), t.to_string());
        }

        for (k, v) in params {
            oauth_params.insert((*k).to_string(), (*v).to_string());
        }

        let base = signature_base(method, url, &oauth_params)?;
        let signature = self.signature(&base, token.map(|(_, s)| s).unwrap_or(""))?;
        oauth_params.insert("oauth_signature".to_string(), signature);

        // Body parameters were only needed for the signature
        oauth_params.retain(|k, _| k.starts_with("oauth_"));

        let header = oauth_params
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(format!("OAuth {}", header))
    }

    fn signature(&self, base: &str, token_secret: &str) -> Result<String> {
        let signing_key = format!(
            "{}&{}",
            percent_encode(&self.consumer_secret),
            percent_encode(token_secret)
        );

        let mut mac = Hmac::<Sha1>::new_from_slice(signing_key.as_bytes())
            .map_err(|e| SocialError::RemoteFailure(format!("OAuth signing failed: {}", e)))?;
        mac.update(base.as_bytes());

        Ok(BASE64.encode(mac.finalize().into_bytes()))
    }
}

/// Signature base string: METHOD&encoded-base-url&encoded-sorted-params
fn signature_base(method: &str, url: &str, params: &BTreeMap<String, String>) -> Result<String> {
    let parsed = Url::parse(url).map_err(|e| ConfigError::InvalidValue {
        field: "url".to_string(),
        reason: format!("'{}': {}", url, e),
    })?;

    let mut base_url = format!(
        "{}://{}",
        parsed.scheme(),
        parsed.host_str().unwrap_or_default()
    );
    if let Some(port) = parsed.port() {
        base_url.push_str(&format!(":{}", port));
    }
    base_url.push_str(parsed.path());

    let mut all_params: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    for (k, v) in parsed.query_pairs() {
        all_params.push((percent_encode(&k), percent_encode(&v)));
    }
    all_params.sort();

    let param_string = all_params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    Ok(format!(
        "{}&{}&{}",
        method.to_uppercase(),
        percent_encode(&base_url),
        percent_encode(&param_string)
    ))
}

/// Percent-encode a string according to RFC 3986
pub fn percent_encode(s: &str) -> String {
    utf8_percent_encode(s, OAUTH_ENCODE_SET).to_string()
}

fn generate_nonce() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Three-legged OAuth 1.0a handshake against one provider
#[derive(Debug, Clone)]
pub struct OAuthClient {
    signer: OAuthSigner,
    http: Client,
    base_url: String,
}

impl OAuthClient {
    /// * `base_url` - Provider root; endpoints live under `/oauth/`
    pub fn new(signer: OAuthSigner, http: Client, base_url: impl Into<String>) -> Self {
        Self {
            signer,
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/oauth/{}", self.base_url, name)
    }

    /// Step 1: obtain a request token using the out-of-band callback
    pub async fn request_token(&self) -> Result<RequestToken> {
        let url = self.endpoint("request_token");
        let header = self.signer.authorization_header(
            "POST",
            &url,
            &[("oauth_callback", OOB_CALLBACK)],
            None,
        )?;

        tracing::debug!("Requesting OAuth request token from {}", url);
        let body = self.post_signed(&url, header, "Failed to get request token").await?;
        parse_request_token(&body)
    }

    /// Step 2: URL the user opens to authorize the application
    pub fn authorization_url(&self, request_token: &RequestToken) -> String {
        format!(
            "{}?oauth_token={}",
            self.endpoint("authorize"),
            percent_encode(&request_token.token)
        )
    }

    /// Step 3: exchange the user's verifier (PIN) for an access token pair
    pub async fn access_token(
        &self,
        request_token: &RequestToken,
        verifier: &str,
    ) -> Result<AccessToken> {
        let url = self.endpoint("access_token");
        let header = self.signer.authorization_header(
            "POST",
            &url,
            &[("oauth_verifier", verifier)],
            Some((request_token.token.as_str(), request_token.token_secret.as_str())),
        )?;

        tracing::debug!("Exchanging OAuth verifier at {}", url);
        let body = self.post_signed(&url, header, "Failed to get access token").await?;
        parse_access_token(&body)
    }

    async fn post_signed(&self, url: &str, header: String, context: &str) -> Result<String> {
        let response = self
            .http
            .post(url)
            .header(reqwest::header::AUTHORIZATION, header)
            .send()
            .await
            .map_err(|e| map_transport_error(e, context))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| map_transport_error(e, context))?;

        if !status.is_success() {
            return Err(map_http_failure(status, &body, context));
        }

        Ok(body)
    }
}

fn parse_form(body: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(body.trim().as_bytes())
        .into_owned()
        .collect()
}

fn required(params: &HashMap<String, String>, key: &str, context: &str) -> Result<String> {
    params
        .get(key)
        .filter(|v| !v.is_empty())
        .cloned()
        .ok_or_else(|| SocialError::RemoteFailure(format!("{}: response is missing {}", context, key)))
}

fn parse_request_token(body: &str) -> Result<RequestToken> {
    let params = parse_form(body);
    let context = "Failed to get request token";

    Ok(RequestToken {
        token: required(&params, "oauth_token", context)?,
        token_secret: required(&params, "oauth_token_secret", context)?,
        callback_confirmed: params
            .get("oauth_callback_confirmed")
            .map(|v| v == "true")
            .unwrap_or(false),
    })
}

fn parse_access_token(body: &str) -> Result<AccessToken> {
    let params = parse_form(body);
    let context = "Failed to get access token";

    Ok(AccessToken {
        token: required(&params, "oauth_token", context)?,
        token_secret: required(&params, "oauth_token_secret", context)?,
        user_id: params.get("user_id").cloned(),
        screen_name: params.get("screen_name").cloned(),
    })
}
