//! HTTP plumbing shared by the OAuth handshake and platform clients

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::error::{Result, SocialError};

/// Build the HTTP client used for every remote call
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(format!("socialmedia-cli/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| SocialError::RemoteFailure(format!("Failed to build HTTP client: {}", e)))
}

/// Map a transport-level failure (no HTTP response) into the error taxonomy
pub fn map_transport_error(error: reqwest::Error, context: &str) -> SocialError {
    if error.is_timeout() {
        SocialError::RemoteFailure(format!("Timed out during {}: {}", context, error))
    } else if error.is_connect() {
        SocialError::RemoteFailure(format!(
            "Network error during {}: {}. Check your internet connection.",
            context, error
        ))
    } else {
        SocialError::RemoteFailure(format!("Request failed during {}: {}", context, error))
    }
}

/// Map a non-success HTTP response into the error taxonomy
///
/// - 401 → `SocialError::Unauthenticated`
/// - 403 → `SocialError::Unauthenticated` only when the body names an auth
///   problem (see [`is_auth_rejection`]); validation rejections such as
///   duplicate content stay `SocialError::RemoteFailure`
/// - anything else → `SocialError::RemoteFailure`
///
/// The remote error message is kept so the user sees what the platform said.
pub fn map_http_failure(status: StatusCode, body: &str, context: &str) -> SocialError {
    let message = remote_message(body);
    let rejected = status == StatusCode::UNAUTHORIZED
        || (status == StatusCode::FORBIDDEN && is_auth_rejection(body));

    match status {
        _ if rejected => SocialError::Unauthenticated(format!(
            "{} ({}): {}",
            context,
            status.as_u16(),
            message
        )),
        StatusCode::TOO_MANY_REQUESTS => SocialError::RemoteFailure(format!(
            "{} ({}): rate limit exceeded: {}",
            context,
            status.as_u16(),
            message
        )),
        _ => SocialError::RemoteFailure(format!("{} ({}): {}", context, status.as_u16(), message)),
    }
}

/// v1.1 error codes for bad or revoked credentials
const AUTH_ERROR_CODES: &[i64] = &[32, 89, 215];

/// v2 problem types that describe the caller's credentials, not the request
const AUTH_PROBLEM_TYPES: &[&str] = &[
    "unsupported-authentication",
    "client-forbidden",
    "not-authorized-for-resource",
];

/// Whether an error body says the credentials themselves were refused
///
/// Twitter answers 403 both for auth problems and for rejected content, so
/// the status alone is not enough.
pub fn is_auth_rejection(body: &str) -> bool {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return false;
    };

    let v1_code = value
        .get("errors")
        .and_then(Value::as_array)
        .map(|errors| {
            errors
                .iter()
                .filter_map(|e| e.get("code").and_then(Value::as_i64))
                .any(|code| AUTH_ERROR_CODES.contains(&code))
        })
        .unwrap_or(false);

    let v2_type = value
        .get("type")
        .and_then(Value::as_str)
        .map(|t| AUTH_PROBLEM_TYPES.iter().any(|p| t.ends_with(p)))
        .unwrap_or(false);

    v1_code || v2_type
}

/// Extract a human-readable message from an error body
///
/// Understands the v1.1 `{"errors":[{"message":..}]}` shape and the v2
/// problem shape (`detail`/`title`); otherwise returns the trimmed body.
pub fn remote_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        let from_errors = value
            .get("errors")
            .and_then(Value::as_array)
            .map(|errors| {
                errors
                    .iter()
                    .filter_map(|e| e.get("message").or_else(|| e.get("detail")))
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join("; ")
            })
            .filter(|m| !m.is_empty());

        if let Some(message) = from_errors {
            return message;
        }

        for field in ["detail", "title", "error"] {
            if let Some(message) = value.get(field).and_then(Value::as_str) {
                return message.to_string();
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        "no response body".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_message_v1_errors() {
        let body = r#"{"errors":[{"code":32,"message":"Could not authenticate you."}]}"#;
        assert_eq!(remote_message(body), "Could not authenticate you.");
    }

    #[test]
    fn test_remote_message_v2_problem() {
        let body = r#"{"title":"Unauthorized","type":"about:blank","status":401,"detail":"Unauthorized"}"#;
        assert_eq!(remote_message(body), "Unauthorized");

        let body = r#"{"title":"Forbidden","detail":"You are not allowed to create a Tweet with duplicate content."}"#;
        assert_eq!(
            remote_message(body),
            "You are not allowed to create a Tweet with duplicate content."
        );
    }

    #[test]
    fn test_remote_message_plain_text() {
        assert_eq!(remote_message("  Bad Gateway \n"), "Bad Gateway");
        assert_eq!(remote_message(""), "no response body");
    }

    #[test]
    fn test_unauthorized_maps_to_unauthenticated() {
        let err = map_http_failure(
            StatusCode::UNAUTHORIZED,
            r#"{"errors":[{"message":"Invalid or expired token."}]}"#,
            "post tweet",
        );
        match err {
            SocialError::Unauthenticated(msg) => {
                assert!(msg.contains("Invalid or expired token."));
                assert!(msg.contains("401"));
            }
            other => panic!("Expected Unauthenticated, got {:?}", other),
        }
    }

    #[test]
    fn test_forbidden_with_auth_body_maps_to_unauthenticated() {
        let v1 = r#"{"errors":[{"code":89,"message":"Invalid or expired token."}]}"#;
        assert!(matches!(
            map_http_failure(StatusCode::FORBIDDEN, v1, "post tweet"),
            SocialError::Unauthenticated(_)
        ));

        let v2 = r#"{"title":"Unsupported Authentication","type":"https://api.twitter.com/2/problems/unsupported-authentication","status":403,"detail":"Authenticating with OAuth 2.0 Application-Only is forbidden for this endpoint."}"#;
        assert!(matches!(
            map_http_failure(StatusCode::FORBIDDEN, v2, "post tweet"),
            SocialError::Unauthenticated(_)
        ));
    }

    #[test]
    fn test_forbidden_duplicate_content_is_remote_failure() {
        let body = r#"{"detail":"You are not allowed to create a Tweet with duplicate content."}"#;
        match map_http_failure(StatusCode::FORBIDDEN, body, "Failed to post tweet") {
            SocialError::RemoteFailure(msg) => {
                assert!(msg.contains("duplicate content"));
                assert!(msg.contains("403"));
            }
            other => panic!("Expected RemoteFailure, got {:?}", other),
        }
    }

    #[test]
    fn test_forbidden_without_body_is_remote_failure() {
        let err = map_http_failure(StatusCode::FORBIDDEN, "", "post tweet");
        assert!(matches!(err, SocialError::RemoteFailure(_)));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_is_auth_rejection() {
        assert!(is_auth_rejection(
            r#"{"errors":[{"code":32,"message":"Could not authenticate you."}]}"#
        ));
        assert!(!is_auth_rejection(
            r#"{"errors":[{"code":187,"message":"Status is a duplicate."}]}"#
        ));
        assert!(!is_auth_rejection(r#"{"type":"about:blank","detail":"Forbidden"}"#));
        assert!(!is_auth_rejection("Forbidden"));
    }

    #[test]
    fn test_other_statuses_map_to_remote_failure() {
        for status in [
            StatusCode::BAD_REQUEST,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::SERVICE_UNAVAILABLE,
        ] {
            let err = map_http_failure(status, "oops", "post tweet");
            match err {
                SocialError::RemoteFailure(msg) => assert!(msg.contains("oops")),
                other => panic!("Expected RemoteFailure for {}, got {:?}", status, other),
            }
        }
    }
}
