//! `Authorization: Bearer <token>` parsing shared by the HTTP and gRPC gates.

use crate::auth::claims::PayloadClaims;
use crate::auth::codec::TokenCodec;
use crate::errors::GatewayError;

/// Header (HTTP) and metadata key (gRPC) carrying the credential.
pub const AUTHORIZATION_HEADER: &str = "authorization";

/// Only supported scheme, compared case-insensitively.
pub const BEARER_SCHEME: &str = "bearer";

/// Extract the token from an authorization value.
///
/// `None` means the header was absent or not valid ASCII. A blank value
/// counts as absent.
pub fn extract_bearer_token(value: Option<&str>) -> Result<&str, GatewayError> {
    let value = value
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| {
            GatewayError::MalformedHeader("authorization header is not provided".to_string())
        })?;

    let mut fields = value.split_whitespace();
    let (scheme, token) = match (fields.next(), fields.next()) {
        (Some(scheme), Some(token)) => (scheme, token),
        _ => {
            return Err(GatewayError::MalformedHeader(
                "invalid authorization header format".to_string(),
            ))
        }
    };

    let scheme = scheme.to_lowercase();
    if scheme != BEARER_SCHEME {
        return Err(GatewayError::UnsupportedScheme(scheme));
    }

    Ok(token)
}

/// Parse the authorization value and verify the token it carries.
pub fn authenticate(
    codec: &dyn TokenCodec,
    value: Option<&str>,
) -> Result<PayloadClaims, GatewayError> {
    let token = extract_bearer_token(value)?;
    codec.verify(token).map_err(GatewayError::from)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_token() {
        assert_eq!(extract_bearer_token(Some("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_scheme_is_case_insensitive() {
        assert_eq!(extract_bearer_token(Some("bearer t")).unwrap(), "t");
        assert_eq!(extract_bearer_token(Some("BEARER t")).unwrap(), "t");
        assert_eq!(extract_bearer_token(Some("BeArEr t")).unwrap(), "t");
    }

    #[test]
    fn test_extra_whitespace_is_tolerated() {
        assert_eq!(extract_bearer_token(Some("  Bearer \t tok  ")).unwrap(), "tok");
    }

    #[test]
    fn test_trailing_fields_are_ignored() {
        assert_eq!(extract_bearer_token(Some("Bearer tok extra")).unwrap(), "tok");
    }

    #[test]
    fn test_missing_header() {
        let err = extract_bearer_token(None).unwrap_err();
        assert!(matches!(err, GatewayError::MalformedHeader(msg) if msg.contains("not provided")));
    }

    #[test]
    fn test_blank_header_is_missing() {
        for value in ["", "   ", "\t"] {
            let err = extract_bearer_token(Some(value)).unwrap_err();
            assert!(
                matches!(err, GatewayError::MalformedHeader(ref msg) if msg == "authorization header is not provided"),
                "{value:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_scheme_without_token() {
        for value in ["Bearer", "Bearer   "] {
            let err = extract_bearer_token(Some(value)).unwrap_err();
            assert!(
                matches!(err, GatewayError::MalformedHeader(ref msg) if msg.contains("format")),
                "{value:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_wrong_scheme() {
        let err = extract_bearer_token(Some("Basic xyz")).unwrap_err();
        assert!(matches!(err, GatewayError::UnsupportedScheme(s) if s == "basic"));

        let err = extract_bearer_token(Some("Token xyz")).unwrap_err();
        assert!(matches!(err, GatewayError::UnsupportedScheme(s) if s == "token"));
    }
}
