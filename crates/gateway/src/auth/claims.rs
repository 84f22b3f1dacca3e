//! Token payload claims.
//!
//! `PayloadClaims` is what a signed token carries. The `sub` field is
//! redacted in Debug output to keep user ids out of logs.
//!
//! `iat` and `exp` are JWT NumericDates with millisecond precision: whole
//! seconds serialize as integers, anything finer as a decimal fraction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Claims carried inside every access and refresh token.
///
/// Immutable once issued; the token is dead after `exp`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadClaims {
    /// Unique token identifier, fresh per issued token.
    pub jti: Uuid,

    /// Subject (user id, decimal string) - redacted in Debug output.
    pub sub: String,

    /// Email of the subject at issuance time.
    pub email: String,

    /// Admin flag of the subject at issuance time.
    pub is_admin: bool,

    /// Issued-at time.
    #[serde(with = "numeric_date")]
    pub iat: DateTime<Utc>,

    /// Expiration time.
    #[serde(with = "numeric_date")]
    pub exp: DateTime<Utc>,
}

impl fmt::Debug for PayloadClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PayloadClaims")
            .field("jti", &self.jti)
            .field("sub", &"[REDACTED]")
            .field("email", &"[REDACTED]")
            .field("is_admin", &self.is_admin)
            .field("iat", &self.iat)
            .field("exp", &self.exp)
            .finish()
    }
}

impl PayloadClaims {
    /// Expiry as a UTC timestamp.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.exp
    }

    /// Issue time as a UTC timestamp.
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.iat
    }

    /// Whether the token is still live at `now`.
    ///
    /// Live up to and including the exact `exp` instant.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        now <= self.exp
    }
}

/// Serde adapter for NumericDate (seconds since the epoch, possibly
/// fractional) at millisecond precision.
mod numeric_date {
    use chrono::{DateTime, TimeZone, Utc};
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = at.timestamp_millis();
        if millis % 1000 == 0 {
            serializer.serialize_i64(millis / 1000)
        } else {
            serializer.serialize_f64(millis as f64 / 1000.0)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let seconds = f64::deserialize(deserializer)?;
        if !seconds.is_finite() {
            return Err(D::Error::custom("NumericDate must be finite"));
        }
        Utc.timestamp_millis_opt((seconds * 1000.0).round() as i64)
            .single()
            .ok_or_else(|| D::Error::custom("NumericDate out of range"))
    }
}
