//! Gateway request and response models.
//!
//! Request bodies are validated here before anything reaches the Identity
//! Service. Passwords are redacted in Debug output.

use crate::errors::GatewayError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum password length accepted at the gateway.
pub const MIN_PASSWORD_LEN: usize = 6;

/// User record as returned by the Identity Service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// `POST /v1/users` body.
#[derive(Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl fmt::Debug for CreateUserRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateUserRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("name", &self.name)
            .finish()
    }
}

impl CreateUserRequest {
    pub fn validate(&self) -> Result<(), GatewayError> {
        validate_email(&self.email)?;
        validate_password(&self.password)?;
        validate_required("name", &self.name)
    }
}

/// `POST /v1/login` body.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), GatewayError> {
        validate_email(&self.email)?;
        validate_password(&self.password)
    }
}

/// `PATCH /v1/users/my_profile` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateNameRequest {
    pub name: String,
}

impl UpdateNameRequest {
    pub fn validate(&self) -> Result<(), GatewayError> {
        validate_required("name", &self.name)
    }
}

/// `PATCH /v1/users/my_profile/phone_number` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddPhoneRequest {
    pub phone: String,
}

impl AddPhoneRequest {
    pub fn validate(&self) -> Result<(), GatewayError> {
        validate_required("phone", &self.phone)?;
        let digits = self.phone.trim().trim_start_matches('+');
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(GatewayError::BadRequest(
                "phone must contain only digits and an optional leading +".to_string(),
            ));
        }
        Ok(())
    }
}

/// Successful login: both tokens plus the user.
///
/// The refresh token is also set as a cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token: String,
    pub refresh_token_expires_at: DateTime<Utc>,
    pub user: UserRecord,
}

/// Successful renew: a new access token only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenewTokenResponse {
    pub access_token: String,
    pub access_token_expires_at: DateTime<Utc>,
}

/// `GET /ping` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingResponse {
    pub message: String,
}

fn validate_required(field: &str, value: &str) -> Result<(), GatewayError> {
    if value.trim().is_empty() {
        return Err(GatewayError::BadRequest(format!("{} is required", field)));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), GatewayError> {
    validate_required("email", email)?;
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(GatewayError::BadRequest(
            "email must be a valid address".to_string(),
        ));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), GatewayError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(GatewayError::BadRequest(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn create(email: &str, password: &str, name: &str) -> CreateUserRequest {
        CreateUserRequest {
            email: email.to_string(),
            password: password.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_create_user_validation() {
        assert!(create("rider@example.com", "secret1", "Rider").validate().is_ok());

        for (email, password, name) in [
            ("", "secret1", "Rider"),
            ("rider", "secret1", "Rider"),
            ("@example.com", "secret1", "Rider"),
            ("rider@localhost", "secret1", "Rider"),
            ("rider@exa mple.com", "secret1", "Rider"),
            ("a@b@example.com", "secret1", "Rider"),
            ("rider@example.com", "12345", "Rider"),
            ("rider@example.com", "secret1", "   "),
        ] {
            let err = create(email, password, name).validate().unwrap_err();
            assert!(
                matches!(err, GatewayError::BadRequest(_)),
                "{email:?}/{name:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_password_length_counts_characters() {
        assert!(create("r@example.com", "ééééééé", "R").validate().is_ok());
        assert!(create("r@example.com", "éé", "R").validate().is_err());
    }

    #[test]
    fn test_debug_redacts_passwords() {
        let create = create("rider@example.com", "hunter22", "Rider");
        let login = LoginRequest {
            email: "rider@example.com".to_string(),
            password: "hunter22".to_string(),
        };

        assert!(!format!("{:?}", create).contains("hunter22"));
        assert!(!format!("{:?}", login).contains("hunter22"));
    }

    #[test]
    fn test_phone_validation() {
        let ok = |p: &str| AddPhoneRequest { phone: p.to_string() }.validate().is_ok();
        assert!(ok("+15551234567"));
        assert!(ok("5551234"));
        assert!(!ok(""));
        assert!(!ok("+"));
        assert!(!ok("555-1234"));
    }

    #[test]
    fn test_user_record_defaults() {
        let json = serde_json::json!({
            "id": 7,
            "email": "rider@example.com",
            "name": "Rider",
            "created_at": "2024-01-01T00:00:00Z"
        });
        let user: UserRecord = serde_json::from_value(json).unwrap();
        assert_eq!(user.phone, "");
        assert!(!user.is_admin);
    }
}
