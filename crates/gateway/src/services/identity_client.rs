//! Identity Service HTTP client.
//!
//! The Identity Service owns accounts and credentials. The gateway calls it
//! to create users, verify a login, and read or update a user record; it
//! never stores users itself.
//!
//! # Security
//!
//! - Timeouts prevent hanging connections
//! - Transport failures and 5xx answers surface as `DownstreamUnavailable`,
//!   with details logged server-side only

use crate::errors::GatewayError;
use crate::models::{AddPhoneRequest, CreateUserRequest, LoginRequest, UpdateNameRequest, UserRecord};
use crate::observability::metrics::record_identity_request;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{error, instrument, warn};

/// Default timeout for Identity Service requests in seconds.
const IDENTITY_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Default connect timeout for Identity Service requests in seconds.
const IDENTITY_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Operations the gateway needs from the Identity Service.
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// `POST /users`.
    async fn create_user(&self, request: &CreateUserRequest) -> Result<UserRecord, GatewayError>;

    /// `POST /users/login`. Rejected credentials map to `InvalidCredentials`.
    async fn verify_credentials(&self, request: &LoginRequest)
        -> Result<UserRecord, GatewayError>;

    /// `GET /users/{id}`.
    async fn get_user(&self, id: i64) -> Result<UserRecord, GatewayError>;

    /// `PATCH /users/{id}`.
    async fn update_name(
        &self,
        id: i64,
        request: &UpdateNameRequest,
    ) -> Result<UserRecord, GatewayError>;

    /// `PATCH /users/phone_number/{id}`.
    async fn add_phone(&self, id: i64, request: &AddPhoneRequest)
        -> Result<UserRecord, GatewayError>;

    /// `DELETE /users/{id}`.
    async fn delete_user(&self, id: i64) -> Result<(), GatewayError>;
}

/// Error body the Identity Service returns on 4xx.
#[derive(Debug, Deserialize)]
struct IdentityErrorBody {
    error: String,
}

/// HTTP client for the Identity Service.
#[derive(Clone)]
pub struct HttpIdentityClient {
    client: Client,
    base_url: String,
}

impl HttpIdentityClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Internal` if the HTTP client cannot be built.
    pub fn new(base_url: String) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(IDENTITY_REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(IDENTITY_CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                error!(target: "gateway.services.identity", error = %e, "Failed to build HTTP client");
                GatewayError::Internal
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send the request, record metrics, and decode a JSON body.
    async fn execute<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T, GatewayError> {
        Self::timed(operation, async {
            let response = Self::send(operation, request).await?;
            response.json().await.map_err(|e| {
                error!(target: "gateway.services.identity", operation, error = %e, "Failed to parse identity response");
                GatewayError::Internal
            })
        })
        .await
    }

    /// Send the request and record metrics; a success body is ignored.
    async fn execute_discarding_body(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<(), GatewayError> {
        Self::timed(operation, async {
            Self::send(operation, request).await.map(drop)
        })
        .await
    }

    async fn timed<T>(
        operation: &'static str,
        call: impl Future<Output = Result<T, GatewayError>>,
    ) -> Result<T, GatewayError> {
        let start = Instant::now();
        let result = call.await;

        let status = if result.is_ok() { "success" } else { "error" };
        record_identity_request(operation, status, start.elapsed());

        result
    }

    async fn send(
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<reqwest::Response, GatewayError> {
        match request.send().await {
            Ok(response) => Self::handle_response(operation, response).await,
            Err(e) => {
                warn!(target: "gateway.services.identity", operation, error = %e, "Identity request failed");
                Err(GatewayError::DownstreamUnavailable(format!(
                    "identity service {operation}: {e}"
                )))
            }
        }
    }

    /// Map Identity Service status codes onto gateway errors.
    async fn handle_response(
        operation: &'static str,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, GatewayError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        if status.is_server_error() {
            warn!(target: "gateway.services.identity", operation, status = %status, "Identity service returned server error");
            return Err(GatewayError::DownstreamUnavailable(format!(
                "identity service {operation} returned {status}"
            )));
        }

        let message = response
            .json::<IdentityErrorBody>()
            .await
            .map(|body| body.error)
            .ok();

        match status {
            StatusCode::BAD_REQUEST => Err(GatewayError::BadRequest(
                message.unwrap_or_else(|| "invalid request".to_string()),
            )),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN if operation == "verify_credentials" => {
                Err(GatewayError::InvalidCredentials)
            }
            StatusCode::NOT_FOUND => Err(GatewayError::NotFound(
                message.unwrap_or_else(|| "user not found".to_string()),
            )),
            StatusCode::CONFLICT => Err(GatewayError::Conflict(
                message.unwrap_or_else(|| "user already exists".to_string()),
            )),
            _ => {
                warn!(target: "gateway.services.identity", operation, status = %status, "Unexpected identity response");
                Err(GatewayError::Internal)
            }
        }
    }
}

#[async_trait]
impl IdentityService for HttpIdentityClient {
    #[instrument(skip_all, name = "gateway.identity.create_user")]
    async fn create_user(&self, request: &CreateUserRequest) -> Result<UserRecord, GatewayError> {
        let builder = self.client.post(self.url("/users")).json(request);
        self.execute("create_user", builder).await
    }

    #[instrument(skip_all, name = "gateway.identity.verify_credentials")]
    async fn verify_credentials(
        &self,
        request: &LoginRequest,
    ) -> Result<UserRecord, GatewayError> {
        let builder = self.client.post(self.url("/users/login")).json(request);
        self.execute("verify_credentials", builder).await
    }

    #[instrument(skip(self), name = "gateway.identity.get_user")]
    async fn get_user(&self, id: i64) -> Result<UserRecord, GatewayError> {
        let builder = self.client.get(self.url(&format!("/users/{id}")));
        self.execute("get_user", builder).await
    }

    #[instrument(skip(self, request), name = "gateway.identity.update_name")]
    async fn update_name(
        &self,
        id: i64,
        request: &UpdateNameRequest,
    ) -> Result<UserRecord, GatewayError> {
        let builder = self
            .client
            .patch(self.url(&format!("/users/{id}")))
            .json(request);
        self.execute("update_name", builder).await
    }

    #[instrument(skip(self, request), name = "gateway.identity.add_phone")]
    async fn add_phone(
        &self,
        id: i64,
        request: &AddPhoneRequest,
    ) -> Result<UserRecord, GatewayError> {
        let builder = self
            .client
            .patch(self.url(&format!("/users/phone_number/{id}")))
            .json(request);
        self.execute("add_phone", builder).await
    }

    #[instrument(skip(self), name = "gateway.identity.delete_user")]
    async fn delete_user(&self, id: i64) -> Result<(), GatewayError> {
        let builder = self.client.delete(self.url(&format!("/users/{id}")));
        self.execute_discarding_body("delete_user", builder).await
    }
}

/// In-memory Identity Service for tests.
pub mod mock {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Clone)]
    struct Account {
        user: UserRecord,
        password: String,
    }

    /// Mock Identity Service holding accounts in memory.
    #[derive(Default)]
    pub struct MockIdentityService {
        accounts: Mutex<HashMap<i64, Account>>,
        call_count: AtomicUsize,
        unavailable: bool,
    }

    impl MockIdentityService {
        /// Create an empty mock.
        pub fn new() -> Self {
            Self::default()
        }

        /// Create a mock whose every call fails as unreachable.
        pub fn unavailable() -> Self {
            Self {
                unavailable: true,
                ..Self::default()
            }
        }

        /// Add an account and return its record.
        pub fn with_user(self, id: i64, email: &str, password: &str, is_admin: bool) -> Self {
            let user = UserRecord {
                id,
                email: email.to_string(),
                name: format!("user-{id}"),
                phone: String::new(),
                is_admin,
                created_at: Utc::now(),
            };
            if let Ok(mut accounts) = self.accounts.lock() {
                accounts.insert(
                    id,
                    Account {
                        user,
                        password: password.to_string(),
                    },
                );
            }
            self
        }

        /// Get the number of calls made.
        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        fn begin(&self) -> Result<std::sync::MutexGuard<'_, HashMap<i64, Account>>, GatewayError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            if self.unavailable {
                return Err(GatewayError::DownstreamUnavailable(
                    "mock identity service is down".to_string(),
                ));
            }
            self.accounts.lock().map_err(|_| GatewayError::Internal)
        }

        fn update(
            &self,
            id: i64,
            apply: impl FnOnce(&mut UserRecord),
        ) -> Result<UserRecord, GatewayError> {
            let mut accounts = self.begin()?;
            let account = accounts
                .get_mut(&id)
                .ok_or_else(|| GatewayError::NotFound("user not found".to_string()))?;
            apply(&mut account.user);
            Ok(account.user.clone())
        }
    }

    #[async_trait]
    impl IdentityService for MockIdentityService {
        async fn create_user(
            &self,
            request: &CreateUserRequest,
        ) -> Result<UserRecord, GatewayError> {
            let mut accounts = self.begin()?;
            if accounts.values().any(|a| a.user.email == request.email) {
                return Err(GatewayError::Conflict("email already registered".to_string()));
            }
            let id = accounts.keys().max().copied().unwrap_or(0) + 1;
            let user = UserRecord {
                id,
                email: request.email.clone(),
                name: request.name.clone(),
                phone: String::new(),
                is_admin: false,
                created_at: Utc::now(),
            };
            accounts.insert(
                id,
                Account {
                    user: user.clone(),
                    password: request.password.clone(),
                },
            );
            Ok(user)
        }

        async fn verify_credentials(
            &self,
            request: &LoginRequest,
        ) -> Result<UserRecord, GatewayError> {
            let accounts = self.begin()?;
            accounts
                .values()
                .find(|a| a.user.email == request.email && a.password == request.password)
                .map(|a| a.user.clone())
                .ok_or(GatewayError::InvalidCredentials)
        }

        async fn get_user(&self, id: i64) -> Result<UserRecord, GatewayError> {
            let accounts = self.begin()?;
            accounts
                .get(&id)
                .map(|a| a.user.clone())
                .ok_or_else(|| GatewayError::NotFound("user not found".to_string()))
        }

        async fn update_name(
            &self,
            id: i64,
            request: &UpdateNameRequest,
        ) -> Result<UserRecord, GatewayError> {
            self.update(id, |user| user.name = request.name.clone())
        }

        async fn add_phone(
            &self,
            id: i64,
            request: &AddPhoneRequest,
        ) -> Result<UserRecord, GatewayError> {
            self.update(id, |user| user.phone = request.phone.clone())
        }

        async fn delete_user(&self, id: i64) -> Result<(), GatewayError> {
            let mut accounts = self.begin()?;
            accounts
                .remove(&id)
                .map(drop)
                .ok_or_else(|| GatewayError::NotFound("user not found".to_string()))
        }
    }
}
