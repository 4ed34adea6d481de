use std::sync::Arc;

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::credentials::CredentialProvider;
use crate::error::{ApiError, ErrorPayload};
use crate::types::{
    AuthResponse, CreateTransactionRequest, Location, LocationFilters, LocationSort, LoginRequest,
    PageQuery, PageResponse, ProfileUpdate, RegisterRequest, Review, Transaction, UserRecord,
};

/// Whether an endpoint needs the bearer credential
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Public,
    Bearer,
}

/// Client for the Kheyma booking backend
///
/// Every call goes through one private send path, which attaches the bearer
/// token, logs failures and invalidates the credential when the backend
/// rejects a token that was sent.
pub struct ApiClient {
    client: Client,
    config: ApiConfig,
    credentials: Arc<dyn CredentialProvider>,
}

impl ApiClient {
    /// Create a new client
    pub fn new(
        config: ApiConfig,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            credentials,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.config.endpoint(path))
    }

    /// Send a request and map any non-success outcome onto [`ApiError`]
    async fn execute(&self, request: RequestBuilder, access: Access) -> Result<Response, ApiError> {
        let (request, token_sent) = match access {
            Access::Bearer => match self.credentials.bearer_token() {
                Some(token) => (request.bearer_auth(&token), Some(token)),
                None => (request, None),
            },
            Access::Public => (request, None),
        };

        let request = request
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to build request: {}", e)))?;
        let method = request.method().clone();
        let path = request.url().path().to_string();

        debug!("API request: {} {}", method, path);

        let response = match self.client.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    "API request {} {} got no response (timeout: {}, connect: {}): {}",
                    method,
                    path,
                    e.is_timeout(),
                    e.is_connect(),
                    e
                );
                return Err(ApiError::NetworkUnreachable(e.to_string()));
            }
        };

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response body".to_string());
        warn!("API request {} {} failed with status {}: {}", method, path, status, body);

        let error = ApiError::from_status(status.as_u16(), ErrorPayload::from_text(&body));
        if let (Some(token), ApiError::AuthRejected(_)) = (&token_sent, &error) {
            warn!("Bearer token rejected by {} {}, invalidating session", method, path);
            self.credentials.invalidate(token);
        }

        Err(error)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        access: Access,
    ) -> Result<T, ApiError> {
        let response = self.execute(request, access).await?;
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::NetworkUnreachable(format!("Failed to read response: {}", e)))?;

        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// `POST /auth/login`
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        let request = self.request(Method::POST, "/auth/login").json(request);
        self.call(request, Access::Public).await
    }

    /// `POST /auth/register`
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        let request = self.request(Method::POST, "/auth/register").json(request);
        self.call(request, Access::Public).await
    }

    /// `POST /auth/refresh`: exchange the current token for a fresh one
    pub async fn refresh(&self) -> Result<AuthResponse, ApiError> {
        let request = self.request(Method::POST, "/auth/refresh");
        self.call(request, Access::Bearer).await
    }

    /// `GET /auth/me`: the current user in whichever shape the backend sends
    pub async fn me(&self) -> Result<Value, ApiError> {
        let request = self.request(Method::GET, "/auth/me");
        self.call(request, Access::Bearer).await
    }

    /// `PUT /auth/me`
    pub async fn update_me(&self, update: &ProfileUpdate) -> Result<Value, ApiError> {
        let request = self.request(Method::PUT, "/auth/me").json(update);
        self.call(request, Access::Bearer).await
    }

    /// `GET /locations/public/all`
    pub async fn list_locations(
        &self,
        page: PageQuery,
        sort: &LocationSort,
    ) -> Result<PageResponse<Location>, ApiError> {
        let mut params = page.params();
        params.push(("sortBy", sort.sort_by.clone()));
        params.push(("sortDir", sort.sort_dir.clone()));

        let request = self.request(Method::GET, "/locations/public/all");
        self.call(request.query(&params), Access::Public).await
    }

    /// `GET /locations/search`
    pub async fn search_locations(
        &self,
        filters: &LocationFilters,
        page: PageQuery,
    ) -> Result<PageResponse<Location>, ApiError> {
        let mut params = filters.params();
        params.extend(page.params());

        let request = self.request(Method::GET, "/locations/search");
        self.call(request.query(&params), Access::Public).await
    }

    /// `GET /locations/{id}`
    pub async fn get_location(&self, id: &str) -> Result<Location, ApiError> {
        let path = format!("/locations/{}", urlencoding::encode(id));
        self.call(self.request(Method::GET, &path), Access::Public).await
    }

    /// `GET /reviews/location/{id}`
    pub async fn location_reviews(
        &self,
        location_id: &str,
        page: PageQuery,
    ) -> Result<PageResponse<Review>, ApiError> {
        let path = format!("/reviews/location/{}", urlencoding::encode(location_id));
        let params = page.params();
        self.call(self.request(Method::GET, &path).query(&params), Access::Public).await
    }

    /// `POST /transactions`
    pub async fn create_transaction(
        &self,
        request: &CreateTransactionRequest,
    ) -> Result<Transaction, ApiError> {
        let request = self.request(Method::POST, "/transactions").json(request);
        self.call(request, Access::Bearer).await
    }

    /// `GET /transactions/user`
    pub async fn user_transactions(
        &self,
        page: PageQuery,
    ) -> Result<PageResponse<Transaction>, ApiError> {
        let params = page.params();
        let request = self.request(Method::GET, "/transactions/user");
        self.call(request.query(&params), Access::Bearer).await
    }

    /// `GET /transactions/{id}`
    pub async fn get_transaction(&self, id: &str) -> Result<Transaction, ApiError> {
        let path = format!("/transactions/{}", urlencoding::encode(id));
        self.call(self.request(Method::GET, &path), Access::Bearer).await
    }

    /// `PUT /transactions/{id}/cancel`
    pub async fn cancel_transaction(&self, id: &str) -> Result<Transaction, ApiError> {
        let path = format!("/transactions/{}/cancel", urlencoding::encode(id));
        self.call(self.request(Method::PUT, &path), Access::Bearer).await
    }

    /// `GET /admin/users`
    pub async fn admin_users(&self, page: PageQuery) -> Result<PageResponse<UserRecord>, ApiError> {
        let params = page.params();
        let request = self.request(Method::GET, "/admin/users");
        self.call(request.query(&params), Access::Bearer).await
    }

    /// `GET /admin/users/{id}`
    pub async fn admin_user(&self, id: &str) -> Result<UserRecord, ApiError> {
        let path = format!("/admin/users/{}", urlencoding::encode(id));
        self.call(self.request(Method::GET, &path), Access::Bearer).await
    }

    /// `PUT /admin/users/{id}/role`
    pub async fn update_user_role(&self, id: &str, role: &str) -> Result<UserRecord, ApiError> {
        let path = format!("/admin/users/{}/role", urlencoding::encode(id));
        let body = serde_json::json!({ "role": role });
        self.call(self.request(Method::PUT, &path).json(&body), Access::Bearer).await
    }

    /// `DELETE /admin/users/{id}`
    pub async fn delete_user(&self, id: &str) -> Result<(), ApiError> {
        let path = format!("/admin/users/{}", urlencoding::encode(id));
        self.execute(self.request(Method::DELETE, &path), Access::Bearer).await?;
        Ok(())
    }
}
