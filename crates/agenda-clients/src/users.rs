//! User service client: login and account management.

use async_trait::async_trait;
use agenda_core::config::UpstreamConfig;
use agenda_core::error::{AgendaError, Result};
use agenda_core::traits::{AuthService, UserService};
use agenda_core::types::{Address, BearerToken, LoginRequest, Phone, UserRequest, UserResponse};

use crate::decode::{check, json, transport_error};
use crate::{build_http_client, join_url};

/// Talks to the user service at `base_url`; every route lives under `/usuario`.
pub struct UsersClient {
    base_url: String,
    client: reqwest::Client,
}

impl UsersClient {
    pub fn new(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    pub fn from_config(config: &UpstreamConfig) -> Result<Self> {
        Ok(Self::new(
            config.users_url.clone(),
            build_http_client(config.request_timeout_secs)?,
        ))
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.base_url, &format!("usuario{path}"))
    }

    fn authed(&self, req: reqwest::RequestBuilder, token: &BearerToken) -> reqwest::RequestBuilder {
        req.header(reqwest::header::AUTHORIZATION, token.header_value())
    }
}

#[async_trait]
impl AuthService for UsersClient {
    async fn login(&self, credentials: &LoginRequest) -> Result<BearerToken> {
        const OP: &str = "login";
        let resp = self
            .client
            .post(self.url("/login"))
            .json(credentials)
            .send()
            .await
            .map_err(|e| transport_error(OP, e))?;
        // a rejected credential exchange is its own kind, not a bad caller token
        let resp = check(OP, resp).await.map_err(|e| match e {
            AgendaError::Unauthorized(m) | AgendaError::Forbidden(m) => AgendaError::AuthFailed(m),
            other => other,
        })?;
        let body = resp.text().await.map_err(|e| transport_error(OP, e))?;
        let token = BearerToken::new(body);
        if token.is_empty() {
            return Err(AgendaError::upstream("login: user service returned an empty token"));
        }
        tracing::debug!(email = %credentials.email, "login succeeded");
        Ok(token)
    }
}

#[async_trait]
impl UserService for UsersClient {
    async fn register(&self, user: &UserRequest) -> Result<UserResponse> {
        const OP: &str = "register user";
        let resp = self
            .client
            .post(self.url(""))
            .json(user)
            .send()
            .await
            .map_err(|e| transport_error(OP, e))?;
        json(OP, resp).await
    }

    async fn find_by_email(&self, email: &str, token: &BearerToken) -> Result<UserResponse> {
        const OP: &str = "find user";
        let resp = self
            .authed(self.client.get(self.url("")), token)
            .query(&[("email", email)])
            .send()
            .await
            .map_err(|e| transport_error(OP, e))?;
        json(OP, resp).await
    }

    async fn delete_by_email(&self, email: &str, token: &BearerToken) -> Result<()> {
        const OP: &str = "delete user";
        let mut url = reqwest::Url::parse(&self.url(""))
            .map_err(|e| AgendaError::Config(format!("invalid users_url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| AgendaError::Config("users_url cannot be a base URL".into()))?
            .push(email);
        let resp = self
            .authed(self.client.delete(url), token)
            .send()
            .await
            .map_err(|e| transport_error(OP, e))?;
        check(OP, resp).await?;
        Ok(())
    }

    async fn update_user(&self, user: &UserRequest, token: &BearerToken) -> Result<UserResponse> {
        const OP: &str = "update user";
        let resp = self
            .authed(self.client.put(self.url("")), token)
            .json(user)
            .send()
            .await
            .map_err(|e| transport_error(OP, e))?;
        json(OP, resp).await
    }

    async fn add_address(&self, address: &Address, token: &BearerToken) -> Result<Address> {
        const OP: &str = "add address";
        let resp = self
            .authed(self.client.post(self.url("/endereco")), token)
            .json(address)
            .send()
            .await
            .map_err(|e| transport_error(OP, e))?;
        json(OP, resp).await
    }

    async fn update_address(&self, id: i64, address: &Address, token: &BearerToken) -> Result<Address> {
        const OP: &str = "update address";
        let resp = self
            .authed(self.client.put(self.url("/endereco")), token)
            .query(&[("id", id)])
            .json(address)
            .send()
            .await
            .map_err(|e| transport_error(OP, e))?;
        json(OP, resp).await
    }

    async fn add_phone(&self, phone: &Phone, token: &BearerToken) -> Result<Phone> {
        const OP: &str = "add phone";
        let resp = self
            .authed(self.client.post(self.url("/telefone")), token)
            .json(phone)
            .send()
            .await
            .map_err(|e| transport_error(OP, e))?;
        json(OP, resp).await
    }

    async fn update_phone(&self, id: i64, phone: &Phone, token: &BearerToken) -> Result<Phone> {
        const OP: &str = "update phone";
        let resp = self
            .authed(self.client.put(self.url("/telefone")), token)
            .query(&[("id", id)])
            .json(phone)
            .send()
            .await
            .map_err(|e| transport_error(OP, e))?;
        json(OP, resp).await
    }
}
