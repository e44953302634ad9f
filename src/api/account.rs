use serde::Serialize;

use super::http::{HttpClient, RequestOptions, ResponseBody};
use crate::config::ResetTokenPlacement;
use crate::core::profile::{Credentials, Registration, ServerMessage, SessionUser};
use crate::error::ApiError;

/// Session lifecycle and account-level operations.
#[derive(Clone)]
pub struct AccountClient {
    http: HttpClient,
    reset_placement: ResetTokenPlacement,
}

#[derive(Serialize)]
struct EmailBody<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct ResetBody<'a> {
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<&'a str>,
}

impl AccountClient {
    pub fn new(http: HttpClient) -> Self {
        Self {
            http,
            reset_placement: ResetTokenPlacement::default(),
        }
    }

    pub fn with_reset_placement(mut self, placement: ResetTokenPlacement) -> Self {
        self.reset_placement = placement;
        self
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    pub async fn register(&self, registration: &Registration) -> Result<SessionUser, ApiError> {
        let options = RequestOptions::post().json(&registration.to_request())?;
        let body = self.http.request("/register", options).await?;
        Ok(session_user(body))
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<SessionUser, ApiError> {
        let options = RequestOptions::post().json(credentials)?;
        let body = self.http.request("/login", options).await?;
        Ok(session_user(body))
    }

    /// Best-effort: a server failure is logged and swallowed, and the local
    /// session cookie is expired either way.
    pub async fn logout(&self) {
        if let Err(e) = self.http.request("/logout", RequestOptions::post()).await {
            log::warn!("Logout request failed: {}", e);
        }
        self.http.clear_session();
    }

    pub async fn verify_token(&self) -> Result<ResponseBody, ApiError> {
        log::debug!("Verifying session");
        self.http.request("/verify", RequestOptions::get()).await
    }

    /// Every call is a fresh request; repeated submits are not deduplicated.
    pub async fn forgot_password(&self, email: &str) -> Result<ServerMessage, ApiError> {
        let options = RequestOptions::post().json(&EmailBody { email })?;
        let body = self.http.request("/forgot-password", options).await?;
        Ok(server_message(body))
    }

    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<ServerMessage, ApiError> {
        let encoded = urlencoding::encode(token);
        let (endpoint, body) = match self.reset_placement {
            ResetTokenPlacement::Query => (
                format!("/reset-password?token={}", encoded),
                ResetBody {
                    password: new_password,
                    token: None,
                },
            ),
            ResetTokenPlacement::Path => (
                format!("/reset-password/{}", encoded),
                ResetBody {
                    password: new_password,
                    token: None,
                },
            ),
            ResetTokenPlacement::Body => (
                "/reset-password".to_string(),
                ResetBody {
                    password: new_password,
                    token: Some(token),
                },
            ),
        };
        let options = RequestOptions::post().json(&body)?;
        let body = self.http.request(&endpoint, options).await?;
        Ok(server_message(body))
    }

    /// Deletes the account; the backend cascades to the user's tasks.
    pub async fn delete_user(&self, user_id: &str) -> Result<ServerMessage, ApiError> {
        let endpoint = format!("/user/{}", urlencoding::encode(user_id));
        let body = self.http.request(&endpoint, RequestOptions::delete()).await?;
        Ok(server_message(body))
    }
}

fn session_user(body: ResponseBody) -> SessionUser {
    body.into_json().unwrap_or_default()
}

/// Confirmation bodies are informational; a bare string becomes the message.
fn server_message(body: ResponseBody) -> ServerMessage {
    match body {
        ResponseBody::Text(text)
            if !text.trim().is_empty()
                && serde_json::from_str::<serde_json::Value>(&text).is_err() =>
        {
            ServerMessage {
                message: Some(text),
            }
        }
        other => other.into_json().unwrap_or_default(),
    }
}
