use super::Services;
use crate::core::validation::{validate_confirmation, validate_email, validate_password};
use crate::error::ValidationError;
use crate::navigation::Page;

/// Pulls `token` out of a location query string, form-decoded: `+` is a
/// space and `%2B` a literal plus.
pub fn reset_token_from_query(query: &str) -> Option<String> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "token")
        .map(|(_, value)| value.replace('+', " "))
        .and_then(|value| urlencoding::decode(&value).map(|v| v.into_owned()).ok())
        .filter(|value| !value.is_empty())
}

#[derive(Debug, Clone)]
pub enum ForgotPasswordMessage {
    EmailChanged(String),
    Submit,
    BackToLogin,
}

/// The "send me a reset link" page.
pub struct ForgotPasswordView<'a> {
    services: Services<'a>,
    pub email: String,
    pub confirmation: Option<String>,
}

impl<'a> ForgotPasswordView<'a> {
    pub fn new(services: Services<'a>) -> Self {
        Self {
            services,
            email: String::new(),
            confirmation: None,
        }
    }

    pub async fn update(&mut self, message: ForgotPasswordMessage) {
        match message {
            ForgotPasswordMessage::EmailChanged(email) => self.email = email,
            ForgotPasswordMessage::Submit => self.submit().await,
            ForgotPasswordMessage::BackToLogin => self.services.navigator.navigate(Page::Auth),
        }
    }

    async fn submit(&mut self) {
        let services = self.services;
        self.confirmation = None;
        let email = self.email.trim();
        if let Err(e) = validate_email(email) {
            services.notifier.show_error(&e.to_string());
            return;
        }

        services.loading.show();
        let result = services.api.account.forgot_password(email).await;
        services.loading.hide();

        match result {
            Ok(reply) => {
                let message = reply
                    .message
                    .unwrap_or_else(|| "Check your email for a reset link".to_string());
                services.notifier.show_success(&message);
                self.confirmation = Some(message);
            }
            Err(e) => {
                log::error!("Forgot-password request failed: {}", e);
                services.notifier.show_error(&e.to_string());
            }
        }
    }
}

#[derive(Debug, Clone)]
pub enum ResetPasswordMessage {
    PasswordChanged(String),
    ConfirmChanged(String),
    Submit,
}

/// The page a reset link lands on. Without a token the form is disabled.
pub struct ResetPasswordView<'a> {
    services: Services<'a>,
    token: Option<String>,
    pub password: String,
    pub confirm_password: String,
    pub error: Option<String>,
    pub success: Option<String>,
}

impl<'a> ResetPasswordView<'a> {
    /// `query` is the location's query string; the token is read from it once.
    pub fn new(services: Services<'a>, query: &str) -> Self {
        let token = reset_token_from_query(query);
        let error = token
            .is_none()
            .then(|| ValidationError::MissingResetToken.to_string());
        Self {
            services,
            token,
            password: String::new(),
            confirm_password: String::new(),
            error,
            success: None,
        }
    }

    pub fn form_enabled(&self) -> bool {
        self.token.is_some()
    }

    pub async fn update(&mut self, message: ResetPasswordMessage) {
        match message {
            ResetPasswordMessage::PasswordChanged(v) => self.password = v,
            ResetPasswordMessage::ConfirmChanged(v) => self.confirm_password = v,
            ResetPasswordMessage::Submit => self.submit().await,
        }
    }

    fn fail(&mut self, message: String) {
        self.services.notifier.show_error(&message);
        self.error = Some(message);
    }

    async fn submit(&mut self) {
        let services = self.services;
        self.error = None;
        self.success = None;

        let Some(token) = self.token.clone() else {
            self.fail(ValidationError::MissingResetToken.to_string());
            return;
        };
        let checked = validate_confirmation(&self.password, &self.confirm_password)
            .and_then(|()| validate_password(&self.password));
        if let Err(e) = checked {
            self.fail(e.to_string());
            return;
        }

        services.loading.show();
        let result = services
            .api
            .account
            .reset_password(&token, &self.password)
            .await;
        services.loading.hide();

        match result {
            Ok(reply) => {
                let message = reply
                    .message
                    .unwrap_or_else(|| "Password reset successfully".to_string());
                services.notifier.show_success(&message);
                self.success = Some(message);
            }
            Err(e) => {
                log::error!("Password reset failed: {}", e);
                self.fail(e.to_string());
            }
        }
    }
}
