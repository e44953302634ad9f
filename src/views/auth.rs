use reqwest::StatusCode;

use super::Services;
use crate::core::profile::{Credentials, Registration};
use crate::core::validation::{
    AGE_MAX, AGE_MIN, validate_age, validate_confirmation, validate_email, validate_name,
    validate_password,
};
use crate::error::{ApiError, ValidationError};
use crate::navigation::Page;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    #[default]
    Login,
    Register,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthField {
    FirstName,
    LastName,
    Age,
    Email,
    Password,
    ConfirmPassword,
}

impl AuthField {
    pub const REGISTER: [AuthField; 6] = [
        Self::FirstName,
        Self::LastName,
        Self::Age,
        Self::Email,
        Self::Password,
        Self::ConfirmPassword,
    ];
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthForm {
    pub first_name: String,
    pub last_name: String,
    pub age: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl AuthForm {
    fn age(&self) -> Result<Option<u32>, ValidationError> {
        let raw = self.age.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        let age = raw.parse::<u32>().map_err(|_| ValidationError::AgeOutOfRange {
            min: AGE_MIN,
            max: AGE_MAX,
        })?;
        validate_age(age)?;
        Ok(Some(age))
    }

    /// Live check for one register field.
    pub fn check(&self, field: AuthField) -> Result<(), ValidationError> {
        match field {
            AuthField::FirstName => validate_name("First name", &self.first_name),
            AuthField::LastName => validate_name("Last name", &self.last_name),
            AuthField::Age => self.age().map(|_| ()),
            AuthField::Email => validate_email(self.email.trim()),
            AuthField::Password => validate_password(&self.password),
            AuthField::ConfirmPassword => {
                validate_confirmation(&self.password, &self.confirm_password)
            }
        }
    }

    pub fn registration(&self) -> Result<Registration, ValidationError> {
        let registration = Registration {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            age: self.age()?,
        };
        registration.validate(&self.confirm_password)?;
        Ok(registration)
    }

    pub fn credentials(&self) -> Result<Credentials, ValidationError> {
        validate_email(self.email.trim())?;
        if self.password.is_empty() {
            return Err(ValidationError::PasswordRequired);
        }
        Ok(Credentials::new(self.email.trim(), self.password.clone()))
    }
}

/// Maps a login/register failure to what the user should read.
pub fn auth_error_message(error: &ApiError) -> String {
    let message = error.to_string();
    let status = error.status();
    let lower = message.to_lowercase();
    if status == Some(StatusCode::CONFLICT) || lower.contains("already exists") {
        "This email is already registered".to_string()
    } else if status == Some(StatusCode::UNAUTHORIZED) || message.contains("Unauthorized") {
        "Invalid email or password".to_string()
    } else if status == Some(StatusCode::BAD_REQUEST) {
        "Invalid data. Check the fields".to_string()
    } else if message.is_empty() {
        "Authentication failed".to_string()
    } else {
        message
    }
}

#[derive(Debug, Clone)]
pub enum AuthMessage {
    /// Page load. `query` is the location's query string, if any.
    Init { query: String },
    ToggleMode,
    Edit(AuthField, String),
    Submit,
    Logout,
}

pub struct AuthView<'a> {
    services: Services<'a>,
    pub mode: AuthMode,
    pub form: AuthForm,
    pub submitting: bool,
}

impl<'a> AuthView<'a> {
    pub fn new(services: Services<'a>) -> Self {
        Self {
            services,
            mode: AuthMode::default(),
            form: AuthForm::default(),
            submitting: false,
        }
    }

    pub async fn update(&mut self, message: AuthMessage) {
        match message {
            AuthMessage::Init { query } => self.init(&query).await,
            AuthMessage::ToggleMode => {
                self.mode = match self.mode {
                    AuthMode::Login => AuthMode::Register,
                    AuthMode::Register => AuthMode::Login,
                };
            }
            AuthMessage::Edit(field, value) => {
                let slot = match field {
                    AuthField::FirstName => &mut self.form.first_name,
                    AuthField::LastName => &mut self.form.last_name,
                    AuthField::Age => &mut self.form.age,
                    AuthField::Email => &mut self.form.email,
                    AuthField::Password => &mut self.form.password,
                    AuthField::ConfirmPassword => &mut self.form.confirm_password,
                };
                *slot = value;
            }
            AuthMessage::Submit => self.submit().await,
            AuthMessage::Logout => {
                self.services.api.account.logout().await;
                self.services.navigator.navigate(Page::Auth);
            }
        }
    }

    /// Arriving with `logout=true` forces login mode and drops any leftover
    /// session. Otherwise a live session skips straight to the dashboard.
    async fn init(&mut self, query: &str) {
        let services = self.services;
        let from_logout = query
            .trim_start_matches('?')
            .split('&')
            .any(|pair| pair == "logout=true");
        if from_logout {
            self.mode = AuthMode::Login;
            services.api.http.clear_session();
            services.notifier.show_success("You have been logged out");
            return;
        }
        services.gate().redirect_if_authenticated().await;
    }

    pub fn field_error(&self, field: AuthField) -> Option<ValidationError> {
        if self.mode == AuthMode::Login {
            return None;
        }
        self.form.check(field).err()
    }

    pub fn can_submit(&self) -> bool {
        if self.submitting {
            return false;
        }
        match self.mode {
            AuthMode::Login => self.form.credentials().is_ok(),
            AuthMode::Register => AuthField::REGISTER
                .iter()
                .all(|&f| self.form.check(f).is_ok()),
        }
    }

    async fn submit(&mut self) {
        let services = self.services;
        let account = &services.api.account;

        self.submitting = true;
        let result = match self.mode {
            AuthMode::Login => match self.form.credentials() {
                Ok(credentials) => Some(account.login(&credentials).await),
                Err(e) => {
                    services.notifier.show_error(&e.to_string());
                    None
                }
            },
            AuthMode::Register => match self.form.registration() {
                Ok(registration) => Some(account.register(&registration).await),
                Err(e) => {
                    services.notifier.show_error(&e.to_string());
                    None
                }
            },
        };
        self.submitting = false;

        match result {
            Some(Ok(user)) => {
                log::info!(
                    "Authenticated as {}",
                    user.email.as_deref().unwrap_or(self.form.email.trim())
                );
                self.form = AuthForm::default();
                services.navigator.navigate(Page::Dashboard);
            }
            Some(Err(e)) => {
                log::error!("Authentication failed: {}", e);
                services.notifier.show_error(&auth_error_message(&e));
            }
            None => {}
        }
    }
}
