use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{
    AGE_MAX, AGE_MIN, validate_age, validate_confirmation, validate_email, validate_name,
    validate_password,
};
use crate::error::ValidationError;

/// Age sent on registration when the form leaves it blank.
pub const DEFAULT_AGE: u32 = 18;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(alias = "_id", deserialize_with = "super::id_string")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub lastname: String,
    pub email: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default, rename = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    /// Name shown in the dashboard greeting; falls back to the email's local part.
    pub fn display_name(&self) -> &str {
        if !self.name.trim().is_empty() {
            return self.name.trim();
        }
        self.email.split('@').next().unwrap_or(&self.email)
    }
}

/// What login and register hand back. Backends vary in how much of the
/// user they echo, so everything is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SessionUser {
    #[serde(default, alias = "_id", deserialize_with = "super::opt_id_string")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Bodies that only carry a human-readable confirmation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ServerMessage {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Sign-up form as the user fills it in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub age: Option<u32>,
}

impl Registration {
    pub fn validate(&self, confirm_password: &str) -> Result<(), ValidationError> {
        validate_name("First name", &self.first_name)?;
        validate_name("Last name", &self.last_name)?;
        if let Some(age) = self.age {
            validate_age(age)?;
        }
        validate_email(&self.email)?;
        validate_password(&self.password)?;
        validate_confirmation(&self.password, confirm_password)
    }

    /// The backend spells the names `name`/`lastname` and requires an age.
    pub fn to_request(&self) -> RegisterRequest {
        RegisterRequest {
            name: self.first_name.clone(),
            lastname: self.last_name.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
            age: self.age.filter(|&a| a > 0).unwrap_or(DEFAULT_AGE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub lastname: String,
    pub email: String,
    pub password: String,
    pub age: u32,
}

/// Payload for `PUT /profile/edit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    pub name: String,
    pub lastname: String,
    pub email: String,
    pub age: u32,
}

impl ProfileUpdate {
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            name: profile.name.clone(),
            lastname: profile.lastname.clone(),
            email: profile.email.clone(),
            age: profile.age.unwrap_or(DEFAULT_AGE),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_email(&self.email)?;
        validate_name("Name", &self.name)?;
        validate_name("Last name", &self.lastname)?;
        if self.age < AGE_MIN {
            return Err(ValidationError::AgeOutOfRange {
                min: AGE_MIN,
                max: AGE_MAX,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration() -> Registration {
        Registration {
            first_name: "Ana".to_string(),
            last_name: "Gómez".to_string(),
            email: "ana@example.com".to_string(),
            password: "Secret1!".to_string(),
            age: None,
        }
    }

    #[test]
    fn register_request_maps_names_and_defaults_age() {
        let body = serde_json::to_value(registration().to_request()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "name": "Ana",
                "lastname": "Gómez",
                "email": "ana@example.com",
                "password": "Secret1!",
                "age": 18
            })
        );
    }

    #[test]
    fn register_request_keeps_given_age() {
        let reg = Registration {
            age: Some(34),
            ..registration()
        };
        assert_eq!(reg.to_request().age, 34);
        let zero = Registration {
            age: Some(0),
            ..registration()
        };
        assert_eq!(zero.to_request().age, DEFAULT_AGE);
    }

    #[test]
    fn registration_validation_order() {
        let reg = Registration {
            first_name: "A".to_string(),
            email: "nope".to_string(),
            ..registration()
        };
        assert!(matches!(
            reg.validate("Secret1!"),
            Err(ValidationError::NameTooShort { field: "First name", .. })
        ));
        assert_eq!(
            registration().validate("Other1!!"),
            Err(ValidationError::PasswordMismatch)
        );
        assert!(registration().validate("Secret1!").is_ok());
    }

    #[test]
    fn profile_accepts_mongo_id_and_greets() {
        let profile: UserProfile = serde_json::from_value(serde_json::json!({
            "_id": "u1",
            "name": "",
            "lastname": "Pérez",
            "email": "luis@example.com",
            "age": 30,
            "createdAt": "2026-01-02T03:04:05Z"
        }))
        .unwrap();
        assert_eq!(profile.id, "u1");
        assert_eq!(profile.display_name(), "luis");
    }

    #[test]
    fn session_user_tolerates_sparse_bodies() {
        let user: SessionUser =
            serde_json::from_value(serde_json::json!({ "id": 7, "name": "Ana" })).unwrap();
        assert_eq!(user.id.as_deref(), Some("7"));
        let empty: SessionUser = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(empty, SessionUser::default());
    }

    #[test]
    fn profile_update_rules() {
        let update = ProfileUpdate {
            name: "Ana".to_string(),
            lastname: "Gómez".to_string(),
            email: "ana@example.com".to_string(),
            age: 12,
        };
        assert!(matches!(
            update.validate(),
            Err(ValidationError::AgeOutOfRange { .. })
        ));
        let ok = ProfileUpdate { age: 40, ..update };
        assert!(ok.validate().is_ok());
    }
}
