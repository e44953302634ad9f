use super::Services;
use crate::core::profile::{DEFAULT_AGE, ProfileUpdate, UserProfile};
use crate::core::validation::{AGE_MAX, AGE_MIN};
use crate::error::{ApiError, Error, ValidationError};
use crate::navigation::Page;

/// Editable copy of the profile fields, as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileForm {
    pub name: String,
    pub lastname: String,
    pub email: String,
    pub age: String,
}

impl ProfileForm {
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            name: profile.name.clone(),
            lastname: profile.lastname.clone(),
            email: profile.email.clone(),
            age: profile.age.unwrap_or(DEFAULT_AGE).to_string(),
        }
    }

    pub fn to_update(&self) -> Result<ProfileUpdate, ValidationError> {
        let age = self
            .age
            .trim()
            .parse::<u32>()
            .map_err(|_| ValidationError::AgeOutOfRange {
                min: AGE_MIN,
                max: AGE_MAX,
            })?;
        let update = ProfileUpdate {
            name: self.name.trim().to_string(),
            lastname: self.lastname.trim().to_string(),
            email: self.email.trim().to_string(),
            age,
        };
        update.validate()?;
        Ok(update)
    }
}

#[derive(Debug, Clone)]
pub enum ProfileMessage {
    Load,
    StartEdit,
    CancelEdit,
    NameChanged(String),
    LastnameChanged(String),
    EmailChanged(String),
    AgeChanged(String),
    Save,
    DeleteAccount,
}

pub struct ProfileView<'a> {
    services: Services<'a>,
    pub profile: Option<UserProfile>,
    pub form: ProfileForm,
    pub editing: bool,
}

impl<'a> ProfileView<'a> {
    pub fn new(services: Services<'a>) -> Self {
        Self {
            services,
            profile: None,
            form: ProfileForm::default(),
            editing: false,
        }
    }

    pub async fn update(&mut self, message: ProfileMessage) {
        match message {
            ProfileMessage::Load => self.load().await,
            ProfileMessage::StartEdit => {
                if let Some(profile) = &self.profile {
                    self.form = ProfileForm::from_profile(profile);
                    self.editing = true;
                }
            }
            ProfileMessage::CancelEdit => {
                self.editing = false;
                if let Some(profile) = &self.profile {
                    self.form = ProfileForm::from_profile(profile);
                }
            }
            ProfileMessage::NameChanged(v) => self.form.name = v,
            ProfileMessage::LastnameChanged(v) => self.form.lastname = v,
            ProfileMessage::EmailChanged(v) => self.form.email = v,
            ProfileMessage::AgeChanged(v) => self.form.age = v,
            ProfileMessage::Save => self.save().await,
            ProfileMessage::DeleteAccount => self.delete_account().await,
        }
    }

    async fn load(&mut self) {
        let services = self.services;
        if !services.gate().check_auth().await {
            return;
        }
        services.loading.show();
        match services.api.profile.get_profile().await {
            Ok(profile) => {
                self.form = ProfileForm::from_profile(&profile);
                self.profile = Some(profile);
            }
            Err(e) => {
                log::error!("Failed to load profile: {}", e);
                services
                    .notifier
                    .show_error(&format!("Failed to load profile: {}", e));
            }
        }
        services.loading.hide();
    }

    async fn save(&mut self) {
        let services = self.services;
        let update = match self.form.to_update() {
            Ok(update) => update,
            Err(e) => {
                services.notifier.show_error(&e.to_string());
                return;
            }
        };

        services.loading.show();
        let result = services.api.profile.update_profile(&update).await;
        services.loading.hide();

        match result {
            Ok(()) => {
                if let Some(profile) = self.profile.as_mut() {
                    profile.name = update.name;
                    profile.lastname = update.lastname;
                    profile.email = update.email;
                    profile.age = Some(update.age);
                }
                self.editing = false;
                services.notifier.show_success("Profile updated");
            }
            Err(Error::Validation(e)) => services.notifier.show_error(&e.to_string()),
            Err(Error::Api(e)) => {
                log::error!("Failed to update profile: {}", e);
                services.notifier.show_error("Failed to update profile");
            }
        }
    }

    /// Looks the id up fresh, deletes the user, then drops the session and
    /// returns to the login page.
    async fn delete_account(&mut self) {
        let services = self.services;
        if !services
            .notifier
            .confirm("Delete your account? All of your tasks will be removed.")
        {
            return;
        }

        services.loading.show();
        let result: Result<_, ApiError> = async {
            let profile = services.api.profile.get_profile().await?;
            services.api.account.delete_user(&profile.id).await
        }
        .await;
        services.loading.hide();

        match result {
            Ok(_) => {
                log::info!("Account deleted");
                services.api.http.clear_session();
                self.profile = None;
                services.navigator.navigate(Page::Auth);
            }
            Err(ApiError::Network(e)) => {
                log::error!("Failed to delete account: {}", e);
                services
                    .notifier
                    .show_error("Cannot reach the server to delete the account");
            }
            Err(e) => {
                log::error!("Failed to delete account: {}", e);
                services
                    .notifier
                    .show_error(&format!("Failed to delete account: {}", e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::hits;
    use crate::views::test_support::Harness;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, ResponseTemplate};

    async fn mount_profile(h: &Harness) {
        Mock::given(method("GET"))
            .and(path("/api/v1/verify"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&h.server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/profile"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "_id": "u1", "name": "Ana", "lastname": "Gómez", "email": "ana@example.com", "age": 30
            })))
            .mount(&h.server)
            .await;
    }

    #[tokio::test]
    async fn load_then_edit_and_save() {
        let h = Harness::at(Page::Profile).await;
        mount_profile(&h).await;
        Mock::given(method("PUT"))
            .and(path("/api/v1/profile/edit"))
            .and(body_json(serde_json::json!({
                "name": "Ana María", "lastname": "Gómez", "email": "ana@example.com", "age": 31
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&h.server)
            .await;

        let mut view = ProfileView::new(h.services());
        view.update(ProfileMessage::Load).await;
        assert_eq!(view.form.age, "30");

        view.update(ProfileMessage::StartEdit).await;
        assert!(view.editing);
        view.update(ProfileMessage::NameChanged("Ana María".to_string()))
            .await;
        view.update(ProfileMessage::AgeChanged("31".to_string())).await;
        view.update(ProfileMessage::Save).await;

        assert!(!view.editing);
        assert_eq!(view.profile.as_ref().unwrap().name, "Ana María");
        assert_eq!(h.notes.successes(), vec!["Profile updated"]);
        assert!(!h.loading.is_visible());
    }

    #[tokio::test]
    async fn invalid_fields_never_reach_the_server() {
        let h = Harness::at(Page::Profile).await;
        mount_profile(&h).await;
        let mut view = ProfileView::new(h.services());
        view.update(ProfileMessage::Load).await;
        view.update(ProfileMessage::StartEdit).await;

        view.update(ProfileMessage::AgeChanged("12".to_string())).await;
        view.update(ProfileMessage::Save).await;
        assert_eq!(
            h.notes.last_error().as_deref(),
            Some("Age must be between 13 and 120")
        );

        view.update(ProfileMessage::AgeChanged("30".to_string())).await;
        view.update(ProfileMessage::EmailChanged("nope".to_string()))
            .await;
        view.update(ProfileMessage::Save).await;
        assert_eq!(
            h.notes.last_error().as_deref(),
            Some("Enter a valid email address")
        );
        assert!(view.editing);
        assert_eq!(hits(&h.server, "PUT", "/api/v1/profile/edit").await, 0);
    }

    #[tokio::test]
    async fn delete_account_clears_session_and_leaves() {
        let h = Harness::at(Page::Profile).await;
        mount_profile(&h).await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/user/u1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "message": "bye" })))
            .expect(1)
            .mount(&h.server)
            .await;

        let mut view = ProfileView::new(h.services());
        view.update(ProfileMessage::DeleteAccount).await;
        assert_eq!(h.history.last(), Some(Page::Auth));
        assert!(!h.api.http.has_session());
        assert!(h.notes.errors().is_empty());
    }

    #[tokio::test]
    async fn delete_account_failure_stays_put() {
        let h = Harness::at(Page::Profile).await;
        mount_profile(&h).await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/user/u1"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(serde_json::json!({ "message": "Server down" })),
            )
            .mount(&h.server)
            .await;

        let mut view = ProfileView::new(h.services());
        view.update(ProfileMessage::DeleteAccount).await;
        assert!(h.history.visits().is_empty());
        assert_eq!(
            h.notes.last_error().as_deref(),
            Some("Failed to delete account: Server down")
        );
    }
}
