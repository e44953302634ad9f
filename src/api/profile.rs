use super::http::{HttpClient, RequestOptions};
use crate::core::profile::{ProfileUpdate, UserProfile};
use crate::error::{ApiError, Result};

#[derive(Clone)]
pub struct ProfileClient {
    http: HttpClient,
}

impl ProfileClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn get_profile(&self) -> Result<UserProfile, ApiError> {
        self.http
            .request_json("/profile", RequestOptions::get())
            .await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<()> {
        update.validate()?;
        let options = RequestOptions::put().json(update)?;
        self.http.request("/profile/edit", options).await?;
        log::info!("Profile updated for {}", update.email);
        Ok(())
    }
}
