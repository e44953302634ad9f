use super::account::AccountClient;
use crate::navigation::{Navigator, Page};

/// Session check run before a protected view renders.
pub struct AuthGate<'a> {
    account: &'a AccountClient,
    navigator: &'a dyn Navigator,
}

impl<'a> AuthGate<'a> {
    pub fn new(account: &'a AccountClient, navigator: &'a dyn Navigator) -> Self {
        Self { account, navigator }
    }

    /// `true` when the server accepts the session. Otherwise sends the user to
    /// the login page, unless they are already on it, and returns `false`.
    pub async fn check_auth(&self) -> bool {
        match self.account.verify_token().await {
            Ok(_) => true,
            Err(e) => {
                log::info!("Session not valid: {}", e);
                if !Page::Auth.matches(&self.navigator.current_path()) {
                    self.navigator.navigate(Page::Auth);
                }
                false
            }
        }
    }

    /// For the login page: skip it when a session is already live.
    pub async fn redirect_if_authenticated(&self) -> bool {
        if self.account.verify_token().await.is_ok() {
            self.navigator.navigate(Page::Dashboard);
            return true;
        }
        false
    }
}
