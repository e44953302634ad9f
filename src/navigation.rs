use std::cell::RefCell;

/// Pages the client can send the user to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Auth,
    Dashboard,
    CreateTask,
    Profile,
    ForgotPassword,
    ResetPassword,
}

impl Page {
    pub fn path(&self) -> &'static str {
        match self {
            Self::Auth => "/auth.html",
            Self::Dashboard => "/dashboard.html",
            Self::CreateTask => "/create-task.html",
            Self::Profile => "/profile.html",
            Self::ForgotPassword => "/forgot-password.html",
            Self::ResetPassword => "/reset-password.html",
        }
    }

    /// Whether `location` (a path, possibly with a query) is this page.
    pub fn matches(&self, location: &str) -> bool {
        let path = location.split(['?', '#']).next().unwrap_or(location);
        path.ends_with(self.path())
    }
}

/// Where the user is and how to move them. Implemented by whatever hosts the views.
pub trait Navigator {
    fn current_path(&self) -> String;
    fn navigate(&self, page: Page);
}

/// In-memory navigator: a location plus the list of pages visited.
#[derive(Debug, Default)]
pub struct History {
    current: RefCell<String>,
    visits: RefCell<Vec<Page>>,
}

impl History {
    pub fn at(page: Page) -> Self {
        Self::at_path(page.path())
    }

    pub fn at_path(path: impl Into<String>) -> Self {
        Self {
            current: RefCell::new(path.into()),
            visits: RefCell::new(Vec::new()),
        }
    }

    pub fn visits(&self) -> Vec<Page> {
        self.visits.borrow().clone()
    }

    pub fn visit_count(&self, page: Page) -> usize {
        self.visits.borrow().iter().filter(|p| **p == page).count()
    }

    pub fn last(&self) -> Option<Page> {
        self.visits.borrow().last().copied()
    }
}

impl Navigator for History {
    fn current_path(&self) -> String {
        self.current.borrow().clone()
    }

    fn navigate(&self, page: Page) {
        log::info!("Navigating to {}", page.path());
        *self.current.borrow_mut() = page.path().to_string();
        self.visits.borrow_mut().push(page);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_matching_ignores_query_and_prefix() {
        assert!(Page::Auth.matches("/auth.html"));
        assert!(Page::Auth.matches("/app/auth.html?logout=true"));
        assert!(Page::ResetPassword.matches("/reset-password.html?token=abc"));
        assert!(!Page::Auth.matches("/dashboard.html"));
    }

    #[test]
    fn history_records_visits() {
        let history = History::at(Page::Dashboard);
        history.navigate(Page::Profile);
        history.navigate(Page::Auth);
        assert_eq!(history.current_path(), "/auth.html");
        assert_eq!(history.visits(), vec![Page::Profile, Page::Auth]);
        assert_eq!(history.visit_count(Page::Auth), 1);
        assert_eq!(history.last(), Some(Page::Auth));
    }
}
