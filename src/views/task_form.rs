use super::{CharCounter, Services};
use crate::core::task::{DETAILS_MAX_CHARS, TITLE_MAX_CHARS, TaskForm};
use crate::core::temporal;
use crate::error::Error;
use crate::navigation::Page;

#[derive(Debug, Clone)]
pub enum TaskFormMessage {
    Init,
    TitleChanged(String),
    DetailsChanged(String),
    StatusChanged(String),
    DateChanged(String),
    TimeChanged(String),
    Submit,
    /// Leave for the dashboard, confirming first if there is unsaved input.
    Cancel,
    /// Dismiss the success notice and start over.
    CreateAnother,
}

/// Controller for the create-task page.
pub struct TaskFormView<'a> {
    services: Services<'a>,
    pub form: TaskForm,
    pub created: bool,
    pub submitting: bool,
}

impl<'a> TaskFormView<'a> {
    pub fn new(services: Services<'a>) -> Self {
        Self {
            services,
            form: TaskForm::default(),
            created: false,
            submitting: false,
        }
    }

    pub async fn update(&mut self, message: TaskFormMessage) {
        match message {
            TaskFormMessage::Init => {
                self.services.gate().check_auth().await;
            }
            TaskFormMessage::TitleChanged(v) => self.form.title = v,
            TaskFormMessage::DetailsChanged(v) => self.form.details = v,
            TaskFormMessage::StatusChanged(v) => self.form.status = v,
            TaskFormMessage::DateChanged(v) => self.form.date = v,
            TaskFormMessage::TimeChanged(v) => self.form.time = v,
            TaskFormMessage::Submit => self.submit().await,
            TaskFormMessage::Cancel => {
                if self.form.has_unsaved_changes()
                    && !self
                        .services
                        .notifier
                        .confirm("Discard unsaved changes?")
                {
                    return;
                }
                self.services.navigator.navigate(Page::Dashboard);
            }
            TaskFormMessage::CreateAnother => {
                self.created = false;
                self.form = TaskForm::default();
            }
        }
    }

    pub fn title_counter(&self) -> CharCounter {
        CharCounter::new(&self.form.title, TITLE_MAX_CHARS)
    }

    pub fn details_counter(&self) -> CharCounter {
        CharCounter::new(&self.form.details, DETAILS_MAX_CHARS)
    }

    pub fn can_submit(&self) -> bool {
        !self.submitting && self.form.is_ready()
    }

    async fn submit(&mut self) {
        let services = self.services;
        let draft = match self.form.to_draft(temporal::today()) {
            Ok(draft) => draft,
            Err(e) => {
                services.notifier.show_error(&e.to_string());
                return;
            }
        };

        self.submitting = true;
        services.loading.show();
        let result = services.api.tasks.create_task(&draft).await;
        services.loading.hide();
        self.submitting = false;

        match result {
            Ok(_) => {
                self.created = true;
                self.form = TaskForm::default();
                services.notifier.show_success("Task created");
            }
            Err(Error::Validation(e)) => services.notifier.show_error(&e.to_string()),
            Err(Error::Api(e)) => {
                log::error!("Failed to create task: {}", e);
                services.notifier.show_error(&e.to_string());
            }
        }
    }
}
