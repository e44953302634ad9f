use chrono::{DateTime, Utc};

use super::Services;
use crate::core::profile::UserProfile;
use crate::core::task::{Task, TaskForm, TaskPatch, TaskStatus};
use crate::core::temporal;
use crate::error::{ApiError, Error};
use crate::navigation::Page;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    All,
    Status(TaskStatus),
}

impl Filter {
    pub fn admits(&self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Status(status) => task.status == *status,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Kanban,
    List,
}

/// One Kanban column after filtering.
#[derive(Debug)]
pub struct Column<'t> {
    pub status: TaskStatus,
    pub tasks: Vec<&'t Task>,
}

impl Column<'_> {
    pub fn count(&self) -> usize {
        self.tasks.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditState {
    pub task_id: String,
    pub form: TaskForm,
}

#[derive(Debug, Clone)]
pub enum DashboardMessage {
    Init,
    Refresh,
    SetFilter(Filter),
    SetView(ViewMode),
    ToggleStatus(String),
    Delete(String),
    StartEdit(String),
    EditChanged(TaskForm),
    SaveEdit,
    CancelEdit,
    Open(Page),
    Logout,
}

pub struct Dashboard<'a> {
    services: Services<'a>,
    pub profile: Option<UserProfile>,
    pub tasks: Vec<Task>,
    pub filter: Filter,
    pub view: ViewMode,
    pub editing: Option<EditState>,
    pub authorized: bool,
}

impl<'a> Dashboard<'a> {
    pub fn new(services: Services<'a>) -> Self {
        Self {
            services,
            profile: None,
            tasks: Vec::new(),
            filter: Filter::default(),
            view: ViewMode::default(),
            editing: None,
            authorized: false,
        }
    }

    pub async fn update(&mut self, message: DashboardMessage) {
        match message {
            DashboardMessage::Init => self.init().await,
            DashboardMessage::Refresh => self.load_tasks().await,
            DashboardMessage::SetFilter(filter) => self.filter = filter,
            DashboardMessage::SetView(view) => self.view = view,
            DashboardMessage::ToggleStatus(id) => self.toggle_status(&id).await,
            DashboardMessage::Delete(id) => self.delete(&id).await,
            DashboardMessage::StartEdit(id) => {
                self.editing = self.find(&id).map(|task| EditState {
                    task_id: id.clone(),
                    form: TaskForm::from_task(task),
                });
                if self.editing.is_none() {
                    log::warn!("No task {} to edit", id);
                }
            }
            DashboardMessage::EditChanged(form) => {
                if let Some(edit) = self.editing.as_mut() {
                    edit.form = form;
                }
            }
            DashboardMessage::SaveEdit => self.save_edit().await,
            DashboardMessage::CancelEdit => self.editing = None,
            DashboardMessage::Open(page) => self.services.navigator.navigate(page),
            DashboardMessage::Logout => {
                self.services.api.account.logout().await;
                self.services.navigator.navigate(Page::Auth);
            }
        }
    }

    async fn init(&mut self) {
        let services = self.services;
        services.loading.show();
        self.authorized = services.gate().check_auth().await;
        if !self.authorized {
            services.loading.hide();
            return;
        }

        let (profile, tasks) = futures::join!(
            services.api.profile.get_profile(),
            services.api.tasks.get_tasks()
        );
        match profile {
            Ok(profile) => self.profile = Some(profile),
            Err(e) => {
                log::error!("Failed to load profile: {}", e);
                services.notifier.show_error("Failed to load user profile");
            }
        }
        self.set_tasks(tasks);
        services.loading.hide();
    }

    async fn load_tasks(&mut self) {
        let tasks = self.services.api.tasks.get_tasks().await;
        self.set_tasks(tasks);
    }

    fn set_tasks(&mut self, tasks: Result<Vec<Task>, ApiError>) {
        match tasks {
            Ok(tasks) => self.tasks = tasks,
            Err(e) => {
                log::error!("Failed to load tasks: {}", e);
                self.services
                    .notifier
                    .show_error(&format!("Failed to load tasks: {}", e));
            }
        }
    }

    pub fn greeting(&self) -> String {
        match &self.profile {
            Some(profile) => format!("Hello, {}!", profile.display_name()),
            None => "Hello!".to_string(),
        }
    }

    pub fn find(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    /// Kanban columns in status order. The filter applies inside each column.
    pub fn columns(&self) -> Vec<Column<'_>> {
        TaskStatus::ALL
            .iter()
            .map(|&status| Column {
                status,
                tasks: self
                    .tasks
                    .iter()
                    .filter(|t| t.status == status && self.filter.admits(t))
                    .collect(),
            })
            .collect()
    }

    /// List view: filtered, soonest due first, undated tasks last.
    pub fn list(&self) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self.tasks.iter().filter(|t| self.filter.admits(t)).collect();
        tasks.sort_by_key(|t| (t.date.is_none(), t.date));
        tasks
    }

    pub fn overdue(&self, now: DateTime<Utc>) -> Vec<&Task> {
        self.tasks.iter().filter(|t| t.is_overdue(now)).collect()
    }

    async fn toggle_status(&mut self, id: &str) {
        let Some(current) = self.find(id).map(|t| t.status) else {
            log::warn!("No task {} to toggle", id);
            return;
        };
        let patch = TaskPatch::status(current.toggled());
        self.send_patch(id, patch, |status| format!("Task marked as {}", status))
            .await;
    }

    async fn save_edit(&mut self) {
        let Some(edit) = self.editing.clone() else {
            return;
        };
        let patch = match edit.form.to_patch(temporal::today()) {
            Ok(patch) => patch,
            Err(e) => {
                self.services.notifier.show_error(&e.to_string());
                return;
            }
        };
        if self
            .send_patch(&edit.task_id, patch, |_| "Task updated".to_string())
            .await
        {
            self.editing = None;
        }
    }

    /// Sends `patch`, then applies the server's copy of the task (or the
    /// patch itself when the reply carries none) to the in-memory list.
    async fn send_patch(
        &mut self,
        id: &str,
        patch: TaskPatch,
        success: impl FnOnce(TaskStatus) -> String,
    ) -> bool {
        let services = self.services;
        match services.api.tasks.update_task(id, &patch).await {
            Ok(echoed) => {
                let Some(task) = self.find_mut(id) else {
                    return true;
                };
                match echoed {
                    Some(updated) => *task = updated,
                    None => task.apply(&patch),
                }
                let status = task.status;
                services.notifier.show_success(&success(status));
                true
            }
            Err(Error::Validation(e)) => {
                services.notifier.show_error(&e.to_string());
                false
            }
            Err(Error::Api(e)) => {
                log::error!("Failed to update task {}: {}", id, e);
                services
                    .notifier
                    .show_error(&format!("Failed to update task: {}", e));
                false
            }
        }
    }

    async fn delete(&mut self, id: &str) {
        let services = self.services;
        if !services.notifier.confirm("Delete this task?") {
            return;
        }
        match services.api.tasks.delete_task(id).await {
            Ok(_) => {
                self.tasks.retain(|t| t.id != id);
                if self.editing.as_ref().is_some_and(|e| e.task_id == id) {
                    self.editing = None;
                }
                services.notifier.show_success("Task deleted");
            }
            Err(e) => {
                log::error!("Failed to delete task {}: {}", id, e);
                services
                    .notifier
                    .show_error(&format!("Failed to delete task: {}", e));
            }
        }
    }
}
