use serde::Deserialize;

use super::http::{HttpClient, RequestOptions, ResponseBody};
use crate::core::profile::ServerMessage;
use crate::core::task::{Task, TaskDraft, TaskPatch};
use crate::error::{ApiError, Result};

/// Task CRUD. Nothing is cached; every call goes to the server.
#[derive(Clone)]
pub struct TasksClient {
    http: HttpClient,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TaskList {
    Bare(Vec<Task>),
    Wrapped { tasks: Vec<Task> },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TaskEnvelope {
    Bare(Task),
    Wrapped { task: Task },
}

impl TaskEnvelope {
    fn into_task(self) -> Task {
        match self {
            Self::Bare(task) | Self::Wrapped { task } => task,
        }
    }
}

fn task_path(id: &str) -> String {
    format!("/tasks/{}", urlencoding::encode(id))
}

impl TasksClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// A `null` or empty body means the user has no tasks yet, whatever
    /// content type it came with.
    pub async fn get_tasks(&self) -> Result<Vec<Task>, ApiError> {
        let body = self.http.request("/tasks", RequestOptions::get()).await?;
        if matches!(&body, ResponseBody::Text(text) if text.trim().is_empty()) {
            return Ok(Vec::new());
        }
        let tasks = match body.into_json::<Option<TaskList>>()? {
            Some(TaskList::Bare(tasks) | TaskList::Wrapped { tasks }) => tasks,
            None => Vec::new(),
        };
        log::debug!("Loaded {} tasks", tasks.len());
        Ok(tasks)
    }

    pub async fn get_task(&self, id: &str) -> Result<Task, ApiError> {
        let body = self.http.request(&task_path(id), RequestOptions::get()).await?;
        Ok(body.into_json::<TaskEnvelope>()?.into_task())
    }

    /// Validates locally, then `POST /tasks/new`. Returns the created task
    /// when the server echoes it back.
    pub async fn create_task(&self, draft: &TaskDraft) -> Result<Option<Task>> {
        draft.validate()?;
        let options = RequestOptions::post().json(draft)?;
        let body = self.http.request("/tasks/new", options).await?;
        log::info!("Created task \"{}\"", draft.title);
        Ok(echoed_task(body))
    }

    pub async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<Option<Task>> {
        patch.validate()?;
        let options = RequestOptions::put().json(patch)?;
        let body = self.http.request(&task_path(id), options).await?;
        Ok(echoed_task(body))
    }

    pub async fn delete_task(&self, id: &str) -> Result<ServerMessage, ApiError> {
        let body = self
            .http
            .request(&task_path(id), RequestOptions::delete())
            .await?;
        log::info!("Deleted task {}", id);
        Ok(body.into_json().unwrap_or_default())
    }
}

fn echoed_task(body: ResponseBody) -> Option<Task> {
    body.into_json::<TaskEnvelope>()
        .map(TaskEnvelope::into_task)
        .ok()
}
