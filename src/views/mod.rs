//! Headless view controllers.
//!
//! Each controller owns its page state and is driven by a message enum through
//! a single `update` entry point. Output goes through the [`Notifier`],
//! [`LoadingIndicator`] and [`Navigator`] it was built with.

pub mod auth;
pub mod dashboard;
pub mod password;
pub mod profile;
pub mod task_form;

use std::cell::{Cell, RefCell};
use std::time::{Duration, Instant};

use crate::api::{Api, AuthGate};
use crate::navigation::Navigator;

/// How long an identical notification of the same kind stays suppressed.
pub const DUPLICATE_WINDOW: Duration = Duration::from_secs(3);

pub trait Notifier {
    fn show_error(&self, message: &str);
    fn show_success(&self, message: &str);

    /// Ask before a destructive action. Hosts without a prompt say yes.
    fn confirm(&self, _question: &str) -> bool {
        true
    }
}

pub trait LoadingIndicator {
    fn show(&self);
    fn hide(&self);
}

/// Everything a controller borrows from its host.
#[derive(Clone, Copy)]
pub struct Services<'a> {
    pub api: &'a Api,
    pub notifier: &'a dyn Notifier,
    pub loading: &'a dyn LoadingIndicator,
    pub navigator: &'a dyn Navigator,
}

impl<'a> Services<'a> {
    pub fn gate(&self) -> AuthGate<'a> {
        AuthGate::new(&self.api.account, self.navigator)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Error,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

/// Records notifications, dropping repeats of the last message of each kind
/// inside [`DUPLICATE_WINDOW`].
#[derive(Debug, Default)]
pub struct NotificationCenter {
    shown: RefCell<Vec<Notification>>,
    last_error: RefCell<Option<(String, Instant)>>,
    last_success: RefCell<Option<(String, Instant)>>,
    confirm_answer: Cell<Option<bool>>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every confirmation prompt with `answer`.
    pub fn answering(answer: bool) -> Self {
        let center = Self::default();
        center.confirm_answer.set(Some(answer));
        center
    }

    pub fn errors(&self) -> Vec<String> {
        self.messages(NotificationKind::Error)
    }

    pub fn successes(&self) -> Vec<String> {
        self.messages(NotificationKind::Success)
    }

    pub fn last_error(&self) -> Option<String> {
        self.errors().pop()
    }

    fn messages(&self, kind: NotificationKind) -> Vec<String> {
        self.shown
            .borrow()
            .iter()
            .filter(|n| n.kind == kind)
            .map(|n| n.message.clone())
            .collect()
    }

    fn push(&self, kind: NotificationKind, message: &str, now: Instant) {
        let slot = match kind {
            NotificationKind::Error => &self.last_error,
            NotificationKind::Success => &self.last_success,
        };
        let mut last = slot.borrow_mut();
        if let Some((prev, at)) = last.as_ref() {
            if prev == message && now.duration_since(*at) < DUPLICATE_WINDOW {
                log::debug!("Suppressing duplicate notification: {}", message);
                return;
            }
        }
        *last = Some((message.to_string(), now));
        match kind {
            NotificationKind::Error => log::warn!("{}", message),
            NotificationKind::Success => log::info!("{}", message),
        }
        self.shown.borrow_mut().push(Notification {
            kind,
            message: message.to_string(),
        });
    }
}

impl Notifier for NotificationCenter {
    fn show_error(&self, message: &str) {
        self.push(NotificationKind::Error, message, Instant::now());
    }

    fn show_success(&self, message: &str) {
        self.push(NotificationKind::Success, message, Instant::now());
    }

    fn confirm(&self, question: &str) -> bool {
        let answer = self.confirm_answer.get().unwrap_or(true);
        log::debug!("Confirm \"{}\": {}", question, answer);
        answer
    }
}

/// Loading overlay state, with a count of how often it was raised.
#[derive(Debug, Default)]
pub struct LoadingState {
    visible: Cell<bool>,
    shown: Cell<usize>,
}

impl LoadingState {
    pub fn is_visible(&self) -> bool {
        self.visible.get()
    }

    pub fn times_shown(&self) -> usize {
        self.shown.get()
    }
}

impl LoadingIndicator for LoadingState {
    fn show(&self) {
        self.visible.set(true);
        self.shown.set(self.shown.get() + 1);
    }

    fn hide(&self) {
        self.visible.set(false);
    }
}

/// Character counter shown under a text field: `n/max`, with a warning past 90%.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharCounter {
    pub count: usize,
    pub max: usize,
}

impl CharCounter {
    pub fn new(text: &str, max: usize) -> Self {
        Self {
            count: text.chars().count(),
            max,
        }
    }

    pub fn is_warning(&self) -> bool {
        self.count * 10 > self.max * 9
    }

    pub fn is_over(&self) -> bool {
        self.count > self.max
    }
}

impl std::fmt::Display for CharCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.count, self.max)
    }
}
