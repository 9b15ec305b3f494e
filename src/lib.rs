//! Terminal client for a todo REST service.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod form;
pub mod task;
pub mod ui;

pub use api::TodoClient;
pub use app::{Outcome, TodoApp, UiMode};
pub use error::{ApiError, DraftError};
pub use task::{Task, TaskDraft, TaskId};
