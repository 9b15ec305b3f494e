//! Application state: the task list, the form mode and the error slot.
//!
//! Requests run as spawned tasks that each post one [`Outcome`] back on a
//! channel. [`TodoApp::apply`] folds outcomes into the list in the order they
//! arrive, which is the order the requests resolved, not the order they were
//! issued. Nothing is changed speculatively, so a failure never needs undoing.

use crate::api::TodoClient;
use crate::error::{ApiError, DraftError};
use crate::task::{Task, TaskDraft, TaskId};
use std::future::Future;
use tokio::sync::mpsc::UnboundedSender;

pub const LOAD_FAILED: &str = "Failed to load todos. Please try again.";
pub const CREATE_FAILED: &str = "Failed to add todo. Please try again.";
pub const UPDATE_FAILED: &str = "Failed to update todo. Please try again.";
pub const TOGGLE_FAILED: &str = "Failed to toggle todo status. Please try again.";
pub const DELETE_FAILED: &str = "Failed to delete todo. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UiMode {
    #[default]
    Idle,
    Creating,
    Editing(Task),
}

/// Which tasks the list shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
}

impl Filter {
    pub fn next(self) -> Self {
        match self {
            Filter::All => Filter::Active,
            Filter::Active => Filter::Completed,
            Filter::Completed => Filter::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Filter::All => "all",
            Filter::Active => "active",
            Filter::Completed => "completed",
        }
    }

    pub fn matches(self, task: &Task) -> bool {
        match self {
            Filter::All => true,
            Filter::Active => !task.completed,
            Filter::Completed => task.completed,
        }
    }
}

/// A settled request, ready to be applied.
#[derive(Debug)]
pub enum Outcome {
    Loaded(Result<Vec<Task>, ApiError>),
    Created(Result<Task, ApiError>),
    Updated { id: TaskId, result: Result<Task, ApiError> },
    Toggled { id: TaskId, result: Result<Task, ApiError> },
    Deleted { id: TaskId, result: Result<(), ApiError> },
}

pub struct TodoApp {
    client: TodoClient,
    outcomes: UnboundedSender<Outcome>,
    tasks: Vec<Task>,
    mode: UiMode,
    error: Option<String>,
    loading: bool,
    loads: usize,
    filter: Filter,
    selected: usize,
    pending: usize,
}

impl TodoApp {
    pub fn new(client: TodoClient, outcomes: UnboundedSender<Outcome>) -> Self {
        Self {
            client,
            outcomes,
            tasks: Vec::new(),
            mode: UiMode::Idle,
            error: None,
            loading: true,
            loads: 0,
            filter: Filter::All,
            selected: 0,
            pending: 0,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn mode(&self) -> &UiMode {
        &self.mode
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    /// Requests issued but not yet applied.
    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn visible_tasks(&self) -> Vec<&Task> {
        self.tasks.iter().filter(|t| self.filter.matches(t)).collect()
    }

    /// (total, completed)
    pub fn counts(&self) -> (usize, usize) {
        let done = self.tasks.iter().filter(|t| t.completed).count();
        (self.tasks.len(), done)
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.visible_tasks().get(self.selected).copied()
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.visible_tasks().len() {
            self.selected += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn cycle_filter(&mut self) {
        self.filter = self.filter.next();
        self.clamp_selection();
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Fetch the whole list. Runs once on startup and again on reload.
    pub fn load(&mut self) {
        self.loading = true;
        self.loads += 1;
        let client = self.client.clone();
        self.spawn(async move { Outcome::Loaded(client.list().await) });
    }

    /// Open the create form. Only possible while no form is open.
    pub fn begin_create(&mut self) -> bool {
        if self.mode != UiMode::Idle {
            return false;
        }
        self.mode = UiMode::Creating;
        true
    }

    /// Open the edit form for `id`. Only possible while no form is open.
    pub fn begin_edit(&mut self, id: TaskId) -> bool {
        if self.mode != UiMode::Idle {
            return false;
        }
        match self.tasks.iter().find(|t| t.id == id) {
            Some(task) => {
                self.mode = UiMode::Editing(task.clone());
                true
            }
            None => false,
        }
    }

    /// Close any open form without touching the service.
    pub fn cancel(&mut self) {
        self.mode = UiMode::Idle;
    }

    /// Submit the open form. A blank title is refused here, before any request,
    /// and leaves the mode as it was.
    pub fn submit(&mut self, title: &str, description: &str) -> Result<(), DraftError> {
        let draft = TaskDraft::new(title, description).inspect_err(|err| {
            tracing::debug!("draft rejected: {}", err);
        })?;
        match &self.mode {
            UiMode::Idle => tracing::debug!("submit with no open form ignored"),
            UiMode::Creating => self.create(draft),
            UiMode::Editing(task) => {
                let id = task.id;
                self.update(id, draft);
            }
        }
        Ok(())
    }

    pub fn create(&mut self, draft: TaskDraft) {
        self.error = None;
        let client = self.client.clone();
        self.spawn(async move { Outcome::Created(client.create(&draft).await) });
    }

    pub fn update(&mut self, id: TaskId, draft: TaskDraft) {
        self.error = None;
        let client = self.client.clone();
        self.spawn(async move {
            let result = client.update(id, &draft).await;
            Outcome::Updated { id, result }
        });
    }

    pub fn toggle(&mut self, id: TaskId) {
        self.error = None;
        let client = self.client.clone();
        self.spawn(async move {
            let result = client.toggle(id).await;
            Outcome::Toggled { id, result }
        });
    }

    pub fn delete(&mut self, id: TaskId) {
        self.error = None;
        let client = self.client.clone();
        self.spawn(async move {
            let result = client.delete(id).await;
            Outcome::Deleted { id, result }
        });
    }

    fn spawn<F>(&mut self, request: F)
    where
        F: Future<Output = Outcome> + Send + 'static,
    {
        self.pending += 1;
        let outcomes = self.outcomes.clone();
        tokio::spawn(async move {
            // The receiver is gone once the app has shut down; drop the result.
            let _ = outcomes.send(request.await);
        });
    }

    /// Reconcile local state with a settled request.
    pub fn apply(&mut self, outcome: Outcome) {
        self.pending = self.pending.saturating_sub(1);
        match outcome {
            Outcome::Loaded(result) => {
                match result {
                    Ok(tasks) => {
                        tracing::info!("loaded {} todos", tasks.len());
                        self.tasks = tasks;
                        self.error = None;
                    }
                    Err(err) => self.fail(LOAD_FAILED, &err),
                }
                // Still loading while a newer reload is out.
                self.loads = self.loads.saturating_sub(1);
                self.loading = self.loads > 0;
            }
            Outcome::Created(Ok(task)) => {
                tracing::info!(id = task.id, "todo created");
                append(&mut self.tasks, task);
                if self.mode == UiMode::Creating {
                    self.mode = UiMode::Idle;
                }
            }
            Outcome::Created(Err(err)) => self.fail(CREATE_FAILED, &err),
            Outcome::Updated { id, result: Ok(task) } => {
                tracing::info!(id, "todo updated");
                replace_by_id(&mut self.tasks, id, task);
                if matches!(&self.mode, UiMode::Editing(t) if t.id == id) {
                    self.mode = UiMode::Idle;
                }
            }
            Outcome::Updated { result: Err(err), .. } => self.fail(UPDATE_FAILED, &err),
            Outcome::Toggled { id, result: Ok(task) } => {
                tracing::info!(id, completed = task.completed, "todo toggled");
                replace_by_id(&mut self.tasks, id, task);
            }
            Outcome::Toggled { result: Err(err), .. } => self.fail(TOGGLE_FAILED, &err),
            Outcome::Deleted { id, result: Ok(()) } => {
                tracing::info!(id, "todo deleted");
                remove_by_id(&mut self.tasks, id);
            }
            Outcome::Deleted { result: Err(err), .. } => self.fail(DELETE_FAILED, &err),
        }
        self.clamp_selection();
    }

    fn fail(&mut self, message: &str, err: &ApiError) {
        tracing::error!(status = ?err.cause().status(), "{}", err);
        self.error = Some(message.to_string());
    }

    fn clamp_selection(&mut self) {
        let len = self.visible_tasks().len();
        self.selected = self.selected.min(len.saturating_sub(1));
    }
}

pub fn append(tasks: &mut Vec<Task>, task: Task) {
    tasks.push(task);
}

/// Swap in `task` where `id` sits. Returns false when `id` is not in the list.
pub fn replace_by_id(tasks: &mut [Task], id: TaskId, task: Task) -> bool {
    match tasks.iter_mut().find(|t| t.id == id) {
        Some(slot) => {
            *slot = task;
            true
        }
        None => false,
    }
}

pub fn remove_by_id(tasks: &mut Vec<Task>, id: TaskId) -> bool {
    let before = tasks.len();
    tasks.retain(|t| t.id != id);
    tasks.len() != before
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Cause;
    use reqwest::{StatusCode, Url};
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    fn task(id: TaskId, title: &str, completed: bool) -> Task {
        Task {
            id,
            title: title.to_string(),
            description: None,
            completed,
            created_at: "2024-05-01T12:00:00".to_string(),
        }
    }

    fn not_found() -> Cause {
        Cause::Status(StatusCode::NOT_FOUND)
    }

    fn app() -> (TodoApp, UnboundedReceiver<Outcome>) {
        let url = Url::parse("http://127.0.0.1:9").unwrap();
        let (tx, rx) = unbounded_channel();
        (TodoApp::new(TodoClient::new(&url).unwrap(), tx), rx)
    }

    fn loaded(tasks: Vec<Task>) -> TodoApp {
        let (mut app, _rx) = app();
        app.apply(Outcome::Loaded(Ok(tasks)));
        app
    }

    #[test]
    fn list_transforms() {
        let mut tasks = vec![task(1, "a", false), task(2, "b", false)];

        append(&mut tasks, task(3, "c", false));
        assert_eq!(tasks.iter().map(|t| t.id).collect::<Vec<_>>(), [1, 2, 3]);

        assert!(replace_by_id(&mut tasks, 2, task(2, "B", true)));
        assert_eq!(tasks[1], task(2, "B", true));
        assert!(!replace_by_id(&mut tasks, 9, task(9, "z", false)));
        assert_eq!(tasks.len(), 3);

        assert!(remove_by_id(&mut tasks, 1));
        assert!(!remove_by_id(&mut tasks, 1));
        assert_eq!(tasks.iter().map(|t| t.id).collect::<Vec<_>>(), [2, 3]);
    }

    #[test]
    fn initial_state() {
        let (app, _rx) = app();
        assert!(app.is_loading());
        assert!(app.tasks().is_empty());
        assert_eq!(app.mode(), &UiMode::Idle);
        assert_eq!(app.error(), None);
    }

    #[tokio::test]
    async fn overlapping_reloads_keep_loading_until_the_last_settles() {
        let (mut app, _rx) = app();
        app.load();
        app.load();
        app.apply(Outcome::Loaded(Ok(vec![task(1, "a", false)])));
        assert!(app.is_loading());
        app.apply(Outcome::Loaded(Ok(vec![task(1, "a", false), task(2, "b", false)])));
        assert!(!app.is_loading());
        assert_eq!(app.tasks().len(), 2);
    }

    #[test]
    fn load_failure_sets_message_and_clears_loading() {
        let (mut app, _rx) = app();
        app.apply(Outcome::Loaded(Err(ApiError::List(not_found()))));
        assert_eq!(app.error(), Some(LOAD_FAILED));
        assert!(app.tasks().is_empty());
        assert!(!app.is_loading());
    }

    #[test]
    fn load_success_clears_previous_error() {
        let (mut app, _rx) = app();
        app.apply(Outcome::Loaded(Err(ApiError::List(not_found()))));
        app.apply(Outcome::Loaded(Ok(vec![task(1, "a", false)])));
        assert_eq!(app.error(), None);
        assert_eq!(app.tasks().len(), 1);
    }

    #[test]
    fn forms_open_only_from_idle() {
        let mut app = loaded(vec![task(1, "a", false)]);

        assert!(app.begin_create());
        assert!(!app.begin_create());
        assert!(!app.begin_edit(1));
        app.cancel();

        assert!(app.begin_edit(1));
        assert_eq!(app.mode(), &UiMode::Editing(task(1, "a", false)));
        assert!(!app.begin_create());
        app.cancel();
        assert_eq!(app.mode(), &UiMode::Idle);

        assert!(!app.begin_edit(42));
        assert_eq!(app.mode(), &UiMode::Idle);
    }

    #[test]
    fn blank_title_is_rejected_without_a_request() {
        let mut app = loaded(vec![]);
        app.begin_create();
        assert_eq!(app.submit("   ", "details"), Err(DraftError::BlankTitle));
        assert_eq!(app.mode(), &UiMode::Creating);
        assert_eq!(app.pending(), 0);
    }

    #[test]
    fn created_task_is_appended_and_form_closes() {
        let mut app = loaded(vec![task(1, "a", false)]);
        app.begin_create();
        app.apply(Outcome::Created(Ok(task(2, "b", false))));
        assert_eq!(app.tasks().last(), Some(&task(2, "b", false)));
        assert_eq!(app.mode(), &UiMode::Idle);
    }

    #[test]
    fn failed_mutation_keeps_list_and_mode() {
        let mut app = loaded(vec![task(1, "a", false)]);
        app.begin_edit(1);

        app.apply(Outcome::Updated { id: 1, result: Err(ApiError::Update(not_found())) });
        assert_eq!(app.error(), Some(UPDATE_FAILED));
        assert_eq!(app.mode(), &UiMode::Editing(task(1, "a", false)));
        assert_eq!(app.tasks(), &[task(1, "a", false)]);

        app.apply(Outcome::Deleted { id: 1, result: Err(ApiError::Delete(not_found())) });
        assert_eq!(app.error(), Some(DELETE_FAILED));
        assert_eq!(app.tasks().len(), 1);

        app.apply(Outcome::Toggled { id: 1, result: Err(ApiError::Toggle(not_found())) });
        assert_eq!(app.error(), Some(TOGGLE_FAILED));

        app.cancel();
        app.begin_create();
        app.apply(Outcome::Created(Err(ApiError::Create(not_found()))));
        assert_eq!(app.error(), Some(CREATE_FAILED));
        assert_eq!(app.mode(), &UiMode::Creating);
    }

    #[test]
    fn update_closes_only_the_matching_edit_form() {
        let mut app = loaded(vec![task(1, "a", false), task(2, "b", false)]);
        app.begin_edit(2);
        app.apply(Outcome::Updated { id: 1, result: Ok(task(1, "A", false)) });
        assert_eq!(app.tasks()[0].title, "A");
        assert!(matches!(app.mode(), UiMode::Editing(t) if t.id == 2));

        app.apply(Outcome::Updated { id: 2, result: Ok(task(2, "B", false)) });
        assert_eq!(app.mode(), &UiMode::Idle);
    }

    #[test]
    fn outcomes_apply_in_resolution_order() {
        let mut app = loaded(vec![task(1, "a", false)]);
        // Two toggles raced; whichever response lands last wins.
        app.apply(Outcome::Toggled { id: 1, result: Ok(task(1, "a", false)) });
        app.apply(Outcome::Toggled { id: 1, result: Ok(task(1, "a", true)) });
        assert!(app.tasks()[0].completed);
    }

    #[test]
    fn filter_and_selection() {
        let mut app = loaded(vec![task(1, "a", false), task(2, "b", true), task(3, "c", false)]);
        assert_eq!(app.counts(), (3, 1));

        app.select_next();
        app.select_next();
        app.select_next();
        assert_eq!(app.selected_task().map(|t| t.id), Some(3));

        app.cycle_filter();
        assert_eq!(app.filter(), Filter::Active);
        assert_eq!(app.visible_tasks().iter().map(|t| t.id).collect::<Vec<_>>(), [1, 3]);
        assert_eq!(app.selected_task().map(|t| t.id), Some(3));

        app.cycle_filter();
        assert_eq!(app.filter(), Filter::Completed);
        assert_eq!(app.selected_task().map(|t| t.id), Some(2));

        app.apply(Outcome::Deleted { id: 2, result: Ok(()) });
        assert_eq!(app.selected(), 0);
        assert_eq!(app.selected_task(), None);

        app.cycle_filter();
        assert_eq!(app.filter(), Filter::All);
        app.select_previous();
        assert_eq!(app.selected_task().map(|t| t.id), Some(1));
    }

    #[test]
    fn dismiss_error_empties_the_slot() {
        let (mut app, _rx) = app();
        app.apply(Outcome::Loaded(Err(ApiError::List(not_found()))));
        app.dismiss_error();
        assert_eq!(app.error(), None);
    }
}
