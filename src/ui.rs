use crate::app::{Outcome, TodoApp, UiMode};
use crate::form::{Field, TaskForm};
use crate::task::Task;
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io;
use tokio::sync::mpsc::UnboundedReceiver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

/// Drive the UI until the user quits. Key presses and settled requests are
/// handled one at a time on the current task.
pub async fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut TodoApp,
    outcomes: &mut UnboundedReceiver<Outcome>,
) -> io::Result<()> {
    let mut events = EventStream::new();
    let mut form = TaskForm::default();
    app.load();
    loop {
        let view: &TodoApp = app;
        terminal.draw(|f| draw(f, view, &form))?;

        tokio::select! {
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    if handle_key(app, &mut form, key) == Control::Quit {
                        return Ok(());
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => return Err(err),
                None => return Ok(()),
            },
            Some(outcome) = outcomes.recv() => app.apply(outcome),
        }
    }
}

pub fn handle_key(app: &mut TodoApp, form: &mut TaskForm, key: KeyEvent) -> Control {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Control::Quit;
    }
    if *app.mode() == UiMode::Idle {
        return handle_idle_key(app, form, key);
    }
    handle_form_key(app, form, key);
    Control::Continue
}

fn handle_idle_key(app: &mut TodoApp, form: &mut TaskForm, key: KeyEvent) -> Control {
    // Rows are hidden while loading; nothing is selectable.
    let selected = if app.is_loading() {
        None
    } else {
        app.selected_task().map(|t| t.id)
    };
    match key.code {
        KeyCode::Char('q') => return Control::Quit,
        KeyCode::Char('a') => {
            if app.begin_create() {
                *form = TaskForm::default();
            }
        }
        KeyCode::Char('e') => {
            if let Some(id) = selected {
                app.begin_edit(id);
                if let UiMode::Editing(task) = app.mode() {
                    *form = TaskForm::for_task(task);
                }
            }
        }
        KeyCode::Char(' ') => {
            if let Some(id) = selected {
                app.toggle(id);
            }
        }
        KeyCode::Char('d') => {
            if let Some(id) = selected {
                app.delete(id);
            }
        }
        KeyCode::Up | KeyCode::Char('k') => app.select_previous(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Char('f') => app.cycle_filter(),
        KeyCode::Char('r') => app.load(),
        KeyCode::Char('x') => app.dismiss_error(),
        _ => {}
    }
    Control::Continue
}

fn handle_form_key(app: &mut TodoApp, form: &mut TaskForm, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.cancel(),
        KeyCode::Tab | KeyCode::BackTab => form.switch_focus(),
        KeyCode::Enter => {
            if let Err(err) = app.submit(&form.title, &form.description) {
                tracing::debug!("form not submitted: {}", err);
            }
        }
        KeyCode::Backspace => form.backspace(),
        KeyCode::Char(c) if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
            form.push(c)
        }
        _ => {}
    }
}

pub fn draw(f: &mut Frame, app: &TodoApp, form: &TaskForm) {
    let error_height = if app.error().is_some() { 3 } else { 0 };
    let form_height = if *app.mode() == UiMode::Idle { 0 } else { 5 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Length(3),
            Constraint::Length(error_height),
            Constraint::Length(form_height),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(f.area());

    draw_header(f, app, chunks[0]);
    if let Some(message) = app.error() {
        let banner = Paragraph::new(message)
            .style(Style::default().fg(Color::Red))
            .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Red)))
            .wrap(Wrap { trim: true });
        f.render_widget(banner, chunks[1]);
    }
    match app.mode() {
        UiMode::Idle => {}
        UiMode::Creating => draw_form(f, form, "Add Todo", chunks[2]),
        UiMode::Editing(_) => draw_form(f, form, "Edit Todo", chunks[2]),
    }
    draw_list(f, app, chunks[3]);

    let keys = if *app.mode() == UiMode::Idle {
        "a add  e edit  space toggle  d delete  f filter  r reload  x dismiss  q quit"
    } else {
        "tab switch field  enter save  esc cancel"
    };
    f.render_widget(
        Paragraph::new(keys).style(Style::default().fg(Color::DarkGray)),
        chunks[4],
    );
}

fn draw_header(f: &mut Frame, app: &TodoApp, area: Rect) {
    let (total, done) = app.counts();
    let mut spans = vec![
        Span::styled("Todo App", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!("  {}/{} done  [{}]", done, total, app.filter().label())),
    ];
    if app.pending() > 0 {
        spans.push(Span::styled(
            format!("  {} in flight", app.pending()),
            Style::default().fg(Color::Yellow),
        ));
    }
    f.render_widget(
        Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL)),
        area,
    );
}

fn draw_form(f: &mut Frame, form: &TaskForm, title: &str, area: Rect) {
    let field = |label: &str, value: &str, placeholder: &str, which: Field| {
        let label_style = if form.focus == which {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let value = if value.is_empty() {
            Span::styled(placeholder.to_string(), Style::default().fg(Color::DarkGray))
        } else {
            Span::raw(value.to_string())
        };
        Line::from(vec![Span::styled(format!("{:<9}", label), label_style), value])
    };
    let submit_style = if form.can_submit() {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let lines = vec![
        field("Title", &form.title, "What needs to be done?", Field::Title),
        field("Details", &form.description, "Add details (optional)", Field::Description),
        Line::from(Span::styled(format!("[enter] {}", title), submit_style)),
    ];
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_list(f: &mut Frame, app: &TodoApp, area: Rect) {
    let block = Block::default().title("Your Todos").borders(Borders::ALL);
    let visible = app.visible_tasks();
    if app.is_loading() || visible.is_empty() {
        let message = if app.is_loading() {
            "Loading todos..."
        } else if app.tasks().is_empty() {
            "No todos yet. Add one to get started!"
        } else {
            "Nothing matches this filter."
        };
        let text = Paragraph::new(message)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(text, area);
        return;
    }

    let items: Vec<ListItem> = visible.iter().map(|t| task_item(t)).collect();
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");
    let mut state = ListState::default().with_selected(Some(app.selected()));
    f.render_stateful_widget(list, area, &mut state);
}

fn task_item(task: &Task) -> ListItem<'static> {
    let (mark, title_style) = if task.completed {
        (
            "[x] ",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::CROSSED_OUT),
        )
    } else {
        ("[ ] ", Style::default().fg(Color::White))
    };
    let mut lines = vec![Line::from(vec![
        Span::raw(mark),
        Span::styled(task.title.clone(), title_style),
        Span::styled(
            format!("  {}", task.created_at_display()),
            Style::default().fg(Color::DarkGray),
        ),
    ])];
    if let Some(description) = &task.description {
        let mut style = Style::default().fg(Color::Gray);
        if task.completed {
            style = style.add_modifier(Modifier::CROSSED_OUT);
        }
        lines.push(Line::from(Span::styled(format!("    {}", description), style)));
    }
    ListItem::new(lines)
}
