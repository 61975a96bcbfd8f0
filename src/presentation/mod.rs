//! Display rules for the task board: ordering, day labels, progress and the
//! HTML fragment the browser swaps in after every change.

use std::cmp::Ordering;

use askama::Template;

use crate::routes::todos::model::TaskView;

/// Incomplete before complete, then earliest due date (undated last), then
/// oldest first. `sort_by` is stable so equal rows keep their list order.
pub fn display_order(a: &TaskView, b: &TaskView) -> Ordering {
    a.completed
        .cmp(&b.completed)
        .then_with(|| match (&a.due_date, &b.due_date) {
            (Some(x), Some(y)) => x.cmp(y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.creation_date.cmp(&b.creation_date))
}

pub fn sort_for_display(tasks: &mut [TaskView]) {
    tasks.sort_by(display_order);
}

pub fn label_for_days(days: Option<i64>) -> String {
    match days {
        None => String::new(),
        Some(n) if n > 1 => format!("Due in {} days", n),
        Some(1) => "Due in 1 day".to_string(),
        Some(0) => "Due today".to_string(),
        Some(-1) => "Overdue by 1 day".to_string(),
        Some(n) => format!("Overdue by {} days", n.abs()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
    /// Rounded half up, 0 for an empty list
    pub percent: usize,
    /// Every task is complete and there is at least one
    pub celebrate: bool,
}

impl Progress {
    pub fn of(tasks: &[TaskView]) -> Self {
        let total = tasks.len();
        let done = tasks.iter().filter(|t| t.completed).count();
        let percent = if total == 0 {
            0
        } else {
            (done * 200 + total) / (2 * total)
        };

        Self {
            done,
            total,
            percent,
            celebrate: total > 0 && done == total,
        }
    }
}

/// Text under the task: "Due: 2024-05-01 • Due in 3 days"
pub fn due_line(task: &TaskView) -> String {
    let label = label_for_days(task.days_until_due);
    match &task.due_date {
        Some(date) if !label.is_empty() => format!("Due: {} \u{2022} {}", date, label),
        Some(date) => format!("Due: {}", date),
        None => label,
    }
}

/// One `<li>` of the board, with the due text already worked out
#[derive(Debug)]
pub struct BoardRow {
    pub id: String,
    pub task: String,
    pub due: String,
    pub due_line: String,
    pub completed: bool,
}

impl From<&TaskView> for BoardRow {
    fn from(task: &TaskView) -> Self {
        Self {
            id: task.id.clone(),
            task: task.task.clone(),
            due: task.due_date.clone().unwrap_or_default(),
            due_line: due_line(task),
            completed: task.completed,
        }
    }
}

#[derive(Template, Debug)]
#[template(path = "board.html")]
pub struct Board {
    pub rows: Vec<BoardRow>,
    pub progress: Progress,
}

impl Board {
    pub fn new(mut tasks: Vec<TaskView>) -> Self {
        let progress = Progress::of(&tasks);
        sort_for_display(&mut tasks);

        Self {
            rows: tasks.iter().map(BoardRow::from).collect(),
            progress,
        }
    }
}
