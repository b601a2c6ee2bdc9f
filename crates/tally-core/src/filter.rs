use tracing::trace;

use crate::date::is_canonical;
use crate::task::Task;

#[derive(Debug, Clone)]
pub struct FilterConfig {
    pub show_completed: bool,
    pub search_text: String,
    pub date_from: String,
    pub date_to: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            show_completed: true,
            search_text: String::new(),
            date_from: String::new(),
            date_to: String::new(),
        }
    }
}

pub fn matches(task: &Task, filter: &FilterConfig) -> bool {
    let ok = eval(task, filter);
    trace!(id = %task.id, title = %task.title, ok, "filter evaluation");
    ok
}

fn eval(task: &Task, filter: &FilterConfig) -> bool {
    if !filter.show_completed && task.completed {
        return false;
    }

    if !filter.search_text.is_empty() {
        let needle = filter.search_text.to_lowercase();
        if !task.title.to_lowercase().contains(&needle)
            && !task.description.to_lowercase().contains(&needle)
        {
            return false;
        }
    }

    if !filter.date_from.is_empty() || !filter.date_to.is_empty() {
        if !is_canonical(&task.date) {
            return false;
        }
        if !filter.date_from.is_empty() && task.date < filter.date_from {
            return false;
        }
        if !filter.date_to.is_empty() && task.date > filter.date_to {
            return false;
        }
    }

    true
}

pub fn apply(tasks: &[Task], filter: &FilterConfig) -> Vec<Task> {
    tasks
        .iter()
        .filter(|task| matches(task, filter))
        .cloned()
        .collect()
}
