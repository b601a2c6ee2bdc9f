use std::cmp::Ordering;
use std::str::FromStr;

use anyhow::anyhow;

use crate::date::parse_for_comparison;
use crate::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Completed,
    Title,
    Priority,
    Date,
}

impl FromStr for SortField {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "completed" | "done" => Ok(SortField::Completed),
            "title" => Ok(SortField::Title),
            "priority" => Ok(SortField::Priority),
            "date" => Ok(SortField::Date),
            other => Err(anyhow!(
                "invalid sort field: {other} (expected completed, title, priority or date)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl FromStr for SortDirection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ascending" | "asc" => Ok(SortDirection::Ascending),
            "descending" | "desc" => Ok(SortDirection::Descending),
            other => Err(anyhow!("invalid sort direction: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortConfig {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortConfig {
    pub fn toggle(&mut self, field: SortField) {
        if self.field == field {
            self.direction = match self.direction {
                SortDirection::Ascending => SortDirection::Descending,
                SortDirection::Descending => SortDirection::Ascending,
            };
        } else {
            self.field = field;
            self.direction = SortDirection::Ascending;
        }
    }
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            field: SortField::Date,
            direction: SortDirection::Descending,
        }
    }
}

pub fn compare(a: &Task, b: &Task, sort: &SortConfig) -> Ordering {
    let ord = match sort.field {
        SortField::Completed => a.completed.cmp(&b.completed),
        SortField::Title => compare_titles(&a.title, &b.title),
        SortField::Priority => a.priority.ordinal().cmp(&b.priority.ordinal()),
        SortField::Date => parse_for_comparison(&a.date).cmp(&parse_for_comparison(&b.date)),
    };

    match sort.direction {
        SortDirection::Ascending => ord,
        SortDirection::Descending => ord.reverse(),
    }
}

pub fn sort_tasks(tasks: &mut [Task], sort: &SortConfig) {
    tasks.sort_by(|a, b| compare(a, b, sort));
}

fn compare_titles(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::{SortConfig, SortDirection, SortField, sort_tasks};
    use crate::task::{Priority, Task};

    fn task(title: &str, date: &str, priority: Priority) -> Task {
        Task::new(title.to_string(), String::new(), date.to_string(), priority)
    }

    fn titles(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.title.as_str()).collect()
    }

    #[test]
    fn sorts_by_date_and_by_priority() {
        let mut tasks = vec![
            task("Buy milk", "2024-03-05", Priority::Low),
            task("Pay rent", "2024-03-01", Priority::High),
        ];

        sort_tasks(
            &mut tasks,
            &SortConfig {
                field: SortField::Date,
                direction: SortDirection::Ascending,
            },
        );
        assert_eq!(titles(&tasks), ["Pay rent", "Buy milk"]);

        sort_tasks(
            &mut tasks,
            &SortConfig {
                field: SortField::Priority,
                direction: SortDirection::Descending,
            },
        );
        assert_eq!(titles(&tasks), ["Pay rent", "Buy milk"]);
    }

    #[test]
    fn equal_keys_keep_input_order() {
        let mut tasks = vec![
            task("first", "2024-03-05", Priority::Medium),
            task("second", "2024-03-05", Priority::Medium),
            task("third", "2024-03-05", Priority::Medium),
        ];

        for direction in [SortDirection::Ascending, SortDirection::Descending] {
            sort_tasks(
                &mut tasks,
                &SortConfig {
                    field: SortField::Date,
                    direction,
                },
            );
            assert_eq!(titles(&tasks), ["first", "second", "third"]);
        }
    }

    #[test]
    fn unparseable_dates_sort_last_in_ascending_order() {
        let mut tasks = vec![
            task("broken", "not-a-date", Priority::Medium),
            task("late", "2024-12-01", Priority::Medium),
            task("early", "2024-01-01", Priority::Medium),
        ];

        sort_tasks(
            &mut tasks,
            &SortConfig {
                field: SortField::Date,
                direction: SortDirection::Ascending,
            },
        );
        assert_eq!(titles(&tasks), ["early", "late", "broken"]);
    }

    #[test]
    fn completed_sorts_false_before_true() {
        let mut done = task("done", "2024-03-01", Priority::Low);
        done.completed = true;
        let open = task("open", "2024-03-02", Priority::Low);

        let mut tasks = vec![done, open];
        sort_tasks(
            &mut tasks,
            &SortConfig {
                field: SortField::Completed,
                direction: SortDirection::Ascending,
            },
        );
        assert_eq!(titles(&tasks), ["open", "done"]);
    }

    #[test]
    fn toggle_flips_direction_then_resets_on_new_field() {
        let mut sort = SortConfig::default();
        assert_eq!(sort.field, SortField::Date);
        assert_eq!(sort.direction, SortDirection::Descending);

        sort.toggle(SortField::Date);
        assert_eq!(sort.direction, SortDirection::Ascending);

        sort.toggle(SortField::Title);
        assert_eq!(sort.field, SortField::Title);
        assert_eq!(sort.direction, SortDirection::Ascending);

        sort.toggle(SortField::Title);
        assert_eq!(sort.direction, SortDirection::Descending);
    }
}
