use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use chrono::NaiveDate;
use tracing::debug;
use unicode_width::UnicodeWidthStr;

use crate::calendar::{CalendarView, MonthGrid};
use crate::config::Config;
use crate::date::{DateKey, parse_for_comparison, to_display};
use crate::sort::{SortConfig, SortDirection, SortField};
use crate::task::{Priority, Task};
use crate::validate::{ErrorPresenter, ValidationError};

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self { color })
    }

    #[tracing::instrument(skip(self, tasks, sort, today))]
    pub fn print_task_table(
        &mut self,
        tasks: &[Task],
        sort: &SortConfig,
        today: NaiveDate,
    ) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        if tasks.is_empty() {
            writeln!(out, "No tasks found")?;
            return Ok(());
        }

        let headers = vec![
            self.header("Done", SortField::Completed, sort),
            self.header("Title", SortField::Title, sort),
            self.header("Priority", SortField::Priority, sort),
            self.header("Date", SortField::Date, sort),
            "Description".to_string(),
        ];

        let mut rows = Vec::with_capacity(tasks.len());
        for task in tasks {
            let done = if task.completed { "[x]" } else { "[ ]" };
            let id_hint = task.id.chars().take(8).collect::<String>();

            let date = to_display(&task.date);
            let date = match parse_for_comparison(&task.date) {
                DateKey::Valid(d) if d < today && !task.completed => self.paint(&date, "31"),
                _ => date,
            };

            let label = task.priority.as_str();
            let priority = match task.priority {
                Priority::High => self.paint(label, "31"),
                Priority::Medium => self.paint(label, "33"),
                Priority::Low => label.to_string(),
            };

            rows.push(vec![
                done.to_string(),
                task.title.clone(),
                priority,
                date,
                task.description.clone(),
            ]);
            debug!(id = %id_hint, title = %task.title, "rendered row");
        }

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    pub fn print_ids(&mut self, tasks: &[Task]) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        for task in tasks {
            writeln!(out, "{}  {}", task.id, task.title)?;
        }
        Ok(())
    }

    fn header(&self, label: &str, field: SortField, sort: &SortConfig) -> String {
        if sort.field != field {
            return label.to_string();
        }
        let marker = match sort.direction {
            SortDirection::Ascending => "▲",
            SortDirection::Descending => "▼",
        };
        format!("{label} {marker}")
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

pub struct TerminalCalendarView {
    color: bool,
}

impl TerminalCalendarView {
    pub fn new(renderer: &Renderer) -> Self {
        Self {
            color: renderer.color,
        }
    }

    fn write_grid<W: Write>(&self, mut out: W, grid: &MonthGrid) -> io::Result<()> {
        let width: usize = 7 * 3;
        let pad = width.saturating_sub(grid.title.len()) / 2;
        writeln!(out, "{:pad$}{}", "", grid.title, pad = pad)?;
        writeln!(out, "Su Mo Tu We Th Fr Sa")?;

        let mut column = 0;
        for _ in 0..grid.leading_blanks {
            write!(out, "   ")?;
            column += 1;
        }

        for cell in &grid.days {
            let text = format!("{:>2}", cell.day);
            let text = match (cell.is_today, cell.is_selected) {
                (true, true) => self.paint(&text, "7;36"),
                (true, false) => self.paint(&text, "7"),
                (false, true) => self.paint(&text, "36"),
                (false, false) => text,
            };
            write!(out, "{text} ")?;

            column += 1;
            if column == 7 {
                writeln!(out)?;
                column = 0;
            }
        }
        if column != 0 {
            writeln!(out)?;
        }
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

impl CalendarView for TerminalCalendarView {
    fn redraw(&mut self, grid: &MonthGrid) {
        let out = io::stdout().lock();
        let _ = self.write_grid(out, grid);
    }

    fn clear(&mut self) {}
}

#[derive(Debug, Default)]
pub struct TerminalErrorPresenter;

impl ErrorPresenter for TerminalErrorPresenter {
    fn show(&mut self, errors: &[ValidationError]) {
        if errors.is_empty() {
            return;
        }
        let mut err = io::stderr().lock();
        for error in errors {
            let _ = writeln!(err, "{}: {}", error.field_name, error.message);
        }
    }

    fn mark_field(&mut self, field_name: &str, errored: bool) {
        debug!(field = field_name, errored, "field marking changed");
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::TerminalCalendarView;
    use crate::calendar::{DayCell, MonthGrid};

    #[test]
    fn month_grid_prints_seven_columns_after_the_leading_blanks() {
        let days = (1..=30)
            .map(|day| DayCell {
                day,
                is_today: day == 15,
                is_selected: false,
            })
            .collect();
        let grid = MonthGrid {
            year: 2024,
            month: 4,
            title: "April 2024".to_string(),
            leading_blanks: 1,
            days,
        };

        let view = TerminalCalendarView { color: false };
        let mut out = Vec::new();
        view.write_grid(&mut out, &grid).expect("write grid");

        let text = String::from_utf8(out).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].contains("April 2024"));
        assert_eq!(lines[1], "Su Mo Tu We Th Fr Sa");
        assert_eq!(lines[2], "    1  2  3  4  5  6 ");
        // 1 blank + 30 days fills four full weeks and a three-day tail.
        assert_eq!(lines.len(), 7);
        assert!(lines[6].trim_start().starts_with("28"));
    }
}
