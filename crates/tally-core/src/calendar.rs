use anyhow::anyhow;
use chrono::{Datelike, NaiveDate};
use tracing::debug;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarState {
    Closed,
    Open { year: i32, month: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayCell {
    pub day: u32,
    pub is_today: bool,
    pub is_selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    pub title: String,
    pub leading_blanks: usize,
    pub days: Vec<DayCell>,
}

pub trait CalendarView {
    fn redraw(&mut self, grid: &MonthGrid);
    fn clear(&mut self);
    fn position_after_layout(&mut self) {}
}

#[derive(Debug, Default)]
pub struct NullCalendarView;

impl CalendarView for NullCalendarView {
    fn redraw(&mut self, _grid: &MonthGrid) {}
    fn clear(&mut self) {}
}

pub struct Calendar {
    state: CalendarState,
    selected: Option<NaiveDate>,
    today: NaiveDate,
    view: Box<dyn CalendarView>,
    on_select: Option<Box<dyn FnMut(NaiveDate)>>,
}

impl Calendar {
    pub fn new(view: Box<dyn CalendarView>, today: NaiveDate, initial: Option<NaiveDate>) -> Self {
        Self {
            state: CalendarState::Closed,
            selected: initial,
            today,
            view,
            on_select: None,
        }
    }

    pub fn on_select(&mut self, callback: Box<dyn FnMut(NaiveDate)>) {
        self.on_select = Some(callback);
    }

    pub fn state(&self) -> CalendarState {
        self.state
    }

    pub fn selected(&self) -> Option<NaiveDate> {
        self.selected
    }

    pub fn open(&mut self) {
        if let CalendarState::Open { .. } = self.state {
            return;
        }
        let anchor = self.selected.unwrap_or(self.today);
        self.state = CalendarState::Open {
            year: anchor.year(),
            month: anchor.month(),
        };
        debug!(year = anchor.year(), month = anchor.month(), "opened calendar");
        self.redraw();
        self.view.position_after_layout();
    }

    pub fn close(&mut self) {
        self.state = CalendarState::Closed;
        self.view.clear();
    }

    pub fn navigate_previous(&mut self) {
        if let CalendarState::Open { year, month } = self.state {
            self.state = if month == 1 {
                CalendarState::Open {
                    year: year - 1,
                    month: 12,
                }
            } else {
                CalendarState::Open {
                    year,
                    month: month - 1,
                }
            };
            self.redraw();
        }
    }

    pub fn show_month(&mut self, year: i32, month: u32) -> anyhow::Result<()> {
        if !(1..=12).contains(&month) {
            return Err(anyhow!("month out of range: {month}"));
        }
        if let CalendarState::Open { .. } = self.state {
            self.state = CalendarState::Open { year, month };
            self.redraw();
        }
        Ok(())
    }

    pub fn navigate_next(&mut self) {
        if let CalendarState::Open { year, month } = self.state {
            self.state = if month == 12 {
                CalendarState::Open {
                    year: year + 1,
                    month: 1,
                }
            } else {
                CalendarState::Open {
                    year,
                    month: month + 1,
                }
            };
            self.redraw();
        }
    }

    pub fn select_day(&mut self, day: u32) -> anyhow::Result<NaiveDate> {
        let CalendarState::Open { year, month } = self.state else {
            return Err(anyhow!("calendar is not open"));
        };

        let date = NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| anyhow!("no day {day} in {year}-{month:02}"))?;
        self.selected = Some(date);
        self.redraw();

        if let Some(callback) = &mut self.on_select {
            callback(date);
        }
        Ok(date)
    }

    pub fn month_grid(&self) -> Option<MonthGrid> {
        let CalendarState::Open { year, month } = self.state else {
            return None;
        };
        Some(build_month_grid(year, month, self.today, self.selected))
    }

    fn redraw(&mut self) {
        if let Some(grid) = self.month_grid() {
            self.view.redraw(&grid);
        }
    }
}

fn build_month_grid(
    year: i32,
    month: u32,
    today: NaiveDate,
    selected: Option<NaiveDate>,
) -> MonthGrid {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .unwrap_or(today);
    let leading_blanks = first.weekday().num_days_from_sunday() as usize;

    let days = (1..=days_in_month(year, month))
        .map(|day| {
            let date = NaiveDate::from_ymd_opt(year, month, day).unwrap_or(first);
            DayCell {
                day,
                is_today: date == today,
                is_selected: selected == Some(date),
            }
        })
        .collect();

    let name = MONTH_NAMES
        .get(month as usize - 1)
        .copied()
        .unwrap_or("?");

    MonthGrid {
        year,
        month,
        title: format!("{name} {year}"),
        leading_blanks,
        days,
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    match (NaiveDate::from_ymd_opt(year, month, 1), next_first) {
        (Some(first), Some(next)) => next.signed_duration_since(first).num_days() as u32,
        _ => 30,
    }
}
