use anyhow::{Context, anyhow};
use chrono::NaiveDate;
use tracing::{debug, info, instrument};

use crate::calendar::{Calendar, CalendarState, CalendarView, NullCalendarView};
use crate::cli::Command;
use crate::config::Config;
use crate::date::{parse_naive, to_canonical};
use crate::filter::{self, FilterConfig};
use crate::render::{Renderer, TerminalCalendarView, TerminalErrorPresenter};
use crate::sort::{SortConfig, SortDirection, SortField, sort_tasks};
use crate::store::TaskStore;
use crate::task::{Priority, Task};
use crate::validate::{FieldValidation, Validator, range_order_rule};

pub fn default_command() -> Command {
    Command::List {
        hide_completed: false,
        search: None,
        from: None,
        to: None,
        sort: None,
        ascending: false,
        descending: false,
        ids: false,
    }
}

#[instrument(skip(store, cfg, renderer, command))]
pub fn dispatch(
    store: &mut TaskStore,
    cfg: &Config,
    renderer: &mut Renderer,
    command: Command,
) -> anyhow::Result<()> {
    let today = chrono::Local::now().date_naive();
    debug!(?command, %today, "dispatching command");

    match command {
        Command::Add {
            title,
            description,
            date,
            priority,
        } => cmd_add(store, title, description, date, priority),
        Command::Done { id } => cmd_done(store, &id),
        Command::List {
            hide_completed,
            search,
            from,
            to,
            sort,
            ascending,
            descending,
            ids,
        } => {
            let list = ListArgs {
                hide_completed,
                search,
                from,
                to,
                sort,
                ascending,
                descending,
                ids,
            };
            cmd_list(store, cfg, renderer, list, today)
        }
        Command::Calendar { month, selected } => cmd_calendar(renderer, month, selected, today),
    }
}

#[instrument(skip(store, title, description, date, priority))]
fn cmd_add(
    store: &mut TaskStore,
    title: Option<String>,
    description: Option<String>,
    date: Option<String>,
    priority: Option<String>,
) -> anyhow::Result<()> {
    info!("command add");

    let title = title.unwrap_or_default();
    let description = description.unwrap_or_default();
    let date = date.unwrap_or_default();
    let priority = priority.unwrap_or_default();

    let mut validator = Validator::new(Box::new(TerminalErrorPresenter));
    let required: &dyn Fn(&str) -> bool = &|value: &str| !value.trim().is_empty();
    let real_date: &dyn Fn(&str) -> bool = &|value: &str| parse_naive(value).is_some();
    let known_priority: &dyn Fn(&str) -> bool = &|value: &str| value.parse::<Priority>().is_ok();

    let ok = validator.validate_form(&[
        FieldValidation {
            field_name: "Title",
            value: &title,
            rules: &[required],
            error_message: "Title is required",
        },
        FieldValidation {
            field_name: "Priority",
            value: &priority,
            rules: &[required, known_priority],
            error_message: "Priority must be Low, Medium or High",
        },
        FieldValidation {
            field_name: "Date",
            value: &date,
            rules: &[required, real_date],
            error_message: "Date must be a real dd.mm.yyyy date",
        },
        FieldValidation {
            field_name: "Description",
            value: &description,
            rules: &[required],
            error_message: "Description is required",
        },
    ]);

    if !ok {
        return Err(anyhow!("task not created"));
    }

    let priority: Priority = priority.parse()?;
    let task = Task::new(
        title.trim().to_string(),
        description.trim().to_string(),
        to_canonical(date.trim()),
        priority,
    );

    let created = store.add(task)?;
    println!(
        "Created task {} ({}).",
        created.id.chars().take(8).collect::<String>(),
        created.title
    );
    Ok(())
}

#[instrument(skip(store))]
fn cmd_done(store: &mut TaskStore, id_prefix: &str) -> anyhow::Result<()> {
    info!("command done");

    let task = store.find_by_prefix(id_prefix)?;
    let id = task.id.clone();
    let title = task.title.clone();

    let completed = store.toggle(&id)?;
    if completed {
        println!("Completed '{title}'.");
    } else {
        println!("Reopened '{title}'.");
    }
    Ok(())
}

struct ListArgs {
    hide_completed: bool,
    search: Option<String>,
    from: Option<String>,
    to: Option<String>,
    sort: Option<String>,
    ascending: bool,
    descending: bool,
    ids: bool,
}

#[instrument(skip(store, cfg, renderer, list, today))]
fn cmd_list(
    store: &mut TaskStore,
    cfg: &Config,
    renderer: &mut Renderer,
    list: ListArgs,
    today: NaiveDate,
) -> anyhow::Result<()> {
    info!("command list");

    let show_completed =
        cfg.get_bool("filter.show_completed").unwrap_or(true) && !list.hide_completed;

    let date_from = to_canonical(list.from.as_deref().unwrap_or("").trim());
    let date_to = to_canonical(list.to.as_deref().unwrap_or("").trim());

    let mut validator = Validator::new(Box::new(TerminalErrorPresenter));
    let real_or_empty: &dyn Fn(&str) -> bool =
        &|value: &str| value.is_empty() || parse_naive(value).is_some();
    let in_order = range_order_rule(&date_from, &date_to);
    let in_order: &dyn Fn(&str) -> bool = &in_order;

    let ok = validator.validate_form(&[
        FieldValidation {
            field_name: "From",
            value: &date_from,
            rules: &[real_or_empty, in_order],
            error_message: "From must be a valid date no later than To",
        },
        FieldValidation {
            field_name: "To",
            value: &date_to,
            rules: &[real_or_empty, in_order],
            error_message: "To must be a valid date no earlier than From",
        },
    ]);
    if !ok {
        return Err(anyhow!("invalid date range"));
    }

    let filter = FilterConfig {
        show_completed,
        search_text: list.search.unwrap_or_default(),
        date_from: date_from.clone(),
        date_to: date_to.clone(),
    };

    let field: SortField = match &list.sort {
        Some(raw) => raw.parse()?,
        None => cfg
            .get("sort.field")
            .unwrap_or_else(|| "date".to_string())
            .parse()
            .context("invalid sort.field in config")?,
    };
    let direction = if list.ascending {
        SortDirection::Ascending
    } else if list.descending {
        SortDirection::Descending
    } else {
        cfg.get("sort.direction")
            .unwrap_or_else(|| "descending".to_string())
            .parse()
            .context("invalid sort.direction in config")?
    };
    let sort = SortConfig { field, direction };

    let mut tasks = filter::apply(store.tasks(), &filter);
    sort_tasks(&mut tasks, &sort);
    debug!(
        total = store.tasks().len(),
        shown = tasks.len(),
        "filtered and sorted"
    );

    if list.ids {
        renderer.print_ids(&tasks)
    } else {
        renderer.print_task_table(&tasks, &sort, today)
    }
}

#[instrument(skip(renderer, month, selected, today))]
fn cmd_calendar(
    renderer: &mut Renderer,
    month: Option<String>,
    selected: Option<String>,
    today: NaiveDate,
) -> anyhow::Result<()> {
    info!("command calendar");

    let selected = match selected {
        Some(raw) => Some(
            parse_naive(&raw).ok_or_else(|| anyhow!("invalid selected date: {raw}"))?,
        ),
        None => None,
    };

    let target = match month {
        Some(raw) => Some(parse_month_arg(&raw)?),
        None => None,
    };

    let mut calendar = Calendar::new(Box::new(NullCalendarView), today, selected);
    calendar.open();
    if let Some((year, month)) = target
        && calendar.state() != (CalendarState::Open { year, month })
    {
        calendar.show_month(year, month)?;
    }

    let grid = calendar
        .month_grid()
        .ok_or_else(|| anyhow!("calendar failed to open"))?;
    TerminalCalendarView::new(renderer).redraw(&grid);

    Ok(())
}

fn parse_month_arg(raw: &str) -> anyhow::Result<(i32, u32)> {
    let (y, m) = raw
        .trim()
        .split_once('-')
        .ok_or_else(|| anyhow!("invalid month (expected yyyy-mm): {raw}"))?;
    let year: i32 = y.parse().with_context(|| format!("invalid year in month: {raw}"))?;
    let month: u32 = m.parse().with_context(|| format!("invalid month number: {raw}"))?;
    if !(1..=12).contains(&month) {
        return Err(anyhow!("month out of range: {raw}"));
    }
    let _ = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| anyhow!("invalid month: {raw}"))?;
    Ok((year, month))
}
