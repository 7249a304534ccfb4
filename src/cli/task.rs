//! tasker task command implementations.

use std::path::PathBuf;

use chrono::{Duration, Local, NaiveDateTime};
use serde::Serialize;

use crate::config::{resolve_data_dir, Config};
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::paginate;
use crate::storage::Storage;
use crate::task::{
    deadline_from_term, format_deadline, parse_deadline, PriorityLabel, TaskField, TaskRecord,
    TaskStore,
};

pub struct AddOptions {
    pub title: String,
    pub description: String,
    pub category: String,
    pub due: String,
    pub deadline: Option<String>,
    pub priority: String,
    pub dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ListOptions {
    pub incomplete: bool,
    pub category: Option<String>,
    pub page: usize,
    pub dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ShowOptions {
    pub id: u64,
    pub dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct EditOptions {
    pub id: u64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub due: Option<String>,
    pub deadline: Option<String>,
    pub priority: Option<String>,
    pub dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct StatusOptions {
    pub id: u64,
    pub complete: bool,
    pub dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct DeleteOptions {
    pub id: u64,
    pub dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct SearchOptions {
    pub query: String,
    pub page: usize,
    pub dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct CategoriesOptions {
    pub dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

struct TaskContext {
    store: TaskStore,
    config: Config,
    now: NaiveDateTime,
}

#[derive(Serialize)]
struct TaskPageOutput<'a> {
    page: usize,
    pages: usize,
    total: usize,
    tasks: &'a [TaskRecord],
}

#[derive(Serialize)]
struct TaskDetailOutput<'a> {
    #[serde(flatten)]
    task: &'a TaskRecord,
    remaining_seconds: Option<i64>,
    urgent: bool,
}

#[derive(Serialize)]
struct CategoryCount {
    category: String,
    total: usize,
    open: usize,
}

pub fn run_add(options: AddOptions) -> Result<()> {
    let ctx = load_context(options.dir)?;
    let title = options.title.trim();
    if title.is_empty() {
        return Err(Error::InvalidArgument("title cannot be empty".to_string()));
    }

    let priority: PriorityLabel = options.priority.parse()?;
    let deadline = match options.deadline.as_deref() {
        Some(value) => normalize_deadline(value)?,
        None => deadline_from_term(ctx.now, &options.due)?,
    };

    let candidate = TaskRecord::new(
        title,
        options.description,
        options.category,
        deadline,
        priority,
    );
    let task = ctx.store.create(candidate)?;

    let mut human = HumanOutput::new("Task created");
    push_task_summary(&mut human, &task, &ctx);

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "add",
        &task,
        Some(&human),
    )
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let ctx = load_context(options.dir)?;
    let mut tasks = if options.incomplete {
        ctx.store.list_incomplete()?
    } else {
        ctx.store.list_all()?
    };
    if let Some(category) = options.category.as_deref() {
        tasks.retain(|task| task.category == category);
    }

    let mut human = HumanOutput::new("Tasks");
    if let Some(category) = options.category.as_ref() {
        human.push_summary("Category", category.clone());
    }
    if options.incomplete {
        human.push_summary("Filter", "incomplete");
    }
    emit_page(
        &ctx,
        human,
        &tasks,
        options.page,
        "list",
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
    )
}

pub fn run_search(options: SearchOptions) -> Result<()> {
    let ctx = load_context(options.dir)?;
    let tasks = ctx.store.search_by_title_substring(&options.query)?;

    let mut human = HumanOutput::new(format!("Search: {}", options.query));
    if tasks.is_empty() {
        human.push_warning("no task title matches");
    }
    emit_page(
        &ctx,
        human,
        &tasks,
        options.page,
        "search",
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
    )
}

pub fn run_show(options: ShowOptions) -> Result<()> {
    let ctx = load_context(options.dir)?;
    let task = ctx.store.get(options.id)?;
    let remaining = task.remaining(ctx.now).ok();
    let urgent = is_flagged(&task, &ctx);

    let mut human = HumanOutput::new(format!("Task {}", options.id));
    push_task_summary(&mut human, &task, &ctx);
    if !task.description.is_empty() {
        human.push_detail(task.description.clone());
    }

    let output = TaskDetailOutput {
        task: &task,
        remaining_seconds: remaining.map(|delta| delta.num_seconds()),
        urgent,
    };

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "show",
        &output,
        Some(&human),
    )
}

pub fn run_edit(options: EditOptions) -> Result<()> {
    let ctx = load_context(options.dir)?;

    let mut changes: Vec<(TaskField, String)> = Vec::new();
    if let Some(title) = options.title {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidArgument("title cannot be empty".to_string()));
        }
        changes.push((TaskField::Title, trimmed.to_string()));
    }
    if let Some(description) = options.description {
        changes.push((TaskField::Description, description));
    }
    if let Some(category) = options.category {
        changes.push((TaskField::Category, category));
    }
    if let Some(term) = options.due.as_deref() {
        changes.push((TaskField::Deadline, deadline_from_term(ctx.now, term)?));
    }
    if let Some(deadline) = options.deadline.as_deref() {
        changes.push((TaskField::Deadline, normalize_deadline(deadline)?));
    }
    if let Some(priority) = options.priority.as_deref() {
        let priority: PriorityLabel = priority.parse()?;
        changes.push((TaskField::Priority, priority.as_str().to_string()));
    }

    if changes.is_empty() {
        return Err(Error::InvalidArgument(
            "edit requires at least one of --title, --description, --category, --due, --deadline, --priority"
                .to_string(),
        ));
    }

    let task = ctx.store.edit_fields(options.id, &changes)?;

    let mut human = HumanOutput::new("Task updated");
    push_task_summary(&mut human, &task, &ctx);
    let fields: Vec<&str> = changes.iter().map(|(field, _)| field.as_str()).collect();
    human.push_detail(format!("changed: {}", fields.join(", ")));

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "edit",
        &task,
        Some(&human),
    )
}

pub fn run_status(options: StatusOptions) -> Result<()> {
    let ctx = load_context(options.dir)?;
    let task = ctx.store.mark_status(options.id, options.complete)?;

    let (command, header) = if options.complete {
        ("done", "Task completed")
    } else {
        ("reopen", "Task reopened")
    };
    let mut human = HumanOutput::new(header);
    human.push_summary("ID", options.id.to_string());
    human.push_summary("Title", task.title.clone());
    human.push_summary("Status", task.status_label());

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        command,
        &task,
        Some(&human),
    )
}

pub fn run_delete(options: DeleteOptions) -> Result<()> {
    let ctx = load_context(options.dir)?;
    let task = ctx.store.delete(options.id)?;

    let mut human = HumanOutput::new("Task deleted");
    human.push_summary("ID", options.id.to_string());
    human.push_summary("Title", task.title.clone());

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "rm",
        &task,
        Some(&human),
    )
}

pub fn run_categories(options: CategoriesOptions) -> Result<()> {
    let ctx = load_context(options.dir)?;
    let counts: Vec<CategoryCount> = ctx
        .store
        .group_by_category()?
        .into_iter()
        .map(|group| CategoryCount {
            open: group.tasks.iter().filter(|task| !task.status).count(),
            total: group.tasks.len(),
            category: group.category,
        })
        .collect();

    let mut human = HumanOutput::new("Categories");
    human.push_summary("Total", counts.len().to_string());
    for count in &counts {
        human.push_detail(format!(
            "{} ({} open / {} total)",
            count.category, count.open, count.total
        ));
    }
    if counts.is_empty() {
        human.push_next_step("tasker add <title> --category <name>");
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "categories",
        &counts,
        Some(&human),
    )
}

fn load_context(dir: Option<PathBuf>) -> Result<TaskContext> {
    let data_dir = resolve_data_dir(dir)?;
    let config = Config::load_from_dir(&data_dir);
    let storage = Storage::new(data_dir, &config.storage);
    let store = TaskStore::open(&storage);
    Ok(TaskContext {
        store,
        config,
        now: Local::now().naive_local(),
    })
}

fn emit_page(
    ctx: &TaskContext,
    mut human: HumanOutput,
    tasks: &[TaskRecord],
    page: usize,
    command: &str,
    options: OutputOptions,
) -> Result<()> {
    let page_size = ctx.config.page_size;
    let pages = paginate::page_count(tasks.len(), page_size);
    let items = paginate::page(tasks, page_size, page)?;

    human.push_summary("Total", tasks.len().to_string());
    human.push_summary("Page", format!("{page}/{pages}"));
    for task in items {
        human.push_detail(format_task_line(task, ctx));
    }
    if page < pages {
        human.push_next_step(format!("tasker {command} --page {}", page + 1));
    }

    let output = TaskPageOutput {
        page,
        pages,
        total: tasks.len(),
        tasks: items,
    };
    emit_success(options, command, &output, Some(&human))
}

fn format_task_line(task: &TaskRecord, ctx: &TaskContext) -> String {
    let id = task
        .id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string());
    let mut line = format!(
        "[{}][{}] {} {} ({}, due {})",
        task.status_label(),
        task.priority,
        id,
        task.title,
        task.category,
        task.deadline
    );
    if is_flagged(task, ctx) {
        line.push_str(" SOS");
    }
    line
}

fn push_task_summary(human: &mut HumanOutput, task: &TaskRecord, ctx: &TaskContext) {
    if let Some(id) = task.id {
        human.push_summary("ID", id.to_string());
    }
    human.push_summary("Title", task.title.clone());
    human.push_summary("Category", task.category.clone());
    human.push_summary("Priority", task.priority.to_string());
    human.push_summary("Status", task.status_label());
    human.push_summary("Deadline", task.deadline.clone());
    match task.remaining(ctx.now) {
        Ok(remaining) => human.push_summary("Remaining", format_remaining(remaining)),
        Err(err) => human.push_warning(err.to_string()),
    }
    if is_flagged(task, ctx) {
        human.push_warning(format!(
            "SOS: due within {} hours",
            ctx.config.urgent_hours
        ));
    }
}

/// Open tasks close to (or past) their deadline
fn is_flagged(task: &TaskRecord, ctx: &TaskContext) -> bool {
    !task.status
        && task
            .is_urgent(ctx.now, ctx.config.urgent_hours)
            .unwrap_or(false)
}

fn normalize_deadline(value: &str) -> Result<String> {
    Ok(format_deadline(parse_deadline(value)?))
}

fn format_remaining(remaining: Duration) -> String {
    let overdue = remaining < Duration::zero();
    let total_minutes = remaining.num_minutes().abs();
    let days = total_minutes / (24 * 60);
    let hours = (total_minutes / 60) % 24;
    let minutes = total_minutes % 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 || parts.is_empty() {
        parts.push(format!("{minutes}m"));
    }
    let span = parts.join(" ");
    if overdue {
        format!("overdue by {span}")
    } else {
        span
    }
}
