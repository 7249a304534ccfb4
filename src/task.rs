//! Task records and the file-backed task store.
//!
//! Tasks are kept as one JSON list in the tasks file. Every operation reads
//! the whole list, works on it in memory and, for mutations, writes the whole
//! list back. The list is kept in ascending id order: new records are only
//! ever appended with a freshly allocated, larger id, and nothing reorders
//! existing entries. Lookups by id rely on that order (see
//! [`find_index_by_id`]).

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{Duration, NaiveDateTime};
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};
use crate::id_alloc::IdAllocator;
use crate::storage::{self, Storage};

/// Format used when writing deadlines
pub const DEADLINE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

const DAYS_PER_MONTH: i64 = 30;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Priority {
    #[default]
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let lowered = trimmed.to_lowercase();
        match lowered.as_str() {
            "high" | "высокий" => Ok(Priority::High),
            "medium" | "средний" => Ok(Priority::Medium),
            "low" | "низкий" => Ok(Priority::Low),
            _ => Err(Error::Validation(format!(
                "unknown priority '{trimmed}' (expected High, Medium or Low)"
            ))),
        }
    }
}

/// Spellings accepted verbatim when a priority is set, per level
const PRIORITY_LABELS: [(Priority, &[&str]); 3] = [
    (Priority::High, &["High", "Высокий"]),
    (Priority::Medium, &["Medium", "Средний"]),
    (Priority::Low, &["Low", "Низкий"]),
];

/// A priority together with the exact label it is stored under
///
/// Labels read from disk are kept byte for byte so rewriting a file does not
/// relabel records nobody touched. Comparisons against [`Priority`] use the
/// level only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorityLabel {
    level: Priority,
    label: String,
}

impl PriorityLabel {
    pub fn level(&self) -> Priority {
        self.level
    }

    pub fn as_str(&self) -> &str {
        &self.label
    }
}

impl Default for PriorityLabel {
    fn default() -> Self {
        Priority::default().into()
    }
}

impl From<Priority> for PriorityLabel {
    fn from(level: Priority) -> Self {
        Self {
            level,
            label: level.as_str().to_string(),
        }
    }
}

impl PartialEq<Priority> for PriorityLabel {
    fn eq(&self, other: &Priority) -> bool {
        self.level() == *other
    }
}

impl fmt::Display for PriorityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// User input: known spellings are kept, anything else becomes the English label
impl FromStr for PriorityLabel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let level: Priority = s.parse()?;
        let trimmed = s.trim();
        let known = PRIORITY_LABELS
            .iter()
            .any(|(known_level, labels)| *known_level == level && labels.contains(&trimmed));
        if known {
            Ok(Self {
                level,
                label: trimmed.to_string(),
            })
        } else {
            Ok(level.into())
        }
    }
}

impl Serialize for PriorityLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label)
    }
}

impl<'de> Deserialize<'de> for PriorityLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        let level = label.parse().map_err(de::Error::custom)?;
        Ok(Self { level, label })
    }
}

/// Where `id` sits among a record's keys on disk
///
/// Files written by older versions of the tool put `id` last; such records
/// keep that layout when rewritten.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyOrder {
    #[default]
    IdFirst,
    IdLast,
}

/// One task as stored on disk
///
/// `id` is `None` until the record has been created through [`TaskStore::create`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    pub id: Option<u64>,
    pub title: String,
    pub description: String,
    pub category: String,
    pub deadline: String,
    pub priority: PriorityLabel,
    pub status: bool,
    key_order: KeyOrder,
}

const RECORD_FIELDS: &[&str] = &[
    "id",
    "title",
    "description",
    "category",
    "deadline",
    "priority",
    "status",
];

impl Serialize for TaskRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("TaskRecord", RECORD_FIELDS.len())?;
        if self.key_order == KeyOrder::IdFirst {
            state.serialize_field("id", &self.id)?;
        }
        state.serialize_field("title", &self.title)?;
        state.serialize_field("description", &self.description)?;
        state.serialize_field("category", &self.category)?;
        state.serialize_field("deadline", &self.deadline)?;
        state.serialize_field("priority", &self.priority)?;
        state.serialize_field("status", &self.status)?;
        if self.key_order == KeyOrder::IdLast {
            state.serialize_field("id", &self.id)?;
        }
        state.end()
    }
}

impl<'de> Deserialize<'de> for TaskRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_struct("TaskRecord", RECORD_FIELDS, RecordVisitor)
    }
}

struct RecordVisitor;

impl<'de> Visitor<'de> for RecordVisitor {
    type Value = TaskRecord;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a task record")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<TaskRecord, A::Error> {
        let mut id: Option<Option<u64>> = None;
        let mut title = None;
        let mut description = None;
        let mut category = None;
        let mut deadline = None;
        let mut priority = None;
        let mut status = None;
        let mut key_order = KeyOrder::IdFirst;
        let mut seen_other = false;

        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "id" => {
                    if seen_other {
                        key_order = KeyOrder::IdLast;
                    }
                    next_field(&mut map, &mut id, "id")?;
                }
                "title" => next_field(&mut map, &mut title, "title")?,
                "description" => next_field(&mut map, &mut description, "description")?,
                "category" => next_field(&mut map, &mut category, "category")?,
                "deadline" => next_field(&mut map, &mut deadline, "deadline")?,
                "priority" => next_field(&mut map, &mut priority, "priority")?,
                "status" => next_field(&mut map, &mut status, "status")?,
                _ => {
                    map.next_value::<de::IgnoredAny>()?;
                    continue;
                }
            }
            if key != "id" {
                seen_other = true;
            }
        }

        Ok(TaskRecord {
            id: id.flatten(),
            title: title.ok_or_else(|| de::Error::missing_field("title"))?,
            description: description.ok_or_else(|| de::Error::missing_field("description"))?,
            category: category.ok_or_else(|| de::Error::missing_field("category"))?,
            deadline: deadline.ok_or_else(|| de::Error::missing_field("deadline"))?,
            priority: priority.ok_or_else(|| de::Error::missing_field("priority"))?,
            status: status.ok_or_else(|| de::Error::missing_field("status"))?,
            key_order,
        })
    }
}

fn next_field<'de, A, T>(
    map: &mut A,
    slot: &mut Option<T>,
    name: &'static str,
) -> std::result::Result<(), A::Error>
where
    A: MapAccess<'de>,
    T: Deserialize<'de>,
{
    if slot.is_some() {
        return Err(de::Error::duplicate_field(name));
    }
    *slot = Some(map.next_value()?);
    Ok(())
}

impl TaskRecord {
    /// New incomplete task without an id
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
        deadline: impl Into<String>,
        priority: impl Into<PriorityLabel>,
    ) -> Self {
        Self {
            id: None,
            title: title.into(),
            description: description.into(),
            category: category.into(),
            deadline: deadline.into(),
            priority: priority.into(),
            status: false,
            key_order: KeyOrder::default(),
        }
    }

    pub fn key_order(&self) -> KeyOrder {
        self.key_order
    }

    pub fn deadline_at(&self) -> Result<NaiveDateTime> {
        parse_deadline(&self.deadline)
    }

    /// Time left until the deadline; negative once it has passed
    pub fn remaining(&self, now: NaiveDateTime) -> Result<Duration> {
        Ok(self.deadline_at()? - now)
    }

    /// True when fewer than `hours` remain, overdue tasks included
    pub fn is_urgent(&self, now: NaiveDateTime, hours: i64) -> Result<bool> {
        let threshold = Duration::try_hours(hours)
            .ok_or_else(|| Error::Validation(format!("urgency window too large: {hours}h")))?;
        Ok(self.remaining(now)? < threshold)
    }

    pub fn status_label(&self) -> &'static str {
        if self.status {
            "done"
        } else {
            "open"
        }
    }

    fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::Validation("title cannot be empty".to_string()));
        }
        parse_deadline(&self.deadline)?;
        Ok(())
    }
}

/// Fields that [`TaskStore::edit`] can change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskField {
    Title,
    Description,
    Category,
    Deadline,
    Priority,
}

impl TaskField {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskField::Title => "title",
            TaskField::Description => "description",
            TaskField::Category => "category",
            TaskField::Deadline => "deadline",
            TaskField::Priority => "priority",
        }
    }

    fn apply(self, task: &mut TaskRecord, value: &str) -> Result<()> {
        match self {
            TaskField::Title => {
                if value.trim().is_empty() {
                    return Err(Error::Validation("title cannot be empty".to_string()));
                }
                task.title = value.to_string();
            }
            TaskField::Description => task.description = value.to_string(),
            TaskField::Category => task.category = value.to_string(),
            TaskField::Deadline => {
                parse_deadline(value)?;
                task.deadline = value.trim().to_string();
            }
            TaskField::Priority => task.priority = value.parse()?,
        }
        Ok(())
    }
}

impl fmt::Display for TaskField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "title" => Ok(TaskField::Title),
            "description" => Ok(TaskField::Description),
            "category" => Ok(TaskField::Category),
            "deadline" => Ok(TaskField::Deadline),
            "priority" => Ok(TaskField::Priority),
            other => Err(Error::InvalidArgument(format!(
                "unknown task field '{other}'"
            ))),
        }
    }
}

/// Tasks sharing one category, in stored order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryGroup {
    pub category: String,
    pub tasks: Vec<TaskRecord>,
}

/// Binary search for `id` in `records`.
///
/// `records` must be sorted by ascending id, which holds for anything loaded
/// from a store that was only modified through [`TaskStore`]. The order is not
/// re-checked here; a hand-edited, unsorted file makes lookups miss.
pub fn find_index_by_id(records: &[TaskRecord], id: u64) -> Option<usize> {
    records
        .binary_search_by(|record| record.id.cmp(&Some(id)))
        .ok()
}

#[derive(Debug, Clone)]
pub struct TaskStore {
    path: PathBuf,
    ids: IdAllocator,
}

impl TaskStore {
    pub fn new(path: impl Into<PathBuf>, ids: IdAllocator) -> Self {
        Self {
            path: path.into(),
            ids,
        }
    }

    /// Store using the files laid out by `storage`
    pub fn open(storage: &Storage) -> Self {
        Self::new(
            storage.tasks_file(),
            IdAllocator::new(storage.counter_file()),
        )
    }

    pub fn ids(&self) -> &IdAllocator {
        &self.ids
    }

    /// Read every record, creating an empty tasks file if none exists
    pub fn load_all(&self) -> Result<Vec<TaskRecord>> {
        if !self.path.exists() {
            self.save_all(&[])?;
            return Ok(Vec::new());
        }
        storage::read_json(&self.path)
    }

    /// Replace the tasks file with `records`
    pub fn save_all(&self, records: &[TaskRecord]) -> Result<()> {
        storage::write_json(&self.path, records)
    }

    /// Assign a fresh id to `candidate` and append it
    ///
    /// Any id already on `candidate` is replaced.
    pub fn create(&self, mut candidate: TaskRecord) -> Result<TaskRecord> {
        candidate.validate()?;
        let mut records = self.load_all()?;

        let mut id = self.ids.next()?;
        if let Some(last) = records.last().and_then(|record| record.id) {
            if id <= last {
                tracing::warn!(
                    counter = %self.ids.path().display(),
                    issued = id,
                    last,
                    "counter behind stored ids, advancing"
                );
                let next = last.checked_add(1).ok_or(Error::IdsExhausted { last })?;
                id = self.ids.store(next)?;
            }
        }

        candidate.id = Some(id);
        candidate.key_order = records
            .last()
            .map(|record| record.key_order)
            .unwrap_or_default();
        records.push(candidate.clone());
        self.save_all(&records)?;
        tracing::debug!(id, "task created");
        Ok(candidate)
    }

    pub fn get(&self, id: u64) -> Result<TaskRecord> {
        let records = self.load_all()?;
        let index = find_index_by_id(&records, id).ok_or(Error::RecordNotFound(id))?;
        Ok(records[index].clone())
    }

    /// Change a single field of the task with `id`
    pub fn edit(&self, id: u64, field: TaskField, value: &str) -> Result<TaskRecord> {
        self.edit_fields(id, &[(field, value)])
    }

    /// Change several fields of the task with `id` in one write
    ///
    /// Nothing is saved unless every value is valid.
    pub fn edit_fields<V: AsRef<str>>(
        &self,
        id: u64,
        changes: &[(TaskField, V)],
    ) -> Result<TaskRecord> {
        self.update(id, |records, index| {
            let task = &mut records[index];
            for (field, value) in changes {
                field.apply(task, value.as_ref())?;
                tracing::debug!(id, field = field.as_str(), "task edited");
            }
            Ok(task.clone())
        })
    }

    /// Remove the task with `id`, returning it
    pub fn delete(&self, id: u64) -> Result<TaskRecord> {
        self.update(id, |records, index| {
            tracing::debug!(id, "task deleted");
            Ok(records.remove(index))
        })
    }

    pub fn mark_status(&self, id: u64, complete: bool) -> Result<TaskRecord> {
        self.update(id, |records, index| {
            let task = &mut records[index];
            task.status = complete;
            tracing::debug!(id, complete, "task status set");
            Ok(task.clone())
        })
    }

    pub fn list_all(&self) -> Result<Vec<TaskRecord>> {
        self.load_all()
    }

    pub fn list_incomplete(&self) -> Result<Vec<TaskRecord>> {
        let mut tasks = self.list_all()?;
        tasks.retain(|task| !task.status);
        Ok(tasks)
    }

    /// Group tasks by exact category, categories in first-seen order
    pub fn group_by_category(&self) -> Result<Vec<CategoryGroup>> {
        Ok(group_by_category(self.list_all()?))
    }

    /// Tasks whose title contains `query`, ignoring case
    pub fn search_by_title_substring(&self, query: &str) -> Result<Vec<TaskRecord>> {
        let needle = query.to_lowercase();
        let mut tasks = self.list_all()?;
        tasks.retain(|task| task.title.to_lowercase().contains(&needle));
        Ok(tasks)
    }

    fn update<T, F>(&self, id: u64, f: F) -> Result<T>
    where
        F: FnOnce(&mut Vec<TaskRecord>, usize) -> Result<T>,
    {
        let mut records = self.load_all()?;
        let index = find_index_by_id(&records, id).ok_or(Error::RecordNotFound(id))?;
        let result = f(&mut records, index)?;
        self.save_all(&records)?;
        Ok(result)
    }
}

pub fn group_by_category(tasks: Vec<TaskRecord>) -> Vec<CategoryGroup> {
    let mut groups: Vec<CategoryGroup> = Vec::new();
    let mut index_by_name: HashMap<String, usize> = HashMap::new();
    for task in tasks {
        match index_by_name.get(&task.category) {
            Some(&index) => groups[index].tasks.push(task),
            None => {
                index_by_name.insert(task.category.clone(), groups.len());
                groups.push(CategoryGroup {
                    category: task.category.clone(),
                    tasks: vec![task],
                });
            }
        }
    }
    groups
}

/// Parse a stored deadline; the fractional seconds part is optional
pub fn parse_deadline(value: &str) -> Result<NaiveDateTime> {
    let trimmed = value.trim();
    trimmed.parse::<NaiveDateTime>().map_err(|err| {
        Error::Validation(format!(
            "invalid deadline '{trimmed}' (expected YYYY-MM-DDTHH:MM:SS[.ffffff]): {err}"
        ))
    })
}

pub fn format_deadline(at: NaiveDateTime) -> String {
    at.format(DEADLINE_FORMAT).to_string()
}

/// Parse a relative term such as `d2h5` or `m1`.
///
/// `h<N>` is hours, `d<N>` days and `m<N>` months of 30 days. Units may come
/// in any order and may be separated by other text; the first occurrence of
/// each unit counts.
pub fn parse_term(input: &str) -> Result<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(Error::Validation("deadline term cannot be empty".to_string()));
    }

    let mut hours: Option<i64> = None;
    let mut days: Option<i64> = None;
    let mut months: Option<i64> = None;

    let chars: Vec<char> = input.chars().collect();
    let mut pos = 0;
    while pos < chars.len() {
        let unit = chars[pos];
        let digits: String = chars[pos + 1..]
            .iter()
            .take_while(|ch| ch.is_ascii_digit())
            .collect();
        let slot = match unit {
            'h' => &mut hours,
            'd' => &mut days,
            'm' => &mut months,
            _ => {
                pos += 1;
                continue;
            }
        };
        if digits.is_empty() {
            pos += 1;
            continue;
        }
        pos += 1 + digits.len();
        if slot.is_none() {
            let value = digits
                .parse::<i64>()
                .map_err(|_| Error::Validation(format!("term value too large: {digits}")))?;
            *slot = Some(value);
        }
    }

    if hours.is_none() && days.is_none() && months.is_none() {
        return Err(Error::Validation(format!(
            "invalid deadline term '{input}' (use h<hours>, d<days>, m<months>, e.g. d2h5)"
        )));
    }

    let too_large = || Error::Validation(format!("deadline term '{input}' is too large"));
    let total_days = months
        .unwrap_or(0)
        .checked_mul(DAYS_PER_MONTH)
        .and_then(|month_days| month_days.checked_add(days.unwrap_or(0)))
        .ok_or_else(too_large)?;
    let span = Duration::try_days(total_days)
        .zip(Duration::try_hours(hours.unwrap_or(0)))
        .and_then(|(days, hours)| days.checked_add(&hours))
        .ok_or_else(too_large)?;
    Ok(span)
}

/// Deadline string `term` after `now`
pub fn deadline_from_term(now: NaiveDateTime, term: &str) -> Result<String> {
    let span = parse_term(term)?;
    let at = now
        .checked_add_signed(span)
        .ok_or_else(|| Error::Validation(format!("deadline term '{term}' is too large")))?;
    Ok(format_deadline(at))
}
