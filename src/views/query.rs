//! The one shared filter layer. Every view builds `SearchItem`s and runs them
//! through `matches`, so filter semantics cannot drift between views.

use crate::prefs::{Category, Priority};
use crate::schedules::data::Schedule;
use crate::tasks::data::Task;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ItemKind {
    Task,
    Schedule,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum KindFilter {
    #[default]
    All,
    Tasks,
    Schedules,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Completed,
}

#[derive(Clone, Debug)]
pub struct SearchItem {
    pub kind: ItemKind,
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub completed: bool,
    pub date_display: String,
    pub priority: Option<Priority>,
}

#[derive(Clone, Debug, Default)]
pub struct Criteria {
    pub term: String,
    pub kind: KindFilter,
    pub status: StatusFilter,
    /// `None` means all categories.
    pub category: Option<String>,
    /// `None` means all priorities.
    pub priority: Option<Priority>,
}

/// The priority a category key carries, or `None` for an orphaned reference
/// (the category was deleted; the item renders without an indicator).
pub fn priority_of(category: &str, categories: &[Category]) -> Option<Priority> {
    categories
        .iter()
        .find(|c| c.value == category)
        .map(|c| c.priority)
}

pub fn task_item(task: &Task, categories: &[Category]) -> SearchItem {
    SearchItem {
        kind: ItemKind::Task,
        id: task.id,
        title: task.title.clone(),
        description: task.description.clone(),
        category: task.category.clone(),
        completed: task.completed,
        date_display: format!("Due: {}", task.due_date),
        priority: priority_of(&task.category, categories),
    }
}

pub fn schedule_item(schedule: &Schedule, categories: &[Category]) -> SearchItem {
    SearchItem {
        kind: ItemKind::Schedule,
        id: schedule.id,
        title: schedule.title.clone(),
        description: schedule.description.clone(),
        category: schedule.category.clone(),
        completed: schedule.completed,
        date_display: format!("{} at {}", schedule.date, schedule.time),
        priority: priority_of(&schedule.category, categories),
    }
}

pub fn matches(item: &SearchItem, criteria: &Criteria) -> bool {
    let kind_ok = match criteria.kind {
        KindFilter::All => true,
        KindFilter::Tasks => item.kind == ItemKind::Task,
        KindFilter::Schedules => item.kind == ItemKind::Schedule,
    };

    let term = criteria.term.to_lowercase();
    let term_ok = term.is_empty()
        || item.title.to_lowercase().contains(&term)
        || item
            .description
            .as_deref()
            .map(|d| d.to_lowercase().contains(&term))
            .unwrap_or(false);

    let category_ok = match criteria.category.as_deref() {
        None => true,
        Some(category) => item.category == category,
    };

    // An orphaned category still participates in priority filtering as low.
    let priority_ok = match criteria.priority {
        None => true,
        Some(priority) => item.priority.unwrap_or(Priority::Low) == priority,
    };

    let status_ok = match criteria.status {
        StatusFilter::All => true,
        StatusFilter::Pending => !item.completed,
        StatusFilter::Completed => item.completed,
    };

    kind_ok && term_ok && category_ok && priority_ok && status_ok
}

pub fn filter_items(items: &[SearchItem], criteria: &Criteria) -> Vec<SearchItem> {
    items
        .iter()
        .filter(|item| matches(item, criteria))
        .cloned()
        .collect()
}
