use serde::{Deserialize, Serialize};

use crate::data::ScheduleID;
use crate::tasks::data::DEFAULT_CATEGORY;

/// A single point-in-time appointment. No recurrence model.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub id: ScheduleID,
    pub title: String,
    pub description: Option<String>,
    pub date: String,
    pub time: String,
    pub category: String,
    pub completed: bool,
    pub created_at: String,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub category: Option<String>,
}

impl ScheduleInput {
    pub fn into_new_schedule(self) -> NewSchedule {
        NewSchedule {
            title: self.title.unwrap_or_default(),
            description: self.description,
            date: self.date.unwrap_or_default(),
            time: self.time.unwrap_or_default(),
            category: self.category.unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewSchedule {
    pub title: String,
    pub description: Option<String>,
    pub date: String,
    pub time: String,
    pub category: String,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct SchedulePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub category: Option<String>,
}
