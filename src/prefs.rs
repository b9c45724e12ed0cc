//! Locally persisted user preferences: the two custom category lists, the UI
//! theme and the last active route. These live outside the task/schedule data
//! model and never sync to the server.

use serde::{Deserialize, Serialize};

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::api_error::{ApiError, ApiResult, FieldErrors};

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Extreme,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Extreme => "extreme",
        };
        write!(f, "{}", name)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Category {
    pub label: String,
    pub value: String,
    pub priority: Priority,
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CategoryScope {
    Tasks,
    Schedules,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default, rename_all = "camelCase")]
pub struct Preferences {
    pub task_categories: Vec<Category>,
    pub schedule_categories: Vec<Category>,
    pub theme: Theme,
    pub last_route: String,
}

impl Default for Preferences {
    fn default() -> Preferences {
        Preferences {
            task_categories: vec![],
            schedule_categories: vec![],
            theme: Theme::Dark,
            last_route: "tasks".to_string(),
        }
    }
}

/// JSON-file-backed preference store. A missing or unreadable file falls back
/// to defaults; save failures are reported but never fatal.
pub struct PrefsStore {
    path: PathBuf,
    state: Mutex<Preferences>,
}

impl PrefsStore {
    pub fn load(path: impl AsRef<Path>) -> PrefsStore {
        let path = path.as_ref().to_path_buf();
        let prefs = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "unreadable preferences, using defaults");
                Preferences::default()
            }),
            Err(_) => Preferences::default(),
        };
        PrefsStore {
            path,
            state: Mutex::new(prefs),
        }
    }

    fn persist(&self, prefs: &Preferences) -> ApiResult<()> {
        let raw = serde_json::to_string_pretty(prefs)
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        fs::write(&self.path, raw)?;
        Ok(())
    }

    fn list_mut<'a>(prefs: &'a mut Preferences, scope: CategoryScope) -> &'a mut Vec<Category> {
        match scope {
            CategoryScope::Tasks => &mut prefs.task_categories,
            CategoryScope::Schedules => &mut prefs.schedule_categories,
        }
    }

    fn list<'a>(prefs: &'a Preferences, scope: CategoryScope) -> &'a [Category] {
        match scope {
            CategoryScope::Tasks => &prefs.task_categories,
            CategoryScope::Schedules => &prefs.schedule_categories,
        }
    }

    /// Adds a category to the given list. The key is the trimmed, lowercased
    /// label; duplicate keys within a list are rejected.
    pub fn add_category(
        &self,
        scope: CategoryScope,
        label: &str,
        priority: Priority,
    ) -> ApiResult<Category> {
        let label = label.trim();
        let value = label.to_lowercase();
        if value.is_empty() {
            let mut errors = FieldErrors::new();
            errors.insert("label".to_string(), vec!["Label is required".to_string()]);
            return Err(ApiError::Validation(errors));
        }

        let mut prefs = self.state.lock()?;
        let list = Self::list_mut(&mut prefs, scope);
        if list.iter().any(|c| c.value == value) {
            let mut errors = FieldErrors::new();
            errors.insert(
                "label".to_string(),
                vec![format!("Category \"{}\" already exists", value)],
            );
            return Err(ApiError::Validation(errors));
        }

        let category = Category {
            label: label.to_string(),
            value,
            priority,
        };
        list.push(category.clone());
        // Keep memory and disk in step: a failed save must not leave a
        // phantom category that blocks re-adding it.
        if let Err(e) = self.persist(&prefs) {
            Self::list_mut(&mut prefs, scope).pop();
            return Err(e);
        }
        Ok(category)
    }

    /// Removes a category by key. Tasks and schedules referencing it are left
    /// untouched; their references become orphaned.
    pub fn remove_category(&self, scope: CategoryScope, value: &str) -> ApiResult<()> {
        let mut prefs = self.state.lock()?;
        Self::list_mut(&mut prefs, scope).retain(|c| c.value != value);
        self.persist(&prefs)?;
        Ok(())
    }

    pub fn categories(&self, scope: CategoryScope) -> Vec<Category> {
        match self.state.lock() {
            Ok(prefs) => Self::list(&prefs, scope).to_vec(),
            Err(poisoned) => Self::list(&poisoned.into_inner(), scope).to_vec(),
        }
    }

    pub fn priority_of(&self, scope: CategoryScope, value: &str) -> Option<Priority> {
        self.categories(scope)
            .iter()
            .find(|c| c.value == value)
            .map(|c| c.priority)
    }

    pub fn theme(&self) -> Theme {
        match self.state.lock() {
            Ok(prefs) => prefs.theme,
            Err(poisoned) => poisoned.into_inner().theme,
        }
    }

    pub fn set_theme(&self, theme: Theme) -> ApiResult<()> {
        let mut prefs = self.state.lock()?;
        prefs.theme = theme;
        self.persist(&prefs)
    }

    pub fn last_route(&self) -> String {
        match self.state.lock() {
            Ok(prefs) => prefs.last_route.clone(),
            Err(poisoned) => poisoned.into_inner().last_route.clone(),
        }
    }

    pub fn set_last_route(&self, route: &str) -> ApiResult<()> {
        let mut prefs = self.state.lock()?;
        prefs.last_route = route.to_string();
        self.persist(&prefs)
    }
}
