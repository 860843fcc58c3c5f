use crate::entities::sea_orm_active_enums;
use serde::Serialize;
use std::fmt;
use utoipa::ToSchema;

/// Lifecycle state of a task.
///
/// Any status may move to any other status; there is no guarded transition graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Completed,
    Cancelled,
}

/// Returned when a status string matches neither a machine name nor a display label.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid task status: {0}")]
pub struct InvalidStatusError(pub String);

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Todo,
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::Cancelled,
    ];

    /// Returns the canonical machine name, e.g. `IN_PROGRESS`.
    pub fn name(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "TODO",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Cancelled => "CANCELLED",
        }
    }

    /// Returns the human readable label, e.g. `In Progress`.
    pub fn display_name(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "To Do",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
            TaskStatus::Cancelled => "Cancelled",
        }
    }

    /// Parses a free-form status string.
    ///
    /// Matching is case-insensitive against either the machine name or the
    /// display label. A missing or blank value yields [`TaskStatus::Todo`].
    ///
    /// # Errors
    ///
    /// Returns [`InvalidStatusError`] carrying the raw input when nothing matches.
    pub fn parse(raw: Option<&str>) -> Result<TaskStatus, InvalidStatusError> {
        let Some(raw) = raw else {
            return Ok(TaskStatus::Todo);
        };
        let value = raw.trim();
        if value.is_empty() {
            return Ok(TaskStatus::Todo);
        }

        TaskStatus::ALL
            .into_iter()
            .find(|status| {
                status.name().eq_ignore_ascii_case(value)
                    || status.display_name().eq_ignore_ascii_case(value)
            })
            .ok_or_else(|| InvalidStatusError(raw.to_string()))
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl From<sea_orm_active_enums::TaskStatus> for TaskStatus {
    fn from(status: sea_orm_active_enums::TaskStatus) -> Self {
        match status {
            sea_orm_active_enums::TaskStatus::Todo => TaskStatus::Todo,
            sea_orm_active_enums::TaskStatus::InProgress => TaskStatus::InProgress,
            sea_orm_active_enums::TaskStatus::Completed => TaskStatus::Completed,
            sea_orm_active_enums::TaskStatus::Cancelled => TaskStatus::Cancelled,
        }
    }
}

impl From<TaskStatus> for sea_orm_active_enums::TaskStatus {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Todo => sea_orm_active_enums::TaskStatus::Todo,
            TaskStatus::InProgress => sea_orm_active_enums::TaskStatus::InProgress,
            TaskStatus::Completed => sea_orm_active_enums::TaskStatus::Completed,
            TaskStatus::Cancelled => sea_orm_active_enums::TaskStatus::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_default_missing_or_blank_status_to_todo() {
        assert_eq!(TaskStatus::parse(None), Ok(TaskStatus::Todo));
        assert_eq!(TaskStatus::parse(Some("")), Ok(TaskStatus::Todo));
        assert_eq!(TaskStatus::parse(Some("   ")), Ok(TaskStatus::Todo));
    }

    #[test]
    fn can_parse_machine_names_ignoring_case() {
        assert_eq!(TaskStatus::parse(Some("completed")), Ok(TaskStatus::Completed));
        assert_eq!(TaskStatus::parse(Some("Completed")), Ok(TaskStatus::Completed));
        assert_eq!(TaskStatus::parse(Some("COMPLETED")), Ok(TaskStatus::Completed));
        assert_eq!(
            TaskStatus::parse(Some(" in_progress ")),
            Ok(TaskStatus::InProgress)
        );
    }

    #[test]
    fn can_parse_display_labels_ignoring_case() {
        assert_eq!(TaskStatus::parse(Some("to do")), Ok(TaskStatus::Todo));
        assert_eq!(TaskStatus::parse(Some("In Progress")), Ok(TaskStatus::InProgress));
        assert_eq!(TaskStatus::parse(Some("CANCELLED")), Ok(TaskStatus::Cancelled));
    }

    #[test]
    fn can_reject_unknown_status() {
        let result = TaskStatus::parse(Some("bogus"));
        assert_eq!(result, Err(InvalidStatusError("bogus".to_string())));
        assert_eq!(
            result.unwrap_err().to_string(),
            "Invalid task status: bogus"
        );
    }

    #[test]
    fn can_serialize_as_machine_name() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"IN_PROGRESS\"");
        assert_eq!(TaskStatus::InProgress.to_string(), "In Progress");
    }
}
