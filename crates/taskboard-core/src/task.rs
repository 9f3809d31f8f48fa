use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};
use time::Date;

use crate::id::TaskId;

/// Workflow status of a task.
///
/// Values outside the canonical four are kept verbatim in [`Status::Unknown`]; they never
/// match a canonical selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Status {
    /// Ready to be worked on.
    Todo,
    /// Actively being worked on.
    InProgress,
    /// Completed.
    Done,
    /// Waiting on something else.
    Blocked,
    /// Any other wire value.
    Unknown(String),
}

impl Status {
    /// The canonical statuses in declaration order.
    pub const CANONICAL: [Self; 4] = [Self::Todo, Self::InProgress, Self::Done, Self::Blocked];

    /// Wire representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in-progress",
            Self::Done => "done",
            Self::Blocked => "blocked",
            Self::Unknown(raw) => raw,
        }
    }
}

/// Fixed category bucket of a task.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    /// Category `A`.
    A,
    /// Category `B`.
    B,
    /// Category `C`.
    C,
    /// Category `D`.
    D,
    /// Any other wire value.
    Unknown(String),
}

impl Category {
    /// The canonical categories in declaration order.
    pub const CANONICAL: [Self; 4] = [Self::A, Self::B, Self::C, Self::D];

    /// Wire representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::Unknown(raw) => raw,
        }
    }
}

impl FromStr for Status {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "todo" => Self::Todo,
            "in-progress" => Self::InProgress,
            "done" => Self::Done,
            "blocked" => Self::Blocked,
            other => Self::Unknown(other.to_owned()),
        })
    }
}

impl FromStr for Category {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "A" => Self::A,
            "B" => Self::B,
            "C" => Self::C,
            "D" => Self::D,
            other => Self::Unknown(other.to_owned()),
        })
    }
}

macro_rules! string_enum_impls {
    ($ty:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $ty {
            fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                s.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(d: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let raw = String::deserialize(d)?;
                let Ok(value) = raw.parse::<$ty>();
                Ok(value)
            }
        }
    };
}

string_enum_impls!(Status);
string_enum_impls!(Category);

/// A task record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Identifier assigned by the owning store.
    pub id: TaskId,
    /// Free-text title.
    pub title: String,
    /// Category bucket.
    pub category: Category,
    /// Workflow status.
    pub status: Status,
    /// Calendar date used for filtering and timeline bucketing.
    #[serde(with = "crate::date::iso_date")]
    pub date: Date,
    /// Non-negative quantity.
    pub amount: f64,
}

impl Task {
    /// Materialize a task from a draft and a freshly assigned id.
    #[must_use]
    pub fn from_draft(id: TaskId, draft: TaskDraft) -> Self {
        let TaskDraft {
            title,
            category,
            status,
            date,
            amount,
        } = draft;
        Self {
            id,
            title,
            category,
            status,
            date,
            amount,
        }
    }

    /// Overwrite the fields present in `changes`. The id is never touched.
    pub fn apply_changes(&mut self, changes: TaskChanges) {
        let TaskChanges {
            title,
            category,
            status,
            date,
            amount,
        } = changes;
        if let Some(title) = title {
            self.title = title;
        }
        if let Some(category) = category {
            self.category = category;
        }
        if let Some(status) = status {
            self.status = status;
        }
        if let Some(date) = date {
            self.date = date;
        }
        if let Some(amount) = amount {
            self.amount = amount;
        }
    }
}

/// Every task field except the id; used when the store assigns identifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDraft {
    /// Free-text title.
    pub title: String,
    /// Category bucket.
    pub category: Category,
    /// Workflow status.
    pub status: Status,
    /// Calendar date.
    #[serde(with = "crate::date::iso_date")]
    pub date: Date,
    /// Non-negative quantity.
    pub amount: f64,
}

/// Partial task update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskChanges {
    /// Replacement title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Replacement category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    /// Replacement status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    /// Replacement date.
    #[serde(
        default,
        with = "crate::date::iso_date::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<Date>,
    /// Replacement amount.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
}

impl TaskChanges {
    /// Returns true when applying the changes would not modify anything.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.category.is_none()
            && self.status.is_none()
            && self.date.is_none()
            && self.amount.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn sample() -> Task {
        Task {
            id: TaskId::new("task-1"),
            title: "Frontend Task".into(),
            category: Category::A,
            status: Status::Todo,
            date: date!(2025 - 09 - 01),
            amount: 500.0,
        }
    }

    #[test]
    fn task_serializes_with_wire_names() {
        let json = serde_json::to_value(sample()).unwrap_or_else(|err| panic!("must serialize: {err}"));
        assert_eq!(json["status"], "todo");
        assert_eq!(json["category"], "A");
        assert_eq!(json["date"], "2025-09-01");
    }

    #[test]
    fn unknown_enum_values_survive_deserialization() {
        let raw = r#"{"id":"x","title":"t","category":"Z","status":"archived","date":"2025-09-01","amount":1}"#;
        let task: Task = serde_json::from_str(raw).unwrap_or_else(|err| panic!("must parse: {err}"));
        assert_eq!(task.category, Category::Unknown("Z".into()));
        assert_eq!(task.status, Status::Unknown("archived".into()));
        assert_eq!(task.status.as_str(), "archived");
    }

    #[test]
    fn in_progress_uses_kebab_case() {
        assert_eq!(Status::InProgress.to_string(), "in-progress");
        let Ok(parsed) = "in-progress".parse::<Status>();
        assert_eq!(parsed, Status::InProgress);
    }

    #[test]
    fn apply_changes_only_touches_present_fields() {
        let mut task = sample();
        task.apply_changes(TaskChanges {
            status: Some(Status::Done),
            amount: Some(900.0),
            ..TaskChanges::default()
        });
        assert_eq!(task.status, Status::Done);
        assert!((task.amount - 900.0).abs() < f64::EPSILON);
        assert_eq!(task.title, "Frontend Task");
        assert_eq!(task.id.as_str(), "task-1");
    }

    #[test]
    fn partial_changes_deserialize_from_sparse_json() {
        let changes: TaskChanges = serde_json::from_str(r#"{"date":"2025-10-02"}"#)
            .unwrap_or_else(|err| panic!("must parse: {err}"));
        assert_eq!(changes.date, Some(date!(2025 - 10 - 02)));
        assert!(changes.title.is_none());
        assert!(!changes.is_empty());
    }
}
