use std::fmt;

use serde::{Deserialize, Serialize};

/// The finite set of entity kinds an attachment can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerKind {
    Task,
    Habit,
    Goal,
    Event,
}

impl OwnerKind {
    pub const ALL: &[OwnerKind] = &[
        OwnerKind::Task,
        OwnerKind::Habit,
        OwnerKind::Goal,
        OwnerKind::Event,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OwnerKind::Task => "task",
            OwnerKind::Habit => "habit",
            OwnerKind::Goal => "goal",
            OwnerKind::Event => "event",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            OwnerKind::Task => "Task",
            OwnerKind::Habit => "Habit",
            OwnerKind::Goal => "Goal",
            OwnerKind::Event => "Event",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            OwnerKind::Task => "checkmark.circle",
            OwnerKind::Habit => "repeat",
            OwnerKind::Goal => "target",
            OwnerKind::Event => "calendar",
        }
    }

    pub fn accent_color(&self) -> &'static str {
        match self {
            OwnerKind::Task => "#4A90D9",
            OwnerKind::Habit => "#7B61C9",
            OwnerKind::Goal => "#D98E4A",
            OwnerKind::Event => "#4AB87A",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "task" => Some(OwnerKind::Task),
            "habit" => Some(OwnerKind::Habit),
            "goal" => Some(OwnerKind::Goal),
            "event" => Some(OwnerKind::Event),
            _ => None,
        }
    }
}

impl fmt::Display for OwnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Reference to the single entity an attachment belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerRef {
    pub kind: OwnerKind,
    pub id: String,
}

impl OwnerRef {
    pub fn new(kind: OwnerKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn task(id: impl Into<String>) -> Self {
        Self::new(OwnerKind::Task, id)
    }

    pub fn habit(id: impl Into<String>) -> Self {
        Self::new(OwnerKind::Habit, id)
    }

    pub fn goal(id: impl Into<String>) -> Self {
        Self::new(OwnerKind::Goal, id)
    }

    pub fn event(id: impl Into<String>) -> Self {
        Self::new(OwnerKind::Event, id)
    }
}

impl fmt::Display for OwnerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.id)
    }
}
