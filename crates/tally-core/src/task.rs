use std::str::FromStr;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn ordinal(self) -> u8 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl FromStr for Priority {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(anyhow!("invalid priority: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,

    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub date: String,

    pub priority: Priority,

    #[serde(default)]
    pub completed: bool,
}

impl Task {
    pub fn new(title: String, description: String, date: String, priority: Priority) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            description,
            date,
            priority,
            completed: false,
        }
    }
}
