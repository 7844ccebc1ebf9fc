//! Plan and task structures
//!
//! Serialized camelCase for the HTTP surface. The plan's total is exposed as
//! `estimatedTotalTime` (minutes).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Task status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Skipped,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::InProgress => write!(f, "in-progress"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Skipped => write!(f, "skipped"),
        }
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" | "todo" => Ok(TaskStatus::Pending),
            "in-progress" | "in_progress" | "inprogress" => Ok(TaskStatus::InProgress),
            "completed" | "complete" | "done" => Ok(TaskStatus::Completed),
            "skipped" | "skip" => Ok(TaskStatus::Skipped),
            _ => Err(format!("Unknown task status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl std::str::FromStr for TaskPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(TaskPriority::Low),
            "medium" | "normal" => Ok(TaskPriority::Medium),
            "high" | "critical" => Ok(TaskPriority::High),
            _ => Err(format!("Unknown task priority: {}", s)),
        }
    }
}

/// Closed set of task categories
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskCategory {
    Setup,
    Component,
    Styling,
    Logic,
    Testing,
    Deployment,
    #[default]
    Other,
}

impl TaskCategory {
    /// Lenient parse for provider output; unknown labels become `Other`
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "setup" | "configuration" | "config" => TaskCategory::Setup,
            "component" | "components" | "ui" => TaskCategory::Component,
            "styling" | "style" | "styles" | "design" => TaskCategory::Styling,
            "logic" | "feature" | "backend" | "state" => TaskCategory::Logic,
            "testing" | "test" | "tests" | "qa" => TaskCategory::Testing,
            "deployment" | "deploy" | "release" => TaskCategory::Deployment,
            _ => TaskCategory::Other,
        }
    }
}

/// A single unit of work within a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
    /// Ids of tasks that must finish first
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub category: TaskCategory,
    pub estimated_minutes: u32,
}

impl Task {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        category: TaskCategory,
        estimated_minutes: u32,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            status: TaskStatus::Pending,
            dependencies: Vec::new(),
            priority: TaskPriority::Medium,
            category,
            estimated_minutes,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn depends_on(mut self, ids: &[&str]) -> Self {
        self.dependencies = ids.iter().map(|id| id.to_string()).collect();
        self
    }
}

/// Ordered decomposition of a build request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: String,
    pub prompt: String,
    pub tasks: Vec<Task>,
    /// Sum of task estimates, in minutes
    #[serde(rename = "estimatedTotalTime", alias = "totalEstimatedMinutes")]
    pub total_estimated_minutes: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Plan {
    /// New plan; the total is derived from the tasks
    pub fn new(prompt: impl Into<String>, tasks: Vec<Task>) -> Self {
        let now = Utc::now();
        let total_estimated_minutes = tasks
            .iter()
            .map(|t| t.estimated_minutes)
            .fold(0u32, u32::saturating_add);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            prompt: prompt.into(),
            tasks,
            total_estimated_minutes,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn find_task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Tasks whose dependencies are all completed or skipped
    pub fn ready_tasks(&self) -> Vec<&Task> {
        let done: HashSet<&str> = self
            .tasks
            .iter()
            .filter(|t| matches!(t.status, TaskStatus::Completed | TaskStatus::Skipped))
            .map(|t| t.id.as_str())
            .collect();
        self.tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Pending)
            .filter(|t| t.dependencies.iter().all(|d| done.contains(d.as_str())))
            .collect()
    }

    /// Update one task's status; returns false if the id is unknown
    pub fn set_status(&mut self, id: &str, status: TaskStatus) -> bool {
        match self.tasks.iter_mut().find(|t| t.id == id) {
            Some(task) => {
                task.status = status;
                self.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    /// True when the dependency relation has no cycle
    pub fn is_acyclic(&self) -> bool {
        // Kahn's algorithm over known ids
        let ids: HashSet<&str> = self.tasks.iter().map(|t| t.id.as_str()).collect();
        let mut remaining: Vec<&Task> = self.tasks.iter().collect();
        let mut finished: HashSet<&str> = HashSet::new();

        loop {
            let before = remaining.len();
            remaining.retain(|task| {
                let ready = task
                    .dependencies
                    .iter()
                    .filter(|d| ids.contains(d.as_str()))
                    .all(|d| finished.contains(d.as_str()));
                if ready {
                    finished.insert(task.id.as_str());
                }
                !ready
            });
            if remaining.is_empty() {
                return true;
            }
            if remaining.len() == before {
                return false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        let plan = Plan::new(
            "todo app",
            vec![Task::new("1", "Setup", TaskCategory::Setup, 5)],
        );
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["estimatedTotalTime"], 5);
        assert!(json.get("createdAt").is_some());
        assert_eq!(json["tasks"][0]["estimatedMinutes"], 5);
        assert_eq!(json["tasks"][0]["status"], "pending");
        assert_eq!(json["tasks"][0]["category"], "setup");
        assert_eq!(
            serde_json::to_value(TaskStatus::InProgress).unwrap(),
            "in-progress"
        );
    }

    #[test]
    fn test_total_saturates() {
        let plan = Plan::new(
            "big",
            vec![
                Task::new("1", "A", TaskCategory::Logic, u32::MAX),
                Task::new("2", "B", TaskCategory::Logic, 10),
            ],
        );
        assert_eq!(plan.total_estimated_minutes, u32::MAX);
    }

    #[test]
    fn test_category_labels() {
        assert_eq!(TaskCategory::from_label("UI"), TaskCategory::Component);
        assert_eq!(TaskCategory::from_label("deploy"), TaskCategory::Deployment);
        assert_eq!(TaskCategory::from_label("research"), TaskCategory::Other);
    }

    #[test]
    fn test_ready_tasks_follow_dependencies() {
        let mut plan = Plan::new(
            "p",
            vec![
                Task::new("1", "a", TaskCategory::Setup, 5),
                Task::new("2", "b", TaskCategory::Logic, 5).depends_on(&["1"]),
            ],
        );
        let ready: Vec<&str> = plan.ready_tasks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ready, vec!["1"]);

        assert!(plan.set_status("1", TaskStatus::Completed));
        assert!(!plan.set_status("9", TaskStatus::Completed));
        let ready: Vec<&str> = plan.ready_tasks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ready, vec!["2"]);
    }

    #[test]
    fn test_cycle_detection() {
        let plan = Plan::new(
            "p",
            vec![
                Task::new("1", "a", TaskCategory::Setup, 5).depends_on(&["2"]),
                Task::new("2", "b", TaskCategory::Logic, 5).depends_on(&["1"]),
            ],
        );
        assert!(!plan.is_acyclic());
    }
}
