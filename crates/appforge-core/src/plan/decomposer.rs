//! Planning decomposer
//!
//! Asks a provider for a task breakdown through the dispatcher, then repairs
//! what comes back into a DAG. Any failure along the way (dispatch error,
//! unparseable answer, empty task list, wall-clock timeout) yields the fixed
//! fallback plan instead.

use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{info, warn};

use super::fallback::fallback_plan;
use super::task::{Plan, Task, TaskCategory, TaskPriority, TaskStatus};
use crate::ai::dispatcher::{DispatchOptions, Dispatcher};
use crate::ai::prompts::PLANNING_SYSTEM_PROMPT;
use crate::ai::types::{GenerationRequest, Mode};
use crate::constants::planning::{FALLBACK_TASK_MINUTES, MAX_TASKS, MAX_TASK_MINUTES};
use crate::extract::extract_json;

/// A plan and, when degraded, why the fallback was used
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub plan: Plan,
    pub fallback_reason: Option<String>,
}

impl PlanOutcome {
    pub fn is_fallback(&self) -> bool {
        self.fallback_reason.is_some()
    }

    fn fallback(prompt: &str, reason: String) -> Self {
        warn!(reason = %reason, "Using fallback plan");
        Self {
            plan: fallback_plan(prompt),
            fallback_reason: Some(reason),
        }
    }
}

#[derive(Clone)]
pub struct PlanningDecomposer {
    dispatcher: Dispatcher,
    timeout: Duration,
}

impl PlanningDecomposer {
    pub fn new(dispatcher: Dispatcher, timeout: Duration) -> Self {
        Self {
            dispatcher,
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Decompose a build request; never fails
    pub async fn decompose(&self, prompt: &str, provider: &str) -> PlanOutcome {
        let request = GenerationRequest::new(provider, prompt).with_mode(Mode::Builder);
        let options = DispatchOptions::default()
            .with_attempt_timeout(self.timeout)
            .with_system_prompt(PLANNING_SYSTEM_PROMPT);

        let report = match tokio::time::timeout(
            self.timeout,
            self.dispatcher.dispatch(&request, options),
        )
        .await
        {
            Ok(report) => report,
            Err(_) => {
                return PlanOutcome::fallback(
                    prompt,
                    format!("planning timed out after {} ms", self.timeout.as_millis()),
                )
            }
        };

        let content = match (report.result.success, report.result.content) {
            (true, Some(content)) => content,
            _ => {
                let kind = report
                    .result
                    .error_payload
                    .map(|p| p.kind.to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                return PlanOutcome::fallback(prompt, format!("provider failed: {}", kind));
            }
        };

        match parse_plan(prompt, &content) {
            Some(plan) => {
                info!(
                    tasks = plan.tasks.len(),
                    minutes = plan.total_estimated_minutes,
                    "Plan decomposed"
                );
                PlanOutcome {
                    plan,
                    fallback_reason: None,
                }
            }
            None => PlanOutcome::fallback(prompt, "provider answer had no usable tasks".to_string()),
        }
    }
}

/// Parse provider text into a repaired plan; `None` if no task survives
pub fn parse_plan(prompt: &str, text: &str) -> Option<Plan> {
    let json = extract_json(text)?;
    let entries = json.get("tasks")?.as_array()?;

    let mut seen = HashSet::new();
    let mut tasks: Vec<Task> = entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| parse_task(index, entry))
        // Duplicate ids keep the first occurrence
        .filter(|task| seen.insert(task.id.clone()))
        .take(MAX_TASKS)
        .collect();

    if tasks.is_empty() {
        return None;
    }
    repair_dependencies(&mut tasks);
    Some(Plan::new(prompt, tasks))
}

fn parse_task(index: usize, entry: &Value) -> Option<Task> {
    let title = entry
        .get("title")
        .or_else(|| entry.get("name"))
        .and_then(|t| t.as_str())
        .map(str::trim)
        .filter(|t| !t.is_empty())?;

    let id = entry
        .get("id")
        .and_then(id_string)
        .unwrap_or_else(|| (index + 1).to_string());

    let minutes = ["estimatedMinutes", "estimatedTime", "minutes"]
        .iter()
        .find_map(|key| entry.get(*key).and_then(minutes_value))
        .unwrap_or(FALLBACK_TASK_MINUTES)
        .clamp(1, MAX_TASK_MINUTES);

    let dependencies = entry
        .get("dependencies")
        .and_then(|d| d.as_array())
        .map(|deps| deps.iter().filter_map(id_string).collect())
        .unwrap_or_default();

    let text = |key: &str| entry.get(key).and_then(|v| v.as_str());

    Some(Task {
        id,
        title: title.to_string(),
        description: text("description").unwrap_or_default().to_string(),
        status: text("status")
            .and_then(|s| s.parse().ok())
            .unwrap_or(TaskStatus::Pending),
        dependencies,
        priority: text("priority")
            .and_then(|p| p.parse().ok())
            .unwrap_or(TaskPriority::Medium),
        category: text("category")
            .map(TaskCategory::from_label)
            .unwrap_or_default(),
        estimated_minutes: minutes,
    })
}

/// Ids arrive as strings or numbers
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn minutes_value(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_f64().map(|m| m.round().clamp(0.0, u32::MAX as f64) as u32),
        Value::String(s) => s
            .split_whitespace()
            .next()
            .and_then(|m| m.parse::<u32>().ok()),
        _ => None,
    }
}

/// Drop unknown ids, self-references, repeats and every edge that would close a cycle
fn repair_dependencies(tasks: &mut [Task]) {
    let ids: HashSet<String> = tasks.iter().map(|t| t.id.clone()).collect();

    for i in 0..tasks.len() {
        let candidates = std::mem::take(&mut tasks[i].dependencies);
        let task_id = tasks[i].id.clone();
        for dep in candidates {
            if dep == task_id || !ids.contains(&dep) || tasks[i].dependencies.contains(&dep) {
                continue;
            }
            if would_create_cycle(tasks, &task_id, &dep) {
                warn!(task = %task_id, dependency = %dep, "Dropping dependency that closes a cycle");
                continue;
            }
            tasks[i].dependencies.push(dep);
        }
    }
}

/// Would `task_id` depending on `dependency_id` close a cycle?
fn would_create_cycle(tasks: &[Task], task_id: &str, dependency_id: &str) -> bool {
    // A cycle exists if dependency_id already (transitively) depends on task_id
    let mut visited = HashSet::new();
    let mut stack = vec![dependency_id.to_string()];

    while let Some(current) = stack.pop() {
        if current == task_id {
            return true;
        }
        if visited.insert(current.clone()) {
            if let Some(task) = tasks.iter().find(|t| t.id == current) {
                stack.extend(task.dependencies.iter().cloned());
            }
        }
    }

    false
}
