//! Fixed plan returned when the provider cannot produce one

use super::task::{Plan, Task, TaskCategory, TaskPriority};
use crate::constants::planning::FALLBACK_TASK_MINUTES;

/// Six-task plan: setup, setup, component, then styling and logic in parallel, then testing
pub fn fallback_plan(prompt: &str) -> Plan {
    let minutes = FALLBACK_TASK_MINUTES;
    let tasks = vec![
        Task::new("1", "Set up the project", TaskCategory::Setup, minutes)
            .with_description(format!("Create the project skeleton for: {}", prompt))
            .with_priority(TaskPriority::High),
        Task::new("2", "Configure dependencies", TaskCategory::Setup, minutes)
            .with_description("Install libraries and configure build tooling")
            .with_priority(TaskPriority::High)
            .depends_on(&["1"]),
        Task::new("3", "Build the core components", TaskCategory::Component, minutes)
            .with_description("Create the main screens and reusable components")
            .with_priority(TaskPriority::High)
            .depends_on(&["2"]),
        Task::new("4", "Style the interface", TaskCategory::Styling, minutes)
            .with_description("Apply layout, colors and responsive styles")
            .depends_on(&["3"]),
        Task::new("5", "Implement the application logic", TaskCategory::Logic, minutes)
            .with_description("Wire up state, data flow and interactions")
            .with_priority(TaskPriority::High)
            .depends_on(&["3"]),
        Task::new("6", "Test and polish", TaskCategory::Testing, minutes)
            .with_description("Verify the main flows and fix rough edges")
            .depends_on(&["4", "5"]),
    ];
    Plan::new(prompt, tasks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_shape() {
        let plan = fallback_plan("todo app");
        assert_eq!(plan.tasks.len(), 6);
        assert_eq!(plan.total_estimated_minutes, 30);
        assert_eq!(plan.prompt, "todo app");

        let categories: Vec<TaskCategory> = plan.tasks.iter().map(|t| t.category).collect();
        assert_eq!(
            categories,
            vec![
                TaskCategory::Setup,
                TaskCategory::Setup,
                TaskCategory::Component,
                TaskCategory::Styling,
                TaskCategory::Logic,
                TaskCategory::Testing,
            ]
        );
        assert_eq!(plan.find_task("6").unwrap().dependencies, vec!["4", "5"]);
        assert!(plan.is_acyclic());
    }

    #[test]
    fn test_fallback_plans_have_distinct_ids() {
        assert_ne!(fallback_plan("a").id, fallback_plan("a").id);
    }
}
