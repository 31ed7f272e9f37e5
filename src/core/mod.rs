//! Core domain models: task definitions and the dependency graph that
//! validates and schedules them.

pub mod dag;
pub mod task;

pub use dag::TaskGraph;
pub use task::{TaskDefinition, TaskId, TaskType};
