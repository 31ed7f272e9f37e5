//! Agent roles and their presets.
//!
//! Every task names the role that executes it. A role maps to an
//! `AgentTemplate`, which the driver turns into an `AgentConfig` for the
//! orchestrator's `create_agent`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub Uuid);

impl AgentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First 8 characters of the UUID, for display.
    pub fn short(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Analyst,
    Developer,
    Tester,
    Reviewer,
    Frontend,
}

impl AgentRole {
    pub fn all() -> [AgentRole; 5] {
        [
            AgentRole::Analyst,
            AgentRole::Developer,
            AgentRole::Tester,
            AgentRole::Reviewer,
            AgentRole::Frontend,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Analyst => "analyst",
            AgentRole::Developer => "developer",
            AgentRole::Tester => "tester",
            AgentRole::Reviewer => "reviewer",
            AgentRole::Frontend => "frontend",
        }
    }

    pub fn template(&self) -> AgentTemplate {
        AgentTemplate::for_role(*self)
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named preset for an agent role.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentTemplate {
    pub role: AgentRole,
    pub name: &'static str,
    pub model: &'static str,
    pub temperature: f32,
    pub max_tokens: u32,
    pub system_prompt: &'static str,
}

impl AgentTemplate {
    pub fn for_role(role: AgentRole) -> Self {
        match role {
            AgentRole::Analyst => Self {
                role,
                name: "Code Analyst",
                model: "claude-sonnet",
                temperature: 0.2,
                max_tokens: 4096,
                system_prompt: "You analyze codebases and explain their structure, data flow and integration points.",
            },
            AgentRole::Developer => Self {
                role,
                name: "Backend Developer",
                model: "claude-sonnet",
                temperature: 0.3,
                max_tokens: 8192,
                system_prompt: "You implement production-quality backend code that follows the project's conventions.",
            },
            AgentRole::Tester => Self {
                role,
                name: "Test Engineer",
                model: "claude-haiku",
                temperature: 0.2,
                max_tokens: 8192,
                system_prompt: "You write thorough unit and integration tests, including edge cases.",
            },
            AgentRole::Reviewer => Self {
                role,
                name: "Code Reviewer",
                model: "claude-haiku",
                temperature: 0.1,
                max_tokens: 4096,
                system_prompt: "You review code for correctness, style and maintainability and report concrete issues.",
            },
            AgentRole::Frontend => Self {
                role,
                name: "Frontend Developer",
                model: "claude-sonnet",
                temperature: 0.4,
                max_tokens: 8192,
                system_prompt: "You build accessible, responsive user interfaces that talk to the backend API.",
            },
        }
    }

    pub fn config(&self) -> AgentConfig {
        AgentConfig {
            name: self.name.to_string(),
            role: self.role,
            model: self.model.to_string(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            system_prompt: self.system_prompt.to_string(),
        }
    }
}

/// Request passed to `Orchestrator::create_agent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentConfig {
    pub name: String,
    pub role: AgentRole,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub system_prompt: String,
}

/// An agent registered with the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub role: AgentRole,
}
