use serde::{Deserialize, Serialize};

/// Description used for a skill nobody described explicitly.
pub const DEFAULT_SKILL_DESCRIPTION: &str = "Registered skill actions";

/// A skill and its actions as exported to the sync service.
///
/// Skill and action ordering in the export is part of the contract: the
/// service persists and diffs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillDefinition {
    /// Skill name.
    pub name: String,
    /// Skill description.
    pub description: String,
    /// Actions, ascending by name.
    pub actions: Vec<ActionDefinition>,
}

/// One action inside a [`SkillDefinition`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDefinition {
    /// Action name.
    pub name: String,
    /// Action description.
    pub description: String,
    /// JSON-encoded input schema.
    pub input_schema: String,
}

/// The record shape stored by the ingest service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSkill {
    /// Skill name.
    pub name: String,
    /// Skill description.
    #[serde(default)]
    pub description: String,
    /// JSON-encoded action list.
    #[serde(default)]
    pub json_schema: String,
}

impl SkillDefinition {
    /// Converts into an ingest record; the actions become `json_schema`.
    pub fn to_remote(&self) -> RemoteSkill {
        let actions: Vec<serde_json::Value> = self
            .actions
            .iter()
            .map(|a| {
                serde_json::json!({
                    "name": a.name,
                    "description": a.description,
                    "input_schema": a.input_schema,
                })
            })
            .collect();

        RemoteSkill {
            name: self.name.clone(),
            description: self.description.clone(),
            json_schema: serde_json::Value::Array(actions).to_string(),
        }
    }
}
