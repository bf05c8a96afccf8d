//! Scenario catalog: personas, their use cases and expected keywords
//!
//! The catalog is read-only once constructed. The built-in table is created
//! once per process; a YAML file can replace it and is validated on load.

mod builtin;

use crate::verify::MatchPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

/// One prompt sent to a persona and what its answer should mention
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UseCase {
    pub name: String,
    pub prompt: String,
    #[serde(alias = "expectContains")]
    pub expected_keywords: Vec<String>,
    #[serde(default)]
    pub policy: MatchPolicy,
}

/// An assistant persona that can be chosen during onboarding
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioEntry {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub use_cases: Vec<UseCase>,
}

/// On-disk catalog layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogFile {
    pub personas: Vec<ScenarioEntry>,
    pub coming_soon: Vec<String>,
    pub user_roles: Vec<String>,
    pub assistant_names: Vec<String>,
    pub avatar_prefixes: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Use case '{use_case}' of persona '{persona}' has no expected keywords or a blank one")]
    EmptyKeywords { persona: String, use_case: String },

    #[error("Use case '{use_case}' of persona '{persona}' has an empty prompt")]
    EmptyPrompt { persona: String, use_case: String },

    #[error("Persona '{0}' is listed more than once")]
    DuplicatePersona(String),

    #[error("Unknown persona '{name}'. Available: {available}")]
    UnknownPersona { name: String, available: String },

    #[error("Invalid catalog file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),
}

/// Immutable scenario table
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioCatalog {
    personas: Vec<ScenarioEntry>,
    coming_soon: Vec<String>,
    user_roles: Vec<String>,
    assistant_names: Vec<String>,
    avatar_prefixes: Vec<String>,
}

impl ScenarioCatalog {
    /// Built-in catalog, constructed on first use
    pub fn builtin() -> &'static ScenarioCatalog {
        static CATALOG: OnceLock<ScenarioCatalog> = OnceLock::new();
        CATALOG.get_or_init(|| Self::from_parts(builtin::catalog_file()))
    }

    /// Validate and build a catalog
    pub fn from_file(file: CatalogFile) -> Result<Self, CatalogError> {
        validate(&file)?;
        Ok(Self::from_parts(file))
    }

    pub fn from_yaml(content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_yaml::from_str(content)?;
        Self::from_file(file)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    fn from_parts(file: CatalogFile) -> Self {
        Self {
            personas: file.personas,
            coming_soon: file.coming_soon,
            user_roles: file.user_roles,
            assistant_names: file.assistant_names,
            avatar_prefixes: file.avatar_prefixes,
        }
    }

    pub fn personas(&self) -> &[ScenarioEntry] {
        &self.personas
    }

    pub fn coming_soon(&self) -> &[String] {
        &self.coming_soon
    }

    pub fn user_roles(&self) -> &[String] {
        &self.user_roles
    }

    pub fn assistant_names(&self) -> &[String] {
        &self.assistant_names
    }

    pub fn avatar_prefixes(&self) -> &[String] {
        &self.avatar_prefixes
    }

    /// Look up a persona by name, case-insensitively
    pub fn persona(&self, name: &str) -> Option<&ScenarioEntry> {
        self.personas
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name.trim()))
    }

    /// Resolve persona names; an empty filter selects every persona
    pub fn select(&self, names: &[String]) -> Result<Vec<&ScenarioEntry>, CatalogError> {
        if names.is_empty() {
            return Ok(self.personas.iter().collect());
        }
        names
            .iter()
            .map(|name| {
                self.persona(name).ok_or_else(|| CatalogError::UnknownPersona {
                    name: name.clone(),
                    available: self
                        .personas
                        .iter()
                        .map(|p| p.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                })
            })
            .collect()
    }
}

fn validate(file: &CatalogFile) -> Result<(), CatalogError> {
    let mut seen = std::collections::HashSet::new();
    for persona in &file.personas {
        if !seen.insert(persona.name.to_lowercase()) {
            return Err(CatalogError::DuplicatePersona(persona.name.clone()));
        }
        for use_case in &persona.use_cases {
            if use_case.prompt.trim().is_empty() {
                return Err(CatalogError::EmptyPrompt {
                    persona: persona.name.clone(),
                    use_case: use_case.name.clone(),
                });
            }
            if use_case.expected_keywords.is_empty()
                || use_case
                    .expected_keywords
                    .iter()
                    .any(|k| k.trim().is_empty())
            {
                return Err(CatalogError::EmptyKeywords {
                    persona: persona.name.clone(),
                    use_case: use_case.name.clone(),
                });
            }
        }
    }
    Ok(())
}
