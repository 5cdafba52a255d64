//! Persona catalog: the voices a comment may be spoken in.
//!
//! A [`PersonaCatalog`] maps a persona id to its display name, style prompt,
//! icon and color. Callers may supply their own catalog per request; otherwise
//! the engine uses the one loaded from config, or [`PersonaCatalog::builtin`].

use anyhow::{Context, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// A named commentary style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Persona {
    pub name: String,
    #[serde(default, alias = "systemPrompt")]
    pub system_prompt: String,
    pub icon: String,
    pub color: String,
}

impl Persona {
    pub fn new(name: &str, system_prompt: &str, icon: &str, color: &str) -> Self {
        Self {
            name: name.into(),
            system_prompt: system_prompt.into(),
            icon: icon.into(),
            color: color.into(),
        }
    }
}

/// Persona id → persona. Ordered so prompts render deterministically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct PersonaCatalog(BTreeMap<String, Persona>);

impl PersonaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: impl Into<String>, persona: Persona) -> Self {
        self.0.insert(id.into(), persona);
        self
    }

    pub fn get(&self, id: &str) -> Option<&Persona> {
        self.0.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Persona)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The six default voices.
    pub fn builtin() -> Self {
        Self::new()
            .with(
                "holder",
                Persona::new(
                    "接纳者 (The Holder)",
                    "You receive feelings without fixing them. Name what the writer feels and let it be okay.",
                    "heart",
                    "pink",
                ),
            )
            .with(
                "unpacker",
                Persona::new(
                    "拆解者 (The Unpacker)",
                    "You gently take a tangled thought apart into smaller, clearer pieces.",
                    "brain",
                    "blue",
                ),
            )
            .with(
                "starter",
                Persona::new(
                    "启动者 (The Starter)",
                    "You nudge toward one small, concrete next step the writer could take today.",
                    "fist",
                    "yellow",
                ),
            )
            .with(
                "mirror",
                Persona::new(
                    "照镜者 (The Mirror)",
                    "You reflect the writer's own words back so they can hear themselves.",
                    "eye",
                    "green",
                ),
            )
            .with(
                "weaver",
                Persona::new(
                    "连接者 (The Weaver)",
                    "You connect this moment to patterns, people, and earlier threads in the writer's life.",
                    "compass",
                    "purple",
                ),
            )
            .with(
                "absurdist",
                Persona::new(
                    "幽默者 (The Absurdist)",
                    "You find the gentle absurdity in the situation and lighten it without mocking.",
                    "masks",
                    "pink",
                ),
            )
    }

    /// Load a catalog from a TOML file of `[persona_id]` tables.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read persona catalog {}", path.display()))?;
        let catalog: Self = toml::from_str(&contents)
            .with_context(|| format!("failed to parse persona catalog {}", path.display()))?;
        anyhow::ensure!(
            !catalog.is_empty(),
            "persona catalog {} defines no personas",
            path.display()
        );
        Ok(catalog)
    }
}

impl FromIterator<(String, Persona)> for PersonaCatalog {
    fn from_iter<I: IntoIterator<Item = (String, Persona)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn builtin_catalog_has_six_voices() {
        let catalog = PersonaCatalog::builtin();
        assert_eq!(catalog.len(), 6);
        assert!(catalog.contains("holder"));
        assert_eq!(catalog.get("mirror").unwrap().icon, "eye");
    }

    #[test]
    fn iteration_is_ordered_by_id() {
        let ids: Vec<_> = PersonaCatalog::builtin().iter().map(|(id, _)| id.clone()).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn load_catalog_from_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[critic]
name = "The Critic"
system_prompt = "Point out what does not add up."
icon = "question"
color = "blue"

[cheer]
name = "The Cheerleader"
icon = "heart"
color = "yellow"
"#
        )
        .unwrap();

        let catalog = PersonaCatalog::load_from(file.path()).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("critic").unwrap().name, "The Critic");
        assert!(catalog.get("cheer").unwrap().system_prompt.is_empty());
    }

    #[test]
    fn empty_catalog_file_is_rejected() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = PersonaCatalog::load_from(file.path()).unwrap_err();
        assert!(err.to_string().contains("defines no personas"));
    }

    #[test]
    fn json_catalog_accepts_camel_case_prompt() {
        let json = r#"{"holder": {"name": "H", "systemPrompt": "hold", "icon": "heart", "color": "pink"}}"#;
        let catalog: PersonaCatalog = serde_json::from_str(json).unwrap();
        assert_eq!(catalog.get("holder").unwrap().system_prompt, "hold");
    }
}
