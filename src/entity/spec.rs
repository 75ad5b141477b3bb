// src/entity/spec.rs
use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{EduforgeError, Result};
use crate::prompt::Locale;

/// The fields a specification must fill before it can be generated.
///
/// Declaration order is the order validation reports them in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequiredField {
    Title,
    Description,
    Audience,
    InitialState,
}

impl RequiredField {
    pub const ALL: [RequiredField; 4] = [
        RequiredField::Title,
        RequiredField::Description,
        RequiredField::Audience,
        RequiredField::InitialState,
    ];

    /// Key used for this field in the import/export format.
    pub fn key(&self) -> &'static str {
        match self {
            RequiredField::Title => "title",
            RequiredField::Description => "description",
            RequiredField::Audience => "audience",
            RequiredField::InitialState => "initial",
        }
    }

    /// Human-facing field name.
    pub fn label(&self, locale: Locale) -> &'static str {
        match (locale, self) {
            (Locale::English, RequiredField::Title) => "Tool title",
            (Locale::English, RequiredField::Description) => "Concept description",
            (Locale::English, RequiredField::Audience) => "Target audience",
            (Locale::English, RequiredField::InitialState) => "Initial view",
            (Locale::Serbian, RequiredField::Title) => "Naziv alata",
            (Locale::Serbian, RequiredField::Description) => "Opis koncepta",
            (Locale::Serbian, RequiredField::Audience) => "Ciljna grupa",
            (Locale::Serbian, RequiredField::InitialState) => "Početni prikaz",
        }
    }

    /// The per-field message shown when the field is left blank.
    pub fn missing_message(&self, locale: Locale) -> String {
        match locale {
            Locale::English => format!("{} is required.", self.label(locale)),
            Locale::Serbian => format!("{} je obavezno.", self.label(locale)),
        }
    }
}

impl std::fmt::Display for RequiredField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl std::str::FromStr for RequiredField {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "title" => Ok(RequiredField::Title),
            "description" => Ok(RequiredField::Description),
            "audience" => Ok(RequiredField::Audience),
            "initial" | "initial_state" => Ok(RequiredField::InitialState),
            _ => Err(format!("Unknown field: {}", s)),
        }
    }
}

/// One condition/response binding describing how a visual element reacts
/// to repeated triggering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionRule {
    #[serde(rename = "if", default)]
    pub condition: String,
    #[serde(rename = "then_first", default)]
    pub first_response: String,
    /// Entry `i` is the action for trigger number `i + 2`.
    #[serde(rename = "then_next", default)]
    pub subsequent_responses: Vec<String>,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub style: String,
}

impl InteractionRule {
    pub fn new(condition: impl Into<String>, first_response: impl Into<String>) -> Self {
        Self {
            condition: condition.into(),
            first_response: first_response.into(),
            ..Default::default()
        }
    }

    /// Rules without a condition are never sent to the backend.
    pub fn qualifies(&self) -> bool {
        !self.condition.trim().is_empty()
    }
}

/// The structured description of an educational tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSpecification {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub audience: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "initial", default)]
    pub initial_state: String,
    #[serde(rename = "interactions", default)]
    pub interaction_rules: Vec<InteractionRule>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "blank_as_none"
    )]
    pub extras: Option<String>,
}

fn blank_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

impl ToolSpecification {
    pub fn new(
        title: impl Into<String>,
        audience: impl Into<String>,
        description: impl Into<String>,
        initial_state: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            audience: audience.into(),
            description: description.into(),
            initial_state: initial_state.into(),
            interaction_rules: Vec::new(),
            extras: None,
        }
    }

    /// A filled-in example, written by `eduforge new`.
    pub fn template() -> Self {
        let mut spec = Self::new(
            "Bouncing Ball",
            "grade 5",
            "A ball falls under gravity and loses height on every bounce.",
            "a red ball at the top of a white canvas, floor line at the bottom",
        );
        spec.interaction_rules.push(InteractionRule {
            condition: "ball touches floor".to_string(),
            first_response: "ball bounces".to_string(),
            subsequent_responses: vec!["ball bounces lower".to_string()],
            position: "x:100,y:0".to_string(),
            style: "red circle, radius 20".to_string(),
        });
        spec
    }

    /// Blank or whitespace-only extras are stored as absent.
    pub fn set_extras(&mut self, extras: impl Into<String>) {
        let extras = extras.into();
        self.extras = if extras.trim().is_empty() {
            None
        } else {
            Some(extras)
        };
    }

    pub fn extras_text(&self) -> Option<&str> {
        self.extras
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn field(&self, field: RequiredField) -> &str {
        match field {
            RequiredField::Title => &self.title,
            RequiredField::Description => &self.description,
            RequiredField::Audience => &self.audience,
            RequiredField::InitialState => &self.initial_state,
        }
    }

    pub fn set_field(&mut self, field: RequiredField, value: impl Into<String>) {
        let value = value.into();
        match field {
            RequiredField::Title => self.title = value,
            RequiredField::Description => self.description = value,
            RequiredField::Audience => self.audience = value,
            RequiredField::InitialState => self.initial_state = value,
        }
    }

    /// Required fields that are blank after trimming.
    pub fn missing_fields(&self) -> Vec<RequiredField> {
        RequiredField::ALL
            .into_iter()
            .filter(|f| self.field(*f).trim().is_empty())
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(EduforgeError::Validation { missing })
        }
    }

    /// Rules with a non-blank condition, in their original order.
    pub fn qualifying_rules(&self) -> impl Iterator<Item = &InteractionRule> {
        self.interaction_rules.iter().filter(|r| r.qualifies())
    }

    pub fn has_rules(&self) -> bool {
        self.qualifying_rules().next().is_some()
    }

    pub fn dropped_rule_count(&self) -> usize {
        self.interaction_rules.len() - self.qualifying_rules().count()
    }

    pub fn from_json(input: &str) -> Result<Self> {
        serde_json::from_str(input).map_err(|e| EduforgeError::Import(e.to_string()))
    }

    pub fn from_yaml(input: &str) -> Result<Self> {
        serde_yaml::from_str(input).map_err(|e| EduforgeError::Import(e.to_string()))
    }

    /// Load a specification file; `.yaml`/`.yml` are read as YAML, anything
    /// else as JSON.
    pub fn import(path: &Path) -> Result<Self> {
        let input = fs::read_to_string(path).map_err(|e| {
            EduforgeError::Import(format!("cannot read {}: {}", path.display(), e))
        })?;
        if is_yaml(path) {
            Self::from_yaml(&input)
        } else {
            Self::from_json(&input)
        }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn export(&self, path: &Path) -> Result<()> {
        let output = if is_yaml(path) {
            serde_yaml::to_string(self)?
        } else {
            self.to_json_pretty()?
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, output)?;
        Ok(())
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}
