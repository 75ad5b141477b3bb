// src/prompt/mod.rs
//! Prompt compilation.
//!
//! Turns a [`ToolSpecification`] (compose mode) or the current artifact plus
//! a free-text instruction (revise mode) into the exact [`Request`] sent to
//! the generation backend. Compilation is deterministic: the same input and
//! locale always produce byte-identical requests.

mod locale;

pub use locale::{Locale, Texts};

use serde::Serialize;

use crate::entity::{InteractionRule, ToolSpecification};
use crate::error::{EduforgeError, Result};
use crate::gateway::ImageInput;

/// Default ceiling for instruction + artifact size in a single request.
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 400_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Compose,
    Revise,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Compose => write!(f, "compose"),
            Mode::Revise => write!(f, "revise"),
        }
    }
}

/// Structured payload of a compose request. Optional parts are omitted
/// entirely rather than sent empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComposePayload {
    pub title: String,
    pub audience: String,
    pub description: String,
    pub initial: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interactions: Option<Vec<InteractionRule>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<String>,
}

/// A compiled text-completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Request {
    pub mode: Mode,
    /// Sent as the system message.
    pub instruction: String,
    /// Sent as the user message.
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<ComposePayload>,
}

impl Request {
    pub fn size(&self) -> usize {
        self.instruction.len() + self.content.len()
    }
}

/// A compiled image-description request.
#[derive(Debug, Clone)]
pub struct VisionRequest {
    pub instruction: String,
    pub prompt: String,
    pub image: ImageInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Goal,
    Fields,
    Interactions,
    Extras,
    OutputContract,
}

/// Compose instruction layout, keyed by (has rules, has extras).
fn compose_layout(has_rules: bool, has_extras: bool) -> &'static [Block] {
    use Block::*;
    match (has_rules, has_extras) {
        (false, false) => &[Goal, Fields, OutputContract],
        (true, false) => &[Goal, Fields, Interactions, OutputContract],
        (false, true) => &[Goal, Fields, Extras, OutputContract],
        (true, true) => &[Goal, Fields, Interactions, Extras, OutputContract],
    }
}

fn render_block(block: Block, texts: &Texts) -> &'static str {
    match block {
        Block::Goal => texts.goal,
        Block::Fields => texts.fields,
        Block::Interactions => texts.interactions,
        Block::Extras => texts.extras,
        Block::OutputContract => texts.output_contract,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptCompiler {
    pub locale: Locale,
    pub max_request_bytes: usize,
}

impl Default for PromptCompiler {
    fn default() -> Self {
        Self {
            locale: Locale::default(),
            max_request_bytes: DEFAULT_MAX_REQUEST_BYTES,
        }
    }
}

impl PromptCompiler {
    pub fn new(locale: Locale, max_request_bytes: usize) -> Self {
        Self {
            locale,
            max_request_bytes,
        }
    }

    /// Build a from-scratch generation request.
    ///
    /// Fails with `Validation` if any required field is blank; nothing is
    /// compiled in that case.
    pub fn compose(&self, spec: &ToolSpecification) -> Result<Request> {
        spec.validate()?;

        let payload = compose_payload(spec);
        let layout = compose_layout(payload.interactions.is_some(), payload.extras.is_some());
        let texts = self.locale.texts();
        let instruction = layout
            .iter()
            .map(|b| render_block(*b, texts))
            .collect::<Vec<_>>()
            .join("\n\n");

        let content = format!(
            "<content>\n{}\n</content>",
            serde_json::to_string_pretty(&payload)?
        );

        Ok(Request {
            mode: Mode::Compose,
            instruction,
            content,
            payload: Some(payload),
        })
    }

    /// Build a request that patches `artifact` according to `instruction`.
    ///
    /// The tool specification is never resent; the artifact is the only
    /// record of what exists.
    pub fn revise(&self, artifact: &str, instruction: &str) -> Result<Request> {
        let instruction_text = instruction.trim();
        if instruction_text.is_empty() {
            return Err(EduforgeError::EmptyInstruction);
        }

        let texts = self.locale.texts();
        let request = Request {
            mode: Mode::Revise,
            instruction: format!("{}\n\n{}", texts.revise_goal, texts.revise_contract),
            content: format!(
                "<instruction>\n{}\n</instruction>\n\n<document>\n{}\n</document>",
                instruction_text, artifact
            ),
            payload: None,
        };

        if request.size() > self.max_request_bytes {
            return Err(EduforgeError::RequestTooLarge {
                size: request.size(),
                limit: self.max_request_bytes,
            });
        }

        Ok(request)
    }

    pub fn describe(&self, image: ImageInput) -> VisionRequest {
        let texts = self.locale.texts();
        VisionRequest {
            instruction: texts.vision_framing.to_string(),
            prompt: texts.vision_prompt.to_string(),
            image,
        }
    }
}

fn compose_payload(spec: &ToolSpecification) -> ComposePayload {
    let rules: Vec<InteractionRule> = spec
        .qualifying_rules()
        .map(|rule| InteractionRule {
            condition: rule.condition.trim().to_string(),
            first_response: rule.first_response.trim().to_string(),
            subsequent_responses: rule
                .subsequent_responses
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            position: rule.position.trim().to_string(),
            style: rule.style.trim().to_string(),
        })
        .collect();

    ComposePayload {
        title: spec.title.trim().to_string(),
        audience: spec.audience.trim().to_string(),
        description: spec.description.trim().to_string(),
        initial: spec.initial_state.trim().to_string(),
        interactions: if rules.is_empty() { None } else { Some(rules) },
        extras: spec.extras_text().map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn scenario_a() -> ToolSpecification {
        let mut spec = ToolSpecification::new(
            "Bouncing Ball",
            "grade 5",
            "gravity demo",
            "a red ball at top of canvas",
        );
        spec.set_extras("");
        spec
    }

    fn scenario_b() -> ToolSpecification {
        let mut spec = scenario_a();
        spec.interaction_rules.push(InteractionRule {
            condition: "ball touches floor".to_string(),
            first_response: "ball bounces".to_string(),
            subsequent_responses: vec!["ball bounces lower".to_string()],
            position: "x:100,y:0".to_string(),
            style: "red circle".to_string(),
        });
        spec
    }

    fn payload_json(request: &Request) -> Value {
        serde_json::to_value(request.payload.as_ref().unwrap()).unwrap()
    }

    #[test]
    fn test_scenario_a_has_only_base_fields() {
        let request = PromptCompiler::default().compose(&scenario_a()).unwrap();
        let json = payload_json(&request);
        let mut keys: Vec<&str> = json.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        keys.sort();
        assert_eq!(keys, vec!["audience", "description", "initial", "title"]);
        assert!(!request.content.contains("interactions"));
        assert!(!request.content.contains("extras"));
    }

    #[test]
    fn test_scenario_b_includes_single_rule() {
        let request = PromptCompiler::default().compose(&scenario_b()).unwrap();
        let json = payload_json(&request);
        let rules = json["interactions"].as_array().unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0]["if"], "ball touches floor");
        assert_eq!(rules[0]["then_first"], "ball bounces");
        assert_eq!(rules[0]["then_next"], serde_json::json!(["ball bounces lower"]));
        assert!(json.get("extras").is_none());
    }

    #[test]
    fn test_rule_blocks_only_when_a_rule_qualifies() {
        let compiler = PromptCompiler::default();
        let texts = Locale::English.texts();

        let mut spec = scenario_a();
        spec.interaction_rules.push(InteractionRule::new("", "ignored"));
        let request = compiler.compose(&spec).unwrap();
        assert!(!request.instruction.contains(texts.interactions));
        assert!(request.payload.unwrap().interactions.is_none());

        let request = compiler.compose(&scenario_b()).unwrap();
        assert!(request.instruction.contains(texts.interactions));
    }

    #[test]
    fn test_blank_rules_dropped_order_kept() {
        let mut spec = scenario_a();
        spec.interaction_rules = vec![
            InteractionRule::new("first", "a"),
            InteractionRule::new(" ", "b"),
            InteractionRule::new("third", "c"),
        ];
        let request = PromptCompiler::default().compose(&spec).unwrap();
        let rules = request.payload.unwrap().interactions.unwrap();
        let conditions: Vec<&str> = rules.iter().map(|r| r.condition.as_str()).collect();
        assert_eq!(conditions, vec!["first", "third"]);
    }

    #[test]
    fn test_blank_follow_ups_are_skipped() {
        let mut spec = scenario_b();
        spec.interaction_rules[0].subsequent_responses =
            vec!["second".into(), "  ".into(), "fourth".into()];
        let request = PromptCompiler::default().compose(&spec).unwrap();
        let rules = request.payload.unwrap().interactions.unwrap();
        assert_eq!(rules[0].subsequent_responses, vec!["second", "fourth"]);
    }

    #[test]
    fn test_extras_block_follows_rules_block() {
        let mut spec = scenario_b();
        spec.set_extras("confetti");
        let request = PromptCompiler::default().compose(&spec).unwrap();
        let texts = Locale::English.texts();

        let rules_at = request.instruction.find(texts.interactions).unwrap();
        let extras_at = request.instruction.find(texts.extras).unwrap();
        let contract_at = request.instruction.find(texts.output_contract).unwrap();
        assert!(rules_at < extras_at && extras_at < contract_at);
        assert!(request.instruction.starts_with(texts.goal));
        assert_eq!(request.payload.unwrap().extras.as_deref(), Some("confetti"));
    }

    #[test]
    fn test_locales_share_structure() {
        let mut spec = scenario_b();
        spec.set_extras("sound");
        for (has_rules, has_extras) in [(false, false), (true, false), (false, true), (true, true)] {
            let layout = compose_layout(has_rules, has_extras);
            assert_eq!(layout.first(), Some(&Block::Goal));
            assert_eq!(layout.last(), Some(&Block::OutputContract));
            assert_eq!(layout.contains(&Block::Interactions), has_rules);
            assert_eq!(layout.contains(&Block::Extras), has_extras);
        }

        let en = PromptCompiler::new(Locale::English, DEFAULT_MAX_REQUEST_BYTES)
            .compose(&spec)
            .unwrap();
        let sr = PromptCompiler::new(Locale::Serbian, DEFAULT_MAX_REQUEST_BYTES)
            .compose(&spec)
            .unwrap();
        assert_eq!(en.payload, sr.payload);
        assert_eq!(en.content, sr.content);
        assert_ne!(en.instruction, sr.instruction);
        for tag in ["<goal>", "<instruction>", "<interactions>", "<extras>", "<output>"] {
            assert_eq!(en.instruction.matches(tag).count(), sr.instruction.matches(tag).count());
        }
    }

    #[test]
    fn test_compose_rejects_blank_required_field() {
        let mut spec = scenario_a();
        spec.audience = " ".to_string();
        let err = PromptCompiler::default().compose(&spec).unwrap_err();
        assert!(matches!(err, EduforgeError::Validation { .. }));
    }

    #[test]
    fn test_compose_is_deterministic() {
        let compiler = PromptCompiler::default();
        assert_eq!(
            compiler.compose(&scenario_b()).unwrap(),
            compiler.compose(&scenario_b()).unwrap()
        );
    }

    #[test]
    fn test_revise_carries_instruction_and_artifact() {
        let artifact = "<html><body><h1>Ball</h1></body></html>";
        let request = PromptCompiler::default()
            .revise(artifact, "  make the ball blue ")
            .unwrap();
        assert_eq!(request.mode, Mode::Revise);
        assert!(request.payload.is_none());
        assert!(request.content.contains("make the ball blue"));
        assert!(request.content.contains(artifact));
        assert!(request.instruction.ends_with(Locale::English.texts().revise_contract));
    }

    #[test]
    fn test_revise_rejects_blank_instruction() {
        let err = PromptCompiler::default().revise("<html></html>", "   ").unwrap_err();
        assert!(matches!(err, EduforgeError::EmptyInstruction));
    }

    #[test]
    fn test_revise_enforces_size_ceiling() {
        let compiler = PromptCompiler::new(Locale::English, 1_000);
        let artifact = "x".repeat(2_000);
        match compiler.revise(&artifact, "shrink it") {
            Err(EduforgeError::RequestTooLarge { size, limit }) => {
                assert!(size > 2_000);
                assert_eq!(limit, 1_000);
            }
            other => panic!("Expected RequestTooLarge, got {:?}", other),
        }
    }
}
