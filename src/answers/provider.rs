use serde::{Deserialize, Serialize};

use crate::answers::answer_model::{AnswerSet, AnswerValue, FieldAnswer};
use crate::detect::field_model::{FieldDescriptor, FieldType};
use crate::trace::logger::warn;

/// Produces answers for a scanned field set. The live implementation asks a
/// local model; tests and offline runs use the heuristic provider.
pub trait AnswerProvider {
    fn answer(
        &self,
        fields: &[FieldDescriptor],
        profile: &serde_json::Value,
        job_text: Option<&str>,
    ) -> AnswerSet;
}

// ============================================================================
// Heuristic provider
// ============================================================================

/// Answers from the field's own label and type, with profile lookups by
/// loose key match. No network, fully deterministic.
pub struct HeuristicAnswerProvider;

/// Derive a plausible value from a field's label and type when the profile
/// has nothing better.
pub fn guess_value(label: &str, field_type: &FieldType) -> String {
    let l = label.to_lowercase();

    // Label-based heuristics (checked in order)
    if l.contains("email") {
        return "user@example.com".into();
    }
    if l.contains("phone") || l.contains("tel") {
        return "555-0100".into();
    }
    if l.contains("url") || l.contains("website") || l.contains("linkedin") {
        return "https://example.com".into();
    }
    if l.contains("zip") || l.contains("postal") {
        return "90210".into();
    }
    if l.contains("city") {
        return "Springfield".into();
    }
    if l.contains("name") {
        return "Jane Doe".into();
    }
    if l.contains("salary") || l.contains("compensation") {
        return "n/a".into();
    }

    match field_type {
        FieldType::Email => "user@example.com".into(),
        FieldType::Tel => "555-0100".into(),
        FieldType::Url => "https://example.com".into(),
        FieldType::Number | FieldType::Range => "1".into(),
        FieldType::Date => "2026-01-15".into(),
        FieldType::Datetime => "2026-01-15T09:00".into(),
        FieldType::Time => "09:00".into(),
        FieldType::Month => "2026-01".into(),
        FieldType::Week => "2026-W03".into(),
        FieldType::Color => "#000000".into(),
        _ => "n/a".into(),
    }
}

/// Loose profile lookup: a profile key matches a label when either contains
/// the other, case-insensitively and ignoring non-alphanumerics.
fn profile_lookup(profile: &serde_json::Value, label: &str) -> Option<AnswerValue> {
    let object = profile.as_object()?;
    let needle = fold_key(label);
    if needle.is_empty() {
        return None;
    }
    for (key, value) in object {
        let folded = fold_key(key);
        if folded.is_empty() {
            continue;
        }
        if needle.contains(&folded) || folded.contains(&needle) {
            return json_to_answer(value);
        }
    }
    None
}

fn fold_key(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

fn json_to_answer(value: &serde_json::Value) -> Option<AnswerValue> {
    match value {
        serde_json::Value::Bool(b) => Some(AnswerValue::Flag(*b)),
        serde_json::Value::String(s) => Some(AnswerValue::Text(s.clone())),
        serde_json::Value::Number(n) => Some(AnswerValue::Text(n.to_string())),
        serde_json::Value::Array(items) => Some(AnswerValue::Many(
            items
                .iter()
                .filter_map(|v| match v {
                    serde_json::Value::String(s) => Some(s.clone()),
                    serde_json::Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
        )),
        _ => None,
    }
}

impl AnswerProvider for HeuristicAnswerProvider {
    fn answer(
        &self,
        fields: &[FieldDescriptor],
        profile: &serde_json::Value,
        _job_text: Option<&str>,
    ) -> AnswerSet {
        let mut set = AnswerSet::default();
        for field in fields {
            if field.disabled {
                continue;
            }
            let answer = profile_lookup(profile, &field.label).unwrap_or_else(|| {
                if field.field_type.is_selection() {
                    // No profile match for a selection: pick the first real
                    // option rather than inventing a value.
                    match field.options.first() {
                        Some(option) => AnswerValue::Text(option.value.clone()),
                        None => AnswerValue::Text(String::new()),
                    }
                } else if matches!(field.field_type, FieldType::Checkbox) {
                    AnswerValue::Flag(field.required)
                } else {
                    AnswerValue::Text(guess_value(&field.label, &field.field_type))
                }
            });
            set.insert(&field.id, answer);
        }
        set
    }
}

// ============================================================================
// Ollama provider
// ============================================================================

pub struct LlmAnswerProvider {
    pub endpoint: String,
    pub model: String,
}

impl Default for LlmAnswerProvider {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434/api/generate".to_string(),
            model: "qwen2.5:1.5b".to_string(),
        }
    }
}

#[derive(Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
    format: &'static str,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
}

impl LlmAnswerProvider {
    pub fn new(endpoint: &str, model: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            model: model.to_string(),
        }
    }

    fn build_prompt(
        &self,
        fields: &[FieldDescriptor],
        profile: &serde_json::Value,
        job_text: Option<&str>,
    ) -> String {
        let fields_summary = fields
            .iter()
            .map(|f| {
                let options: Vec<_> = f.options.iter().map(|o| o.label.as_str()).collect();
                let mut line = format!("  - {} ({:?}): \"{}\"", f.id, f.field_type, f.label);
                if !options.is_empty() {
                    line.push_str(&format!(" options=[{}]", options.join(", ")));
                }
                if let Some(hint) = &f.format_hint {
                    line.push_str(&format!(" format={}", hint));
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"You are filling out a form on someone's behalf. Produce a value for every field.

APPLICANT PROFILE (JSON):
{}

JOB POSTING:
{}

FIELDS:
{}

Respond with ONLY a JSON object mapping each field id to its answer.
Strings for text fields, booleans for checkboxes, arrays of strings for
multi-select fields. Use "n/a" when the profile has no relevant data."#,
            profile,
            job_text.unwrap_or("(none)"),
            fields_summary
        )
    }

    fn parse_response(&self, response: &str) -> Option<AnswerSet> {
        let value: serde_json::Value = serde_json::from_str(response).ok()?;
        AnswerSet::from_json_map(value).ok()
    }
}

impl AnswerProvider for LlmAnswerProvider {
    fn answer(
        &self,
        fields: &[FieldDescriptor],
        profile: &serde_json::Value,
        job_text: Option<&str>,
    ) -> AnswerSet {
        let prompt = self.build_prompt(fields, profile, job_text);

        let request = OllamaRequest {
            model: self.model.clone(),
            prompt,
            stream: false,
            format: "json",
        };

        let client = reqwest::blocking::Client::new();
        let answers = client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .ok()
            .and_then(|r| r.json::<OllamaResponse>().ok())
            .and_then(|r| self.parse_response(&r.response));

        match answers {
            Some(set) => set,
            None => {
                warn("model backend unavailable, falling back to heuristics");
                HeuristicAnswerProvider.answer(fields, profile, job_text)
            }
        }
    }
}

// ============================================================================
// Scripted provider (for testing without a model)
// ============================================================================

pub struct ScriptedAnswerProvider {
    pub answers: Vec<FieldAnswer>,
}

impl AnswerProvider for ScriptedAnswerProvider {
    fn answer(
        &self,
        _fields: &[FieldDescriptor],
        _profile: &serde_json::Value,
        _job_text: Option<&str>,
    ) -> AnswerSet {
        AnswerSet::new(self.answers.clone())
    }
}
