use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One answer from the reasoning collaborator, tagged with the originating
/// field identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldAnswer {
    pub id: String,
    pub value: AnswerValue,
}

/// Answer payloads: a plain string, a boolean for checkboxes, or a list of
/// selections for multi-valued fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Flag(bool),
    Text(String),
    Many(Vec<String>),
}

impl AnswerValue {
    pub fn is_empty(&self) -> bool {
        match self {
            AnswerValue::Flag(_) => false,
            AnswerValue::Text(s) => {
                let t = s.trim();
                t.is_empty() || t.eq_ignore_ascii_case("null") || t.eq_ignore_ascii_case("undefined")
            }
            AnswerValue::Many(items) => items.iter().all(|s| s.trim().is_empty()),
        }
    }
}

/// The full answer set for one scan, indexed by field identifier.
#[derive(Debug, Clone, Default)]
pub struct AnswerSet {
    by_id: HashMap<String, AnswerValue>,
}

impl AnswerSet {
    pub fn new(answers: Vec<FieldAnswer>) -> Self {
        let mut by_id = HashMap::new();
        for answer in answers {
            by_id.insert(answer.id, answer.value);
        }
        Self { by_id }
    }

    /// Parse a `{"field-id": value, ...}` JSON object, the shape the CLI
    /// accepts in an answers file.
    pub fn from_json_map(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        let by_id: HashMap<String, AnswerValue> = serde_json::from_value(value)?;
        Ok(Self { by_id })
    }

    pub fn get(&self, id: &str) -> Option<&AnswerValue> {
        self.by_id.get(id)
    }

    pub fn insert(&mut self, id: &str, value: AnswerValue) {
        self.by_id.insert(id.to_string(), value);
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
