use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Live values
// ============================================================================

/// The current value of a form control as read from the live document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn empty_text() -> Self {
        FieldValue::Text(String::new())
    }

    /// "Empty" in the sense the empty-field filter uses: unchecked flags,
    /// blank text, and empty selection lists all count as empty.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Flag(checked) => !checked,
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::List(items) => items.iter().all(|s| s.trim().is_empty()),
        }
    }

}

// ============================================================================
// Snapshot tree
// ============================================================================

/// Nested node as emitted by the page host's extractor (one JSON tree).
#[derive(Debug, Clone, Deserialize)]
pub struct RawNode {
    pub tag: String,
    #[serde(default)]
    pub attrs: HashMap<String, String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub checked: Option<bool>,
    #[serde(default)]
    pub selected: Option<bool>,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub children: Vec<RawNode>,
}

fn default_visible() -> bool {
    true
}

/// One element in the flattened snapshot arena.
#[derive(Debug, Clone)]
pub struct DomNode {
    pub index: usize,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub tag: String,
    pub attrs: HashMap<String, String>,
    pub text: Option<String>,
    pub value: Option<String>,
    pub checked: Option<bool>,
    pub selected: Option<bool>,
    pub visible: bool,
}

impl DomNode {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(|s| s.as_str())
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id").filter(|s| !s.is_empty())
    }

    pub fn name(&self) -> Option<&str> {
        self.attr("name").filter(|s| !s.is_empty())
    }

    pub fn role(&self) -> Option<&str> {
        self.attr("role").filter(|s| !s.is_empty())
    }

    /// The `type` attribute, lowercased. Only meaningful for inputs.
    pub fn input_type(&self) -> Option<String> {
        self.attr("type").map(|t| t.to_lowercase())
    }

    pub fn class_attr(&self) -> &str {
        self.attr("class").unwrap_or("")
    }

    pub fn class_contains(&self, needle: &str) -> bool {
        self.class_attr().to_lowercase().contains(needle)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    pub fn is_disabled(&self) -> bool {
        match self.attr("disabled") {
            Some(v) => v != "false",
            None => self.attr("aria-disabled") == Some("true"),
        }
    }

    pub fn is_required(&self) -> bool {
        match self.attr("required") {
            Some(v) => v != "false",
            None => self.attr("aria-required") == Some("true"),
        }
    }

    pub fn tabindex(&self) -> Option<i32> {
        self.attr("tabindex").and_then(|t| t.trim().parse().ok())
    }

    pub fn own_text(&self) -> &str {
        self.text.as_deref().unwrap_or("").trim()
    }
}

/// Flattened, document-ordered DOM snapshot.
///
/// Node indices are preorder ordinals; the extractor stamps the same ordinal
/// onto each live element as `data-ff-node`, so any snapshot node can be
/// re-addressed on the live page until the next snapshot is taken.
#[derive(Debug, Clone)]
pub struct DomSnapshot {
    pub nodes: Vec<DomNode>,
}

impl DomSnapshot {
    pub fn from_raw(root: RawNode) -> Self {
        let mut nodes = Vec::new();
        flatten(root, None, &mut nodes);
        DomSnapshot { nodes }
    }

    pub fn from_json(value: serde_json::Value) -> Result<Self, crate::error::EngineError> {
        let root: RawNode =
            serde_json::from_value(value).map_err(|e| crate::error::EngineError::JsonParse {
                context: "DOM snapshot".into(),
                source: e,
            })?;
        Ok(Self::from_raw(root))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, index: usize) -> &DomNode {
        &self.nodes[index]
    }
}

fn flatten(raw: RawNode, parent: Option<usize>, nodes: &mut Vec<DomNode>) {
    let index = nodes.len();
    let mut attrs = raw.attrs;
    // Stamp the preorder ordinal so locators line up with the live page.
    attrs.insert("data-ff-node".to_string(), index.to_string());
    nodes.push(DomNode {
        index,
        parent,
        children: Vec::new(),
        tag: raw.tag.to_lowercase(),
        attrs,
        text: raw.text,
        value: raw.value,
        checked: raw.checked,
        selected: raw.selected,
        visible: raw.visible,
    });
    for child in raw.children {
        let child_index = nodes.len();
        flatten(child, Some(index), nodes);
        nodes[index].children.push(child_index);
    }
}

// ============================================================================
// Selector builders
// ============================================================================

/// Escape a value for use inside an `[attr="..."]` selector.
pub fn escape_attr_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Locator for an element by its DOM id: `[id="..."]`.
pub fn id_selector(id: &str) -> String {
    format!("[id=\"{}\"]", escape_attr_value(id))
}

/// Transient locator for a snapshot node, valid until the next snapshot.
pub fn node_selector(index: usize) -> String {
    format!("[data-ff-node=\"{}\"]", index)
}
