use serde::{Deserialize, Serialize};

use crate::dom::dom_model::FieldValue;

// ============================================================================
// Field classification
// ============================================================================

/// Closed classification of everything the engine treats as fillable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldType {
    Text,
    Email,
    Tel,
    Url,
    Password,
    Number,
    Date,
    Datetime,
    Time,
    Month,
    Week,
    Textarea,
    Select,
    MultiSelect,
    Checkbox,
    Radio,
    RadioGroup,
    CheckboxGroup,
    File,
    Range,
    Color,
    Search,
    CustomDropdown,
}

impl FieldType {
    /// Total specificity order for the merge rule: a later discovery pass
    /// only replaces an earlier descriptor when its type ranks strictly
    /// higher. Custom dropdowns dominate everything; synthesized groups
    /// dominate native types; bare `text` is the weakest classification.
    pub fn specificity(self) -> u8 {
        match self {
            FieldType::CustomDropdown => 90,
            FieldType::RadioGroup | FieldType::CheckboxGroup => 80,
            FieldType::MultiSelect => 65,
            FieldType::Select => 60,
            FieldType::Email
            | FieldType::Tel
            | FieldType::Url
            | FieldType::Password
            | FieldType::Number
            | FieldType::Date
            | FieldType::Datetime
            | FieldType::Time
            | FieldType::Month
            | FieldType::Week
            | FieldType::File
            | FieldType::Range
            | FieldType::Color
            | FieldType::Checkbox
            | FieldType::Radio => 50,
            FieldType::Textarea => 45,
            FieldType::Search => 40,
            FieldType::Text => 10,
        }
    }

    /// Selection-capable types preserve emptiness on fill: an empty answer
    /// means "no selection", never a sentinel value.
    pub fn is_selection(self) -> bool {
        matches!(
            self,
            FieldType::Select
                | FieldType::MultiSelect
                | FieldType::Checkbox
                | FieldType::Radio
                | FieldType::RadioGroup
                | FieldType::CheckboxGroup
                | FieldType::CustomDropdown
        )
    }

    pub fn is_group(self) -> bool {
        matches!(self, FieldType::RadioGroup | FieldType::CheckboxGroup)
    }
}

// ============================================================================
// Descriptor
// ============================================================================

/// One selectable option of a selection-capable field. For synthesized
/// groups, one option per member control, in document order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// Normalized record describing one logical fillable unit: a single
/// control or a synthesized radio/checkbox group. Recomputed on every scan;
/// nothing here outlives one scan-fill cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    /// Stable per-scan identifier; written back onto id-less elements so an
    /// unmutated re-scan reproduces it.
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Locator sufficient to re-find the element(s) on the live document.
    pub selector: String,
    pub required: bool,
    pub disabled: bool,
    /// Raw value at scan time; used later to decide emptiness.
    pub value: FieldValue,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub surrounding_text: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format_hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    #[serde(default)]
    pub is_group: bool,
}

impl FieldDescriptor {
    /// Push an option, keeping document order and dropping (value, label)
    /// duplicates.
    pub fn push_option(&mut self, option: FieldOption) {
        let duplicate = self
            .options
            .iter()
            .any(|o| o.value == option.value && o.label == option.label);
        if !duplicate {
            self.options.push(option);
        }
    }
}

/// Digest over the scan result's (id, type, label) triples, in order.
/// Two scans of an unmutated document produce the same fingerprint.
pub fn scan_fingerprint(fields: &[FieldDescriptor]) -> String {
    use sha1::{Digest, Sha1};

    let mut hasher = Sha1::new();
    for field in fields {
        hasher.update(field.id.as_bytes());
        hasher.update(b"\x1f");
        hasher.update(format!("{:?}", field.field_type).as_bytes());
        hasher.update(b"\x1f");
        hasher.update(field.label.as_bytes());
        hasher.update(b"\x1e");
    }
    format!("{:x}", hasher.finalize())
}
