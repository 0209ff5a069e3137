use crate::detect::field_model::FieldType;
use crate::dom::dom_model::{DomNode, DomSnapshot};

/// Sentinel for controls nothing could label.
pub const UNLABELED: &str = "Unlabeled Field";

/// Cap on aggregated description text.
pub const DESCRIPTION_CAP: usize = 300;

/// How far up the tree the widget-container label search goes. Heuristic:
/// in pathological markup a sibling label can belong to an unrelated
/// control, but in practice four levels covers the common wrapper nesting.
const ANCESTOR_LABEL_DEPTH: usize = 4;

const LABEL_TEXT_CAP: usize = 120;
const SIBLING_TEXT_CAP: usize = 80;
const SURROUNDING_TEXT_CAP: usize = 200;

// ============================================================================
// Label resolution
// ============================================================================

/// Best-effort human-readable caption for a control, by fixed precedence:
/// `label[for]` -> aria-labelledby -> aria-label -> placeholder -> wrapping
/// label -> ancestor-container label -> preceding sibling text -> humanized
/// name -> the `"Unlabeled Field"` sentinel.
pub fn resolve_label(snapshot: &DomSnapshot, index: usize) -> String {
    let node = snapshot.node(index);

    if let Some(dom_id) = node.id() {
        if let Some(label_idx) = snapshot.label_for_control(dom_id) {
            let text = snapshot.subtree_text(label_idx, LABEL_TEXT_CAP);
            if !text.is_empty() {
                return text;
            }
        }
    }

    if let Some(ids) = node.attr("aria-labelledby") {
        let mut parts = Vec::new();
        for ref_id in ids.split_whitespace() {
            if let Some(ref_idx) = snapshot.find_by_dom_id(ref_id) {
                let text = snapshot.subtree_text(ref_idx, LABEL_TEXT_CAP);
                if !text.is_empty() {
                    parts.push(text);
                }
            }
        }
        if !parts.is_empty() {
            return parts.join(" ");
        }
    }

    if let Some(aria) = node.attr("aria-label") {
        let trimmed = aria.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    if let Some(placeholder) = node.attr("placeholder") {
        let trimmed = placeholder.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    if let Some(wrapper) = snapshot.closest(index, |n| n.tag == "label") {
        let text = snapshot.subtree_text(wrapper, LABEL_TEXT_CAP);
        if !text.is_empty() {
            return text;
        }
    }

    if let Some(text) = ancestor_container_label(snapshot, index) {
        return text;
    }

    if let Some(text) = preceding_sibling_text(snapshot, index) {
        return text;
    }

    if let Some(name) = node.name() {
        let humanized = humanize_name(name);
        if !humanized.is_empty() {
            return humanized;
        }
    }

    UNLABELED.to_string()
}

/// Walk up to a fixed depth; at each level look for a label-ish element
/// among the current node's preceding siblings or the ancestor's label-class
/// children that sit before the control.
fn ancestor_container_label(snapshot: &DomSnapshot, index: usize) -> Option<String> {
    let mut current = index;
    for _ in 0..ANCESTOR_LABEL_DEPTH {
        for sibling in snapshot.preceding_siblings(current) {
            if let Some(text) = label_ish_text(snapshot, sibling) {
                return Some(text);
            }
        }
        let parent = snapshot.node(current).parent?;
        for &child in &snapshot.node(parent).children {
            if child == current {
                break;
            }
            if is_label_ish(snapshot.node(child)) {
                if let Some(text) = label_ish_text(snapshot, child) {
                    return Some(text);
                }
            }
        }
        current = parent;
    }
    None
}

fn is_label_ish(node: &DomNode) -> bool {
    node.tag == "label" || node.tag == "legend" || node.class_contains("label")
}

fn label_ish_text(snapshot: &DomSnapshot, index: usize) -> Option<String> {
    let node = snapshot.node(index);
    if !is_label_ish(node) {
        return None;
    }
    let text = snapshot.subtree_text(index, LABEL_TEXT_CAP);
    if text.is_empty() { None } else { Some(text) }
}

fn preceding_sibling_text(snapshot: &DomSnapshot, index: usize) -> Option<String> {
    for sibling in snapshot.preceding_siblings(index) {
        let node = snapshot.node(sibling);
        // Text from another control would mislabel this one.
        if matches!(node.tag.as_str(), "input" | "select" | "textarea" | "button") {
            continue;
        }
        let text = snapshot.subtree_text(sibling, SIBLING_TEXT_CAP);
        if !text.is_empty() {
            return Some(text);
        }
    }
    None
}

/// `work_auth[0]` -> "Work Auth", `firstName` -> "First Name".
pub fn humanize_name(name: &str) -> String {
    let base = name.split('[').next().unwrap_or(name);
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    for c in base.chars() {
        if c == '_' || c == '-' || c == '.' {
            if !current.is_empty() {
                words.push(current.clone());
                current.clear();
            }
        } else if c.is_uppercase() && !current.is_empty() {
            words.push(current.clone());
            current.clear();
            current.push(c);
        } else {
            current.push(c);
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
        .iter()
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// Description aggregation
// ============================================================================

/// Long-form context for a control: aria-describedby text, sibling
/// description-class text, the enclosing fieldset's legend, and description
/// text inside that fieldset. Deduplicated, capped at `DESCRIPTION_CAP`.
pub fn resolve_description(snapshot: &DomSnapshot, index: usize) -> String {
    let node = snapshot.node(index);
    let mut parts: Vec<String> = Vec::new();

    let mut push_unique = |parts: &mut Vec<String>, text: String| {
        if !text.is_empty() && !parts.iter().any(|p| p == &text) {
            parts.push(text);
        }
    };

    if let Some(ids) = node.attr("aria-describedby") {
        for ref_id in ids.split_whitespace() {
            if let Some(ref_idx) = snapshot.find_by_dom_id(ref_id) {
                push_unique(&mut parts, snapshot.subtree_text(ref_idx, DESCRIPTION_CAP));
            }
        }
    }

    for sibling in snapshot
        .preceding_siblings(index)
        .into_iter()
        .chain(snapshot.following_siblings(index))
    {
        if is_description_ish(snapshot.node(sibling)) {
            push_unique(&mut parts, snapshot.subtree_text(sibling, DESCRIPTION_CAP));
        }
    }

    if let Some(fieldset) = snapshot.enclosing_fieldset(index) {
        for &child in &snapshot.node(fieldset).children {
            if snapshot.node(child).tag == "legend" {
                push_unique(&mut parts, snapshot.subtree_text(child, DESCRIPTION_CAP));
            }
        }
        for desc in snapshot.descendants(fieldset) {
            if is_description_ish(snapshot.node(desc)) {
                push_unique(&mut parts, snapshot.subtree_text(desc, DESCRIPTION_CAP));
            }
        }
    }

    let mut joined = parts.join(" ");
    if joined.len() > DESCRIPTION_CAP {
        let mut cut = DESCRIPTION_CAP;
        while cut > 0 && !joined.is_char_boundary(cut) {
            cut -= 1;
        }
        joined.truncate(cut);
    }
    joined
}

fn is_description_ish(node: &DomNode) -> bool {
    node.class_contains("description") || node.class_contains("help") || node.class_contains("hint")
}

/// Nearby context text: the parent container's text, bounded.
pub fn surrounding_text(snapshot: &DomSnapshot, index: usize) -> String {
    match snapshot.node(index).parent {
        Some(parent) => snapshot.subtree_text(parent, SURROUNDING_TEXT_CAP),
        None => String::new(),
    }
}

// ============================================================================
// Format hints
// ============================================================================

/// Expected textual pattern for temporal types.
pub fn resolve_format_hint(field_type: FieldType) -> Option<String> {
    let hint = match field_type {
        FieldType::Date => "YYYY-MM-DD",
        FieldType::Datetime => "YYYY-MM-DDTHH:MM",
        FieldType::Time => "HH:MM (24-hour)",
        FieldType::Month => "YYYY-MM",
        FieldType::Week => "YYYY-Www",
        _ => return None,
    };
    Some(hint.to_string())
}
