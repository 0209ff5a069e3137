use crate::detect::field_model::FieldOption;
use crate::dom::dom_model::{DomNode, DomSnapshot};
use crate::error::EngineError;
use crate::page::driver::PageDriver;
use crate::page::wait::Timing;
use crate::widget::expand::{expand_widget, ExpansionOutcome};

const SNIPPET_CAP: usize = 400;
const OPTION_LABEL_CAP: usize = 80;

/// What option extraction learned beyond the options themselves. When a
/// widget yields zero options even after expansion, the structural context
/// here is attached to the descriptor's description so the field is still
/// answerable instead of silently dropped.
#[derive(Debug, Clone, Default)]
pub struct OptionContext {
    pub expansion: Option<ExpansionOutcome>,
    pub hidden_option_count: usize,
    pub container_snippet: Option<String>,
    pub parent_snippet: Option<String>,
}

impl OptionContext {
    /// Render the structural context as description text.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if self.hidden_option_count > 0 {
            parts.push(format!(
                "{} option-like elements present but not visible",
                self.hidden_option_count
            ));
        }
        if let Some(snippet) = &self.container_snippet {
            parts.push(format!("widget markup: {}", snippet));
        }
        if let Some(snippet) = &self.parent_snippet {
            parts.push(format!("parent markup: {}", snippet));
        }
        parts.join(" | ")
    }
}

/// Extract a custom widget's selectable options.
///
/// Extraction is tried without expansion first; some widgets pre-render
/// their whole option list off-screen. Only if nothing visible turns up is
/// the expansion protocol invoked, after which both the widget's own subtree
/// and the whole document are searched (portal-rendered menus live outside
/// the trigger). Non-visible nodes and placeholder entries are filtered;
/// duplicates collapse by (value, label).
pub fn extract_options(
    driver: &mut dyn PageDriver,
    snapshot: &DomSnapshot,
    container: usize,
    container_selector: &str,
    focus_selector: &str,
    timing: &Timing,
) -> Result<(Vec<FieldOption>, OptionContext), EngineError> {
    let mut context = OptionContext::default();

    // First attempt: pre-rendered options, no interaction.
    let mut options = collect_options(snapshot, Some(container), true);
    if !options.is_empty() {
        return Ok((options, context));
    }

    // Expand, then look again on a fresh snapshot, in subtree and document
    // scope both, since menus are often portal-rendered.
    let outcome = expand_widget(driver, focus_selector, timing)?;
    context.expansion = Some(outcome);

    let expanded = driver.snapshot()?;
    let container_after = find_container(&expanded, snapshot, container);

    options = collect_options(&expanded, container_after, true);
    if options.is_empty() {
        options = collect_options(&expanded, None, true);
    }
    if !options.is_empty() {
        return Ok((options, context));
    }

    // Zero options even after expansion: gather structural context so the
    // descriptor can still be emitted with something to reason about.
    context.hidden_option_count = collect_options(&expanded, container_after, false).len();
    context.container_snippet = driver.outer_html(container_selector, SNIPPET_CAP)?;
    if let Some(idx) = container_after {
        if let Some(parent) = expanded.node(idx).parent {
            context.parent_snippet =
                driver.outer_html(&crate::dom::dom_model::node_selector(parent), SNIPPET_CAP)?;
        }
    }
    Ok((options, context))
}

/// Re-find the widget container on a fresh snapshot, by DOM id when it has
/// one, falling back to tag + position match.
fn find_container(
    fresh: &DomSnapshot,
    old: &DomSnapshot,
    container: usize,
) -> Option<usize> {
    let old_node = old.node(container);
    if let Some(id) = old_node.id() {
        if let Some(idx) = fresh.find_by_dom_id(id) {
            return Some(idx);
        }
    }
    fresh
        .find_all(|n| n.tag == old_node.tag && n.attr("class") == old_node.attr("class"))
        .into_iter()
        .next()
}

/// Option-shaped nodes, in document order. With `visible_only`, hidden and
/// placeholder entries are filtered out.
fn collect_options(
    snapshot: &DomSnapshot,
    scope: Option<usize>,
    visible_only: bool,
) -> Vec<FieldOption> {
    let candidates: Vec<usize> = match scope {
        Some(root) => snapshot
            .descendants(root)
            .into_iter()
            .filter(|&idx| is_option_shaped(snapshot.node(idx)))
            .collect(),
        None => snapshot.find_all(is_option_shaped),
    };

    let mut out: Vec<FieldOption> = Vec::new();
    for idx in candidates {
        let node = snapshot.node(idx);
        // Options owned by a native select (or datalist) belong to that
        // control; the document-scope fallback must not harvest them into a
        // custom widget's descriptor.
        if snapshot
            .closest(idx, |n| n.tag == "select" || n.tag == "datalist")
            .is_some()
        {
            continue;
        }
        if visible_only && !node.visible {
            continue;
        }
        let label = snapshot.subtree_text(idx, OPTION_LABEL_CAP);
        let raw = node
            .attr("value")
            .or_else(|| node.attr("data-value"))
            .unwrap_or("");
        if visible_only && is_placeholder(raw, &label) {
            continue;
        }
        let value = if raw.is_empty() { label.clone() } else { raw.to_string() };
        let selected = node.selected == Some(true)
            || node.attr("aria-selected") == Some("true");
        let option = FieldOption { value, label, selected };
        if !out.iter().any(|o| o.value == option.value && o.label == option.label) {
            out.push(option);
        }
    }
    out
}

fn is_option_shaped(node: &DomNode) -> bool {
    node.tag == "option" || node.role() == Some("option") || node.class_contains("option")
}

/// Sentinel entries like an empty "Choose…" prompt are not real options.
pub fn is_placeholder(value: &str, label: &str) -> bool {
    let label_lower = label.trim().to_lowercase();
    if label_lower.is_empty() && value.trim().is_empty() {
        return true;
    }
    if value.trim().is_empty()
        && (label_lower.starts_with("select")
            || label_lower.starts_with("choose")
            || label_lower.starts_with("please")
            || label_lower.starts_with("--"))
    {
        return true;
    }
    matches!(label_lower.as_str(), "select..." | "choose..." | "select…" | "choose…")
}
