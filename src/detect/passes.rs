use crate::detect::classify::classify_node;
use crate::detect::context::ScanContext;
use crate::detect::field_model::{FieldDescriptor, FieldOption, FieldType};
use crate::detect::label::{
    resolve_description, resolve_format_hint, resolve_label, surrounding_text,
};
use crate::dom::dom_model::{id_selector, node_selector, DomNode, DomSnapshot, FieldValue};
use crate::error::EngineError;
use crate::page::driver::PageDriver;
use crate::page::wait::Timing;
use crate::trace::logger::TraceLogger;
use crate::trace::trace::TraceEvent;
use crate::widget::expand::{enlarge_native_select, ExpansionOutcome};
use crate::widget::options::{extract_options, is_placeholder};

/// What one detection pass produced: descriptors, plus element ids the pass
/// absorbed into a composite (a combobox's inner text input must not remain
/// a standalone field).
#[derive(Debug, Default)]
pub struct PassOutput {
    pub descriptors: Vec<FieldDescriptor>,
    pub absorbed: Vec<String>,
}

// ============================================================================
// Shared descriptor assembly
// ============================================================================

fn build_solo_descriptor(
    driver: &mut dyn PageDriver,
    snapshot: &DomSnapshot,
    ctx: &mut ScanContext,
    index: usize,
    field_type: FieldType,
) -> Result<Option<FieldDescriptor>, EngineError> {
    let id = ctx.ensure_id(driver, snapshot, index)?;
    if ctx.is_claimed(&id) {
        return Ok(None); // consumed by group synthesis
    }

    let node = snapshot.node(index);
    let mut descriptor = FieldDescriptor {
        id: id.clone(),
        name: node.name().map(|n| n.to_string()),
        label: resolve_label(snapshot, index),
        field_type,
        selector: id_selector(&id),
        required: node.is_required(),
        disabled: node.is_disabled(),
        value: scan_value(snapshot, index, field_type),
        options: Vec::new(),
        surrounding_text: surrounding_text(snapshot, index),
        description: resolve_description(snapshot, index),
        format_hint: resolve_format_hint(field_type),
        group_name: None,
        is_group: false,
    };

    if matches!(field_type, FieldType::Select | FieldType::MultiSelect) {
        for option in native_select_options(snapshot, index) {
            descriptor.push_option(option);
        }
        enlarge_native_select(driver, &descriptor.selector, descriptor.options.len())?;
    }

    Ok(Some(descriptor))
}

/// Value at scan time, straight from the snapshot.
fn scan_value(snapshot: &DomSnapshot, index: usize, field_type: FieldType) -> FieldValue {
    let node = snapshot.node(index);
    match field_type {
        FieldType::Checkbox | FieldType::Radio => FieldValue::Flag(node.checked == Some(true)),
        FieldType::MultiSelect => {
            let values = snapshot
                .descendants(index)
                .into_iter()
                .filter(|&c| snapshot.node(c).tag == "option")
                .filter(|&c| snapshot.node(c).selected == Some(true))
                .map(|c| option_value(snapshot, c))
                .collect();
            FieldValue::List(values)
        }
        FieldType::Select => {
            let selected = snapshot
                .descendants(index)
                .into_iter()
                .filter(|&c| snapshot.node(c).tag == "option")
                .find(|&c| snapshot.node(c).selected == Some(true))
                .map(|c| option_value(snapshot, c));
            FieldValue::Text(
                selected
                    .or_else(|| node.value.clone())
                    .unwrap_or_default(),
            )
        }
        _ => FieldValue::Text(node.value.clone().unwrap_or_default()),
    }
}

fn option_value(snapshot: &DomSnapshot, index: usize) -> String {
    let node = snapshot.node(index);
    node.attr("value")
        .map(|v| v.to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| snapshot.subtree_text(index, 80))
}

fn native_select_options(snapshot: &DomSnapshot, index: usize) -> Vec<FieldOption> {
    snapshot
        .descendants(index)
        .into_iter()
        .filter(|&c| snapshot.node(c).tag == "option")
        .filter_map(|c| {
            // Placeholder detection needs the raw attribute; the text
            // fallback would mask an empty value.
            let raw = snapshot.node(c).attr("value").unwrap_or("");
            let label = snapshot.subtree_text(c, 80);
            if is_placeholder(raw, &label) {
                return None;
            }
            let value = option_value(snapshot, c);
            Some(FieldOption {
                value,
                label,
                selected: snapshot.node(c).selected == Some(true),
            })
        })
        .collect()
}

fn is_native_control(node: &DomNode) -> bool {
    match node.tag.as_str() {
        "textarea" | "select" => true,
        "input" => !matches!(
            node.input_type().as_deref(),
            Some("hidden") | Some("button") | Some("submit") | Some("reset") | Some("image")
        ),
        _ => false,
    }
}

// ============================================================================
// Capability-role pass: native form controls
// ============================================================================

pub fn capability_pass(
    driver: &mut dyn PageDriver,
    snapshot: &DomSnapshot,
    ctx: &mut ScanContext,
    _timing: &Timing,
    _tracer: &TraceLogger,
) -> Result<PassOutput, EngineError> {
    let mut out = PassOutput::default();
    for index in snapshot.find_all(is_native_control) {
        let node = snapshot.node(index);
        // Styled file inputs are routinely hidden behind a fake button;
        // everything else invisible is skipped here (the legacy pass is the
        // safety net for odd cases).
        if !node.visible && node.input_type().as_deref() != Some("file") {
            continue;
        }
        let field_type = classify_node(node);
        if let Some(descriptor) = build_solo_descriptor(driver, snapshot, ctx, index, field_type)? {
            out.descriptors.push(descriptor);
        }
    }
    Ok(out)
}

// ============================================================================
// Tab-order fallback pass: focusable things the role pass missed
// ============================================================================

pub fn tab_order_pass(
    driver: &mut dyn PageDriver,
    snapshot: &DomSnapshot,
    ctx: &mut ScanContext,
    _timing: &Timing,
    _tracer: &TraceLogger,
) -> Result<PassOutput, EngineError> {
    let mut out = PassOutput::default();
    for index in snapshot.find_all(|n| {
        !is_native_control(n)
            && n.visible
            && n.tabindex().map(|t| t >= 0).unwrap_or(false)
            && !matches!(n.tag.as_str(), "button" | "a" | "form" | "label")
            && !matches!(n.role(), Some("button") | Some("link") | Some("menuitem"))
    }) {
        let field_type = classify_node(snapshot.node(index));
        if field_type == FieldType::CustomDropdown {
            continue; // combobox containers get expanded by the widget pass
        }
        if let Some(descriptor) = build_solo_descriptor(driver, snapshot, ctx, index, field_type)? {
            out.descriptors.push(descriptor);
        }
    }
    Ok(out)
}

// ============================================================================
// Accessibility-attribute pass: labeled elements inside a form
// ============================================================================

pub fn aria_pass(
    driver: &mut dyn PageDriver,
    snapshot: &DomSnapshot,
    ctx: &mut ScanContext,
    _timing: &Timing,
    _tracer: &TraceLogger,
) -> Result<PassOutput, EngineError> {
    let mut out = PassOutput::default();
    for index in snapshot.find_all(|n| {
        !is_native_control(n)
            && n.visible
            && (n.has_attr("aria-label") || n.has_attr("aria-labelledby"))
            && !matches!(
                n.tag.as_str(),
                "form" | "label" | "fieldset" | "legend" | "button" | "a" | "option" | "nav"
            )
            && !matches!(n.role(), Some("button") | Some("link") | Some("option"))
    }) {
        if snapshot.enclosing_form(index).is_none() {
            continue;
        }
        let field_type = classify_node(snapshot.node(index));
        if field_type == FieldType::CustomDropdown {
            continue; // combobox containers get expanded by the widget pass
        }
        if let Some(descriptor) = build_solo_descriptor(driver, snapshot, ctx, index, field_type)? {
            out.descriptors.push(descriptor);
        }
    }
    Ok(out)
}

// ============================================================================
// Custom-widget pass: combobox-like containers
// ============================================================================

type WidgetPattern = (
    &'static str,
    fn(&DomSnapshot) -> Vec<usize>,
);

/// Container patterns tried independently; one pattern failing must not
/// take the others down, so the pass runner isolates each.
pub const WIDGET_PATTERNS: &[WidgetPattern] = &[
    ("role-combobox", |snap| {
        outermost(
            snap,
            snap.find_all(|n| {
                n.visible
                    && n.tag != "select"
                    && (n.role() == Some("combobox")
                        || matches!(n.attr("aria-haspopup"), Some("listbox") | Some("true")))
            }),
        )
    }),
    ("class-dropdown-container", |snap| {
        outermost(
            snap,
            snap.find_all(|n| {
                if !n.visible || n.tag == "select" || n.tag == "option" {
                    return false;
                }
                let class_hit = ["select", "dropdown", "autocomplete", "combobox", "picker"]
                    .iter()
                    .any(|needle| n.class_contains(needle));
                class_hit && n.has_attr("aria-expanded")
            })
            .into_iter()
            .collect(),
        )
    }),
    ("class-select-with-input", |snap| {
        outermost(
            snap,
            snap.find_all(|n| {
                n.visible
                    && n.tag != "select"
                    && (n.class_contains("select__control") || n.class_contains("select-container"))
            })
            .into_iter()
            .filter(|&idx| {
                snap.descendants(idx)
                    .into_iter()
                    .any(|c| snap.node(c).tag == "input")
            })
            .collect(),
        )
    }),
];

/// Drop candidates nested inside another candidate; the outermost container
/// is the logical field.
fn outermost(snapshot: &DomSnapshot, candidates: Vec<usize>) -> Vec<usize> {
    candidates
        .iter()
        .filter(|&&idx| {
            !candidates
                .iter()
                .any(|&other| other != idx && snapshot.contains(other, idx))
        })
        .copied()
        .collect()
}

pub fn custom_widget_pass(
    driver: &mut dyn PageDriver,
    snapshot: &DomSnapshot,
    ctx: &mut ScanContext,
    timing: &Timing,
    tracer: &TraceLogger,
) -> Result<PassOutput, EngineError> {
    let mut out = PassOutput::default();
    let mut seen: Vec<usize> = Vec::new();

    for (pattern_name, pattern) in WIDGET_PATTERNS {
        // Pattern-level fault isolation: a failure inside one pattern's
        // widget handling is recorded and the remaining patterns still run.
        if let Err(e) =
            run_widget_pattern(driver, snapshot, ctx, timing, tracer, pattern, &mut seen, &mut out)
        {
            crate::trace::logger::warn(&format!(
                "widget pattern '{}' failed: {}",
                pattern_name, e
            ));
        }
    }
    Ok(out)
}

fn run_widget_pattern(
    driver: &mut dyn PageDriver,
    snapshot: &DomSnapshot,
    ctx: &mut ScanContext,
    timing: &Timing,
    tracer: &TraceLogger,
    pattern: &fn(&DomSnapshot) -> Vec<usize>,
    seen: &mut Vec<usize>,
    out: &mut PassOutput,
) -> Result<(), EngineError> {
    for index in pattern(snapshot) {
        if seen.contains(&index) {
            continue;
        }
        seen.push(index);

        let id = ctx.ensure_id(driver, snapshot, index)?;
        if ctx.is_claimed(&id) {
            continue;
        }
        let container_selector = id_selector(&id);

        // The focusable sub-element: inner text input when present, else
        // the container itself.
        let inner_input = snapshot
            .descendants(index)
            .into_iter()
            .find(|&c| {
                let n = snapshot.node(c);
                n.tag == "input"
                    && !matches!(
                        n.input_type().as_deref(),
                        Some("hidden") | Some("checkbox") | Some("radio")
                    )
            });
        let focus_selector = inner_input
            .map(node_selector)
            .unwrap_or_else(|| container_selector.clone());

        let (options, option_context) =
            extract_options(driver, snapshot, index, &container_selector, &focus_selector, timing)?;

        match option_context.expansion {
            Some(ExpansionOutcome::Opened(technique)) => tracer.log(
                &TraceEvent::new("widget_expanded")
                    .with_field(&id)
                    .with_technique(technique.as_str()),
            ),
            Some(ExpansionOutcome::AlreadyOpen) => tracer.log(
                &TraceEvent::new("widget_expanded")
                    .with_field(&id)
                    .with_technique("already-open"),
            ),
            Some(ExpansionOutcome::TimedOut) => {
                tracer.log(&TraceEvent::new("expansion_timed_out").with_field(&id))
            }
            None => {} // options were pre-rendered, nothing was expanded
        }

        let node = snapshot.node(index);
        let current = inner_input
            .and_then(|c| snapshot.node(c).value.clone())
            .or_else(|| node.value.clone())
            .unwrap_or_default();

        let mut description = resolve_description(snapshot, index);
        if options.is_empty() {
            let context_text = option_context.describe();
            if !context_text.is_empty() {
                if description.is_empty() {
                    description = context_text;
                } else {
                    description = format!("{} | {}", description, context_text);
                }
            }
        }

        let mut descriptor = FieldDescriptor {
            id: id.clone(),
            name: node.name().map(|n| n.to_string()),
            label: resolve_label(snapshot, index),
            field_type: FieldType::CustomDropdown,
            selector: container_selector,
            required: node.is_required(),
            disabled: node.is_disabled(),
            value: FieldValue::Text(current),
            options: Vec::new(),
            surrounding_text: surrounding_text(snapshot, index),
            description,
            format_hint: None,
            group_name: None,
            is_group: false,
        };
        for option in options {
            descriptor.push_option(option);
        }

        // The inner input is part of this widget, not a field of its own.
        if let Some(inner) = inner_input {
            if let Some(inner_id) = snapshot.node(inner).id() {
                out.absorbed.push(inner_id.to_string());
            } else if let Ok(inner_id) = ctx.ensure_id(driver, snapshot, inner) {
                out.absorbed.push(inner_id);
            }
        }

        out.descriptors.push(descriptor);
    }
    Ok(())
}

// ============================================================================
// Legacy exhaustive pass: input/textarea/select safety net
// ============================================================================

pub fn legacy_pass(
    driver: &mut dyn PageDriver,
    snapshot: &DomSnapshot,
    ctx: &mut ScanContext,
    _timing: &Timing,
    _tracer: &TraceLogger,
) -> Result<PassOutput, EngineError> {
    let mut out = PassOutput::default();
    for index in snapshot.find_all(is_native_control) {
        let field_type = classify_node(snapshot.node(index));
        if let Some(descriptor) = build_solo_descriptor(driver, snapshot, ctx, index, field_type)? {
            out.descriptors.push(descriptor);
        }
    }
    Ok(out)
}
