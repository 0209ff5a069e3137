use std::collections::HashMap;

use crate::detect::context::ScanContext;
use crate::detect::field_model::{FieldDescriptor, FieldOption, FieldType};
use crate::detect::label::{humanize_name, resolve_description, surrounding_text, UNLABELED};
use crate::dom::dom_model::{id_selector, DomSnapshot, FieldValue};
use crate::error::EngineError;
use crate::page::driver::PageDriver;

/// Aggregate same-name radios and sibling checkboxes into single logical
/// group-fields. Runs before every solo-element pass; member ids land in the
/// claimed set so no later pass re-emits them standalone.
pub fn synthesize_groups(
    driver: &mut dyn PageDriver,
    snapshot: &DomSnapshot,
    ctx: &mut ScanContext,
) -> Result<Vec<FieldDescriptor>, EngineError> {
    let mut groups = Vec::new();

    synthesize_radio_groups(driver, snapshot, ctx, &mut groups)?;
    synthesize_checkbox_groups(driver, snapshot, ctx, &mut groups)?;

    // Document order by first member.
    groups.sort_by_key(|(first_member, _)| *first_member);
    Ok(groups.into_iter().map(|(_, descriptor)| descriptor).collect())
}

// ============================================================================
// Radio groups
// ============================================================================

fn synthesize_radio_groups(
    driver: &mut dyn PageDriver,
    snapshot: &DomSnapshot,
    ctx: &mut ScanContext,
    out: &mut Vec<(usize, FieldDescriptor)>,
) -> Result<(), EngineError> {
    let radios = snapshot.find_all(|n| {
        n.tag == "input" && n.input_type().as_deref() == Some("radio") && !n.is_disabled()
    });

    // name -> member indices, insertion keeps document order
    let mut by_name: Vec<(String, Vec<usize>)> = Vec::new();
    for idx in radios {
        let Some(name) = snapshot.node(idx).name() else {
            continue; // unnamed radios can't form a set
        };
        match by_name.iter_mut().find(|(n, _)| n == name) {
            Some((_, members)) => members.push(idx),
            None => by_name.push((name.to_string(), vec![idx])),
        }
    }

    for (name, members) in by_name {
        if members.len() < 2 {
            continue; // a lone control is never a group
        }
        let descriptor = build_group(
            driver,
            snapshot,
            ctx,
            &members,
            FieldType::RadioGroup,
            &name,
            Some(name.clone()),
        )?;
        out.push((members[0], descriptor));
    }
    Ok(())
}

// ============================================================================
// Checkbox groups
// ============================================================================

fn synthesize_checkbox_groups(
    driver: &mut dyn PageDriver,
    snapshot: &DomSnapshot,
    ctx: &mut ScanContext,
    out: &mut Vec<(usize, FieldDescriptor)>,
) -> Result<(), EngineError> {
    let checkboxes = snapshot.find_all(|n| {
        n.tag == "input" && n.input_type().as_deref() == Some("checkbox") && !n.is_disabled()
    });

    let mut grouped: Vec<usize> = Vec::new();

    // (a) >=2 checkboxes under one fieldset-equivalent container
    let mut by_fieldset: HashMap<usize, Vec<usize>> = HashMap::new();
    for &idx in &checkboxes {
        if let Some(fieldset) = snapshot.enclosing_fieldset(idx) {
            by_fieldset.entry(fieldset).or_default().push(idx);
        }
    }
    let mut fieldset_groups: Vec<(usize, Vec<usize>)> = by_fieldset.into_iter().collect();
    fieldset_groups.sort_by_key(|(_, members)| members[0]);

    for (fieldset, mut members) in fieldset_groups {
        members.sort();
        if members.len() < 2 {
            continue;
        }
        let key = snapshot
            .node(fieldset)
            .id()
            .map(|id| id.to_string())
            .unwrap_or_else(|| format!("fieldset-{}", fieldset));
        let shared_name = shared_base_name(snapshot, &members);
        let descriptor = build_group(
            driver,
            snapshot,
            ctx,
            &members,
            FieldType::CheckboxGroup,
            &key,
            shared_name,
        )?;
        grouped.extend(members.iter().copied());
        out.push((members[0], descriptor));
    }

    // (b) >=2 checkboxes sharing an array-style base name (base, base[], base[0], ...)
    let mut by_base: Vec<(String, Vec<usize>)> = Vec::new();
    for &idx in &checkboxes {
        if grouped.contains(&idx) {
            continue;
        }
        let Some(name) = snapshot.node(idx).name() else {
            continue;
        };
        let base = base_name(name);
        match by_base.iter_mut().find(|(b, _)| b == &base) {
            Some((_, members)) => members.push(idx),
            None => by_base.push((base, vec![idx])),
        }
    }

    for (base, members) in by_base {
        if members.len() < 2 {
            continue;
        }
        let descriptor = build_group(
            driver,
            snapshot,
            ctx,
            &members,
            FieldType::CheckboxGroup,
            &base,
            Some(base.clone()),
        )?;
        out.push((members[0], descriptor));
    }
    Ok(())
}

/// `interests[]` and `interests[2]` share the base `interests`.
pub fn base_name(name: &str) -> String {
    match name.find('[') {
        Some(pos) => name[..pos].to_string(),
        None => name.to_string(),
    }
}

fn shared_base_name(snapshot: &DomSnapshot, members: &[usize]) -> Option<String> {
    let mut bases = members
        .iter()
        .filter_map(|&idx| snapshot.node(idx).name().map(base_name));
    let first = bases.next()?;
    if bases.all(|b| b == first) { Some(first) } else { None }
}

// ============================================================================
// Group descriptor assembly
// ============================================================================

fn build_group(
    driver: &mut dyn PageDriver,
    snapshot: &DomSnapshot,
    ctx: &mut ScanContext,
    members: &[usize],
    field_type: FieldType,
    key: &str,
    name: Option<String>,
) -> Result<FieldDescriptor, EngineError> {
    let mut member_selectors = Vec::new();
    let mut options = Vec::new();
    let mut required = false;
    let mut selected_values = Vec::new();

    for &idx in members {
        let member_id = ctx.ensure_id(driver, snapshot, idx)?;
        ctx.claim(&member_id);
        member_selectors.push(id_selector(&member_id));

        let node = snapshot.node(idx);
        required = required || node.is_required();
        let label = member_label(snapshot, idx);
        let value = node
            .attr("value")
            .map(|v| v.to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| label.clone());
        let selected = node.checked == Some(true);
        if selected {
            selected_values.push(value.clone());
        }
        options.push(FieldOption { value, label, selected });
    }

    let group_id = unique_group_id(ctx, key);
    ctx.claim(&group_id);

    let first = members[0];
    let label = group_label(snapshot, first, key);
    let value = match field_type {
        FieldType::CheckboxGroup => FieldValue::List(selected_values),
        _ => FieldValue::Text(selected_values.into_iter().next().unwrap_or_default()),
    };

    let mut descriptor = FieldDescriptor {
        id: group_id,
        name,
        label,
        field_type,
        selector: member_selectors.join(", "),
        required,
        disabled: false,
        value,
        options: Vec::new(),
        surrounding_text: surrounding_text(snapshot, first),
        description: resolve_description(snapshot, first),
        format_hint: None,
        group_name: Some(key.to_string()),
        is_group: true,
    };
    for option in options {
        descriptor.push_option(option);
    }
    Ok(descriptor)
}

fn unique_group_id(ctx: &ScanContext, key: &str) -> String {
    let sanitized: String = key
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect();
    let base = format!("ff-group-{}", sanitized.to_lowercase());
    if !ctx.is_claimed(&base) {
        return base;
    }
    let mut counter = 2;
    loop {
        let candidate = format!("{}-{}", base, counter);
        if !ctx.is_claimed(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// A member's own caption: its `label[for]`, wrapping label, aria-label, or
/// the text right next to it; falls back to its value attribute.
fn member_label(snapshot: &DomSnapshot, index: usize) -> String {
    let node = snapshot.node(index);

    if let Some(dom_id) = node.id() {
        if let Some(label_idx) = snapshot.label_for_control(dom_id) {
            let text = snapshot.subtree_text(label_idx, 80);
            if !text.is_empty() {
                return text;
            }
        }
    }
    if let Some(wrapper) = snapshot.closest(index, |n| n.tag == "label") {
        let text = snapshot.subtree_text(wrapper, 80);
        if !text.is_empty() {
            return text;
        }
    }
    if let Some(aria) = node.attr("aria-label") {
        if !aria.trim().is_empty() {
            return aria.trim().to_string();
        }
    }
    for sibling in snapshot.following_siblings(index) {
        let text = snapshot.subtree_text(sibling, 80);
        if !text.is_empty() {
            return text;
        }
    }
    node.attr("value").unwrap_or(UNLABELED).to_string()
}

/// The group's caption, resolved against the group control itself: an
/// explicit label targeting the enclosing container, the container's own
/// labeling attributes, its legend, or a title-cased rendering of the group
/// key. Member captions feed the option labels, never the group label.
fn group_label(snapshot: &DomSnapshot, first_member: usize, key: &str) -> String {
    if let Some(fieldset) = snapshot.enclosing_fieldset(first_member) {
        let container = snapshot.node(fieldset);
        if let Some(dom_id) = container.id() {
            if let Some(label_idx) = snapshot.label_for_control(dom_id) {
                let text = snapshot.subtree_text(label_idx, 120);
                if !text.is_empty() {
                    return text;
                }
            }
        }
        if let Some(aria) = container.attr("aria-label") {
            if !aria.trim().is_empty() {
                return aria.trim().to_string();
            }
        }
        if let Some(ids) = container.attr("aria-labelledby") {
            for ref_id in ids.split_whitespace() {
                if let Some(ref_idx) = snapshot.find_by_dom_id(ref_id) {
                    let text = snapshot.subtree_text(ref_idx, 120);
                    if !text.is_empty() {
                        return text;
                    }
                }
            }
        }
        for &child in &container.children {
            if snapshot.node(child).tag == "legend" {
                let text = snapshot.subtree_text(child, 120);
                if !text.is_empty() {
                    return text;
                }
            }
        }
    }
    let humanized = humanize_name(key);
    if humanized.is_empty() { UNLABELED.to_string() } else { humanized }
}
