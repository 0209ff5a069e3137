use formfill::detect::field_model::FieldType;
use formfill::detect::label::{
    humanize_name, resolve_description, resolve_format_hint, resolve_label, DESCRIPTION_CAP,
    UNLABELED,
};
use formfill::dom::dom_model::DomSnapshot;
use formfill::page::driver::PageDriver;
use formfill::page::fake::{Elem, FakePage};

fn snapshot_of(children: Vec<Elem>) -> DomSnapshot {
    FakePage::with_body(children).snapshot().unwrap()
}

fn idx(snapshot: &DomSnapshot, id: &str) -> usize {
    snapshot
        .find_by_dom_id(id)
        .unwrap_or_else(|| panic!("no element '{}'", id))
}

// =========================================================================
// Label precedence
// =========================================================================

#[test]
fn label_for_beats_everything() {
    let snap = snapshot_of(vec![
        Elem::label("f", "Explicit Label"),
        Elem::new("input")
            .attr("id", "f")
            .attr("aria-label", "Aria Label")
            .attr("placeholder", "Placeholder"),
    ]);
    assert_eq!(resolve_label(&snap, idx(&snap, "f")), "Explicit Label");
}

#[test]
fn aria_labelledby_beats_aria_label() {
    let snap = snapshot_of(vec![
        Elem::new("span").attr("id", "cap").text("Referenced Caption"),
        Elem::new("input")
            .attr("id", "f")
            .attr("aria-labelledby", "cap")
            .attr("aria-label", "Aria Label"),
    ]);
    assert_eq!(resolve_label(&snap, idx(&snap, "f")), "Referenced Caption");
}

#[test]
fn aria_labelledby_joins_multiple_references() {
    let snap = snapshot_of(vec![
        Elem::new("span").attr("id", "a").text("First"),
        Elem::new("span").attr("id", "b").text("Last"),
        Elem::new("input").attr("id", "f").attr("aria-labelledby", "a b"),
    ]);
    assert_eq!(resolve_label(&snap, idx(&snap, "f")), "First Last");
}

#[test]
fn aria_label_beats_placeholder() {
    let snap = snapshot_of(vec![Elem::new("input")
        .attr("id", "f")
        .attr("aria-label", "Aria Label")
        .attr("placeholder", "Placeholder")]);
    assert_eq!(resolve_label(&snap, idx(&snap, "f")), "Aria Label");
}

#[test]
fn placeholder_beats_wrapping_label() {
    let snap = snapshot_of(vec![Elem::new("label")
        .text("Wrapper Text")
        .child(Elem::new("input").attr("id", "f").attr("placeholder", "Placeholder"))]);
    assert_eq!(resolve_label(&snap, idx(&snap, "f")), "Placeholder");
}

#[test]
fn wrapping_label_used_when_nothing_explicit() {
    let snap = snapshot_of(vec![Elem::new("label")
        .text("Wrapper Text")
        .child(Elem::new("input").attr("id", "f"))]);
    assert_eq!(resolve_label(&snap, idx(&snap, "f")), "Wrapper Text");
}

#[test]
fn ancestor_label_class_sibling_is_found() {
    let snap = snapshot_of(vec![Elem::new("div").children(vec![
        Elem::new("div").attr("class", "field-label").text("Container Caption"),
        Elem::new("div").child(Elem::new("input").attr("id", "f")),
    ])]);
    assert_eq!(resolve_label(&snap, idx(&snap, "f")), "Container Caption");
}

#[test]
fn preceding_sibling_text_is_last_structural_resort() {
    let snap = snapshot_of(vec![Elem::new("div").children(vec![
        Elem::new("span").text("Nearby Text"),
        Elem::new("input").attr("id", "f"),
    ])]);
    assert_eq!(resolve_label(&snap, idx(&snap, "f")), "Nearby Text");
}

#[test]
fn name_attribute_humanizes_when_no_text_found() {
    let snap = snapshot_of(vec![Elem::new("input").attr("id", "f").attr("name", "first_name")]);
    assert_eq!(resolve_label(&snap, idx(&snap, "f")), "First Name");
}

#[test]
fn unlabeled_sentinel_when_nothing_applies() {
    let snap = snapshot_of(vec![Elem::new("input").attr("id", "f")]);
    assert_eq!(resolve_label(&snap, idx(&snap, "f")), UNLABELED);
}

// =========================================================================
// humanize_name
// =========================================================================

#[test]
fn humanize_handles_common_name_shapes() {
    assert_eq!(humanize_name("firstName"), "First Name");
    assert_eq!(humanize_name("work_auth[0]"), "Work Auth");
    assert_eq!(humanize_name("contact.email"), "Contact Email");
    assert_eq!(humanize_name("zip-code"), "Zip Code");
    assert_eq!(humanize_name("interests[]"), "Interests");
}

// =========================================================================
// Descriptions
// =========================================================================

#[test]
fn description_collects_describedby_and_help_text() {
    let snap = snapshot_of(vec![Elem::new("div").children(vec![
        Elem::new("input").attr("id", "f").attr("aria-describedby", "hint"),
        Elem::new("span").attr("id", "hint").attr("class", "help-text").text("Use your work email"),
    ])]);
    let description = resolve_description(&snap, idx(&snap, "f"));
    assert!(description.contains("Use your work email"));
    // Same text reachable as describedby and as a help-class sibling is not
    // repeated.
    assert_eq!(description.matches("Use your work email").count(), 1);
}

#[test]
fn description_includes_fieldset_legend() {
    let snap = snapshot_of(vec![Elem::new("fieldset").children(vec![
        Elem::new("legend").text("Availability"),
        Elem::new("input").attr("id", "f"),
    ])]);
    assert!(resolve_description(&snap, idx(&snap, "f")).contains("Availability"));
}

#[test]
fn description_is_capped() {
    let long = "x".repeat(DESCRIPTION_CAP * 2);
    let snap = snapshot_of(vec![Elem::new("div").children(vec![
        Elem::new("input").attr("id", "f"),
        Elem::new("span").attr("class", "description").text(&long),
    ])]);
    assert!(resolve_description(&snap, idx(&snap, "f")).len() <= DESCRIPTION_CAP);
}

// =========================================================================
// Format hints
// =========================================================================

#[test]
fn temporal_types_carry_format_hints() {
    assert_eq!(resolve_format_hint(FieldType::Date).as_deref(), Some("YYYY-MM-DD"));
    assert_eq!(
        resolve_format_hint(FieldType::Datetime).as_deref(),
        Some("YYYY-MM-DDTHH:MM")
    );
    assert_eq!(resolve_format_hint(FieldType::Time).as_deref(), Some("HH:MM (24-hour)"));
    assert_eq!(resolve_format_hint(FieldType::Month).as_deref(), Some("YYYY-MM"));
    assert_eq!(resolve_format_hint(FieldType::Week).as_deref(), Some("YYYY-Www"));
    assert_eq!(resolve_format_hint(FieldType::Text), None);
    assert_eq!(resolve_format_hint(FieldType::Email), None);
}
