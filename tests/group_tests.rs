use formfill::detect::field_model::FieldType;
use formfill::dom::dom_model::FieldValue;
use formfill::page::fake::{Elem, FakePage};

use crate::common::utils::{field, has_field, scan};

mod common;

// =========================================================================
// Radio groups
// =========================================================================

#[test]
fn same_name_radios_collapse_into_one_group() {
    let mut page = FakePage::with_body(vec![Elem::new("form").children(vec![
        Elem::input("radio", "r1").attr("name", "size").attr("value", "s"),
        Elem::label("r1", "Small"),
        Elem::input("radio", "r2").attr("name", "size").attr("value", "m"),
        Elem::label("r2", "Medium"),
        Elem::input("radio", "r3").attr("name", "size").attr("value", "l"),
        Elem::label("r3", "Large"),
    ])]);
    let fields = scan(&mut page);

    let group = field(&fields, "ff-group-size");
    assert_eq!(group.field_type, FieldType::RadioGroup);
    assert!(group.is_group);
    assert_eq!(group.group_name.as_deref(), Some("size"));
    assert_eq!(group.options.len(), 3);
    assert_eq!(group.options[0].label, "Small");
    assert_eq!(group.options[2].value, "l");
    assert_eq!(
        group.selector,
        "[id=\"r1\"], [id=\"r2\"], [id=\"r3\"]",
        "member selectors align with options"
    );
    assert!(!has_field(&fields, "r1"));
}

#[test]
fn checked_radio_becomes_group_value() {
    let mut page = FakePage::with_body(vec![Elem::new("form").children(vec![
        Elem::input("radio", "y").attr("name", "auth").attr("value", "yes").checked(true),
        Elem::label("y", "Yes"),
        Elem::input("radio", "n").attr("name", "auth").attr("value", "no"),
        Elem::label("n", "No"),
    ])]);
    let fields = scan(&mut page);

    let group = field(&fields, "ff-group-auth");
    assert_eq!(group.value, FieldValue::Text("yes".into()));
    assert!(group.options[0].selected);
    assert!(!group.options[1].selected);
}

#[test]
fn lone_radio_stays_a_solo_field() {
    let mut page = FakePage::with_body(vec![Elem::new("form").children(vec![
        Elem::input("radio", "only").attr("name", "solo").attr("value", "x"),
        Elem::label("only", "Only Choice"),
    ])]);
    let fields = scan(&mut page);

    assert!(!has_field(&fields, "ff-group-solo"), "one control is never a group");
    assert_eq!(field(&fields, "only").field_type, FieldType::Radio);
}

#[test]
fn unnamed_radios_never_group() {
    let mut page = FakePage::with_body(vec![Elem::new("form").children(vec![
        Elem::input("radio", "a1"),
        Elem::input("radio", "a2"),
    ])]);
    let fields = scan(&mut page);

    assert!(fields.iter().all(|f| !f.is_group));
    assert_eq!(field(&fields, "a1").field_type, FieldType::Radio);
}

// =========================================================================
// Checkbox groups
// =========================================================================

#[test]
fn fieldset_checkboxes_group_under_legend() {
    let mut page = FakePage::with_body(vec![Elem::new("form").child(
        Elem::new("fieldset").attr("id", "langs").children(vec![
            Elem::new("legend").text("Languages"),
            Elem::input("checkbox", "c1").attr("name", "langs[]").attr("value", "rust"),
            Elem::label("c1", "Rust"),
            Elem::input("checkbox", "c2").attr("name", "langs[]").attr("value", "go"),
            Elem::label("c2", "Go"),
        ]),
    )]);
    let fields = scan(&mut page);

    let group = field(&fields, "ff-group-langs");
    assert_eq!(group.field_type, FieldType::CheckboxGroup);
    assert_eq!(group.label, "Languages", "legend captions the group");
    assert_eq!(group.name.as_deref(), Some("langs"));
    assert_eq!(group.options.len(), 2);
}

#[test]
fn array_name_checkboxes_group_without_a_fieldset() {
    let mut page = FakePage::with_body(vec![Elem::new("form").children(vec![
        Elem::input("checkbox", "b1").attr("name", "benefits[0]").attr("value", "health"),
        Elem::label("b1", "Health"),
        Elem::input("checkbox", "b2").attr("name", "benefits[1]").attr("value", "dental"),
        Elem::label("b2", "Dental"),
    ])]);
    let fields = scan(&mut page);

    let group = field(&fields, "ff-group-benefits");
    assert_eq!(group.field_type, FieldType::CheckboxGroup);
    assert_eq!(group.label, "Benefits", "humanized from the shared base name");
}

#[test]
fn label_targeting_the_container_outranks_its_legend() {
    let mut page = FakePage::with_body(vec![Elem::new("form").children(vec![
        Elem::label("contact-set", "Preferred Contact Method"),
        Elem::new("fieldset").attr("id", "contact-set").children(vec![
            Elem::new("legend").text("Contact"),
            Elem::input("checkbox", "m1").attr("name", "contact[]").attr("value", "email"),
            Elem::label("m1", "Email"),
            Elem::input("checkbox", "m2").attr("name", "contact[]").attr("value", "phone"),
            Elem::label("m2", "Phone"),
        ]),
    ])]);
    let fields = scan(&mut page);

    let group = field(&fields, "ff-group-contact-set");
    assert_eq!(group.label, "Preferred Contact Method", "explicit group label wins over the legend");
    assert_eq!(group.options[0].label, "Email", "member labels still caption the options");
}

#[test]
fn lone_checkbox_is_not_a_group() {
    let mut page = FakePage::with_body(vec![Elem::new("form").children(vec![
        Elem::input("checkbox", "terms").attr("name", "terms"),
        Elem::label("terms", "I accept the terms"),
    ])]);
    let fields = scan(&mut page);

    let terms = field(&fields, "terms");
    assert_eq!(terms.field_type, FieldType::Checkbox);
    assert!(!terms.is_group);
}

#[test]
fn checkbox_group_value_lists_checked_members() {
    let mut page = FakePage::with_body(vec![Elem::new("form").child(
        Elem::new("fieldset").attr("id", "days").children(vec![
            Elem::new("legend").text("Days"),
            Elem::input("checkbox", "d1").attr("name", "days[]").attr("value", "mon").checked(true),
            Elem::label("d1", "Monday"),
            Elem::input("checkbox", "d2").attr("name", "days[]").attr("value", "tue"),
            Elem::label("d2", "Tuesday"),
            Elem::input("checkbox", "d3").attr("name", "days[]").attr("value", "wed").checked(true),
            Elem::label("d3", "Wednesday"),
        ]),
    )]);
    let fields = scan(&mut page);

    let group = field(&fields, "ff-group-days");
    assert_eq!(group.value, FieldValue::List(vec!["mon".into(), "wed".into()]));
}

#[test]
fn disabled_members_are_left_out() {
    let mut page = FakePage::with_body(vec![Elem::new("form").children(vec![
        Elem::input("radio", "e1").attr("name", "tier").attr("value", "free"),
        Elem::label("e1", "Free"),
        Elem::input("radio", "e2").attr("name", "tier").attr("value", "pro"),
        Elem::label("e2", "Pro"),
        Elem::input("radio", "e3")
            .attr("name", "tier")
            .attr("value", "internal")
            .attr("disabled", ""),
        Elem::label("e3", "Internal"),
    ])]);
    let fields = scan(&mut page);

    let group = field(&fields, "ff-group-tier");
    assert_eq!(group.options.len(), 2, "disabled radio excluded from the set");
}

#[test]
fn group_required_when_any_member_is() {
    let mut page = FakePage::with_body(vec![Elem::new("form").children(vec![
        Elem::input("radio", "q1").attr("name", "quiz").attr("value", "a").attr("required", ""),
        Elem::label("q1", "A"),
        Elem::input("radio", "q2").attr("name", "quiz").attr("value", "b"),
        Elem::label("q2", "B"),
    ])]);
    let fields = scan(&mut page);

    assert!(field(&fields, "ff-group-quiz").required);
}
