use formfill::answers::answer_model::{AnswerSet, AnswerValue, FieldAnswer};
use formfill::answers::provider::{
    guess_value, AnswerProvider, HeuristicAnswerProvider, ScriptedAnswerProvider,
};
use formfill::detect::field_model::FieldType;

use crate::common::utils::{job_form_page, scan};

mod common;

// ============================================================================
// Answer value semantics
// ============================================================================

#[test]
fn answer_emptiness_covers_model_sentinels() {
    assert!(AnswerValue::Text("".into()).is_empty());
    assert!(AnswerValue::Text("  ".into()).is_empty());
    assert!(AnswerValue::Text("null".into()).is_empty());
    assert!(AnswerValue::Text("Undefined".into()).is_empty());
    assert!(!AnswerValue::Text("no".into()).is_empty());
    assert!(!AnswerValue::Flag(false).is_empty(), "an explicit false is an answer");
    assert!(AnswerValue::Many(vec![]).is_empty());
    assert!(!AnswerValue::Many(vec!["a".into()]).is_empty());
}

#[test]
fn answer_set_parses_mixed_json_map() {
    let json = serde_json::json!({
        "email": "jane@corp.example",
        "remote-ok": true,
        "languages": ["rust", "go"],
    });
    let set = AnswerSet::from_json_map(json).unwrap();

    assert_eq!(set.len(), 3);
    assert_eq!(set.get("email"), Some(&AnswerValue::Text("jane@corp.example".into())));
    assert_eq!(set.get("remote-ok"), Some(&AnswerValue::Flag(true)));
    assert_eq!(
        set.get("languages"),
        Some(&AnswerValue::Many(vec!["rust".into(), "go".into()]))
    );
    assert_eq!(set.get("missing"), None);
}

// ============================================================================
// Heuristic provider
// ============================================================================

#[test]
fn guess_value_prefers_label_over_type() {
    assert_eq!(guess_value("Work Email", &FieldType::Text), "user@example.com");
    assert_eq!(guess_value("Phone Number", &FieldType::Text), "555-0100");
    assert_eq!(guess_value("Postal Code", &FieldType::Text), "90210");
    assert_eq!(guess_value("Anything", &FieldType::Date), "2026-01-15");
    assert_eq!(guess_value("Anything", &FieldType::Text), "n/a");
}

#[test]
fn heuristic_provider_answers_from_profile_by_loose_key() {
    let mut page = job_form_page();
    let fields = scan(&mut page);
    let profile = serde_json::json!({
        "email": "jane@corp.example",
        "full_name": "Jane Smith",
    });

    let answers = HeuristicAnswerProvider.answer(&fields, &profile, None);
    assert_eq!(
        answers.get("email"),
        Some(&AnswerValue::Text("jane@corp.example".into()))
    );
    // "full_name" matches the "Full Name" label despite the underscore.
    assert_eq!(
        answers.get("ff-field-0"),
        Some(&AnswerValue::Text("Jane Smith".into()))
    );
}

#[test]
fn heuristic_provider_picks_first_option_for_unmatched_selections() {
    let mut page = job_form_page();
    let fields = scan(&mut page);
    let answers = HeuristicAnswerProvider.answer(&fields, &serde_json::json!({}), None);

    assert_eq!(answers.get("country"), Some(&AnswerValue::Text("us".into())));
    assert_eq!(
        answers.get("ff-group-workauth"),
        Some(&AnswerValue::Text("yes".into()))
    );
}

#[test]
fn scripted_provider_returns_exactly_its_script() {
    let provider = ScriptedAnswerProvider {
        answers: vec![FieldAnswer {
            id: "email".into(),
            value: AnswerValue::Text("scripted@example.com".into()),
        }],
    };
    let answers = provider.answer(&[], &serde_json::json!({}), None);
    assert_eq!(answers.len(), 1);
    assert_eq!(
        answers.get("email"),
        Some(&AnswerValue::Text("scripted@example.com".into()))
    );
}
