//! End-to-end runs over the fake driver: scan, answer, fill, verify the
//! document. The live PageSession path (page_host.js + a real browser) is
//! exercised manually; everything here runs offline and deterministically.

use formfill::answers::answer_model::AnswerValue;
use formfill::answers::provider::{AnswerProvider, HeuristicAnswerProvider};
use formfill::fill::engine::fill_form;
use formfill::page::fake::Mutation;
use formfill::page::wait::Timing;
use formfill::run_fill;
use formfill::settle::waiter::{snapshot_empty_fields, wait_for_autofill_settle, SettleReason};
use formfill::trace::logger::TraceLogger;

use crate::common::utils::{job_form_page, scan, scan_empty_only};

mod common;

#[test]
fn full_cycle_scan_answer_fill() {
    let mut page = job_form_page();
    let fields = scan(&mut page);

    let profile = serde_json::json!({
        "email": "jane@corp.example",
        "fullName": "Jane Smith",
        "workAuth": "yes",
        "interests": ["engineering"],
        "resume": "/tmp/jane_resume.pdf",
    });
    let answers = HeuristicAnswerProvider.answer(&fields, &profile, None);

    let report = fill_form(
        &mut page,
        &fields,
        &answers,
        &Timing::default(),
        &TraceLogger::disabled(),
    );
    assert!(report.all_ok(), "errors: {:?}", report.per_field_errors);
    assert_eq!(report.error_count, 0);

    assert_eq!(page.value_of("[id=\"email\"]").as_deref(), Some("jane@corp.example"));
    assert_eq!(page.value_of("[id=\"ff-field-0\"]").as_deref(), Some("Jane Smith"));
    assert_eq!(page.checked_of("[id=\"auth-yes\"]"), Some(true));
    assert_eq!(page.checked_of("[id=\"cb-eng\"]"), Some(true));
    assert_eq!(page.value_of("[id=\"resume\"]").as_deref(), Some("/tmp/jane_resume.pdf"));
    // No profile key for the country select: first real option is chosen.
    assert_eq!(page.value_of("[id=\"country\"]").as_deref(), Some("us"));
    // No profile key for the notes textarea either, so it gets the sentinel.
    assert_eq!(page.value_of("[id=\"notes\"]").as_deref(), Some("n/a"));
}

#[test]
fn run_fill_returns_fields_and_report_together() {
    let mut page = job_form_page();
    let mut answers = formfill::answers::answer_model::AnswerSet::default();
    answers.insert("email", AnswerValue::Text("e@f.g".into()));

    let (fields, report) = run_fill(
        &mut page,
        &answers,
        &Timing::default(),
        &TraceLogger::disabled(),
    );
    assert!(!fields.is_empty());
    assert_eq!(report.filled_count, 1);
    assert_eq!(page.value_of("[id=\"email\"]").as_deref(), Some("e@f.g"));
}

#[test]
fn upload_settle_rescan_only_fills_what_autofill_missed() {
    let mut page = job_form_page();
    let fields = scan(&mut page);
    let prior = snapshot_empty_fields(&mut page, &fields).unwrap();

    use formfill::page::driver::PageDriver;
    // Uploading the resume triggers a page-owned autofill that lands the
    // email a moment later.
    page.schedule(
        100,
        Mutation::SetValue {
            selector: "[id=\"email\"]".into(),
            value: "from-resume@example.com".into(),
        },
    );
    page.upload("[id=\"resume\"]", "/tmp/jane_resume.pdf").unwrap();

    let reason = wait_for_autofill_settle(
        &mut page,
        &prior,
        &Timing::default(),
        &TraceLogger::disabled(),
    )
    .unwrap();
    assert_eq!(reason, SettleReason::ValuesArrived);

    // Re-scan keeps only what autofill left empty.
    let remaining = scan_empty_only(&mut page);
    assert!(
        !remaining.iter().any(|f| f.id == "email"),
        "autofilled email must not be re-filled"
    );
    assert!(remaining.iter().any(|f| f.id == "country"));

    let profile = serde_json::json!({ "fullName": "Jane Smith" });
    let answers = HeuristicAnswerProvider.answer(&remaining, &profile, None);
    let report = fill_form(
        &mut page,
        &remaining,
        &answers,
        &Timing::default(),
        &TraceLogger::disabled(),
    );
    assert!(report.all_ok());
    assert_eq!(
        page.value_of("[id=\"email\"]").as_deref(),
        Some("from-resume@example.com"),
        "fill never overwrote the autofilled value"
    );
    assert_eq!(page.value_of("[id=\"ff-field-0\"]").as_deref(), Some("Jane Smith"));
}

#[test]
fn trace_file_records_the_run() {
    let dir = std::env::temp_dir().join("formfill-trace-test");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(format!("trace-{}.jsonl", std::process::id()));
    let path_str = path.to_string_lossy().to_string();

    let tracer = TraceLogger::new(&path_str);
    let mut page = job_form_page();
    let fields = formfill::detect::discover::discover(
        &mut page,
        &formfill::detect::discover::DiscoverOptions::default(),
        &Timing::default(),
        &tracer,
    );
    assert!(!fields.is_empty());
    drop(tracer);

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("scan_started"));
    assert!(content.contains("scan_completed"));
    assert!(content.contains("pass_completed"));
    for line in content.lines() {
        let parsed: serde_json::Value = serde_json::from_str(line).unwrap();
        assert!(parsed.get("event").is_some(), "every trace line is one event object");
    }
    std::fs::remove_file(&path).ok();
}
