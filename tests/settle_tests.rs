use formfill::page::fake::{Elem, FakePage, Mutation};
use formfill::page::wait::Timing;
use formfill::settle::waiter::{snapshot_empty_fields, wait_for_autofill_settle, SettleReason};
use formfill::trace::logger::TraceLogger;

use crate::common::utils::{job_form_page, scan};

mod common;

fn spinner_page() -> FakePage {
    FakePage::with_body(vec![
        Elem::new("div").attr("id", "busy").attr("class", "spinner"),
        Elem::new("form").children(vec![
            Elem::label("email", "Email"),
            Elem::input("email", "email"),
            Elem::label("name", "Name"),
            Elem::input("text", "name"),
        ]),
    ])
}

#[test]
fn settle_times_out_at_the_hard_ceiling() {
    let timing = Timing::default();
    let mut page = spinner_page(); // spinner never clears

    let fields = scan(&mut page);
    let prior = snapshot_empty_fields(&mut page, &fields).unwrap();
    assert_eq!(prior.tracked_count(), 2);

    let reason = wait_for_autofill_settle(&mut page, &prior, &timing, &TraceLogger::disabled())
        .unwrap();
    assert_eq!(reason, SettleReason::TimedOut);
    assert_eq!(
        page.clock_ms(),
        timing.settle_max_wait_ms,
        "waited exactly to the ceiling, no further"
    );
}

#[test]
fn settle_resolves_when_indicator_clears_and_a_value_lands() {
    let timing = Timing::default();
    let mut page = spinner_page();
    page.schedule(
        200,
        Mutation::SetVisible {
            selector: "[id=\"busy\"]".into(),
            visible: false,
        },
    );
    page.schedule(
        240,
        Mutation::SetValue {
            selector: "[id=\"email\"]".into(),
            value: "autofilled@example.com".into(),
        },
    );

    let fields = scan(&mut page);
    let prior = snapshot_empty_fields(&mut page, &fields).unwrap();

    let reason = wait_for_autofill_settle(&mut page, &prior, &timing, &TraceLogger::disabled())
        .unwrap();
    assert_eq!(reason, SettleReason::ValuesArrived);
    assert!(page.clock_ms() >= 240, "could not resolve before the value landed");
    assert!(page.clock_ms() < timing.settle_max_wait_ms, "resolved well before the ceiling");
}

#[test]
fn indicator_alone_is_not_enough() {
    let timing = Timing::default();
    let mut page = spinner_page();
    // Spinner clears but no tracked field ever gets a value.
    page.schedule(
        100,
        Mutation::SetVisible {
            selector: "[id=\"busy\"]".into(),
            visible: false,
        },
    );

    let fields = scan(&mut page);
    let prior = snapshot_empty_fields(&mut page, &fields).unwrap();

    let reason = wait_for_autofill_settle(&mut page, &prior, &timing, &TraceLogger::disabled())
        .unwrap();
    assert_eq!(reason, SettleReason::TimedOut);
}

#[test]
fn nothing_tracked_resolves_immediately() {
    let mut page = job_form_page();
    let fields = scan(&mut page);

    // Fill every non-group field so nothing is empty at capture time.
    use formfill::page::driver::PageDriver;
    for field in &fields {
        if !field.is_group {
            let first = field.selector.split(", ").next().unwrap();
            page.set_value(first, "already filled").unwrap();
        } else {
            let first = field.selector.split(", ").next().unwrap();
            page.set_checked(first, true).unwrap();
        }
    }

    let prior = snapshot_empty_fields(&mut page, &fields).unwrap();
    assert_eq!(prior.tracked_count(), 0);

    let reason = wait_for_autofill_settle(
        &mut page,
        &prior,
        &Timing::default(),
        &TraceLogger::disabled(),
    )
    .unwrap();
    assert_eq!(reason, SettleReason::NothingTracked);
    assert_eq!(page.clock_ms(), 0, "no waiting when nothing was empty");
}
