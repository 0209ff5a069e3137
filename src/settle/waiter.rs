use serde::Serialize;

use crate::detect::field_model::{FieldDescriptor, FieldType};
use crate::error::EngineError;
use crate::page::driver::PageDriver;
use crate::page::wait::{wait_for, Timing};
use crate::trace::logger::TraceLogger;
use crate::trace::trace::TraceEvent;

/// Activity indicators an external autofill tends to show while it works.
const BUSY_INDICATOR_SELECTOR: &str =
    "[aria-busy=\"true\"], [class*=\"spinner\"], [class*=\"loading\"], [class*=\"progress\"]";

/// Live state of the empty fields captured before an external autofill was
/// triggered. Only fields that start empty are tracked; a transition to
/// non-empty on any of them is the settle signal.
#[derive(Debug, Clone)]
pub struct FieldSnapshot {
    selectors: Vec<String>,
}

impl FieldSnapshot {
    pub fn tracked_count(&self) -> usize {
        self.selectors.len()
    }
}

/// Capture the fields whose live value is currently empty. Group
/// descriptors contribute their first member; a member getting checked
/// reads back as a non-empty value. File inputs are not tracked: the
/// upload that triggers the autofill writes the file input itself, and
/// that write must not count as the settle signal.
pub fn snapshot_empty_fields(
    driver: &mut dyn PageDriver,
    fields: &[FieldDescriptor],
) -> Result<FieldSnapshot, EngineError> {
    let mut selectors = Vec::new();
    for field in fields {
        if field.field_type == FieldType::File {
            continue;
        }
        let first = field.selector.split(", ").next().unwrap_or(&field.selector);
        if let Some(value) = driver.read_value(first)? {
            if value.is_empty() {
                selectors.push(first.to_string());
            }
        }
    }
    Ok(FieldSnapshot { selectors })
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SettleReason {
    /// Indicators cleared and at least one tracked field got a value.
    ValuesArrived,
    /// Nothing tracked was empty to begin with; settling is moot.
    NothingTracked,
    /// The ceiling elapsed without the signal.
    TimedOut,
}

/// Block until an external autofill pass appears finished, or until the
/// hard ceiling elapses. Resolution requires both the absence of busy
/// indicators and a value arriving in a field that was empty at capture
/// time. Values don't reliably bump the document's mutation counter, so
/// this polls on every interval rather than gating on mutations.
pub fn wait_for_autofill_settle(
    driver: &mut dyn PageDriver,
    prior: &FieldSnapshot,
    timing: &Timing,
    tracer: &TraceLogger,
) -> Result<SettleReason, EngineError> {
    if prior.selectors.is_empty() {
        tracer.log(
            &TraceEvent::new("settle_resolved")
                .with_waited(0)
                .with_detail("nothing_tracked"),
        );
        return Ok(SettleReason::NothingTracked);
    }

    let outcome = wait_for(
        driver,
        timing.settle_max_wait_ms,
        timing.poll_ms,
        false,
        |d| {
            if d.query_visible(BUSY_INDICATOR_SELECTOR)? {
                return Ok(false);
            }
            any_value_arrived(d, &prior.selectors)
        },
    )?;

    let reason = if outcome.satisfied {
        SettleReason::ValuesArrived
    } else {
        SettleReason::TimedOut
    };
    tracer.log(
        &TraceEvent::new("settle_resolved")
            .with_waited(outcome.waited_ms)
            .with_ok(outcome.satisfied)
            .with_detail(match reason {
                SettleReason::ValuesArrived => "values_arrived",
                SettleReason::TimedOut => "timed_out",
                SettleReason::NothingTracked => "nothing_tracked",
            }),
    );
    Ok(reason)
}

fn any_value_arrived(
    driver: &mut dyn PageDriver,
    selectors: &[String],
) -> Result<bool, EngineError> {
    for selector in selectors {
        if let Some(value) = driver.read_value(selector)? {
            if !value.is_empty() {
                return Ok(true);
            }
        }
    }
    Ok(false)
}
