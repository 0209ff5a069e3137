use crate::detect::context::ScanContext;
use crate::detect::field_model::{scan_fingerprint, FieldDescriptor};
use crate::detect::groups::synthesize_groups;
use crate::detect::merge::merge_passes;
use crate::detect::passes::{
    aria_pass, capability_pass, custom_widget_pass, legacy_pass, tab_order_pass, PassOutput,
};
use crate::dom::dom_model::DomSnapshot;
use crate::error::EngineError;
use crate::page::driver::PageDriver;
use crate::page::wait::Timing;
use crate::trace::logger::TraceLogger;
use crate::trace::trace::TraceEvent;

#[derive(Debug, Clone, Copy, Default)]
pub struct DiscoverOptions {
    /// Keep only fields whose live value is still empty (post-merge
    /// re-read), for the run after an external autofill settled.
    pub filter_empty_only: bool,
}

type Pass = fn(
    &mut dyn PageDriver,
    &DomSnapshot,
    &mut ScanContext,
    &Timing,
    &TraceLogger,
) -> Result<PassOutput, EngineError>;

const PASSES: &[(&str, Pass)] = &[
    ("capability-role", capability_pass),
    ("tab-order", tab_order_pass),
    ("aria-attribute", aria_pass),
    ("custom-widget", custom_widget_pass),
    ("legacy-tags", legacy_pass),
];

/// Full multi-pass scan of the live document.
///
/// Group synthesis runs first and claims its member elements; the five solo
/// passes follow in fixed order and are merged by identifier under the
/// specificity rule. Each stage is fault-isolated: one failing pass is
/// logged and skipped, and the scan still returns whatever the other stages
/// produced. This function never errors; worst case is an empty Vec.
pub fn discover(
    driver: &mut dyn PageDriver,
    opts: &DiscoverOptions,
    timing: &Timing,
    tracer: &TraceLogger,
) -> Vec<FieldDescriptor> {
    tracer.log(&TraceEvent::new("scan_started"));

    let snapshot = match driver.snapshot() {
        Ok(s) => s,
        Err(e) => {
            tracer.log(&TraceEvent::new("scan_failed").with_detail(&e));
            return Vec::new();
        }
    };

    let mut ctx = ScanContext::new();

    let group_fields = match synthesize_groups(driver, &snapshot, &mut ctx) {
        Ok(groups) => {
            tracer.log(
                &TraceEvent::new("pass_completed")
                    .with_pass("group-synthesis")
                    .with_count(groups.len()),
            );
            groups
        }
        Err(e) => {
            tracer.log(
                &TraceEvent::new("pass_failed")
                    .with_pass("group-synthesis")
                    .with_detail(&e),
            );
            Vec::new()
        }
    };

    let mut outputs = Vec::new();
    for (name, pass) in PASSES {
        match pass(driver, &snapshot, &mut ctx, timing, tracer) {
            Ok(output) => {
                tracer.log(
                    &TraceEvent::new("pass_completed")
                        .with_pass(name)
                        .with_count(output.descriptors.len()),
                );
                outputs.push(output);
            }
            Err(e) => {
                tracer.log(&TraceEvent::new("pass_failed").with_pass(name).with_detail(&e));
            }
        }
    }

    let mut fields = merge_passes(group_fields, outputs);

    if opts.filter_empty_only {
        fields = retain_empty(driver, fields, tracer);
    }

    tracer.log(
        &TraceEvent::new("scan_completed")
            .with_count(fields.len())
            .with_fingerprint(&scan_fingerprint(&fields)),
    );
    fields
}

/// Re-read live values after the merge and drop anything already filled.
fn retain_empty(
    driver: &mut dyn PageDriver,
    fields: Vec<FieldDescriptor>,
    tracer: &TraceLogger,
) -> Vec<FieldDescriptor> {
    let mut out = Vec::new();
    for mut field in fields {
        // Group selectors list every member; the first member's read is not
        // the group's state, so groups are judged by their scanned options.
        if field.is_group {
            let any_selected = field.options.iter().any(|o| o.selected);
            if !any_selected {
                out.push(field);
            }
            continue;
        }
        let first_selector = field.selector.split(", ").next().unwrap_or(&field.selector);
        match driver.read_value(first_selector) {
            Ok(Some(live)) => {
                if live.is_empty() {
                    field.value = live;
                    out.push(field);
                }
            }
            Ok(None) => {
                // Gone from the document; nothing left to fill.
            }
            Err(e) => {
                tracer.log(
                    &TraceEvent::new("empty_filter_read_failed")
                        .with_field(&field.id)
                        .with_detail(&e),
                );
                out.push(field);
            }
        }
    }
    out
}
