pub mod answers;
pub mod cli;
pub mod detect;
pub mod dom;
pub mod error;
pub mod fill;
pub mod page;
pub mod settle;
pub mod trace;
pub mod widget;

use crate::{
    answers::answer_model::AnswerSet,
    detect::{
        discover::{discover, DiscoverOptions},
        field_model::FieldDescriptor,
    },
    fill::{engine::fill_form, fill_model::FillReport},
    page::{driver::PageDriver, wait::Timing},
    trace::logger::TraceLogger,
};

/// One full engine pass over an already-navigated page: scan it, then write
/// the given answers back. Library entry point for embedders that bring
/// their own driver and answers.
pub fn run_fill(
    driver: &mut dyn PageDriver,
    answers: &AnswerSet,
    timing: &Timing,
    tracer: &TraceLogger,
) -> (Vec<FieldDescriptor>, FillReport) {
    let fields = discover(driver, &DiscoverOptions::default(), timing, tracer);
    let report = fill_form(driver, &fields, answers, timing, tracer);
    (fields, report)
}
