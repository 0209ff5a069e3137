use crate::answers::answer_model::{AnswerSet, AnswerValue};
use crate::detect::field_model::{FieldDescriptor, FieldType};
use crate::dom::dom_model::node_selector;
use crate::error::EngineError;
use crate::fill::fill_model::{FillReport, FillResult};
use crate::page::driver::PageDriver;
use crate::page::wait::{wait_for, Timing};
use crate::trace::logger::TraceLogger;
use crate::trace::trace::TraceEvent;
use crate::widget::expand::OPTION_SURFACE_SELECTOR;

/// Filler written into text-like fields when the collaborator produced no
/// real value. Site validators reject untouched required fields harder than
/// an explicit placeholder.
pub const EMPTY_TEXT_SENTINEL: &str = "n/a";

// ============================================================================
// Batch fill
// ============================================================================

/// Fill every answered field, aggregating per-field outcomes. One field
/// failing never affects its siblings, and the report is always produced.
pub fn fill_form(
    driver: &mut dyn PageDriver,
    fields: &[FieldDescriptor],
    answers: &AnswerSet,
    timing: &Timing,
    tracer: &TraceLogger,
) -> FillReport {
    let mut report = FillReport::default();

    for field in fields {
        let result = match answers.get(&field.id) {
            Some(answer) => fill_field(driver, field, answer, timing),
            None => FillResult::Skipped,
        };
        tracer.log(
            &TraceEvent::new("field_filled")
                .with_field(&field.id)
                .with_ok(result.is_filled())
                .with_detail(match &result {
                    FillResult::Failed(reason) => reason.as_str(),
                    FillResult::Skipped => "skipped",
                    FillResult::Filled => "ok",
                }),
        );
        report.record(&field.id, &field.label, &result);
    }

    tracer.log(
        &TraceEvent::new("fill_completed")
            .with_count(report.filled_count)
            .with_ok(report.all_ok()),
    );
    report
}

// ============================================================================
// Single-field fill
// ============================================================================

/// Normalize the answer for the field's type and write it into the
/// document. Driver-level faults degrade to a failed result; this never
/// panics and never propagates an error.
pub fn fill_field(
    driver: &mut dyn PageDriver,
    field: &FieldDescriptor,
    answer: &AnswerValue,
    timing: &Timing,
) -> FillResult {
    match try_fill(driver, field, answer, timing) {
        Ok(result) => result,
        Err(e) => FillResult::Failed(format!("driver error: {}", e)),
    }
}

fn try_fill(
    driver: &mut dyn PageDriver,
    field: &FieldDescriptor,
    answer: &AnswerValue,
    timing: &Timing,
) -> Result<FillResult, EngineError> {
    // Selection-capable types preserve emptiness: no selection is a valid
    // answer and nothing is written.
    if field.field_type.is_selection() && answer.is_empty() {
        return Ok(FillResult::Skipped);
    }

    match field.field_type {
        FieldType::Text
        | FieldType::Email
        | FieldType::Tel
        | FieldType::Url
        | FieldType::Password
        | FieldType::Number
        | FieldType::Date
        | FieldType::Datetime
        | FieldType::Time
        | FieldType::Month
        | FieldType::Week
        | FieldType::Textarea
        | FieldType::Search
        | FieldType::Range
        | FieldType::Color => fill_text(driver, field, answer),
        FieldType::File => fill_file(driver, field, answer),
        FieldType::Checkbox | FieldType::Radio => fill_toggle(driver, field, answer),
        FieldType::RadioGroup => fill_radio_group(driver, field, answer),
        FieldType::CheckboxGroup => fill_checkbox_group(driver, field, answer),
        FieldType::Select | FieldType::MultiSelect => fill_select(driver, field, answer),
        FieldType::CustomDropdown => fill_custom_dropdown(driver, field, answer, timing),
    }
}

// ============================================================================
// Normalization
// ============================================================================

/// Text rendering of an answer for text-like fields: booleans become
/// "true"/"false", empties become the `"n/a"` sentinel.
pub fn normalize_text_answer(answer: &AnswerValue) -> String {
    if answer.is_empty() {
        return EMPTY_TEXT_SENTINEL.to_string();
    }
    match answer {
        AnswerValue::Flag(b) => b.to_string(),
        AnswerValue::Text(s) => s.trim().to_string(),
        AnswerValue::Many(items) => items.join(", "),
    }
}

fn answer_truthy(answer: &AnswerValue) -> bool {
    match answer {
        AnswerValue::Flag(b) => *b,
        AnswerValue::Text(s) => {
            let lower = s.trim().to_lowercase();
            matches!(lower.as_str(), "true" | "yes" | "y" | "1" | "on" | "checked")
        }
        AnswerValue::Many(items) => !items.is_empty(),
    }
}

/// Selections for multi-valued answers: a list passes through; a string is
/// parsed as a JSON array when it looks like one, else comma-split.
pub fn answer_selections(answer: &AnswerValue) -> Vec<String> {
    match answer {
        AnswerValue::Many(items) => items.iter().map(|s| s.trim().to_string()).collect(),
        AnswerValue::Text(s) => {
            let trimmed = s.trim();
            if trimmed.starts_with('[') {
                if let Ok(parsed) = serde_json::from_str::<Vec<String>>(trimmed) {
                    return parsed.iter().map(|v| v.trim().to_string()).collect();
                }
            }
            trimmed
                .split(',')
                .map(|part| part.trim().to_string())
                .filter(|part| !part.is_empty())
                .collect()
        }
        AnswerValue::Flag(_) => Vec::new(),
    }
}

// ============================================================================
// Per-type strategies
// ============================================================================

fn fill_text(
    driver: &mut dyn PageDriver,
    field: &FieldDescriptor,
    answer: &AnswerValue,
) -> Result<FillResult, EngineError> {
    let value = normalize_text_answer(answer);
    if driver.set_value(&field.selector, &value)? {
        Ok(FillResult::Filled)
    } else {
        Ok(not_found(field))
    }
}

fn fill_file(
    driver: &mut dyn PageDriver,
    field: &FieldDescriptor,
    answer: &AnswerValue,
) -> Result<FillResult, EngineError> {
    let path = match answer {
        AnswerValue::Text(s) if !s.trim().is_empty() => s.trim().to_string(),
        _ => return Ok(FillResult::Skipped),
    };
    if driver.upload(&field.selector, &path)? {
        Ok(FillResult::Filled)
    } else {
        Ok(not_found(field))
    }
}

fn fill_toggle(
    driver: &mut dyn PageDriver,
    field: &FieldDescriptor,
    answer: &AnswerValue,
) -> Result<FillResult, EngineError> {
    let checked = answer_truthy(answer);
    if driver.set_checked(&field.selector, checked)? {
        Ok(FillResult::Filled)
    } else {
        Ok(not_found(field))
    }
}

/// Member selectors of a synthesized group, aligned with its options.
fn member_selectors(field: &FieldDescriptor) -> Vec<&str> {
    field.selector.split(", ").collect()
}

fn option_matches(option_value: &str, option_label: &str, wanted: &str) -> bool {
    option_value.eq_ignore_ascii_case(wanted) || option_label.eq_ignore_ascii_case(wanted)
}

fn fill_radio_group(
    driver: &mut dyn PageDriver,
    field: &FieldDescriptor,
    answer: &AnswerValue,
) -> Result<FillResult, EngineError> {
    let wanted = match answer {
        AnswerValue::Text(s) => s.trim().to_string(),
        AnswerValue::Many(items) => items.first().cloned().unwrap_or_default(),
        AnswerValue::Flag(_) => return Ok(FillResult::Failed("boolean answer for a radio group".into())),
    };

    let selectors = member_selectors(field);
    for (i, option) in field.options.iter().enumerate() {
        if option_matches(&option.value, &option.label, &wanted) {
            let Some(selector) = selectors.get(i) else {
                break;
            };
            return if driver.set_checked(selector, true)? {
                Ok(FillResult::Filled)
            } else {
                Ok(not_found(field))
            };
        }
    }
    Ok(FillResult::Failed(format!("no option matching '{}'", wanted)))
}

fn fill_checkbox_group(
    driver: &mut dyn PageDriver,
    field: &FieldDescriptor,
    answer: &AnswerValue,
) -> Result<FillResult, EngineError> {
    let wanted = answer_selections(answer);
    if wanted.is_empty() {
        return Ok(FillResult::Skipped);
    }

    let selectors = member_selectors(field);
    let mut toggled = 0;
    for (i, option) in field.options.iter().enumerate() {
        let matched = wanted
            .iter()
            .any(|w| option_matches(&option.value, &option.label, w));
        if !matched {
            continue; // only matching members are touched
        }
        if let Some(selector) = selectors.get(i) {
            if driver.set_checked(selector, true)? {
                toggled += 1;
            }
        }
    }

    if toggled > 0 {
        Ok(FillResult::Filled)
    } else {
        Ok(FillResult::Failed(format!(
            "no options matching {:?}",
            wanted
        )))
    }
}

/// Match an answer against a select's options: exact value first, then
/// substring of the option text, then a numeric index when the answer
/// parses as one in range.
pub fn match_select_option(field: &FieldDescriptor, wanted: &str) -> Option<String> {
    let trimmed = wanted.trim();
    if let Some(option) = field
        .options
        .iter()
        .find(|o| o.value.eq_ignore_ascii_case(trimmed))
    {
        return Some(option.value.clone());
    }
    let lower = trimmed.to_lowercase();
    if let Some(option) = field
        .options
        .iter()
        .find(|o| o.label.to_lowercase().contains(&lower))
    {
        return Some(option.value.clone());
    }
    if let Ok(index) = trimmed.parse::<usize>() {
        if index < field.options.len() {
            return Some(field.options[index].value.clone());
        }
    }
    None
}

fn fill_select(
    driver: &mut dyn PageDriver,
    field: &FieldDescriptor,
    answer: &AnswerValue,
) -> Result<FillResult, EngineError> {
    let wanted_list: Vec<String> = match field.field_type {
        FieldType::MultiSelect => answer_selections(answer),
        _ => vec![normalize_select_answer(answer)],
    };

    let mut resolved = Vec::new();
    for wanted in &wanted_list {
        if let Some(value) = match_select_option(field, wanted) {
            if !resolved.contains(&value) {
                resolved.push(value);
            }
        }
    }

    if resolved.is_empty() {
        return Ok(FillResult::Failed(format!(
            "no options matching {:?}",
            wanted_list
        )));
    }
    if driver.select_values(&field.selector, &resolved)? {
        Ok(FillResult::Filled)
    } else {
        Ok(not_found(field))
    }
}

fn normalize_select_answer(answer: &AnswerValue) -> String {
    match answer {
        AnswerValue::Text(s) => s.trim().to_string(),
        AnswerValue::Many(items) => items.first().cloned().unwrap_or_default(),
        AnswerValue::Flag(b) => b.to_string(),
    }
}

fn fill_custom_dropdown(
    driver: &mut dyn PageDriver,
    field: &FieldDescriptor,
    answer: &AnswerValue,
    timing: &Timing,
) -> Result<FillResult, EngineError> {
    let wanted = normalize_select_answer(answer).to_lowercase();

    // Native activation first, then the same mutation-driven wait the
    // expansion protocol uses. The wait's deadline check doubles as the
    // bounded last-chance match.
    if !driver.click(&field.selector)? {
        return Ok(not_found(field));
    }
    wait_for(driver, timing.option_wait_ms, timing.poll_ms, true, |d| {
        d.query_visible(OPTION_SURFACE_SELECTOR)
    })?;

    let expanded = driver.snapshot()?;
    let candidate = expanded
        .find_all(|n| {
            n.visible
                && (n.role() == Some("option")
                    || n.tag == "option"
                    || n.class_contains("option"))
        })
        .into_iter()
        // A native select's options are filled through select_values, never
        // by clicking; they must not be mistaken for this widget's menu.
        .filter(|&idx| {
            expanded
                .closest(idx, |n| n.tag == "select" || n.tag == "datalist")
                .is_none()
        })
        .find(|&idx| {
            expanded
                .subtree_text(idx, 120)
                .to_lowercase()
                .contains(&wanted)
        });

    match candidate {
        Some(idx) => {
            if driver.click(&node_selector(idx))? {
                Ok(FillResult::Filled)
            } else {
                Ok(FillResult::Failed("option vanished before click".into()))
            }
        }
        None => Ok(FillResult::Failed(format!(
            "no visible option containing '{}'",
            wanted
        ))),
    }
}

fn not_found(field: &FieldDescriptor) -> FillResult {
    crate::trace::logger::warn(&format!(
        "fill target '{}' not found on the live document",
        field.selector
    ));
    FillResult::Failed(format!("selector '{}' resolved nothing", field.selector))
}
