use crate::answers::answer_model::AnswerSet;
use crate::answers::provider::{
    AnswerProvider, HeuristicAnswerProvider, LlmAnswerProvider,
};
use crate::detect::discover::{discover, DiscoverOptions};
use crate::detect::field_model::{FieldDescriptor, FieldType};
use crate::fill::engine::fill_form;
use crate::page::session::PageSession;
use crate::page::wait::Timing;
use crate::settle::waiter::{snapshot_empty_fields, wait_for_autofill_settle};
use crate::trace::logger::TraceLogger;

// ============================================================================
// detect subcommand
// ============================================================================

pub fn cmd_detect(
    url: &str,
    empty_only: bool,
    host_script: &str,
    timing: &Timing,
    tracer: &TraceLogger,
    verbose: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = PageSession::launch(host_script)?;
    session.navigate(url)?;

    if verbose > 0 {
        eprintln!("Scanning {} ...", url);
    }

    let opts = DiscoverOptions {
        filter_empty_only: empty_only,
    };
    let fields = discover(&mut session, &opts, timing, tracer);
    session.quit()?;

    println!("{}", serde_json::to_string_pretty(&fields)?);
    if verbose > 0 {
        eprintln!("Found {} fields", fields.len());
    }
    Ok(())
}

// ============================================================================
// fill subcommand
// ============================================================================

/// Fill from a prepared answers file. Returns whether every answered field
/// landed.
pub fn cmd_fill(
    url: &str,
    answers_path: &str,
    host_script: &str,
    timing: &Timing,
    tracer: &TraceLogger,
    verbose: u8,
) -> Result<bool, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(answers_path)?;
    let answers = AnswerSet::from_json_map(serde_json::from_str(&content)?)?;

    let mut session = PageSession::launch(host_script)?;
    session.navigate(url)?;

    let fields = discover(&mut session, &DiscoverOptions::default(), timing, tracer);
    if verbose > 0 {
        eprintln!("Found {} fields, {} answers", fields.len(), answers.len());
    }

    let report = fill_form(&mut session, &fields, &answers, timing, tracer);
    session.quit()?;

    print_report(&report, verbose);
    Ok(report.all_ok())
}

// ============================================================================
// apply subcommand
// ============================================================================

/// Scan, answer, and fill in one run. When a resume path is given and the
/// page exposes a file input, the upload happens first and the fill waits
/// out any autofill the upload triggered.
pub fn cmd_apply(
    url: &str,
    profile_path: &str,
    job_text_path: Option<&str>,
    resume_path: Option<&str>,
    provider_name: &str,
    host_script: &str,
    ollama_endpoint: Option<&str>,
    ollama_model: Option<&str>,
    timing: &Timing,
    tracer: &TraceLogger,
    verbose: u8,
) -> Result<bool, Box<dyn std::error::Error>> {
    let profile: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(profile_path)?)?;
    let job_text = match job_text_path {
        Some(path) => Some(std::fs::read_to_string(path)?),
        None => None,
    };
    let provider = build_provider(provider_name, ollama_endpoint, ollama_model);

    let mut session = PageSession::launch(host_script)?;
    session.navigate(url)?;

    let mut fields = discover(&mut session, &DiscoverOptions::default(), timing, tracer);
    if verbose > 0 {
        eprintln!("Found {} fields", fields.len());
    }

    if let Some(resume) = resume_path {
        if let Some(file_field) = fields.iter().find(|f| f.field_type == FieldType::File) {
            let prior = snapshot_empty_fields(&mut session, &fields)?;
            if session_upload(&mut session, file_field, resume)? {
                if verbose > 0 {
                    eprintln!("Uploaded {}, waiting for autofill to settle...", resume);
                }
                wait_for_autofill_settle(&mut session, &prior, timing, tracer)?;
                // Autofill may have populated fields; rescan for what's left.
                let opts = DiscoverOptions {
                    filter_empty_only: true,
                };
                fields = discover(&mut session, &opts, timing, tracer);
                if verbose > 0 {
                    eprintln!("{} fields still empty after settle", fields.len());
                }
            }
        }
    }

    let answers = provider.answer(&fields, &profile, job_text.as_deref());
    let report = fill_form(&mut session, &fields, &answers, timing, tracer);
    session.quit()?;

    print_report(&report, verbose);
    Ok(report.all_ok())
}

// ============================================================================
// Helpers
// ============================================================================

fn session_upload(
    session: &mut PageSession,
    field: &FieldDescriptor,
    path: &str,
) -> Result<bool, Box<dyn std::error::Error>> {
    use crate::page::driver::PageDriver;
    Ok(session.upload(&field.selector, path)?)
}

/// Build the appropriate AnswerProvider based on name.
fn build_provider(
    name: &str,
    ollama_endpoint: Option<&str>,
    ollama_model: Option<&str>,
) -> Box<dyn AnswerProvider> {
    match name {
        "llm" => {
            let endpoint = ollama_endpoint.unwrap_or("http://localhost:11434/api/generate");
            let model = ollama_model.unwrap_or("qwen2.5:1.5b");
            Box::new(LlmAnswerProvider::new(endpoint, model))
        }
        _ => Box::new(HeuristicAnswerProvider),
    }
}

fn print_report(report: &crate::fill::fill_model::FillReport, verbose: u8) {
    println!(
        "Filled {}, skipped {}, failed {}",
        report.filled_count, report.skipped_count, report.error_count
    );
    if verbose > 0 || !report.per_field_errors.is_empty() {
        for error in &report.per_field_errors {
            eprintln!("  [{}] {}: {}", error.id, error.label, error.reason);
        }
    }
}
