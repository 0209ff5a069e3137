use clap::Parser;
use formfill::cli::config::{load_config, AppConfig, Cli, Commands};

// ============================================================================
// CLI Argument Parsing Tests
// ============================================================================

#[test]
fn cli_parse_detect_minimal() {
    let cli = Cli::parse_from(["formfill", "detect", "--url", "https://example.com/apply"]);
    match cli.command {
        Commands::Detect { url, empty_only } => {
            assert_eq!(url, "https://example.com/apply");
            assert!(!empty_only);
        }
        _ => panic!("Expected Detect command"),
    }
    assert_eq!(cli.verbose, 0);
    assert!(cli.trace.is_none());
}

#[test]
fn cli_parse_detect_empty_only() {
    let cli = Cli::parse_from([
        "formfill",
        "detect",
        "--url",
        "https://example.com",
        "--empty-only",
    ]);
    match cli.command {
        Commands::Detect { empty_only, .. } => assert!(empty_only),
        _ => panic!("Expected Detect command"),
    }
}

#[test]
fn cli_parse_fill() {
    let cli = Cli::parse_from([
        "formfill",
        "fill",
        "--url",
        "https://example.com",
        "--answers",
        "answers.json",
        "-v",
    ]);
    match cli.command {
        Commands::Fill { url, answers } => {
            assert_eq!(url, "https://example.com");
            assert_eq!(answers, "answers.json");
        }
        _ => panic!("Expected Fill command"),
    }
    assert_eq!(cli.verbose, 1);
}

#[test]
fn cli_parse_apply_all_args() {
    let cli = Cli::parse_from([
        "formfill",
        "apply",
        "--url",
        "https://example.com",
        "--profile",
        "profile.json",
        "--job-text",
        "posting.txt",
        "--resume",
        "resume.pdf",
        "--provider",
        "llm",
        "--ollama-endpoint",
        "http://localhost:9999/api/generate",
        "--ollama-model",
        "llama3",
        "--host-script",
        "custom/host.js",
        "--trace",
        "run.jsonl",
    ]);
    match cli.command {
        Commands::Apply {
            url,
            profile,
            job_text,
            resume,
            provider,
        } => {
            assert_eq!(url, "https://example.com");
            assert_eq!(profile, "profile.json");
            assert_eq!(job_text.as_deref(), Some("posting.txt"));
            assert_eq!(resume.as_deref(), Some("resume.pdf"));
            assert_eq!(provider, "llm");
        }
        _ => panic!("Expected Apply command"),
    }
    assert_eq!(cli.ollama_endpoint.as_deref(), Some("http://localhost:9999/api/generate"));
    assert_eq!(cli.ollama_model.as_deref(), Some("llama3"));
    assert_eq!(cli.host_script.as_deref(), Some("custom/host.js"));
    assert_eq!(cli.trace.as_deref(), Some("run.jsonl"));
}

#[test]
fn cli_parse_apply_defaults_to_heuristic_provider() {
    let cli = Cli::parse_from([
        "formfill",
        "apply",
        "--url",
        "https://example.com",
        "--profile",
        "profile.json",
    ]);
    match cli.command {
        Commands::Apply { provider, resume, job_text, .. } => {
            assert_eq!(provider, "heuristic");
            assert!(resume.is_none());
            assert!(job_text.is_none());
        }
        _ => panic!("Expected Apply command"),
    }
}

// ============================================================================
// Config File Tests
// ============================================================================

#[test]
fn config_defaults_match_engine_timing() {
    let config = AppConfig::default();
    assert_eq!(config.host.script, "scripts/page_host.js");
    assert_eq!(config.timing.poll_ms, 40);
    assert_eq!(config.timing.expand_budget_ms, 600);
    assert_eq!(config.timing.settle_max_wait_ms, 8000);
    assert!(config.ollama.endpoint.is_none());

    let timing = config.timing.to_timing();
    assert_eq!(timing.attempt_settle_ms, 80);
    assert_eq!(timing.option_wait_ms, 400);
}

#[test]
fn config_missing_file_falls_back_to_defaults() {
    let config = load_config(Some("/nonexistent/formfill.yaml"));
    assert_eq!(config.timing.poll_ms, 40);
}

#[test]
fn config_partial_yaml_fills_in_defaults() {
    let dir = std::env::temp_dir().join("formfill-config-test");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(format!("config-{}.yaml", std::process::id()));
    std::fs::write(
        &path,
        "timing:\n  settle_max_wait_ms: 2000\nollama:\n  model: llama3\n",
    )
    .unwrap();

    let config = load_config(Some(path.to_string_lossy().as_ref()));
    assert_eq!(config.timing.settle_max_wait_ms, 2000);
    assert_eq!(config.timing.poll_ms, 40, "unspecified keys keep defaults");
    assert_eq!(config.ollama.model.as_deref(), Some("llama3"));
    assert_eq!(config.host.script, "scripts/page_host.js");

    std::fs::remove_file(&path).ok();
}

#[test]
fn config_malformed_yaml_falls_back_to_defaults() {
    let dir = std::env::temp_dir().join("formfill-config-test");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(format!("bad-{}.yaml", std::process::id()));
    std::fs::write(&path, "timing: [this is not a map").unwrap();

    let config = load_config(Some(path.to_string_lossy().as_ref()));
    assert_eq!(config.timing.poll_ms, 40);

    std::fs::remove_file(&path).ok();
}
