use clap::Parser;
use formfill::cli::commands::{cmd_apply, cmd_detect, cmd_fill};
use formfill::cli::config::{load_config, Cli, Commands};
use formfill::trace::logger::TraceLogger;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());

    // Resolve settings: CLI > config > defaults
    let ollama_endpoint = cli
        .ollama_endpoint
        .as_deref()
        .or(config.ollama.endpoint.as_deref());
    let ollama_model = cli
        .ollama_model
        .as_deref()
        .or(config.ollama.model.as_deref());
    let host_script = cli
        .host_script
        .as_deref()
        .unwrap_or(&config.host.script)
        .to_string();
    let timing = config.timing.to_timing();
    let tracer = match cli.trace.as_deref() {
        Some(path) => TraceLogger::new(path),
        None => TraceLogger::disabled(),
    };

    match cli.command {
        Commands::Detect { url, empty_only } => {
            cmd_detect(&url, empty_only, &host_script, &timing, &tracer, cli.verbose)?;
        }
        Commands::Fill { url, answers } => {
            let all_ok = cmd_fill(&url, &answers, &host_script, &timing, &tracer, cli.verbose)?;
            if !all_ok {
                std::process::exit(1);
            }
        }
        Commands::Apply {
            url,
            profile,
            job_text,
            resume,
            provider,
        } => {
            let all_ok = cmd_apply(
                &url,
                &profile,
                job_text.as_deref(),
                resume.as_deref(),
                &provider,
                &host_script,
                ollama_endpoint,
                ollama_model,
                &timing,
                &tracer,
                cli.verbose,
            )?;
            if !all_ok {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
