//! hrgen — generate HR job profile JSON documents from the command line.
//!
//! Shares the generation core with the HTTP service; reads the Groq
//! credential from the environment (or a .env file) like the service does.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{ArgGroup, Parser};

use api::llm_client::LlmError;
use api::profile::generator::{
    generate_profile, GenerationRequest, ProfileError, DEFAULT_MAX_TOKENS, DEFAULT_MODEL,
    DEFAULT_RETRIES, DEFAULT_TEMPERATURE, DEFAULT_TIMEOUT_SECS,
};
use api::profile::schema::load_schema_file;

/// Generate HR profile JSON structures using Groq Cloud models.
#[derive(Debug, Parser)]
#[command(name = "hrgen", version, about)]
#[command(group(ArgGroup::new("prompt_source").required(true).args(["prompt", "prompt_file"])))]
struct Cli {
    /// Natural-language instructions describing the desired HR profile.
    #[arg(short, long)]
    prompt: Option<String>,

    /// Path to a file containing the prompt.
    #[arg(long)]
    prompt_file: Option<PathBuf>,

    /// Optional path to a JSON template representing the desired output structure.
    #[arg(long)]
    schema: Option<PathBuf>,

    /// Groq model to use.
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Sampling temperature.
    #[arg(long, default_value_t = DEFAULT_TEMPERATURE)]
    temperature: f32,

    /// Maximum tokens to generate.
    #[arg(long, default_value_t = DEFAULT_MAX_TOKENS)]
    max_tokens: u32,

    /// Retry attempts if the model response is not valid JSON.
    #[arg(long, default_value_t = DEFAULT_RETRIES, value_parser = clap::value_parser!(u32).range(0..=5))]
    retries: u32,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: f64,

    /// Optional file path to save the generated JSON.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Disable pretty-printing of JSON in stdout/output files.
    #[arg(long)]
    no_pretty: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) if is_configuration_error(&err) => {
            eprintln!("Configuration error: {err:#}");
            ExitCode::from(2)
        }
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn is_configuration_error(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<ProfileError>(),
        Some(ProfileError::Llm(
            LlmError::MissingApiKey | LlmError::Authentication
        ))
    )
}

async fn run(cli: Cli) -> Result<()> {
    if !cli.timeout.is_finite() || cli.timeout <= 0.0 {
        bail!("timeout must be a positive number of seconds");
    }

    let prompt = load_prompt(&cli)?;
    let schema = cli.schema.as_deref().map(load_schema_file).transpose()?;

    let request = GenerationRequest {
        prompt,
        schema,
        model: cli.model.clone(),
        temperature: cli.temperature,
        max_tokens: cli.max_tokens,
        retries: cli.retries,
        timeout: cli.timeout,
    };
    let result = generate_profile(request, None).await?;

    let output_text = if cli.no_pretty {
        result.raw
    } else {
        serde_json::to_string_pretty(&result.profile)?
    };

    if let Some(path) = &cli.output {
        std::fs::write(path, &output_text)
            .with_context(|| format!("failed to write output to {}", path.display()))?;
    }
    println!("{output_text}");

    Ok(())
}

fn load_prompt(cli: &Cli) -> Result<String> {
    let prompt = match (&cli.prompt, &cli.prompt_file) {
        (Some(text), None) => text.trim().to_string(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("prompt file not found: {}", path.display()))?
            .trim()
            .to_string(),
        _ => unreachable!("clap enforces exactly one prompt source"),
    };
    if prompt.is_empty() {
        bail!("the prompt is empty");
    }
    Ok(prompt)
}
