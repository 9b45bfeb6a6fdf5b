//! Embeddings command implementation.
//!
//! - `status` - provider availability, configuration, and catalog coverage
//! - `configure` - persist provider settings
//! - `test` - embed a sample text end to end

use std::path::PathBuf;

use colored::Colorize;
use serde::Serialize;

use crate::cli::EmbeddingsCommands;
use crate::config::resolve_db_path;
use crate::embeddings::{
    create_embedding_provider, detect_available_providers, get_embedding_settings,
    is_embeddings_enabled, reset_embedding_settings, resolve_hf_model, resolve_ollama_model,
    save_embedding_settings, EmbeddingProvider, EmbeddingProviderType, EmbeddingSettings,
};
use crate::error::{Error, Result};
use crate::storage::{CatalogStats, SqliteCatalog};

use super::runtime;

#[derive(Serialize)]
struct StatusOutput {
    enabled: bool,
    configured_provider: Option<EmbeddingProviderType>,
    available_providers: Vec<ProviderStatus>,
    active_provider: Option<ActiveProviderInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    catalog: Option<CatalogStats>,
}

#[derive(Serialize)]
struct ProviderStatus {
    name: EmbeddingProviderType,
    available: bool,
    model: String,
}

#[derive(Serialize)]
struct ActiveProviderInfo {
    name: String,
    model: String,
    dimensions: usize,
    max_chars: usize,
}

#[derive(Serialize)]
struct TestOutput {
    success: bool,
    provider: String,
    model: String,
    dimensions: usize,
    input_text: String,
    embedding_sample: Vec<f32>,
}

#[derive(Serialize)]
struct ConfigureOutput {
    success: bool,
    message: String,
    settings: EmbeddingSettings,
}

/// Execute an embeddings subcommand.
///
/// # Errors
///
/// Returns an error if settings cannot be read or written, or the provider
/// test fails.
pub fn execute(command: &EmbeddingsCommands, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let rt = runtime()?;
    rt.block_on(async {
        match command {
            EmbeddingsCommands::Status => execute_status(db_path, json).await,
            EmbeddingsCommands::Configure {
                provider,
                enable,
                disable,
                model,
                endpoint,
                token,
                reset,
            } => {
                if *reset {
                    return execute_reset(json);
                }
                let update = build_update(provider.as_deref(), *enable, *disable, model, endpoint, token)?;
                execute_configure(db_path, update, json).await
            }
            EmbeddingsCommands::Test { text } => execute_test(text, json).await,
        }
    })
}

fn catalog_stats(db_path: Option<&PathBuf>) -> Option<CatalogStats> {
    let path = resolve_db_path(db_path.map(PathBuf::as_path))?;
    if !path.exists() {
        return None;
    }
    SqliteCatalog::open(&path).ok()?.catalog_stats().ok()
}

async fn execute_status(db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let enabled = is_embeddings_enabled();
    let configured_provider = get_embedding_settings().ok().flatten().and_then(|s| s.provider);
    let detection = detect_available_providers().await;
    let active = if enabled { create_embedding_provider().await } else { None };

    let available_providers = vec![
        ProviderStatus {
            name: EmbeddingProviderType::Ollama,
            available: detection.available.contains(&EmbeddingProviderType::Ollama),
            model: resolve_ollama_model(),
        },
        ProviderStatus {
            name: EmbeddingProviderType::Huggingface,
            available: detection.available.contains(&EmbeddingProviderType::Huggingface),
            model: resolve_hf_model(),
        },
    ];
    let active_provider = active.as_ref().map(|p| {
        let info = p.info();
        ActiveProviderInfo {
            name: info.name,
            model: info.model,
            dimensions: info.dimensions,
            max_chars: info.max_chars,
        }
    });

    let output = StatusOutput {
        enabled,
        configured_provider,
        available_providers,
        active_provider,
        catalog: catalog_stats(db_path),
    };

    if json {
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    println!("{}", "Embeddings Status".bold());
    println!();
    println!("Enabled: {}", if output.enabled { "yes".green() } else { "no".red() });
    if let Some(p) = output.configured_provider {
        println!("Configured Provider: {p}");
    }
    println!();

    println!("Providers:");
    for p in &output.available_providers {
        let mark = if p.available { "✓".green() } else { "✗".red() };
        println!("  {mark} {} ({})", p.name, p.model);
    }
    println!();

    if let Some(active) = &output.active_provider {
        println!("Active Provider:");
        println!("  Name:       {}", active.name);
        println!("  Model:      {}", active.model);
        println!("  Dimensions: {}", active.dimensions);
        println!("  Max Chars:  {}", active.max_chars);
    } else if output.enabled {
        println!("No embedding provider available. Semantic search is off.");
        println!();
        println!("To enable it:");
        println!("  - Install Ollama: https://ollama.ai");
        println!("  - Or set the HF_TOKEN environment variable");
    }

    if let Some(stats) = &output.catalog {
        println!();
        println!("Catalog:");
        println!("  Embedded: {}", stats.embedded);
        println!("  Pending:  {}", stats.pending);
        if stats.pending > 0 {
            println!();
            println!("Run 'sfs catalog embed' to compute missing embeddings.");
        }
    }

    Ok(())
}

/// Turn `configure` flags into a partial settings update.
///
/// Model and endpoint apply to the provider named in the same call, else
/// Ollama.
fn build_update(
    provider: Option<&str>,
    enable: bool,
    disable: bool,
    model: &Option<String>,
    endpoint: &Option<String>,
    token: &Option<String>,
) -> Result<(EmbeddingSettings, Vec<&'static str>)> {
    if enable && disable {
        return Err(Error::InvalidArgument(
            "Cannot specify both --enable and --disable".to_string(),
        ));
    }

    let mut update = EmbeddingSettings::default();
    let mut messages = Vec::new();

    if enable || disable {
        update.enabled = Some(enable);
        messages.push(if enable { "Embeddings enabled" } else { "Embeddings disabled" });
    }

    if let Some(p) = provider {
        let provider_type: EmbeddingProviderType = p.parse().map_err(|_| {
            Error::InvalidArgument(format!("Unknown provider: {p}. Valid options: ollama, huggingface"))
        })?;
        update.provider = Some(provider_type);
        messages.push("Provider configured");
    }

    let target = update.provider.unwrap_or(EmbeddingProviderType::Ollama);
    if let Some(m) = model {
        match target {
            EmbeddingProviderType::Ollama => update.OLLAMA_MODEL = Some(m.clone()),
            EmbeddingProviderType::Huggingface => update.HF_MODEL = Some(m.clone()),
        }
        messages.push("Model configured");
    }
    if let Some(e) = endpoint {
        match target {
            EmbeddingProviderType::Ollama => update.OLLAMA_ENDPOINT = Some(e.clone()),
            EmbeddingProviderType::Huggingface => update.HF_ENDPOINT = Some(e.clone()),
        }
        messages.push("Endpoint configured");
    }
    if let Some(t) = token {
        update.HF_TOKEN = Some(t.clone());
        messages.push("Token configured");
    }

    Ok((update, messages))
}

async fn execute_configure(
    db_path: Option<&PathBuf>,
    (update, messages): (EmbeddingSettings, Vec<&'static str>),
    json: bool,
) -> Result<()> {
    if messages.is_empty() {
        return execute_status(db_path, json).await;
    }

    save_embedding_settings(&update)?;
    let mut settings = get_embedding_settings()?.unwrap_or_default();
    settings.HF_TOKEN = settings.HF_TOKEN.map(|_| "********".to_string());
    let message = messages.join(", ");

    if json {
        let output = ConfigureOutput { success: true, message, settings };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("Configuration updated: {message}");
        println!();
        execute_status(db_path, false).await?;
    }
    Ok(())
}

fn execute_reset(json: bool) -> Result<()> {
    reset_embedding_settings()?;
    if json {
        println!("{}", serde_json::json!({ "success": true, "message": "Embedding settings reset" }));
    } else {
        println!("Embedding settings reset");
    }
    Ok(())
}

async fn execute_test(text: &str, json: bool) -> Result<()> {
    let provider = create_embedding_provider().await.ok_or_else(|| {
        Error::Embedding("No embedding provider available. Start Ollama or set HF_TOKEN.".into())
    })?;
    let info = provider.info();
    let embedding = provider.embed(text).await?;

    let output = TestOutput {
        success: true,
        provider: info.name,
        model: info.model,
        dimensions: embedding.len(),
        input_text: text.to_string(),
        embedding_sample: embedding.iter().take(5).copied().collect(),
    };

    if json {
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("{} {} ({})", "✓".green(), output.provider, output.model);
        println!("  Input:      {}", output.input_text);
        println!("  Dimensions: {}", output.dimensions);
        println!("  Sample:     {:?}", output.embedding_sample);
    }
    Ok(())
}
