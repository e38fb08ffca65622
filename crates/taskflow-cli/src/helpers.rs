//! Shared helper functions used across CLI subcommands.
//!
//! Includes tracing initialization, LLM provider resolution, and environment
//! variable utilities.

use std::time::Duration;

use anyhow::{Result, bail};
use tracing::info;
use tracing_subscriber::EnvFilter;

use taskflow_agent::LlmClientConfig;

use crate::config::LlmSection;

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

/// Initialize the tracing subscriber with the given default log level.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

// ---------------------------------------------------------------------------
// LLM provider resolution
// ---------------------------------------------------------------------------

const DEFAULT_MODEL_OLLAMA: &str = "qwen2.5:latest";
const OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";

/// How to reach one hosted provider.
struct ProviderSpec {
    name: &'static str,
    aliases: &'static [&'static str],
    key_var: &'static str,
    default_model: &'static str,
    /// `None` for providers with a native constructor.
    base_url: Option<&'static str>,
}

/// Hosted providers in auto-detection order.
const PROVIDERS: &[ProviderSpec] = &[
    ProviderSpec {
        name: "anthropic",
        aliases: &["claude"],
        key_var: "ANTHROPIC_API_KEY",
        default_model: "claude-sonnet-4-20250514",
        base_url: None,
    },
    ProviderSpec {
        name: "openai",
        aliases: &["gpt"],
        key_var: "OPENAI_API_KEY",
        default_model: "gpt-4o",
        base_url: None,
    },
    ProviderSpec {
        name: "deepseek",
        aliases: &[],
        key_var: "DEEPSEEK_API_KEY",
        default_model: "deepseek-chat",
        base_url: Some("https://api.deepseek.com/v1"),
    },
    ProviderSpec {
        name: "google",
        aliases: &["gemini"],
        key_var: "GOOGLE_API_KEY",
        default_model: "gemini-2.5-flash",
        base_url: Some("https://generativelanguage.googleapis.com/v1beta/openai"),
    },
    ProviderSpec {
        name: "openrouter",
        aliases: &[],
        key_var: "OPENROUTER_API_KEY",
        default_model: "anthropic/claude-sonnet-4",
        base_url: Some("https://openrouter.ai/api/v1"),
    },
    ProviderSpec {
        name: "groq",
        aliases: &[],
        key_var: "GROQ_API_KEY",
        default_model: "llama-3.3-70b-versatile",
        base_url: Some("https://api.groq.com/openai/v1"),
    },
];

impl ProviderSpec {
    fn matches(&self, name: &str) -> bool {
        self.name == name || self.aliases.contains(&name)
    }

    fn build(&self, key: String, model: Option<String>, base_url: Option<String>) -> LlmClientConfig {
        let model = model.unwrap_or_else(|| self.default_model.to_owned());
        match (self.name, self.base_url) {
            ("anthropic", _) => {
                let mut cfg = LlmClientConfig::anthropic(key, model);
                if let Some(url) = base_url {
                    cfg.base_url = url;
                }
                cfg
            }
            (_, Some(default_base)) => LlmClientConfig::openai_compatible(
                key,
                model,
                base_url.unwrap_or_else(|| default_base.to_owned()),
            ),
            (_, None) => match base_url {
                Some(url) => LlmClientConfig::openai_compatible(key, model, url),
                None => LlmClientConfig::openai(key, model),
            },
        }
    }
}

/// Resolve which LLM provider, API key, and model to use.
///
/// `TASKFLOW_PROVIDER`, `TASKFLOW_MODEL` and `TASKFLOW_API_BASE_URL` override
/// the `[llm]` section. With a provider named, its API key must be set.
/// Without one, the first provider whose key is present wins, and a local
/// Ollama endpoint is the last resort.
///
/// `env` looks up environment variables; pass [`env_non_empty`] outside tests.
pub fn resolve_llm_config(
    llm: &LlmSection,
    env: impl Fn(&str) -> Option<String>,
) -> Result<LlmClientConfig> {
    let provider = env("TASKFLOW_PROVIDER").or_else(|| llm.provider.clone());
    let model = env("TASKFLOW_MODEL").or_else(|| llm.model.clone());
    let base_url = env("TASKFLOW_API_BASE_URL").or_else(|| llm.base_url.clone());

    let ollama = |model: Option<String>, base_url: Option<String>| {
        LlmClientConfig::openai_compatible(
            "ollama",
            model.unwrap_or_else(|| DEFAULT_MODEL_OLLAMA.to_owned()),
            base_url.unwrap_or_else(|| OLLAMA_BASE_URL.to_owned()),
        )
    };

    let config = match provider.map(|p| p.to_lowercase()) {
        // 1. Explicit provider selection.
        Some(name) => {
            if let Some(spec) = PROVIDERS.iter().find(|s| s.matches(&name)) {
                let Some(key) = env(spec.key_var) else {
                    bail!(
                        "{} provider selected but no API key found; set {}",
                        spec.name,
                        spec.key_var
                    );
                };
                spec.build(key, model, base_url)
            } else if name == "ollama" || name == "local" {
                ollama(model, base_url)
            } else {
                let Some(base) = base_url else {
                    bail!("TASKFLOW_API_BASE_URL is required for provider '{name}'");
                };
                let key = env("TASKFLOW_API_KEY")
                    .or_else(|| env("OPENAI_API_KEY"))
                    .unwrap_or_else(|| "no-key".to_owned());
                LlmClientConfig::openai_compatible(key, model.unwrap_or(name), base)
            }
        }
        // 2. Auto-detect from available credentials.
        None => match PROVIDERS
            .iter()
            .find_map(|spec| env(spec.key_var).map(|key| (spec, key)))
        {
            Some((spec, key)) => {
                info!(provider = spec.name, "provider detected from environment");
                spec.build(key, model, base_url)
            }
            // 3. Last resort: local Ollama, no key needed.
            None => {
                info!("no API key found, falling back to Ollama local model");
                ollama(model, base_url)
            }
        },
    };

    Ok(config
        .with_timeout(Duration::from_secs(llm.timeout_secs))
        .with_max_tokens(llm.max_tokens))
}

/// Read a non-empty environment variable, returning `None` if unset or empty.
pub fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
