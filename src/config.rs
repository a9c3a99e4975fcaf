//! Server configuration sourced from environment variables.
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Top-level server configuration.
///
/// Environment variables:
/// - `BIND_ADDR` - listen address (default: `0.0.0.0:8080`)
/// - `LLM_PROVIDER` - `gemini` or `openai` (default: `gemini`)
/// - `GEMINI_API_KEY`, `OPENAI_API_KEY` - per-provider keys
/// - `LLM_BASE_URL` - overrides the provider endpoint host
/// - `LLM_TIMEOUT_SECS` - per-decision timeout (default: 20)
/// - `LLM_MAX_RETRIES` - retries on transient failures (default: 2)
/// - `LLM_RETRY_BACKOFF_MS` - wait between retries (default: 1000)
/// - `AI_WITCH_SAVE_PROBABILITY` (default: 0.7)
/// - `AI_WITCH_POISON_PROBABILITY` (default: 0.3)
/// - `AI_HUNTER_SHOOT_PROBABILITY` (default: 0.8)
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_addr: String,
    pub llm: LlmConfig,
    pub tuning: AiTuning,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            llm: LlmConfig::default(),
            tuning: AiTuning::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Unparseable
    /// values fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(addr) = read("BIND_ADDR") {
            config.bind_addr = addr;
        }

        if let Some(provider) = read("LLM_PROVIDER").and_then(|v| v.parse().ok()) {
            config.llm.provider = provider;
        }
        for provider in ProviderId::ALL {
            if let Some(key) = read(provider.key_variable()) {
                config.llm.api_keys.insert(provider, key);
            }
        }
        config.llm.base_url = read("LLM_BASE_URL");
        if let Some(secs) = parse::<u64>(read("LLM_TIMEOUT_SECS")) {
            config.llm.timeout = Duration::from_secs(secs.max(1));
        }
        if let Some(retries) = parse::<u32>(read("LLM_MAX_RETRIES")) {
            config.llm.retry.max_retries = retries;
        }
        if let Some(ms) = parse::<u64>(read("LLM_RETRY_BACKOFF_MS")) {
            config.llm.retry.backoff = Duration::from_millis(ms);
        }

        if let Some(p) = parse::<f64>(read("AI_WITCH_SAVE_PROBABILITY")) {
            config.tuning.witch_save_probability = clamp_probability(p);
        }
        if let Some(p) = parse::<f64>(read("AI_WITCH_POISON_PROBABILITY")) {
            config.tuning.witch_poison_probability = clamp_probability(p);
        }
        if let Some(p) = parse::<f64>(read("AI_HUNTER_SHOOT_PROBABILITY")) {
            config.tuning.hunter_shoot_probability = clamp_probability(p);
        }

        config
    }
}

/// Text-completion backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProviderId {
    Gemini,
    OpenAi,
}

impl ProviderId {
    pub const ALL: [ProviderId; 2] = [ProviderId::Gemini, ProviderId::OpenAi];

    fn key_variable(self) -> &'static str {
        match self {
            ProviderId::Gemini => "GEMINI_API_KEY",
            ProviderId::OpenAi => "OPENAI_API_KEY",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ProviderId::Gemini => "gemini",
            ProviderId::OpenAi => "openai",
        };
        write!(f, "{}", label)
    }
}

impl FromStr for ProviderId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(ProviderId::Gemini),
            "openai" => Ok(ProviderId::OpenAi),
            other => Err(format!("unknown LLM provider `{other}`")),
        }
    }
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    /// The provider used for new games.
    pub provider: ProviderId,
    pub api_keys: HashMap<ProviderId, String>,
    pub base_url: Option<String>,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderId::Gemini,
            api_keys: HashMap::new(),
            base_url: None,
            timeout: Duration::from_secs(20),
            retry: RetryPolicy::default(),
        }
    }
}

impl LlmConfig {
    pub fn api_key(&self) -> Option<&str> {
        self.api_keys.get(&self.provider).map(String::as_str)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff: Duration::from_millis(1000),
        }
    }
}

/// Probabilities used by the random fallback policy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AiTuning {
    pub witch_save_probability: f64,
    pub witch_poison_probability: f64,
    pub hunter_shoot_probability: f64,
}

impl Default for AiTuning {
    fn default() -> Self {
        Self {
            witch_save_probability: 0.7,
            witch_poison_probability: 0.3,
            hunter_shoot_probability: 0.8,
        }
    }
}

fn parse<T: FromStr>(value: Option<String>) -> Option<T> {
    value?.trim().parse().ok()
}

fn clamp_probability(p: f64) -> f64 {
    if p.is_nan() {
        0.0
    } else {
        p.clamp(0.0, 1.0)
    }
}
