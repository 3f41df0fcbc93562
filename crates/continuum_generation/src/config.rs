//! Layered configuration.
//!
//! Sources, later overriding earlier:
//! 1. Bundled defaults (`continuum.toml` shipped with the crate)
//! 2. `~/.config/continuum/continuum.toml`
//! 3. `./continuum.toml`

use config::{Config, File, FileFormat};
use continuum_continuity::AliasNormalizer;
use continuum_error::{ConfigError, ContinuumError, ContinuumResult};
use continuum_prompt::NgramSimilarityDetector;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, instrument};

/// Bundled default configuration.
const DEFAULT_CONFIG: &str = include_str!("../../../continuum.toml");

/// Worker pool, batching and timeout settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, derive_builder::Builder)]
#[serde(default)]
#[builder(default, setter(into))]
pub struct GenerationSettings {
    /// Number of pre-provisioned backend sessions
    pool_size: usize,
    /// Segments per batch
    batch_size: usize,
    /// Budget for the first structured output
    response_timeout_ms: u64,
    /// Budget for completion confirmation once output was taken
    finalize_timeout_ms: u64,
    /// Poll interval for both waits
    poll_interval_ms: u64,
    /// Pause before the next attempt
    retry_delay_ms: u64,
    /// Attempts per batch; the pool size when unset
    max_attempts: Option<usize>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            pool_size: 4,
            batch_size: 6,
            response_timeout_ms: 180_000,
            finalize_timeout_ms: 15_000,
            poll_interval_ms: 500,
            retry_delay_ms: 250,
            max_attempts: None,
        }
    }
}

impl GenerationSettings {
    /// Attempts per batch, at least one.
    pub fn attempts(&self) -> usize {
        self.max_attempts.unwrap_or(self.pool_size).max(1)
    }

    /// Response-wait budget.
    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    /// Finalize-wait budget.
    pub fn finalize_timeout(&self) -> Duration {
        Duration::from_millis(self.finalize_timeout_ms)
    }

    /// Poll interval, at least one millisecond.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Delay between attempts.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Prompt budget and similarity settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, derive_builder::Builder)]
#[serde(default)]
#[builder(default, setter(into))]
pub struct PromptSettings {
    /// Word budget for final prompts
    target_words: usize,
    /// Shingle length for similarity checks
    ngram_size: usize,
    /// Overlap above which a prompt is a near duplicate
    similarity_threshold: f64,
    /// Recent prompts kept in the continuity state
    recent_prompt_limit: usize,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            target_words: 60,
            ngram_size: continuum_prompt::DEFAULT_NGRAM_SIZE,
            similarity_threshold: continuum_prompt::DEFAULT_SIMILARITY_THRESHOLD,
            recent_prompt_limit: continuum_core::RECENT_PROMPT_LIMIT,
        }
    }
}

impl PromptSettings {
    /// Similarity detector for these settings.
    pub fn detector(&self) -> NgramSimilarityDetector {
        NgramSimilarityDetector::new(self.ngram_size, self.similarity_threshold)
    }
}

/// Where continuity state files live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
#[serde(default)]
pub struct StateSettings {
    /// Directory holding `<story_id>.continuity.json` files
    dir: PathBuf,
}

impl Default for StateSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".continuum/state"),
        }
    }
}

impl StateSettings {
    /// Settings pointing at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

/// Top-level Continuum configuration.
///
/// # Example
///
/// ```no_run
/// use continuum_generation::ContinuumConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ContinuumConfig::load()?;
/// println!("pool size: {}", config.generation().pool_size());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Getters)]
#[serde(default)]
pub struct ContinuumConfig {
    /// Worker pool and timeouts
    generation: GenerationSettings,
    /// Prompt budget and similarity
    prompt: PromptSettings,
    /// State persistence
    state: StateSettings,
    /// Alias -> canonical entity name
    aliases: BTreeMap<String, String>,
}

impl ContinuumConfig {
    /// Assembles a configuration from parts.
    pub fn new(
        generation: GenerationSettings,
        prompt: PromptSettings,
        state: StateSettings,
        aliases: BTreeMap<String, String>,
    ) -> Self {
        Self {
            generation,
            prompt,
            state,
            aliases,
        }
    }

    /// Load configuration from a specific file, on top of the bundled defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> ContinuumResult<Self> {
        debug!("Loading configuration from file");

        Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                ContinuumError::from(ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.as_ref().display(),
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                ContinuumError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }

    /// Load configuration with precedence: current dir > home dir > bundled defaults.
    ///
    /// User config files are optional and skipped when missing.
    #[instrument]
    pub fn load() -> ContinuumResult<Self> {
        debug!("Loading configuration with precedence: current dir > home dir > bundled defaults");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/continuum/continuum.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("continuum").required(false));

        builder
            .build()
            .map_err(|e| {
                ContinuumError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                ContinuumError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }

    /// Alias normalizer built from `[aliases]`.
    pub fn alias_normalizer(&self) -> AliasNormalizer {
        AliasNormalizer::new(self.aliases.iter().map(|(a, c)| (a.as_str(), c.clone())))
    }
}
