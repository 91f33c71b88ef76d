//! Agent prompt configuration and prompt fingerprinting.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Default model identifier for new agents.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// One example exchange shown to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleDialogue {
    pub user: String,
    pub agent: String,
}

/// Prompts that define an agent persona.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptConfig {
    /// System prompt describing the persona.
    pub system: String,
    /// Greeting shown when a conversation is opened.
    #[serde(default)]
    pub welcome: String,
    /// Example dialogues.
    #[serde(default)]
    pub examples: Vec<ExampleDialogue>,
}

impl PromptConfig {
    /// Stable fingerprint of the full prompt configuration.
    pub fn fingerprint(&self) -> String {
        let mut canonical = String::new();
        canonical.push_str(&self.system);
        canonical.push('\u{1f}');
        canonical.push_str(&self.welcome);
        for example in &self.examples {
            canonical.push('\u{1e}');
            canonical.push_str(&example.user);
            canonical.push('\u{1f}');
            canonical.push_str(&example.agent);
        }
        hash_prompt(&canonical)
    }
}

/// Model and sampling settings of an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// Sampling temperature (0.0 - 1.0).
    pub temperature: f32,
    /// Maximum tokens for a reply.
    pub max_tokens: u32,
    /// Model identifier.
    pub model: String,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1000,
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

/// Compute a stable SHA-256 fingerprint for a prompt string.
pub fn hash_prompt(prompt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prompt.as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        hex.push_str(&format!("{:02x}", byte));
    }
    hex
}
