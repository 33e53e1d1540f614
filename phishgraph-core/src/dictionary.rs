use crate::error::{FeatureError, Result};
use crate::tokenizer::tokenize;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Id returned for tokens that are not in the vocabulary.
pub const UNKNOWN_ID: u32 = 0;

const FORMAT_VERSION: u32 = 1;

/// Frequency-ranked token vocabulary.
///
/// The most frequent token gets id 1, the next id 2 and so on. At most
/// `vocab_size - 1` tokens are kept because id 0 is reserved for unknown
/// tokens. A built dictionary is never mutated; share it behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "DictionaryFile", try_from = "DictionaryFile")]
pub struct Dictionary {
    vocab_size: usize,
    tokens: Vec<String>,
    index: HashMap<String, u32>,
}

/// On-disk layout. Tokens are listed in id order so the bytes never depend
/// on hash map iteration order.
#[derive(Serialize, Deserialize)]
struct DictionaryFile {
    format_version: u32,
    vocab_size: usize,
    tokens: Vec<String>,
}

impl Dictionary {
    /// Build a dictionary from a token stream.
    ///
    /// Ties in frequency keep the order in which tokens were first seen.
    pub fn build<I, S>(tokens: I, vocab_size: usize) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if vocab_size < 1 {
            return Err(FeatureError::ConfigError(
                "vocab_size must be at least 1".to_string(),
            ));
        }

        let mut slots: HashMap<String, usize> = HashMap::new();
        let mut counts: Vec<(String, u64)> = Vec::new();
        let mut total = 0u64;

        for token in tokens {
            let token = token.as_ref();
            total += 1;
            match slots.get(token) {
                Some(&slot) => counts[slot].1 += 1,
                None => {
                    slots.insert(token.to_string(), counts.len());
                    counts.push((token.to_string(), 1));
                }
            }
        }

        let distinct = counts.len();
        // sort_by is stable, first-seen order survives among equal counts
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts.truncate(vocab_size - 1);

        info!(
            "Built dictionary: {} tokens seen, {} distinct, {} kept",
            total,
            distinct,
            counts.len()
        );

        Self::from_ranked(vocab_size, counts.into_iter().map(|(t, _)| t).collect())
    }

    /// Tokenize every URL and build a dictionary from the combined tokens.
    pub fn from_urls<I, S>(urls: I, vocab_size: usize) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tokens = urls.into_iter().flat_map(|url| tokenize(url.as_ref()));
        Self::build(tokens, vocab_size)
    }

    fn from_ranked(vocab_size: usize, tokens: Vec<String>) -> Result<Self> {
        if vocab_size < 1 {
            return Err(FeatureError::ConfigError(
                "vocab_size must be at least 1".to_string(),
            ));
        }
        if tokens.len() > vocab_size - 1 {
            return Err(FeatureError::ConfigError(format!(
                "dictionary holds {} tokens but vocab_size {} allows at most {}",
                tokens.len(),
                vocab_size,
                vocab_size - 1
            )));
        }

        let mut index = HashMap::with_capacity(tokens.len());
        for (position, token) in tokens.iter().enumerate() {
            let id = position as u32 + 1;
            if index.insert(token.clone(), id).is_some() {
                return Err(FeatureError::ConfigError(format!(
                    "duplicate token in dictionary: {:?}",
                    token
                )));
            }
        }

        Ok(Self {
            vocab_size,
            tokens,
            index,
        })
    }

    /// Id of `token`, or [`UNKNOWN_ID`].
    pub fn id(&self, token: &str) -> u32 {
        self.index.get(token).copied().unwrap_or(UNKNOWN_ID)
    }

    pub fn token(&self, id: u32) -> Option<&str> {
        if id == UNKNOWN_ID {
            return None;
        }
        self.tokens.get(id as usize - 1).map(String::as_str)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.index.contains_key(token)
    }

    /// Number of known tokens (never counts the unknown slot).
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    /// `(token, id)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.tokens
            .iter()
            .enumerate()
            .map(|(position, token)| (token.as_str(), position as u32 + 1))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_bytes()?)?;
        debug!("Dictionary saved to {}", path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        let dictionary = Self::from_bytes(&bytes)?;
        info!(
            "Loaded dictionary from {} ({} tokens, vocab_size {})",
            path.display(),
            dictionary.len(),
            dictionary.vocab_size
        );
        Ok(dictionary)
    }
}

impl From<Dictionary> for DictionaryFile {
    fn from(dictionary: Dictionary) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            vocab_size: dictionary.vocab_size,
            tokens: dictionary.tokens,
        }
    }
}

impl TryFrom<DictionaryFile> for Dictionary {
    type Error = FeatureError;

    fn try_from(file: DictionaryFile) -> Result<Self> {
        if file.format_version != FORMAT_VERSION {
            return Err(FeatureError::ConfigError(format!(
                "unsupported dictionary format version {}",
                file.format_version
            )));
        }
        Self::from_ranked(file.vocab_size, file.tokens)
    }
}
