//! [`ChatTokenizer`] over a Hugging Face `tokenizer.json`.

use super::ChatTokenizer;
use crate::error::{Error, Result};
use std::path::Path;
use tokenizers::Tokenizer;

/// Conversation start marker.
pub const IM_START: &str = "<|im_start|>";
/// Conversation end marker.
pub const IM_END: &str = "<|im_end|>";
/// Padding token of Qwen-style vocabularies.
pub const DEFAULT_PAD_TOKEN: &str = "<|endoftext|>";

/// A loaded tokenizer with its special token ids resolved.
#[derive(Debug, Clone)]
pub struct HfChatTokenizer {
    inner: Tokenizer,
    im_start: u32,
    im_end: u32,
    pad: u32,
}

impl HfChatTokenizer {
    /// Load `tokenizer.json` and resolve the ChatML markers and pad token.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let inner = Tokenizer::from_file(path)
            .map_err(|e| Error::Tokenizer(format!("failed to load {}: {}", path.display(), e)))?;
        Self::from_tokenizer(inner, DEFAULT_PAD_TOKEN)
    }

    /// Wrap an already loaded tokenizer.
    pub fn from_tokenizer(inner: Tokenizer, pad_token: &str) -> Result<Self> {
        let id = |token: &str| {
            inner
                .token_to_id(token)
                .ok_or_else(|| Error::Tokenizer(format!("vocabulary has no {} token", token)))
        };
        let im_start = id(IM_START)?;
        let im_end = id(IM_END)?;
        let pad = id(pad_token)?;
        log::debug!("Resolved special tokens: im_start={} im_end={} pad={}", im_start, im_end, pad);
        Ok(Self {
            inner,
            im_start,
            im_end,
            pad,
        })
    }

    /// The wrapped tokenizer.
    pub fn inner(&self) -> &Tokenizer {
        &self.inner
    }
}

impl ChatTokenizer for HfChatTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        let encoding = self
            .inner
            .encode(text, false)
            .map_err(|e| Error::Tokenizer(e.to_string()))?;
        Ok(encoding.get_ids().to_vec())
    }

    fn im_start_id(&self) -> u32 {
        self.im_start
    }

    fn im_end_id(&self) -> u32 {
        self.im_end
    }

    fn pad_id(&self) -> u32 {
        self.pad
    }
}
