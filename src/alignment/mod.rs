//! Conversation → fixed-length token ids and supervision labels.
//!
//! The chat layout is ChatML:
//!
//! ```text
//! <|im_start|>system\n{system message}<|im_end|>\n
//! <|im_start|>user\n{content}<|im_end|>\n
//! <|im_start|>assistant\n{content}<|im_end|>\n
//! ...
//! ```
//!
//! Every emitted piece is recorded as a [`Span`] (owner, kind, token range)
//! while the stream is built, and labels are derived from the span list:
//! start markers, end markers and the newline after each end marker are
//! always supervised, assistant content is supervised, everything else gets
//! [`IGNORE_INDEX`]. No label depends on hard-coded marker token counts.

#[cfg(feature = "tokenizers")]
#[cfg_attr(docsrs, doc(cfg(feature = "tokenizers")))]
pub mod hf;

use crate::conversation::{check_alternation, ConversationItem, Role, Turn};
use crate::error::{Error, Result};
use rayon::prelude::*;
use std::ops::Range;

/// Label of positions that do not contribute to the loss.
pub const IGNORE_INDEX: i64 = -100;

/// System message of the preamble.
pub const DEFAULT_SYSTEM_MESSAGE: &str = "You are a helpful assistant.";

/// Default sequence length.
pub const DEFAULT_MAX_LEN: usize = 2048;

/// Tokenizer capabilities the aligner needs.
pub trait ChatTokenizer {
    /// Encode plain text without adding special tokens.
    fn encode(&self, text: &str) -> Result<Vec<u32>>;

    /// Id of `<|im_start|>`.
    fn im_start_id(&self) -> u32;

    /// Id of `<|im_end|>`.
    fn im_end_id(&self) -> u32;

    /// Id used for right padding.
    fn pad_id(&self) -> u32;
}

/// Who a span belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanOwner {
    /// The constant preamble
    System,
    /// A user turn
    User,
    /// An assistant turn
    Assistant,
}

impl From<Role> for SpanOwner {
    fn from(role: Role) -> Self {
        match role {
            Role::User => SpanOwner::User,
            Role::Assistant => SpanOwner::Assistant,
        }
    }
}

/// What a span contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceKind {
    /// `<|im_start|>`
    StartMarker,
    /// `system`, `user` or `assistant`
    RoleName,
    /// Newline after the role name
    RoleNewline,
    /// Message text
    Content,
    /// `<|im_end|>`
    EndMarker,
    /// Newline after the end marker
    TrailingNewline,
}

/// A contiguous run of tokens with one owner and kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    /// Owner of the tokens
    pub owner: SpanOwner,
    /// Kind of the tokens
    pub kind: PieceKind,
    /// Token positions
    pub range: Range<usize>,
}

impl Span {
    /// Whether the span's tokens are real labels.
    pub fn is_supervised(&self) -> bool {
        match self.kind {
            PieceKind::StartMarker | PieceKind::EndMarker | PieceKind::TrailingNewline => true,
            PieceKind::Content => self.owner == SpanOwner::Assistant,
            PieceKind::RoleName | PieceKind::RoleNewline => false,
        }
    }
}

/// Unpadded token stream with its span list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenStream {
    ids: Vec<u32>,
    spans: Vec<Span>,
}

impl TokenStream {
    fn push(&mut self, owner: SpanOwner, kind: PieceKind, tokens: &[u32]) {
        let start = self.ids.len();
        self.ids.extend_from_slice(tokens);
        self.spans.push(Span {
            owner,
            kind,
            range: start..self.ids.len(),
        });
    }

    /// Token ids.
    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    /// Spans in stream order; they tile the ids exactly.
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Labels derived from the spans, same length as the ids.
    pub fn labels(&self) -> Vec<i64> {
        let mut labels = vec![IGNORE_INDEX; self.ids.len()];
        for span in self.spans.iter().filter(|s| s.is_supervised()) {
            for pos in span.range.clone() {
                labels[pos] = i64::from(self.ids[pos]);
            }
        }
        labels
    }
}

/// Fixed-length model input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizedSample {
    /// Token ids, right-padded
    pub input_ids: Vec<u32>,
    /// Token id or [`IGNORE_INDEX`] per position
    pub labels: Vec<i64>,
    /// `input_ids[i] != pad`
    pub attention_mask: Vec<bool>,
}

impl TokenizedSample {
    /// Sequence length.
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    /// True for a zero-length sample.
    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }

    /// Number of positions contributing to the loss.
    pub fn supervised_count(&self) -> usize {
        self.labels.iter().filter(|&&l| l != IGNORE_INDEX).count()
    }
}

/// Pre-encoded constant pieces.
#[derive(Debug, Clone)]
struct CachedPieces {
    newline: Vec<u32>,
    system_role: Vec<u32>,
    system_message: Vec<u32>,
    user_role: Vec<u32>,
    assistant_role: Vec<u32>,
}

/// Turns conversations into [`TokenizedSample`]s.
///
/// Constant pieces (role names, newline, system message) are encoded once at
/// construction. Alignment itself is pure, so one aligner can serve many
/// threads.
#[derive(Debug, Clone)]
pub struct Aligner<T> {
    tokenizer: T,
    max_len: usize,
    pieces: CachedPieces,
}

impl<T: ChatTokenizer> Aligner<T> {
    /// Create an aligner with the default system message.
    pub fn new(tokenizer: T, max_len: usize) -> Result<Self> {
        Self::with_system_message(tokenizer, max_len, DEFAULT_SYSTEM_MESSAGE)
    }

    /// Create an aligner with a custom system message.
    pub fn with_system_message(tokenizer: T, max_len: usize, system_message: &str) -> Result<Self> {
        let pieces = CachedPieces {
            newline: tokenizer.encode("\n")?,
            system_role: tokenizer.encode("system")?,
            system_message: tokenizer.encode(system_message)?,
            user_role: tokenizer.encode(Role::User.as_str())?,
            assistant_role: tokenizer.encode(Role::Assistant.as_str())?,
        };
        Ok(Self {
            tokenizer,
            max_len,
            pieces,
        })
    }

    /// The wrapped tokenizer.
    pub fn tokenizer(&self) -> &T {
        &self.tokenizer
    }

    /// Output sequence length.
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    fn push_block(&self, stream: &mut TokenStream, owner: SpanOwner, role: &[u32], content: &[u32]) {
        stream.push(owner, PieceKind::StartMarker, &[self.tokenizer.im_start_id()]);
        stream.push(owner, PieceKind::RoleName, role);
        stream.push(owner, PieceKind::RoleNewline, &self.pieces.newline);
        stream.push(owner, PieceKind::Content, content);
        stream.push(owner, PieceKind::EndMarker, &[self.tokenizer.im_end_id()]);
        stream.push(owner, PieceKind::TrailingNewline, &self.pieces.newline);
    }

    /// Build the unpadded stream: preamble, then one block per turn.
    ///
    /// # Errors
    ///
    /// [`Error::Construction`] unless the turns alternate user/assistant,
    /// starting with the user; tokenizer errors are propagated.
    pub fn build_stream(&self, turns: &[Turn]) -> Result<TokenStream> {
        if turns.is_empty() {
            return Err(Error::Construction("conversation has no turns".to_string()));
        }
        check_alternation(turns).map_err(Error::Construction)?;

        let mut stream = TokenStream::default();
        self.push_block(
            &mut stream,
            SpanOwner::System,
            &self.pieces.system_role,
            &self.pieces.system_message,
        );
        for turn in turns {
            let role = match turn.role {
                Role::User => &self.pieces.user_role,
                Role::Assistant => &self.pieces.assistant_role,
            };
            let content = self.tokenizer.encode(&turn.content)?;
            self.push_block(&mut stream, turn.role.into(), role, &content);
        }
        Ok(stream)
    }

    /// Align turns into a padded (or truncated) sample of `max_len` positions.
    pub fn align(&self, turns: &[Turn]) -> Result<TokenizedSample> {
        let stream = self.build_stream(turns)?;
        let mut labels = stream.labels();
        let mut input_ids = stream.ids;
        debug_assert_eq!(input_ids.len(), labels.len());

        let pad = self.tokenizer.pad_id();
        input_ids.resize(self.max_len, pad);
        labels.resize(self.max_len, IGNORE_INDEX);
        let attention_mask = input_ids.iter().map(|&id| id != pad).collect();

        Ok(TokenizedSample {
            input_ids,
            labels,
            attention_mask,
        })
    }

    /// Align one corpus item.
    pub fn align_item(&self, item: &ConversationItem) -> Result<TokenizedSample> {
        self.align(&item.messages)
    }
}

impl<T: ChatTokenizer + Sync> Aligner<T> {
    /// Align many items in parallel, preserving order.
    pub fn align_batch(&self, items: &[ConversationItem]) -> Result<Vec<TokenizedSample>> {
        items.par_iter().map(|item| self.align_item(item)).collect()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Character-level tokenizer for alignment tests.

    use super::*;

    pub const IM_START: u32 = 1;
    pub const IM_END: u32 = 2;
    pub const PAD: u32 = 0;

    /// One token per character, ids offset past the special tokens.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct CharTokenizer;

    impl ChatTokenizer for CharTokenizer {
        fn encode(&self, text: &str) -> Result<Vec<u32>> {
            Ok(text.chars().map(|c| c as u32 + 10).collect())
        }

        fn im_start_id(&self) -> u32 {
            IM_START
        }

        fn im_end_id(&self) -> u32 {
            IM_END
        }

        fn pad_id(&self) -> u32 {
            PAD
        }
    }
}
