// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::type_complexity)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::needless_range_loop)]
#![allow(clippy::enum_variant_names)]
#![allow(clippy::should_implement_trait)]
// Allow unused for tests
#![cfg_attr(test, allow(dead_code))]
#![cfg_attr(test, allow(unused_variables))]

//! # UI Corpus
//!
//! Builds supervised fine-tuning corpora for vision-language models from
//! annotated webpage and mobile UI screenshots.
//!
//! ## Core Features
//!
//! ### Annotation quality
//! - **Structural validation**: malformed page records are rejected whole
//! - **Page filter**: crowding, strips, tiny boxes, text-heavy pages
//! - **Element filter**: duplicate text, oversized text, degenerate boxes
//! - **Per-directory cache**: each annotation directory is read once per run
//!
//! ### QA synthesis
//! - **Grounding / OCR**: text ↔ box in point or bbox form, with jitter
//! - **Accessibility, captioning, icons, set-of-marks**: webpage-derived tasks
//! - **Widget tasks**: mobile UI grounding, captioning and screen summaries
//! - **Advanced tasks**: intention, function and detail from generated artifacts
//! - **Instruction corpora**: caption/VQA and multi-turn dialogues
//!
//! ### Training inputs
//! - **Corpus**: shuffled, bucketed, JSONL round trip
//! - **Alignment**: ChatML token ids with exact assistant-only supervision
//! - **Vision**: 896×896 screenshots as four 448 windows plus a global view
//!
//! ## Quick Start
//!
//! ```ignore
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use ui_corpus::annotation::AnnotationCache;
//! use ui_corpus::config::load_dataset_meta;
//! use ui_corpus::corpus::Corpus;
//!
//! let meta = load_dataset_meta("meta.json".as_ref(), "train")?;
//! let mut cache = AnnotationCache::new();
//! let mut rng = StdRng::seed_from_u64(46);
//! let corpus = Corpus::build(&meta, &mut cache, &mut rng)?;
//! corpus.dump_jsonl("train.jsonl")?;
//! # Ok::<(), ui_corpus::error::Error>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! anno/*.json → validate → filter → AnnotationCache
//!                                        ↓
//!                      Generator (one per task family)
//!                                        ↓
//!                 ConversationItem buckets → Corpus → JSONL
//!                                        ↓
//!                  Aligner (ids + labels) + vision patches
//! ```

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Error handling
pub mod error;

// Configuration
pub mod config;

// Normalizers
pub mod geometry;
pub mod text;

// Annotation reading and filtering
pub mod annotation;

// QA synthesis
pub mod conversation;
pub mod tasks;

// Corpus assembly and model inputs
pub mod alignment;
pub mod corpus;
pub mod vision;

// Advanced-task artifact generation
pub mod generation;

// Re-exports
pub use alignment::{Aligner, ChatTokenizer, TokenizedSample, IGNORE_INDEX};
pub use annotation::{AnnotationCache, Element, PageAnnotation};
pub use config::{load_dataset_meta, DatasetMeta, FilterConfig, TaskSpec};
pub use conversation::{ConversationItem, ItemId, Role, Turn};
pub use corpus::{Corpus, DumpReport};
pub use error::{Error, Result};
pub use tasks::{ElementTask, Generator, TaskFamily};

#[cfg(feature = "tokenizers")]
pub use alignment::hf::HfChatTokenizer;

// Internal utilities
pub(crate) mod utils {
    //! Internal utility functions for the library.

    use std::cmp::Ordering;

    /// Safely compare two floating point numbers, handling NaN cases.
    ///
    /// NaN values are treated as equal to each other and greater than all other values,
    /// so sorting by coordinates never panics.
    #[inline]
    pub fn safe_float_cmp(a: f64, b: f64) -> Ordering {
        match (a.is_nan(), b.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_safe_float_cmp_normal() {
            assert_eq!(safe_float_cmp(0.1, 0.2), Ordering::Less);
            assert_eq!(safe_float_cmp(0.2, 0.1), Ordering::Greater);
            assert_eq!(safe_float_cmp(0.5, 0.5), Ordering::Equal);
        }

        #[test]
        fn test_safe_float_cmp_nan() {
            assert_eq!(safe_float_cmp(f64::NAN, f64::NAN), Ordering::Equal);
            assert_eq!(safe_float_cmp(f64::NAN, 0.0), Ordering::Greater);
            assert_eq!(safe_float_cmp(0.0, f64::NAN), Ordering::Less);
        }

        #[test]
        fn test_safe_float_cmp_sort_with_nan() {
            let mut values = vec![0.3, f64::NAN, 0.1, 0.2];
            values.sort_by(|a, b| safe_float_cmp(*a, *b));
            assert_eq!(&values[..3], &[0.1, 0.2, 0.3]);
            assert!(values[3].is_nan());
        }
    }
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(VERSION.starts_with("0."));
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "ui_corpus");
    }
}
