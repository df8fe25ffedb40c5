//! Corpus assembly: run every configured generator, merge, shuffle, persist.
//!
//! Items are stored flat in shuffled order. Per-`(task, element task)`
//! buckets hold indices into the flat list, so bucket lookups and flat
//! indexing always see the same items.

use crate::alignment::{Aligner, ChatTokenizer, TokenizedSample};
use crate::annotation::AnnotationCache;
use crate::config::DatasetMeta;
use crate::conversation::ConversationItem;
use crate::error::{Error, Result};
use crate::tasks::Generator;
use crate::vision::{self, Patch};
use indexmap::IndexMap;
use log::{info, warn};
use rand::seq::SliceRandom;
use rand::RngCore;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

type Buckets = IndexMap<String, IndexMap<String, Vec<usize>>>;

/// Outcome of [`Corpus::dump_jsonl`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DumpReport {
    /// Lines written
    pub written: usize,
    /// Items that failed to serialize and were skipped
    pub encode_errors: usize,
}

/// Model-ready form of one item.
#[derive(Debug, Clone)]
pub struct TrainingSample {
    /// Ids, labels and attention mask
    pub tokens: TokenizedSample,
    /// Four windows and the global view of the screenshot
    pub patches: Vec<Patch>,
}

/// The assembled training corpus.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    items: Vec<ConversationItem>,
    buckets: Buckets,
}

fn require_jsonl(path: &Path) -> Result<()> {
    if path.extension().is_some_and(|ext| ext == "jsonl") {
        Ok(())
    } else {
        Err(Error::Config(format!("corpus file must end with .jsonl: {}", path.display())))
    }
}

impl Corpus {
    /// Run every task of `meta` and assemble the shuffled corpus.
    ///
    /// All generators read their inputs first, then all create items. Image
    /// references are spliced into the first turn before shuffling.
    pub fn build(meta: &DatasetMeta, cache: &mut AnnotationCache, rng: &mut dyn RngCore) -> Result<Self> {
        let mut generators = Vec::with_capacity(meta.len());
        for (task, spec) in meta {
            let mut generator = Generator::from_spec(task, spec.clone())?;
            generator.read_annotations(cache, rng)?;
            info!("Task **{}**: {}", task, generator.read_summary());
            generators.push(generator);
        }

        let (mut num_images, mut num_qas) = (0, 0);
        let mut buckets: Buckets = IndexMap::new();
        let mut tagged = Vec::new();
        for mut generator in generators {
            generator.create_qa_items(rng)?;
            let base = generator.into_base();
            let (images, qas) = base.total_count();
            num_images += images;
            num_qas += qas;
            let names: Vec<&str> = base.elem_tasks().iter().map(|t| t.as_str()).collect();
            info!("Task **{}{:?}**: {}", base.task(), names, base.summary());

            let task = base.task().to_string();
            let task_buckets = buckets.entry(task.clone()).or_default();
            for (elem_task, items) in base.into_buckets() {
                task_buckets.entry(elem_task.to_string()).or_default();
                for mut item in items {
                    item.fill_image_ref()?;
                    tagged.push((task.clone(), elem_task.to_string(), item));
                }
            }
        }
        info!("Successfully create {} images ({} QAs) in total.", num_images, num_qas);

        tagged.shuffle(rng);
        let mut items = Vec::with_capacity(tagged.len());
        for (task, elem_task, item) in tagged {
            buckets
                .entry(task)
                .or_default()
                .entry(elem_task)
                .or_default()
                .push(items.len());
            items.push(item);
        }
        Ok(Self { items, buckets })
    }

    /// Wrap already assembled items, deriving buckets from their ids.
    pub fn from_items(items: Vec<ConversationItem>) -> Self {
        let mut buckets: Buckets = IndexMap::new();
        for (idx, item) in items.iter().enumerate() {
            buckets
                .entry(item.id.task.clone())
                .or_default()
                .entry(item.id.elem_task.clone())
                .or_default()
                .push(idx);
        }
        Self { items, buckets }
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when the corpus holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// All items in shuffled order.
    pub fn items(&self) -> &[ConversationItem] {
        &self.items
    }

    /// Total question/answer pairs.
    pub fn num_qas(&self) -> usize {
        self.items.iter().map(ConversationItem::num_qas).sum()
    }

    /// Item at a flat index.
    pub fn get(&self, idx: usize) -> Option<&ConversationItem> {
        self.items.get(idx)
    }

    /// Item at an index within one bucket.
    pub fn get_in_bucket(&self, task: &str, elem_task: &str, idx: usize) -> Option<&ConversationItem> {
        let flat = *self.buckets.get(task)?.get(elem_task)?.get(idx)?;
        self.items.get(flat)
    }

    /// Size of one bucket; zero for unknown buckets.
    pub fn bucket_len(&self, task: &str, elem_task: &str) -> usize {
        self.buckets
            .get(task)
            .and_then(|t| t.get(elem_task))
            .map_or(0, Vec::len)
    }

    /// `(task, element task, size)` for every bucket.
    pub fn bucket_sizes(&self) -> Vec<(&str, &str, usize)> {
        self.buckets
            .iter()
            .flat_map(|(task, elems)| {
                elems
                    .iter()
                    .map(move |(elem, indices)| (task.as_str(), elem.as_str(), indices.len()))
            })
            .collect()
    }

    /// Write one JSON object per line.
    ///
    /// Items that fail to serialize are skipped and counted.
    pub fn dump_jsonl(&self, path: impl AsRef<Path>) -> Result<DumpReport> {
        let path = path.as_ref();
        require_jsonl(path)?;
        let mut writer = BufWriter::new(File::create(path)?);
        let mut report = DumpReport::default();
        for item in &self.items {
            match serde_json::to_string(item) {
                Ok(line) => {
                    writer.write_all(line.as_bytes())?;
                    writer.write_all(b"\n")?;
                    report.written += 1;
                },
                Err(e) => {
                    warn!("Skipping item {}: {}", item.id, e);
                    report.encode_errors += 1;
                },
            }
        }
        writer.flush()?;
        info!(
            "Successfully dump {} items, with {} errors.",
            self.items.len(),
            report.encode_errors
        );
        Ok(report)
    }

    /// Stream a corpus back from JSONL, rebuilding buckets from each id.
    pub fn load_jsonl(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        require_jsonl(path)?;
        let reader = BufReader::new(File::open(path)?);
        let mut items = Vec::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let item: ConversationItem = serde_json::from_str(&line).map_err(|e| Error::InvalidRecord {
                source_name: format!("{}:{}", path.display(), line_no + 1),
                reason: e.to_string(),
            })?;
            items.push(item);
        }
        let corpus = Self::from_items(items);
        info!(
            "Successfully read {} items ({} QAs) in total.",
            corpus.len(),
            corpus.num_qas()
        );
        Ok(corpus)
    }

    /// Tokens and image patches for one item.
    pub fn training_sample<T: ChatTokenizer>(&self, idx: usize, aligner: &Aligner<T>) -> Result<TrainingSample> {
        let item = self
            .get(idx)
            .ok_or_else(|| Error::Config(format!("item index {} out of range ({})", idx, self.len())))?;
        let tokens = aligner.align_item(item)?;
        let image = item
            .image()
            .ok_or_else(|| Error::Construction(format!("{}: item has no image", item.id)))?;
        let patches = vision::load_patches(image)?;
        Ok(TrainingSample { tokens, patches })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{ItemId, Turn};
    use std::path::PathBuf;

    fn item(task: &str, elem: &str, answer: &str) -> ConversationItem {
        ConversationItem {
            id: ItemId::new(task, elem),
            messages: vec![Turn::user("Picture 1: <img>a.png</img>\nq"), Turn::assistant(answer)],
            images: vec![PathBuf::from("a.png")],
        }
    }

    #[test]
    fn test_buckets_from_ids() {
        let corpus = Corpus::from_items(vec![
            item("basic", "ocr", "1"),
            item("basic", "grounding", "2"),
            item("basic", "ocr", "3"),
        ]);
        assert_eq!(corpus.len(), 3);
        assert_eq!(corpus.bucket_len("basic", "ocr"), 2);
        assert_eq!(corpus.bucket_len("basic", "title"), 0);
        assert_eq!(corpus.get_in_bucket("basic", "ocr", 1).unwrap().messages[1].content, "3");
        assert!(corpus.get_in_bucket("basic", "ocr", 2).is_none());
        assert_eq!(corpus.get(1).unwrap().id.elem_task, "grounding");
    }

    #[test]
    fn test_jsonl_extension_required() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = Corpus::from_items(vec![item("basic", "ocr", "1")]);
        assert!(matches!(corpus.dump_jsonl(dir.path().join("c.json")), Err(Error::Config(_))));
        assert!(matches!(Corpus::load_jsonl(dir.path().join("c.txt")), Err(Error::Config(_))));
    }

    #[test]
    fn test_dump_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.jsonl");
        let corpus = Corpus::from_items(vec![item("basic", "ocr", "1"), item("som", "som_general", "2")]);
        let report = corpus.dump_jsonl(&path).unwrap();
        assert_eq!(report, DumpReport { written: 2, encode_errors: 0 });

        let loaded = Corpus::load_jsonl(&path).unwrap();
        assert_eq!(loaded.items(), corpus.items());
        assert_eq!(loaded.bucket_sizes(), corpus.bucket_sizes());
        assert_eq!(loaded.num_qas(), 2);
    }

    #[test]
    fn test_load_reports_bad_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.jsonl");
        std::fs::write(&path, "\n{\"id\": \"missing-separator\", \"messages\": [], \"images\": []}\n").unwrap();
        match Corpus::load_jsonl(&path) {
            Err(Error::InvalidRecord { source_name, .. }) => assert!(source_name.ends_with(":2")),
            other => panic!("expected InvalidRecord, got {:?}", other),
        }
    }
}
