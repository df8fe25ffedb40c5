//! Integration tests for advanced-task artifact generation.
//!
//! A scripted [`VisionModel`] stands in for the remote model.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use ui_corpus::annotation::AnnotationCache;
use ui_corpus::config::{DatasetMeta, TaskSpec};
use ui_corpus::corpus::Corpus;
use ui_corpus::generation::{
    run_generation, AdvancedTaskKind, GenerationOptions, PagePart, PromptSet, SampleOutcome, VisionModel,
};
use ui_corpus::{Error, Result};

/// Returns a fixed reply and records every call.
struct ScriptedModel {
    reply: String,
    calls: Mutex<Vec<(String, PathBuf)>>,
}

impl ScriptedModel {
    fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<(String, PathBuf)> {
        self.calls.lock().unwrap().clone()
    }
}

impl VisionModel for ScriptedModel {
    fn complete(&self, _system: &str, user: &str, image: &Path) -> Result<String> {
        self.calls.lock().unwrap().push((user.to_string(), image.to_path_buf()));
        Ok(self.reply.clone())
    }
}

struct FailingModel;

impl VisionModel for FailingModel {
    fn complete(&self, _system: &str, _user: &str, _image: &Path) -> Result<String> {
        Err(Error::Generation("service unavailable".to_string()))
    }
}

fn prompts() -> PromptSet {
    PromptSet {
        system: "You write training data.".to_string(),
        share: "Read the annotation.".to_string(),
        intention: "Write user intentions.".to_string(),
        function: "Infer the page function.".to_string(),
        detail: "Describe the page.".to_string(),
    }
}

fn annotation() -> serde_json::Value {
    json!({
        "image": "page.png",
        "viewport": [1280, 720],
        "url": "https://shop.example.com",
        "title": "Shop",
        "description": "An online shop",
        "keywords": null,
        "elements": [
            {"bbox": [0, 0, 128, 72], "text": "Home", "types": ["Link", "Text"]},
            {"bbox": [640, 360, 768, 432], "text": "Search", "types": ["Button"]}
        ]
    })
}

/// `1_top` and `2_mid` have marked screenshots; `3_top` has none and
/// `4_top` lacks a description.
fn page_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    for sub in ["anno", "som", "raw"] {
        fs::create_dir_all(root.join(sub)).unwrap();
    }
    for name in ["1_top", "2_mid", "3_top", "4_top"] {
        let mut anno = annotation();
        if name == "4_top" {
            anno["description"] = serde_json::Value::Null;
        }
        fs::write(root.join("anno").join(format!("{}.json", name)), anno.to_string()).unwrap();
        fs::write(root.join("raw").join(format!("{}.png", name)), b"png").unwrap();
        if name != "3_top" {
            fs::write(root.join("som").join(format!("{}.png", name)), b"png").unwrap();
        }
    }
    dir
}

// ============================================================================
// Detail and function
// ============================================================================

#[test]
fn test_detail_writes_text_for_selected_pages() {
    let dir = page_dir();
    let model = ScriptedModel::new("A shop front page with a search button.");
    let options = GenerationOptions::new(AdvancedTaskKind::DetailDesc).with_concurrency(2);

    let report = run_generation(dir.path(), &prompts(), &model, &options).unwrap();
    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.written(), 1);

    let output = dir.path().join("detail").join("1_top.txt");
    assert_eq!(fs::read_to_string(&output).unwrap(), "A shop front page with a search button.");

    let calls = model.calls();
    assert_eq!(calls.len(), 1);
    let (user, image) = &calls[0];
    assert_eq!(image, &dir.path().join("raw").join("1_top.png"));
    assert!(user.starts_with("Read the annotation.\nDescribe the page.\nPrompt ends."));
    assert!(user.contains("Title: Shop\nDescription: An online shop\n"));
    assert!(user.contains("{ Link Text }, \"Home\", \"\", [0.0, 0.0, 0.1, 0.1]"));
    assert!(!user.contains("0. {"));
}

#[test]
fn test_existing_output_is_skipped_unless_overwriting() {
    let dir = page_dir();
    let model = ScriptedModel::new("first");
    let options = GenerationOptions::new(AdvancedTaskKind::FuncInfer);
    run_generation(dir.path(), &prompts(), &model, &options).unwrap();

    let again = ScriptedModel::new("second");
    let report = run_generation(dir.path(), &prompts(), &again, &options).unwrap();
    assert_eq!(report.skipped(), 1);
    assert!(again.calls().is_empty());
    let output = dir.path().join("function").join("1_top.txt");
    assert_eq!(fs::read_to_string(&output).unwrap(), "first");

    let report = run_generation(dir.path(), &prompts(), &again, &options.clone().with_overwrite(true)).unwrap();
    assert_eq!(report.written(), 1);
    assert_eq!(fs::read_to_string(&output).unwrap(), "second");
}

#[test]
fn test_page_parts_and_max_id() {
    let dir = page_dir();
    let model = ScriptedModel::new("text");
    let options = GenerationOptions::new(AdvancedTaskKind::DetailDesc).with_parts(vec![PagePart::Top, PagePart::Mid]);
    let report = run_generation(dir.path(), &prompts(), &model, &options).unwrap();
    let mut names: Vec<&str> = report.outcomes.iter().map(|(n, _)| n.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["1_top", "2_mid"]);

    let options = options.with_max_id(1).with_overwrite(true);
    let report = run_generation(dir.path(), &prompts(), &model, &options).unwrap();
    assert_eq!(report.outcomes.len(), 1);
}

#[test]
fn test_model_failure_is_recorded() {
    let dir = page_dir();
    let options = GenerationOptions::new(AdvancedTaskKind::DetailDesc);
    let report = run_generation(dir.path(), &prompts(), &FailingModel, &options).unwrap();
    assert_eq!(report.failed(), 1);
    assert!(matches!(&report.outcomes[0].1, SampleOutcome::Failed(msg) if msg.contains("service unavailable")));
    assert!(!dir.path().join("detail").join("1_top.txt").exists());
}

// ============================================================================
// Intention
// ============================================================================

#[test]
fn test_intention_json_feeds_advanced_tasks() {
    let dir = page_dir();
    let reply = r#"[{"User": "I want to find a product", "System": "Use the search button {1: [0.5, 0.5, 0.6, 0.6]}"}]"#;
    let model = ScriptedModel::new(reply);
    let options = GenerationOptions::new(AdvancedTaskKind::ConversIntent);

    let report = run_generation(dir.path(), &prompts(), &model, &options).unwrap();
    assert_eq!(report.written(), 1);
    let calls = model.calls();
    assert_eq!(calls[0].1, dir.path().join("som").join("1_top.png"));
    assert!(calls[0].0.contains("1. { Button }, \"Search\""));

    let written = fs::read_to_string(dir.path().join("intention").join("1_top.json")).unwrap();
    assert!(written.contains('\n'));

    let mut meta = DatasetMeta::new();
    meta.insert("advanced_tasks".to_string(), TaskSpec::new(dir.path().to_path_buf(), &["intention"]));
    let mut cache = AnnotationCache::new();
    let mut rng = StdRng::seed_from_u64(46);
    let corpus = Corpus::build(&meta, &mut cache, &mut rng).unwrap();
    assert_eq!(corpus.len(), 1);
    let item = corpus.get(0).unwrap();
    assert!(item.messages[0].content.ends_with("I want to find a product"));
    assert_eq!(item.messages[1].content, "Use the search button (0.5, 0.5, 0.6, 0.6)");
}

#[test]
fn test_unparsable_intention_kept_as_text() {
    let dir = page_dir();
    let model = ScriptedModel::new("Sorry, here are some ideas: ...");
    let options = GenerationOptions::new(AdvancedTaskKind::ConversIntent);
    let report = run_generation(dir.path(), &prompts(), &model, &options).unwrap();
    assert!(matches!(&report.outcomes[0].1, SampleOutcome::Unparsed(_)));

    let out_dir = dir.path().join("intention");
    assert!(out_dir.join("1_top.txt").exists());
    assert!(!out_dir.join("1_top.json").exists());

    // The raw text counts as existing output
    let report = run_generation(dir.path(), &prompts(), &model, &options).unwrap();
    assert_eq!(report.skipped(), 1);
}
