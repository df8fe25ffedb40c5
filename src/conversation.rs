//! Conversation items: the unit every generator emits and the corpus stores.
//!
//! An item is a strictly alternating user/assistant dialogue about exactly one
//! image. When first created, the opening user turn starts with the
//! [`IMAGE_PLACEHOLDER`]; corpus assembly rewrites it into the final
//! `Picture 1: <img>{path}</img>\n` reference with [`ConversationItem::fill_image_ref`].

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Marker opening the first user turn of a fresh item.
pub const IMAGE_PLACEHOLDER: &str = "<image>";

/// Raw image tag; questions or answers containing it are dropped.
pub const IMG_TAG: &str = "<img>";

/// Speaker of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The human side
    #[serde(alias = "human")]
    User,
    /// The model side
    #[serde(alias = "gpt")]
    Assistant,
}

impl Role {
    /// Lowercase role name as used in chat markers.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One message of a dialogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Speaker
    #[serde(alias = "from")]
    pub role: Role,
    /// Message text
    #[serde(alias = "value")]
    pub content: String,
}

impl Turn {
    /// A user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// An assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Composite item identifier, serialized as `"<task>;<element task>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemId {
    /// Dataset task name, e.g. `basic_cropped`
    pub task: String,
    /// Element task name, e.g. `grounding`
    pub elem_task: String,
}

impl ItemId {
    /// Create an identifier.
    pub fn new(task: impl Into<String>, elem_task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            elem_task: elem_task.into(),
        }
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{}", self.task, self.elem_task)
    }
}

impl FromStr for ItemId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split(';');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(task), Some(elem_task), None) => Ok(ItemId::new(task, elem_task)),
            _ => Err(Error::InvalidRecord {
                source_name: "item id".to_string(),
                reason: format!("expected '<task>;<element task>', got '{}'", s),
            }),
        }
    }
}

impl TryFrom<String> for ItemId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ItemId> for String {
    fn from(id: ItemId) -> Self {
        id.to_string()
    }
}

/// A training dialogue about one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationItem {
    /// Which task and element task produced the item
    pub id: ItemId,
    /// Alternating user/assistant turns, starting with the user
    #[serde(alias = "conversations")]
    pub messages: Vec<Turn>,
    /// Exactly one image path
    pub images: Vec<PathBuf>,
}

impl ConversationItem {
    /// Build an item from parallel question and answer lists.
    ///
    /// Pairs where either side contains [`IMG_TAG`] are dropped. The first
    /// remaining question is prefixed with [`IMAGE_PLACEHOLDER`] and, when not
    /// empty, the system prompt plus a newline. Returns `Ok(None)` when no pair
    /// survives.
    ///
    /// # Errors
    ///
    /// [`Error::Construction`] when the lists differ in length.
    ///
    /// # Examples
    ///
    /// ```
    /// use ui_corpus::conversation::{ConversationItem, ItemId};
    ///
    /// let item = ConversationItem::from_qa_pairs(
    ///     ItemId::new("captioning", "title"),
    ///     "page.png".into(),
    ///     "",
    ///     vec!["Title?".to_string()],
    ///     vec!["Shop".to_string()],
    /// )
    /// .unwrap()
    /// .unwrap();
    /// assert_eq!(item.messages[0].content, "<image>Title?");
    /// assert_eq!(item.num_qas(), 1);
    /// ```
    pub fn from_qa_pairs(
        id: ItemId,
        image: PathBuf,
        sys_prompt: &str,
        questions: Vec<String>,
        answers: Vec<String>,
    ) -> Result<Option<Self>> {
        if questions.len() != answers.len() {
            return Err(Error::Construction(format!(
                "{}: {} questions but {} answers",
                id,
                questions.len(),
                answers.len()
            )));
        }

        let mut messages = Vec::with_capacity(questions.len() * 2);
        for (question, answer) in questions.into_iter().zip(answers) {
            if question.contains(IMG_TAG) || answer.contains(IMG_TAG) {
                continue;
            }
            messages.push(Turn::user(question));
            messages.push(Turn::assistant(answer));
        }

        let Some(first) = messages.first_mut() else {
            return Ok(None);
        };
        let mut prefix = String::from(IMAGE_PLACEHOLDER);
        if !sys_prompt.is_empty() {
            prefix.push_str(sys_prompt);
            prefix.push('\n');
        }
        first.content.insert_str(0, &prefix);

        Ok(Some(Self {
            id,
            messages,
            images: vec![image],
        }))
    }

    /// Number of question/answer pairs.
    pub fn num_qas(&self) -> usize {
        self.messages.len() / 2
    }

    /// The associated image.
    pub fn image(&self) -> Option<&Path> {
        self.images.first().map(PathBuf::as_path)
    }

    /// Check that turns alternate user/assistant, starting with the user.
    pub fn check_alternation(&self) -> Result<()> {
        check_alternation(&self.messages).map_err(|reason| Error::Construction(format!("{}: {}", self.id, reason)))
    }

    /// Rewrite the leading placeholder into `Picture 1: <img>{path}</img>\n`.
    pub fn fill_image_ref(&mut self) -> Result<()> {
        let image = self
            .image()
            .ok_or_else(|| Error::Construction(format!("{}: item has no image", self.id)))?
            .display()
            .to_string();
        let first = self
            .messages
            .first_mut()
            .ok_or_else(|| Error::Construction(format!("{}: item has no turns", self.id)))?;
        let rest = first.content.strip_prefix(IMAGE_PLACEHOLDER).ok_or_else(|| {
            Error::Construction(format!("{}: first turn does not start with {}", self.id, IMAGE_PLACEHOLDER))
        })?;
        first.content = format!("Picture 1: <img>{}</img>\n{}", image, rest);
        Ok(())
    }
}

/// Validate user/assistant alternation of a turn list.
pub(crate) fn check_alternation(turns: &[Turn]) -> std::result::Result<(), String> {
    if turns.len() % 2 != 0 {
        return Err(format!("odd number of turns ({})", turns.len()));
    }
    for (i, turn) in turns.iter().enumerate() {
        let expected = if i % 2 == 0 { Role::User } else { Role::Assistant };
        if turn.role != expected {
            return Err(format!("turn {} is {}, expected {}", i, turn.role.as_str(), expected.as_str()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn item(sys_prompt: &str, questions: &[&str], answers: &[&str]) -> Option<ConversationItem> {
        ConversationItem::from_qa_pairs(
            ItemId::new("basic", "ocr"),
            PathBuf::from("web/raw/1.png"),
            sys_prompt,
            strings(questions),
            strings(answers),
        )
        .unwrap()
    }

    #[test]
    fn test_item_id_round_trip() {
        let id: ItemId = "basic_cropped;grounding".parse().unwrap();
        assert_eq!(id, ItemId::new("basic_cropped", "grounding"));
        assert_eq!(id.to_string(), "basic_cropped;grounding");
        assert!("no-separator".parse::<ItemId>().is_err());
        assert!("a;b;c".parse::<ItemId>().is_err());
    }

    #[test]
    fn test_system_prompt_prefix() {
        let item = item("Find the text.", &["(0.1, 0.2)"], &["Home"]).unwrap();
        assert_eq!(item.messages[0].content, "<image>Find the text.\n(0.1, 0.2)");
        assert_eq!(item.messages[1], Turn::assistant("Home"));
        assert_eq!(item.id.to_string(), "basic;ocr");
    }

    #[test]
    fn test_only_first_turn_prefixed() {
        let item = item("", &["q1", "q2"], &["a1", "a2"]).unwrap();
        assert_eq!(item.messages[0].content, "<image>q1");
        assert_eq!(item.messages[2].content, "q2");
        assert_eq!(item.num_qas(), 2);
    }

    #[test]
    fn test_img_tag_pairs_dropped() {
        let item = item("", &["see <img>x</img>", "q2"], &["a1", "a2"]).unwrap();
        assert_eq!(item.num_qas(), 1);
        assert_eq!(item.messages[0].content, "<image>q2");
        assert!(self::item("", &["q"], &["<img>"]).is_none());
    }

    #[test]
    fn test_empty_lists_produce_nothing() {
        assert!(item("sys", &[], &[]).is_none());
    }

    #[test]
    fn test_length_mismatch_is_construction_error() {
        let err = ConversationItem::from_qa_pairs(
            ItemId::new("basic", "ocr"),
            PathBuf::from("x.png"),
            "",
            strings(&["q1", "q2"]),
            strings(&["a1"]),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Construction(_)));
    }

    #[test]
    fn test_fill_image_ref() {
        let mut item = item("Sys.", &["q"], &["a"]).unwrap();
        item.fill_image_ref().unwrap();
        assert_eq!(item.messages[0].content, "Picture 1: <img>web/raw/1.png</img>\nSys.\nq");
        // Already rewritten
        assert!(item.fill_image_ref().is_err());
    }

    #[test]
    fn test_alternation_check() {
        let mut item = item("", &["q"], &["a"]).unwrap();
        assert!(item.check_alternation().is_ok());
        item.messages.swap(0, 1);
        assert!(item.check_alternation().is_err());
        item.messages.pop();
        assert!(item.check_alternation().is_err());
    }

    #[test]
    fn test_serialized_shape() {
        let item = item("", &["q"], &["a"]).unwrap();
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["id"], "basic;ocr");
        assert_eq!(json["messages"][1]["role"], "assistant");
        assert_eq!(json["images"][0], "web/raw/1.png");
    }

    #[test]
    fn test_deserialize_conversations_spelling() {
        let line = r#"{"id": "llava_instruct;llava_instruct",
                       "conversations": [{"from": "human", "value": "Hi"}, {"from": "gpt", "value": "Hello"}],
                       "images": ["coco/1.jpg"]}"#;
        let item: ConversationItem = serde_json::from_str(line).unwrap();
        assert_eq!(item.messages[0], Turn::user("Hi"));
        assert_eq!(item.messages[1].role, Role::Assistant);
    }
}
