//! Block Kit message structures.
//!
//! A [`Message`] is a list of top-level [`Block`]s plus optional colored
//! [`Attachment`] groupings, serializing to the JSON shapes
//! `chat.postMessage` expects. Only the block types the renderers use are
//! modeled.

use serde::Serialize;

/// A `plain_text` or `mrkdwn` text object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Text {
    PlainText { text: String },
    Mrkdwn { text: String },
}

/// One Block Kit layout block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Header { text: Text },
    Section { text: Text },
    Context { elements: Vec<Text> },
    Divider,
}

impl Block {
    /// A header block with plain text.
    pub fn header(text: impl Into<String>) -> Self {
        Block::Header {
            text: Text::PlainText { text: text.into() },
        }
    }

    /// A section block with mrkdwn text.
    pub fn section(text: impl Into<String>) -> Self {
        Block::Section {
            text: Text::Mrkdwn { text: text.into() },
        }
    }

    /// A context block with a single mrkdwn element.
    pub fn context(text: impl Into<String>) -> Self {
        Block::Context {
            elements: vec![Text::Mrkdwn { text: text.into() }],
        }
    }

    pub fn divider() -> Self {
        Block::Divider
    }
}

/// A colored attachment grouping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    /// Hex color (`#rrggbb`) shown as the attachment's side bar.
    pub color: String,
    pub blocks: Vec<Block>,
}

/// A complete message ready for `chat.postMessage`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    /// Plain-text fallback shown in notifications.
    pub text: String,
    pub blocks: Vec<Block>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl Message {
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            text: fallback.into(),
            blocks: Vec::new(),
            attachments: Vec::new(),
        }
    }

    pub fn push_block(&mut self, block: Block) {
        self.blocks.push(block);
    }

    pub fn push_attachment(&mut self, attachment: Attachment) {
        self.attachments.push(attachment);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
