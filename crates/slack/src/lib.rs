//! Slack Web API client, Block Kit message types, and the pure message
//! renderers for events and digests.

pub mod blocks;
pub mod client;
pub mod render;

pub use blocks::{Attachment, Block, Message};
pub use client::{SlackClient, SlackError};
