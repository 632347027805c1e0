//! These models represent the objects passed around by the agent
//!
//! There are a few related formats we need to interact with:
//! - openai chat messages/tools, sent from the agent to the LLM
//! - tool server requests and content, exchanged with an out-of-process tool session
//!
//! The conversation itself follows the chat-completions shape closely, so the
//! provider conversion is mostly a direct mapping. Tool server content is converted
//! into plain text before it enters the conversation.
pub mod content;
pub mod conversation;
pub mod message;
pub mod role;
pub mod tool;
