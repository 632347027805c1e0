use std::collections::VecDeque;

use super::message::Message;
use super::role::Role;
use crate::errors::{AgentError, AgentResult};

/// The ordered message history of one conversation.
///
/// Messages are only ever appended; the agent pushes assistant and tool messages
/// onto the caller's conversation, so the caller observes the full exchange.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Check that every tool call is answered exactly once, in the order it was
    /// issued, before anything else is added to the conversation.
    pub fn validate(&self) -> AgentResult<()> {
        let mut pending: VecDeque<&str> = VecDeque::new();

        for (index, message) in self.messages.iter().enumerate() {
            match message.role {
                Role::Tool => {
                    let id = message.tool_call_id.as_deref().ok_or_else(|| {
                        AgentError::Internal(format!("tool message {} has no tool_call_id", index))
                    })?;
                    match pending.pop_front() {
                        Some(expected) if expected == id => {}
                        Some(expected) => {
                            return Err(AgentError::Internal(format!(
                                "tool message {} answers {} but {} was expected",
                                index, id, expected
                            )))
                        }
                        None => {
                            return Err(AgentError::Internal(format!(
                                "tool message {} answers {} which is not pending",
                                index, id
                            )))
                        }
                    }
                }
                _ => {
                    if let Some(expected) = pending.front() {
                        return Err(AgentError::Internal(format!(
                            "message {} follows unanswered tool call {}",
                            index, expected
                        )));
                    }
                    if message.role == Role::Assistant {
                        pending.extend(message.tool_calls.iter().map(|call| call.id.as_str()));
                    }
                }
            }
        }

        match pending.front() {
            Some(expected) => Err(AgentError::Internal(format!(
                "tool call {} was never answered",
                expected
            ))),
            None => Ok(()),
        }
    }
}
