use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::Mutex;

use crate::models::message::Message;
use crate::models::tool::Tool;
use crate::providers::base::{CompletionOptions, Provider, Usage};

/// A mock provider that returns pre-configured responses for testing
pub struct MockProvider {
    responses: Arc<Mutex<Vec<Message>>>,
    requests: Arc<Mutex<Vec<Vec<Message>>>>,
    offers: Arc<Mutex<Vec<(Vec<Tool>, CompletionOptions)>>>,
}

impl MockProvider {
    /// Create a new mock provider with a sequence of responses
    pub fn new(responses: Vec<Message>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            requests: Arc::new(Mutex::new(Vec::new())),
            offers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Handle to the conversations the provider was called with
    pub fn requests(&self) -> Arc<Mutex<Vec<Vec<Message>>>> {
        self.requests.clone()
    }

    /// Handle to the tools and options offered with each call
    pub fn offers(&self) -> Arc<Mutex<Vec<(Vec<Tool>, CompletionOptions)>>> {
        self.offers.clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[Tool],
        options: &CompletionOptions,
    ) -> Result<(Message, Usage)> {
        self.requests.lock().unwrap().push(messages.to_vec());
        self.offers
            .lock()
            .unwrap()
            .push((tools.to_vec(), options.clone()));
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            // Return empty response if no more pre-configured responses
            Ok((Message::assistant().with_text(""), Usage::default()))
        } else {
            Ok((responses.remove(0), Usage::default()))
        }
    }
}
