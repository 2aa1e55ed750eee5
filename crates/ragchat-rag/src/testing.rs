//! Hand-written doubles for the capability traits

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use ragchat_core::{
    ChatMessage, ChatModelProvider, EmbeddingProvider, Error, Notifier, Result, TokenStream,
};

use crate::HashingEmbedder;

/// One step of a scripted model response
#[derive(Debug, Clone)]
pub enum Step {
    Fragment(&'static str),
    Fail(&'static str),
}

/// Chat model that replays one script per call and records every prompt
#[derive(Default)]
pub struct ScriptedChatModel {
    scripts: Mutex<VecDeque<Vec<Step>>>,
    prompts: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedChatModel {
    pub fn new(scripts: Vec<Vec<Step>>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(fragments: &[&'static str]) -> Self {
        Self::new(vec![fragments.iter().map(|f| Step::Fragment(*f)).collect()])
    }

    pub fn prompts(&self) -> Vec<Vec<ChatMessage>> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatModelProvider for ScriptedChatModel {
    async fn stream_complete(&self, messages: &[ChatMessage]) -> Result<TokenStream> {
        self.prompts.lock().unwrap().push(messages.to_vec());
        let script = self.scripts.lock().unwrap().pop_front().unwrap_or_default();
        let items: Vec<Result<String>> = script
            .into_iter()
            .map(|step| match step {
                Step::Fragment(text) => Ok(text.to_string()),
                Step::Fail(message) => Err(Error::Network(message.to_string())),
            })
            .collect();
        Ok(stream::iter(items).boxed())
    }

    fn model_id(&self) -> &str {
        "test/scripted"
    }
}

/// Hashing embedder that counts how often each mode is used
#[derive(Default)]
pub struct CountingEmbedder {
    inner: HashingEmbedder,
    documents: AtomicUsize,
    queries: AtomicUsize,
}

impl CountingEmbedder {
    pub fn document_calls(&self) -> usize {
        self.documents.load(Ordering::SeqCst)
    }

    pub fn query_calls(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for CountingEmbedder {
    async fn embed_document(&self, text: &str) -> Result<Vec<f32>> {
        self.documents.fetch_add(1, Ordering::SeqCst);
        self.inner.embed_document(text).await
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.inner.embed_query(text).await
    }

    fn model_id(&self) -> &str {
        "test/counting"
    }
}

/// Notifier that keeps every (name, question, answer) it receives
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String, String)>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(String, String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, user_name: &str, question: &str, answer: &str) -> Result<()> {
        self.sent.lock().unwrap().push((
            user_name.to_string(),
            question.to_string(),
            answer.to_string(),
        ));
        Ok(())
    }
}

/// Notifier whose side-channel is always down
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(&self, _user_name: &str, _question: &str, _answer: &str) -> Result<()> {
        Err(Error::Notification("webhook unreachable".to_string()))
    }
}
