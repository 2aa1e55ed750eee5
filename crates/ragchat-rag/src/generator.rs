//! Prompt assembly and streamed answer generation

use futures::stream::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tracing::debug;

use ragchat_core::{ChatMessage, ChatModelProvider, Error, Result, RetrievedContext, TokenStream};

/// Persona used when no system prompt is configured
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant answering questions about \
the documents you have been given. Answer succinctly and only based on the provided context. \
When you use information from the context, quote the passage you relied on as your source. \
If a question cannot be answered from the context, politely decline to answer it.";

/// Builds augmented prompts and streams the model's answer
pub struct AnswerGenerator {
    model: Arc<dyn ChatModelProvider>,
    system_prompt: String,
}

impl AnswerGenerator {
    pub fn new(model: Arc<dyn ChatModelProvider>) -> Self {
        Self {
            model,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Prompt messages sent to the chat model: the system instruction, then one user turn
    pub fn build_prompt(&self, question: &str, context: &RetrievedContext) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system_prompt.clone()),
            ChatMessage::user(augment_question(question, context)),
        ]
    }

    /// Start generating an answer
    ///
    /// The returned stream is consumed once. A failure before the first
    /// fragment is reported as a generation error with no partial text.
    pub async fn generate(
        &self,
        question: &str,
        context: &RetrievedContext,
    ) -> Result<AnswerStream> {
        let messages = self.build_prompt(question, context);
        debug!(
            model = self.model.model_id(),
            context_chunks = context.len(),
            "starting answer generation"
        );
        let inner = self
            .model
            .stream_complete(&messages)
            .await
            .map_err(|e| into_generation_error(e, String::new()))?;
        Ok(AnswerStream::new(inner))
    }
}

/// User turn carrying the retrieved context ahead of the question
pub fn augment_question(question: &str, context: &RetrievedContext) -> String {
    format!("Context: {}\n\nQuestion: {}\n", context.joined(), question)
}

fn into_generation_error(err: Error, partial: String) -> Error {
    match err {
        Error::Generation { message, partial: earlier } if partial.is_empty() => {
            Error::Generation {
                message,
                partial: earlier,
            }
        }
        Error::Generation { message, .. } => Error::Generation { message, partial },
        other => Error::Generation {
            message: other.to_string(),
            partial,
        },
    }
}

/// Answer fragments in generation order, accumulating the full answer as they pass
///
/// Any error from the model ends the stream as [`Error::Generation`] carrying
/// the text produced so far.
pub struct AnswerStream {
    inner: TokenStream,
    answer: String,
    done: bool,
}

impl AnswerStream {
    pub fn new(inner: TokenStream) -> Self {
        Self {
            inner,
            answer: String::new(),
            done: false,
        }
    }

    /// Concatenation of every fragment yielded so far
    pub fn answer_so_far(&self) -> &str {
        &self.answer
    }

    pub fn into_answer(self) -> String {
        self.answer
    }

    /// Drain the stream, handing each fragment to `on_fragment` as it arrives
    pub async fn collect_answer<F>(mut self, mut on_fragment: F) -> Result<String>
    where
        F: FnMut(&str),
    {
        while let Some(fragment) = self.next().await {
            on_fragment(&fragment?);
        }
        Ok(self.answer)
    }
}

impl Stream for AnswerStream {
    type Item = Result<String>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }
        match this.inner.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(fragment))) => {
                this.answer.push_str(&fragment);
                Poll::Ready(Some(Ok(fragment)))
            }
            Poll::Ready(Some(Err(err))) => {
                this.done = true;
                Poll::Ready(Some(Err(into_generation_error(err, this.answer.clone()))))
            }
            Poll::Ready(None) => {
                this.done = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
