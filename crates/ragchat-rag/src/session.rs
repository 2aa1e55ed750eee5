//! Session orchestration: one ingestion, then sequential questions

use futures::StreamExt;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use ragchat_core::{
    ChatMessage, ChatModelProvider, ConversationMessage, EmbeddingProvider, Error, Notifier,
    RagConfig, Result, ReusePolicy,
};

use crate::chunker::Chunker;
use crate::generator::AnswerGenerator;
use crate::index::VectorIndex;
use crate::loader::DocumentLoader;

/// Shown instead of an answer when the index holds nothing
pub const NO_KNOWLEDGE_BASE_NOTICE: &str =
    "No knowledge base available. Add documents to the document directory and restart.";

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Ingesting,
    Ready,
}

/// How the index for this session came to be
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestionOutcome {
    /// An existing snapshot was loaded; documents were not read
    Reused { chunks: usize },
    /// The index was built from the document directory and saved
    Built {
        documents: usize,
        chunks: usize,
        snapshot: PathBuf,
    },
    /// The snapshot could not be read, so the index was rebuilt from documents
    RebuiltAfterCorruption {
        documents: usize,
        chunks: usize,
        reason: String,
    },
    /// The snapshot was built with another embedding model, so the index was rebuilt
    RebuiltAfterModelChange {
        documents: usize,
        chunks: usize,
        previous_model: String,
    },
    /// Nothing to index
    Empty,
}

impl fmt::Display for IngestionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestionOutcome::Reused { chunks } => {
                write!(f, "Loaded existing knowledge base ({} chunks)", chunks)
            }
            IngestionOutcome::Built {
                documents,
                chunks,
                snapshot,
            } => write!(
                f,
                "Built knowledge base from {} documents ({} chunks), saved to {}",
                documents,
                chunks,
                snapshot.display()
            ),
            IngestionOutcome::RebuiltAfterCorruption {
                documents,
                chunks,
                reason,
            } => write!(
                f,
                "Existing knowledge base was unreadable ({}); rebuilt from {} documents ({} chunks)",
                reason, documents, chunks
            ),
            IngestionOutcome::RebuiltAfterModelChange {
                documents,
                chunks,
                previous_model,
            } => write!(
                f,
                "Existing knowledge base was built with '{}'; rebuilt from {} documents ({} chunks)",
                previous_model, documents, chunks
            ),
            IngestionOutcome::Empty => write!(f, "No documents available"),
        }
    }
}

/// Why a present snapshot was not reused
enum RebuildCause {
    Corrupt(String),
    ModelChanged(String),
}

/// Result of one question
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The complete answer, already delivered fragment by fragment
    Answered(String),
    /// The index is empty; nothing was retrieved or generated
    NoKnowledgeBase,
    /// Blank input
    Ignored,
}

/// Capabilities a session is wired to, constructed once at startup
#[derive(Clone)]
pub struct Providers {
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub chat_model: Arc<dyn ChatModelProvider>,
    pub notifier: Arc<dyn Notifier>,
}

/// Owns the index and the transcript of one interactive session
pub struct Session {
    config: RagConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    notifier: Arc<dyn Notifier>,
    generator: AnswerGenerator,
    user_name: String,
    state: SessionState,
    outcome: Option<IngestionOutcome>,
    index: VectorIndex,
    transcript: Vec<ConversationMessage>,
    last_sources: Vec<PathBuf>,
}

impl Session {
    pub fn new(config: RagConfig, providers: Providers) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            embedder: providers.embedder,
            notifier: providers.notifier,
            generator: AnswerGenerator::new(providers.chat_model),
            user_name: "Anon".to_string(),
            state: SessionState::Ingesting,
            outcome: None,
            index: VectorIndex::empty(),
            transcript: Vec::new(),
            last_sources: Vec::new(),
        })
    }

    /// Create a session and run ingestion, returning it ready for questions
    pub async fn start(config: RagConfig, providers: Providers) -> Result<Self> {
        let mut session = Self::new(config, providers)?;
        session.ingest().await?;
        Ok(session)
    }

    pub fn with_user_name(mut self, user_name: impl Into<String>) -> Self {
        self.user_name = user_name.into();
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.generator = self.generator.with_system_prompt(system_prompt);
        self
    }

    /// Load or build the index, then move to [`SessionState::Ready`]
    ///
    /// Runs at most once; later calls return the recorded outcome.
    pub async fn ingest(&mut self) -> Result<IngestionOutcome> {
        if let Some(outcome) = &self.outcome {
            return Ok(outcome.clone());
        }

        let loader = DocumentLoader::new(&self.config.docs_dir, self.config.recursive);
        loader.ensure_dir()?;

        let snapshot_path = self.config.snapshot_path.clone();
        let mut rebuild_cause = None;
        if self.config.reuse == ReusePolicy::ReuseIfPresent && snapshot_path.is_file() {
            match VectorIndex::load(&snapshot_path) {
                Ok(index) if index.model() != self.embedder.model_id() => {
                    warn!(
                        path = %snapshot_path.display(),
                        snapshot_model = index.model(),
                        embedder = self.embedder.model_id(),
                        "snapshot was built with a different embedding model, rebuilding"
                    );
                    rebuild_cause = Some(RebuildCause::ModelChanged(index.model().to_string()));
                }
                Ok(index) => {
                    info!(path = %snapshot_path.display(), chunks = index.len(), "reusing existing snapshot");
                    let outcome = IngestionOutcome::Reused {
                        chunks: index.len(),
                    };
                    return Ok(self.finish_ingestion(index, outcome));
                }
                Err(Error::CorruptSnapshot { reason, .. }) => {
                    warn!(path = %snapshot_path.display(), %reason, "snapshot is corrupt, rebuilding");
                    rebuild_cause = Some(RebuildCause::Corrupt(reason));
                }
                Err(e) => return Err(e),
            }
        } else {
            info!(policy = ?self.config.reuse, "building index from documents");
        }

        let documents = loader.load()?;
        let chunks = Chunker::new(self.config.chunking)?.split_documents(&documents);
        let chunk_count = chunks.len();
        info!(documents = documents.len(), chunks = chunk_count, "chunked documents");

        let index = VectorIndex::build(chunks, self.embedder.as_ref()).await?;
        if !index.is_empty() {
            index.persist(&snapshot_path)?;
        }

        let outcome = match rebuild_cause {
            Some(RebuildCause::Corrupt(reason)) => IngestionOutcome::RebuiltAfterCorruption {
                documents: documents.len(),
                chunks: chunk_count,
                reason,
            },
            Some(RebuildCause::ModelChanged(previous_model)) => {
                IngestionOutcome::RebuiltAfterModelChange {
                    documents: documents.len(),
                    chunks: chunk_count,
                    previous_model,
                }
            }
            None if index.is_empty() => IngestionOutcome::Empty,
            None => IngestionOutcome::Built {
                documents: documents.len(),
                chunks: chunk_count,
                snapshot: snapshot_path,
            },
        };
        Ok(self.finish_ingestion(index, outcome))
    }

    fn finish_ingestion(&mut self, index: VectorIndex, outcome: IngestionOutcome) -> IngestionOutcome {
        self.index = index;
        self.outcome = Some(outcome.clone());
        self.state = SessionState::Ready;
        outcome
    }

    /// Answer one question, passing each fragment to `on_fragment` as it arrives
    ///
    /// A generation failure leaves the question and any partial answer in the
    /// transcript and returns [`Error::Generation`]; the session stays ready.
    /// Notification failures are logged and otherwise ignored.
    pub async fn ask<F>(&mut self, question: &str, mut on_fragment: F) -> Result<Reply>
    where
        F: FnMut(&str),
    {
        if self.state != SessionState::Ready {
            return Err(Error::Other(
                "questions are accepted only after ingestion".to_string(),
            ));
        }
        let question = question.trim();
        self.last_sources.clear();
        if question.is_empty() {
            return Ok(Reply::Ignored);
        }
        if self.index.is_empty() {
            return Ok(Reply::NoKnowledgeBase);
        }

        let context = self
            .index
            .query(question, self.embedder.as_ref(), self.config.top_k)
            .await?;
        info!(hits = context.len(), "retrieved context");
        self.last_sources = context
            .sources()
            .into_iter()
            .map(Path::to_path_buf)
            .collect();

        let mut stream = match self.generator.generate(question, &context).await {
            Ok(stream) => stream,
            Err(e) => {
                self.transcript.push(ChatMessage::user(question));
                return Err(e);
            }
        };

        while let Some(fragment) = stream.next().await {
            match fragment {
                Ok(fragment) => on_fragment(&fragment),
                Err(e) => {
                    self.transcript.push(ChatMessage::user(question));
                    if let Some(partial) = e.partial_text() {
                        self.transcript.push(ChatMessage::assistant(partial));
                    }
                    return Err(e);
                }
            }
        }
        let answer = stream.into_answer();

        self.transcript.push(ChatMessage::user(question));
        self.transcript.push(ChatMessage::assistant(answer.clone()));

        if let Err(e) = self
            .notifier
            .notify(&self.user_name, question, &answer)
            .await
        {
            warn!(error = %e, "failed to send notification");
        }

        Ok(Reply::Answered(answer))
    }

    pub fn transcript(&self) -> &[ConversationMessage] {
        &self.transcript
    }

    /// Source files of the chunks retrieved for the most recent question, in rank order
    pub fn last_sources(&self) -> &[PathBuf] {
        &self.last_sources
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn outcome(&self) -> Option<&IngestionOutcome> {
        self.outcome.as_ref()
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn system_prompt(&self) -> &str {
        self.generator.system_prompt()
    }
}
