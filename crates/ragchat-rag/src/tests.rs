//! End-to-end session tests against in-process doubles

#[cfg(test)]
mod session_tests {
    use insta::assert_yaml_snapshot;
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    use crate::testing::{
        CountingEmbedder, FailingNotifier, RecordingNotifier, ScriptedChatModel, Step,
    };
    use crate::{
        HashingEmbedder, IngestionOutcome, Providers, Reply, Session, SessionState, VectorIndex,
    };
    use ragchat_core::{EmbeddingProvider, Error, Notifier, RagConfig, ReusePolicy, Role};

    const DEADLINE: &str = "Application deadline is March 1st.";

    fn config(root: &Path) -> RagConfig {
        RagConfig {
            docs_dir: root.join("docs"),
            snapshot_path: root.join("vectorstore.json"),
            ..Default::default()
        }
    }

    fn write_doc(root: &Path, name: &str, content: &str) {
        let docs = root.join("docs");
        fs::create_dir_all(&docs).unwrap();
        fs::write(docs.join(name), content).unwrap();
    }

    fn providers(
        embedder: &Arc<CountingEmbedder>,
        model: &Arc<ScriptedChatModel>,
        notifier: Arc<dyn Notifier>,
    ) -> Providers {
        Providers {
            embedder: embedder.clone(),
            chat_model: model.clone(),
            notifier,
        }
    }

    #[tokio::test]
    async fn test_single_document_answer_uses_retrieved_context() {
        let dir = TempDir::new().unwrap();
        write_doc(dir.path(), "deadline.txt", DEADLINE);
        let embedder = Arc::new(CountingEmbedder::default());
        let model = Arc::new(ScriptedChatModel::replying(&["March 1st."]));
        let notifier = Arc::new(RecordingNotifier::default());

        let mut session = Session::start(
            config(dir.path()),
            providers(&embedder, &model, notifier.clone()),
        )
        .await
        .unwrap()
        .with_user_name("Mei");

        assert_eq!(session.state(), SessionState::Ready);
        assert!(matches!(
            session.outcome(),
            Some(IngestionOutcome::Built {
                documents: 1,
                chunks: 1,
                ..
            })
        ));
        assert_eq!(session.index().entries()[0].chunk.text, DEADLINE);

        let reply = session.ask("when is the deadline", |_| {}).await.unwrap();
        assert_eq!(reply, Reply::Answered("March 1st.".to_string()));

        let prompts = model.prompts();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0][0].role, Role::System);
        assert_eq!(prompts[0][1].role, Role::User);
        assert!(prompts[0][1]
            .content
            .contains("Context: Application deadline is March 1st."));
        assert!(prompts[0][1].content.contains("when is the deadline"));

        assert_eq!(
            notifier.sent(),
            vec![(
                "Mei".to_string(),
                "when is the deadline".to_string(),
                "March 1st.".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn test_empty_directory_reports_no_knowledge_base() {
        let dir = TempDir::new().unwrap();
        let embedder = Arc::new(CountingEmbedder::default());
        let model = Arc::new(ScriptedChatModel::replying(&["unused"]));
        let notifier = Arc::new(RecordingNotifier::default());

        let mut session = Session::start(
            config(dir.path()),
            providers(&embedder, &model, notifier.clone()),
        )
        .await
        .unwrap();

        assert_eq!(session.outcome(), Some(&IngestionOutcome::Empty));
        assert!(dir.path().join("docs").is_dir());
        assert!(!dir.path().join("vectorstore.json").exists());

        let reply = session.ask("anything at all?", |_| {}).await.unwrap();
        assert_eq!(reply, Reply::NoKnowledgeBase);
        assert_eq!(model.calls(), 0);
        assert_eq!(embedder.query_calls(), 0);
        assert!(session.transcript().is_empty());
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_existing_snapshot_is_reused_without_reading_documents() {
        let dir = TempDir::new().unwrap();
        write_doc(dir.path(), "deadline.txt", DEADLINE);
        let model = Arc::new(ScriptedChatModel::default());
        let notifier = Arc::new(RecordingNotifier::default());

        let first_embedder = Arc::new(CountingEmbedder::default());
        Session::start(
            config(dir.path()),
            providers(&first_embedder, &model, notifier.clone()),
        )
        .await
        .unwrap();
        assert_eq!(first_embedder.document_calls(), 1);

        write_doc(dir.path(), "housing.txt", "Housing is guaranteed.");

        let second_embedder = Arc::new(CountingEmbedder::default());
        let session = Session::start(
            config(dir.path()),
            providers(&second_embedder, &model, notifier),
        )
        .await
        .unwrap();

        assert_eq!(
            session.outcome(),
            Some(&IngestionOutcome::Reused { chunks: 1 })
        );
        assert_eq!(second_embedder.document_calls(), 0);
        assert_eq!(session.index().len(), 1);
    }

    #[tokio::test]
    async fn test_always_rebuild_ignores_existing_snapshot() {
        let dir = TempDir::new().unwrap();
        write_doc(dir.path(), "deadline.txt", DEADLINE);
        let model = Arc::new(ScriptedChatModel::default());
        let embedder = Arc::new(CountingEmbedder::default());
        let notifier = Arc::new(RecordingNotifier::default());

        Session::start(
            config(dir.path()),
            providers(&embedder, &model, notifier.clone()),
        )
        .await
        .unwrap();
        write_doc(dir.path(), "housing.txt", "Housing is guaranteed.");

        let rebuild = RagConfig {
            reuse: ReusePolicy::AlwaysRebuild,
            ..config(dir.path())
        };
        let session = Session::start(rebuild, providers(&embedder, &model, notifier))
            .await
            .unwrap();

        assert!(matches!(
            session.outcome(),
            Some(IngestionOutcome::Built {
                documents: 2,
                chunks: 2,
                ..
            })
        ));
        let reloaded = VectorIndex::load(&dir.path().join("vectorstore.json")).unwrap();
        assert_eq!(reloaded.len(), 2);
    }

    #[tokio::test]
    async fn test_fragments_reach_caller_in_order() {
        let dir = TempDir::new().unwrap();
        write_doc(dir.path(), "deadline.txt", DEADLINE);
        let fragments = ["Ap", "plication", " deadline", " is March 1."];
        let embedder = Arc::new(CountingEmbedder::default());
        let model = Arc::new(ScriptedChatModel::replying(&fragments));
        let notifier = Arc::new(RecordingNotifier::default());

        let mut session = Session::start(
            config(dir.path()),
            providers(&embedder, &model, notifier),
        )
        .await
        .unwrap();

        let mut seen = Vec::new();
        let reply = session
            .ask("when is the deadline", |fragment| seen.push(fragment.to_string()))
            .await
            .unwrap();

        assert_eq!(seen, fragments);
        assert_eq!(
            reply,
            Reply::Answered("Application deadline is March 1.".to_string())
        );
        assert_yaml_snapshot!(session.transcript(), @r###"
        - role: user
          content: when is the deadline
        - role: assistant
          content: Application deadline is March 1.
        "###);
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_falls_back_to_rebuild() {
        let dir = TempDir::new().unwrap();
        write_doc(dir.path(), "deadline.txt", DEADLINE);
        let snapshot = dir.path().join("vectorstore.json");
        fs::write(&snapshot, b"\x80\x04\x95 not an index").unwrap();
        let embedder = Arc::new(CountingEmbedder::default());
        let model = Arc::new(ScriptedChatModel::default());
        let notifier = Arc::new(RecordingNotifier::default());

        let session = Session::start(
            config(dir.path()),
            providers(&embedder, &model, notifier),
        )
        .await
        .unwrap();

        assert!(matches!(
            session.outcome(),
            Some(IngestionOutcome::RebuiltAfterCorruption {
                documents: 1,
                chunks: 1,
                ..
            })
        ));
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(VectorIndex::load(&snapshot).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_from_other_embedder_is_rebuilt() {
        let dir = TempDir::new().unwrap();
        write_doc(dir.path(), "deadline.txt", DEADLINE);
        let model = Arc::new(ScriptedChatModel::new(vec![
            vec![Step::Fragment("March 1st.")],
            vec![Step::Fragment("Still March 1st.")],
        ]));
        let notifier = Arc::new(RecordingNotifier::default());

        let counting = Arc::new(CountingEmbedder::default());
        Session::start(
            config(dir.path()),
            providers(&counting, &model, notifier.clone()),
        )
        .await
        .unwrap();

        let wider = Arc::new(HashingEmbedder::new(1024));
        let mut session = Session::start(
            config(dir.path()),
            Providers {
                embedder: wider.clone(),
                chat_model: model.clone(),
                notifier: notifier.clone(),
            },
        )
        .await
        .unwrap();

        assert_eq!(
            session.outcome(),
            Some(&IngestionOutcome::RebuiltAfterModelChange {
                documents: 1,
                chunks: 1,
                previous_model: "test/counting".to_string(),
            })
        );
        assert_eq!(session.index().dimension(), 1024);
        let reply = session.ask("when is the deadline", |_| {}).await.unwrap();
        assert_eq!(reply, Reply::Answered("March 1st.".to_string()));

        let reloaded = VectorIndex::load(&dir.path().join("vectorstore.json")).unwrap();
        assert_eq!(reloaded.model(), wider.model_id());

        let session = Session::start(
            config(dir.path()),
            Providers {
                embedder: wider,
                chat_model: model,
                notifier,
            },
        )
        .await
        .unwrap();
        assert_eq!(
            session.outcome(),
            Some(&IngestionOutcome::Reused { chunks: 1 })
        );
    }

    #[tokio::test]
    async fn test_last_sources_follow_retrieval_rank() {
        let dir = TempDir::new().unwrap();
        write_doc(dir.path(), "deadline.txt", DEADLINE);
        write_doc(dir.path(), "housing.txt", "Housing is guaranteed for exchange students.");
        let embedder = Arc::new(CountingEmbedder::default());
        let model = Arc::new(ScriptedChatModel::replying(&["March 1st."]));

        let mut session = Session::start(
            RagConfig {
                top_k: 1,
                ..config(dir.path())
            },
            providers(&embedder, &model, Arc::new(RecordingNotifier::default())),
        )
        .await
        .unwrap();
        assert!(session.last_sources().is_empty());

        session.ask("when is the application deadline", |_| {}).await.unwrap();
        assert_eq!(
            session.last_sources(),
            &[dir.path().join("docs").join("deadline.txt")]
        );

        session.ask("  ", |_| {}).await.unwrap();
        assert!(session.last_sources().is_empty());
    }

    #[tokio::test]
    async fn test_generation_failure_keeps_partial_and_session_ready() {
        let dir = TempDir::new().unwrap();
        write_doc(dir.path(), "deadline.txt", DEADLINE);
        let embedder = Arc::new(CountingEmbedder::default());
        let model = Arc::new(ScriptedChatModel::new(vec![
            vec![
                Step::Fragment("Ap"),
                Step::Fragment("plication"),
                Step::Fail("quota exceeded"),
            ],
            vec![Step::Fragment("March 1st.")],
        ]));
        let notifier = Arc::new(RecordingNotifier::default());

        let mut session = Session::start(
            config(dir.path()),
            providers(&embedder, &model, notifier.clone()),
        )
        .await
        .unwrap();

        let mut shown = String::new();
        let err = session
            .ask("when is the deadline", |fragment| shown.push_str(fragment))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Generation { .. }));
        assert_eq!(err.partial_text(), Some("Application"));
        assert_eq!(shown, "Application");
        assert_eq!(session.transcript().len(), 2);
        assert_eq!(session.transcript()[1].content, "Application");
        assert!(notifier.sent().is_empty());

        assert_eq!(session.state(), SessionState::Ready);
        let reply = session.ask("and the deadline?", |_| {}).await.unwrap();
        assert_eq!(reply, Reply::Answered("March 1st.".to_string()));
        assert_eq!(session.transcript().len(), 4);
    }

    #[tokio::test]
    async fn test_notification_failure_is_not_fatal() {
        let dir = TempDir::new().unwrap();
        write_doc(dir.path(), "deadline.txt", DEADLINE);
        let embedder = Arc::new(CountingEmbedder::default());
        let model = Arc::new(ScriptedChatModel::replying(&["March 1st."]));

        let mut session = Session::start(
            config(dir.path()),
            providers(&embedder, &model, Arc::new(FailingNotifier)),
        )
        .await
        .unwrap();

        let reply = session.ask("when is the deadline", |_| {}).await.unwrap();
        assert_eq!(reply, Reply::Answered("March 1st.".to_string()));
        assert_eq!(session.transcript().len(), 2);
    }

    #[tokio::test]
    async fn test_blank_question_is_ignored() {
        let dir = TempDir::new().unwrap();
        write_doc(dir.path(), "deadline.txt", DEADLINE);
        let embedder = Arc::new(CountingEmbedder::default());
        let model = Arc::new(ScriptedChatModel::replying(&["unused"]));

        let mut session = Session::start(
            config(dir.path()),
            providers(&embedder, &model, Arc::new(RecordingNotifier::default())),
        )
        .await
        .unwrap();

        assert_eq!(session.ask("   ", |_| {}).await.unwrap(), Reply::Ignored);
        assert_eq!(embedder.query_calls(), 0);
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_questions_rejected_before_ingestion() {
        let dir = TempDir::new().unwrap();
        let embedder = Arc::new(CountingEmbedder::default());
        let model = Arc::new(ScriptedChatModel::default());
        let mut session = Session::new(
            config(dir.path()),
            providers(&embedder, &model, Arc::new(RecordingNotifier::default())),
        )
        .unwrap();

        assert_eq!(session.state(), SessionState::Ingesting);
        assert!(session.ask("too early", |_| {}).await.is_err());
    }
}
