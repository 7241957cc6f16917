//! Multi-turn conversation session orchestration.

use std::mem;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::debug;

use crate::assembler::{AssembledPrompt, ContextAssembler};
use crate::config::SessionConfig;
use crate::embedding::EmbeddingModel;
use crate::error::{ChatError, Result};
use crate::generation::TextGenerator;
use crate::index::VectorIndex;
use crate::memory::{ConversationMemory, Role, Turn};
use crate::retriever::Retriever;
use crate::types::SearchResult;

/// Answer to one question, with provenance.
#[derive(Debug, Clone)]
pub struct Answer {
    /// The generated answer text.
    pub answer: String,
    /// The retrieved chunks the answer was grounded on, ranked.
    pub sources: Vec<SearchResult>,
}

/// Observable session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No index attached yet.
    Empty,
    /// Index attached, no completed turns.
    Ready,
    /// At least one completed exchange.
    Active,
    /// Terminal; all operations fail.
    Closed,
}

enum State {
    Empty,
    Ready(Arc<VectorIndex>),
    Active(Arc<VectorIndex>),
    Closed,
}

impl State {
    const fn name(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Ready(_) => "ready",
            Self::Active(_) => "active",
            Self::Closed => "closed",
        }
    }

    const fn observable(&self) -> SessionState {
        match self {
            Self::Empty => SessionState::Empty,
            Self::Ready(_) => SessionState::Ready,
            Self::Active(_) => SessionState::Active,
            Self::Closed => SessionState::Closed,
        }
    }
}

struct Inner {
    state: State,
    memory: ConversationMemory,
}

/// Orchestrates one conversation: retrieval, prompt assembly, generation,
/// and memory updates.
///
/// The session holds a read-only reference (`Arc`) to a [`VectorIndex`];
/// many sessions may share one index concurrently. The session's own mutable
/// state is serialized: a second [`ask`](ConversationSession::ask) while one
/// is in flight fails fast with [`ChatError::Busy`].
///
/// Both turns of an exchange are committed in a single lock acquisition
/// after generation succeeds, so a failed or cancelled `ask` leaves memory
/// exactly as it was.
pub struct ConversationSession<M, G> {
    embedder: Arc<M>,
    generator: Arc<G>,
    retriever: Retriever,
    assembler: ContextAssembler,
    history_window: Option<usize>,
    inner: Mutex<Inner>,
    busy: AtomicBool,
}

impl<M, G> std::fmt::Debug for ConversationSession<M, G>
where
    M: EmbeddingModel + Send + Sync + 'static,
    G: TextGenerator + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationSession")
            .field("state", &self.state())
            .field("top_k", &self.retriever.top_k())
            .finish_non_exhaustive()
    }
}

/// Releases the busy flag when an `ask` finishes or is cancelled.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .map_err(|_| ChatError::Busy)?;
        Ok(Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<M, G> ConversationSession<M, G>
where
    M: EmbeddingModel + Send + Sync + 'static,
    G: TextGenerator + Send + Sync + 'static,
{
    /// Creates a session with default configuration and no index attached.
    #[must_use]
    pub fn new(embedder: M, generator: G) -> Self {
        Self::from_parts(embedder, generator, &SessionConfig::default())
    }

    /// Creates a session with custom configuration.
    ///
    /// # Errors
    /// Returns [`ChatError::Configuration`] if the configuration is invalid.
    pub fn with_config(embedder: M, generator: G, config: &SessionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_parts(embedder, generator, config))
    }

    fn from_parts(embedder: M, generator: G, config: &SessionConfig) -> Self {
        Self {
            embedder: Arc::new(embedder),
            generator: Arc::new(generator),
            retriever: Retriever::new(config.top_k),
            assembler: ContextAssembler::new(config.max_context_chars),
            history_window: config.history_window,
            inner: Mutex::new(Inner {
                state: State::Empty,
                memory: ConversationMemory::new(),
            }),
            busy: AtomicBool::new(false),
        }
    }

    /// Attaches the corpus index: `Empty -> Ready`.
    ///
    /// # Errors
    /// [`ChatError::NotReady`] if an index is already attached (call
    /// [`reset`](ConversationSession::reset) first) and [`ChatError::Closed`]
    /// on a closed session.
    pub fn attach_index(&self, index: Arc<VectorIndex>) -> Result<()> {
        let mut inner = self.inner.lock();
        match inner.state {
            State::Empty => {
                inner.state = State::Ready(index);
                Ok(())
            }
            State::Closed => Err(ChatError::Closed),
            State::Ready(_) | State::Active(_) => Err(ChatError::NotReady {
                state: inner.state.name(),
            }),
        }
    }

    /// Asks a question: retrieve, assemble, generate, commit both turns.
    ///
    /// Valid in `Ready` or `Active`; a successful call moves `Ready` to
    /// `Active`. On generator failure memory and state are untouched and the
    /// caller may retry the same question. A concurrent `ask` on the same
    /// session fails fast with [`ChatError::Busy`] rather than queueing.
    ///
    /// # Errors
    /// [`ChatError::NotReady`] / [`ChatError::Closed`] in the wrong state,
    /// [`ChatError::Busy`] when another ask is in flight, plus retrieval and
    /// [`ChatError::Generation`] failures.
    pub async fn ask(&self, question: &str) -> Result<Answer> {
        let _busy = BusyGuard::acquire(&self.busy)?;

        let (index, history) = {
            let inner = self.inner.lock();
            let index = match &inner.state {
                State::Ready(index) | State::Active(index) => Arc::clone(index),
                State::Empty => {
                    return Err(ChatError::NotReady {
                        state: inner.state.name(),
                    });
                }
                State::Closed => return Err(ChatError::Closed),
            };
            (index, inner.memory.history())
        };

        let retrieved = self
            .retriever
            .retrieve(question, &*self.embedder, &index)
            .await?;
        let prompt = self.assemble(question, &retrieved, history);
        let answer = self
            .generator
            .generate(&prompt)
            .await
            .map_err(ChatError::Generation)?;

        // Single lock acquisition: both turns land, or neither. Re-check the
        // state in case the session was reset or closed mid-flight.
        {
            let mut inner = self.inner.lock();
            match inner.state {
                State::Ready(_) | State::Active(_) => {}
                State::Empty => {
                    return Err(ChatError::NotReady {
                        state: inner.state.name(),
                    });
                }
                State::Closed => return Err(ChatError::Closed),
            }
            inner.memory.append(Role::User, question);
            inner.memory.append(Role::Assistant, answer.clone());
            let state = mem::replace(&mut inner.state, State::Empty);
            inner.state = match state {
                State::Ready(index) | State::Active(index) => State::Active(index),
                other => other,
            };
        }

        debug!(sources = retrieved.len(), "exchange committed");
        Ok(Answer {
            answer,
            sources: retrieved,
        })
    }

    fn assemble(
        &self,
        question: &str,
        retrieved: &[SearchResult],
        history: Vec<Turn>,
    ) -> AssembledPrompt {
        let visible = match self.history_window {
            Some(window) => {
                let start = history.len().saturating_sub(window);
                &history[start..]
            }
            None => &history[..],
        };
        self.assembler.assemble(question, retrieved, visible)
    }

    /// Clears memory and detaches the index: back to `Empty`.
    ///
    /// # Errors
    /// [`ChatError::Closed`] on a closed session; `Closed` is terminal.
    pub fn reset(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        if matches!(inner.state, State::Closed) {
            return Err(ChatError::Closed);
        }
        inner.state = State::Empty;
        inner.memory.clear();
        Ok(())
    }

    /// Closes the session and releases its memory. Terminal.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        inner.state = State::Closed;
        inner.memory = ConversationMemory::new();
    }

    /// Current state of the session.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.lock().state.observable()
    }

    /// Snapshot of the conversation history.
    #[must_use]
    pub fn history(&self) -> Vec<Turn> {
        self.inner.lock().memory.history()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Segment;
    use futures::channel::oneshot;
    use futures::task::noop_waker;
    use std::future::Future;
    use std::pin::pin;
    use std::task::{Context, Poll};

    struct MockEmbedder;

    impl EmbeddingModel for MockEmbedder {
        fn dim(&self) -> usize {
            2
        }

        async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
            if text.contains("solar") {
                Ok(vec![1.0, 0.0])
            } else {
                Ok(vec![0.0, 1.0])
            }
        }
    }

    /// Echoes the context block so tests can see what the generator saw.
    struct EchoGenerator;

    impl TextGenerator for EchoGenerator {
        async fn generate(&self, prompt: &AssembledPrompt) -> anyhow::Result<String> {
            Ok(format!(
                "[{} turns] {}",
                prompt.history.len(),
                prompt.context_block
            ))
        }
    }

    struct FailingGenerator;

    impl TextGenerator for FailingGenerator {
        async fn generate(&self, _prompt: &AssembledPrompt) -> anyhow::Result<String> {
            anyhow::bail!("rate limited")
        }
    }

    /// Signals when generation starts, then waits for a release signal.
    struct GatedGenerator {
        started: Mutex<Option<oneshot::Sender<()>>>,
        release: Mutex<Option<oneshot::Receiver<()>>>,
    }

    impl TextGenerator for GatedGenerator {
        async fn generate(&self, _prompt: &AssembledPrompt) -> anyhow::Result<String> {
            if let Some(started) = self.started.lock().take() {
                let _ = started.send(());
            }
            let release = self.release.lock().take();
            if let Some(release) = release {
                let _ = release.await;
            }
            Ok("gated answer".into())
        }
    }

    async fn corpus_index() -> Arc<VectorIndex> {
        Arc::new(
            VectorIndex::build(
                vec![
                    Segment::new("solar panels convert sunlight", 0),
                    Segment::new("wind turbines spin", 30),
                ],
                &MockEmbedder,
            )
            .await
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn first_ask_moves_ready_to_active() {
        let session = ConversationSession::new(MockEmbedder, EchoGenerator);
        assert_eq!(session.state(), SessionState::Empty);

        session.attach_index(corpus_index().await).unwrap();
        assert_eq!(session.state(), SessionState::Ready);

        let answer = session.ask("how do solar panels work?").await.unwrap();
        assert_eq!(session.state(), SessionState::Active);
        assert!(answer.answer.contains("solar panels convert sunlight"));
        assert!(!answer.sources.is_empty());

        let history = session.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[0].content, "how do solar panels work?");
        assert_eq!(history[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn ask_without_index_is_not_ready() {
        let session = ConversationSession::new(MockEmbedder, EchoGenerator);
        let err = session.ask("anything").await.unwrap_err();
        assert!(matches!(err, ChatError::NotReady { state: "empty" }));
    }

    #[tokio::test]
    async fn attach_twice_requires_reset() {
        let session = ConversationSession::new(MockEmbedder, EchoGenerator);
        let index = corpus_index().await;
        session.attach_index(Arc::clone(&index)).unwrap();
        assert!(matches!(
            session.attach_index(Arc::clone(&index)).unwrap_err(),
            ChatError::NotReady { .. }
        ));

        session.reset().unwrap();
        assert_eq!(session.state(), SessionState::Empty);
        session.attach_index(index).unwrap();
    }

    #[tokio::test]
    async fn failed_generation_leaves_memory_and_state_untouched() {
        let session = ConversationSession::new(MockEmbedder, FailingGenerator);
        session.attach_index(corpus_index().await).unwrap();

        let err = session.ask("solar?").await.unwrap_err();
        assert!(matches!(err, ChatError::Generation(_)));
        assert_eq!(session.state(), SessionState::Ready);
        assert!(session.history().is_empty());

        // Retrying the same question hits the same error, still atomically.
        let _ = session.ask("solar?").await.unwrap_err();
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn closed_session_rejects_everything() {
        let session = ConversationSession::new(MockEmbedder, EchoGenerator);
        session.attach_index(corpus_index().await).unwrap();
        session.close();

        assert_eq!(session.state(), SessionState::Closed);
        assert!(matches!(
            session.ask("q").await.unwrap_err(),
            ChatError::Closed
        ));
        assert!(matches!(session.reset().unwrap_err(), ChatError::Closed));
        assert!(matches!(
            session.attach_index(corpus_index().await).unwrap_err(),
            ChatError::Closed
        ));
    }

    #[tokio::test]
    async fn concurrent_ask_fails_fast_with_busy() {
        let (started_tx, started_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        let generator = GatedGenerator {
            started: Mutex::new(Some(started_tx)),
            release: Mutex::new(Some(release_rx)),
        };
        let session = Arc::new(ConversationSession::new(MockEmbedder, generator));
        session.attach_index(corpus_index().await).unwrap();

        let worker = Arc::clone(&session);
        let handle = tokio::spawn(async move { worker.ask("first question").await });

        started_rx.await.unwrap();
        assert!(matches!(
            session.ask("second question").await.unwrap_err(),
            ChatError::Busy
        ));

        release_tx.send(()).unwrap();
        let answer = handle.await.unwrap().unwrap();
        assert_eq!(answer.answer, "gated answer");
        assert_eq!(session.history().len(), 2);

        // The busy flag is released once the first ask completes.
        session.ask("third question").await.unwrap();
        assert_eq!(session.history().len(), 4);
    }

    #[tokio::test]
    async fn cancelled_ask_leaves_no_trace() {
        let (started_tx, _started_rx) = oneshot::channel();
        let (_release_tx, release_rx) = oneshot::channel();
        let generator = GatedGenerator {
            started: Mutex::new(Some(started_tx)),
            release: Mutex::new(Some(release_rx)),
        };
        let session = ConversationSession::new(MockEmbedder, generator);
        session.attach_index(corpus_index().await).unwrap();

        {
            let mut fut = pin!(session.ask("doomed question"));
            let waker = noop_waker();
            let mut cx = Context::from_waker(&waker);
            // Drive the ask into the blocked generator call, then drop it.
            assert!(matches!(fut.as_mut().poll(&mut cx), Poll::Pending));
        }

        assert!(session.history().is_empty());
        assert_eq!(session.state(), SessionState::Ready);

        // The busy flag was released on drop; the session accepts new asks.
        let err = session.ask("next").await;
        assert!(!matches!(err, Err(ChatError::Busy)));
    }

    #[tokio::test]
    async fn follow_up_sees_prior_turns() {
        let session = ConversationSession::new(MockEmbedder, EchoGenerator);
        session.attach_index(corpus_index().await).unwrap();

        let first = session.ask("solar?").await.unwrap();
        assert!(first.answer.starts_with("[0 turns]"));
        let second = session.ask("and wind?").await.unwrap();
        assert!(second.answer.starts_with("[2 turns]"));
    }

    #[tokio::test]
    async fn history_window_bounds_the_prompt_not_memory() {
        let config = SessionConfig::builder().history_window(2).build().unwrap();
        let session =
            ConversationSession::with_config(MockEmbedder, EchoGenerator, &config).unwrap();
        session.attach_index(corpus_index().await).unwrap();

        session.ask("one").await.unwrap();
        session.ask("two").await.unwrap();
        let third = session.ask("three").await.unwrap();

        // Four turns exist, only the last two reach the generator.
        assert!(third.answer.starts_with("[2 turns]"));
        assert_eq!(session.history().len(), 6);
    }

    #[tokio::test]
    async fn reset_during_flight_aborts_the_commit() {
        let (started_tx, started_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        let generator = GatedGenerator {
            started: Mutex::new(Some(started_tx)),
            release: Mutex::new(Some(release_rx)),
        };
        let session = Arc::new(ConversationSession::new(MockEmbedder, generator));
        session.attach_index(corpus_index().await).unwrap();

        let worker = Arc::clone(&session);
        let handle = tokio::spawn(async move { worker.ask("question").await });
        started_rx.await.unwrap();

        session.reset().unwrap();
        release_tx.send(()).unwrap();

        let result = handle.await.unwrap();
        assert!(matches!(result.unwrap_err(), ChatError::NotReady { .. }));
        assert!(session.history().is_empty());
    }
}
