//! Voice capture sessions
//!
//! A session owns a background task consuming recognizer events. Stop and
//! cancel are signalled over a watch channel. Stopping waits for the task to
//! apply whatever the recognizer already delivered; cancelling closes the
//! shared state first so nothing more is applied.

use crate::config::CaptureConfig;
use crate::error::CaptureError;
use crate::recognizer::{RecognitionEvent, SpeechRecognizer};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureState {
    Active,
    Stopped,
    Cancelled,
    Failed,
}

#[derive(Debug)]
struct Shared {
    committed: String,
    interim: String,
    state: CaptureState,
    restarts: u32,
    last_error: Option<CaptureError>,
}

impl Shared {
    fn text(&self) -> String {
        let mut text = self.committed.clone();
        if !self.interim.trim().is_empty() {
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(self.interim.trim());
        }
        text.trim().to_string()
    }

    fn apply(&mut self, event: RecognitionEvent, max_chars: usize) {
        if self.state != CaptureState::Active {
            return;
        }

        match event {
            RecognitionEvent::Interim(text) => self.interim = text,
            RecognitionEvent::Final(text) => {
                self.interim.clear();
                let text = text.trim();
                if text.is_empty() {
                    return;
                }

                let needed = text.chars().count() + usize::from(!self.committed.is_empty());
                if self.committed.chars().count() + needed > max_chars {
                    warn!(max_chars, "Transcript limit reached, dropping recognized text");
                    return;
                }
                if !self.committed.is_empty() {
                    self.committed.push(' ');
                }
                self.committed.push_str(text);
            }
        }
    }
}

/// A running (or finished) voice capture.
pub struct CaptureSession {
    id: Uuid,
    shared: Arc<RwLock<Shared>>,
    stop_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl CaptureSession {
    /// Open the first recognition segment and start consuming events.
    ///
    /// Fails without spawning anything when the recognizer is unavailable
    /// or refuses to open.
    pub async fn start(
        recognizer: Arc<dyn SpeechRecognizer>,
        config: CaptureConfig,
    ) -> Result<Self, CaptureError> {
        config.validate().map_err(CaptureError::Config)?;

        if !recognizer.is_available() {
            return Err(CaptureError::Unavailable(format!(
                "recognizer '{}' is not available",
                recognizer.name()
            )));
        }

        let first = recognizer.open().await?;

        let id = Uuid::new_v4();
        let shared = Arc::new(RwLock::new(Shared {
            committed: String::new(),
            interim: String::new(),
            state: CaptureState::Active,
            restarts: 0,
            last_error: None,
        }));
        let (stop_tx, stop_rx) = watch::channel(false);

        let task = tokio::spawn(run(
            id,
            recognizer,
            first,
            Arc::clone(&shared),
            stop_rx,
            config,
        ));

        info!(session = %id, "Voice capture started");
        Ok(Self {
            id,
            shared,
            stop_tx,
            task: Some(task),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Committed text plus the pending interim result.
    pub fn transcript(&self) -> String {
        self.shared.read().text()
    }

    pub fn state(&self) -> CaptureState {
        self.shared.read().state
    }

    pub fn is_active(&self) -> bool {
        self.state() == CaptureState::Active
    }

    pub fn restarts(&self) -> u32 {
        self.shared.read().restarts
    }

    pub fn last_error(&self) -> Option<CaptureError> {
        self.shared.read().last_error.clone()
    }

    /// End capture and return what was recognized so far.
    ///
    /// Events already queued by the recognizer are applied before the text
    /// is read. A session that ended on its own (segment end without
    /// restart, or a recognizer failure) still yields its text once.
    pub async fn stop(&mut self) -> Result<String, CaptureError> {
        if self.shared.read().state == CaptureState::Cancelled {
            return Err(CaptureError::AlreadyStopped);
        }
        let Some(task) = self.task.take() else {
            return Err(CaptureError::AlreadyStopped);
        };

        // the task may already be gone
        let _ = self.stop_tx.send(true);
        if let Err(err) = task.await {
            warn!(session = %self.id, error = %err, "Capture task ended abnormally");
        }

        let text = {
            let mut shared = self.shared.write();
            if shared.state == CaptureState::Active {
                shared.state = CaptureState::Stopped;
            }
            shared.text()
        };

        debug!(session = %self.id, chars = text.len(), "Voice capture stopped");
        Ok(text)
    }

    /// End capture and discard the text.
    pub fn cancel(&mut self) -> Result<(), CaptureError> {
        {
            let mut shared = self.shared.write();
            if shared.state == CaptureState::Cancelled || self.task.is_none() {
                return Err(CaptureError::AlreadyStopped);
            }
            shared.state = CaptureState::Cancelled;
            shared.committed.clear();
            shared.interim.clear();
        }

        let _ = self.stop_tx.send(true);
        self.task.take();
        debug!(session = %self.id, "Voice capture cancelled");
        Ok(())
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            let _ = self.stop_tx.send(true);
            task.abort();
        }
    }
}

async fn run(
    id: Uuid,
    recognizer: Arc<dyn SpeechRecognizer>,
    first: mpsc::Receiver<RecognitionEvent>,
    shared: Arc<RwLock<Shared>>,
    mut stop_rx: watch::Receiver<bool>,
    config: CaptureConfig,
) {
    let mut events = first;

    loop {
        tokio::select! {
            biased;

            _ = stop_rx.changed() => {
                let mut guard = shared.write();
                while let Ok(event) = events.try_recv() {
                    guard.apply(event, config.max_transcript_chars);
                }
                break;
            }

            event = events.recv() => match event {
                Some(event) => shared.write().apply(event, config.max_transcript_chars),
                None => {
                    if *stop_rx.borrow() || shared.read().state != CaptureState::Active {
                        break;
                    }

                    let restarts = shared.read().restarts;
                    if !config.continuous || restarts >= config.max_restarts {
                        let mut guard = shared.write();
                        if guard.state == CaptureState::Active {
                            guard.state = CaptureState::Stopped;
                        }
                        debug!(session = %id, restarts, "Recognition ended");
                        break;
                    }

                    match recognizer.open().await {
                        Ok(next) => {
                            events = next;
                            shared.write().restarts += 1;
                            debug!(session = %id, restarts = restarts + 1, "Recognition restarted");
                        }
                        Err(err) => {
                            warn!(session = %id, error = %err, "Recognition restart failed");
                            let mut guard = shared.write();
                            if guard.state == CaptureState::Active {
                                guard.state = CaptureState::Failed;
                            }
                            guard.last_error = Some(err);
                            break;
                        }
                    }
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognizer::{ChannelRecognizer, ScriptedRecognizer, UnavailableRecognizer};
    use std::time::Duration;

    async fn eventually<F: Fn() -> bool>(check: F) {
        for _ in 0..200 {
            if check() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached in time");
    }

    #[tokio::test]
    async fn test_unavailable_recognizer_fails_start() {
        let result = CaptureSession::start(Arc::new(UnavailableRecognizer), CaptureConfig::default()).await;
        assert!(matches!(result, Err(CaptureError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_interim_then_final() {
        let recognizer = Arc::new(ChannelRecognizer::new());
        let feed = recognizer.feed();
        let mut session = CaptureSession::start(recognizer, CaptureConfig::default())
            .await
            .unwrap();

        feed.interim("what are").unwrap();
        eventually(|| session.transcript() == "what are").await;

        feed.final_text("what are your hours").unwrap();
        eventually(|| session.transcript() == "what are your hours").await;

        feed.interim("today").unwrap();
        eventually(|| session.transcript() == "what are your hours today").await;

        assert_eq!(session.stop().await.unwrap(), "what are your hours today");
        assert_eq!(session.state(), CaptureState::Stopped);
    }

    #[tokio::test]
    async fn test_restart_on_segment_end() {
        let recognizer = Arc::new(ScriptedRecognizer::new(vec![
            vec![RecognitionEvent::Final("first".into())],
            vec![RecognitionEvent::Final("second".into())],
        ]));
        let mut session = CaptureSession::start(recognizer.clone(), CaptureConfig::default())
            .await
            .unwrap();

        eventually(|| session.transcript() == "first second").await;
        assert!(session.restarts() >= 1);
        assert!(session.is_active());
        assert_eq!(session.stop().await.unwrap(), "first second");
    }

    #[tokio::test]
    async fn test_non_continuous_stops_at_segment_end() {
        let recognizer = Arc::new(ScriptedRecognizer::phrases(["only once"]));
        let config = CaptureConfig {
            continuous: false,
            ..Default::default()
        };
        let mut session = CaptureSession::start(recognizer, config).await.unwrap();

        eventually(|| session.state() == CaptureState::Stopped).await;
        assert_eq!(session.restarts(), 0);
        assert_eq!(session.stop().await.unwrap(), "only once");
        assert_eq!(session.stop().await, Err(CaptureError::AlreadyStopped));
    }

    #[tokio::test]
    async fn test_restarts_are_bounded() {
        let recognizer = Arc::new(ScriptedRecognizer::new(vec![vec![]; 10]));
        let config = CaptureConfig {
            max_restarts: 3,
            ..Default::default()
        };
        let session = CaptureSession::start(recognizer, config).await.unwrap();

        eventually(|| session.state() == CaptureState::Stopped).await;
        assert_eq!(session.restarts(), 3);
    }

    #[tokio::test]
    async fn test_stop_applies_queued_events() {
        let recognizer = Arc::new(ChannelRecognizer::new());
        let feed = recognizer.feed();
        let mut session = CaptureSession::start(recognizer, CaptureConfig::default())
            .await
            .unwrap();

        feed.interim("what are").unwrap();
        feed.final_text("what are your hours").unwrap();
        assert_eq!(session.stop().await.unwrap(), "what are your hours");
        assert_eq!(session.state(), CaptureState::Stopped);
    }

    #[tokio::test]
    async fn test_stop_ignores_late_events() {
        let recognizer = Arc::new(ChannelRecognizer::new());
        let feed = recognizer.feed();
        let mut session = CaptureSession::start(recognizer, CaptureConfig::default())
            .await
            .unwrap();

        feed.final_text("hello").unwrap();
        eventually(|| session.transcript() == "hello").await;

        assert_eq!(session.stop().await.unwrap(), "hello");
        let _ = feed.final_text("too late");
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(session.transcript(), "hello");
    }

    #[tokio::test]
    async fn test_cancel_discards_text() {
        let recognizer = Arc::new(ChannelRecognizer::new());
        let feed = recognizer.feed();
        let mut session = CaptureSession::start(recognizer, CaptureConfig::default())
            .await
            .unwrap();

        feed.final_text("never mind").unwrap();
        eventually(|| !session.transcript().is_empty()).await;

        session.cancel().unwrap();
        assert_eq!(session.state(), CaptureState::Cancelled);
        assert_eq!(session.transcript(), "");
        assert_eq!(session.stop().await, Err(CaptureError::AlreadyStopped));
        assert_eq!(session.cancel(), Err(CaptureError::AlreadyStopped));
    }

    #[tokio::test]
    async fn test_transcript_limit() {
        let recognizer = Arc::new(ScriptedRecognizer::phrases(["abcde", "fghij", "k"]));
        let config = CaptureConfig {
            max_transcript_chars: 11,
            ..Default::default()
        };
        let mut session = CaptureSession::start(recognizer, config).await.unwrap();

        eventually(|| session.restarts() >= 1).await;
        assert_eq!(session.stop().await.unwrap(), "abcde fghij");
    }
}
