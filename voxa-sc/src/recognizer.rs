//! Speech recognizers feeding capture sessions
//!
//! A recognizer hands out one event channel per recognition segment. The
//! segment ends when the sending side is dropped.

use crate::error::CaptureError;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

const SEGMENT_BUFFER: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "text", rename_all = "lowercase")]
pub enum RecognitionEvent {
    /// Provisional text, replaced by the next interim or final result
    Interim(String),
    Final(String),
}

#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    fn name(&self) -> &str;

    fn is_available(&self) -> bool;

    /// Begin a recognition segment.
    async fn open(&self) -> Result<mpsc::Receiver<RecognitionEvent>, CaptureError>;
}

/// Recognizer driven from outside through a `RecognizerFeed`, e.g. by
/// results a browser posts to the server.
#[derive(Default)]
pub struct ChannelRecognizer {
    current: Arc<Mutex<Option<mpsc::Sender<RecognitionEvent>>>>,
}

/// Handle pushing results into the open segment of a `ChannelRecognizer`.
#[derive(Clone)]
pub struct RecognizerFeed {
    current: Arc<Mutex<Option<mpsc::Sender<RecognitionEvent>>>>,
}

impl ChannelRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&self) -> RecognizerFeed {
        RecognizerFeed {
            current: Arc::clone(&self.current),
        }
    }
}

#[async_trait]
impl SpeechRecognizer for ChannelRecognizer {
    fn name(&self) -> &str {
        "channel"
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn open(&self) -> Result<mpsc::Receiver<RecognitionEvent>, CaptureError> {
        let (tx, rx) = mpsc::channel(SEGMENT_BUFFER);
        *self.current.lock() = Some(tx);
        Ok(rx)
    }
}

impl RecognizerFeed {
    pub fn send(&self, event: RecognitionEvent) -> Result<(), CaptureError> {
        let guard = self.current.lock();
        let tx = guard
            .as_ref()
            .ok_or_else(|| CaptureError::Unavailable("no open recognition segment".to_string()))?;
        tx.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                CaptureError::Unavailable("recognition buffer full".to_string())
            }
            mpsc::error::TrySendError::Closed(_) => CaptureError::AlreadyStopped,
        })
    }

    pub fn interim(&self, text: impl Into<String>) -> Result<(), CaptureError> {
        self.send(RecognitionEvent::Interim(text.into()))
    }

    pub fn final_text(&self, text: impl Into<String>) -> Result<(), CaptureError> {
        self.send(RecognitionEvent::Final(text.into()))
    }

    /// Close the current segment, as a recognizer does after silence.
    pub fn end_segment(&self) {
        self.current.lock().take();
    }
}

/// Plays back fixed segments, then listens silently.
pub struct ScriptedRecognizer {
    segments: Vec<Vec<RecognitionEvent>>,
    next: AtomicUsize,
    idle: Mutex<Vec<mpsc::Sender<RecognitionEvent>>>,
}

impl ScriptedRecognizer {
    pub fn new(segments: Vec<Vec<RecognitionEvent>>) -> Self {
        Self {
            segments,
            next: AtomicUsize::new(0),
            idle: Mutex::new(Vec::new()),
        }
    }

    /// One segment of final results.
    pub fn phrases<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(vec![phrases
            .into_iter()
            .map(|p| RecognitionEvent::Final(p.into()))
            .collect()])
    }

    pub fn segments_opened(&self) -> usize {
        self.next.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechRecognizer for ScriptedRecognizer {
    fn name(&self) -> &str {
        "scripted"
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn open(&self) -> Result<mpsc::Receiver<RecognitionEvent>, CaptureError> {
        let idx = self.next.fetch_add(1, Ordering::SeqCst);
        let Some(events) = self.segments.get(idx) else {
            // keep the segment open with nothing to say
            let (tx, rx) = mpsc::channel(1);
            self.idle.lock().push(tx);
            return Ok(rx);
        };

        let (tx, rx) = mpsc::channel(events.len().max(1));
        for event in events {
            tx.try_send(event.clone())
                .map_err(|e| CaptureError::Unavailable(e.to_string()))?;
        }
        Ok(rx)
    }
}

/// Stand-in for environments without speech recognition.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableRecognizer;

#[async_trait]
impl SpeechRecognizer for UnavailableRecognizer {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn is_available(&self) -> bool {
        false
    }

    async fn open(&self) -> Result<mpsc::Receiver<RecognitionEvent>, CaptureError> {
        Err(CaptureError::Unavailable(
            "speech recognition is not supported here".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_feed_requires_open_segment() {
        let recognizer = ChannelRecognizer::new();
        let feed = recognizer.feed();
        assert!(feed.interim("hello").is_err());

        let mut rx = recognizer.open().await.unwrap();
        feed.interim("hel").unwrap();
        feed.final_text("hello").unwrap();
        assert_eq!(rx.recv().await, Some(RecognitionEvent::Interim("hel".into())));
        assert_eq!(rx.recv().await, Some(RecognitionEvent::Final("hello".into())));

        feed.end_segment();
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_scripted_segments_then_silence() {
        let recognizer = ScriptedRecognizer::phrases(["one", "two"]);
        let mut rx = recognizer.open().await.unwrap();
        assert_eq!(rx.recv().await, Some(RecognitionEvent::Final("one".into())));
        assert_eq!(rx.recv().await, Some(RecognitionEvent::Final("two".into())));
        assert_eq!(rx.recv().await, None);

        let mut idle = recognizer.open().await.unwrap();
        assert!(idle.try_recv().is_err());
        assert_eq!(recognizer.segments_opened(), 2);
    }

    #[tokio::test]
    async fn test_unavailable() {
        let recognizer = UnavailableRecognizer;
        assert!(!recognizer.is_available());
        assert!(matches!(
            recognizer.open().await,
            Err(CaptureError::Unavailable(_))
        ));
    }

    #[test]
    fn test_event_serialization() {
        let json = serde_json::to_value(RecognitionEvent::Interim("hi".into())).unwrap();
        assert_eq!(json, serde_json::json!({"type": "interim", "text": "hi"}));
    }
}
