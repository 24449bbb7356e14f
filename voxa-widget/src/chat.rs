//! Chat interaction flow
//!
//! `ChatSession` drives one conversation: text or voice input goes to the
//! knowledge store, the reply is appended to the transcript and optionally
//! spoken. State moves `Idle -> Listening -> Sending -> AwaitingReply -> Idle`;
//! `Listening` exists only while a capture session is running.

use crate::error::ChatError;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use voxa_kb::KnowledgeStore;
use voxa_sc::{CaptureConfig, CaptureError, CaptureSession, SpeechRecognizer};
use voxa_spk::Speaker;

pub const NO_MATCH_REPLY: &str = "I don't have specific information about that in my knowledge base. Please try a different question or upload relevant documents.";
pub const ERROR_REPLY: &str =
    "Sorry, there was an error processing your request. Please try again later.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatState {
    Idle,
    Listening,
    Sending,
    AwaitingReply,
}

impl fmt::Display for ChatState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChatState::Idle => "idle",
            ChatState::Listening => "listening",
            ChatState::Sending => "sending",
            ChatState::AwaitingReply => "awaiting_reply",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnStatus {
    Delivered,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub status: TurnStatus,
    pub at: DateTime<Utc>,
}

impl Turn {
    fn new(role: Role, content: String, status: TurnStatus) -> Self {
        Self {
            role,
            content,
            status,
            at: Utc::now(),
        }
    }
}

/// Append-only conversation log.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }
}

/// One user message and the reply it produced.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub user: Turn,
    pub assistant: Turn,
    /// Present only when the reply was synthesized in time
    pub audio: Option<Bytes>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Synthesis slower than this is abandoned
    pub synthesis_timeout_secs: u64,
    pub speak_replies: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            synthesis_timeout_secs: 10,
            speak_replies: true,
        }
    }
}

impl ChatConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.synthesis_timeout_secs == 0 {
            return Err("synthesis_timeout_secs must be greater than 0".to_string());
        }
        if self.synthesis_timeout_secs > 300 {
            return Err("synthesis_timeout_secs too large (max 300)".to_string());
        }
        Ok(())
    }
}

/// Reply text and the part of it worth speaking.
struct Reply {
    text: String,
    spoken: Option<String>,
    status: TurnStatus,
}

/// Holds the session for one turn and puts it back to `Idle` however the
/// turn ends, including when the caller drops the future mid-synthesis.
struct TurnGuard<'a>(&'a mut ChatSession);

impl Deref for TurnGuard<'_> {
    type Target = ChatSession;

    fn deref(&self) -> &ChatSession {
        &*self.0
    }
}

impl DerefMut for TurnGuard<'_> {
    fn deref_mut(&mut self) -> &mut ChatSession {
        &mut *self.0
    }
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        self.0.state = ChatState::Idle;
    }
}

pub struct ChatSession {
    store: Arc<KnowledgeStore>,
    speaker: Option<Arc<dyn Speaker>>,
    recognizer: Option<Arc<dyn SpeechRecognizer>>,
    config: ChatConfig,
    capture_config: CaptureConfig,
    state: ChatState,
    transcript: Transcript,
    capture: Option<CaptureSession>,
    voice_supported: bool,
}

impl ChatSession {
    pub fn new(store: Arc<KnowledgeStore>) -> Self {
        Self {
            store,
            speaker: None,
            recognizer: None,
            config: ChatConfig::default(),
            capture_config: CaptureConfig::default(),
            state: ChatState::Idle,
            transcript: Transcript::default(),
            capture: None,
            voice_supported: false,
        }
    }

    pub fn with_speaker(mut self, speaker: Arc<dyn Speaker>) -> Self {
        self.speaker = Some(speaker);
        self
    }

    pub fn with_recognizer(mut self, recognizer: Arc<dyn SpeechRecognizer>) -> Self {
        self.voice_supported = recognizer.is_available();
        self.recognizer = Some(recognizer);
        self
    }

    /// Swap the recognizer, e.g. for a fresh channel per voice turn.
    pub fn set_recognizer(&mut self, recognizer: Arc<dyn SpeechRecognizer>) {
        self.voice_supported = recognizer.is_available();
        self.recognizer = Some(recognizer);
    }

    pub fn with_config(mut self, config: ChatConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_capture_config(mut self, config: CaptureConfig) -> Self {
        self.capture_config = config;
        self
    }

    pub fn state(&self) -> ChatState {
        self.state
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn voice_supported(&self) -> bool {
        self.voice_supported
    }

    /// Text captured so far in the running voice turn.
    pub fn live_transcript(&self) -> Option<String> {
        self.capture.as_ref().map(|c| c.transcript())
    }

    pub fn store(&self) -> &Arc<KnowledgeStore> {
        &self.store
    }

    /// Begin a voice turn. On failure the session stays idle and the
    /// conversation is untouched.
    pub async fn start_voice(&mut self) -> Result<(), ChatError> {
        if self.state != ChatState::Idle {
            return Err(ChatError::Busy(self.state));
        }

        let Some(recognizer) = self.recognizer.clone() else {
            self.voice_supported = false;
            return Err(CaptureError::Unavailable("no speech recognizer configured".to_string()).into());
        };

        match CaptureSession::start(recognizer, self.capture_config.clone()).await {
            Ok(capture) => {
                self.capture = Some(capture);
                self.state = ChatState::Listening;
                debug!("Listening for voice input");
                Ok(())
            }
            Err(err) => {
                if matches!(err, CaptureError::Unavailable(_) | CaptureError::Denied(_)) {
                    self.voice_supported = false;
                }
                warn!(error = %err, "Voice capture could not start");
                Err(err.into())
            }
        }
    }

    /// End the voice turn and send what was heard. Returns `None` when
    /// nothing was captured.
    pub async fn stop_voice(&mut self) -> Result<Option<Exchange>, ChatError> {
        if self.state != ChatState::Listening {
            return Err(ChatError::NotListening);
        }

        let mut chat = TurnGuard(self);
        chat.state = ChatState::Sending;
        let text = match chat.capture.take() {
            Some(mut capture) => capture.stop().await.unwrap_or_default(),
            None => String::new(),
        };

        if text.trim().is_empty() {
            debug!("Voice turn ended without text");
            return Ok(None);
        }

        Ok(Some(chat.exchange(text).await))
    }

    /// Abandon the voice turn, discarding captured text.
    pub fn cancel_voice(&mut self) -> Result<(), ChatError> {
        if self.state != ChatState::Listening {
            return Err(ChatError::NotListening);
        }
        if let Some(mut capture) = self.capture.take() {
            let _ = capture.cancel();
        }
        self.state = ChatState::Idle;
        debug!("Voice turn cancelled");
        Ok(())
    }

    /// Send typed text. Blank input is ignored.
    pub async fn send(&mut self, text: &str) -> Result<Option<Exchange>, ChatError> {
        if self.state != ChatState::Idle {
            return Err(ChatError::Busy(self.state));
        }
        if text.trim().is_empty() {
            return Ok(None);
        }
        let mut chat = TurnGuard(self);
        Ok(Some(chat.exchange(text.to_string()).await))
    }

    /// Both turns are recorded before any await, so a dropped exchange
    /// never leaves a user turn without its reply.
    async fn exchange(&mut self, text: String) -> Exchange {
        self.state = ChatState::Sending;
        let user = Turn::new(Role::User, text, TurnStatus::Delivered);
        let reply = self.compose_reply(&user.content);
        let assistant = Turn::new(Role::Assistant, reply.text, reply.status);
        self.transcript.push(user.clone());
        self.transcript.push(assistant.clone());
        self.state = ChatState::AwaitingReply;

        let audio = match reply.spoken.as_deref() {
            Some(spoken) => self.synthesize(spoken).await,
            None => None,
        };
        self.state = ChatState::Idle;

        info!(
            turns = self.transcript.len(),
            spoken = audio.is_some(),
            "Exchange completed"
        );
        Exchange {
            user,
            assistant,
            audio,
        }
    }

    fn compose_reply(&self, query: &str) -> Reply {
        match self.store.query(query) {
            Ok(result) => match result.best() {
                Some(best) => Reply {
                    text: format!("{}\n\nSource: {}", best.content, best.source_label),
                    // the citation is shown, not spoken
                    spoken: Some(best.content.clone()),
                    status: TurnStatus::Delivered,
                },
                None => Reply {
                    text: NO_MATCH_REPLY.to_string(),
                    spoken: Some(NO_MATCH_REPLY.to_string()),
                    status: TurnStatus::Delivered,
                },
            },
            Err(err) => {
                warn!(error = %err, "Knowledge query failed");
                Reply {
                    text: ERROR_REPLY.to_string(),
                    spoken: None,
                    status: TurnStatus::Failed,
                }
            }
        }
    }

    async fn synthesize(&self, text: &str) -> Option<Bytes> {
        if !self.config.speak_replies {
            return None;
        }
        let speaker = self.speaker.as_ref()?;
        let limit = Duration::from_secs(self.config.synthesis_timeout_secs);

        match tokio::time::timeout(limit, speaker.speak(text)).await {
            Ok(Ok(audio)) => Some(audio),
            Ok(Err(err)) => {
                warn!(error = %err, "Reply synthesis failed, continuing without audio");
                None
            }
            Err(_) => {
                warn!(timeout_secs = limit.as_secs(), "Reply synthesis timed out");
                None
            }
        }
    }
}
