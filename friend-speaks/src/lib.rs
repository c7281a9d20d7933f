//! Friend Speaks
//!
//! Speech layer for the odd-friend app: one text-to-speech engine per
//! process, brought up asynchronously and driven through a serialised
//! coordinator.
//!
//! ## Features
//!
//! - **One engine, one owner**: [`SpeechCoordinator`] is the only path to
//!   the engine; clones share it
//! - **Queued readiness**: callbacks registered before the engine is up run
//!   once, in order, after a single construction
//! - **Interrupting speech**: every utterance preempts the one playing
//! - **Random voices**: optional random locale, voice, pitch and rate per
//!   utterance
//! - **Injectable engines**: [`EngineFactory`] / [`SpeechEngine`] traits,
//!   with an in-memory [`TranscriptEngine`] and, behind the `system`
//!   feature, the host's native engine
//!
//! ## Quick Start
//!
//! ```ignore
//! use friend_speaks::{SpeechConfig, SpeechCoordinator, SystemFactory};
//!
//! let speech = SpeechCoordinator::new(SystemFactory, SpeechConfig::default());
//! speech.init(|| tracing::info!("speech ready"));
//! speech.speak_detached("I'm so brave I run fast!");
//! ```
//!
//! ## Module Structure
//!
//! - [`types`] - Locales, voices, prosody, requests, configuration
//! - [`errors`] - Error types for speech operations
//! - [`traits`] - The engine and factory traits
//! - [`coordinator`] - The `SpeechCoordinator` state machine
//! - [`engines`] - Engine implementations

pub mod coordinator;
pub mod engines;
pub mod errors;
pub mod traits;
pub mod types;

pub use coordinator::SpeechCoordinator;
#[cfg(feature = "system")]
pub use engines::system::{SystemEngine, SystemFactory};
pub use engines::transcript::{EngineCall, Transcript, TranscriptEngine, TranscriptFactory};
pub use errors::SpeechError;
pub use traits::{EngineFactory, SpeechEngine};
pub use types::{
    EnginePhase, Locale, PITCH_SPAN, Prosody, RATE_SPAN, SpeakOptions, SpeechConfig,
    SpeechRequest, Span, Utterance, VoiceInfo,
};
