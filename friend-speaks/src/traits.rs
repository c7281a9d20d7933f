//! Traits for the friend-speaks speech layer.
//!
//! A [`SpeechEngine`] is the exclusive handle to one TTS engine instance; an
//! [`EngineFactory`] builds it asynchronously. The coordinator is generic
//! over the factory so tests can substitute a fake engine.

use std::future::Future;

use crate::errors::SpeechError;
use crate::types::{Locale, Prosody, VoiceInfo};

/// Synchronous surface of a text-to-speech engine.
///
/// Calls may block briefly (platform engines are synchronous), so the
/// coordinator only invokes them from its own serialised sequence, never
/// from the caller's thread.
///
/// ## Implementation Requirements
///
/// `speak` must use "flush" semantics: anything queued or playing is
/// discarded in favour of the new text.
pub trait SpeechEngine: Send + 'static {
    /// Switch the engine to `locale`.
    ///
    /// ## Errors
    ///
    /// Returns [`SpeechError::LanguageUnsupported`] when the engine has no
    /// way to speak the locale.
    fn set_language(&mut self, locale: &Locale) -> Result<(), SpeechError>;

    /// All voices the engine offers.
    fn voices(&self) -> Result<Vec<VoiceInfo>, SpeechError>;

    /// Select one of the voices returned by [`voices`](Self::voices).
    fn set_voice(&mut self, voice: &VoiceInfo) -> Result<(), SpeechError>;

    /// Apply pitch and rate multipliers (1.0 is the engine's normal).
    fn set_prosody(&mut self, prosody: Prosody) -> Result<(), SpeechError>;

    /// Whether audio is currently being produced.
    fn is_speaking(&self) -> bool;

    /// Stop the current utterance.
    fn stop(&mut self) -> Result<(), SpeechError>;

    /// Start speaking `text`, discarding anything queued.
    fn speak(&mut self, text: &str) -> Result<(), SpeechError>;

    /// Release engine resources. The engine is dropped afterwards.
    fn shutdown(&mut self) {
        let _ = self.stop();
    }

    /// Voices able to speak `locale`.
    fn voices_for(&self, locale: &Locale) -> Result<Vec<VoiceInfo>, SpeechError> {
        Ok(self
            .voices()?
            .into_iter()
            .filter(|voice| locale.matches_tag(&voice.language))
            .collect())
    }
}

/// Builds the engine a coordinator owns.
///
/// ## Native Async Traits
///
/// Uses async functions in traits (AFIT); implementations can write
/// `async fn construct(&self)` directly.
pub trait EngineFactory: Send + Sync + 'static {
    /// The engine this factory produces.
    type Engine: SpeechEngine;

    /// Construct the engine.
    ///
    /// ## Errors
    ///
    /// Returns [`SpeechError::InitFailed`] when the platform engine cannot
    /// be brought up.
    fn construct(&self) -> impl Future<Output = Result<Self::Engine, SpeechError>> + Send;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedVoices(Vec<VoiceInfo>);

    impl SpeechEngine for FixedVoices {
        fn set_language(&mut self, _locale: &Locale) -> Result<(), SpeechError> {
            Ok(())
        }
        fn voices(&self) -> Result<Vec<VoiceInfo>, SpeechError> {
            Ok(self.0.clone())
        }
        fn set_voice(&mut self, _voice: &VoiceInfo) -> Result<(), SpeechError> {
            Ok(())
        }
        fn set_prosody(&mut self, _prosody: Prosody) -> Result<(), SpeechError> {
            Ok(())
        }
        fn is_speaking(&self) -> bool {
            false
        }
        fn stop(&mut self) -> Result<(), SpeechError> {
            Ok(())
        }
        fn speak(&mut self, _text: &str) -> Result<(), SpeechError> {
            Ok(())
        }
    }

    struct FixedFactory;

    impl EngineFactory for FixedFactory {
        type Engine = FixedVoices;

        async fn construct(&self) -> Result<FixedVoices, SpeechError> {
            Ok(FixedVoices(vec![
                VoiceInfo::new("a", "Anna", "de-DE"),
                VoiceInfo::new("b", "Bob", "en-US"),
                VoiceInfo::new("c", "Cleo", "en_US"),
            ]))
        }
    }

    #[tokio::test]
    async fn voices_for_filters_by_locale() {
        let engine = FixedFactory.construct().await.unwrap();
        let english: Vec<String> = engine
            .voices_for(&Locale::EnUs)
            .unwrap()
            .into_iter()
            .map(|v| v.id)
            .collect();
        assert_eq!(english, vec!["b", "c"]);
        assert!(engine.voices_for(&Locale::EnCa).unwrap().is_empty());
    }
}
