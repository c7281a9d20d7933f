//! Host speech engine.
//!
//! Drives the platform's native TTS (AVFoundation, SAPI/WinRT, Speech
//! Dispatcher) through the `tts` crate. Language support is resolved from
//! the platform voice list since the crate selects languages via voices.

use tracing::{debug, trace};
use tts::Tts;

use crate::errors::SpeechError;
use crate::traits::{EngineFactory, SpeechEngine};
use crate::types::{Locale, Prosody, VoiceInfo};

/// Builds a [`SystemEngine`] on a blocking thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemFactory;

impl EngineFactory for SystemFactory {
    type Engine = SystemEngine;

    async fn construct(&self) -> Result<SystemEngine, SpeechError> {
        let tts = tokio::task::spawn_blocking(Tts::default)
            .await
            .map_err(SpeechError::init)?
            .map_err(SpeechError::init)?;
        debug!(features = ?tts.supported_features(), "host speech engine constructed");
        Ok(SystemEngine { tts })
    }
}

/// The host's native speech engine.
pub struct SystemEngine {
    tts: Tts,
}

impl SystemEngine {
    fn platform_voice(&self, id: &str) -> Result<Option<tts::Voice>, SpeechError> {
        let voices = self
            .tts
            .voices()
            .map_err(|e| SpeechError::engine("voices", e))?;
        Ok(voices.into_iter().find(|v| v.id() == id))
    }

    /// Scale a multiplier onto the engine's own `[min, normal, max]` range.
    fn scaled(multiplier: f32, min: f32, normal: f32, max: f32) -> f32 {
        (normal * multiplier).clamp(min, max)
    }
}

impl SpeechEngine for SystemEngine {
    fn set_language(&mut self, locale: &Locale) -> Result<(), SpeechError> {
        let Some(voice) = self.voices_for(locale)?.into_iter().next() else {
            return Err(SpeechError::LanguageUnsupported {
                locale: locale.tag().to_string(),
            });
        };
        self.set_voice(&voice)
    }

    fn voices(&self) -> Result<Vec<VoiceInfo>, SpeechError> {
        let voices = self
            .tts
            .voices()
            .map_err(|e| SpeechError::engine("voices", e))?;
        Ok(voices
            .into_iter()
            .map(|v| VoiceInfo::new(v.id(), v.name(), v.language().to_string()))
            .collect())
    }

    fn set_voice(&mut self, voice: &VoiceInfo) -> Result<(), SpeechError> {
        let Some(platform) = self.platform_voice(&voice.id)? else {
            return Err(SpeechError::NoVoiceForLanguage {
                locale: voice.language.clone(),
            });
        };
        trace!(voice = %voice.id, "selecting host voice");
        self.tts
            .set_voice(&platform)
            .map_err(|e| SpeechError::engine("set_voice", e))
    }

    fn set_prosody(&mut self, prosody: Prosody) -> Result<(), SpeechError> {
        let features = self.tts.supported_features();

        if features.pitch {
            let pitch = Self::scaled(
                prosody.pitch,
                self.tts.min_pitch(),
                self.tts.normal_pitch(),
                self.tts.max_pitch(),
            );
            self.tts
                .set_pitch(pitch)
                .map_err(|e| SpeechError::engine("set_pitch", e))?;
        }
        if features.rate {
            let rate = Self::scaled(
                prosody.rate,
                self.tts.min_rate(),
                self.tts.normal_rate(),
                self.tts.max_rate(),
            );
            self.tts
                .set_rate(rate)
                .map_err(|e| SpeechError::engine("set_rate", e))?;
        }
        Ok(())
    }

    fn is_speaking(&self) -> bool {
        self.tts.is_speaking().unwrap_or(false)
    }

    fn stop(&mut self) -> Result<(), SpeechError> {
        self.tts
            .stop()
            .map(|_| ())
            .map_err(|e| SpeechError::engine("stop", e))
    }

    fn speak(&mut self, text: &str) -> Result<(), SpeechError> {
        self.tts
            .speak(text, true)
            .map(|_| ())
            .map_err(|e| SpeechError::engine("speak", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiplier_is_clamped_to_engine_range() {
        assert_eq!(SystemEngine::scaled(2.0, 0.0, 1.0, 1.5), 1.5);
        assert_eq!(SystemEngine::scaled(0.4, 0.5, 1.0, 2.0), 0.5);
        assert_eq!(SystemEngine::scaled(1.2, 0.1, 0.5, 1.0), 0.6);
    }
}
