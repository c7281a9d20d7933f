//! In-memory speech engine.
//!
//! [`TranscriptEngine`] produces no audio. It appends every call it receives
//! to a shared [`Transcript`], which makes it useful both for headless
//! front ends (print what would have been said) and for asserting the exact
//! sequence of engine mutations in tests.
//!
//! An utterance is treated as playing until the next `stop`, so every
//! request after the first interrupts its predecessor.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::SpeechError;
use crate::traits::{EngineFactory, SpeechEngine};
use crate::types::{Locale, Prosody, VoiceInfo};

/// A call received by a [`TranscriptEngine`].
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    SetLanguage(String),
    /// Voice id.
    SetVoice(String),
    SetProsody(Prosody),
    Stop,
    Speak(String),
    Shutdown,
}

/// Shared, append-only log of engine calls.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    calls: Arc<Mutex<Vec<EngineCall>>>,
}

impl Transcript {
    /// Every call so far, oldest first.
    pub fn calls(&self) -> Vec<EngineCall> {
        self.lock().clone()
    }

    /// The texts passed to `speak`, oldest first.
    pub fn spoken(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|call| match call {
                EngineCall::Speak(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// The most recent spoken text.
    pub fn last_spoken(&self) -> Option<String> {
        self.spoken().pop()
    }

    fn push(&self, call: EngineCall) {
        self.lock().push(call);
    }

    fn lock(&self) -> MutexGuard<'_, Vec<EngineCall>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Engine that records instead of speaking.
#[derive(Debug)]
pub struct TranscriptEngine {
    voices: Vec<VoiceInfo>,
    transcript: Transcript,
    speaking: bool,
}

impl SpeechEngine for TranscriptEngine {
    fn set_language(&mut self, locale: &Locale) -> Result<(), SpeechError> {
        if !self.voices.iter().any(|v| locale.matches_tag(&v.language)) {
            return Err(SpeechError::LanguageUnsupported {
                locale: locale.tag().to_string(),
            });
        }
        self.transcript.push(EngineCall::SetLanguage(locale.tag().to_string()));
        Ok(())
    }

    fn voices(&self) -> Result<Vec<VoiceInfo>, SpeechError> {
        Ok(self.voices.clone())
    }

    fn set_voice(&mut self, voice: &VoiceInfo) -> Result<(), SpeechError> {
        self.transcript.push(EngineCall::SetVoice(voice.id.clone()));
        Ok(())
    }

    fn set_prosody(&mut self, prosody: Prosody) -> Result<(), SpeechError> {
        self.transcript.push(EngineCall::SetProsody(prosody));
        Ok(())
    }

    fn is_speaking(&self) -> bool {
        self.speaking
    }

    fn stop(&mut self) -> Result<(), SpeechError> {
        self.speaking = false;
        self.transcript.push(EngineCall::Stop);
        Ok(())
    }

    fn speak(&mut self, text: &str) -> Result<(), SpeechError> {
        self.speaking = true;
        self.transcript.push(EngineCall::Speak(text.to_string()));
        Ok(())
    }

    fn shutdown(&mut self) {
        self.speaking = false;
        self.transcript.push(EngineCall::Shutdown);
    }
}

/// Builds [`TranscriptEngine`]s that log into one shared [`Transcript`].
///
/// By default the engine offers one voice per supported locale
/// (`en-US-1`, `en-GB-1`, `en-CA-1`, `de-DE-1`).
#[derive(Debug, Clone)]
pub struct TranscriptFactory {
    transcript: Transcript,
    voices: Vec<VoiceInfo>,
    constructions: Arc<AtomicUsize>,
}

impl TranscriptFactory {
    pub fn new(transcript: Transcript) -> Self {
        let voices = Locale::supported()
            .into_iter()
            .map(|locale| {
                let tag = locale.tag().to_string();
                VoiceInfo::new(format!("{tag}-1"), format!("Friend ({tag})"), tag)
            })
            .collect();

        Self {
            transcript,
            voices,
            constructions: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Replace the voices the engine will offer.
    #[must_use]
    pub fn with_voices(mut self, voices: Vec<VoiceInfo>) -> Self {
        self.voices = voices;
        self
    }

    /// How many engines this factory (and its clones) has built.
    pub fn constructions(&self) -> usize {
        self.constructions.load(Ordering::SeqCst)
    }
}

impl EngineFactory for TranscriptFactory {
    type Engine = TranscriptEngine;

    async fn construct(&self) -> Result<TranscriptEngine, SpeechError> {
        self.constructions.fetch_add(1, Ordering::SeqCst);
        Ok(TranscriptEngine {
            voices: self.voices.clone(),
            transcript: self.transcript.clone(),
            speaking: false,
        })
    }
}
