//! Core types for the friend-speaks speech layer.
//!
//! This module defines the values that flow through the coordinator:
//! - Locales and voice descriptions
//! - Per-utterance prosody and request options
//! - Coordinator configuration with builder pattern
//! - The coordinator lifecycle phase

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

// ============================================================================
// Locale
// ============================================================================

/// A speech locale.
///
/// The four named variants are the fixed set the app picks from when voice
/// randomisation is enabled. Anything else is carried as a BCP-47 tag.
#[non_exhaustive]
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Locale {
    /// American English (`en-US`), the default speaking locale.
    #[default]
    EnUs,
    /// British English (`en-GB`).
    EnGb,
    /// Canadian English (`en-CA`).
    EnCa,
    /// German (`de-DE`).
    DeDe,
    /// Any other BCP-47 tag (e.g. "fr-FR").
    Custom(String),
}

impl Locale {
    /// The locales the app rotates through when randomising voices.
    pub fn supported() -> Vec<Locale> {
        vec![Locale::EnUs, Locale::EnGb, Locale::EnCa, Locale::DeDe]
    }

    /// The BCP-47 tag for this locale.
    ///
    /// ## Examples
    ///
    /// ```
    /// use friend_speaks::Locale;
    ///
    /// assert_eq!(Locale::EnGb.tag(), "en-GB");
    /// assert_eq!(Locale::Custom("fr-FR".into()).tag(), "fr-FR");
    /// ```
    pub fn tag(&self) -> &str {
        match self {
            Locale::EnUs => "en-US",
            Locale::EnGb => "en-GB",
            Locale::EnCa => "en-CA",
            Locale::DeDe => "de-DE",
            Locale::Custom(tag) => tag,
        }
    }

    /// Whether a voice advertising `language` can speak this locale.
    ///
    /// Platform voice lists are inconsistent (`en_US`, `en-us`,
    /// `en-US-x-sfg-local`), so both sides are normalised first. A locale
    /// with a region only matches voices of that region; a bare language
    /// (`"de"`) matches every region of it.
    pub fn matches_tag(&self, language: &str) -> bool {
        let wanted = normalize_tag(self.tag());
        let offered = normalize_tag(language);

        if wanted.is_empty() || offered.is_empty() {
            return false;
        }

        offered == wanted || offered.starts_with(&format!("{wanted}-"))
    }
}

fn normalize_tag(tag: &str) -> String {
    tag.trim().replace('_', "-").to_lowercase()
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl From<String> for Locale {
    fn from(tag: String) -> Self {
        match normalize_tag(&tag).as_str() {
            "en-us" => Locale::EnUs,
            "en-gb" => Locale::EnGb,
            "en-ca" => Locale::EnCa,
            "de-de" => Locale::DeDe,
            _ => Locale::Custom(tag),
        }
    }
}

impl From<&str> for Locale {
    fn from(tag: &str) -> Self {
        Locale::from(tag.to_string())
    }
}

impl From<Locale> for String {
    fn from(locale: Locale) -> Self {
        locale.tag().to_string()
    }
}

// ============================================================================
// Voice
// ============================================================================

/// A voice offered by a speech engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceInfo {
    /// Engine-specific voice identifier.
    pub id: String,
    /// Display name of the voice.
    pub name: String,
    /// Language tag the voice speaks, as reported by the engine.
    pub language: String,
}

impl VoiceInfo {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            language: language.into(),
        }
    }

    /// Whether this voice answers to `name` (either its id or display name).
    pub fn answers_to(&self, name: &str) -> bool {
        self.id.eq_ignore_ascii_case(name) || self.name.eq_ignore_ascii_case(name)
    }
}

// ============================================================================
// Prosody
// ============================================================================

/// Pitch and speech-rate multipliers for one utterance (1.0 is normal).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prosody {
    pub pitch: f32,
    pub rate: f32,
}

impl Prosody {
    /// The engine's normal pitch and rate.
    pub const NEUTRAL: Prosody = Prosody {
        pitch: 1.0,
        rate: 1.0,
    };
}

impl Default for Prosody {
    fn default() -> Self {
        Prosody::NEUTRAL
    }
}

/// An inclusive range that random prosody values are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub min: f32,
    pub max: f32,
}

impl Span {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Draw a uniform value from the span.
    ///
    /// A degenerate or inverted span yields `min`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if self.max > self.min {
            rng.gen_range(self.min..=self.max)
        } else {
            self.min
        }
    }

    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Pitch range used for randomised utterances.
pub const PITCH_SPAN: Span = Span::new(0.4, 2.0);

/// Speech-rate range used for randomised utterances.
pub const RATE_SPAN: Span = Span::new(0.9, 1.4);

// ============================================================================
// Requests
// ============================================================================

/// Per-request overrides. Anything left `None` falls back to the
/// coordinator's configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpeakOptions {
    pub locale: Option<Locale>,
    pub voice: Option<String>,
    pub pitch: Option<f32>,
    pub rate: Option<f32>,
}

impl SpeakOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = Some(locale);
        self
    }

    #[must_use]
    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }

    #[must_use]
    pub fn with_pitch(mut self, pitch: f32) -> Self {
        self.pitch = Some(pitch);
        self
    }

    #[must_use]
    pub fn with_rate(mut self, rate: f32) -> Self {
        self.rate = Some(rate);
        self
    }
}

/// A sentence to speak plus its options.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest {
    pub text: String,
    pub options: SpeakOptions,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            options: SpeakOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: SpeakOptions) -> Self {
        self.options = options;
        self
    }
}

impl From<&str> for SpeechRequest {
    fn from(text: &str) -> Self {
        SpeechRequest::new(text)
    }
}

impl From<String> for SpeechRequest {
    fn from(text: String) -> Self {
        SpeechRequest::new(text)
    }
}

/// What was actually handed to the engine for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    /// The locale picked for this utterance, if one was picked.
    pub locale: Option<Locale>,
    /// The voice switched to for this utterance, if any.
    pub voice: Option<VoiceInfo>,
    /// The prosody applied, if it was changed.
    pub prosody: Option<Prosody>,
}

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for a [`SpeechCoordinator`](crate::SpeechCoordinator).
///
/// Use the builder pattern to construct:
///
/// ```
/// use friend_speaks::{Locale, SpeechConfig};
///
/// let config = SpeechConfig::new()
///     .with_default_locale(Locale::EnGb)
///     .with_randomized_voices(true)
///     .with_seed(7);
/// assert!(config.randomize);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Locale the engine must support for initialisation to succeed.
    pub default_locale: Locale,
    /// Locales picked from when `randomize` is on.
    pub locales: Vec<Locale>,
    /// Pick a random locale, voice, pitch and rate for every utterance.
    pub randomize: bool,
    /// Pitch range for randomised utterances.
    pub pitch: Span,
    /// Rate range for randomised utterances.
    pub rate: Span,
    /// Seed for voice/prosody selection; entropy when `None`.
    pub seed: Option<u64>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            default_locale: Locale::EnUs,
            locales: Locale::supported(),
            randomize: false,
            pitch: PITCH_SPAN,
            rate: RATE_SPAN,
            seed: None,
        }
    }
}

impl SpeechConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_default_locale(mut self, locale: Locale) -> Self {
        self.default_locale = locale;
        self
    }

    #[must_use]
    pub fn with_locales(mut self, locales: Vec<Locale>) -> Self {
        self.locales = locales;
        self
    }

    #[must_use]
    pub fn with_randomized_voices(mut self, randomize: bool) -> Self {
        self.randomize = randomize;
        self
    }

    #[must_use]
    pub fn with_pitch_span(mut self, span: Span) -> Self {
        self.pitch = span;
        self
    }

    #[must_use]
    pub fn with_rate_span(mut self, span: Span) -> Self {
        self.rate = span;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

/// Lifecycle phase of the speech coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EnginePhase {
    /// No engine construction has been requested yet.
    #[default]
    Uninitialized,
    /// Engine construction is in flight.
    Initializing,
    /// The engine is up and speaks the default locale.
    Ready,
    /// Construction failed or the default locale is unsupported.
    Failed,
    /// The engine was released by `shutdown`.
    ShutDown,
}

impl EnginePhase {
    /// Whether the coordinator can never become ready from this phase.
    pub fn is_terminal(&self) -> bool {
        matches!(self, EnginePhase::Failed | EnginePhase::ShutDown)
    }
}

impl fmt::Display for EnginePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EnginePhase::Uninitialized => "uninitialized",
            EnginePhase::Initializing => "initializing",
            EnginePhase::Ready => "ready",
            EnginePhase::Failed => "failed",
            EnginePhase::ShutDown => "shut down",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use proptest::prelude::*;

    #[test]
    fn locale_tags_round_trip_through_strings() {
        for locale in Locale::supported() {
            let tag: String = locale.clone().into();
            assert_eq!(Locale::from(tag), locale);
        }
        assert_eq!(Locale::from("en_gb"), Locale::EnGb);
        assert_eq!(
            Locale::from("fr-FR"),
            Locale::Custom("fr-FR".to_string())
        );
    }

    #[test]
    fn locale_matches_platform_spellings() {
        assert!(Locale::EnUs.matches_tag("en-US"));
        assert!(Locale::EnUs.matches_tag("en_US"));
        assert!(Locale::EnUs.matches_tag("en-us-x-sfg-local"));
        assert!(!Locale::EnUs.matches_tag("en-GB"));
        assert!(!Locale::EnUs.matches_tag("en"));
        assert!(!Locale::DeDe.matches_tag(""));
    }

    #[test]
    fn bare_language_matches_every_region() {
        let german = Locale::Custom("de".into());
        assert!(german.matches_tag("de-DE"));
        assert!(german.matches_tag("de_AT"));
        assert!(!german.matches_tag("da-DK"));
    }

    #[test]
    fn locale_serializes_as_tag() {
        let json = serde_json::to_string(&Locale::EnCa).unwrap();
        assert_eq!(json, "\"en-CA\"");
        let back: Locale = serde_json::from_str("\"de-DE\"").unwrap();
        assert_eq!(back, Locale::DeDe);
    }

    #[test]
    fn span_samples_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..500 {
            assert!(PITCH_SPAN.contains(PITCH_SPAN.sample(&mut rng)));
            assert!(RATE_SPAN.contains(RATE_SPAN.sample(&mut rng)));
        }
    }

    proptest! {
        #[test]
        fn any_span_samples_inside_itself_or_at_min(
            min in 0.0f32..5.0,
            width in -1.0f32..5.0,
            seed in any::<u64>(),
        ) {
            let span = Span::new(min, min + width);
            let mut rng = StdRng::seed_from_u64(seed);
            let value = span.sample(&mut rng);

            if span.max > span.min {
                prop_assert!(span.contains(value), "{value} outside {span:?}");
            } else {
                prop_assert_eq!(value, span.min);
            }
        }
    }

    #[test]
    fn degenerate_span_yields_min() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(Span::new(1.2, 1.2).sample(&mut rng), 1.2);
        assert_eq!(Span::new(2.0, 1.0).sample(&mut rng), 2.0);
    }

    #[test]
    fn default_config_uses_fixed_locale_set() {
        let config = SpeechConfig::default();
        assert_eq!(config.default_locale, Locale::EnUs);
        assert_eq!(config.locales.len(), 4);
        assert!(!config.randomize);
        assert_eq!(config.pitch, PITCH_SPAN);
        assert_eq!(config.rate, RATE_SPAN);
    }

    #[test]
    fn partial_config_json_fills_defaults() {
        let config: SpeechConfig =
            serde_json::from_str(r#"{ "randomize": true, "default_locale": "en-GB" }"#).unwrap();
        assert!(config.randomize);
        assert_eq!(config.default_locale, Locale::EnGb);
        assert_eq!(config.locales, Locale::supported());
    }

    #[test]
    fn voice_answers_to_id_or_name() {
        let voice = VoiceInfo::new("com.apple.Samantha", "Samantha", "en-US");
        assert!(voice.answers_to("samantha"));
        assert!(voice.answers_to("com.apple.Samantha"));
        assert!(!voice.answers_to("Alex"));
    }

    #[test]
    fn phase_terminality() {
        assert!(EnginePhase::Failed.is_terminal());
        assert!(EnginePhase::ShutDown.is_terminal());
        assert!(!EnginePhase::Initializing.is_terminal());
        assert_eq!(EnginePhase::ShutDown.to_string(), "shut down");
    }
}
