/// Errors that can occur during speech operations.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    /// The speech engine could not be constructed.
    #[error("speech engine initialization failed")]
    InitFailed {
        /// The underlying error from the speech engine.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The engine came up but does not support the requested locale.
    #[error("language not supported by the speech engine: {locale}")]
    LanguageUnsupported {
        /// The locale that was requested.
        locale: String,
    },

    /// No installed voice matches the locale picked for an utterance.
    #[error("no voice available for {locale}")]
    NoVoiceForLanguage {
        /// The locale that was picked.
        locale: String,
    },

    /// The coordinator is not in the `Ready` state.
    #[error("speech engine is not ready ({phase})")]
    NotReady {
        /// Human readable name of the phase the coordinator is in.
        phase: String,
    },

    /// The engine rejected a call (stop, speak, voice or prosody change).
    #[error("speech engine call failed: {operation}")]
    EngineFailed {
        /// Which engine call failed.
        operation: &'static str,
        /// The underlying error from the speech engine.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl SpeechError {
    /// Wrap an engine error for the named operation.
    pub fn engine(
        operation: &'static str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        SpeechError::EngineFailed {
            operation,
            source: source.into(),
        }
    }

    /// Wrap an engine construction error.
    pub fn init(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        SpeechError::InitFailed {
            source: source.into(),
        }
    }
}
