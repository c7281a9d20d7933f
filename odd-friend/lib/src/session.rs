//! The app session: load gate, displayed friend, and user actions.
//!
//! An [`AppSession`] is what the screens talk to. It owns the catalogs, the
//! friend currently on screen, the feedback tally, the swipe tracker and the
//! speech coordinator. Every action that changes the friend records
//! feedback for the outgoing one first, then generates a new one and speaks
//! its sentence unless the session is muted.

use std::fmt;

use friend_speaks::{EngineFactory, SpeechCoordinator};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use crate::catalog::{FacePartCatalog, WordCatalog};
use crate::config::SessionConfig;
use crate::error::{SessionError, ShareError};
use crate::generate::Friend;
use crate::gesture::{SwipeDirection, SwipeTracker};
use crate::share::{FaceRenderer, ShareIntent, ShareTarget, render_blocking, share_snapshot};
use crate::tally::{Feedback, FeedbackTally};

/// Message shown to the user when the catalogs cannot be loaded.
pub const LOAD_FAILED_NOTICE: &str = "Failed to load word lists. Please check your JSON file.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    /// Shown while loading; the only way forward is [`AppSession::enter_main`].
    #[default]
    Start,
    /// Shows the friend and accepts next, swipe and share.
    Main,
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Screen::Start => "start",
            Screen::Main => "main",
        })
    }
}

/// One run of the app.
pub struct AppSession<F: EngineFactory> {
    config: SessionConfig,
    words: WordCatalog,
    faces: FacePartCatalog,
    speech: SpeechCoordinator<F>,
    rng: StdRng,
    friend: Friend,
    tally: FeedbackTally,
    swipe: SwipeTracker,
    screen: Screen,
    muted: bool,
}

impl<F: EngineFactory> AppSession<F> {
    /// Load both catalogs, start speech initialisation and generate the
    /// first friend.
    ///
    /// The session starts on [`Screen::Start`]. The first friend is not
    /// spoken.
    ///
    /// ## Errors
    ///
    /// Returns [`SessionError::Load`] if either catalog fails to load; the
    /// front end should show [`LOAD_FAILED_NOTICE`] and stay on the start
    /// screen.
    pub async fn load(config: SessionConfig, factory: F) -> Result<Self, SessionError> {
        let (words, faces) = match tokio::try_join!(config.words.load(), config.faces.load()) {
            Ok(catalogs) => catalogs,
            Err(err) => {
                warn!(error = %err, "failed to load catalogs");
                return Err(err.into());
            }
        };

        let speech = SpeechCoordinator::new(factory, config.speech.clone());
        speech.init(|| info!("speech engine ready"));

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let friend = Friend::generate(&words, &faces, &mut rng)?;
        debug!(sentence = %friend.sentence, "first friend generated");

        Ok(Self {
            config,
            words,
            faces,
            speech,
            rng,
            friend,
            tally: FeedbackTally::new(),
            swipe: SwipeTracker::new(),
            screen: Screen::Start,
            muted: false,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn words(&self) -> &WordCatalog {
        &self.words
    }

    pub fn faces(&self) -> &FacePartCatalog {
        &self.faces
    }

    pub fn speech(&self) -> &SpeechCoordinator<F> {
        &self.speech
    }

    /// The friend on screen.
    pub fn friend(&self) -> &Friend {
        &self.friend
    }

    /// The sentence the friend on screen says.
    pub fn sentence(&self) -> String {
        self.friend.sentence.to_string()
    }

    pub fn tally(&self) -> &FeedbackTally {
        &self.tally
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn swipe_tracker(&self) -> &SwipeTracker {
        &self.swipe
    }

    /// Move from the start screen to the main screen.
    ///
    /// ## Errors
    ///
    /// With `require_speech_ready` set, returns
    /// [`SessionError::SpeechNotReady`] until the speech engine is up.
    pub fn enter_main(&mut self) -> Result<(), SessionError> {
        if self.config.require_speech_ready && !self.speech.is_ready() {
            let phase = self.speech.phase();
            warn!(%phase, "navigation refused; speech engine not ready");
            return Err(SessionError::SpeechNotReady);
        }
        if self.screen != Screen::Main {
            info!("entering main screen");
            self.screen = Screen::Main;
        }
        Ok(())
    }

    /// Record a neutral reaction and show the next friend.
    pub fn next(&mut self) -> Result<&Friend, SessionError> {
        self.require_main()?;
        self.advance(Feedback::Neutral)
    }

    /// Add horizontal drag to the gesture in progress.
    pub fn drag(&mut self, delta: f32) {
        self.swipe.drag(delta);
    }

    /// End the gesture in progress.
    ///
    /// A swipe records a like (right) or dislike (left) for the friend on
    /// screen and shows the next one. A short gesture changes nothing.
    pub fn release(&mut self) -> Result<Option<SwipeDirection>, SessionError> {
        let direction = self.swipe.release();
        self.require_main()?;

        if let Some(direction) = direction {
            debug!(?direction, "swipe");
            self.advance(direction.feedback())?;
        }
        Ok(direction)
    }

    /// Swipe in `direction` in one step.
    pub fn swipe(&mut self, direction: SwipeDirection) -> Result<&Friend, SessionError> {
        self.require_main()?;
        self.swipe.reset();
        self.advance(direction.feedback())
    }

    /// A muted session keeps generating friends but does not speak them.
    pub fn set_muted(&mut self, muted: bool) {
        if self.muted != muted {
            info!(muted, "speech muted state changed");
        }
        self.muted = muted;
    }

    /// Render the face on screen, write it to the cache and share it.
    ///
    /// Rendering runs on Tokio's blocking pool. Failures are logged and
    /// returned; the front end should show
    /// [`SHARE_FAILED_NOTICE`](crate::SHARE_FAILED_NOTICE). Nothing is retried.
    pub async fn share<R>(
        &self,
        renderer: &R,
        target: &dyn ShareTarget,
    ) -> Result<ShareIntent, ShareError>
    where
        R: FaceRenderer + Clone + 'static,
    {
        let result = self.render_and_share(renderer, target).await;
        if let Err(err) = &result {
            warn!(error = %err, "failed to share snapshot");
        }
        result
    }

    /// Wait for every utterance handed to the speech engine so far.
    pub async fn flush_speech(&self) {
        self.speech.flush().await;
    }

    /// Finish pending speech and release the engine.
    pub async fn shutdown(&mut self) {
        self.flush_speech().await;
        self.speech.shutdown().await;
        info!(keys = self.tally.len(), "session closed");
    }

    async fn render_and_share<R>(
        &self,
        renderer: &R,
        target: &dyn ShareTarget,
    ) -> Result<ShareIntent, ShareError>
    where
        R: FaceRenderer + Clone + 'static,
    {
        let png = render_blocking(renderer, &self.friend.face).await?;
        share_snapshot(&self.config.cache_dir, &png, target).await
    }

    fn require_main(&self) -> Result<(), SessionError> {
        match self.screen {
            Screen::Main => Ok(()),
            Screen::Start => Err(SessionError::NotOnMainScreen),
        }
    }

    fn advance(&mut self, feedback: Feedback) -> Result<&Friend, SessionError> {
        self.tally.record_friend(&self.friend, feedback);
        self.friend = Friend::generate(&self.words, &self.faces, &mut self.rng)?;
        debug!(%feedback, sentence = %self.friend.sentence, "next friend");

        if !self.muted {
            self.speech.speak_detached(self.friend.sentence.to_string());
        }
        Ok(&self.friend)
    }
}

impl<F: EngineFactory> fmt::Debug for AppSession<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppSession")
            .field("screen", &self.screen)
            .field("friend", &self.friend)
            .field("muted", &self.muted)
            .field("speech", &self.speech.phase())
            .field("tally_keys", &self.tally.len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
