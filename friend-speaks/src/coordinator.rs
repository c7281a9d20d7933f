//! The speech coordinator.
//!
//! [`SpeechCoordinator`] owns the single speech engine of the process. It
//! brings the engine up once, replays queued "ready" callbacks in the order
//! they were registered, and serialises every engine mutation so that two
//! utterances never interleave their stop/voice/prosody/speak calls.
//!
//! ## Lifecycle
//!
//! ```text
//! Uninitialized ──init──▶ Initializing ──ok──▶ Ready ──shutdown──▶ ShutDown
//!                              │
//!                              └──error / unsupported locale──▶ Failed
//! ```
//!
//! Speaking is best effort: outside `Ready` a request is logged and dropped,
//! it is never held back until the engine comes up.
//!
//! Detached requests go through one FIFO queue drained by a single worker
//! task, so they reach the engine in submission order and the most recent
//! one is always the last to speak.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};

use crate::errors::SpeechError;
use crate::traits::{EngineFactory, SpeechEngine};
use crate::types::{EnginePhase, Prosody, SpeechConfig, SpeechRequest, Utterance};

type ReadyCallback = Box<dyn FnOnce() + Send + 'static>;

struct Lifecycle {
    phase: EnginePhase,
    waiters: Vec<ReadyCallback>,
}

enum QueuedJob {
    Speak(SpeechRequest),
    Flush(oneshot::Sender<()>),
}

struct EngineSlot<E> {
    engine: Option<E>,
    rng: StdRng,
}

struct Inner<F: EngineFactory> {
    factory: F,
    config: SpeechConfig,
    lifecycle: Mutex<Lifecycle>,
    slot: tokio::sync::Mutex<EngineSlot<F::Engine>>,
    phase_tx: watch::Sender<EnginePhase>,
    queue: mpsc::UnboundedSender<QueuedJob>,
    /// Taken by the worker when the first detached request arrives.
    pending_queue: Mutex<Option<mpsc::UnboundedReceiver<QueuedJob>>>,
}

/// Process-wide owner of the speech engine.
///
/// Cloning is cheap; all clones share one engine and one lifecycle.
///
/// ## Examples
///
/// ```
/// use friend_speaks::{SpeechConfig, SpeechCoordinator, Transcript, TranscriptFactory};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let transcript = Transcript::default();
/// let speech = SpeechCoordinator::new(
///     TranscriptFactory::new(transcript.clone()),
///     SpeechConfig::default(),
/// );
///
/// speech.init(|| println!("ready"));
/// assert!(speech.ready().await);
///
/// speech.speak("I'm so brave I run fast!").await.unwrap();
/// assert_eq!(transcript.spoken(), vec!["I'm so brave I run fast!"]);
/// # }
/// ```
pub struct SpeechCoordinator<F: EngineFactory> {
    inner: Arc<Inner<F>>,
}

impl<F: EngineFactory> Clone for SpeechCoordinator<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F: EngineFactory> SpeechCoordinator<F> {
    /// Create a coordinator. No engine is built until [`init`](Self::init).
    pub fn new(factory: F, config: SpeechConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let (phase_tx, _) = watch::channel(EnginePhase::Uninitialized);
        let (queue, pending_queue) = mpsc::unbounded_channel();

        Self {
            inner: Arc::new(Inner {
                factory,
                config,
                lifecycle: Mutex::new(Lifecycle {
                    phase: EnginePhase::Uninitialized,
                    waiters: Vec::new(),
                }),
                slot: tokio::sync::Mutex::new(EngineSlot { engine: None, rng }),
                phase_tx,
                queue,
                pending_queue: Mutex::new(Some(pending_queue)),
            }),
        }
    }

    pub fn config(&self) -> &SpeechConfig {
        &self.inner.config
    }

    /// The current lifecycle phase.
    pub fn phase(&self) -> EnginePhase {
        self.lifecycle().phase
    }

    pub fn is_ready(&self) -> bool {
        self.phase() == EnginePhase::Ready
    }

    /// Register `on_ready` and make sure the engine is being built.
    ///
    /// - `Ready`: `on_ready` runs immediately on the calling thread.
    /// - `Uninitialized`: `on_ready` is queued and construction starts on the
    ///   current Tokio runtime.
    /// - `Initializing`: `on_ready` is queued behind earlier callbacks; no
    ///   second construction is started.
    /// - `Failed` / `ShutDown`: the callback can never fire and is dropped.
    ///
    /// Queued callbacks run exactly once, in registration order, when
    /// construction succeeds.
    pub fn init(&self, on_ready: impl FnOnce() + Send + 'static) {
        let mut lifecycle = self.lifecycle();
        let phase = lifecycle.phase;

        match phase {
            EnginePhase::Ready => {
                drop(lifecycle);
                on_ready();
            }
            EnginePhase::Initializing => {
                lifecycle.waiters.push(Box::new(on_ready));
                debug!(queued = lifecycle.waiters.len(), "queued speech ready callback");
            }
            EnginePhase::Uninitialized => {
                let Ok(runtime) = Handle::try_current() else {
                    lifecycle.phase = EnginePhase::Failed;
                    drop(lifecycle);
                    error!("speech engine init requires a Tokio runtime");
                    self.publish(EnginePhase::Failed);
                    return;
                };

                lifecycle.waiters.push(Box::new(on_ready));
                lifecycle.phase = EnginePhase::Initializing;
                drop(lifecycle);
                self.publish(EnginePhase::Initializing);

                let this = self.clone();
                runtime.spawn(async move { this.construct().await });
            }
            EnginePhase::Failed | EnginePhase::ShutDown => {
                drop(lifecycle);
                warn!(%phase, "speech engine unavailable; ready callback dropped");
            }
        }
    }

    /// Wait until the coordinator settles.
    ///
    /// Resolves to `true` once `Ready` (after queued callbacks have run) and
    /// to `false` once the coordinator can no longer become ready. Never
    /// resolves if [`init`](Self::init) is never called.
    pub async fn ready(&self) -> bool {
        let mut rx = self.inner.phase_tx.subscribe();
        match rx
            .wait_for(|phase| *phase == EnginePhase::Ready || phase.is_terminal())
            .await
        {
            Ok(phase) => *phase == EnginePhase::Ready,
            Err(_) => false,
        }
    }

    /// Speak `request`, interrupting whatever is currently playing.
    ///
    /// The engine lock is held for the whole voice/prosody/stop/speak
    /// sequence, so concurrent calls are applied one after the other in the
    /// order they acquired the lock; the last one wins the speaker.
    ///
    /// ## Errors
    ///
    /// Failures are logged here and returned for callers that care; none of
    /// them leave the coordinator in a different phase.
    /// - [`SpeechError::NotReady`] outside `Ready` (the engine is not touched)
    /// - [`SpeechError::NoVoiceForLanguage`] when the picked locale has no
    ///   voice (the current utterance keeps playing)
    /// - [`SpeechError::EngineFailed`] when the engine rejects a call
    pub async fn speak(&self, request: impl Into<SpeechRequest>) -> Result<Utterance, SpeechError> {
        let request = request.into();
        let phase = self.phase();
        if phase != EnginePhase::Ready {
            warn!(%phase, "speech engine not ready; utterance dropped");
            return Err(SpeechError::NotReady {
                phase: phase.to_string(),
            });
        }

        let mut slot = self.inner.slot.lock().await;
        let EngineSlot { engine, rng } = &mut *slot;
        let Some(engine) = engine.as_mut() else {
            warn!("speech engine released; utterance dropped");
            return Err(SpeechError::NotReady {
                phase: EnginePhase::ShutDown.to_string(),
            });
        };

        match speak_on(engine, rng, &self.inner.config, request) {
            Ok(utterance) => {
                debug!(
                    text = %utterance.text,
                    locale = ?utterance.locale.as_ref().map(|l| l.tag().to_string()),
                    voice = ?utterance.voice.as_ref().map(|v| v.id.clone()),
                    "speaking"
                );
                Ok(utterance)
            }
            Err(err) => {
                warn!(error = %err, "utterance dropped");
                Err(err)
            }
        }
    }

    /// Fire-and-forget [`speak`](Self::speak).
    ///
    /// The request joins the coordinator's queue and is applied after every
    /// detached request submitted before it. Returns `false` when the queue
    /// worker cannot be started because there is no Tokio runtime (the
    /// request is dropped and logged).
    pub fn speak_detached(&self, request: impl Into<SpeechRequest>) -> bool {
        if !self.ensure_worker() {
            warn!("no Tokio runtime; utterance dropped");
            return false;
        }
        self.inner
            .queue
            .send(QueuedJob::Speak(request.into()))
            .is_ok()
    }

    /// Wait until every detached request submitted so far has been applied.
    pub async fn flush(&self) {
        let (done, applied) = oneshot::channel();
        if !self.ensure_worker() || self.inner.queue.send(QueuedJob::Flush(done)).is_err() {
            return;
        }
        let _ = applied.await;
    }

    /// Stop any utterance and release the engine.
    ///
    /// Queued ready callbacks are dropped and later `speak` calls behave as
    /// if the engine were not ready.
    pub async fn shutdown(&self) {
        let previous = {
            let mut lifecycle = self.lifecycle();
            let previous = lifecycle.phase;
            lifecycle.phase = EnginePhase::ShutDown;
            lifecycle.waiters.clear();
            previous
        };
        self.publish(EnginePhase::ShutDown);

        let mut slot = self.inner.slot.lock().await;
        if let Some(mut engine) = slot.engine.take() {
            release(&mut engine);
            info!(%previous, "speech engine shut down");
        }
    }

    async fn construct(&self) {
        debug!(locale = %self.inner.config.default_locale, "constructing speech engine");

        let built = match self.inner.factory.construct().await {
            Ok(mut engine) => match engine.set_language(&self.inner.config.default_locale) {
                Ok(()) => Ok(engine),
                Err(err) => {
                    engine.shutdown();
                    Err(err)
                }
            },
            Err(err) => Err(err),
        };

        let engine = match built {
            Ok(engine) => engine,
            Err(err) => {
                match &err {
                    SpeechError::LanguageUnsupported { locale } => {
                        error!(%locale, "the default speech language is not supported");
                    }
                    _ => error!(error = %err, "speech engine initialization failed"),
                }
                let dropped = {
                    let mut lifecycle = self.lifecycle();
                    if lifecycle.phase == EnginePhase::Initializing {
                        lifecycle.phase = EnginePhase::Failed;
                    }
                    std::mem::take(&mut lifecycle.waiters).len()
                };
                debug!(dropped, "ready callbacks discarded");
                self.publish(self.phase());
                return;
            }
        };

        self.inner.slot.lock().await.engine = Some(engine);

        let waiters = {
            let mut lifecycle = self.lifecycle();
            if lifecycle.phase == EnginePhase::Initializing {
                lifecycle.phase = EnginePhase::Ready;
                Some(std::mem::take(&mut lifecycle.waiters))
            } else {
                None
            }
        };

        let Some(waiters) = waiters else {
            // shut down while constructing
            if let Some(mut engine) = self.inner.slot.lock().await.engine.take() {
                release(&mut engine);
            }
            debug!("speech engine released after late construction");
            return;
        };

        info!(callbacks = waiters.len(), "speech engine initialized");
        for waiter in waiters {
            waiter();
        }
        self.publish(EnginePhase::Ready);
    }

    /// Start the queue worker on the current runtime if it is not running.
    fn ensure_worker(&self) -> bool {
        let mut pending = self
            .inner
            .pending_queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(jobs) = pending.take() else {
            return true;
        };
        let Ok(runtime) = Handle::try_current() else {
            *pending = Some(jobs);
            return false;
        };

        debug!("starting speech queue worker");
        runtime.spawn(drain_queue(Arc::downgrade(&self.inner), jobs));
        true
    }

    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.inner
            .lifecycle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, phase: EnginePhase) {
        self.inner.phase_tx.send_replace(phase);
    }
}

/// Apply queued jobs one at a time until the coordinator is dropped.
///
/// The worker only holds a weak reference so that it never keeps the
/// coordinator (and with it the queue sender) alive.
async fn drain_queue<F: EngineFactory>(
    inner: Weak<Inner<F>>,
    mut jobs: mpsc::UnboundedReceiver<QueuedJob>,
) {
    while let Some(job) = jobs.recv().await {
        match job {
            QueuedJob::Speak(request) => {
                let Some(inner) = inner.upgrade() else {
                    break;
                };
                let _ = SpeechCoordinator { inner }.speak(request).await;
            }
            QueuedJob::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!("speech queue worker stopped");
}

fn release<E: SpeechEngine>(engine: &mut E) {
    if engine.is_speaking() {
        let _ = engine.stop();
    }
    engine.shutdown();
}

/// Resolve voice and prosody for `request`, then stop-and-speak.
///
/// Voice resolution happens before anything is stopped so that an aborted
/// request leaves the current utterance playing.
fn speak_on<E: SpeechEngine>(
    engine: &mut E,
    rng: &mut StdRng,
    config: &SpeechConfig,
    request: SpeechRequest,
) -> Result<Utterance, SpeechError> {
    let SpeechRequest { text, options } = request;

    let locale = match options.locale {
        Some(locale) => Some(locale),
        None if config.randomize => config.locales.choose(rng).cloned(),
        None => None,
    };

    let voice = match (&locale, options.voice.as_deref()) {
        (Some(locale), requested) => {
            let candidates: Vec<_> = engine
                .voices_for(locale)?
                .into_iter()
                .filter(|voice| requested.is_none_or(|name| voice.answers_to(name)))
                .collect();
            let Some(voice) = candidates.choose(rng).cloned() else {
                return Err(SpeechError::NoVoiceForLanguage {
                    locale: locale.tag().to_string(),
                });
            };
            Some(voice)
        }
        (None, Some(name)) => {
            let Some(voice) = engine.voices()?.into_iter().find(|v| v.answers_to(name)) else {
                return Err(SpeechError::NoVoiceForLanguage {
                    locale: format!("voice {name}"),
                });
            };
            Some(voice)
        }
        (None, None) => None,
    };

    let prosody = if config.randomize || options.pitch.is_some() || options.rate.is_some() {
        let base = if config.randomize {
            Prosody {
                pitch: config.pitch.sample(rng),
                rate: config.rate.sample(rng),
            }
        } else {
            Prosody::NEUTRAL
        };
        Some(Prosody {
            pitch: options.pitch.unwrap_or(base.pitch),
            rate: options.rate.unwrap_or(base.rate),
        })
    } else {
        None
    };

    if let Some(voice) = &voice {
        engine.set_voice(voice)?;
    }
    if let Some(prosody) = prosody {
        engine.set_prosody(prosody)?;
    }

    if engine.is_speaking() {
        debug!("interrupting current utterance");
        engine.stop()?;
    }
    engine.speak(&text)?;

    Ok(Utterance {
        text,
        locale,
        voice,
        prosody,
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::Notify;

    use super::*;
    use crate::engines::transcript::{EngineCall, Transcript, TranscriptFactory};
    use crate::types::{Locale, SpeakOptions, VoiceInfo};

    /// Factory whose construction blocks until released by the test.
    struct GatedFactory {
        gate: Arc<Notify>,
        constructions: Arc<AtomicUsize>,
        inner: TranscriptFactory,
    }

    impl EngineFactory for GatedFactory {
        type Engine = <TranscriptFactory as EngineFactory>::Engine;

        async fn construct(&self) -> Result<Self::Engine, SpeechError> {
            self.constructions.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            self.inner.construct().await
        }
    }

    struct BrokenFactory;

    impl EngineFactory for BrokenFactory {
        type Engine = <TranscriptFactory as EngineFactory>::Engine;

        async fn construct(&self) -> Result<Self::Engine, SpeechError> {
            Err(SpeechError::init("no audio device"))
        }
    }

    fn ready_coordinator(
        config: SpeechConfig,
    ) -> (SpeechCoordinator<TranscriptFactory>, Transcript) {
        let transcript = Transcript::default();
        let coordinator =
            SpeechCoordinator::new(TranscriptFactory::new(transcript.clone()), config);
        (coordinator, transcript)
    }

    #[tokio::test]
    async fn init_callbacks_fire_once_in_order_after_one_construction() {
        let gate = Arc::new(Notify::new());
        let constructions = Arc::new(AtomicUsize::new(0));
        let coordinator = SpeechCoordinator::new(
            GatedFactory {
                gate: Arc::clone(&gate),
                constructions: Arc::clone(&constructions),
                inner: TranscriptFactory::new(Transcript::default()),
            },
            SpeechConfig::default(),
        );

        let fired = Arc::new(Mutex::new(Vec::new()));
        for n in 0..5 {
            let fired = Arc::clone(&fired);
            coordinator.init(move || fired.lock().unwrap().push(n));
        }
        assert_eq!(coordinator.phase(), EnginePhase::Initializing);
        assert!(fired.lock().unwrap().is_empty());

        gate.notify_one();
        assert!(coordinator.ready().await);

        assert_eq!(*fired.lock().unwrap(), vec![0, 1, 2, 3, 4]);
        assert_eq!(constructions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn init_when_ready_runs_callback_immediately() {
        let (coordinator, _) = ready_coordinator(SpeechConfig::default());
        coordinator.init(|| {});
        assert!(coordinator.ready().await);

        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        coordinator.init(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn speak_before_ready_never_touches_engine() {
        let (coordinator, transcript) = ready_coordinator(SpeechConfig::default());

        let result = coordinator.speak("hello").await;
        assert!(matches!(result, Err(SpeechError::NotReady { .. })));
        assert!(transcript.calls().is_empty());
    }

    #[tokio::test]
    async fn unsupported_default_language_never_becomes_ready() {
        let transcript = Transcript::default();
        let factory = TranscriptFactory::new(transcript.clone())
            .with_voices(vec![VoiceInfo::new("de-1", "Anna", "de-DE")]);
        let coordinator = SpeechCoordinator::new(factory, SpeechConfig::default());

        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        coordinator.init(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(!coordinator.ready().await);
        assert_eq!(coordinator.phase(), EnginePhase::Failed);
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        let before = transcript.calls().len();
        assert!(coordinator.speak("hello").await.is_err());
        assert_eq!(transcript.calls().len(), before);
    }

    #[tokio::test]
    async fn construction_failure_is_terminal() {
        let coordinator = SpeechCoordinator::new(BrokenFactory, SpeechConfig::default());
        coordinator.init(|| panic!("must not fire"));
        assert!(!coordinator.ready().await);
        assert_eq!(coordinator.phase(), EnginePhase::Failed);

        // later registrations are dropped too
        coordinator.init(|| panic!("must not fire"));
    }

    #[tokio::test]
    async fn new_utterance_interrupts_current_one() {
        let (coordinator, transcript) = ready_coordinator(SpeechConfig::default());
        coordinator.init(|| {});
        assert!(coordinator.ready().await);

        coordinator.speak("first").await.unwrap();
        coordinator.speak("second").await.unwrap();

        let calls: Vec<EngineCall> = transcript
            .calls()
            .into_iter()
            .filter(|c| matches!(c, EngineCall::Stop | EngineCall::Speak(_)))
            .collect();
        assert_eq!(
            calls,
            vec![
                EngineCall::Speak("first".into()),
                EngineCall::Stop,
                EngineCall::Speak("second".into()),
            ]
        );
    }

    #[tokio::test]
    async fn randomized_utterance_picks_voice_and_prosody_in_range() {
        let config = SpeechConfig::default()
            .with_randomized_voices(true)
            .with_seed(11);
        let (coordinator, _) = ready_coordinator(config);
        coordinator.init(|| {});
        assert!(coordinator.ready().await);

        for _ in 0..20 {
            let utterance = coordinator.speak("hi").await.unwrap();
            let locale = utterance.locale.expect("random locale");
            let voice = utterance.voice.expect("random voice");
            assert!(Locale::supported().contains(&locale));
            assert!(locale.matches_tag(&voice.language));
            let prosody = utterance.prosody.expect("random prosody");
            assert!((0.4..=2.0).contains(&prosody.pitch));
            assert!((0.9..=1.4).contains(&prosody.rate));
        }
    }

    #[tokio::test]
    async fn missing_voice_aborts_without_stopping_current_audio() {
        let transcript = Transcript::default();
        let factory = TranscriptFactory::new(transcript.clone())
            .with_voices(vec![VoiceInfo::new("us-1", "Una", "en-US")]);
        let config = SpeechConfig::default()
            .with_randomized_voices(true)
            .with_locales(vec![Locale::DeDe]);
        let coordinator = SpeechCoordinator::new(factory, config);
        coordinator.init(|| {});
        assert!(coordinator.ready().await);

        let spoken = coordinator
            .speak(SpeechRequest::new("playing").with_options(SpeakOptions::new().with_locale(Locale::EnUs)))
            .await;
        assert!(spoken.is_ok());

        let before = transcript.calls();
        let aborted = coordinator.speak("aborted").await;
        assert!(matches!(
            aborted,
            Err(SpeechError::NoVoiceForLanguage { ref locale }) if locale == "de-DE"
        ));
        assert_eq!(transcript.calls(), before);
    }

    #[tokio::test]
    async fn explicit_options_override_randomization() {
        let config = SpeechConfig::default().with_randomized_voices(true).with_seed(1);
        let (coordinator, transcript) = ready_coordinator(config);
        coordinator.init(|| {});
        assert!(coordinator.ready().await);

        let options = SpeakOptions::new()
            .with_locale(Locale::EnGb)
            .with_pitch(1.0)
            .with_rate(1.0);
        let utterance = coordinator
            .speak(SpeechRequest::new("cheerio").with_options(options))
            .await
            .unwrap();

        assert_eq!(utterance.locale, Some(Locale::EnGb));
        assert_eq!(utterance.prosody, Some(Prosody::NEUTRAL));
        assert!(transcript.calls().contains(&EngineCall::SetProsody(Prosody::NEUTRAL)));
    }

    #[tokio::test]
    async fn plain_config_leaves_voice_and_prosody_alone() {
        let (coordinator, transcript) = ready_coordinator(SpeechConfig::default());
        coordinator.init(|| {});
        assert!(coordinator.ready().await);

        let utterance = coordinator.speak("plain").await.unwrap();
        assert_eq!(utterance.voice, None);
        assert_eq!(utterance.prosody, None);
        assert!(
            !transcript
                .calls()
                .iter()
                .any(|c| matches!(c, EngineCall::SetVoice(_) | EngineCall::SetProsody(_)))
        );
    }

    #[tokio::test]
    async fn shutdown_releases_engine_and_silences_speak() {
        let (coordinator, transcript) = ready_coordinator(SpeechConfig::default());
        coordinator.init(|| {});
        assert!(coordinator.ready().await);
        coordinator.speak("bye").await.unwrap();

        coordinator.shutdown().await;
        assert_eq!(coordinator.phase(), EnginePhase::ShutDown);
        assert!(transcript.calls().ends_with(&[EngineCall::Stop, EngineCall::Shutdown]));

        let before = transcript.calls().len();
        assert!(coordinator.speak("anyone?").await.is_err());
        assert_eq!(transcript.calls().len(), before);
    }

    #[tokio::test]
    async fn shutdown_during_construction_drops_callbacks() {
        let gate = Arc::new(Notify::new());
        let transcript = Transcript::default();
        let coordinator = SpeechCoordinator::new(
            GatedFactory {
                gate: Arc::clone(&gate),
                constructions: Arc::new(AtomicUsize::new(0)),
                inner: TranscriptFactory::new(transcript.clone()),
            },
            SpeechConfig::default(),
        );

        coordinator.init(|| panic!("must not fire"));
        coordinator.shutdown().await;
        assert!(!coordinator.ready().await);

        gate.notify_one();
        // let the construction task observe the shutdown
        for _ in 0..50 {
            if transcript.calls().contains(&EngineCall::Shutdown) {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        assert_eq!(coordinator.phase(), EnginePhase::ShutDown);
        assert!(transcript.calls().contains(&EngineCall::Shutdown));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn detached_requests_are_applied_in_submission_order() {
        let (coordinator, transcript) = ready_coordinator(SpeechConfig::default());
        coordinator.init(|| {});
        assert!(coordinator.ready().await);

        for n in 0..10 {
            assert!(coordinator.speak_detached(format!("line {n}")));
        }
        coordinator.flush().await;

        let expected: Vec<String> = (0..10).map(|n| format!("line {n}")).collect();
        assert_eq!(transcript.spoken(), expected);
        // every utterance but the first interrupted its predecessor
        let stops = transcript
            .calls()
            .iter()
            .filter(|c| **c == EngineCall::Stop)
            .count();
        assert_eq!(stops, 9);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn last_detached_request_wins_across_tasks() {
        let (coordinator, transcript) = ready_coordinator(SpeechConfig::default());
        coordinator.init(|| {});
        assert!(coordinator.ready().await);

        for round in 0..20 {
            for n in 0..5 {
                coordinator.speak_detached(format!("round {round} line {n}"));
            }
            coordinator.flush().await;
            assert_eq!(
                transcript.last_spoken(),
                Some(format!("round {round} line 4"))
            );
        }
        assert_eq!(transcript.spoken().len(), 100);
    }

    #[tokio::test]
    async fn detached_requests_before_ready_are_dropped() {
        let gate = Arc::new(Notify::new());
        let transcript = Transcript::default();
        let coordinator = SpeechCoordinator::new(
            GatedFactory {
                gate: Arc::clone(&gate),
                constructions: Arc::new(AtomicUsize::new(0)),
                inner: TranscriptFactory::new(transcript.clone()),
            },
            SpeechConfig::default(),
        );
        coordinator.init(|| {});

        assert!(coordinator.speak_detached("too early"));
        coordinator.flush().await;
        gate.notify_one();
        assert!(coordinator.ready().await);

        coordinator.speak_detached("on time");
        coordinator.flush().await;
        assert_eq!(transcript.spoken(), vec!["on time"]);
    }

    #[test]
    fn detached_speech_outside_runtime_is_dropped() {
        let (coordinator, transcript) = ready_coordinator(SpeechConfig::default());
        assert!(!coordinator.speak_detached("nobody listens"));
        assert!(transcript.calls().is_empty());
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn dropped_utterance_is_logged() {
        let (coordinator, _) = ready_coordinator(SpeechConfig::default());
        let _ = coordinator.speak("too early").await;
        assert!(logs_contain("speech engine not ready"));
    }

    #[test]
    fn init_outside_runtime_fails_without_panicking() {
        let (coordinator, _) = ready_coordinator(SpeechConfig::default());
        coordinator.init(|| panic!("must not fire"));
        assert_eq!(coordinator.phase(), EnginePhase::Failed);
    }
}
