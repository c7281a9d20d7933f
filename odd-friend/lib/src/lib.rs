//! Odd Friend
//!
//! Compose a cartoon friend from random face parts, give it a random
//! sentence to say, and tally how the user feels about each piece.
//!
//! ## Main Types
//!
//! - [`AppSession`] - Load gate, displayed friend and user actions
//! - [`WordCatalog`] / [`FacePartCatalog`] - The content friends are built from
//! - [`Friend`] - A generated face and sentence
//! - [`FeedbackTally`] - Like/dislike/neutral counters per word and face part
//! - [`SwipeTracker`] - Turns drag deltas into swipes
//! - [`ImageCompositor`] - Renders a face to PNG for sharing
//! - [`SessionConfig`] - Where content comes from and how speech behaves
//!
//! ## Example
//!
//! ```
//! use friend_speaks::{Transcript, TranscriptFactory};
//! use odd_friend::{AppSession, SessionConfig};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), odd_friend::SessionError> {
//! let transcript = Transcript::default();
//! let mut session =
//!     AppSession::load(SessionConfig::new(), TranscriptFactory::new(transcript.clone())).await?;
//!
//! session.enter_main()?;
//! session.next()?;
//! session.flush_speech().await;
//! # Ok(())
//! # }
//! ```

mod catalog;
mod config;
mod error;
mod generate;
mod gesture;
mod session;
mod share;
mod tally;

pub use catalog::{
    ADJECTIVES, ASSET_EXTENSIONS, AssetId, Category, EYES, FacePartCatalog, HEADS, MOUTHS, NOUNS,
    VERBS, WordCatalog, random_pick,
};
pub use config::{APP_DIR, FaceSource, SessionConfig, WordSource, default_cache_dir};
pub use error::{ConfigError, GenerateError, LoadError, SessionError, ShareError};
pub use generate::{FaceParts, Friend, SentenceParts, generate_face, generate_sentence};
pub use gesture::{SWIPE_THRESHOLD, SwipeDirection, SwipeState, SwipeTracker};
pub use session::{AppSession, LOAD_FAILED_NOTICE, Screen};
pub use share::{
    CANVAS_SIZE, CHOOSER_TITLE, FaceRenderer, ImageCompositor, PNG_MIME, SHARE_FAILED_NOTICE,
    SNAPSHOT_DIR, SNAPSHOT_FILE, ShareIntent, ShareTarget, render_blocking, share_snapshot, snapshot_path,
    write_snapshot,
};
pub use tally::{Feedback, FeedbackTally, Stats};
