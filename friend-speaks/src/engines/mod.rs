//! Speech engine implementations.
//!
//! - [`transcript`] records every engine call in memory; it backs the
//!   terminal front end and the test suites.
//! - `system` (feature `system`) drives the host's native TTS engine.

#[cfg(feature = "system")]
pub mod system;
pub mod transcript;
