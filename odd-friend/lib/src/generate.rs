//! Random sentence and face generation.
//!
//! Every generation draws each slot independently and uniformly from its
//! category. Results are immutable values; the next generation replaces
//! them rather than mutating them.

use std::fmt;

use rand::Rng;
use serde::Serialize;

use crate::catalog::{
    ADJECTIVES, AssetId, EYES, FacePartCatalog, HEADS, MOUTHS, NOUNS, VERBS, WordCatalog,
    random_pick,
};
use crate::error::GenerateError;

/// One adjective, verb and noun.
///
/// Displays as the sentence the friend says.
///
/// ## Examples
///
/// ```
/// use odd_friend::SentenceParts;
///
/// let parts = SentenceParts::new("fake", "lie about", "everything");
/// assert_eq!(parts.to_string(), "I'm so fake I lie about everything!");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SentenceParts {
    pub adjective: String,
    pub verb: String,
    pub noun: String,
}

impl SentenceParts {
    pub fn new(
        adjective: impl Into<String>,
        verb: impl Into<String>,
        noun: impl Into<String>,
    ) -> Self {
        Self {
            adjective: adjective.into(),
            verb: verb.into(),
            noun: noun.into(),
        }
    }

    /// The rendered sentence.
    pub fn sentence(&self) -> String {
        self.to_string()
    }

    /// Tally keys: each word as-is.
    pub fn content_keys(&self) -> [&str; 3] {
        [&self.adjective, &self.verb, &self.noun]
    }
}

impl fmt::Display for SentenceParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "I'm so {} I {} {}!", self.adjective, self.verb, self.noun)
    }
}

/// Draw one word from each category.
///
/// ## Errors
///
/// Returns [`GenerateError::EmptyCategory`] for the first empty category,
/// checked in adjective, verb, noun order.
pub fn generate_sentence<R: Rng + ?Sized>(
    adjectives: &[String],
    verbs: &[String],
    nouns: &[String],
    rng: &mut R,
) -> Result<SentenceParts, GenerateError> {
    let adjective = random_pick(ADJECTIVES, adjectives, rng)?;
    let verb = random_pick(VERBS, verbs, rng)?;
    let noun = random_pick(NOUNS, nouns, rng)?;
    Ok(SentenceParts::new(adjective, verb, noun))
}

/// The asset for each slot of a face.
///
/// Left and right eyes are drawn independently, so a friend may have
/// mismatched eyes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FaceParts {
    pub head: AssetId,
    pub left_eye: AssetId,
    pub right_eye: AssetId,
    pub mouth: AssetId,
}

impl FaceParts {
    /// Tally keys, one per slot: head, left eye, right eye, mouth.
    pub fn content_keys(&self) -> [String; 4] {
        [
            self.head.key(),
            self.left_eye.key(),
            self.right_eye.key(),
            self.mouth.key(),
        ]
    }
}

impl fmt::Display for FaceParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "head {} / eyes {} {} / mouth {}",
            self.head, self.left_eye, self.right_eye, self.mouth
        )
    }
}

/// Draw a head, two eyes and a mouth.
///
/// ## Errors
///
/// Returns [`GenerateError::EmptyCategory`] for the first empty category,
/// checked in head, eye, mouth order.
pub fn generate_face<R: Rng + ?Sized>(
    heads: &[AssetId],
    eyes: &[AssetId],
    mouths: &[AssetId],
    rng: &mut R,
) -> Result<FaceParts, GenerateError> {
    let head = random_pick(HEADS, heads, rng)?;
    let left_eye = random_pick(EYES, eyes, rng)?;
    let right_eye = random_pick(EYES, eyes, rng)?;
    let mouth = random_pick(MOUTHS, mouths, rng)?;
    Ok(FaceParts {
        head: head.clone(),
        left_eye: left_eye.clone(),
        right_eye: right_eye.clone(),
        mouth: mouth.clone(),
    })
}

/// What is on screen: a face and the sentence it says.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Friend {
    pub sentence: SentenceParts,
    pub face: FaceParts,
}

impl Friend {
    /// Generate a fresh friend from loaded catalogs.
    pub fn generate<R: Rng + ?Sized>(
        words: &WordCatalog,
        faces: &FacePartCatalog,
        rng: &mut R,
    ) -> Result<Self, GenerateError> {
        Ok(Self {
            sentence: generate_sentence(&words.adjectives, &words.verbs, &words.nouns, rng)?,
            face: generate_face(&faces.heads, &faces.eyes, &faces.mouths, rng)?,
        })
    }

    /// Every content key on screen: three words then four face slots.
    pub fn content_keys(&self) -> Vec<String> {
        self.sentence
            .content_keys()
            .into_iter()
            .map(str::to_string)
            .chain(self.face.content_keys())
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
