//! The race text corpus.
//!
//! Clients ship the same texts, so the wire only ever carries an index —
//! the server picks one at random when a countdown starts and needs the
//! text again only for its character length.

use rand::Rng;

/// Typing passages, in the order clients know them.
const TEXTS: &[&str] = &[
    "The quick brown fox jumps over the lazy dog while the cat watches \
     from the warm windowsill without a care in the world.",
    "Programming is the art of telling another human being what one wants \
     the computer to do, and doing so precisely enough that the machine \
     agrees.",
    "A river cuts through rock not because of its power but because of \
     its persistence, carving canyons one grain of sand at a time.",
    "In the middle of difficulty lies opportunity, and those who type \
     fastest under pressure tend to find it first.",
    "Ships in harbour are safe, but that is not what ships are built for; \
     set a course, trim the sails, and race the horizon.",
];

/// Read-only view over the built-in passages.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextCorpus;

impl TextCorpus {
    /// Number of passages.
    pub fn len(&self) -> usize {
        TEXTS.len()
    }

    /// Returns `true` if the corpus holds no passages.
    pub fn is_empty(&self) -> bool {
        TEXTS.is_empty()
    }

    /// Character length of the passage at `index`, if the index is valid.
    pub fn length(&self, index: usize) -> Option<usize> {
        TEXTS.get(index).map(|t| t.chars().count())
    }

    /// Picks a uniformly random valid index.
    pub fn pick_index(&self) -> usize {
        rand::rng().random_range(0..TEXTS.len())
    }
}
