//! Random answer strings.

use rand::Rng;
use rand::seq::IndexedRandom;

/// Characters answers are drawn from.
///
/// Glyphs that are easy to confuse once distorted (`C`/`c`, `O`/`0`,
/// `I`/`l`/`1`, `J`/`j`, `G`, `Q`, `Y`, `h`) are left out.
pub const ALPHABET: &str = "ABDEFHKLMNPRSTUVWXZabdefgikmnopqrstuvwxyz023456789";

/// A string of `len` characters drawn uniformly from [`ALPHABET`].
#[must_use]
pub fn random_text<R: Rng + ?Sized>(len: usize, rng: &mut R) -> String {
    let chars: Vec<char> = ALPHABET.chars().collect();
    (0..len).filter_map(|_| chars.choose(rng).copied()).collect()
}
