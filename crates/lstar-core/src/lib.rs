//! Primitives for active automata learning: symbols, alphabets with a stable
//! symbol/index bijection, and immutable finite words.
//!
//! Everything in here is deliberately small. The interesting machinery lives
//! in the `lstar` crate, which builds observation tables and learners on top
//! of these types.

pub mod alphabet;
pub mod math;
pub mod word;

pub use alphabet::{Alphabet, CharAlphabet, IndexedAlphabet, Symbol};
pub use word::Word;
