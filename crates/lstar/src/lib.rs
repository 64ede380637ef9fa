//! Active learning of deterministic finite automata from a minimally
//! adequate teacher, in the style of Angluin's L* algorithm.
//!
//! The teacher is split into two collaborators. A [`MembershipOracle`]
//! answers batches of membership queries, one per undefined cell of the
//! [`ObservationTable`]. Equivalence checking stays with the caller: the
//! learner hands out [hypothesis](LStar::hypothesis) automata and accepts
//! [`Counterexample`]s through [`LStar::refine_hypothesis`] until the
//! teacher is satisfied.
//!
//! ```
//! use lstar::core::CharAlphabet;
//! use lstar::{Dfa, DfaOracle, DfaState, LStar};
//!
//! // the target language: words over {a} of even length
//! let alphabet = CharAlphabet::of_size(1);
//! let target = Dfa::from_parts(
//!     alphabet.clone(),
//!     0,
//!     vec![DfaState::new(true, vec![1]), DfaState::new(false, vec![0])],
//! )
//! .unwrap();
//!
//! let oracle = DfaOracle::new(target.clone());
//! let mut learner = LStar::new(alphabet, oracle.clone());
//! learner.start_learning().unwrap();
//!
//! let mut hypothesis = learner.hypothesis().unwrap();
//! while let Err(counterexample) = oracle.equivalence(&hypothesis) {
//!     learner.refine_hypothesis(counterexample).unwrap();
//!     hypothesis = learner.hypothesis().unwrap();
//! }
//! assert_eq!(hypothesis.size(), 2);
//! assert!(hypothesis.equivalent(&target));
//! ```

pub mod dfa;
pub mod hypothesis;
pub mod learner;
pub mod oracle;
pub mod table;

pub use lstar_core as core;

pub use dfa::{Dfa, DfaError, DfaState};
pub use learner::{LStar, LStarError};
pub use oracle::{Counterexample, DfaOracle, FnOracle, MembershipOracle, OracleError, Query};
pub use table::{Inconsistency, ObservationTable, Output, RowSignature, TableError};
