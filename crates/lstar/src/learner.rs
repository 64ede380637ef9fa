use lstar_core::{Alphabet, Word};
use thiserror::Error;
use tracing::{debug, trace};

use crate::dfa::Dfa;
use crate::hypothesis;
use crate::oracle::{Counterexample, MembershipOracle, OracleError, Query};
use crate::table::{ObservationTable, Output, TableError};

/// Errors raised by the learner.
#[derive(Debug, Error)]
pub enum LStarError {
    /// The learner's operations were invoked in the wrong order.
    #[error("invalid lifecycle: {0}")]
    InvalidLifecycle(&'static str),
    /// The membership oracle failed; the observation table is unchanged.
    #[error("membership oracle error")]
    Oracle(#[from] OracleError),
    /// The observation table rejected a structural mutation. This cannot
    /// happen unless the learner itself is broken.
    #[error("observation table misuse")]
    Table(#[from] TableError),
}

/// An active learner for deterministic finite automata in the style of
/// Angluin's L* algorithm.
///
/// The learner owns an [`ObservationTable`] and drives it through three
/// phases: populating undefined cells with one batched call to the
/// membership oracle, closing the table by promoting long prefixes, and
/// restoring consistency by appending distinguishing suffixes. Once the
/// table is closed and consistent, a hypothesis automaton can be extracted
/// and counterexamples to it are folded back into the table.
pub struct LStar<A: Alphabet, D: Output, O: MembershipOracle<A::Symbol, D>> {
    alphabet: A,
    oracle: O,
    table: ObservationTable<A::Symbol, D>,
    started: bool,
}

impl<A: Alphabet, D: Output, O: MembershipOracle<A::Symbol, D>> LStar<A, D, O> {
    /// Creates a learner for the given alphabet. The oracle is not
    /// consulted until [`Self::start_learning`] is called.
    pub fn new(alphabet: A, oracle: O) -> Self {
        let table = ObservationTable::for_alphabet(&alphabet);
        Self {
            alphabet,
            oracle,
            table,
            started: false,
        }
    }

    /// The alphabet over which the target language is learned.
    pub fn alphabet(&self) -> &A {
        &self.alphabet
    }

    /// A read-only view of the observation table.
    pub fn observation_table(&self) -> &ObservationTable<A::Symbol, D> {
        &self.table
    }

    /// The suffix set of the table, in column order.
    pub fn global_suffixes(&self) -> impl Iterator<Item = &Word<A::Symbol>> {
        self.table.suffixes()
    }

    /// Fills the initial table and establishes closedness and consistency.
    /// May complete successfully at most once; a failed attempt leaves the
    /// learner unstarted and can be retried.
    pub fn start_learning(&mut self) -> Result<(), LStarError> {
        if self.started {
            return Err(LStarError::InvalidLifecycle(
                "start_learning may be called at most once",
            ));
        }
        debug!(
            "starting to learn over an alphabet of {} symbols",
            self.alphabet.size()
        );
        self.populate()?;
        self.make_closed_and_consistent()?;
        self.started = true;
        Ok(())
    }

    /// Folds a counterexample into the table: every prefix of the word
    /// becomes a short prefix, the one-symbol extensions of the new short
    /// prefixes become long prefixes, and the table is refilled, closed and
    /// made consistent again. Always reports that the table was refined.
    pub fn refine_hypothesis(
        &mut self,
        counterexample: Counterexample<A::Symbol, D>,
    ) -> Result<bool, LStarError> {
        self.ensure_started()?;
        debug!("refining with counterexample {:?}", counterexample.word);

        let mut promoted = Vec::new();
        for prefix in counterexample.word.prefixes(true) {
            if self.table.is_short(&prefix) {
                continue;
            }
            if self.table.is_long(&prefix) {
                self.table.move_long_to_short(&prefix)?;
            } else {
                self.table.add_short_prefix(prefix.clone())?;
            }
            promoted.push(prefix);
        }
        self.table.remove_short_prefixes_from_long();

        for prefix in &promoted {
            for sym in self.alphabet.symbols() {
                let extension = prefix.append(sym.clone());
                if !self.table.is_short(&extension) {
                    self.table.add_long_prefix(extension)?;
                }
            }
        }

        self.populate()?;
        self.make_closed_and_consistent()?;
        Ok(true)
    }

    /// Appends caller-provided suffixes to the table, fills the new columns
    /// and re-closes. Consistency is not rechecked here; a defect introduced
    /// by one of the suffixes is repaired by the next refinement cycle.
    pub fn add_global_suffixes<I: IntoIterator<Item = Word<A::Symbol>>>(
        &mut self,
        suffixes: I,
    ) -> Result<(), LStarError> {
        for suffix in suffixes {
            if self.table.add_suffix(suffix.clone()) {
                trace!("added the global suffix {:?}", suffix);
            }
        }
        self.populate()?;
        self.close()
    }

    fn ensure_started(&self) -> Result<(), LStarError> {
        if self.started {
            Ok(())
        } else {
            Err(LStarError::InvalidLifecycle(
                "start_learning must be called first",
            ))
        }
    }

    /// Issues one batched oracle call for all undefined cells and installs
    /// the results. Nothing is installed unless the whole batch succeeded,
    /// so a failing oracle leaves the table exactly as it was.
    fn populate(&mut self) -> Result<(), LStarError> {
        let missing = self.table.missing_cells();
        if missing.is_empty() {
            return Ok(());
        }
        let mut queries: Vec<Query<A::Symbol, D>> = missing
            .into_iter()
            .map(|(prefix, suffix)| Query::new(prefix, suffix))
            .collect();
        trace!("dispatching a batch of {} membership queries", queries.len());
        self.oracle.process(&mut queries)?;
        if let Some(unanswered) = queries.iter().find(|query| !query.is_answered()) {
            return Err(OracleError::Unanswered(format!("{:?}", unanswered.word())).into());
        }
        for query in queries {
            let (prefix, suffix, output) = query.into_parts();
            let output = output.expect("the batch was verified to be fully answered");
            self.table.record(&prefix, &suffix, output)?;
        }
        Ok(())
    }

    /// Promotes unclosed long prefixes until every long-prefix row has a
    /// short-prefix counterpart. Terminates because the short region is
    /// bounded by the number of distinct signatures.
    fn close(&mut self) -> Result<(), LStarError> {
        while let Some(prefix) = self.table.find_unclosed().cloned() {
            trace!("closing the table by promoting {:?}", prefix);
            self.table.move_long_to_short(&prefix)?;
            for sym in self.alphabet.symbols() {
                let extension = prefix.append(sym.clone());
                if !self.table.is_short(&extension) {
                    self.table.add_long_prefix(extension)?;
                }
            }
            self.populate()?;
        }
        Ok(())
    }

    /// Alternates closing and consistency repair until both properties
    /// hold. Every repair appends a suffix that separates two previously
    /// equal rows, so the loop terminates.
    fn make_closed_and_consistent(&mut self) -> Result<(), LStarError> {
        loop {
            self.close()?;
            let Some(inconsistency) = self.table.find_inconsistency(&self.alphabet) else {
                return Ok(());
            };
            let witness = inconsistency.witness();
            trace!(
                "separating {:?} and {:?} with the new suffix {:?}",
                inconsistency.left, inconsistency.right, witness
            );
            self.table.add_suffix(witness);
            self.populate()?;
        }
    }
}

impl<A: Alphabet, O: MembershipOracle<A::Symbol, bool>> LStar<A, bool, O> {
    /// Extracts the hypothesis automaton from the current table.
    pub fn hypothesis(&self) -> Result<Dfa<A>, LStarError> {
        self.ensure_started()?;
        Ok(hypothesis::dfa_from_table(&self.alphabet, &self.table))
    }
}
