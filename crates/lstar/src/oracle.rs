use std::error::Error;

use lstar_core::{Alphabet, Symbol, Word};
use thiserror::Error as ThisError;

use crate::dfa::Dfa;

/// A single membership query: does the concatenation of `prefix` and
/// `suffix` belong to the target language? The oracle fills in the answer
/// via [`Query::answer`].
#[derive(Clone, Debug)]
pub struct Query<S: Symbol, D> {
    prefix: Word<S>,
    suffix: Word<S>,
    output: Option<D>,
}

impl<S: Symbol, D> Query<S, D> {
    /// Creates an unanswered query for the given prefix and suffix.
    pub fn new(prefix: Word<S>, suffix: Word<S>) -> Self {
        Self {
            prefix,
            suffix,
            output: None,
        }
    }

    /// The row label this query belongs to.
    pub fn prefix(&self) -> &Word<S> {
        &self.prefix
    }

    /// The column label this query belongs to.
    pub fn suffix(&self) -> &Word<S> {
        &self.suffix
    }

    /// The queried word, i.e. the concatenation of prefix and suffix.
    pub fn word(&self) -> Word<S> {
        self.prefix.concat(&self.suffix)
    }

    /// Installs the target language's output for the queried word.
    pub fn answer(&mut self, output: D) {
        self.output = Some(output);
    }

    /// Whether the oracle has answered this query.
    pub fn is_answered(&self) -> bool {
        self.output.is_some()
    }

    /// The answer, if one has been installed.
    pub fn output(&self) -> Option<&D> {
        self.output.as_ref()
    }

    /// Decomposes the query into prefix, suffix and the answer.
    pub fn into_parts(self) -> (Word<S>, Word<S>, Option<D>) {
        (self.prefix, self.suffix, self.output)
    }
}

/// Errors surfacing from a membership oracle. Failures raised by the oracle
/// itself are passed through unchanged.
#[derive(Debug, ThisError)]
pub enum OracleError {
    /// The oracle failed to process the batch.
    #[error("membership oracle failure: {0}")]
    Failed(Box<dyn Error + Send + Sync>),
    /// The oracle returned successfully but left a query unanswered.
    #[error("the membership query for {0} was left unanswered")]
    Unanswered(String),
}

impl OracleError {
    /// Wraps an arbitrary error raised by an oracle implementation.
    pub fn failed<E: Error + Send + Sync + 'static>(err: E) -> Self {
        Self::Failed(Box::new(err))
    }

    /// Creates a failure from a plain message.
    pub fn message(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into().into())
    }
}

/// A minimally adequate teacher's membership side: an entity that can answer
/// batches of membership queries about the target language.
///
/// The learner only ever holds a shared borrow, so stateful oracles (caches,
/// counters, remote connections) use interior mutability.
pub trait MembershipOracle<S: Symbol, D> {
    /// Answers every query in the batch by calling [`Query::answer`] on it.
    /// Returning an error must leave the queries meaningless; the learner
    /// discards the whole batch in that case.
    fn process(&self, queries: &mut [Query<S, D>]) -> Result<(), OracleError>;
}

impl<S: Symbol, D, O: MembershipOracle<S, D> + ?Sized> MembershipOracle<S, D> for &O {
    fn process(&self, queries: &mut [Query<S, D>]) -> Result<(), OracleError> {
        O::process(self, queries)
    }
}

/// A word on which the current hypothesis and the target language disagree,
/// together with the output the target language assigns to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Counterexample<S: Symbol, D> {
    /// The disagreeing word.
    pub word: Word<S>,
    /// The target language's output on the word.
    pub output: D,
}

impl<S: Symbol, D> Counterexample<S, D> {
    /// Creates a counterexample from a word and its true output.
    pub fn new(word: Word<S>, output: D) -> Self {
        Self { word, output }
    }
}

/// An oracle backed by a target [`Dfa`]. Membership queries run the word
/// through the target; equivalence queries search for a separating word
/// between the hypothesis and the target.
#[derive(Clone, Debug)]
pub struct DfaOracle<A: Alphabet> {
    target: Dfa<A>,
}

impl<A: Alphabet> DfaOracle<A> {
    /// Creates an oracle answering for the language of the given automaton.
    pub fn new(target: Dfa<A>) -> Self {
        Self { target }
    }

    /// The alphabet of the target automaton.
    pub fn alphabet(&self) -> &A {
        self.target.alphabet()
    }

    /// The target automaton itself.
    pub fn target(&self) -> &Dfa<A> {
        &self.target
    }

    /// Confirms the hypothesis or produces a counterexample on which target
    /// and hypothesis disagree, classified by the target.
    pub fn equivalence(&self, hypothesis: &Dfa<A>) -> Result<(), Counterexample<A::Symbol, bool>> {
        match self.target.separating_word(hypothesis) {
            None => Ok(()),
            Some(word) => {
                let output = self.target.accepts(&word);
                Err(Counterexample::new(word, output))
            }
        }
    }
}

impl<A: Alphabet> MembershipOracle<A::Symbol, bool> for DfaOracle<A> {
    fn process(&self, queries: &mut [Query<A::Symbol, bool>]) -> Result<(), OracleError> {
        for query in queries.iter_mut() {
            let accepted = self.target.accepts(&query.word());
            query.answer(accepted);
        }
        Ok(())
    }
}

/// An oracle answering membership from a predicate on words. Useful when
/// the target language is easier to state than to give as an automaton.
#[derive(Clone, Debug)]
pub struct FnOracle<F>(F);

impl<F> FnOracle<F> {
    /// Creates an oracle from the given predicate.
    pub fn new(predicate: F) -> Self {
        Self(predicate)
    }
}

impl<S: Symbol, F: Fn(&Word<S>) -> bool> MembershipOracle<S, bool> for FnOracle<F> {
    fn process(&self, queries: &mut [Query<S, bool>]) -> Result<(), OracleError> {
        for query in queries.iter_mut() {
            let output = (self.0)(&query.word());
            query.answer(output);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dfa::DfaState;
    use lstar_core::CharAlphabet;

    fn only_epsilon() -> Dfa<CharAlphabet> {
        Dfa::from_parts(
            CharAlphabet::of_size(1),
            0,
            vec![
                DfaState::new(true, vec![1]),
                DfaState::new(false, vec![1]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn dfa_oracle_answers_batches() {
        let oracle = DfaOracle::new(only_epsilon());
        let mut queries = vec![
            Query::new(Word::epsilon(), Word::epsilon()),
            Query::new(Word::letter('a'), Word::epsilon()),
            Query::new(Word::letter('a'), Word::letter('a')),
        ];
        oracle.process(&mut queries).unwrap();
        let outputs: Vec<_> = queries.iter().map(|q| *q.output().unwrap()).collect();
        assert_eq!(outputs, vec![true, false, false]);
    }

    #[test]
    fn equivalence_classifies_by_the_target() {
        let oracle = DfaOracle::new(only_epsilon());
        let everything = Dfa::from_parts(
            CharAlphabet::of_size(1),
            0,
            vec![DfaState::new(true, vec![0])],
        )
        .unwrap();
        let counterexample = oracle.equivalence(&everything).unwrap_err();
        assert_eq!(counterexample.word, Word::letter('a'));
        assert!(!counterexample.output);
        assert!(oracle.equivalence(&only_epsilon()).is_ok());
    }

    #[test]
    fn fn_oracle_answers_from_the_predicate() {
        let oracle = FnOracle::new(|word: &Word<char>| word.len() % 2 == 0);
        let mut queries = vec![
            Query::new(Word::epsilon(), Word::epsilon()),
            Query::new(Word::letter('a'), Word::letter('b')),
            Query::new(Word::letter('a'), Word::epsilon()),
        ];
        oracle.process(&mut queries).unwrap();
        let outputs: Vec<_> = queries.iter().map(|q| *q.output().unwrap()).collect();
        assert_eq!(outputs, vec![true, true, false]);
    }
}
