use std::fmt::{Debug, Display};

use itertools::Itertools;
use lstar_core::math::{OrderedMap, OrderedSet};
use lstar_core::{Alphabet, Symbol, Word};
use tabled::builder::Builder;
use tabled::settings::Style;
use thiserror::Error;

/// The outputs stored in the cells of an observation table. For learning
/// deterministic finite automata this is `bool`, but the table itself only
/// needs values that can be compared and hashed.
pub trait Output: Clone + Eq + std::hash::Hash + Debug {}
impl<D: Clone + Eq + std::hash::Hash + Debug> Output for D {}

/// Errors raised by structural misuse of an [`ObservationTable`]. These
/// indicate a broken caller, not a recoverable condition.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    /// The word is neither a short nor a long prefix of the table.
    #[error("{0} is not a prefix of the table")]
    UnknownPrefix(String),
    /// The word is not a column label of the table.
    #[error("{0} is not a suffix of the table")]
    UnknownSuffix(String),
    /// The word already belongs to the opposite prefix region.
    #[error("{0} already belongs to the opposite prefix region")]
    RegionConflict(String),
    /// The word is not a long prefix, so it cannot be promoted.
    #[error("{0} is not a long prefix")]
    NotALongPrefix(String),
    /// A cell was read before it has been filled.
    #[error("the cell ({0}, {1}) has not been filled")]
    MissingCell(String, String),
}

/// The row signature of a prefix, i.e. the tuple of its cell values in the
/// deterministic order of the suffix set. Two prefixes with equal signatures
/// are apparently equivalent and collapse into one hypothesis state.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct RowSignature<D: Output>(Vec<D>);

impl<D: Output> RowSignature<D> {
    /// The cell values in suffix order.
    pub fn outputs(&self) -> &[D] {
        &self.0
    }

    /// The value of the ε column. Since the suffix set is seeded with ε and
    /// suffixes are only ever appended, this is always the first entry.
    pub fn accept(&self) -> &D {
        self.0
            .first()
            .expect("the suffix set always contains ε, so no signature is empty")
    }
}

/// Witness of a consistency defect: two short prefixes with equal row
/// signatures whose one-symbol extensions by `symbol` disagree on `suffix`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Inconsistency<S: Symbol> {
    /// The first of the two short prefixes with coinciding rows.
    pub left: Word<S>,
    /// The second of the two short prefixes with coinciding rows.
    pub right: Word<S>,
    /// The symbol on which the extensions of the two prefixes disagree.
    pub symbol: S,
    /// The suffix distinguishing the extended rows.
    pub suffix: Word<S>,
}

impl<S: Symbol> Inconsistency<S> {
    /// The suffix that, once added to the table, separates the two rows.
    pub fn witness(&self) -> Word<S> {
        Word::letter(self.symbol.clone()).concat(&self.suffix)
    }
}

/// An observation table mapping prefixes and suffixes to membership outputs.
///
/// Prefixes are split into two regions. The short prefixes are candidate
/// states of the hypothesis and the long prefixes are their one-symbol
/// extensions, from which transitions are inferred. Suffixes are the
/// distinguishing experiments that make up the columns. All three regions
/// iterate in insertion order, every structural mutation preserves that
/// order, and cells are never deleted.
#[derive(Clone, Debug)]
pub struct ObservationTable<S: Symbol, D: Output> {
    short: OrderedSet<Word<S>>,
    long: OrderedSet<Word<S>>,
    suffixes: OrderedSet<Word<S>>,
    rows: OrderedMap<Word<S>, Vec<Option<D>>>,
}

impl<S: Symbol, D: Output> ObservationTable<S, D> {
    /// Creates the initial table for the given alphabet: ε is the only short
    /// prefix and the only suffix, and every alphabet symbol is a long
    /// prefix. No cells are filled yet.
    pub fn for_alphabet<A: Alphabet<Symbol = S>>(alphabet: &A) -> Self {
        let mut table = Self {
            short: OrderedSet::default(),
            long: OrderedSet::default(),
            suffixes: OrderedSet::default(),
            rows: OrderedMap::default(),
        };
        table.suffixes.insert(Word::epsilon());
        table.short.insert(Word::epsilon());
        table.rows.insert(Word::epsilon(), vec![None]);
        for sym in alphabet.symbols() {
            let prefix = Word::letter(sym.clone());
            table.long.insert(prefix.clone());
            table.rows.insert(prefix, vec![None]);
        }
        table
    }

    /// The short prefixes in insertion order.
    pub fn short_prefixes(&self) -> impl Iterator<Item = &Word<S>> {
        self.short.iter()
    }

    /// The long prefixes in insertion order.
    pub fn long_prefixes(&self) -> impl Iterator<Item = &Word<S>> {
        self.long.iter()
    }

    /// The suffixes in insertion order, starting with ε.
    pub fn suffixes(&self) -> impl Iterator<Item = &Word<S>> {
        self.suffixes.iter()
    }

    /// Whether the word is a short prefix.
    pub fn is_short(&self, prefix: &Word<S>) -> bool {
        self.short.contains(prefix)
    }

    /// Whether the word is a long prefix.
    pub fn is_long(&self, prefix: &Word<S>) -> bool {
        self.long.contains(prefix)
    }

    /// Whether the word labels a row of the table, in either region.
    pub fn contains(&self, prefix: &Word<S>) -> bool {
        self.is_short(prefix) || self.is_long(prefix)
    }

    fn blank_row(&self) -> Vec<Option<D>> {
        vec![None; self.suffixes.len()]
    }

    /// Inserts a short prefix. A no-op if the word already is one, an error
    /// if it currently sits in the long region.
    pub fn add_short_prefix(&mut self, prefix: Word<S>) -> Result<bool, TableError> {
        if self.short.contains(&prefix) {
            return Ok(false);
        }
        if self.long.contains(&prefix) {
            return Err(TableError::RegionConflict(format!("{prefix:?}")));
        }
        self.rows.insert(prefix.clone(), self.blank_row());
        self.short.insert(prefix);
        Ok(true)
    }

    /// Inserts a long prefix. A no-op if the word already is one, an error
    /// if it currently sits in the short region.
    pub fn add_long_prefix(&mut self, prefix: Word<S>) -> Result<bool, TableError> {
        if self.long.contains(&prefix) {
            return Ok(false);
        }
        if self.short.contains(&prefix) {
            return Err(TableError::RegionConflict(format!("{prefix:?}")));
        }
        self.rows.insert(prefix.clone(), self.blank_row());
        self.long.insert(prefix);
        Ok(true)
    }

    /// Appends a suffix column. A no-op if the suffix is already present.
    /// The new column starts out unfilled for every row.
    pub fn add_suffix(&mut self, suffix: Word<S>) -> bool {
        if self.suffixes.contains(&suffix) {
            return false;
        }
        self.suffixes.insert(suffix);
        for values in self.rows.values_mut() {
            values.push(None);
        }
        true
    }

    /// Installs the output for the cell of the given prefix and suffix.
    pub fn record(&mut self, prefix: &Word<S>, suffix: &Word<S>, output: D) -> Result<(), TableError> {
        let column = self
            .suffixes
            .get_index_of(suffix)
            .ok_or_else(|| TableError::UnknownSuffix(format!("{suffix:?}")))?;
        let values = self
            .rows
            .get_mut(prefix)
            .ok_or_else(|| TableError::UnknownPrefix(format!("{prefix:?}")))?;
        values[column] = Some(output);
        Ok(())
    }

    /// Returns the output stored in the cell of the given prefix and suffix,
    /// or `None` if the cell is unknown or unfilled.
    pub fn cell(&self, prefix: &Word<S>, suffix: &Word<S>) -> Option<&D> {
        let column = self.suffixes.get_index_of(suffix)?;
        self.rows.get(prefix)?.get(column)?.as_ref()
    }

    /// Enumerates the unfilled cells as (prefix, suffix) pairs, short region
    /// first, each region in insertion order and suffixes in column order.
    /// Each undefined cell appears exactly once, so the result doubles as a
    /// duplicate-free batch of membership queries.
    pub fn missing_cells(&self) -> Vec<(Word<S>, Word<S>)> {
        let mut missing = Vec::new();
        for prefix in self.short.iter().chain(self.long.iter()) {
            let values = self
                .rows
                .get(prefix)
                .expect("every prefix in a region owns a value vector");
            for (column, value) in values.iter().enumerate() {
                if value.is_none() {
                    let suffix = self
                        .suffixes
                        .get_index(column)
                        .expect("value vectors are aligned with the suffix set");
                    missing.push((prefix.clone(), suffix.clone()));
                }
            }
        }
        missing
    }

    /// Whether every cell of the table has been filled.
    pub fn is_total(&self) -> bool {
        self.rows.values().all(|values| values.iter().all(Option::is_some))
    }

    /// The row signature of the given prefix. Fails if the word labels no
    /// row or if one of its cells has not been filled.
    pub fn signature(&self, prefix: &Word<S>) -> Result<RowSignature<D>, TableError> {
        let values = self
            .rows
            .get(prefix)
            .ok_or_else(|| TableError::UnknownPrefix(format!("{prefix:?}")))?;
        let mut outputs = Vec::with_capacity(values.len());
        for (column, value) in values.iter().enumerate() {
            match value {
                Some(output) => outputs.push(output.clone()),
                None => {
                    let suffix = self
                        .suffixes
                        .get_index(column)
                        .expect("value vectors are aligned with the suffix set");
                    return Err(TableError::MissingCell(
                        format!("{prefix:?}"),
                        format!("{suffix:?}"),
                    ));
                }
            }
        }
        Ok(RowSignature(outputs))
    }

    /// Iterates over the short prefixes together with their signatures, in
    /// insertion order. The table must be filled completely.
    pub fn short_rows(&self) -> impl Iterator<Item = (&Word<S>, RowSignature<D>)> {
        self.short.iter().map(|prefix| {
            (
                prefix,
                self.signature(prefix)
                    .expect("all cells must be filled before rows are iterated"),
            )
        })
    }

    /// Finds the first long prefix, in insertion order, whose signature does
    /// not occur among the short-prefix rows. The table must be filled.
    pub fn find_unclosed(&self) -> Option<&Word<S>> {
        let short_signatures: OrderedSet<RowSignature<D>> =
            self.short_rows().map(|(_, signature)| signature).collect();
        self.long.iter().find(|prefix| {
            let signature = self
                .signature(prefix)
                .expect("all cells must be filled before the closedness check");
            !short_signatures.contains(&signature)
        })
    }

    /// Whether every long-prefix row signature equals some short-prefix row
    /// signature.
    pub fn is_closed(&self) -> bool {
        self.find_unclosed().is_none()
    }

    /// Promotes a long prefix into the short region. The relative order of
    /// the remaining long prefixes is preserved and the promoted word is
    /// appended to the short region.
    pub fn move_long_to_short(&mut self, prefix: &Word<S>) -> Result<(), TableError> {
        if !self.long.shift_remove(prefix) {
            return Err(TableError::NotALongPrefix(format!("{prefix:?}")));
        }
        self.short.insert(prefix.clone());
        Ok(())
    }

    /// Drops every long prefix that also appears in the short region.
    pub fn remove_short_prefixes_from_long(&mut self) {
        let short = &self.short;
        self.long.retain(|prefix| !short.contains(prefix));
    }

    /// Finds two short prefixes with coinciding rows whose one-symbol
    /// extensions disagree, together with the symbol and the first suffix,
    /// in column order, on which they do. The table must be filled and the
    /// extensions of all short prefixes must label rows.
    pub fn find_inconsistency<A: Alphabet<Symbol = S>>(
        &self,
        alphabet: &A,
    ) -> Option<Inconsistency<S>> {
        for (left, right) in self.short.iter().tuple_combinations() {
            let left_row = self
                .signature(left)
                .expect("all cells must be filled before the consistency check");
            let right_row = self
                .signature(right)
                .expect("all cells must be filled before the consistency check");
            if left_row != right_row {
                continue;
            }
            for sym in alphabet.symbols() {
                let left_ext = self
                    .signature(&left.append(sym.clone()))
                    .expect("one-symbol extensions of short prefixes label rows of the table");
                let right_ext = self
                    .signature(&right.append(sym.clone()))
                    .expect("one-symbol extensions of short prefixes label rows of the table");
                if left_ext == right_ext {
                    continue;
                }
                let column = left_ext
                    .outputs()
                    .iter()
                    .zip(right_ext.outputs())
                    .position(|(l, r)| l != r)
                    .expect("unequal signatures differ in some column");
                let suffix = self
                    .suffixes
                    .get_index(column)
                    .expect("signatures are aligned with the suffix set")
                    .clone();
                return Some(Inconsistency {
                    left: left.clone(),
                    right: right.clone(),
                    symbol: sym.clone(),
                    suffix,
                });
            }
        }
        None
    }

    /// Whether short prefixes with equal rows extend to equal rows for every
    /// alphabet symbol.
    pub fn is_consistent_with<A: Alphabet<Symbol = S>>(&self, alphabet: &A) -> bool {
        self.find_inconsistency(alphabet).is_none()
    }
}

impl<S: Symbol + Display, D: Output> ObservationTable<S, D> {
    /// Renders the table with the default cell formatting.
    pub fn render(&self) -> String
    where
        D: Display,
    {
        self.render_with(|output| output.to_string())
    }

    /// Renders the table with a caller-supplied cell formatting: a header
    /// row of suffixes, the block of short-prefix rows, a separator and the
    /// block of long-prefix rows. Unfilled cells show up as `?`.
    pub fn render_with(&self, mut fmt: impl FnMut(&D) -> String) -> String {
        let mut builder = Builder::default();
        let mut header = vec![String::new()];
        header.extend(self.suffixes.iter().map(|suffix| suffix.to_string()));
        builder.push_record(header);
        for prefix in self.short.iter() {
            builder.push_record(self.rendered_row(prefix, &mut fmt));
        }
        builder.push_record(vec!["·".to_string(); self.suffixes.len() + 1]);
        for prefix in self.long.iter() {
            builder.push_record(self.rendered_row(prefix, &mut fmt));
        }
        let mut table = builder.build();
        table.with(Style::modern());
        table.to_string()
    }

    fn rendered_row(&self, prefix: &Word<S>, fmt: &mut impl FnMut(&D) -> String) -> Vec<String> {
        let values = self
            .rows
            .get(prefix)
            .expect("every prefix in a region owns a value vector");
        let mut record = vec![prefix.to_string()];
        record.extend(
            values
                .iter()
                .map(|value| value.as_ref().map_or_else(|| "?".to_string(), &mut *fmt)),
        );
        record
    }
}
