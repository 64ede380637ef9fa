use lstar_core::math::OrderedMap;
use lstar_core::{Alphabet, Word};

use crate::dfa::{Dfa, DfaState};
use crate::table::{ObservationTable, RowSignature};

/// Extracts the hypothesis automaton from an observation table.
///
/// There is one state per distinct row signature among the short prefixes,
/// with the first short prefix carrying a signature acting as the
/// representative of its class. The initial state is ε's class, a state
/// accepts iff the ε column of its signature is `true`, and the successor
/// of class `u` under `a` is the class of the row of `u·a`.
///
/// # Panics
/// The table must be filled completely, closed and prefix-closed over the
/// given alphabet; otherwise class lookup fails.
pub fn dfa_from_table<A: Alphabet>(
    alphabet: &A,
    table: &ObservationTable<A::Symbol, bool>,
) -> Dfa<A> {
    let mut classes: OrderedMap<RowSignature<bool>, Word<A::Symbol>> = OrderedMap::default();
    for (prefix, signature) in table.short_rows() {
        classes.entry(signature).or_insert_with(|| prefix.clone());
    }

    let mut states = Vec::with_capacity(classes.len());
    for (signature, representative) in &classes {
        let mut transitions = Vec::with_capacity(alphabet.size());
        for sym in alphabet.symbols() {
            let extension = table
                .signature(&representative.append(sym.clone()))
                .expect("one-symbol extensions of short prefixes label rows of the table");
            let target = classes
                .get_index_of(&extension)
                .expect("the table must be closed before a hypothesis is extracted");
            transitions.push(target);
        }
        states.push(DfaState::new(*signature.accept(), transitions));
    }

    let initial_signature = table
        .signature(&Word::epsilon())
        .expect("ε is always a short prefix with a filled row");
    let initial = classes
        .get_index_of(&initial_signature)
        .expect("ε's signature names a class");
    Dfa::from_parts(alphabet.clone(), initial, states)
        .expect("hypothesis extraction produces a total automaton")
}
