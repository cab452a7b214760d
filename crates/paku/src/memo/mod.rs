//! The memoization table and its match values.
//!
//! The pika algorithm is dynamic programming over `(clause, start position)`
//! keys: the table stores the best known [`Match`] per key, and
//! [`MemoTable::lookup_best_match`] layers the policies that keep the table
//! sparse — top-down evaluation of negative lookaheads and on-demand
//! synthesis of zero-width matches for clauses that can match the empty
//! string.

mod queries;
mod table;

pub use table::MemoTable;

use std::sync::Arc;

use smallvec::SmallVec;

use crate::grammar::{ClauseId, ClauseKind, Grammar};

/// One memo-table slot: a clause at a start position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoKey {
    pub clause: ClauseId,
    pub start: usize,
}

impl MemoKey {
    #[must_use]
    pub const fn new(clause: ClauseId, start: usize) -> Self {
        Self { clause, start }
    }
}

/// A successful parse of one clause at one position.
///
/// Sub-matches are shared: an improved match for a key does not invalidate
/// older matches already referenced as sub-matches elsewhere, so the arity
/// and spans recorded here stay internally consistent.
#[derive(Debug, Clone)]
pub struct Match {
    key: MemoKey,
    len: usize,
    /// For a `First` match, the index of the alternative that matched;
    /// 0 for every other clause kind.
    alt_index: usize,
    sub_matches: SmallVec<[Arc<Match>; 2]>,
}

impl Match {
    pub(crate) fn new(
        key: MemoKey,
        len: usize,
        alt_index: usize,
        sub_matches: SmallVec<[Arc<Match>; 2]>,
    ) -> Self {
        Self {
            key,
            len,
            alt_index,
            sub_matches,
        }
    }

    /// A match that carries no sub-matches: terminals, lookaheads, and the
    /// zero-width placeholders synthesized during lookups.
    pub(crate) fn terminal(key: MemoKey, len: usize) -> Self {
        Self::new(key, len, 0, SmallVec::new())
    }

    #[must_use]
    pub const fn key(&self) -> MemoKey {
        self.key
    }

    /// Number of input characters consumed.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// One past the last consumed position.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.key.start + self.len
    }

    /// For a `First` match, which alternative matched.
    #[must_use]
    pub const fn alt_index(&self) -> usize {
        self.alt_index
    }

    /// Sub-matches in stored form. `OneOrMore` matches are right-recursive
    /// two-element `[head, tail]` chains; see
    /// [`flattened_sub_matches`](Self::flattened_sub_matches).
    #[must_use]
    pub fn sub_matches(&self) -> &[Arc<Match>] {
        &self.sub_matches
    }

    /// Sub-matches with the right-recursive `OneOrMore` encoding expanded
    /// into the maximal list of consecutive repetition matches. For every
    /// other clause kind this is just the stored sub-matches.
    #[must_use]
    pub fn flattened_sub_matches(&self, grammar: &Grammar) -> Vec<Arc<Match>> {
        if !matches!(grammar.clause(self.key.clause).kind(), ClauseKind::OneOrMore) {
            return self.sub_matches.to_vec();
        }
        let mut out = Vec::new();
        let mut current = self;
        loop {
            match current.sub_matches.as_slice() {
                [head, tail] => {
                    out.push(head.clone());
                    if tail.key.clause == self.key.clause {
                        current = tail.as_ref();
                    } else {
                        out.push(tail.clone());
                        break;
                    }
                }
                [head] => {
                    out.push(head.clone());
                    break;
                }
                // A synthesized zero-width tail carries no sub-matches.
                _ => break,
            }
        }
        out
    }

    /// The "better match" ordering for a shared memo key: a `First` match
    /// with an earlier alternative wins, otherwise a longer match wins.
    /// This is what realizes PEG's ordered choice and greedy repetition.
    #[must_use]
    pub fn is_better_than(&self, other: &Self, grammar: &Grammar) -> bool {
        debug_assert_eq!(self.key, other.key);
        let is_first = matches!(grammar.clause(self.key.clause).kind(), ClauseKind::First);
        (is_first && self.alt_index < other.alt_index) || self.len > other.len
    }

    /// Human-readable one-liner: the clause (with the rule names it tops)
    /// plus the matched span, e.g.
    /// `Statement <- var:[a-z]+ '=' E ';' : 0+23`.
    #[must_use]
    pub fn summary(&self, grammar: &Grammar) -> String {
        format!(
            "{} : {}+{}",
            grammar.clause_repr_with_rule_names(self.key.clause),
            self.key.start,
            self.len
        )
    }
}
