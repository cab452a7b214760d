use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Arc;

use hashbrown::HashMap;

use crate::grammar::{ClauseId, ClauseKind, Grammar};
use crate::memo::{Match, MemoKey};
use crate::parser::ParseMetrics;

/// The dynamic-programming table of one parse: best known match per
/// `(clause, start position)` key.
///
/// The table is deliberately sparse. Failed keys are absent; clauses that
/// can match the empty string are absent unless they matched more than
/// that, and lookups synthesize their zero-width placeholder on demand.
/// This keeps the table proportional to the number of non-empty matches
/// rather than to grammar size × input size.
pub struct MemoTable<'g> {
    grammar: &'g Grammar,
    input: String,
    chars: Vec<char>,
    entries: HashMap<MemoKey, Arc<Match>, ahash::RandomState>,
    metrics: ParseMetrics,
}

impl<'g> MemoTable<'g> {
    pub(crate) fn new(grammar: &'g Grammar, input: &str) -> Self {
        Self {
            grammar,
            input: input.to_string(),
            chars: input.chars().collect(),
            entries: HashMap::with_hasher(ahash::RandomState::new()),
            metrics: ParseMetrics::default(),
        }
    }

    #[must_use]
    pub const fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    /// The parsed input text.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Input length in characters (the unit of all positions and lengths).
    #[must_use]
    pub fn num_chars(&self) -> usize {
        self.chars.len()
    }

    pub(crate) fn chars(&self) -> &[char] {
        &self.chars
    }

    /// Counters collected while the table was filled.
    #[must_use]
    pub const fn metrics(&self) -> &ParseMetrics {
        &self.metrics
    }

    pub(crate) fn metrics_mut(&mut self) -> &mut ParseMetrics {
        &mut self.metrics
    }

    /// Number of memoized entries.
    #[must_use]
    pub fn num_entries(&self) -> usize {
        self.entries.len()
    }

    /// The best known match for `key`, honouring the lookup policies:
    ///
    /// 1. a stored match wins;
    /// 2. a `NotFollowedBy` clause is evaluated top-down on the spot, since
    ///    its success is the absence of a sub-clause match;
    /// 3. a clause that can match the empty string yields a synthesized
    ///    zero-width placeholder (never stored);
    /// 4. otherwise there is no match.
    #[must_use]
    pub fn lookup_best_match(&self, key: MemoKey) -> Option<Arc<Match>> {
        if let Some(stored) = self.entries.get(&key) {
            return Some(stored.clone());
        }
        let clause = self.grammar.clause(key.clause);
        if matches!(clause.kind(), ClauseKind::NotFollowedBy) {
            return clause.try_match(self, key).map(Arc::new);
        }
        if clause.can_match_zero() {
            return Some(Arc::new(Match::terminal(key, 0)));
        }
        None
    }

    /// [`lookup_best_match`](Self::lookup_best_match) by clause and position.
    #[must_use]
    pub fn best_match(&self, clause: ClauseId, start: usize) -> Option<Arc<Match>> {
        self.lookup_best_match(MemoKey::new(clause, start))
    }

    /// Store `candidate` if it beats the current entry for `key`, then give
    /// every seed parent of the clause a chance to react: a parent is
    /// (re-)queued when the entry improved, and also whenever the parent can
    /// match zero characters — such a parent can match at this position even
    /// though its child just failed here.
    ///
    /// Returns whether the entry was updated.
    pub(crate) fn add_match(
        &mut self,
        key: MemoKey,
        candidate: Option<Match>,
        queue: &mut BinaryHeap<Reverse<u32>>,
    ) -> bool {
        let mut updated = false;
        if let Some(new_match) = candidate {
            self.metrics.matches_created += 1;
            let better = match self.entries.get(&key) {
                None => true,
                Some(stored) => new_match.is_better_than(stored, self.grammar),
            };
            if better {
                self.entries.insert(key, Arc::new(new_match));
                self.metrics.matches_memoized += 1;
                updated = true;
            }
        }
        for &parent in self.grammar.clause(key.clause).seed_parents() {
            let parent_clause = self.grammar.clause(parent);
            if updated || parent_clause.can_match_zero() {
                queue.push(Reverse(parent_clause.idx));
            }
        }
        updated
    }

    /// Iterate over all memoized matches, in no particular order.
    pub(crate) fn entries(&self) -> impl Iterator<Item = (&MemoKey, &Arc<Match>)> {
        self.entries.iter()
    }
}
