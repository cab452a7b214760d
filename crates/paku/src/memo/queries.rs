//! The query surface over a completed memo table.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::GrammarError;
use crate::grammar::ClauseId;
use crate::intervals::IntervalUnion;
use crate::memo::{Match, MemoTable};

impl MemoTable<'_> {
    /// Every memoized match of `clause`, ordered by start position.
    #[must_use]
    pub fn all_matches(&self, clause: ClauseId) -> Vec<Arc<Match>> {
        let mut matches: Vec<Arc<Match>> = self
            .entries()
            .filter(|(key, _)| key.clause == clause)
            .map(|(_, m)| m.clone())
            .collect();
        matches.sort_by_key(|m| m.key().start);
        matches
    }

    /// Greedy left-to-right selection: keep a match, skip every match that
    /// starts before the kept one ends, repeat.
    #[must_use]
    pub fn nonoverlapping_matches(&self, clause: ClauseId) -> Vec<Arc<Match>> {
        let mut kept = Vec::new();
        let mut next_start = 0;
        for m in self.all_matches(clause) {
            if m.key().start >= next_start {
                next_start = m.end();
                kept.push(m);
            }
        }
        kept
    }

    /// [`all_matches`](Self::all_matches) for the named rule's top clause.
    ///
    /// # Errors
    ///
    /// Returns [`GrammarError::UnknownRule`] when no rule has that name.
    pub fn all_matches_for_rule(&self, name: &str) -> Result<Vec<Arc<Match>>, GrammarError> {
        let rule = self.grammar().rule_by_name(name)?;
        Ok(self.all_matches(rule.clause()))
    }

    /// [`nonoverlapping_matches`](Self::nonoverlapping_matches) for the
    /// named rule's top clause.
    ///
    /// # Errors
    ///
    /// Returns [`GrammarError::UnknownRule`] when no rule has that name.
    pub fn nonoverlapping_matches_for_rule(
        &self,
        name: &str,
    ) -> Result<Vec<Arc<Match>>, GrammarError> {
        let rule = self.grammar().rule_by_name(name)?;
        Ok(self.nonoverlapping_matches(rule.clause()))
    }

    /// Input spans covered by none of the named rules, as a sorted map of
    /// `start → (end, substring)`. The named rules' nonoverlapping matches
    /// are unioned and the complement within `[0, len)` is returned; an
    /// empty map means the rules covered the entire input.
    ///
    /// # Errors
    ///
    /// Returns [`GrammarError::UnknownRule`] when one of the names does not
    /// resolve.
    pub fn syntax_errors(
        &self,
        rule_names: &[&str],
    ) -> Result<BTreeMap<usize, (usize, String)>, GrammarError> {
        let mut covered = IntervalUnion::new();
        for name in rule_names {
            for m in self.nonoverlapping_matches_for_rule(name)? {
                covered.add(m.key().start, m.end());
            }
        }
        let mut errors = BTreeMap::new();
        for (start, end) in covered.invert_against(self.num_chars()).iter() {
            let text: String = self.chars()[start..end].iter().collect();
            errors.insert(start, (end, text));
        }
        Ok(errors)
    }
}
