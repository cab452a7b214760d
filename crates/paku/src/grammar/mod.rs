//! Grammar definition and construction.
//!
//! A grammar starts life as a list of [`Rule`]s whose bodies are owned
//! [`Expr`] trees, the shape a grammar front-end naturally produces.
//! [`Grammar::new`] runs the construction pipeline — precedence rewriting,
//! interning, rule-reference resolution, topological ordering, zero-width
//! analysis, and seed-parent wiring — and freezes the result into a clause
//! DAG held in an arena and addressed by [`ClauseId`]s.
//!
//! A frozen grammar is immutable and can be shared freely: every call to
//! [`Grammar::parse`] builds its own memo table against the same clause DAG.

mod builder;
mod char_set;
mod clause;
mod expr;
mod precedence;
mod rule;
mod validate;

pub use char_set::CharSet;
pub use clause::{Clause, ClauseId, ClauseKind, LabeledClause};
pub use expr::Expr;
pub use rule::{Assoc, GrammarRule, Rule};

use std::fmt;

use compact_str::CompactString;
use hashbrown::HashMap;

use crate::error::GrammarError;
use crate::grammar::clause::ClauseArena;
use crate::memo::MemoTable;
use crate::parser::{NullEventHandler, ParseEventHandler, ParseOptions};

/// A frozen PEG grammar, ready for any number of parses.
pub struct Grammar {
    pub(crate) arena: ClauseArena,
    /// All reachable clauses in topological order: terminals first, then
    /// every clause after its sub-clauses. A clause's position here is its
    /// priority in the parse queue.
    pub(crate) all_clauses: Vec<ClauseId>,
    /// Terminals seeded at every input position (`Nothing` excluded; its
    /// matches are synthesized on demand instead).
    pub(crate) seed_terminals: Vec<ClauseId>,
    pub(crate) rules: Vec<GrammarRule>,
    pub(crate) rule_index: HashMap<CompactString, usize, ahash::RandomState>,
    /// Bare precedence-group name → name of its lowest-precedence level.
    pub(crate) lowest_rule_name: HashMap<CompactString, CompactString, ahash::RandomState>,
    /// Canonical form → clause, for diagnostics and per-clause queries.
    pub(crate) canonical_index: HashMap<String, ClauseId, ahash::RandomState>,
}

impl Grammar {
    /// Build a grammar from the front-end's rule list.
    ///
    /// # Errors
    ///
    /// Returns a [`GrammarError`] when the rule list is empty or malformed;
    /// see the error type for the full catalogue. Construction is
    /// all-or-nothing.
    pub fn new(rules: Vec<Rule>) -> Result<Self, GrammarError> {
        builder::build(rules)
    }

    /// Parse `input`, producing a completed memo table.
    ///
    /// Parsing cannot fail: a grammar mismatch simply leaves the table
    /// without a top-rule match, which the query surface reports.
    #[must_use]
    pub fn parse(&self, input: &str) -> MemoTable<'_> {
        self.parse_with(input, &ParseOptions::default(), &mut NullEventHandler)
    }

    /// Parse with explicit options and an event handler for tracing.
    #[must_use]
    pub fn parse_with(
        &self,
        input: &str,
        options: &ParseOptions,
        handler: &mut dyn ParseEventHandler,
    ) -> MemoTable<'_> {
        crate::parser::parse(self, input, options, handler)
    }

    /// Look up a rule by name. Bare names of precedence groups resolve to
    /// the group's lowest-precedence level.
    ///
    /// # Errors
    ///
    /// Returns [`GrammarError::UnknownRule`] when no rule has that name.
    pub fn rule_by_name(&self, name: &str) -> Result<&GrammarRule, GrammarError> {
        let resolved = self
            .lowest_rule_name
            .get(name)
            .map_or(name, CompactString::as_str);
        self.rule_index
            .get(resolved)
            .map(|&i| &self.rules[i])
            .ok_or_else(|| GrammarError::UnknownRule {
                name: name.to_string(),
            })
    }

    /// All rules, in construction order.
    pub fn rules(&self) -> impl Iterator<Item = &GrammarRule> {
        self.rules.iter()
    }

    /// The clause record behind an ID.
    #[must_use]
    pub fn clause(&self, id: ClauseId) -> &Clause {
        &self.arena[id]
    }

    /// All reachable clauses in topological order.
    pub fn clauses(&self) -> impl Iterator<Item = ClauseId> + '_ {
        self.all_clauses.iter().copied()
    }

    /// Find a clause by its canonical form, e.g. `"[a-z]"` or `"'if'"`.
    #[must_use]
    pub fn find_clause(&self, canonical: &str) -> Option<ClauseId> {
        self.canonical_index.get(canonical).copied()
    }

    /// The clause's canonical form, prefixed with the names of the rules it
    /// is the top-level clause of: `Statement <- var:[a-z]+ '=' E ';'`.
    #[must_use]
    pub fn clause_repr_with_rule_names(&self, id: ClauseId) -> String {
        let clause = &self.arena[id];
        let names: Vec<&str> = clause.rule_names().collect();
        if names.is_empty() {
            clause.canonical().to_string()
        } else {
            format!("{} <- {}", names.join(", "), clause.canonical())
        }
    }

    pub(crate) fn seed_terminals(&self) -> &[ClauseId] {
        &self.seed_terminals
    }

    pub(crate) fn clause_at(&self, topo_index: usize) -> ClauseId {
        self.all_clauses[topo_index]
    }
}

impl fmt::Display for Grammar {
    /// Every rule on its own line, in canonical form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rule in &self.rules {
            match &rule.label {
                Some(label) => writeln!(
                    f,
                    "{} <- {}:({})",
                    rule.name,
                    label,
                    self.arena[rule.clause].canonical()
                )?,
                None => writeln!(f, "{} <- {}", rule.name, self.arena[rule.clause].canonical())?,
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grammar")
            .field("rules", &self.rules.len())
            .field("clauses", &self.all_clauses.len())
            .finish_non_exhaustive()
    }
}
