//! Grammar-construction errors.
//!
//! Parsing itself is total: [`Grammar::parse`](crate::Grammar::parse) always
//! produces a memo table, and a failed parse is observed through the query
//! surface (no match for the top rule, or non-empty syntax-error spans).
//! Everything that can actually go wrong happens while a grammar is being
//! built, and is reported through [`GrammarError`].

use thiserror::Error;

#[cfg(feature = "diagnostics")]
use miette::Diagnostic;

/// An error detected while constructing a [`Grammar`](crate::Grammar).
///
/// Construction never produces a partially built grammar: the first error
/// aborts the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum GrammarError {
    #[error("grammar contains no rules")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::empty)))]
    EmptyGrammar,

    #[error("rule `{rule}` consists only of a reference to itself")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::self_reference)))]
    SelfReferenceOnly { rule: String },

    #[error("duplicate rule `{name}` at precedence {precedence}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::duplicate_rule)))]
    DuplicateRule { name: String, precedence: i32 },

    #[error("rule `{rule}` has negative precedence {precedence}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::negative_precedence)))]
    NegativePrecedence { rule: String, precedence: i32 },

    #[error("reference to unknown rule `{name}`")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::unknown_rule)))]
    UnknownRule { name: String },

    #[error("rule references form a cycle: {}", .path.join(" -> "))]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::reference_cycle)))]
    RuleReferenceCycle { path: Vec<String> },

    #[error("`()` cannot be the first element of `{clause}`")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::nothing_first)))]
    NothingAsFirstSubClause { clause: String },

    #[error("alternative that can match zero characters must be last in `{clause}`")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::zero_width_alternative)))]
    ZeroWidthAlternativeNotLast { clause: String },

    #[error("negative lookahead of a zero-width clause can never match: `{clause}`")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::zero_width_lookahead)))]
    ZeroWidthNegativeLookahead { clause: String },
}
