//! # Paku
//!
//! A PEG parser engine built on the pika algorithm: bottom-up, right-to-left
//! dynamic programming over a memoization table.
//!
//! ## Overview
//!
//! Classic packrat parsers recurse top-down and choke on left recursion.
//! Pika parsing turns the evaluation order upside down: the input is swept
//! from its last character to its first, and at every position terminal
//! matches are propagated up through the grammar until nothing improves.
//! That ordering gives you:
//!
//! - **Left recursion, directly** — `E <- E '+' E / num` needs no rewriting
//!   by the grammar author (precedence groups handle associativity).
//! - **Total parsing** — a parse never fails; the memo table is always
//!   complete, so partially matching inputs still yield every match that
//!   exists, plus the spans nothing matched (syntax errors).
//! - **Shared grammars** — a built [`Grammar`] is immutable; each parse owns
//!   its [`MemoTable`].
//!
//! ## Quick start
//!
//! ```rust
//! use paku::{Expr, Grammar, Rule};
//!
//! // Expr <- '(' Expr ')' / [a-z]
//! let grammar = Grammar::new(vec![Rule::new(
//!     "Expr",
//!     Expr::first([
//!         Expr::seq([Expr::str("("), Expr::rule_ref("Expr"), Expr::str(")")]),
//!         Expr::char_range('a', 'z'),
//!     ]),
//! )])?;
//!
//! let table = grammar.parse("((x))");
//!
//! let matches = table.nonoverlapping_matches_for_rule("Expr")?;
//! assert_eq!(matches.len(), 1);
//! assert_eq!(matches[0].key().start, 0);
//! assert_eq!(matches[0].len(), 5);
//!
//! // The whole input was covered, so there are no syntax-error spans.
//! assert!(table.syntax_errors(&["Expr"])?.is_empty());
//! # Ok::<(), paku::GrammarError>(())
//! ```
//!
//! ## Modules
//!
//! - [`grammar`] — rules, the clause DAG, and the construction pipeline
//! - [`memo`] — the memoization table, match values, and the query surface
//! - [`parser`] — the driver loop, per-parse options, and parse events
//! - [`intervals`] — interval unions behind syntax-error spans
//! - [`error`] — grammar-construction errors

pub mod error;
pub mod grammar;
pub mod intervals;
pub mod memo;
pub mod parser;

pub use error::GrammarError;
pub use grammar::{
    Assoc, CharSet, Clause, ClauseId, ClauseKind, Expr, Grammar, GrammarRule, LabeledClause, Rule,
};
pub use intervals::IntervalUnion;
pub use memo::{Match, MemoKey, MemoTable};
pub use parser::{NullEventHandler, ParseEvent, ParseEventHandler, ParseMetrics, ParseOptions};
