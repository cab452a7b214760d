//! The pika driver loop.
//!
//! Pika parsing inverts packrat parsing: instead of recursing top-down from
//! the start rule, it sweeps the input right to left and, at each position,
//! seeds the terminals and propagates newly found matches bottom-up to the
//! clauses that depend on them (their *seed parents*). A binary heap keyed
//! on topological clause index keeps the propagation bottom-up, so when a
//! clause is evaluated every sub-clause has already settled at the current
//! position, and every position further right has been fully processed.
//! This is what makes left recursion unproblematic and keeps the memo table
//! meaningful for inputs the grammar only partially matches.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

use crate::grammar::Grammar;
use crate::memo::{Match, MemoKey, MemoTable};

/// Per-parse options.
///
/// One value per [`parse_with`](Grammar::parse_with) call; there is no
/// process-global parser state.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    /// Emit [`ParseEvent`]s to the supplied handler while parsing.
    pub trace_events: bool,
}

/// Counters collected while a memo table is filled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ParseMetrics {
    /// Candidate matches produced by clause evaluation.
    pub matches_created: usize,
    /// Candidates stored as the new best match for their key.
    pub matches_memoized: usize,
    /// Wall-clock time of the parse.
    pub parse_time: Duration,
}

/// A step of the driver loop, for debugging and tracing.
#[derive(Debug, Clone, Copy)]
pub enum ParseEvent {
    /// The sweep moved to a new start position.
    PositionStarted { start: usize },
    /// A clause was dequeued and evaluated at a position.
    ClauseEvaluated { key: MemoKey, matched: bool },
    /// The evaluation improved the memo entry for its key.
    MatchImproved { key: MemoKey, len: usize },
}

/// Receives [`ParseEvent`]s when [`ParseOptions::trace_events`] is set.
pub trait ParseEventHandler {
    fn handle(&mut self, event: ParseEvent);
}

/// Discards every event.
pub struct NullEventHandler;

impl ParseEventHandler for NullEventHandler {
    fn handle(&mut self, _event: ParseEvent) {}
}

/// Run the pika loop over `input` and return the filled memo table.
pub(crate) fn parse<'g>(
    grammar: &'g Grammar,
    input: &str,
    options: &ParseOptions,
    handler: &mut dyn ParseEventHandler,
) -> MemoTable<'g> {
    let started = Instant::now();
    let mut table = MemoTable::new(grammar, input);
    let mut queue: BinaryHeap<Reverse<u32>> = BinaryHeap::new();

    for start in (0..table.num_chars()).rev() {
        if options.trace_events {
            handler.handle(ParseEvent::PositionStarted { start });
        }
        // Terminals are the leaves of every match at this position; Nothing
        // is left out because its zero-width match is synthesized on demand.
        for &terminal in grammar.seed_terminals() {
            queue.push(Reverse(grammar.clause(terminal).idx));
        }
        while let Some(Reverse(topo_index)) = queue.pop() {
            let clause_id = grammar.clause_at(topo_index as usize);
            let key = MemoKey::new(clause_id, start);
            let candidate = grammar.clause(clause_id).try_match(&table, key);
            let matched = candidate.is_some();
            let len = candidate.as_ref().map(Match::len);
            let updated = table.add_match(key, candidate, &mut queue);
            if options.trace_events {
                handler.handle(ParseEvent::ClauseEvaluated { key, matched });
                if updated && let Some(len) = len {
                    handler.handle(ParseEvent::MatchImproved { key, len });
                }
            }
        }
    }

    table.metrics_mut().parse_time = started.elapsed();
    table
}
