use std::fmt;
use std::ops::{Index, IndexMut};

use compact_str::CompactString;
use smallvec::{SmallVec, smallvec};

use crate::grammar::CharSet;
use crate::memo::{Match, MemoKey, MemoTable};

/// Index of a clause in its grammar's arena.
///
/// The clause DAG is represented as an arena of records addressed by these
/// IDs; parent→child edges are IDs, so shared sub-clauses and (transient,
/// pre-resolution) rule-reference cycles never need shared mutable ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClauseId(pub(crate) u32);

impl ClauseId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// A sub-clause edge: the child clause plus the optional AST label attached
/// to the edge. Labels live on edges because the child may be shared between
/// differently labeled call sites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledClause {
    pub label: Option<CompactString>,
    pub clause: ClauseId,
}

/// The operator a clause applies to its sub-clauses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClauseKind {
    /// Match one character from a set.
    Char(CharSet),
    /// Match a literal string.
    CharSeq {
        text: CompactString,
        ignore_case: bool,
    },
    /// Zero-width match at input position 0.
    Start,
    /// Zero-width match anywhere.
    Nothing,
    /// Ordered concatenation of two or more sub-clauses.
    Seq,
    /// Ordered choice between two or more sub-clauses.
    First,
    /// One or more repetitions of the single sub-clause, memoized in
    /// right-recursive `[head, tail]` form.
    OneOrMore,
    /// Zero-width positive lookahead.
    FollowedBy,
    /// Zero-width negative lookahead. Matched top-down during memo lookups
    /// rather than seeded bottom-up, since its success is the *absence* of a
    /// sub-clause match.
    NotFollowedBy,
    /// A by-name rule reference. Only present while the grammar is being
    /// built; resolution replaces every reachable reference with the named
    /// rule's top-level clause.
    RuleRef(CompactString),
}

impl ClauseKind {
    /// Terminals read the input directly instead of the memo table.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Char(_) | Self::CharSeq { .. } | Self::Start | Self::Nothing
        )
    }
}

/// One node of the frozen clause DAG.
#[derive(Debug, Clone)]
pub struct Clause {
    pub(crate) kind: ClauseKind,
    pub(crate) subs: SmallVec<[LabeledClause; 2]>,
    /// Canonical textual form, computed when the clause is interned and
    /// frozen from then on. Rule references resolved later therefore keep
    /// rendering as the referenced rule's name.
    pub(crate) canonical: Box<str>,
    pub(crate) can_match_zero: bool,
    pub(crate) seed_parents: SmallVec<[ClauseId; 4]>,
    /// Position in the grammar's topological order; doubles as the priority
    /// of this clause in the parse queue.
    pub(crate) idx: u32,
    /// Names of the rules whose top-level clause this is, for diagnostics.
    pub(crate) rule_names: SmallVec<[CompactString; 1]>,
}

impl Clause {
    pub(crate) fn new(kind: ClauseKind, subs: SmallVec<[LabeledClause; 2]>, canonical: String) -> Self {
        Self {
            kind,
            subs,
            canonical: canonical.into_boxed_str(),
            can_match_zero: false,
            seed_parents: SmallVec::new(),
            idx: u32::MAX,
            rule_names: SmallVec::new(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> &ClauseKind {
        &self.kind
    }

    #[must_use]
    pub fn sub_clauses(&self) -> &[LabeledClause] {
        &self.subs
    }

    /// Canonical textual form, also the interning key.
    #[must_use]
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// Whether this clause can match the empty string at some position.
    /// Computed bottom-up during grammar construction.
    #[must_use]
    pub const fn can_match_zero(&self) -> bool {
        self.can_match_zero
    }

    /// Clauses to re-examine when this clause newly matches at a position.
    #[must_use]
    pub fn seed_parents(&self) -> &[ClauseId] {
        &self.seed_parents
    }

    /// Position in the grammar's topological order (sub-clauses first).
    #[must_use]
    pub fn index(&self) -> usize {
        self.idx as usize
    }

    /// Names of the rules this clause is the top-level clause of.
    pub fn rule_names(&self) -> impl Iterator<Item = &str> {
        self.rule_names.iter().map(CompactString::as_str)
    }

    /// Try to match this clause at `key.start`, reading sub-clause results
    /// from the memo table only. Never mutates the table; terminals read the
    /// input characters directly.
    pub(crate) fn try_match(&self, table: &MemoTable<'_>, key: MemoKey) -> Option<Match> {
        let chars = table.chars();
        let start = key.start;
        match &self.kind {
            ClauseKind::Char(set) => {
                let c = *chars.get(start)?;
                set.contains(c).then(|| Match::terminal(key, 1))
            }
            ClauseKind::CharSeq { text, ignore_case } => {
                let mut len = 0;
                for expected in text.chars() {
                    let actual = *chars.get(start + len)?;
                    if !chars_eq(expected, actual, *ignore_case) {
                        return None;
                    }
                    len += 1;
                }
                Some(Match::terminal(key, len))
            }
            ClauseKind::Start => (start == 0).then(|| Match::terminal(key, 0)),
            ClauseKind::Nothing => Some(Match::terminal(key, 0)),
            ClauseKind::Seq => {
                let mut subs = SmallVec::with_capacity(self.subs.len());
                let mut pos = start;
                for edge in &self.subs {
                    let m = table.lookup_best_match(MemoKey {
                        clause: edge.clause,
                        start: pos,
                    })?;
                    pos += m.len();
                    subs.push(m);
                }
                Some(Match::new(key, pos - start, 0, subs))
            }
            ClauseKind::First => {
                for (alt, edge) in self.subs.iter().enumerate() {
                    let sub = table.lookup_best_match(MemoKey {
                        clause: edge.clause,
                        start,
                    });
                    if let Some(m) = sub {
                        let len = m.len();
                        return Some(Match::new(key, len, alt, smallvec![m]));
                    }
                }
                None
            }
            ClauseKind::OneOrMore => {
                let head = table.lookup_best_match(MemoKey {
                    clause: self.subs[0].clause,
                    start,
                })?;
                // The tail is this same clause one head further right; the
                // right-to-left sweep guarantees it is already memoized.
                let tail = table.lookup_best_match(MemoKey {
                    clause: key.clause,
                    start: start + head.len(),
                });
                Some(match tail {
                    Some(tail) => {
                        let len = head.len() + tail.len();
                        Match::new(key, len, 0, smallvec![head, tail])
                    }
                    None => {
                        let len = head.len();
                        Match::new(key, len, 0, smallvec![head])
                    }
                })
            }
            ClauseKind::FollowedBy => {
                let sub = table.lookup_best_match(MemoKey {
                    clause: self.subs[0].clause,
                    start,
                });
                sub.map(|_| Match::terminal(key, 0))
            }
            ClauseKind::NotFollowedBy => {
                let sub = table.lookup_best_match(MemoKey {
                    clause: self.subs[0].clause,
                    start,
                });
                match sub {
                    Some(_) => None,
                    None => Some(Match::terminal(key, 0)),
                }
            }
            // Resolved away during construction; nothing a reference could
            // match on its own.
            ClauseKind::RuleRef(_) => None,
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

fn chars_eq(a: char, b: char, ignore_case: bool) -> bool {
    a == b || (ignore_case && a.to_lowercase().eq(b.to_lowercase()))
}

/// Operator precedence for canonical rendering; higher binds tighter.
const fn render_precedence(kind: &ClauseKind) -> u8 {
    match kind {
        ClauseKind::Char(_)
        | ClauseKind::CharSeq { .. }
        | ClauseKind::Start
        | ClauseKind::Nothing
        | ClauseKind::RuleRef(_) => 4,
        ClauseKind::OneOrMore | ClauseKind::FollowedBy | ClauseKind::NotFollowedBy => 3,
        ClauseKind::Seq => 2,
        ClauseKind::First => 1,
    }
}

/// A label binds tighter than sequences and choices, so labeled children at
/// or below this precedence need parentheses.
const LABEL_PRECEDENCE: u8 = 2;

fn push_quoted(out: &mut String, text: &str) {
    out.push('\'');
    for c in text.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{{{:x}}}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('\'');
}

fn render_edge(out: &mut String, edge: &LabeledClause, parent_prec: u8, arena: &ClauseArena) {
    let child = &arena[edge.clause];
    let child_prec = render_precedence(&child.kind);
    match &edge.label {
        Some(label) => {
            // A label under a tighter-binding parent is parenthesized as a
            // whole, so `(x:[a])+` (label per repetition element) never reads
            // the same as `x:[a]+` (label on the repetition).
            let parens_outside = parent_prec > LABEL_PRECEDENCE;
            if parens_outside {
                out.push('(');
            }
            out.push_str(label);
            out.push(':');
            if child_prec <= LABEL_PRECEDENCE {
                out.push('(');
                out.push_str(&child.canonical);
                out.push(')');
            } else {
                out.push_str(&child.canonical);
            }
            if parens_outside {
                out.push(')');
            }
        }
        None => {
            if child_prec <= parent_prec {
                out.push('(');
                out.push_str(&child.canonical);
                out.push(')');
            } else {
                out.push_str(&child.canonical);
            }
        }
    }
}

/// Render the canonical form of a clause from its kind and (already interned)
/// sub-clause edges. Called once per clause at interning time; the result is
/// frozen into the arena entry.
pub(crate) fn render(kind: &ClauseKind, subs: &[LabeledClause], arena: &ClauseArena) -> String {
    let prec = render_precedence(kind);
    let mut out = String::new();
    match kind {
        ClauseKind::Char(set) => out.push_str(&set.to_string()),
        ClauseKind::CharSeq { text, ignore_case } => {
            if *ignore_case {
                out.push('^');
            }
            push_quoted(&mut out, text);
        }
        ClauseKind::Start => out.push('^'),
        ClauseKind::Nothing => out.push_str("()"),
        ClauseKind::RuleRef(name) => out.push_str(name),
        ClauseKind::Seq => {
            for (i, edge) in subs.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                render_edge(&mut out, edge, prec, arena);
            }
        }
        ClauseKind::First => {
            for (i, edge) in subs.iter().enumerate() {
                if i > 0 {
                    out.push_str(" / ");
                }
                render_edge(&mut out, edge, prec, arena);
            }
        }
        ClauseKind::OneOrMore => {
            render_edge(&mut out, &subs[0], prec, arena);
            out.push('+');
        }
        ClauseKind::FollowedBy => {
            out.push('&');
            render_edge(&mut out, &subs[0], prec, arena);
        }
        ClauseKind::NotFollowedBy => {
            out.push('!');
            render_edge(&mut out, &subs[0], prec, arena);
        }
    }
    out
}

/// The clause storage behind a grammar: mutable while the builder runs,
/// frozen once the grammar is returned.
#[derive(Debug, Default)]
pub(crate) struct ClauseArena {
    clauses: Vec<Clause>,
}

impl ClauseArena {
    pub(crate) fn alloc(&mut self, clause: Clause) -> ClauseId {
        let id = ClauseId(u32::try_from(self.clauses.len()).expect("clause arena overflow"));
        self.clauses.push(clause);
        id
    }
}

impl Index<ClauseId> for ClauseArena {
    type Output = Clause;

    fn index(&self, id: ClauseId) -> &Clause {
        &self.clauses[id.index()]
    }
}

impl IndexMut<ClauseId> for ClauseArena {
    fn index_mut(&mut self, id: ClauseId) -> &mut Clause {
        &mut self.clauses[id.index()]
    }
}
