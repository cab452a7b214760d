//! The grammar construction pipeline.
//!
//! [`build`] takes the front-end's rule list through, in order: structural
//! checks, the precedence rewrite, desugaring and interning into the clause
//! arena, rule-reference resolution, topological ordering, zero-width
//! analysis, invariant checks, and seed-parent wiring. The result is a
//! frozen [`Grammar`] that can be shared across any number of parses.

use compact_str::CompactString;
use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;

use crate::error::GrammarError;
use crate::grammar::clause::{Clause, ClauseArena, ClauseId, ClauseKind, LabeledClause, render};
use crate::grammar::{Expr, Grammar, GrammarRule, Rule, precedence, validate};

type AHashSet<T> = HashSet<T, ahash::RandomState>;

pub(crate) fn build(rules: Vec<Rule>) -> Result<Grammar, GrammarError> {
    validate::check_rules(&rules)?;
    let rewrite = precedence::rewrite_precedence_groups(rules)?;

    let mut arena = ClauseArena::default();
    let mut interner: HashMap<String, ClauseId, ahash::RandomState> =
        HashMap::with_hasher(ahash::RandomState::new());

    let mut grammar_rules = Vec::with_capacity(rewrite.rules.len());
    for rule in rewrite.rules {
        let (label, top) = intern_expr(rule.expr, &mut arena, &mut interner);
        grammar_rules.push(GrammarRule {
            name: rule.name,
            precedence: rule.precedence,
            assoc: rule.assoc,
            label,
            clause: top,
        });
    }

    let mut rule_index: HashMap<CompactString, usize, ahash::RandomState> =
        HashMap::with_hasher(ahash::RandomState::new());
    for (i, rule) in grammar_rules.iter().enumerate() {
        rule_index.insert(rule.name.clone(), i);
    }

    resolve_rule_tops(
        &mut grammar_rules,
        &rule_index,
        &rewrite.lowest_rule_name,
        &arena,
    )?;
    resolve_edges(
        &mut arena,
        &grammar_rules,
        &rule_index,
        &rewrite.lowest_rule_name,
    )?;

    for rule in &grammar_rules {
        let names = &mut arena[rule.clause].rule_names;
        if !names.contains(&rule.name) {
            names.push(rule.name.clone());
        }
    }

    // Lowest-precedence clauses become additional topological-order roots:
    // after the rewrite nothing necessarily references them by name, but
    // queries and failovers start there.
    let lowest_clauses: Vec<ClauseId> = {
        let lowest_names: AHashSet<&CompactString> = rewrite.lowest_rule_name.values().collect();
        grammar_rules
            .iter()
            .filter(|r| lowest_names.contains(&r.name))
            .map(|r| r.clause)
            .collect()
    };

    let all_clauses = topo_order(&arena, &grammar_rules, &lowest_clauses);
    for (i, &id) in all_clauses.iter().enumerate() {
        arena[id].idx = u32::try_from(i).expect("clause count overflow");
    }

    compute_zero_width(&mut arena, &all_clauses);
    validate::check_clause_invariants(&arena, &all_clauses)?;
    wire_seed_parents(&mut arena, &all_clauses);

    let seed_terminals = all_clauses
        .iter()
        .copied()
        .filter(|&id| {
            arena[id].kind.is_terminal() && !matches!(arena[id].kind, ClauseKind::Nothing)
        })
        .collect();

    let mut canonical_index: HashMap<String, ClauseId, ahash::RandomState> =
        HashMap::with_hasher(ahash::RandomState::new());
    for &id in &all_clauses {
        canonical_index
            .entry(arena[id].canonical().to_string())
            .or_insert(id);
    }

    Ok(Grammar {
        arena,
        all_clauses,
        seed_terminals,
        rules: grammar_rules,
        rule_index,
        lowest_rule_name: rewrite.lowest_rule_name,
        canonical_index,
    })
}

/// Intern `expr` into the arena, deduplicating by canonical form so the
/// grammar becomes a DAG and every distinct clause is matched at most once
/// per input position. Returns the AST label that should sit on the edge to
/// the interned clause, if the expression carried one.
fn intern_expr(
    expr: Expr,
    arena: &mut ClauseArena,
    interner: &mut HashMap<String, ClauseId, ahash::RandomState>,
) -> (Option<CompactString>, ClauseId) {
    match expr {
        Expr::Label { name, expr } => {
            let (_, id) = intern_expr(*expr, arena, interner);
            (Some(name), id)
        }
        Expr::Char(set) => (None, intern_node(ClauseKind::Char(set), vec![], arena, interner)),
        Expr::Str { text, ignore_case } => {
            let kind = if text.is_empty() {
                ClauseKind::Nothing
            } else {
                ClauseKind::CharSeq { text, ignore_case }
            };
            (None, intern_node(kind, vec![], arena, interner))
        }
        Expr::Start => (None, intern_node(ClauseKind::Start, vec![], arena, interner)),
        Expr::Nothing => (None, intern_node(ClauseKind::Nothing, vec![], arena, interner)),
        Expr::Ref(name) => (
            None,
            intern_node(ClauseKind::RuleRef(name), vec![], arena, interner),
        ),
        Expr::Seq(subs) => intern_nary(ClauseKind::Seq, subs, arena, interner),
        Expr::First(subs) => intern_nary(ClauseKind::First, subs, arena, interner),
        Expr::OneOrMore(e) => (
            None,
            intern_node(ClauseKind::OneOrMore, vec![*e], arena, interner),
        ),
        Expr::FollowedBy(e) => (
            None,
            intern_node(ClauseKind::FollowedBy, vec![*e], arena, interner),
        ),
        Expr::NotFollowedBy(e) => (
            None,
            intern_node(ClauseKind::NotFollowedBy, vec![*e], arena, interner),
        ),
        // X? and X* are sugar over ordered choice with Nothing.
        Expr::Opt(e) => (
            None,
            intern_node(ClauseKind::First, vec![*e, Expr::Nothing], arena, interner),
        ),
        Expr::ZeroOrMore(e) => (
            None,
            intern_node(
                ClauseKind::First,
                vec![Expr::OneOrMore(e), Expr::Nothing],
                arena,
                interner,
            ),
        ),
    }
}

fn intern_nary(
    kind: ClauseKind,
    mut subs: Vec<Expr>,
    arena: &mut ClauseArena,
    interner: &mut HashMap<String, ClauseId, ahash::RandomState>,
) -> (Option<CompactString>, ClauseId) {
    match subs.len() {
        0 => (None, intern_node(ClauseKind::Nothing, vec![], arena, interner)),
        1 => intern_expr(subs.pop().unwrap(), arena, interner),
        _ => (None, intern_node(kind, subs, arena, interner)),
    }
}

fn intern_node(
    kind: ClauseKind,
    children: Vec<Expr>,
    arena: &mut ClauseArena,
    interner: &mut HashMap<String, ClauseId, ahash::RandomState>,
) -> ClauseId {
    let edges: SmallVec<[LabeledClause; 2]> = children
        .into_iter()
        .map(|child| {
            let (label, clause) = intern_expr(child, arena, interner);
            LabeledClause { label, clause }
        })
        .collect();
    let canonical = render(&kind, &edges, arena);
    if let Some(&id) = interner.get(&canonical) {
        return id;
    }
    let id = arena.alloc(Clause::new(kind, edges, canonical.clone()));
    interner.insert(canonical, id);
    id
}

/// Resolve rules whose whole body is a rule reference by following the chain
/// to a non-reference clause, inheriting the first label seen along the way.
/// Chains that loop back on themselves are reported as cycles.
fn resolve_rule_tops(
    rules: &mut [GrammarRule],
    rule_index: &HashMap<CompactString, usize, ahash::RandomState>,
    lowest_rule_name: &HashMap<CompactString, CompactString, ahash::RandomState>,
    arena: &ClauseArena,
) -> Result<(), GrammarError> {
    for i in 0..rules.len() {
        let mut path: Vec<CompactString> = vec![rules[i].name.clone()];
        let mut label = rules[i].label.clone();
        let mut clause = rules[i].clause;
        while let ClauseKind::RuleRef(target) = &arena[clause].kind {
            let resolved = lowest_rule_name.get(target).unwrap_or(target);
            if path.iter().any(|n| n == resolved) {
                path.push(resolved.clone());
                return Err(GrammarError::RuleReferenceCycle {
                    path: path.iter().map(ToString::to_string).collect(),
                });
            }
            let Some(&j) = rule_index.get(resolved) else {
                return Err(GrammarError::UnknownRule {
                    name: resolved.to_string(),
                });
            };
            path.push(resolved.clone());
            if label.is_none() {
                label = rules[j].label.clone();
            }
            clause = rules[j].clause;
        }
        rules[i].label = label;
        rules[i].clause = clause;
    }
    Ok(())
}

/// Replace every reachable rule-reference edge with the referenced rule's
/// top-level clause. Unlabeled edges inherit the referenced rule's label.
fn resolve_edges(
    arena: &mut ClauseArena,
    rules: &[GrammarRule],
    rule_index: &HashMap<CompactString, usize, ahash::RandomState>,
    lowest_rule_name: &HashMap<CompactString, CompactString, ahash::RandomState>,
) -> Result<(), GrammarError> {
    let mut visited: AHashSet<ClauseId> = HashSet::with_hasher(ahash::RandomState::new());
    let mut stack: Vec<ClauseId> = rules.iter().map(|r| r.clause).collect();
    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        for si in 0..arena[id].subs.len() {
            let child = arena[id].subs[si].clause;
            let target = match &arena[child].kind {
                ClauseKind::RuleRef(t) => Some(lowest_rule_name.get(t).unwrap_or(t).clone()),
                _ => None,
            };
            if let Some(name) = target {
                let Some(&j) = rule_index.get(&name) else {
                    return Err(GrammarError::UnknownRule {
                        name: name.to_string(),
                    });
                };
                // Rule tops are already resolved, so one step suffices.
                let (top, label) = (rules[j].clause, rules[j].label.clone());
                let edge = &mut arena[id].subs[si];
                edge.clause = top;
                if edge.label.is_none() {
                    edge.label = label;
                }
            }
            stack.push(arena[id].subs[si].clause);
        }
    }
    Ok(())
}

/// Produce the order in which the driver visits clauses: every sub-clause
/// before its parents, terminals first in discovery order, then a post-order
/// DFS from the top-level clauses, the lowest-precedence clauses, and the
/// heads of any cycles that survived resolution.
fn topo_order(
    arena: &ClauseArena,
    rules: &[GrammarRule],
    lowest_clauses: &[ClauseId],
) -> Vec<ClauseId> {
    let mut reachable = Vec::new();
    let mut seen: AHashSet<ClauseId> = HashSet::with_hasher(ahash::RandomState::new());
    for rule in rules {
        discover(rule.clause, arena, &mut seen, &mut reachable);
    }

    let mut order = Vec::with_capacity(reachable.len());
    let mut placed: AHashSet<ClauseId> = HashSet::with_hasher(ahash::RandomState::new());
    for &id in &reachable {
        if arena[id].kind.is_terminal() {
            order.push(id);
            placed.insert(id);
        }
    }

    let mut is_child: AHashSet<ClauseId> = HashSet::with_hasher(ahash::RandomState::new());
    for &id in &reachable {
        for edge in &arena[id].subs {
            is_child.insert(edge.clause);
        }
    }
    let mut roots: Vec<ClauseId> = reachable
        .iter()
        .copied()
        .filter(|id| !is_child.contains(id))
        .collect();
    for &id in lowest_clauses {
        if !roots.contains(&id) {
            roots.push(id);
        }
    }

    let scan: Vec<ClauseId> = roots
        .iter()
        .copied()
        .chain(rules.iter().map(|r| r.clause))
        .collect();
    let mut discovered: AHashSet<ClauseId> = HashSet::with_hasher(ahash::RandomState::new());
    let mut finished: AHashSet<ClauseId> = HashSet::with_hasher(ahash::RandomState::new());
    let mut heads = Vec::new();
    let mut head_set: AHashSet<ClauseId> = HashSet::with_hasher(ahash::RandomState::new());
    for id in scan {
        find_cycle_heads(
            id,
            arena,
            &mut discovered,
            &mut finished,
            &mut heads,
            &mut head_set,
        );
    }
    for id in heads {
        if !roots.contains(&id) {
            roots.push(id);
        }
    }

    for root in roots {
        postorder(root, arena, &mut placed, &mut order);
    }
    order
}

fn discover(
    id: ClauseId,
    arena: &ClauseArena,
    seen: &mut AHashSet<ClauseId>,
    out: &mut Vec<ClauseId>,
) {
    if seen.insert(id) {
        out.push(id);
        for edge in &arena[id].subs {
            discover(edge.clause, arena, seen, out);
        }
    }
}

fn find_cycle_heads(
    id: ClauseId,
    arena: &ClauseArena,
    discovered: &mut AHashSet<ClauseId>,
    finished: &mut AHashSet<ClauseId>,
    heads: &mut Vec<ClauseId>,
    head_set: &mut AHashSet<ClauseId>,
) {
    discovered.insert(id);
    for edge in &arena[id].subs {
        let sub = edge.clause;
        if discovered.contains(&sub) {
            if head_set.insert(sub) {
                heads.push(sub);
            }
        } else if !finished.contains(&sub) {
            find_cycle_heads(sub, arena, discovered, finished, heads, head_set);
        }
    }
    discovered.remove(&id);
    finished.insert(id);
}

fn postorder(
    id: ClauseId,
    arena: &ClauseArena,
    placed: &mut AHashSet<ClauseId>,
    order: &mut Vec<ClauseId>,
) {
    if placed.insert(id) {
        for edge in &arena[id].subs {
            postorder(edge.clause, arena, placed, order);
        }
        order.push(id);
    }
}

/// Bottom-up zero-width analysis over the topological order. Members of a
/// cycle read the flag of not-yet-visited children as `false`, which is the
/// conservative answer for a clause that must consume to make progress.
fn compute_zero_width(arena: &mut ClauseArena, all_clauses: &[ClauseId]) {
    for &id in all_clauses {
        let zero = {
            let clause = &arena[id];
            match &clause.kind {
                ClauseKind::Nothing
                | ClauseKind::Start
                | ClauseKind::FollowedBy
                | ClauseKind::NotFollowedBy => true,
                ClauseKind::Char(_) | ClauseKind::CharSeq { .. } | ClauseKind::RuleRef(_) => false,
                ClauseKind::Seq => clause
                    .subs
                    .iter()
                    .all(|e| arena[e.clause].can_match_zero),
                ClauseKind::First => clause
                    .subs
                    .iter()
                    .any(|e| arena[e.clause].can_match_zero),
                ClauseKind::OneOrMore => arena[clause.subs[0].clause].can_match_zero,
            }
        };
        arena[id].can_match_zero = zero;
    }
}

/// Register each clause as a seed parent of its children. For sequences,
/// only children up to and including the first one that must consume input
/// can trigger the sequence: a later child can only complete a match that an
/// earlier child has already begun.
fn wire_seed_parents(arena: &mut ClauseArena, all_clauses: &[ClauseId]) {
    for &id in all_clauses {
        let is_seq = matches!(arena[id].kind, ClauseKind::Seq);
        let edges: Vec<(ClauseId, bool)> = arena[id]
            .subs
            .iter()
            .map(|e| (e.clause, arena[e.clause].can_match_zero))
            .collect();
        for (child, zero) in edges {
            let parents = &mut arena[child].seed_parents;
            if !parents.contains(&id) {
                parents.push(id);
            }
            if is_seq && !zero {
                break;
            }
        }
    }
}
