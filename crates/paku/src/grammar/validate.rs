use hashbrown::HashMap;

use crate::error::GrammarError;
use crate::grammar::clause::{ClauseArena, ClauseId, ClauseKind};
use crate::grammar::{Expr, Rule};

/// Structural checks on the input rule list, before any rewriting.
pub(crate) fn check_rules(rules: &[Rule]) -> Result<(), GrammarError> {
    if rules.is_empty() {
        return Err(GrammarError::EmptyGrammar);
    }

    for rule in rules {
        if let Some(p) = rule.precedence
            && p < 0
        {
            return Err(GrammarError::NegativePrecedence {
                rule: rule.name.to_string(),
                precedence: p,
            });
        }
        if body_is_bare_self_reference(&rule.expr, &rule.name) {
            return Err(GrammarError::SelfReferenceOnly {
                rule: rule.name.to_string(),
            });
        }
    }

    let mut by_name: HashMap<&str, Vec<Option<i32>>, ahash::RandomState> =
        HashMap::with_hasher(ahash::RandomState::new());
    for rule in rules {
        by_name
            .entry(rule.name.as_str())
            .or_default()
            .push(rule.precedence);
    }
    for (name, precedences) in &by_name {
        if precedences.len() < 2 {
            continue;
        }
        // A shared name forms a precedence group; each member needs a
        // distinct, explicit precedence to disambiguate it.
        let mut seen = Vec::new();
        for p in precedences {
            let Some(p) = *p else {
                return Err(GrammarError::DuplicateRule {
                    name: (*name).to_string(),
                    precedence: -1,
                });
            };
            if seen.contains(&p) {
                return Err(GrammarError::DuplicateRule {
                    name: (*name).to_string(),
                    precedence: p,
                });
            }
            seen.push(p);
        }
    }
    Ok(())
}

/// A rule whose body is just a reference to its own name (possibly under a
/// label) can never be resolved.
fn body_is_bare_self_reference(expr: &Expr, name: &str) -> bool {
    match expr {
        Expr::Ref(n) => n == name,
        Expr::Label { expr, .. } => body_is_bare_self_reference(expr, name),
        _ => false,
    }
}

/// Invariant checks on the interned, resolved clause DAG. Runs after the
/// zero-width analysis, which the `First` and `NotFollowedBy` checks need.
pub(crate) fn check_clause_invariants(
    arena: &ClauseArena,
    all_clauses: &[ClauseId],
) -> Result<(), GrammarError> {
    for &id in all_clauses {
        let clause = &arena[id];
        if let Some(first) = clause.subs.first()
            && matches!(arena[first.clause].kind, ClauseKind::Nothing)
        {
            // A leading Nothing would seed the whole memo table at every
            // position without ever consuming anything.
            return Err(GrammarError::NothingAsFirstSubClause {
                clause: clause.canonical().to_string(),
            });
        }
        match clause.kind {
            ClauseKind::First => {
                for edge in &clause.subs[..clause.subs.len() - 1] {
                    if arena[edge.clause].can_match_zero {
                        return Err(GrammarError::ZeroWidthAlternativeNotLast {
                            clause: clause.canonical().to_string(),
                        });
                    }
                }
            }
            ClauseKind::NotFollowedBy => {
                if arena[clause.subs[0].clause].can_match_zero {
                    return Err(GrammarError::ZeroWidthNegativeLookahead {
                        clause: clause.canonical().to_string(),
                    });
                }
            }
            _ => {}
        }
    }
    Ok(())
}
