//! Precedence-climbing rewrite.
//!
//! Rules that share a name form a precedence group. The group is rewritten
//! into a chain of per-level rules named `Name[precedence]`: self-references
//! inside each level are redirected according to associativity, and every
//! level except the highest fails over to the next level, so an expression
//! that cannot be matched at one level is retried one level up.

use compact_str::CompactString;
use hashbrown::HashMap;

use crate::error::GrammarError;
use crate::grammar::{Assoc, Expr, Rule};

pub(crate) struct PrecedenceRewrite {
    /// Rules after renaming and self-reference rewriting, in input order
    /// (group members sorted by ascending precedence).
    pub rules: Vec<Rule>,
    /// Bare group name → name of its lowest-precedence rule. References to
    /// the bare name resolve through this map.
    pub lowest_rule_name: HashMap<CompactString, CompactString, ahash::RandomState>,
}

/// Rewrite every precedence group. Single rules pass through untouched, even
/// when they carry a precedence: with one level there is nothing to climb.
pub(crate) fn rewrite_precedence_groups(
    rules: Vec<Rule>,
) -> Result<PrecedenceRewrite, GrammarError> {
    let mut groups: HashMap<CompactString, Vec<Rule>, ahash::RandomState> =
        HashMap::with_hasher(ahash::RandomState::new());
    let mut group_order: Vec<CompactString> = Vec::new();
    for rule in rules {
        if !groups.contains_key(&rule.name) {
            group_order.push(rule.name.clone());
        }
        groups.entry(rule.name.clone()).or_default().push(rule);
    }

    let mut out = Vec::new();
    let mut lowest_rule_name = HashMap::with_hasher(ahash::RandomState::new());
    for name in group_order {
        let group = groups.remove(&name).expect("group registered above");
        if group.len() == 1 {
            out.extend(group);
        } else {
            let rewritten = rewrite_group(&name, group)?;
            lowest_rule_name.insert(name, rewritten[0].name.clone());
            out.extend(rewritten);
        }
    }
    Ok(PrecedenceRewrite {
        rules: out,
        lowest_rule_name,
    })
}

fn rewrite_group(bare_name: &str, mut group: Vec<Rule>) -> Result<Vec<Rule>, GrammarError> {
    // check_rules has already rejected duplicate and missing precedences.
    group.sort_by_key(|r| r.precedence.unwrap_or(-1));
    let levels = group.len();
    let level_names: Vec<CompactString> = group
        .iter()
        .map(|r| CompactString::from(format!("{bare_name}[{}]", r.precedence.unwrap_or(-1))))
        .collect();

    for (i, rule) in group.iter_mut().enumerate() {
        let curr = &level_names[i];
        let next = &level_names[(i + 1) % levels];

        let total = count_self_refs(&rule.expr, bare_name);
        if total > 0 {
            let mut seen = 0;
            rewrite_self_refs(
                &mut rule.expr,
                bare_name,
                curr,
                next,
                rule.assoc,
                total,
                &mut seen,
            );
        }
        rule.name = curr.clone();

        // Every level but the highest defers to the next level when its own
        // pattern cannot match. An AST label wrapping the body stays on the
        // first alternative rather than applying to the failover.
        if i + 1 < levels {
            let body = std::mem::replace(&mut rule.expr, Expr::Nothing);
            rule.expr = Expr::First(vec![body, Expr::Ref(next.clone())]);
        }
    }
    Ok(group)
}

fn count_self_refs(expr: &Expr, name: &str) -> usize {
    match expr {
        Expr::Ref(n) => usize::from(n == name),
        Expr::Seq(subs) | Expr::First(subs) => {
            subs.iter().map(|e| count_self_refs(e, name)).sum()
        }
        Expr::OneOrMore(e)
        | Expr::ZeroOrMore(e)
        | Expr::Opt(e)
        | Expr::FollowedBy(e)
        | Expr::NotFollowedBy(e)
        | Expr::Label { expr: e, .. } => count_self_refs(e, name),
        _ => 0,
    }
}

/// Redirect self-references in left-to-right order:
///
/// - a single self-reference becomes the inline choice `(curr / next)`;
/// - with two or more, left associativity keeps the leftmost at the current
///   level and pushes the rest up, right associativity keeps the rightmost,
///   and no associativity pushes all of them up.
#[allow(clippy::too_many_arguments)]
fn rewrite_self_refs(
    expr: &mut Expr,
    name: &str,
    curr: &CompactString,
    next: &CompactString,
    assoc: Option<Assoc>,
    total: usize,
    seen: &mut usize,
) {
    match expr {
        Expr::Ref(n) if n == name => {
            let position = *seen;
            *seen += 1;
            *expr = if total == 1 {
                Expr::First(vec![Expr::Ref(curr.clone()), Expr::Ref(next.clone())])
            } else {
                let keep_current = match assoc {
                    Some(Assoc::Left) => position == 0,
                    Some(Assoc::Right) => position == total - 1,
                    None => false,
                };
                if keep_current {
                    Expr::Ref(curr.clone())
                } else {
                    Expr::Ref(next.clone())
                }
            };
        }
        Expr::Seq(subs) | Expr::First(subs) => {
            for sub in subs {
                rewrite_self_refs(sub, name, curr, next, assoc, total, seen);
            }
        }
        Expr::OneOrMore(e)
        | Expr::ZeroOrMore(e)
        | Expr::Opt(e)
        | Expr::FollowedBy(e)
        | Expr::NotFollowedBy(e)
        | Expr::Label { expr: e, .. } => {
            rewrite_self_refs(e, name, curr, next, assoc, total, seen);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_rule_is_untouched() {
        let rules = vec![Rule::with_precedence(
            "E",
            0,
            Some(Assoc::Right),
            Expr::seq([Expr::rule_ref("E"), Expr::str("^"), Expr::rule_ref("E")]),
        )];
        let rewritten = rewrite_precedence_groups(rules.clone()).unwrap();
        assert_eq!(rewritten.rules, rules);
        assert!(rewritten.lowest_rule_name.is_empty());
    }

    #[test]
    fn left_assoc_keeps_leftmost_self_reference() {
        let rules = vec![
            Rule::with_precedence(
                "E",
                0,
                Some(Assoc::Left),
                Expr::seq([Expr::rule_ref("E"), Expr::str("+"), Expr::rule_ref("E")]),
            ),
            Rule::with_precedence("E", 1, None, Expr::char_range('0', '9')),
        ];
        let rewritten = rewrite_precedence_groups(rules).unwrap();
        assert_eq!(rewritten.rules[0].name, "E[0]");
        assert_eq!(rewritten.rules[1].name, "E[1]");
        assert_eq!(
            rewritten.lowest_rule_name.get("E").map(CompactString::as_str),
            Some("E[0]")
        );

        // E[0] <- (E[0] '+' E[1]) / E[1]
        let Expr::First(alts) = &rewritten.rules[0].expr else {
            panic!("expected failover choice");
        };
        assert_eq!(alts.len(), 2);
        assert_eq!(alts[1], Expr::rule_ref("E[1]"));
        assert_eq!(
            alts[0],
            Expr::Seq(vec![
                Expr::rule_ref("E[0]"),
                Expr::str("+"),
                Expr::rule_ref("E[1]"),
            ])
        );
    }

    #[test]
    fn single_self_reference_becomes_inline_choice() {
        let rules = vec![
            Rule::with_precedence(
                "E",
                0,
                None,
                Expr::seq([Expr::str("-"), Expr::rule_ref("E")]),
            ),
            Rule::with_precedence("E", 1, None, Expr::char_range('0', '9')),
        ];
        let rewritten = rewrite_precedence_groups(rules).unwrap();
        let Expr::First(alts) = &rewritten.rules[0].expr else {
            panic!("expected failover choice");
        };
        assert_eq!(
            alts[0],
            Expr::Seq(vec![
                Expr::str("-"),
                Expr::First(vec![Expr::rule_ref("E[0]"), Expr::rule_ref("E[1]")]),
            ])
        );
    }

    #[test]
    fn highest_level_gets_no_failover_and_wraps_to_lowest() {
        let rules = vec![
            Rule::with_precedence("E", 0, None, Expr::char_range('0', '9')),
            Rule::with_precedence(
                "E",
                1,
                None,
                Expr::seq([Expr::str("("), Expr::rule_ref("E"), Expr::str(")")]),
            ),
        ];
        let rewritten = rewrite_precedence_groups(rules).unwrap();
        // The highest level keeps its own shape; its self-reference offers
        // the current level first, then wraps around to the lowest.
        assert_eq!(
            rewritten.rules[1].expr,
            Expr::Seq(vec![
                Expr::str("("),
                Expr::First(vec![Expr::rule_ref("E[1]"), Expr::rule_ref("E[0]")]),
                Expr::str(")"),
            ])
        );
    }
}
