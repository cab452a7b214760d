//! Tests for grammar construction: validation, the precedence rewrite,
//! interning, reference resolution, and the static analyses.

use paku::{Assoc, ClauseKind, Expr, Grammar, GrammarError, Rule};

#[test]
fn empty_rule_list_is_rejected() {
    let result = Grammar::new(vec![]);
    assert!(matches!(result, Err(GrammarError::EmptyGrammar)));
}

#[test]
fn self_referential_rule_body_is_rejected() {
    let result = Grammar::new(vec![Rule::new("A", Expr::rule_ref("A"))]);
    assert!(matches!(
        result,
        Err(GrammarError::SelfReferenceOnly { rule }) if rule == "A"
    ));

    // A label does not hide the self-reference.
    let result = Grammar::new(vec![Rule::new(
        "A",
        Expr::label("x", Expr::rule_ref("A")),
    )]);
    assert!(matches!(result, Err(GrammarError::SelfReferenceOnly { .. })));
}

#[test]
fn duplicate_precedence_is_rejected() {
    let result = Grammar::new(vec![
        Rule::with_precedence("E", 1, None, Expr::str("a")),
        Rule::with_precedence("E", 1, None, Expr::str("b")),
    ]);
    assert!(matches!(
        result,
        Err(GrammarError::DuplicateRule { name, precedence: 1 }) if name == "E"
    ));
}

#[test]
fn shared_name_without_precedence_is_rejected() {
    let result = Grammar::new(vec![
        Rule::new("E", Expr::str("a")),
        Rule::new("E", Expr::str("b")),
    ]);
    assert!(matches!(
        result,
        Err(GrammarError::DuplicateRule { precedence: -1, .. })
    ));
}

#[test]
fn negative_precedence_is_rejected() {
    let result = Grammar::new(vec![Rule::with_precedence("E", -2, None, Expr::str("a"))]);
    assert!(matches!(
        result,
        Err(GrammarError::NegativePrecedence { precedence: -2, .. })
    ));
}

#[test]
fn unknown_rule_reference_is_rejected() {
    let result = Grammar::new(vec![Rule::new(
        "A",
        Expr::seq([Expr::str("x"), Expr::rule_ref("Missing")]),
    )]);
    assert!(matches!(
        result,
        Err(GrammarError::UnknownRule { name }) if name == "Missing"
    ));
}

#[test]
fn rule_reference_cycle_is_rejected() {
    let result = Grammar::new(vec![
        Rule::new("A", Expr::rule_ref("B")),
        Rule::new("B", Expr::rule_ref("A")),
    ]);
    assert!(matches!(
        result,
        Err(GrammarError::RuleReferenceCycle { path }) if path.len() == 3
    ));
}

#[test]
fn nothing_as_first_sub_clause_is_rejected() {
    let result = Grammar::new(vec![Rule::new(
        "A",
        Expr::seq([Expr::nothing(), Expr::str("x")]),
    )]);
    assert!(matches!(
        result,
        Err(GrammarError::NothingAsFirstSubClause { .. })
    ));
}

#[test]
fn zero_width_alternative_must_be_last() {
    let result = Grammar::new(vec![Rule::new(
        "A",
        Expr::first([Expr::opt(Expr::str("x")), Expr::str("y")]),
    )]);
    assert!(matches!(
        result,
        Err(GrammarError::ZeroWidthAlternativeNotLast { .. })
    ));
}

#[test]
fn negative_lookahead_of_zero_width_clause_is_rejected() {
    let result = Grammar::new(vec![Rule::new(
        "A",
        Expr::seq([
            Expr::not_followed_by(Expr::opt(Expr::str("x"))),
            Expr::str("y"),
        ]),
    )]);
    assert!(matches!(
        result,
        Err(GrammarError::ZeroWidthNegativeLookahead { .. })
    ));
}

#[test]
fn identical_sub_clauses_are_interned_once() {
    let grammar = Grammar::new(vec![
        Rule::new("A", Expr::one_or_more(Expr::char_range('a', 'z'))),
        Rule::new(
            "B",
            Expr::seq([
                Expr::str("#"),
                Expr::one_or_more(Expr::char_range('a', 'z')),
            ]),
        ),
    ])
    .unwrap();

    let a_top = grammar.rule_by_name("A").unwrap().clause();
    let b_top = grammar.rule_by_name("B").unwrap().clause();
    // B's second element is the same clause object as A's whole body.
    assert_eq!(grammar.clause(b_top).sub_clauses()[1].clause, a_top);
    // And the canonical-form index finds the shared char class.
    let char_class = grammar.find_clause("[a-z]").unwrap();
    assert!(matches!(
        grammar.clause(char_class).kind(),
        ClauseKind::Char(_)
    ));
    assert_eq!(grammar.find_clause("[a-z]+"), Some(a_top));
}

#[test]
fn sub_clauses_come_before_parents_in_topological_order() {
    let grammar = Grammar::new(vec![
        Rule::new("Program", Expr::one_or_more(Expr::rule_ref("Statement"))),
        Rule::new(
            "Statement",
            Expr::seq([
                Expr::one_or_more(Expr::char_range('a', 'z')),
                Expr::str("="),
                Expr::one_or_more(Expr::char_range('0', '9')),
                Expr::str(";"),
            ]),
        ),
    ])
    .unwrap();

    for id in grammar.clauses() {
        for edge in grammar.clause(id).sub_clauses() {
            assert!(
                grammar.clause(edge.clause).index() < grammar.clause(id).index(),
                "sub-clause `{}` should precede `{}`",
                grammar.clause(edge.clause).canonical(),
                grammar.clause(id).canonical()
            );
        }
    }
}

#[test]
fn zero_width_analysis_flags() {
    let grammar = Grammar::new(vec![Rule::new(
        "A",
        Expr::seq([
            Expr::zero_or_more(Expr::str(" ")),
            Expr::one_or_more(Expr::char_range('a', 'z')),
        ]),
    )])
    .unwrap();

    let ws = grammar.find_clause("' '+ / ()").unwrap();
    assert!(grammar.clause(ws).can_match_zero());

    let word = grammar.find_clause("[a-z]+").unwrap();
    assert!(!grammar.clause(word).can_match_zero());

    let top = grammar.rule_by_name("A").unwrap().clause();
    assert!(!grammar.clause(top).can_match_zero());
}

#[test]
fn precedence_group_is_renamed_and_bare_name_resolves_to_lowest() {
    let grammar = Grammar::new(vec![
        Rule::with_precedence(
            "E",
            0,
            Some(Assoc::Left),
            Expr::seq([Expr::rule_ref("E"), Expr::str("+"), Expr::rule_ref("E")]),
        ),
        Rule::with_precedence("E", 1, None, Expr::char_range('0', '9')),
    ])
    .unwrap();

    assert_eq!(grammar.rule_by_name("E").unwrap().name(), "E[0]");
    assert_eq!(grammar.rule_by_name("E[1]").unwrap().name(), "E[1]");
    assert!(matches!(
        grammar.rule_by_name("E[2]"),
        Err(GrammarError::UnknownRule { .. })
    ));

    let rendered = grammar.to_string();
    assert!(rendered.contains("E[0] <- "), "got:\n{rendered}");
    assert!(rendered.contains("E[1] <- "), "got:\n{rendered}");
}

#[test]
fn alias_rule_inherits_clause_and_label() {
    let grammar = Grammar::new(vec![
        Rule::new("Name", Expr::label("name", Expr::one_or_more(Expr::char_range('a', 'z')))),
        Rule::new("Alias", Expr::rule_ref("Name")),
        Rule::new(
            "Pair",
            Expr::seq([Expr::rule_ref("Alias"), Expr::str(":"), Expr::rule_ref("Name")]),
        ),
    ])
    .unwrap();

    let name = grammar.rule_by_name("Name").unwrap();
    let alias = grammar.rule_by_name("Alias").unwrap();
    assert_eq!(alias.clause(), name.clause());
    assert_eq!(alias.label(), Some("name"));

    // Unlabeled edges pointing at a labeled rule inherit its label.
    let pair = grammar.rule_by_name("Pair").unwrap().clause();
    let edges = grammar.clause(pair).sub_clauses();
    assert_eq!(edges[0].label.as_deref(), Some("name"));
    assert_eq!(edges[2].label.as_deref(), Some("name"));
    assert_eq!(edges[0].clause, name.clause());
}

#[test]
fn desugared_optional_and_star_share_their_choice_shape() {
    let grammar = Grammar::new(vec![
        Rule::new("A", Expr::opt(Expr::str("x"))),
        Rule::new("B", Expr::seq([Expr::str("y"), Expr::opt(Expr::str("x"))])),
    ])
    .unwrap();

    // Both uses of `'x'?` intern to one First('x', Nothing) clause.
    let opt = grammar.find_clause("'x' / ()").unwrap();
    assert_eq!(grammar.rule_by_name("A").unwrap().clause(), opt);
    let b = grammar.rule_by_name("B").unwrap().clause();
    assert_eq!(grammar.clause(b).sub_clauses()[1].clause, opt);
    assert!(matches!(grammar.clause(opt).kind(), ClauseKind::First));
}

#[test]
fn rule_names_are_recorded_on_top_clauses() {
    let grammar = Grammar::new(vec![Rule::new(
        "Word",
        Expr::one_or_more(Expr::char_range('a', 'z')),
    )])
    .unwrap();
    let top = grammar.rule_by_name("Word").unwrap().clause();
    let names: Vec<&str> = grammar.clause(top).rule_names().collect();
    assert_eq!(names, vec!["Word"]);
    assert_eq!(
        grammar.clause_repr_with_rule_names(top),
        "Word <- [a-z]+"
    );
}
