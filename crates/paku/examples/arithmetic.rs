//! The classic pika demonstration grammar: assignment statements over a
//! five-level arithmetic precedence group, parsed bottom-up.
//!
//! Run with: `cargo run --example arithmetic`

use paku::{Assoc, Expr, Grammar, GrammarError, Rule};

fn arithmetic_grammar() -> Result<Grammar, GrammarError> {
    Grammar::new(vec![
        Rule::new("Program", Expr::one_or_more(Expr::rule_ref("Statement"))),
        Rule::new(
            "Statement",
            Expr::seq([
                Expr::label("var", Expr::one_or_more(Expr::char_range('a', 'z'))),
                Expr::str("="),
                Expr::rule_ref("E"),
                Expr::str(";"),
            ]),
        ),
        // Highest precedence: parenthesised expression.
        Rule::with_precedence(
            "E",
            4,
            None,
            Expr::seq([Expr::str("("), Expr::rule_ref("E"), Expr::str(")")]),
        ),
        Rule::with_precedence(
            "E",
            3,
            None,
            Expr::first([
                Expr::label("num", Expr::one_or_more(Expr::char_range('0', '9'))),
                Expr::label("sym", Expr::one_or_more(Expr::char_range('a', 'z'))),
            ]),
        ),
        // Unary minus.
        Rule::with_precedence(
            "E",
            2,
            None,
            Expr::label(
                "arith",
                Expr::seq([Expr::label("op", Expr::str("-")), Expr::rule_ref("E")]),
            ),
        ),
        Rule::with_precedence(
            "E",
            1,
            Some(Assoc::Left),
            Expr::label(
                "arith",
                Expr::seq([
                    Expr::label("left", Expr::rule_ref("E")),
                    Expr::label("op", Expr::first([Expr::str("*"), Expr::str("/")])),
                    Expr::label("right", Expr::rule_ref("E")),
                ]),
            ),
        ),
        Rule::with_precedence(
            "E",
            0,
            Some(Assoc::Left),
            Expr::label(
                "arith",
                Expr::seq([
                    Expr::label("left", Expr::rule_ref("E")),
                    Expr::label("op", Expr::first([Expr::str("+"), Expr::str("-")])),
                    Expr::label("right", Expr::rule_ref("E")),
                ]),
            ),
        ),
    ])
}

fn main() -> Result<(), GrammarError> {
    let grammar = arithmetic_grammar()?;
    println!("grammar:\n{grammar}");

    let input = "discriminant=b*b-4*a*c;";
    let table = grammar.parse(input);
    println!("input: {input:?}");
    println!(
        "memo entries: {}, matches created: {}, memoized: {}",
        table.num_entries(),
        table.metrics().matches_created,
        table.metrics().matches_memoized
    );

    for m in table.nonoverlapping_matches_for_rule("Statement")? {
        println!("  {}", m.summary(&grammar));
    }

    // A broken input: the uncovered span is reported as a syntax error.
    let broken = "discriminant=b*b-4*a*c;???x=1;";
    let table = grammar.parse(broken);
    let errors = table.syntax_errors(&["Program", "Statement"])?;
    if !errors.is_empty() {
        println!("syntax errors in {broken:?}:");
        for (start, (end, text)) in &errors {
            println!("  {start}..{end}: {text:?}");
        }
    }
    Ok(())
}
