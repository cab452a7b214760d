use compact_str::CompactString;

use crate::grammar::CharSet;

/// The operator tree a grammar front-end hands to
/// [`Grammar::new`](crate::Grammar::new).
///
/// `Expr` is a plain owned tree: recursion is only possible through
/// [`Expr::Ref`], which construction resolves into the shared clause DAG.
/// `Opt` and `ZeroOrMore` are surface forms; the builder desugars them to
/// `First(x, Nothing)` and `First(OneOrMore(x), Nothing)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Match one character from a set.
    Char(CharSet),
    /// Match a literal string, optionally case-insensitively.
    Str {
        text: CompactString,
        ignore_case: bool,
    },
    /// Zero-width match at input position 0.
    Start,
    /// Zero-width match anywhere.
    Nothing,
    /// Reference to a named rule.
    Ref(CompactString),
    /// Ordered concatenation.
    Seq(Vec<Expr>),
    /// Ordered choice: the first matching alternative wins.
    First(Vec<Expr>),
    OneOrMore(Box<Expr>),
    ZeroOrMore(Box<Expr>),
    Opt(Box<Expr>),
    /// Zero-width positive lookahead.
    FollowedBy(Box<Expr>),
    /// Zero-width negative lookahead.
    NotFollowedBy(Box<Expr>),
    /// Attach an AST label; it ends up on the edge from the enclosing clause,
    /// not on the (possibly shared) child clause itself.
    Label {
        name: CompactString,
        expr: Box<Expr>,
    },
}

impl Expr {
    /// Match one character from `set`.
    #[must_use]
    pub const fn char_set(set: CharSet) -> Self {
        Self::Char(set)
    }

    /// Match exactly the character `c`.
    #[must_use]
    pub fn ch(c: char) -> Self {
        let mut buf = [0u8; 4];
        Self::Char(CharSet::of(c.encode_utf8(&mut buf)))
    }

    /// Match the inclusive character range `lo..=hi`.
    #[must_use]
    pub fn char_range(lo: char, hi: char) -> Self {
        Self::Char(CharSet::range(lo, hi))
    }

    /// Match the literal `text`.
    #[must_use]
    pub fn str(text: &str) -> Self {
        Self::Str {
            text: text.into(),
            ignore_case: false,
        }
    }

    /// Match the literal `text`, ignoring case.
    #[must_use]
    pub fn str_ignore_case(text: &str) -> Self {
        Self::Str {
            text: text.into(),
            ignore_case: true,
        }
    }

    /// Zero-width match at input position 0.
    #[must_use]
    pub const fn start() -> Self {
        Self::Start
    }

    /// Zero-width match anywhere.
    #[must_use]
    pub const fn nothing() -> Self {
        Self::Nothing
    }

    /// Reference the rule named `name`.
    #[must_use]
    pub fn rule_ref(name: &str) -> Self {
        Self::Ref(name.into())
    }

    /// Ordered concatenation. A single element collapses to itself.
    #[must_use]
    pub fn seq<I>(exprs: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        let mut vec: Vec<_> = exprs.into_iter().collect();
        if vec.len() == 1 {
            vec.pop().unwrap()
        } else {
            Self::Seq(vec)
        }
    }

    /// Ordered choice. A single alternative collapses to itself.
    #[must_use]
    pub fn first<I>(exprs: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        let mut vec: Vec<_> = exprs.into_iter().collect();
        if vec.len() == 1 {
            vec.pop().unwrap()
        } else {
            Self::First(vec)
        }
    }

    #[must_use]
    pub fn one_or_more(expr: Self) -> Self {
        Self::OneOrMore(Box::new(expr))
    }

    #[must_use]
    pub fn zero_or_more(expr: Self) -> Self {
        Self::ZeroOrMore(Box::new(expr))
    }

    #[must_use]
    pub fn opt(expr: Self) -> Self {
        Self::Opt(Box::new(expr))
    }

    #[must_use]
    pub fn followed_by(expr: Self) -> Self {
        Self::FollowedBy(Box::new(expr))
    }

    #[must_use]
    pub fn not_followed_by(expr: Self) -> Self {
        Self::NotFollowedBy(Box::new(expr))
    }

    /// Label `expr` for AST construction.
    #[must_use]
    pub fn label(name: &str, expr: Self) -> Self {
        Self::Label {
            name: name.into(),
            expr: Box::new(expr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singleton_seq_and_first_collapse() {
        assert_eq!(Expr::seq([Expr::str("a")]), Expr::str("a"));
        assert_eq!(Expr::first([Expr::str("a")]), Expr::str("a"));
        assert!(matches!(
            Expr::seq([Expr::str("a"), Expr::str("b")]),
            Expr::Seq(_)
        ));
    }

    #[test]
    fn ch_builds_a_singleton_set() {
        let Expr::Char(set) = Expr::ch('x') else {
            panic!("expected a char-set expression");
        };
        assert!(set.contains('x'));
        assert!(!set.contains('y'));
    }
}
