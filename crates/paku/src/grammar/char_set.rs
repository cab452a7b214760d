use std::fmt;

use smallvec::{SmallVec, smallvec};

/// A set of characters, stored as a union of parts.
///
/// Each part holds a list of inclusive ranges plus its own invert flag; the
/// set matches a character when any part does. This mirrors how character
/// classes compose in grammars: `[a-z]`, `[^0-9]`, and unions of both remain
/// distinct parts instead of being flattened into one bitmap.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CharSet {
    parts: SmallVec<[CharSetPart; 1]>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CharSetPart {
    inverted: bool,
    ranges: SmallVec<[(char, char); 4]>,
}

impl CharSetPart {
    fn matches(&self, c: char) -> bool {
        let in_ranges = self.ranges.iter().any(|&(lo, hi)| lo <= c && c <= hi);
        in_ranges != self.inverted
    }
}

impl CharSet {
    /// The set containing exactly the characters of `chars`.
    #[must_use]
    pub fn of(chars: &str) -> Self {
        Self {
            parts: smallvec![CharSetPart {
                inverted: false,
                ranges: chars.chars().map(|c| (c, c)).collect(),
            }],
        }
    }

    /// The inclusive range `lo..=hi`.
    #[must_use]
    pub fn range(lo: char, hi: char) -> Self {
        Self {
            parts: smallvec![CharSetPart {
                inverted: false,
                ranges: smallvec![(lo, hi)],
            }],
        }
    }

    /// A set built from several inclusive ranges, e.g. `[a-zA-Z0-9]`.
    #[must_use]
    pub fn ranges<I>(ranges: I) -> Self
    where
        I: IntoIterator<Item = (char, char)>,
    {
        Self {
            parts: smallvec![CharSetPart {
                inverted: false,
                ranges: ranges.into_iter().collect(),
            }],
        }
    }

    /// The union of several sets. Parts keep their own invert flags, so
    /// `[a-z]` unioned with `[^0-9]` matches whenever either part does.
    #[must_use]
    pub fn union<I>(sets: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        Self {
            parts: sets.into_iter().flat_map(|s| s.parts).collect(),
        }
    }

    /// Invert every part of this set independently.
    #[must_use]
    pub fn invert(mut self) -> Self {
        for part in &mut self.parts {
            part.inverted = !part.inverted;
        }
        self
    }

    /// ASCII decimal digits, `[0-9]`.
    #[must_use]
    pub fn digits() -> Self {
        Self::range('0', '9')
    }

    /// ASCII lowercase letters, `[a-z]`.
    #[must_use]
    pub fn lowercase() -> Self {
        Self::range('a', 'z')
    }

    /// Whether `c` belongs to this set.
    #[must_use]
    pub fn contains(&self, c: char) -> bool {
        self.parts.iter().any(|p| p.matches(c))
    }
}

fn push_class_char(out: &mut fmt::Formatter<'_>, c: char) -> fmt::Result {
    match c {
        '\\' | ']' | '^' | '-' => write!(out, "\\{c}"),
        '\n' => write!(out, "\\n"),
        '\r' => write!(out, "\\r"),
        '\t' => write!(out, "\\t"),
        c if (c as u32) < 0x20 => write!(out, "\\u{{{:x}}}", c as u32),
        c => write!(out, "{c}"),
    }
}

impl fmt::Display for CharSet {
    /// Canonical character-class form, e.g. `[a-z]` or `[^0-9]`. Single
    /// characters also render bracketed (`[x]`) so a one-character class and
    /// a one-character literal never share a canonical string.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for part in &self.parts {
            if part.inverted {
                write!(f, "^")?;
            }
            for &(lo, hi) in &part.ranges {
                push_class_char(f, lo)?;
                if hi != lo {
                    write!(f, "-")?;
                    push_class_char(f, hi)?;
                }
            }
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership() {
        let set = CharSet::range('a', 'z');
        assert!(set.contains('a'));
        assert!(set.contains('m'));
        assert!(set.contains('z'));
        assert!(!set.contains('A'));
        assert!(!set.contains('0'));
    }

    #[test]
    fn inverted_membership() {
        let set = CharSet::of("abc").invert();
        assert!(!set.contains('a'));
        assert!(set.contains('d'));
        assert!(set.contains(' '));
    }

    #[test]
    fn union_keeps_parts_independent() {
        let set = CharSet::union([CharSet::range('a', 'z'), CharSet::digits()]);
        assert!(set.contains('q'));
        assert!(set.contains('7'));
        assert!(!set.contains('!'));

        let mixed = CharSet::union([CharSet::range('a', 'z'), CharSet::of("xyz").invert()]);
        // The inverted part matches almost everything on its own.
        assert!(mixed.contains('!'));
        assert!(mixed.contains('x'));
    }

    #[test]
    fn display_forms() {
        assert_eq!(CharSet::range('a', 'z').to_string(), "[a-z]");
        assert_eq!(CharSet::of("x").to_string(), "[x]");
        assert_eq!(CharSet::digits().invert().to_string(), "[^0-9]");
        assert_eq!(
            CharSet::ranges([('a', 'z'), ('A', 'Z')]).to_string(),
            "[a-zA-Z]"
        );
        assert_eq!(CharSet::of("]").to_string(), "[\\]]");
    }
}
