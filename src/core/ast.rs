/// An inclusive span of code points inside a character class.
pub type CharRange = (char, char);

/// How often a repeated subexpression may occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeat {
    /// `*`: any number of occurrences, including none.
    ZeroOrMore,
    /// `+`: at least one occurrence.
    OneOrMore,
    /// `?`: at most one occurrence.
    ZeroOrOne,
}

/// Syntax tree of one rule's pattern.
///
/// Sequences and branches are n-ary: `abc` is one [`Ast::Seq`] with three
/// children rather than a nest of pairs, which keeps trees shallow and
/// lets the compiler fold over the children in one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ast {
    /// The empty pattern; matches only the empty string.
    Empty,
    /// One literal code point.
    Lit(char),
    /// A set of alternative code points, stored as inclusive ranges.
    Class(Vec<CharRange>),
    /// The `.` wildcard. The parser produces it; the compiler refuses it,
    /// since the table back end needs a finite alphabet.
    Any,
    /// Two or more subexpressions matched one after another.
    Seq(Vec<Ast>),
    /// A choice between two or more branches.
    Branch(Vec<Ast>),
    /// A repeated subexpression.
    Repeat(Box<Ast>, Repeat),
}

impl Ast {
    /// Builds a sequence from `parts`, collapsing the degenerate sizes: an
    /// empty list is the empty match and a single part stands on its own.
    #[must_use]
    pub fn seq(mut parts: Vec<Ast>) -> Ast {
        match parts.len() {
            0 => Ast::Empty,
            1 => parts.remove(0),
            _ => Ast::Seq(parts),
        }
    }

    /// Builds an alternation from `branches`, collapsing the degenerate
    /// sizes the same way [`Ast::seq`] does.
    #[must_use]
    pub fn branch(mut branches: Vec<Ast>) -> Ast {
        match branches.len() {
            0 => Ast::Empty,
            1 => branches.remove(0),
            _ => Ast::Branch(branches),
        }
    }

    /// Applies a repetition operator to `inner`.
    #[must_use]
    pub fn repeat(inner: Ast, kind: Repeat) -> Ast {
        Ast::Repeat(Box::new(inner), kind)
    }
}
