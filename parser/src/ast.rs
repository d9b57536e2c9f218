//! Abstract syntax tree.

use core::fmt;

use crate::token::{Token, TokenKind};

/// Node of an abstract syntax tree.
///
/// The number of children is implied by the token kind: none for literals and variables,
/// one for prefix and postfix operators, two for infix operators and accessors (the object
/// goes first), any number for function calls.
#[derive(Debug, Clone, PartialEq)]
pub struct AstNode<'a> {
    /// Token at the root of this node.
    pub token: Token<'a>,
    /// Child nodes in the source order.
    pub children: Vec<AstNode<'a>>,
}

impl<'a> AstNode<'a> {
    pub(crate) fn new(token: Token<'a>, children: Vec<Self>) -> Self {
        Self { token, children }
    }

    pub(crate) fn leaf(token: Token<'a>) -> Self {
        Self::new(token, vec![])
    }

    /// Checks whether this tree has the same structure, token kinds and token fragments as
    /// `other`. Unlike `PartialEq`, token positions are not compared.
    pub fn same_structure(&self, other: &AstNode<'_>) -> bool {
        self.token.kind() == other.token.kind()
            && self.token.fragment() == other.token.fragment()
            && self.children.len() == other.children.len()
            && self
                .children
                .iter()
                .zip(&other.children)
                .all(|(lhs, rhs)| lhs.same_structure(rhs))
    }
}

/// Renders the tree as a fully parenthesized expression. The rendering parses back
/// to a tree with the same structure.
impl fmt::Display for AstNode<'_> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fragment = *self.token.fragment();
        match (self.token.kind(), self.children.as_slice()) {
            (TokenKind::PrefixOperator, [operand]) => {
                write!(formatter, "({fragment}({operand}))")
            }
            (TokenKind::PostfixOperator, [operand]) => {
                write!(formatter, "(({operand}){fragment})")
            }
            (TokenKind::InfixOperator, [lhs, rhs]) => write!(formatter, "({lhs} {fragment} {rhs})"),
            // Objects are parenthesized so that number literals are not mistaken for decimals.
            (TokenKind::StructureSeparator, [object, field]) => {
                write!(formatter, "({object}).{field}")
            }
            (TokenKind::ArrayIndex, [object, index]) => write!(formatter, "({object})[{index}]"),
            (TokenKind::AssociateIndex, [object, key]) => {
                write!(formatter, "({object}){{{key}}}")
            }
            (TokenKind::Function, args) => {
                write!(formatter, "{fragment}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        formatter.write_str(", ")?;
                    }
                    fmt::Display::fmt(arg, formatter)?;
                }
                formatter.write_str(")")
            }
            _ => formatter.write_str(fragment),
        }
    }
}
