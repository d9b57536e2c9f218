//! Tokens produced by the lexer.

use core::fmt;

use crate::{ops::OperatorRole, spans::Spanned};

/// Kind of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum TokenKind {
    /// Decimal or hexadecimal number literal.
    NumberLiteral,
    /// String literal delimited by double quotes. The token fragment includes the quotes;
    /// use [`Token::string_value()`] to get the decoded value.
    StringLiteral,
    /// Reference to a variable or a constant.
    Variable,
    /// Prefix (unary) operator.
    PrefixOperator,
    /// Infix (binary) operator.
    InfixOperator,
    /// Postfix (unary) operator.
    PostfixOperator,
    /// Function name (an identifier directly followed by `(`).
    Function,
    /// Argument separator `,`.
    Comma,
    /// `(`
    BraceOpen,
    /// `)`
    BraceClose,
    /// `[`
    ArrayOpen,
    /// `]`
    ArrayClose,
    /// Synthetic array indexing operator created by the parser from `[`.
    ArrayIndex,
    /// `.` used for structure field access.
    StructureSeparator,
    /// `{`
    AssociateOpen,
    /// `}`
    AssociateClose,
    /// Synthetic associate indexing operator created by the parser from `{`.
    AssociateIndex,
    /// Synthetic marker for the start of the function argument list.
    FunctionParamStart,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::NumberLiteral => "number literal",
            Self::StringLiteral => "string literal",
            Self::Variable => "variable or constant",
            Self::PrefixOperator => "prefix operator",
            Self::InfixOperator => "infix operator",
            Self::PostfixOperator => "postfix operator",
            Self::Function => "function",
            Self::Comma => "comma",
            Self::BraceOpen => "brace open",
            Self::BraceClose => "brace close",
            Self::ArrayOpen => "array open",
            Self::ArrayClose => "array close",
            Self::ArrayIndex => "array index",
            Self::StructureSeparator => "structure separator",
            Self::AssociateOpen => "associate open",
            Self::AssociateClose => "associate close",
            Self::AssociateIndex => "associate index",
            Self::FunctionParamStart => "function parameter start",
        })
    }
}

impl TokenKind {
    /// Returns the operator role for operator tokens.
    pub fn operator_role(self) -> Option<OperatorRole> {
        match self {
            Self::PrefixOperator => Some(OperatorRole::Prefix),
            Self::InfixOperator => Some(OperatorRole::Infix),
            Self::PostfixOperator => Some(OperatorRole::Postfix),
            _ => None,
        }
    }

    pub(crate) fn from_role(role: OperatorRole) -> Self {
        match role {
            OperatorRole::Prefix => Self::PrefixOperator,
            OperatorRole::Infix => Self::InfixOperator,
            OperatorRole::Postfix => Self::PostfixOperator,
        }
    }

    /// Checks whether a token of this kind terminates an operand, i.e., whether an infix
    /// or postfix operator may follow it.
    pub(crate) fn ends_operand(self) -> bool {
        matches!(
            self,
            Self::NumberLiteral
                | Self::StringLiteral
                | Self::Variable
                | Self::BraceClose
                | Self::ArrayClose
                | Self::AssociateClose
        )
    }

    /// Checks whether a token of this kind opens a nested expression.
    pub(crate) fn is_opening(self) -> bool {
        matches!(self, Self::BraceOpen | Self::ArrayOpen | Self::AssociateOpen)
    }
}

/// Token: a classified and positioned lexical unit of the source expression.
pub type Token<'a> = Spanned<'a, TokenKind>;

impl Token<'_> {
    /// Returns the kind of this token.
    pub fn kind(&self) -> TokenKind {
        self.extra
    }

    /// Decodes the value of a string literal token. Returns `None` for other tokens.
    pub fn string_value(&self) -> Option<String> {
        if self.extra != TokenKind::StringLiteral {
            return None;
        }
        let raw = self.fragment();
        let inner = raw.strip_prefix('"')?.strip_suffix('"')?;
        Some(unescape(inner))
    }
}

/// Maps an escaped character to its value.
pub(crate) fn escaped_char(ch: char) -> Option<char> {
    Some(match ch {
        '"' => '"',
        '\'' => '\'',
        '\\' => '\\',
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        'b' => '\u{8}',
        'f' => '\u{c}',
        _ => return None,
    })
}

/// Decodes escape sequences. Escapes are validated by the lexer, so unknown ones are kept as is.
fn unescape(raw: &str) -> String {
    let mut decoded = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(escaped) = chars.next() {
                decoded.push(escaped_char(escaped).unwrap_or(escaped));
            }
        } else {
            decoded.push(ch);
        }
    }
    decoded
}

