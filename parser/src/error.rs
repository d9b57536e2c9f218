//! Error handling.

use core::fmt;

use crate::{
    spans::{Location, Spanned},
    token::TokenKind,
};

/// Kind of a bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bracket {
    /// Parentheses `()`.
    Brace,
    /// Square brackets `[]`.
    Array,
    /// Curly brackets `{}`.
    Associate,
}

impl fmt::Display for Bracket {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Brace => "brace",
            Self::Array => "array",
            Self::Associate => "associate",
        })
    }
}

/// Parsing error kind.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Unknown escape sequence in a string literal.
    UnknownEscape,
    /// String literal is not terminated.
    UnterminatedString,
    /// Exponent marker in a number literal is not followed by digits.
    IllegalScientificFormat,
    /// Hexadecimal prefix is not followed by digits.
    IllegalHexFormat,
    /// Number literal contains more than one decimal point.
    MultipleDecimalPoints,
    /// No registered operator matches the scanned text.
    UndefinedOperator(String),
    /// Structure separator `.` in a position where it is not allowed.
    MisplacedStructureSeparator,
    /// Opening or closing bracket in a position where it is not allowed.
    MisplacedBracket {
        /// Bracket kind.
        bracket: Bracket,
        /// Is this a closing bracket?
        closing: bool,
    },
    /// Closing bracket without a matching opening one.
    UnexpectedClosing(Bracket),
    /// Opening bracket without a matching closing one.
    Unclosed(Bracket),
    /// Infix operator followed by another infix operator, a closing brace or a comma.
    UnexpectedAfterInfix,
    /// Missing argument between an opening bracket and a comma, between two commas,
    /// or between a comma and a closing brace.
    EmptyArgument,
    /// Two operands follow each other without an operator in between, and implicit
    /// multiplication is switched off.
    MissingOperator,
    /// Operator without an operand.
    MissingOperand,
    /// Binary operator with a single operand.
    MissingSecondOperand,
    /// Expression contains no operands.
    EmptyExpression,
    /// Expression contains several operands not connected by operators.
    TooManyOperands,
    /// Token of an unexpected type.
    UnexpectedToken(TokenKind),
    /// Call of a function that is not registered.
    UndefinedFunction(String),
    /// Call of a registered function with an unsupported number of arguments.
    ArgCount {
        /// Function name as written in the expression.
        name: String,
        /// Number of supplied arguments.
        count: usize,
    },
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownEscape => formatter.write_str("Unknown escape character"),
            Self::UnterminatedString => formatter.write_str("Closing quote not found"),
            Self::IllegalScientificFormat => formatter.write_str("Illegal scientific format"),
            Self::IllegalHexFormat => formatter.write_str("Illegal hexadecimal format"),
            Self::MultipleDecimalPoints => {
                formatter.write_str("Number contains more than one decimal point")
            }
            Self::UndefinedOperator(op) => write!(formatter, "Undefined operator '{op}'"),
            Self::MisplacedStructureSeparator => {
                formatter.write_str("Structure separator not allowed here")
            }
            Self::MisplacedBracket { bracket, closing } => {
                let bracket = match bracket {
                    Bracket::Brace => "Brace",
                    Bracket::Array => "Array",
                    Bracket::Associate => "Associate",
                };
                let action = if *closing { "close" } else { "open" };
                write!(formatter, "{bracket} {action} not allowed here")
            }
            Self::UnexpectedClosing(bracket) => write!(formatter, "Unexpected closing {bracket}"),
            Self::Unclosed(bracket) => write!(formatter, "Closing {bracket} not found"),
            Self::UnexpectedAfterInfix => {
                formatter.write_str("Unexpected token after infix operator")
            }
            Self::EmptyArgument => formatter.write_str("Empty argument"),
            Self::MissingOperator => formatter.write_str("Missing operator"),
            Self::MissingOperand => formatter.write_str("Missing operand for operator"),
            Self::MissingSecondOperand => {
                formatter.write_str("Missing second operand for operator")
            }
            Self::EmptyExpression => formatter.write_str("Empty expression"),
            Self::TooManyOperands => formatter.write_str("Too many operands"),
            Self::UnexpectedToken(kind) => write!(formatter, "Unexpected token of type '{kind}'"),
            Self::UndefinedFunction(name) => write!(formatter, "Undefined function '{name}'"),
            Self::ArgCount { name, count } => write!(
                formatter,
                "could not find evaluatable '{name}' with {count} arguments"
            ),
        }
    }
}

impl ErrorKind {
    pub(crate) fn with_span<T>(self, span: &Spanned<'_, T>) -> Error {
        Error {
            inner: span.to_location_with(self),
        }
    }
}

/// Parsing error with the associated code location.
///
/// The location is owned, so the error can outlive the parsed code.
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    inner: Location<ErrorKind>,
}

impl Error {
    /// Returns the kind of this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.inner.extra
    }

    /// Returns the location of this error.
    pub fn location(&self) -> Location {
        self.inner.to_location()
    }

    /// Returns the byte offset of the offending text start.
    pub fn start(&self) -> usize {
        self.inner.location_offset()
    }

    /// Returns the byte offset just past the offending text.
    pub fn end(&self) -> usize {
        self.inner.end_offset()
    }

    /// Returns the offending text.
    pub fn text(&self) -> &str {
        self.inner.fragment()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{}:{}: {}",
            self.inner.location_line(),
            self.inner.get_column(),
            self.inner.extra
        )
    }
}

impl std::error::Error for Error {}
