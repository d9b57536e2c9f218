//! Evaluation errors.

use core::fmt;

use crate::values::ValueType;
use formula_parser::{Location, OperatorRole};

/// Arithmetic errors raised by [`Arithmetic`](crate::arith::Arithmetic) operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ArithmeticError {
    /// Division or remainder by zero.
    DivisionByZero,
    /// Raising zero to a negative power.
    ZeroToNegativePower,
    /// Fractional power producing a non-finite or non-representable value.
    NonFinitePower,
    /// Rounding scale is too large by absolute value.
    ScaleOutOfRange(i64),
}

impl fmt::Display for ArithmeticError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DivisionByZero => formatter.write_str("Division by zero"),
            Self::ZeroToNegativePower => {
                formatter.write_str("Zero cannot be raised to a negative power")
            }
            Self::NonFinitePower => formatter.write_str("Result of power is not a finite number"),
            Self::ScaleOutOfRange(scale) => write!(formatter, "Scale {scale} is out of range"),
        }
    }
}

impl std::error::Error for ArithmeticError {}

/// Error in the engine or context configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    /// Time zone ID is not known to the time zone database.
    UnknownZone(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownZone(id) => write!(formatter, "Unknown time zone '{id}'"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Kinds of errors that can occur when compiling or evaluating expressions.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Error parsing the expression source.
    Syntax(formula_parser::ErrorKind),
    /// Literal that cannot be converted to a value.
    InvalidLiteral(String),
    /// Syntax node that cannot be compiled.
    UnexpectedNode(formula_parser::TokenKind),
    /// Operator that is not mapped, or whose implementation is missing.
    UndefinedOperator {
        /// Operator role.
        role: OperatorRole,
        /// Operator text as written in the expression.
        text: String,
    },
    /// Function (or reserved implementation) that has no overload for the number of arguments.
    UndefinedFunction {
        /// Function name.
        name: String,
        /// Number of arguments at the call site.
        arg_count: usize,
    },
    /// Right-hand side of a structure access is not a plain name.
    InvalidStructureField(String),
    /// Variable is not provided by the resolver.
    UndefinedVariable(String),
    /// No overload accepts the runtime types of the arguments.
    UnsupportedTypes,
    /// Structure access on a value that is not a structure.
    NotStructure(ValueType),
    /// Structure does not have the requested field.
    FieldNotFound(String),
    /// Array index is outside the array.
    IndexOutOfBounds {
        /// Index as provided.
        index: String,
        /// Array length.
        len: usize,
    },
    /// Argument rejected by a parameter validator.
    InvalidArgument(String),
    /// Arithmetic error.
    Arithmetic(ArithmeticError),
    /// Error raised by a native function.
    Native(String),
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax(kind) => fmt::Display::fmt(kind, formatter),
            Self::InvalidLiteral(text) => write!(formatter, "Invalid literal '{text}'"),
            Self::UnexpectedNode(kind) => write!(formatter, "Unexpected token of type '{kind}'"),
            Self::UndefinedOperator { role, text } => {
                write!(formatter, "could not find {role} operator '{text}'")
            }
            Self::UndefinedFunction { name, arg_count } => write!(
                formatter,
                "could not find evaluatable '{name}' with {arg_count} arguments"
            ),
            Self::InvalidStructureField(text) => {
                write!(formatter, "Invalid structure field '{text}'")
            }
            Self::UndefinedVariable(name) => {
                write!(formatter, "Variable or constant value for '{name}' not found")
            }
            Self::UnsupportedTypes => formatter.write_str("Unsupported data types in operation"),
            Self::NotStructure(ty) => {
                write!(formatter, "Value of wrong type for structure access: {ty}")
            }
            Self::FieldNotFound(name) => write!(formatter, "Field '{name}' not found in structure"),
            Self::IndexOutOfBounds { index, len } => write!(
                formatter,
                "Index {index} is out of bounds for array of length {len}"
            ),
            Self::InvalidArgument(message) | Self::Native(message) => formatter.write_str(message),
            Self::Arithmetic(err) => fmt::Display::fmt(err, formatter),
        }
    }
}

impl From<ArithmeticError> for ErrorKind {
    fn from(err: ArithmeticError) -> Self {
        Self::Arithmetic(err)
    }
}

impl ErrorKind {
    /// Creates a native error.
    pub fn native(message: impl Into<String>) -> Self {
        Self::Native(message.into())
    }
}

/// Compilation or evaluation error together with the location of the offending expression part.
///
/// Validator failures for a single call are reported together: the first failure
/// is the primary [`kind`](Self::kind()), the rest are available via [`Self::secondary()`].
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    location: Location,
    secondary: Vec<ErrorKind>,
    cause: Option<anyhow::Error>,
}

impl Error {
    pub(crate) fn from_parts(location: Location, kind: ErrorKind) -> Self {
        Self {
            kind,
            location,
            secondary: vec![],
            cause: None,
        }
    }

    pub(crate) fn with_secondary(mut self, secondary: Vec<ErrorKind>) -> Self {
        self.secondary = secondary;
        self
    }

    /// Attaches a nested cause to this error. The cause is exposed via
    /// [`std::error::Error::source()`].
    #[must_use]
    pub fn with_cause(mut self, cause: impl Into<anyhow::Error>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Returns the primary kind of this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Returns additional error kinds reported together with the primary one.
    pub fn secondary(&self) -> &[ErrorKind] {
        &self.secondary
    }

    /// Returns the location of the expression part that caused this error.
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Returns the byte offset of the offending text start.
    pub fn start(&self) -> usize {
        self.location.location_offset()
    }

    /// Returns the byte offset just past the offending text.
    pub fn end(&self) -> usize {
        self.location.end_offset()
    }

    /// Returns the offending text.
    pub fn text(&self) -> &str {
        self.location.fragment()
    }
}

impl From<formula_parser::Error> for Error {
    fn from(err: formula_parser::Error) -> Self {
        let location = err.location();
        Self::from_parts(location, ErrorKind::Syntax(err.kind().clone()))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{}:{}: {}",
            self.location.location_line(),
            self.location.get_column(),
            self.kind
        )
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}
