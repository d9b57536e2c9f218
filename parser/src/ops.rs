//! Operator registry and lookup traits shared by the parser and the evaluator.

use std::{collections::BTreeMap, fmt, sync::Arc};

/// Default operator precedences, lowest to highest.
pub mod precedence {
    /// Boolean OR (`||`).
    pub const OR: u32 = 2;
    /// Boolean AND (`&&`).
    pub const AND: u32 = 4;
    /// Equality checks: `==`, `!=` and their aliases.
    pub const EQUALITY: u32 = 7;
    /// Order comparisons: `<`, `<=`, `>`, `>=`.
    pub const COMPARISON: u32 = 10;
    /// Addition or subtraction: `+` or `-`.
    pub const ADDITIVE: u32 = 20;
    /// Multiplication, division or remainder: `*`, `/`, `%`.
    pub const MULTIPLICATIVE: u32 = 30;
    /// Power (`^`).
    pub const POWER: u32 = 40;
    /// Unary prefix operators: `-`, `+`, `!`.
    pub const UNARY: u32 = 60;
    /// Power precedence binding tighter than unary operators, so that `-2^2 == -4`.
    pub const POWER_HIGHER: u32 = 80;
}

/// Role of an operator in an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OperatorRole {
    /// Operator preceding its single operand, such as `-` in `-x`.
    Prefix,
    /// Operator between two operands, such as `-` in `x - y`.
    Infix,
    /// Operator following its single operand, such as `!` in `n!`.
    Postfix,
}

impl fmt::Display for OperatorRole {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl OperatorRole {
    /// Returns the string presentation of this role.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Prefix => "prefix",
            Self::Infix => "infix",
            Self::Postfix => "postfix",
        }
    }

    /// Returns the number of operands taken by operators with this role.
    pub fn arity(self) -> usize {
        match self {
            Self::Prefix | Self::Postfix => 1,
            Self::Infix => 2,
        }
    }
}

/// Binding of an operator to its precedence, associativity and implementation name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorMapping {
    /// Operator precedence; operators with higher precedence bind tighter.
    pub precedence: u32,
    /// Is the operator left-associative? (`a - b - c` is `(a - b) - c`.)
    pub left_associative: bool,
    /// Name the operator implementation is registered under in the function registry.
    pub implementation: String,
}

impl OperatorMapping {
    /// Creates a left-associative mapping.
    pub fn new(precedence: u32, implementation: impl Into<String>) -> Self {
        Self {
            precedence,
            left_associative: true,
            implementation: implementation.into(),
        }
    }

    /// Marks this mapping as right-associative.
    #[must_use]
    pub fn right_associative(mut self) -> Self {
        self.left_associative = false;
        self
    }
}

/// Lookup of operators by their text and role.
///
/// Operator texts are matched case-insensitively. Lookups compose via [`Self::and_then()`]:
/// a miss in the primary lookup defers to the fallback.
pub trait OperatorLookup {
    /// Looks up an operator with the specified role.
    fn operator(&self, role: OperatorRole, text: &str) -> Option<&OperatorMapping>;

    /// Checks whether there is an operator with the specified role starting with `prefix`.
    /// This is used by the lexer for the longest-match operator scan.
    fn has_operator_starting_with(&self, role: OperatorRole, prefix: &str) -> bool;

    /// Looks up a prefix operator.
    fn prefix_operator(&self, text: &str) -> Option<&OperatorMapping> {
        self.operator(OperatorRole::Prefix, text)
    }

    /// Looks up an infix operator.
    fn infix_operator(&self, text: &str) -> Option<&OperatorMapping> {
        self.operator(OperatorRole::Infix, text)
    }

    /// Looks up a postfix operator.
    fn postfix_operator(&self, text: &str) -> Option<&OperatorMapping> {
        self.operator(OperatorRole::Postfix, text)
    }

    /// Checks whether there is a prefix operator starting with `prefix`.
    fn has_prefix_starting_with(&self, prefix: &str) -> bool {
        self.has_operator_starting_with(OperatorRole::Prefix, prefix)
    }

    /// Checks whether there is an infix operator starting with `prefix`.
    fn has_infix_starting_with(&self, prefix: &str) -> bool {
        self.has_operator_starting_with(OperatorRole::Infix, prefix)
    }

    /// Checks whether there is a postfix operator starting with `prefix`.
    fn has_postfix_starting_with(&self, prefix: &str) -> bool {
        self.has_operator_starting_with(OperatorRole::Postfix, prefix)
    }

    /// Layers this lookup on top of a `fallback`.
    fn and_then<F>(self, fallback: F) -> Layered<Self, F>
    where
        Self: Sized,
        F: OperatorLookup,
    {
        Layered::new(self, fallback)
    }
}

/// Table of operators.
///
/// # Examples
///
/// ```
/// use formula_parser::{precedence, OperatorLookup, OperatorMapping, OperatorRole, OperatorTable};
///
/// let mut table = OperatorTable::new();
/// let modulo = OperatorMapping::new(precedence::MULTIPLICATIVE, "infix %");
/// table.insert(OperatorRole::Infix, "MOD", modulo);
/// let ops = table.and_then(OperatorTable::standard());
///
/// assert!(ops.infix_operator("mod").is_some());
/// assert!(ops.infix_operator("+").is_some());
/// assert!(ops.prefix_operator("mod").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct OperatorTable {
    operators: BTreeMap<(OperatorRole, String), OperatorMapping>,
}

impl OperatorTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table with the standard operators.
    pub fn standard() -> Self {
        use self::precedence::*;

        const INFIX: &[(&str, u32, &str)] = &[
            ("||", OR, "||"),
            ("&&", AND, "&&"),
            ("==", EQUALITY, "=="),
            ("=", EQUALITY, "=="),
            ("!=", EQUALITY, "!="),
            ("<>", EQUALITY, "!="),
            ("<", COMPARISON, "<"),
            ("<=", COMPARISON, "<="),
            (">", COMPARISON, ">"),
            (">=", COMPARISON, ">="),
            ("+", ADDITIVE, "+"),
            ("-", ADDITIVE, "-"),
            ("*", MULTIPLICATIVE, "*"),
            ("/", MULTIPLICATIVE, "/"),
            ("%", MULTIPLICATIVE, "%"),
        ];

        let mut table = Self::new();
        for &(text, precedence, name) in INFIX {
            let implementation = Self::implementation_name(OperatorRole::Infix, name);
            let mapping = OperatorMapping::new(precedence, implementation);
            table.insert(OperatorRole::Infix, text, mapping);
        }
        let power_name = Self::implementation_name(OperatorRole::Infix, "^");
        let power = OperatorMapping::new(POWER, power_name);
        table.insert(OperatorRole::Infix, "^", power.right_associative());

        for text in ["-", "+", "!"] {
            let implementation = Self::implementation_name(OperatorRole::Prefix, text);
            let mapping = OperatorMapping::new(UNARY, implementation);
            table.insert(OperatorRole::Prefix, text, mapping.right_associative());
        }
        table
    }

    /// Returns the implementation name used by [`Self::standard()`] operators. Such names
    /// contain a space, so they cannot be called as functions from expressions.
    pub fn implementation_name(role: OperatorRole, text: &str) -> String {
        format!("{role} {text}")
    }

    /// Inserts an operator into this table, replacing the previous mapping, if any.
    pub fn insert(
        &mut self,
        role: OperatorRole,
        text: &str,
        mapping: OperatorMapping,
    ) -> &mut Self {
        self.operators.insert((role, text.to_uppercase()), mapping);
        self
    }

    /// Inserts an operator into this table. This is a builder-style version of [`Self::insert()`].
    #[must_use]
    pub fn with(mut self, role: OperatorRole, text: &str, mapping: OperatorMapping) -> Self {
        self.insert(role, text, mapping);
        self
    }

    /// Iterates over operators in this table.
    pub fn iter(&self) -> impl Iterator<Item = (OperatorRole, &str, &OperatorMapping)> + '_ {
        self.operators
            .iter()
            .map(|((role, text), mapping)| (*role, text.as_str(), mapping))
    }
}

impl OperatorLookup for OperatorTable {
    fn operator(&self, role: OperatorRole, text: &str) -> Option<&OperatorMapping> {
        self.operators.get(&(role, text.to_uppercase()))
    }

    fn has_operator_starting_with(&self, role: OperatorRole, prefix: &str) -> bool {
        let prefix = prefix.to_uppercase();
        // Keys starting with `prefix` immediately follow `prefix` in the map ordering.
        self.operators
            .range((role, prefix.clone())..)
            .next()
            .map_or(false, |((key_role, text), _)| {
                *key_role == role && text.starts_with(&prefix)
            })
    }
}

/// Two lookups layered on top of each other: a miss in `primary` defers to `fallback`.
///
/// This type implements all lookup traits in this crate and in the evaluator crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct Layered<P, F> {
    /// Primary lookup.
    pub primary: P,
    /// Lookup used if the primary one has no matching entry.
    pub fallback: F,
}

impl<P, F> Layered<P, F> {
    /// Creates layered lookups.
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl<P: OperatorLookup, F: OperatorLookup> OperatorLookup for Layered<P, F> {
    fn operator(&self, role: OperatorRole, text: &str) -> Option<&OperatorMapping> {
        self.primary
            .operator(role, text)
            .or_else(|| self.fallback.operator(role, text))
    }

    fn has_operator_starting_with(&self, role: OperatorRole, prefix: &str) -> bool {
        self.primary.has_operator_starting_with(role, prefix)
            || self.fallback.has_operator_starting_with(role, prefix)
    }
}

impl<T: OperatorLookup + ?Sized> OperatorLookup for &T {
    fn operator(&self, role: OperatorRole, text: &str) -> Option<&OperatorMapping> {
        (**self).operator(role, text)
    }

    fn has_operator_starting_with(&self, role: OperatorRole, prefix: &str) -> bool {
        (**self).has_operator_starting_with(role, prefix)
    }
}

impl<T: OperatorLookup + ?Sized> OperatorLookup for Arc<T> {
    fn operator(&self, role: OperatorRole, text: &str) -> Option<&OperatorMapping> {
        (**self).operator(role, text)
    }

    fn has_operator_starting_with(&self, role: OperatorRole, prefix: &str) -> bool {
        (**self).has_operator_starting_with(role, prefix)
    }
}

/// Part of the function registry used by the parser to validate function calls.
pub trait FunctionArity {
    /// Checks whether a function with the specified name is known.
    fn has_function(&self, name: &str) -> bool;

    /// Checks whether a function with the specified name accepts `arg_count` arguments.
    fn accepts_arg_count(&self, name: &str, arg_count: usize) -> bool;
}

impl<P: FunctionArity, F: FunctionArity> FunctionArity for Layered<P, F> {
    fn has_function(&self, name: &str) -> bool {
        self.primary.has_function(name) || self.fallback.has_function(name)
    }

    fn accepts_arg_count(&self, name: &str, arg_count: usize) -> bool {
        self.primary.accepts_arg_count(name, arg_count)
            || self.fallback.accepts_arg_count(name, arg_count)
    }
}

impl<T: FunctionArity + ?Sized> FunctionArity for &T {
    fn has_function(&self, name: &str) -> bool {
        (**self).has_function(name)
    }

    fn accepts_arg_count(&self, name: &str, arg_count: usize) -> bool {
        (**self).accepts_arg_count(name, arg_count)
    }
}

impl<T: FunctionArity + ?Sized> FunctionArity for Arc<T> {
    fn has_function(&self, name: &str) -> bool {
        (**self).has_function(name)
    }

    fn accepts_arg_count(&self, name: &str, arg_count: usize) -> bool {
        (**self).accepts_arg_count(name, arg_count)
    }
}
