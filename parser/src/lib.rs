//! Tokenizer and shunting-yard parser for infix formula expressions.
//!
//! The parser is a syntax-only layer: it splits an expression into [`Token`]s, resolves
//! operator roles and builds an [`AstNode`] tree. It knows nothing about values; operators
//! and functions are described by lookups supplied by the caller ([`OperatorLookup`]
//! and [`FunctionArity`]), so the same parser serves any evaluator.
//!
//! # Supported syntax
//!
//! - **Literals.** Decimal numbers (`1`, `.5`, `1.25e-3`), hexadecimal integers (`0x1F`)
//!   and double-quoted strings with `\"`, `\\`, `\n`, `\r`, `\t`, `\b` and `\f` escapes.
//! - **Variables and constants**: identifiers starting with a letter or `_`.
//! - **Operators**: prefix, infix and postfix operators taken from an operator registry.
//!   The role of an operator like `-` is determined by the preceding token. Operators are
//!   matched greedily, so `<=` is a single operator if it is registered.
//! - **Function calls**: `max(1, x)`. The number of arguments is validated against
//!   the function registry.
//! - **Parentheses** which predictably influence operation priority.
//!
//! ## Optional syntax
//!
//! These constructs can be switched off via [`Features`]:
//!
//! - **Arrays.** Indexing like `values[0]`.
//! - **Structures.** Field access like `order.customer.name`.
//! - **Associates.** Keyed access like `prices{"EUR"}`.
//! - **Implicit multiplication**: `2x` or `(a + b)(a - b)`.
//!
//! # Examples
//!
//! ```
//! use formula_parser::{parse, Features, FunctionArity, OperatorTable, TokenKind};
//!
//! /// Registry without any functions.
//! struct NoFunctions;
//!
//! impl FunctionArity for NoFunctions {
//!     fn has_function(&self, _name: &str) -> bool {
//!         false
//!     }
//!
//!     fn accepts_arg_count(&self, _name: &str, _arg_count: usize) -> bool {
//!         false
//!     }
//! }
//!
//! let ast = parse("1 - 2 - x * 3", &OperatorTable::standard(), &NoFunctions, Features::all())?;
//! assert_eq!(ast.token.kind(), TokenKind::InfixOperator);
//! assert_eq!(ast.to_string(), "((1 - 2) - (x * 3))");
//!
//! let err = parse("max(1)", &OperatorTable::standard(), &NoFunctions, Features::all())
//!     .unwrap_err();
//! assert_eq!(err.to_string(), "1:1: Undefined function 'max'");
//! # Ok::<_, formula_parser::Error>(())
//! ```

#![doc(html_root_url = "https://docs.rs/formula-parser/0.1.0")]
#![warn(missing_docs, missing_debug_implementations)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]

use bitflags::bitflags;

pub use crate::{
    ast::AstNode,
    error::{Bracket, Error, ErrorKind},
    lexer::tokenize,
    ops::{
        precedence, FunctionArity, Layered, OperatorLookup, OperatorMapping, OperatorRole,
        OperatorTable,
    },
    parser::{parse, parse_tokens},
    spans::{InputSpan, LocatedSpan, Location, Spanned},
    token::{Token, TokenKind},
};

mod ast;
mod error;
mod lexer;
mod ops;
mod parser;
mod spans;
mod token;

bitflags! {
    /// Parsing features.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Features: u64 {
        /// Array indexing, e.g. `values[0]`.
        const ARRAYS = 1;
        /// Structure field access, e.g. `order.total`.
        const STRUCTURES = 2;
        /// Associate (keyed) access, e.g. `prices{"EUR"}`.
        const ASSOCIATES = 4;
        /// Implicit multiplication, e.g. `2x` or `(a)(b)`.
        const IMPLICIT_MULTIPLICATION = 8;
    }
}

impl Default for Features {
    fn default() -> Self {
        Self::all()
    }
}
