//! Evaluator for infix formula expressions parsed by [`formula-parser`].
//!
//! # How it works
//!
//! 1. An expression is tokenized and parsed into an [`AstNode`](formula_parser::AstNode)
//!   using the operators and functions registered in an [`Engine`].
//! 2. The syntax tree is *compiled* into an [`Expression`]: constants are inlined, operators
//!   are mapped to their implementation names, and every call is bound to the overloads
//!   accepting its number of arguments.
//! 3. The [`Expression`] is evaluated against a [`VariableResolver`] in an
//!   [`EvaluationContext`]. At each call, the first overload whose parameter types match
//!   the runtime argument types is invoked.
//!
//! Compiled expressions are immutable and `Send + Sync`; the same expression can be evaluated
//! concurrently with different variables.
//!
//! # Type system
//!
//! [`Value`]s are arbitrary-precision decimal numbers, strings, Boolean values, date-times
//! (UTC instants), durations, arrays, structures (string-keyed maps) and null. There is no
//! implicit conversion among types: `1 + true` fails with "Unsupported data types in operation".
//!
//! # Arithmetic
//!
//! All numeric operations are performed on [`BigDecimal`]s and rounded to the precision
//! of the [`EvaluationContext`] (68 significant digits by default) using its rounding mode.
//! Division and remainder by zero are errors rather than infinities.
//!
//! # Crate features
//!
//! The crate has no optional features. It depends on [`chrono`] and [`chrono-tz`] for date-time
//! support, and on [`bigdecimal`] for numbers.
//!
//! [`formula-parser`]: https://docs.rs/formula-parser/
//! [`chrono`]: https://docs.rs/chrono/
//! [`chrono-tz`]: https://docs.rs/chrono-tz/
//! [`bigdecimal`]: https://docs.rs/bigdecimal/
//!
//! # Examples
//!
//! ```
//! use formula_eval::{Engine, ErrorKind, Value};
//! # use std::collections::HashMap;
//!
//! let engine = Engine::new();
//! let expr = engine.prepare("if(total > 100, total * 0.9, total) + shipping")?;
//!
//! let mut vars = HashMap::new();
//! vars.insert("total".to_owned(), Value::from(200));
//! vars.insert("shipping".to_owned(), Value::from(5));
//! assert_eq!(expr.evaluate(&vars)?, Value::from(185));
//!
//! // Missing variables are reported with their location.
//! vars.remove("shipping");
//! let err = expr.evaluate(&vars).unwrap_err();
//! assert_eq!(err.to_string(), "1:39: Variable or constant value for 'shipping' not found");
//! assert!(matches!(err.kind(), ErrorKind::UndefinedVariable(_)));
//! # Ok::<_, formula_eval::Error>(())
//! ```

#![doc(html_root_url = "https://docs.rs/formula-eval/0.1.0")]
#![warn(missing_docs, missing_debug_implementations)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]

pub use self::{
    arith::{Arithmetic, DecimalArithmetic},
    context::EvaluationContext,
    engine::Engine,
    error::{ArithmeticError, ConfigError, Error, ErrorKind},
    exec::Expression,
    fns::{Argument, CallContext, LazyArg, NativeFn, Param, ParamType, Signature, Validator},
    registry::{FunctionLookup, FunctionTable, Overload, OverloadSet},
    resolver::VariableResolver,
    values::{Value, ValueType},
};
pub use bigdecimal::{BigDecimal, RoundingMode};

pub mod arith;
mod compiler;
mod context;
mod engine;
pub mod error;
mod exec;
pub mod fns;
mod registry;
mod resolver;
mod values;
