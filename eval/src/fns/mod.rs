//! Standard functions and operators, and the tools to define new native functions.
//!
//! # Defining native functions
//!
//! A native function is anything implementing [`NativeFn`]; the trait is implemented for
//! functions and closures with a matching signature. A function is registered in
//! a [`FunctionTable`] together with a [`Signature`] that declares parameter types,
//! laziness and validators. Several overloads may share a name; the first overload whose
//! parameter types match the runtime argument types is invoked.
//!
//! ```
//! use formula_eval::{
//!     fns::{Argument, CallContext},
//!     Engine, Error, FunctionTable, Param, Signature, Value,
//! };
//!
//! fn repeat(args: Vec<Argument<'_>>, ctx: &CallContext<'_>) -> Result<Value, Error> {
//!     let [s, n] = formula_eval::fns::take_args(args, ctx)?;
//!     match (s.into_value()?, n.into_value()?) {
//!         (Value::String(s), Value::Number(n)) => {
//!             let n = n.to_string().parse::<usize>().unwrap_or(0);
//!             Ok(Value::String(s.repeat(n)))
//!         }
//!         _ => Err(ctx.unsupported_types()),
//!     }
//! }
//!
//! let mut functions = FunctionTable::new();
//! let signature = Signature::new([Param::of(formula_eval::ValueType::String), Param::number()]);
//! functions.define("REPEAT", signature, repeat);
//!
//! let engine = Engine::new().with_functions(functions);
//! let expr = engine.prepare(r#"repeat("ab", 3)"#)?;
//! assert_eq!(expr.evaluate(&())?, Value::from("ababab"));
//! # Ok::<_, Error>(())
//! ```
//!
//! # Lazy arguments
//!
//! Parameters marked with [`Param::lazy()`] receive [`Argument::Lazy`]: the argument
//! expression is evaluated only if the implementation calls [`LazyArg::evaluate()`].
//! This is how `IF`, `COALESCE`, `&&` and `||` skip evaluating unused branches.

use core::fmt;

use bigdecimal::BigDecimal;
use chrono_tz::Tz;

use crate::{
    arith::DecimalArithmetic,
    context::EvaluationContext,
    error::{Error, ErrorKind},
    exec::{Evaluator, Node},
    registry::FunctionTable,
    values::Value,
};
use formula_parser::Location;

mod access;
mod datetime;
mod flow;
mod math;
mod ops;
mod signature;

pub use self::{
    access::{ARRAY_INDEX, ASSOCIATE_INDEX},
    ops::{ArithmeticOp, Compare},
    signature::{Param, ParamType, Signature, Validator},
};

/// Context for native function calls.
#[derive(Debug, Clone, Copy)]
pub struct CallContext<'r> {
    name: &'r str,
    location: &'r Location,
    context: &'r EvaluationContext,
}

impl<'r> CallContext<'r> {
    /// Creates a call context. This is mostly useful to test native functions.
    pub fn new(name: &'r str, location: &'r Location, context: &'r EvaluationContext) -> Self {
        Self {
            name,
            location,
            context,
        }
    }

    /// Returns the name of the called function or operator implementation.
    pub fn name(&self) -> &'r str {
        self.name
    }

    /// Returns the location of the call in the expression source.
    pub fn location(&self) -> &'r Location {
        self.location
    }

    /// Returns the evaluation context.
    pub fn context(&self) -> &'r EvaluationContext {
        self.context
    }

    /// Returns the decimal arithmetic.
    pub fn arithmetic(&self) -> &'r DecimalArithmetic {
        self.context.arithmetic()
    }

    /// Returns the time zone.
    pub fn zone(&self) -> Tz {
        self.context.zone()
    }

    /// Creates an error spanning the call site.
    pub fn call_site_error(&self, kind: impl Into<ErrorKind>) -> Error {
        Error::from_parts(self.location.clone(), kind.into())
    }

    /// Creates an error signalling that argument types are not supported.
    pub fn unsupported_types(&self) -> Error {
        self.call_site_error(ErrorKind::UnsupportedTypes)
    }
}

/// Argument expression which is evaluated on demand.
pub struct LazyArg<'r> {
    node: &'r Node,
    evaluator: &'r Evaluator<'r>,
}

impl fmt::Debug for LazyArg<'_> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("LazyArg")
            .field("node", self.node)
            .finish_non_exhaustive()
    }
}

impl<'r> LazyArg<'r> {
    pub(crate) fn new(node: &'r Node, evaluator: &'r Evaluator<'r>) -> Self {
        Self { node, evaluator }
    }

    /// Evaluates the argument expression.
    ///
    /// # Errors
    ///
    /// Propagates evaluation errors.
    pub fn evaluate(self) -> Result<Value, Error> {
        self.evaluator.evaluate(self.node)
    }
}

/// Argument of a native function call.
#[derive(Debug)]
pub enum Argument<'r> {
    /// Eagerly evaluated argument.
    Value(Value),
    /// Lazy argument.
    Lazy(LazyArg<'r>),
}

impl Argument<'_> {
    /// Returns the value of this argument, evaluating it if it is lazy.
    ///
    /// # Errors
    ///
    /// Propagates evaluation errors of lazy arguments.
    pub fn into_value(self) -> Result<Value, Error> {
        match self {
            Self::Value(value) => Ok(value),
            Self::Lazy(lazy) => lazy.evaluate(),
        }
    }
}

/// Function on zero or more [`Argument`]s.
///
/// Native functions are defined in the Rust code and registered in a [`FunctionTable`].
/// See the [module docs](self) for an example.
pub trait NativeFn: Send + Sync {
    /// Executes the function on the specified arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if the function fails. Use [`CallContext::call_site_error()`]
    /// to create errors pointing to the call.
    fn evaluate(&self, args: Vec<Argument<'_>>, context: &CallContext<'_>) -> Result<Value, Error>;
}

impl<F> NativeFn for F
where
    F: Fn(Vec<Argument<'_>>, &CallContext<'_>) -> Result<Value, Error> + Send + Sync,
{
    fn evaluate(&self, args: Vec<Argument<'_>>, context: &CallContext<'_>) -> Result<Value, Error> {
        self(args, context)
    }
}

impl fmt::Debug for dyn NativeFn {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_tuple("NativeFn").finish()
    }
}

/// Converts arguments into an array of the expected size.
///
/// # Errors
///
/// Returns an "unsupported data types" error if the number of arguments differs.
pub fn take_args<'r, const N: usize>(
    args: Vec<Argument<'r>>,
    ctx: &CallContext<'_>,
) -> Result<[Argument<'r>; N], Error> {
    args.try_into().map_err(|_| ctx.unsupported_types())
}

fn expect_number(arg: Argument<'_>, ctx: &CallContext<'_>) -> Result<BigDecimal, Error> {
    match arg.into_value()? {
        Value::Number(number) => Ok(number),
        _ => Err(ctx.unsupported_types()),
    }
}

fn expect_bool(arg: Argument<'_>, ctx: &CallContext<'_>) -> Result<bool, Error> {
    match arg.into_value()? {
        Value::Bool(flag) => Ok(flag),
        _ => Err(ctx.unsupported_types()),
    }
}

/// Converts an integer-valued number to `i64`.
fn expect_i64(arg: Argument<'_>, ctx: &CallContext<'_>) -> Result<i64, Error> {
    use num_traits::ToPrimitive;

    let number = expect_number(arg, ctx)?;
    number
        .to_i64()
        .ok_or_else(|| ctx.call_site_error(ErrorKind::native(format!("{number} is out of range"))))
}

impl FunctionTable {
    /// Creates a table with the standard operator implementations and functions.
    pub fn standard() -> Self {
        let mut table = Self::new();
        ops::define(&mut table);
        access::define(&mut table);
        flow::define(&mut table);
        math::define(&mut table);
        datetime::define(&mut table);
        table
    }
}
