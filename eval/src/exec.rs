//! Evaluation tree and its evaluation.

use core::fmt;

use crate::{
    context::EvaluationContext,
    error::{Error, ErrorKind},
    fns::{Argument, CallContext, LazyArg},
    registry::OverloadSet,
    resolver::VariableResolver,
    values::Value,
};
use formula_parser::Location;

/// Node of a compiled evaluation tree.
#[derive(Debug)]
pub(crate) enum Node {
    /// Literal or constant value.
    Literal(Value),
    /// Variable read from the resolver.
    Variable { name: String, location: Location },
    /// Call of a function or an operator implementation.
    Call(CallNode),
    /// Field access on a structure.
    StructureAccess {
        object: Box<Node>,
        field: String,
        location: Location,
    },
}

/// Call with overloads resolved by name and argument count.
#[derive(Debug)]
pub(crate) struct CallNode {
    pub name: String,
    pub overloads: OverloadSet,
    pub args: Vec<Node>,
    /// Laziness of each argument, taken from the first overload.
    pub lazy: Vec<bool>,
    pub location: Location,
}

impl fmt::Display for Node {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(Value::String(s)) => write!(formatter, "{s:?}"),
            Self::Literal(value) => fmt::Display::fmt(value, formatter),
            Self::Variable { name, .. } => formatter.write_str(name),
            Self::Call(call) => {
                write!(formatter, "{}(", call.name)?;
                for (i, (arg, &lazy)) in call.args.iter().zip(&call.lazy).enumerate() {
                    if i > 0 {
                        formatter.write_str(", ")?;
                    }
                    if lazy {
                        formatter.write_str("lazy ")?;
                    }
                    fmt::Display::fmt(arg, formatter)?;
                }
                formatter.write_str(")")
            }
            Self::StructureAccess { object, field, .. } => write!(formatter, "({object}).{field}"),
        }
    }
}

/// Tree-walking evaluator bound to a variable resolver and a context.
pub(crate) struct Evaluator<'r> {
    vars: &'r dyn VariableResolver,
    context: &'r EvaluationContext,
}

impl fmt::Debug for Evaluator<'_> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Evaluator")
            .field("context", self.context)
            .finish_non_exhaustive()
    }
}

impl<'r> Evaluator<'r> {
    pub(crate) fn new(vars: &'r dyn VariableResolver, context: &'r EvaluationContext) -> Self {
        Self { vars, context }
    }

    pub(crate) fn evaluate(&self, node: &Node) -> Result<Value, Error> {
        match node {
            Node::Literal(value) => Ok(value.clone()),

            Node::Variable { name, location } => self.vars.get(name).ok_or_else(|| {
                Error::from_parts(location.clone(), ErrorKind::UndefinedVariable(name.clone()))
            }),

            Node::Call(call) => self.evaluate_call(call),

            Node::StructureAccess {
                object,
                field,
                location,
            } => match self.evaluate(object)? {
                Value::Structure(mut fields) => fields.remove(field).ok_or_else(|| {
                    Error::from_parts(location.clone(), ErrorKind::FieldNotFound(field.clone()))
                }),
                other => Err(Error::from_parts(
                    location.clone(),
                    ErrorKind::NotStructure(other.value_type()),
                )),
            },
        }
    }

    fn evaluate_call(&self, call: &CallNode) -> Result<Value, Error> {
        let mut args = Vec::with_capacity(call.args.len());
        for (arg, &lazy) in call.args.iter().zip(&call.lazy) {
            args.push(if lazy {
                Argument::Lazy(LazyArg::new(arg, self))
            } else {
                Argument::Value(self.evaluate(arg)?)
            });
        }

        let overload = call
            .overloads
            .iter()
            .find(|overload| overload.signature().matches(&args))
            .ok_or_else(|| Error::from_parts(call.location.clone(), ErrorKind::UnsupportedTypes))?;

        let failures = overload.signature().validate(&args);
        if !failures.is_empty() {
            log::debug!(
                "Arguments of `{}` at {} rejected by validators: {failures:?}",
                call.name,
                call.location
            );
            let mut kinds = failures.into_iter().map(ErrorKind::InvalidArgument);
            if let Some(primary) = kinds.next() {
                let err = Error::from_parts(call.location.clone(), primary);
                return Err(err.with_secondary(kinds.collect()));
            }
        }

        let ctx = CallContext::new(&call.name, &call.location, self.context);
        overload.implementation().evaluate(args, &ctx)
    }
}

/// Compiled expression ready for evaluation.
///
/// An expression is produced by [`Engine::compile()`](crate::Engine::compile())
/// or [`Engine::prepare()`](crate::Engine::prepare()). It owns all its data and is
/// immutable, so it can be shared among threads and evaluated concurrently with
/// different variables.
///
/// # Examples
///
/// ```
/// use formula_eval::{Engine, Value};
/// # use std::collections::HashMap;
///
/// let engine = Engine::new();
/// let expr = engine.prepare("price * (1 + rate / 100)")?;
///
/// let mut vars = HashMap::new();
/// vars.insert("price".to_owned(), Value::from(200));
/// vars.insert("rate".to_owned(), Value::from(19));
/// assert_eq!(expr.evaluate(&vars)?, Value::from(238));
/// # Ok::<_, formula_eval::Error>(())
/// ```
#[derive(Debug)]
pub struct Expression {
    root: Node,
    context: EvaluationContext,
}

impl fmt::Display for Expression {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.root, formatter)
    }
}

impl Expression {
    pub(crate) fn new(root: Node, context: EvaluationContext) -> Self {
        Self { root, context }
    }

    /// Returns the context captured when this expression was compiled.
    pub fn context(&self) -> &EvaluationContext {
        &self.context
    }

    /// Evaluates this expression in the captured context.
    ///
    /// # Errors
    ///
    /// Returns an error if evaluation fails, e.g., because of a missing variable,
    /// unsupported argument types or a division by zero.
    pub fn evaluate<R: VariableResolver>(&self, vars: &R) -> Result<Value, Error> {
        self.evaluate_in(vars, &self.context)
    }

    /// Evaluates this expression in the specified context, which overrides the captured one.
    ///
    /// # Errors
    ///
    /// Returns an error if evaluation fails.
    pub fn evaluate_in<R: VariableResolver>(
        &self,
        vars: &R,
        context: &EvaluationContext,
    ) -> Result<Value, Error> {
        let evaluator = Evaluator::new(vars, context);
        let result = evaluator.evaluate(&self.root);
        log::trace!("Evaluated `{self}`: {result:?}");
        result
    }
}
