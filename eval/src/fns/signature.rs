//! Function signatures: parameter types, laziness and validators.

use core::fmt;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use num_traits::Signed;

use crate::{
    arith::is_integer,
    fns::Argument,
    values::{Value, ValueType},
};

/// Expected type of a function parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// Any value is accepted.
    Any,
    /// Only values of the specified type are accepted.
    Is(ValueType),
}

impl ParamType {
    /// Checks whether a value of the specified type is accepted.
    pub fn accepts(self, ty: ValueType) -> bool {
        match self {
            Self::Any => true,
            Self::Is(expected) => expected == ty,
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => formatter.write_str("ANY"),
            Self::Is(ty) => fmt::Display::fmt(ty, formatter),
        }
    }
}

type ValidatorFn = dyn Fn(&Value) -> Result<(), String> + Send + Sync;

/// Validator of an argument value. On failure, the validator returns a human-readable message.
///
/// # Examples
///
/// ```
/// use formula_eval::{Validator, Value};
///
/// let positive = Validator::positive();
/// assert!(positive.validate(&Value::from(1)).is_ok());
/// assert_eq!(
///     positive.validate(&Value::from(-1)).unwrap_err(),
///     "value is not > 0: -1"
/// );
/// ```
#[derive(Clone)]
pub struct Validator {
    inner: Arc<ValidatorFn>,
}

impl fmt::Debug for Validator {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_tuple("Validator").finish()
    }
}

impl Validator {
    /// Creates a validator from the provided function.
    pub fn new<F>(validate: F) -> Self
    where
        F: Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(validate),
        }
    }

    /// Validates the provided value.
    ///
    /// # Errors
    ///
    /// Returns the failure message if the value is invalid.
    pub fn validate(&self, value: &Value) -> Result<(), String> {
        (self.inner)(value)
    }

    /// Requires the value to be a number strictly greater than zero.
    pub fn positive() -> Self {
        Self::numeric("> 0", |x| x.is_positive())
    }

    /// Requires the value to be a number greater than or equal to zero.
    pub fn non_negative() -> Self {
        Self::numeric(">= 0", |x| !x.is_negative())
    }

    /// Requires the value to be a number without a fractional part.
    pub fn integer() -> Self {
        Self::new(|value| match value {
            Value::Number(x) if !is_integer(x) => Err(format!("value is not an integer: {x}")),
            _ => Ok(()),
        })
    }

    // Non-number values pass numeric validators; type checks are the job of `ParamType`.
    fn numeric(condition: &'static str, check: fn(&BigDecimal) -> bool) -> Self {
        Self::new(move |value| match value {
            Value::Number(x) if !check(x) => Err(format!("value is not {condition}: {x}")),
            _ => Ok(()),
        })
    }
}

/// Function parameter: its type, laziness and validators.
#[derive(Debug, Clone)]
pub struct Param {
    ty: ParamType,
    lazy: bool,
    validators: Vec<Validator>,
}

impl Param {
    /// Creates a parameter accepting any value.
    pub fn any() -> Self {
        Self::new(ParamType::Any)
    }

    /// Creates a parameter accepting values of the specified type.
    pub fn of(ty: ValueType) -> Self {
        Self::new(ParamType::Is(ty))
    }

    /// Creates a numeric parameter.
    pub fn number() -> Self {
        Self::of(ValueType::Number)
    }

    fn new(ty: ParamType) -> Self {
        Self {
            ty,
            lazy: false,
            validators: vec![],
        }
    }

    /// Marks this parameter as lazy. Lazy arguments are passed to the function implementation
    /// unevaluated (as [`LazyArg`](crate::fns::LazyArg)s); they match any type during overload
    /// selection and are not validated.
    #[must_use]
    pub fn lazy(mut self) -> Self {
        self.lazy = true;
        self
    }

    /// Adds a validator to this parameter.
    #[must_use]
    pub fn validated(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    /// Returns the type of this parameter.
    pub fn param_type(&self) -> ParamType {
        self.ty
    }

    /// Checks whether this parameter is lazy.
    pub fn is_lazy(&self) -> bool {
        self.lazy
    }

    /// Returns validators for this parameter.
    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }

    fn matches(&self, arg: &Argument<'_>) -> bool {
        match arg {
            Argument::Lazy(_) => true,
            Argument::Value(value) => self.ty.accepts(value.value_type()),
        }
    }
}

/// Function signature: fixed parameters optionally followed by a variadic one.
///
/// A variadic signature accepts any number of arguments greater than the number
/// of fixed parameters; all extra arguments share the variadic parameter.
///
/// # Examples
///
/// ```
/// use formula_eval::{Param, Signature, ValueType};
///
/// let signature = Signature::new([Param::of(ValueType::String)]).with_variadic(Param::number());
/// assert!(!signature.accepts_arg_count(1));
/// assert!(signature.accepts_arg_count(2));
/// assert!(signature.accepts_arg_count(10));
/// assert!(signature.param(5).is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Signature {
    params: Vec<Param>,
    variadic: Option<Param>,
}

impl Signature {
    /// Creates a signature with the specified fixed parameters.
    pub fn new(params: impl IntoIterator<Item = Param>) -> Self {
        Self {
            params: params.into_iter().collect(),
            variadic: None,
        }
    }

    /// Adds a variadic parameter to this signature.
    #[must_use]
    pub fn with_variadic(mut self, param: Param) -> Self {
        self.variadic = Some(param);
        self
    }

    /// Returns fixed parameters.
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Returns the variadic parameter, if any.
    pub fn variadic(&self) -> Option<&Param> {
        self.variadic.as_ref()
    }

    /// Checks whether this signature accepts the specified number of arguments.
    pub fn accepts_arg_count(&self, arg_count: usize) -> bool {
        if self.variadic.is_some() {
            arg_count > self.params.len()
        } else {
            arg_count == self.params.len()
        }
    }

    /// Returns the parameter at the specified position.
    pub fn param(&self, index: usize) -> Option<&Param> {
        self.params.get(index).or(self.variadic.as_ref())
    }

    /// Checks whether argument types match this signature.
    pub(crate) fn matches(&self, args: &[Argument<'_>]) -> bool {
        self.accepts_arg_count(args.len())
            && args
                .iter()
                .enumerate()
                .all(|(i, arg)| self.param(i).map_or(false, |param| param.matches(arg)))
    }

    /// Runs validators on eagerly evaluated arguments and collects failure messages.
    pub(crate) fn validate(&self, args: &[Argument<'_>]) -> Vec<String> {
        let mut failures = vec![];
        for (i, arg) in args.iter().enumerate() {
            let (Some(param), Argument::Value(value)) = (self.param(i), arg) else {
                continue;
            };
            let errors = param
                .validators
                .iter()
                .filter_map(|validator| validator.validate(value).err());
            failures.extend(errors);
        }
        failures
    }
}
