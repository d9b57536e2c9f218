//! Function registry: named overloads of native functions.

use hashbrown::HashMap;

use core::fmt;
use std::sync::Arc;

use crate::fns::{NativeFn, Signature};
use formula_parser::{FunctionArity, Layered};

/// Single overload of a function: a signature together with the implementation.
pub struct Overload {
    signature: Signature,
    implementation: Arc<dyn NativeFn>,
}

impl fmt::Debug for Overload {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Overload")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

impl Overload {
    /// Creates an overload.
    pub fn new(signature: Signature, implementation: impl NativeFn + 'static) -> Self {
        Self {
            signature,
            implementation: Arc::new(implementation),
        }
    }

    /// Returns the signature of this overload.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Returns the implementation of this overload.
    pub fn implementation(&self) -> &dyn NativeFn {
        self.implementation.as_ref()
    }
}

/// Ordered overloads of a function accepting a certain number of arguments.
pub type OverloadSet = Vec<Arc<Overload>>;

/// Lookup of function overloads by name and argument count.
pub trait FunctionLookup: FunctionArity {
    /// Finds overloads of the function with the specified name accepting `arg_count` arguments.
    /// Returns `None` if there are no such overloads.
    fn find(&self, name: &str, arg_count: usize) -> Option<OverloadSet>;
}

/// Table of functions. Names are case-insensitive.
///
/// # Examples
///
/// ```
/// use formula_eval::{fns::ArithmeticOp, FunctionLookup, FunctionTable, Param, Signature};
/// use formula_parser::FunctionArity;
///
/// let mut table = FunctionTable::new();
/// let signature = Signature::new([Param::number(), Param::number()]);
/// table.define("plus", signature, ArithmeticOp::Add);
///
/// assert!(table.has_function("PLUS"));
/// assert_eq!(table.find("Plus", 2).unwrap().len(), 1);
/// assert!(table.find("plus", 3).is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct FunctionTable {
    functions: HashMap<String, OverloadSet>,
}

impl FunctionTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines a new overload for the function with the specified name. Overloads are tried
    /// in the definition order.
    pub fn define(
        &mut self,
        name: &str,
        signature: Signature,
        implementation: impl NativeFn + 'static,
    ) -> &mut Self {
        let overload = Arc::new(Overload::new(signature, implementation));
        self.functions
            .entry(name.to_uppercase())
            .or_default()
            .push(overload);
        self
    }

    /// Defines a new overload. This is a builder-style version of [`Self::define()`].
    #[must_use]
    pub fn with(
        mut self,
        name: &str,
        signature: Signature,
        implementation: impl NativeFn + 'static,
    ) -> Self {
        self.define(name, signature, implementation);
        self
    }

    /// Iterates over function names and their overloads.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Arc<Overload>])> + '_ {
        self.functions
            .iter()
            .map(|(name, overloads)| (name.as_str(), overloads.as_slice()))
    }
}

impl FunctionArity for FunctionTable {
    fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(&name.to_uppercase())
    }

    fn accepts_arg_count(&self, name: &str, arg_count: usize) -> bool {
        self.functions
            .get(&name.to_uppercase())
            .map_or(false, |overloads| {
                overloads
                    .iter()
                    .any(|overload| overload.signature.accepts_arg_count(arg_count))
            })
    }
}

impl FunctionLookup for FunctionTable {
    fn find(&self, name: &str, arg_count: usize) -> Option<OverloadSet> {
        let overloads: OverloadSet = self
            .functions
            .get(&name.to_uppercase())?
            .iter()
            .filter(|overload| overload.signature.accepts_arg_count(arg_count))
            .cloned()
            .collect();
        if overloads.is_empty() {
            None
        } else {
            Some(overloads)
        }
    }
}

impl<P: FunctionLookup, F: FunctionLookup> FunctionLookup for Layered<P, F> {
    fn find(&self, name: &str, arg_count: usize) -> Option<OverloadSet> {
        self.primary
            .find(name, arg_count)
            .or_else(|| self.fallback.find(name, arg_count))
    }
}

impl<T: FunctionLookup + ?Sized> FunctionLookup for &T {
    fn find(&self, name: &str, arg_count: usize) -> Option<OverloadSet> {
        (**self).find(name, arg_count)
    }
}

impl<T: FunctionLookup + ?Sized> FunctionLookup for Arc<T> {
    fn find(&self, name: &str, arg_count: usize) -> Option<OverloadSet> {
        (**self).find(name, arg_count)
    }
}
