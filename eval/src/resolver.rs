//! Variable resolution.

use std::{collections::HashMap as StdHashMap, hash::BuildHasher};

use hashbrown::HashMap;

use crate::values::Value;
use formula_parser::Layered;

/// Source of variable values for an evaluation.
///
/// Resolvers are queried each time a variable is read. Resolvers compose via
/// [`Self::and_then()`]: if the primary resolver does not know a variable, the fallback one
/// is queried.
///
/// # Examples
///
/// ```
/// # use std::collections::HashMap;
/// use formula_eval::{Value, VariableResolver};
///
/// let mut vars = HashMap::new();
/// vars.insert("x".to_owned(), Value::from(1));
/// let vars = vars.and_then(|name: &str| (name == "y").then(|| Value::from(2)));
///
/// assert_eq!(vars.get("x"), Some(Value::from(1)));
/// assert_eq!(vars.get("y"), Some(Value::from(2)));
/// assert_eq!(vars.get("z"), None);
/// ```
pub trait VariableResolver {
    /// Returns the value of the variable with the specified name, or `None` if the variable
    /// is unknown.
    fn get(&self, name: &str) -> Option<Value>;

    /// Layers this resolver on top of a `fallback`.
    fn and_then<F>(self, fallback: F) -> Layered<Self, F>
    where
        Self: Sized,
        F: VariableResolver,
    {
        Layered::new(self, fallback)
    }
}

impl<F> VariableResolver for F
where
    F: Fn(&str) -> Option<Value>,
{
    fn get(&self, name: &str) -> Option<Value> {
        self(name)
    }
}

/// Resolver without any variables.
impl VariableResolver for () {
    fn get(&self, _name: &str) -> Option<Value> {
        None
    }
}

impl<S: BuildHasher> VariableResolver for StdHashMap<String, Value, S> {
    fn get(&self, name: &str) -> Option<Value> {
        StdHashMap::get(self, name).cloned()
    }
}

impl<S: BuildHasher> VariableResolver for HashMap<String, Value, S> {
    fn get(&self, name: &str) -> Option<Value> {
        HashMap::get(self, name).cloned()
    }
}

impl<P, F> VariableResolver for Layered<P, F>
where
    P: VariableResolver,
    F: VariableResolver,
{
    fn get(&self, name: &str) -> Option<Value> {
        self.primary.get(name).or_else(|| self.fallback.get(name))
    }
}
