//! Expression engine tying the parser, registries and evaluation together.

use hashbrown::HashMap;
use once_cell::sync::Lazy;

use core::fmt;
use std::sync::Arc;

use crate::{
    arith::decimal_from_chunks,
    compiler::Compiler,
    context::EvaluationContext,
    error::Error,
    exec::Expression,
    registry::{FunctionLookup, FunctionTable},
    resolver::VariableResolver,
    values::Value,
};
use formula_parser::{
    parse, tokenize, AstNode, Features, Layered, OperatorLookup, OperatorTable, Token,
};

type SharedOperators = Arc<dyn OperatorLookup + Send + Sync>;
type SharedFunctions = Arc<dyn FunctionLookup + Send + Sync>;

static STANDARD_OPERATORS: Lazy<SharedOperators> =
    Lazy::new(|| Arc::new(OperatorTable::standard()));
static STANDARD_FUNCTIONS: Lazy<SharedFunctions> =
    Lazy::new(|| Arc::new(FunctionTable::standard()));

/// Standard constants. Names are uppercase; constants are matched case-insensitively.
fn standard_constants() -> HashMap<String, Value> {
    let pi = decimal_from_chunks(
        314_159_265_358_979_323_846_264_338_327_950_288,
        419_716_939_937_510_582_097_494_459_230_781_640,
        71,
    );
    let e = decimal_from_chunks(
        271_828_182_845_904_523_536_028_747_135_266_249,
        775_724_709_369_995_957_496_696_762_772_407_663,
        71,
    );
    [
        ("TRUE", Value::Bool(true)),
        ("FALSE", Value::Bool(false)),
        ("NULL", Value::Null),
        ("PI", Value::Number(pi)),
        ("E", Value::Number(e)),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_owned(), value))
    .collect()
}

/// Engine compiling source expressions into [`Expression`]s.
///
/// An engine holds operator and function registries, constants, parser [`Features`]
/// and the default [`EvaluationContext`]. Host registries are layered on top of the standard
/// ones: a lookup miss in a host registry defers to the previously configured registries.
///
/// # Examples
///
/// ```
/// use formula_eval::{
///     fns::ArithmeticOp, Engine, FunctionTable, Param, Signature, Value,
/// };
/// use formula_parser::{precedence, OperatorMapping, OperatorRole, OperatorTable};
///
/// // Define `MOD` as an alias for `%`, and a function for the integer division.
/// let operators = OperatorTable::new().with(
///     OperatorRole::Infix,
///     "MOD",
///     OperatorMapping::new(precedence::MULTIPLICATIVE, "infix %"),
/// );
/// let functions = FunctionTable::new().with(
///     "QUOTIENT",
///     Signature::new([Param::number(), Param::number()]),
///     ArithmeticOp::Div,
/// );
/// let engine = Engine::new()
///     .with_operators(operators)
///     .with_functions(functions)
///     .with_constant("answer", 42);
///
/// let expr = engine.prepare("answer mod 5 + quotient(1, 4)")?;
/// assert_eq!(expr.evaluate(&())?, Value::Number("2.25".parse()?));
/// # Ok::<_, anyhow::Error>(())
/// ```
#[derive(Clone)]
pub struct Engine {
    operators: SharedOperators,
    functions: SharedFunctions,
    constants: HashMap<String, Value>,
    features: Features,
    context: EvaluationContext,
}

impl fmt::Debug for Engine {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Engine")
            .field("constants", &self.constants)
            .field("features", &self.features)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Creates an engine with the standard operators, functions and constants.
    pub fn new() -> Self {
        Self {
            operators: Arc::clone(&*STANDARD_OPERATORS),
            functions: Arc::clone(&*STANDARD_FUNCTIONS),
            constants: standard_constants(),
            features: Features::default(),
            context: EvaluationContext::default(),
        }
    }

    /// Layers `operators` on top of the operators configured in this engine.
    #[must_use]
    pub fn with_operators<O>(mut self, operators: O) -> Self
    where
        O: OperatorLookup + Send + Sync + 'static,
    {
        self.operators = Arc::new(Layered::new(operators, Arc::clone(&self.operators)));
        self
    }

    /// Layers `functions` on top of the functions configured in this engine.
    #[must_use]
    pub fn with_functions<F>(mut self, functions: F) -> Self
    where
        F: FunctionLookup + Send + Sync + 'static,
    {
        self.functions = Arc::new(Layered::new(functions, Arc::clone(&self.functions)));
        self
    }

    /// Adds a constant. Constants are resolved when compiling and take precedence over
    /// variables with the same name.
    #[must_use]
    pub fn with_constant(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.constants.insert(name.to_uppercase(), value.into());
        self
    }

    /// Sets parser features.
    #[must_use]
    pub fn with_features(mut self, features: Features) -> Self {
        self.features = features;
        self
    }

    /// Sets the context captured by compiled expressions.
    #[must_use]
    pub fn with_context(mut self, context: EvaluationContext) -> Self {
        self.context = context;
        self
    }

    /// Returns parser features.
    pub fn features(&self) -> Features {
        self.features
    }

    /// Returns the evaluation context captured by compiled expressions.
    pub fn context(&self) -> &EvaluationContext {
        &self.context
    }

    /// Returns the value of a constant.
    pub fn constant(&self, name: &str) -> Option<&Value> {
        self.constants.get(&name.to_uppercase())
    }

    /// Splits `source` into tokens.
    pub fn tokenize<'a>(&self, source: &'a str) -> Result<Vec<Token<'a>>, formula_parser::Error> {
        let tokens = tokenize(source, self.operators.as_ref(), self.features)?;
        log::trace!("Split `{source}` into {} tokens", tokens.len());
        Ok(tokens)
    }

    /// Parses `source` into a syntax tree.
    pub fn parse<'a>(&self, source: &'a str) -> Result<AstNode<'a>, formula_parser::Error> {
        parse(
            source,
            self.operators.as_ref(),
            self.functions.as_ref(),
            self.features,
        )
    }

    /// Compiles a syntax tree into an expression.
    pub fn compile(&self, ast: &AstNode<'_>) -> Result<Expression, Error> {
        let compiler = Compiler::new(
            self.operators.as_ref(),
            self.functions.as_ref(),
            &self.constants,
        );
        let root = compiler.compile(ast)?;
        let expr = Expression::new(root, self.context);
        log::trace!("Compiled `{ast}` into `{expr}`");
        Ok(expr)
    }

    /// Parses and compiles `source`.
    pub fn prepare(&self, source: &str) -> Result<Expression, Error> {
        let ast = self.parse(source)?;
        self.compile(&ast)
    }

    /// Parses, compiles and evaluates `source` in one go.
    pub fn evaluate<R: VariableResolver>(&self, source: &str, vars: &R) -> Result<Value, Error> {
        self.prepare(source)?.evaluate(vars)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn standard_constants_are_case_insensitive() {
        let engine = Engine::new();
        assert_eq!(engine.evaluate("true", &()).unwrap(), Value::Bool(true));
        assert_eq!(engine.evaluate("Null", &()).unwrap(), Value::Null);

        let pi = engine.constant("pi").unwrap().as_number().unwrap();
        assert!(pi.to_string().starts_with("3.14159265358979323846264338327950288419716"));
        assert_eq!(pi.digits(), 72);
    }

    #[test]
    fn constants_shadow_variables() {
        let engine = Engine::new().with_constant("rate", 5);
        let vars = |name: &str| (name == "rate").then(|| Value::from(10));
        assert_eq!(engine.evaluate("rate * 2", &vars).unwrap(), Value::from(10));
    }

    #[test]
    fn parse_errors_are_converted() {
        let err = Engine::new().prepare("1 + (2").unwrap_err();
        assert_matches!(err.kind(), ErrorKind::Syntax(_));

        let err = Engine::new().prepare("round()").unwrap_err();
        assert_matches!(err.kind(), ErrorKind::Syntax(_));
        let message = err.to_string();
        assert!(message.contains("round") && message.contains('0'), "{message}");
    }

    #[test]
    fn features_are_respected() {
        let engine = Engine::new().with_features(Features::all() - Features::ARRAYS);
        assert!(engine.tokenize("a[0]").is_err());
        assert_eq!(engine.tokenize("a.b").unwrap().len(), 3);
    }
}
