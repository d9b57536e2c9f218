//! Compilation of syntax trees into evaluation trees.

use bigdecimal::BigDecimal;
use hashbrown::HashMap;
use num_bigint::BigInt;

use crate::{
    arith::MAX_SCALE,
    error::{Error, ErrorKind},
    exec::{CallNode, Node},
    fns::{ARRAY_INDEX, ASSOCIATE_INDEX},
    registry::FunctionLookup,
    values::Value,
};
use formula_parser::{AstNode, OperatorLookup, Token, TokenKind};

/// Binds names in a syntax tree to constants, variables and function overloads.
pub(crate) struct Compiler<'e> {
    operators: &'e dyn OperatorLookup,
    functions: &'e dyn FunctionLookup,
    /// Constants keyed by their uppercase names.
    constants: &'e HashMap<String, Value>,
}

impl<'e> Compiler<'e> {
    pub(crate) fn new(
        operators: &'e dyn OperatorLookup,
        functions: &'e dyn FunctionLookup,
        constants: &'e HashMap<String, Value>,
    ) -> Self {
        Self {
            operators,
            functions,
            constants,
        }
    }

    fn error(token: &Token<'_>, kind: ErrorKind) -> Error {
        Error::from_parts(token.to_location(), kind)
    }

    pub(crate) fn compile(&self, node: &AstNode<'_>) -> Result<Node, Error> {
        let token = &node.token;
        let fragment = *token.fragment();
        match token.kind() {
            TokenKind::NumberLiteral => parse_number(fragment)
                .map(|number| Node::Literal(Value::Number(number)))
                .ok_or_else(|| Self::error(token, ErrorKind::InvalidLiteral(fragment.to_owned()))),

            TokenKind::StringLiteral => token
                .string_value()
                .map(|s| Node::Literal(Value::String(s)))
                .ok_or_else(|| Self::error(token, ErrorKind::InvalidLiteral(fragment.to_owned()))),

            TokenKind::Variable => Ok(match self.constants.get(&fragment.to_uppercase()) {
                Some(value) => Node::Literal(value.clone()),
                None => Node::Variable {
                    name: fragment.to_owned(),
                    location: token.to_location(),
                },
            }),

            kind @ (TokenKind::PrefixOperator
            | TokenKind::InfixOperator
            | TokenKind::PostfixOperator) => {
                let undefined = || {
                    kind.operator_role()
                        .map_or(ErrorKind::UnexpectedNode(kind), |role| {
                            ErrorKind::UndefinedOperator {
                                role,
                                text: fragment.to_owned(),
                            }
                        })
                };
                let mapping = kind
                    .operator_role()
                    .and_then(|role| self.operators.operator(role, fragment))
                    .ok_or_else(|| Self::error(token, undefined()))?;
                self.compile_call(node, &mapping.implementation, undefined)
            }

            TokenKind::Function => self.compile_call(node, fragment, || {
                ErrorKind::UndefinedFunction {
                    name: fragment.to_owned(),
                    arg_count: node.children.len(),
                }
            }),
            TokenKind::ArrayIndex => self.compile_call(node, ARRAY_INDEX, || {
                ErrorKind::UndefinedFunction {
                    name: ARRAY_INDEX.to_owned(),
                    arg_count: node.children.len(),
                }
            }),
            TokenKind::AssociateIndex => self.compile_call(node, ASSOCIATE_INDEX, || {
                ErrorKind::UndefinedFunction {
                    name: ASSOCIATE_INDEX.to_owned(),
                    arg_count: node.children.len(),
                }
            }),

            TokenKind::StructureSeparator => {
                let [object, field] = node.children.as_slice() else {
                    return Err(Self::error(token, ErrorKind::UnexpectedNode(token.kind())));
                };
                if field.token.kind() != TokenKind::Variable || !field.children.is_empty() {
                    let kind = ErrorKind::InvalidStructureField(field.to_string());
                    return Err(Self::error(&field.token, kind));
                }
                Ok(Node::StructureAccess {
                    object: Box::new(self.compile(object)?),
                    field: (*field.token.fragment()).to_owned(),
                    location: field.token.to_location(),
                })
            }

            other => Err(Self::error(token, ErrorKind::UnexpectedNode(other))),
        }
    }

    fn compile_call(
        &self,
        node: &AstNode<'_>,
        name: &str,
        undefined: impl FnOnce() -> ErrorKind,
    ) -> Result<Node, Error> {
        let arg_count = node.children.len();
        let overloads = self
            .functions
            .find(name, arg_count)
            .filter(|overloads| !overloads.is_empty())
            .ok_or_else(|| Self::error(&node.token, undefined()))?;

        let signature = overloads[0].signature();
        let lazy = (0..arg_count)
            .map(|i| signature.param(i).map_or(false, |param| param.is_lazy()))
            .collect();
        let args = node
            .children
            .iter()
            .map(|child| self.compile(child))
            .collect::<Result<_, _>>()?;

        Ok(Node::Call(CallNode {
            name: name.to_owned(),
            overloads,
            args,
            lazy,
            location: node.token.to_location(),
        }))
    }
}

/// Parses a number literal: a decimal with an optional exponent, or a hex integer.
/// Literals with the scale exceeding [`MAX_SCALE`] by absolute value are rejected.
fn parse_number(literal: &str) -> Option<BigDecimal> {
    let hex_digits = literal
        .strip_prefix("0x")
        .or_else(|| literal.strip_prefix("0X"));
    if let Some(digits) = hex_digits {
        let int = BigInt::parse_bytes(digits.as_bytes(), 16)?;
        return Some(BigDecimal::new(int, 0));
    }

    let (mantissa, exponent) = match literal.find(|ch| ch == 'e' || ch == 'E') {
        Some(pos) => literal.split_at(pos),
        None => (literal, ""),
    };
    // Normalize `.5` and `5.` forms.
    let mut normalized = String::with_capacity(literal.len() + 2);
    if mantissa.starts_with('.') {
        normalized.push('0');
    }
    normalized.push_str(mantissa);
    if mantissa.ends_with('.') {
        normalized.push('0');
    }
    normalized.push_str(exponent);
    let number: BigDecimal = normalized.parse().ok()?;
    let (_, scale) = number.as_bigint_and_exponent();
    (scale.abs() <= MAX_SCALE).then_some(number)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::FunctionTable;
    use formula_parser::{parse, Features, OperatorTable};

    fn dec(s: &str) -> BigDecimal {
        s.parse().unwrap()
    }

    #[test]
    fn parsing_number_literals() {
        assert_eq!(parse_number("42").unwrap(), dec("42"));
        assert_eq!(parse_number(".5").unwrap(), dec("0.5"));
        assert_eq!(parse_number("5.").unwrap(), dec("5"));
        assert_eq!(parse_number("1.25e-3").unwrap(), dec("0.00125"));
        assert_eq!(parse_number("2.E2").unwrap(), dec("200"));
        assert_eq!(parse_number("0x1F").unwrap(), dec("31"));
        assert_eq!(
            parse_number("0xFFFFFFFFFFFFFFFFFFFF").unwrap(),
            dec("1208925819614629174706175")
        );

        assert_eq!(parse_number("1e10000").unwrap(), dec("1e10000"));
        assert_eq!(parse_number("1e-10000").unwrap(), dec("1e-10000"));
        assert!(parse_number("1e10001").is_none());
        assert!(parse_number("1e1000000000").is_none());
        assert!(parse_number("2.5E-1000000000").is_none());
    }

    fn compile(source: &str, constants: &HashMap<String, Value>) -> Result<Node, Error> {
        let operators = OperatorTable::standard();
        let functions = FunctionTable::standard();
        let ast = parse(source, &operators, &functions, Features::all())?;
        Compiler::new(&operators, &functions, constants).compile(&ast)
    }

    #[test]
    fn binding_constants_and_variables() {
        let mut constants = HashMap::new();
        constants.insert("ANSWER".to_owned(), Value::from(42));

        let node = compile("answer + x", &constants).unwrap();
        assert_eq!(node.to_string(), "infix +(42, x)");
        let node = compile("if(x > 0, \"pos\", y)", &constants).unwrap();
        assert_eq!(node.to_string(), r#"if(infix >(x, 0), lazy "pos", lazy y)"#);
    }

    #[test]
    fn accessors_use_reserved_names() {
        let node = compile(r#"a[0] + b{"key"}.c"#, &HashMap::new()).unwrap();
        assert_eq!(node.to_string(), r#"infix +([](a, 0), ({}(b, "key")).c)"#);
    }

    #[test]
    fn undefined_operator_implementation() {
        let operators = OperatorTable::standard().with(
            formula_parser::OperatorRole::Infix,
            "<>",
            formula_parser::OperatorMapping::new(10, "infix <>"),
        );
        let functions = FunctionTable::standard();
        let ast = parse("1 <> 2", &operators, &functions, Features::all()).unwrap();
        let constants = HashMap::new();
        let err = Compiler::new(&operators, &functions, &constants)
            .compile(&ast)
            .unwrap_err();

        assert_eq!(err.to_string(), "1:3: could not find infix operator '<>'");
        assert_eq!(err.text(), "<>");
    }

    #[test]
    fn invalid_structure_field() {
        let err = compile("a.(b + 1)", &HashMap::new()).unwrap_err();
        assert_matches!(err.kind(), ErrorKind::InvalidStructureField(_));
    }
}
