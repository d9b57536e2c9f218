//! Shunting-yard parser converting a token sequence into an [`AstNode`].

use crate::{
    ast::AstNode,
    error::{Error, ErrorKind},
    lexer::tokenize,
    ops::{FunctionArity, OperatorLookup, OperatorMapping},
    spans::Spanned,
    token::{Token, TokenKind},
    Features,
};


/// Parser state: operand and operator stacks. Each parsing call owns its own state.
struct Parser<'a, 'r, O: ?Sized, F: ?Sized> {
    source: &'a str,
    operators: &'r O,
    functions: &'r F,
    operands: Vec<AstNode<'a>>,
    pending: Vec<Token<'a>>,
}

impl<'a, 'r, O, F> Parser<'a, 'r, O, F>
where
    O: OperatorLookup + ?Sized,
    F: FunctionArity + ?Sized,
{
    fn new(source: &'a str, operators: &'r O, functions: &'r F) -> Self {
        Self {
            source,
            operators,
            functions,
            operands: vec![],
            pending: vec![],
        }
    }

    fn whole_source_error(&self, kind: ErrorKind) -> Error {
        kind.with_span(&Spanned::from_str(self.source, ..))
    }

    fn run(mut self, tokens: &[Token<'a>]) -> Result<AstNode<'a>, Error> {
        let mut previous: Option<Token<'a>> = None;
        for &token in tokens {
            match token.kind() {
                TokenKind::NumberLiteral | TokenKind::StringLiteral | TokenKind::Variable => {
                    self.operands.push(AstNode::leaf(token));
                }
                TokenKind::Function => self.pending.push(token),
                TokenKind::Comma => self.reduce_until_open()?,
                TokenKind::PrefixOperator
                | TokenKind::InfixOperator
                | TokenKind::PostfixOperator => self.process_operator(token)?,
                TokenKind::BraceOpen => {
                    if previous.map_or(false, |prev| prev.kind() == TokenKind::Function) {
                        let marker = token.copy_with_extra(TokenKind::FunctionParamStart);
                        self.operands.push(AstNode::leaf(marker));
                    }
                    self.pending.push(token);
                }
                TokenKind::BraceClose => self.process_brace_close(token)?,
                TokenKind::ArrayOpen => self.process_index_open(token, TokenKind::ArrayIndex)?,
                TokenKind::AssociateOpen => {
                    self.process_index_open(token, TokenKind::AssociateIndex)?;
                }
                TokenKind::ArrayClose | TokenKind::AssociateClose => {
                    self.process_index_close(token)?;
                }
                TokenKind::StructureSeparator => {
                    self.reduce_structure_separators()?;
                    self.pending.push(token);
                }
                other => return Err(ErrorKind::UnexpectedToken(other).with_span(&token)),
            }
            previous = Some(token);
        }

        while let Some(token) = self.pending.pop() {
            let node = self.create_operator_node(token)?;
            self.operands.push(node);
        }

        let root = self
            .operands
            .pop()
            .ok_or_else(|| self.whole_source_error(ErrorKind::EmptyExpression))?;
        if !self.operands.is_empty() || root.token.kind() == TokenKind::FunctionParamStart {
            return Err(self.whole_source_error(ErrorKind::TooManyOperands));
        }
        Ok(root)
    }

    fn mapping(&self, token: &Token<'a>) -> Result<&'r OperatorMapping, Error> {
        let operators = self.operators;
        let role = token.kind().operator_role();
        role.and_then(|role| operators.operator(role, token.fragment()))
            .ok_or_else(|| {
                ErrorKind::UndefinedOperator((*token.fragment()).to_owned()).with_span(token)
            })
    }

    fn process_operator(&mut self, token: Token<'a>) -> Result<(), Error> {
        let current = self.mapping(&token)?;
        // A prefix operator starts a new operand, so nothing pending can be reduced yet.
        let is_prefix = token.kind() == TokenKind::PrefixOperator;
        while !is_prefix {
            let Some(&top) = self.pending.last() else {
                break;
            };
            let should_pop = match top.kind() {
                TokenKind::StructureSeparator => true,
                kind if kind.operator_role().is_some() => {
                    let top = self.mapping(&top)?;
                    top.precedence > current.precedence
                        || (current.left_associative && top.precedence == current.precedence)
                }
                _ => false,
            };
            if !should_pop {
                break;
            }
            self.pending.pop();
            let node = self.create_operator_node(top)?;
            self.operands.push(node);
        }
        self.pending.push(token);
        Ok(())
    }

    /// Reduces pending operators until the nearest opening bracket, which is left on the stack.
    fn reduce_until_open(&mut self) -> Result<(), Error> {
        while let Some(&top) = self.pending.last() {
            if top.kind().is_opening() {
                break;
            }
            self.pending.pop();
            let node = self.create_operator_node(top)?;
            self.operands.push(node);
        }
        Ok(())
    }

    /// Reduces pending operators until the nearest opening bracket and removes the bracket.
    fn reduce_to_open(&mut self, closing: Token<'a>) -> Result<Token<'a>, Error> {
        self.reduce_until_open()?;
        self.pending
            .pop()
            .ok_or_else(|| ErrorKind::UnexpectedToken(closing.kind()).with_span(&closing))
    }

    fn reduce_structure_separators(&mut self) -> Result<(), Error> {
        while let Some(&top) = self.pending.last() {
            if top.kind() != TokenKind::StructureSeparator {
                break;
            }
            self.pending.pop();
            let node = self.create_operator_node(top)?;
            self.operands.push(node);
        }
        Ok(())
    }

    fn process_brace_close(&mut self, token: Token<'a>) -> Result<(), Error> {
        self.reduce_to_open(token)?;
        let Some(&function) = self.pending.last() else {
            return Ok(());
        };
        if function.kind() != TokenKind::Function {
            return Ok(());
        }
        self.pending.pop();

        let mut args = vec![];
        loop {
            let arg = self
                .operands
                .pop()
                .ok_or_else(|| ErrorKind::MissingOperand.with_span(&function))?;
            if arg.token.kind() == TokenKind::FunctionParamStart {
                break;
            }
            args.push(arg);
        }
        args.reverse();

        let name = *function.fragment();
        if !self.functions.has_function(name) {
            return Err(ErrorKind::UndefinedFunction(name.to_owned()).with_span(&function));
        }
        if !self.functions.accepts_arg_count(name, args.len()) {
            let kind = ErrorKind::ArgCount {
                name: name.to_owned(),
                count: args.len(),
            };
            return Err(kind.with_span(&function));
        }
        self.operands.push(AstNode::new(function, args));
        Ok(())
    }

    fn process_index_open(&mut self, token: Token<'a>, index_kind: TokenKind) -> Result<(), Error> {
        self.reduce_structure_separators()?;
        self.pending.push(token.copy_with_extra(index_kind));
        self.pending.push(token);
        Ok(())
    }

    fn process_index_close(&mut self, token: Token<'a>) -> Result<(), Error> {
        self.reduce_to_open(token)?;
        let index_op = self
            .pending
            .pop()
            .ok_or_else(|| ErrorKind::UnexpectedToken(token.kind()).with_span(&token))?;
        let node = self.create_operator_node(index_op)?;
        self.operands.push(node);
        Ok(())
    }

    fn pop_operand(&mut self, error: ErrorKind, token: &Token<'a>) -> Result<AstNode<'a>, Error> {
        match self.operands.pop() {
            Some(node) if node.token.kind() != TokenKind::FunctionParamStart => Ok(node),
            Some(marker) => {
                self.operands.push(marker);
                Err(error.with_span(token))
            }
            None => Err(error.with_span(token)),
        }
    }

    fn create_operator_node(&mut self, token: Token<'a>) -> Result<AstNode<'a>, Error> {
        let is_binary = match token.kind() {
            TokenKind::PrefixOperator | TokenKind::PostfixOperator => false,
            TokenKind::InfixOperator
            | TokenKind::StructureSeparator
            | TokenKind::ArrayIndex
            | TokenKind::AssociateIndex => true,
            other => return Err(ErrorKind::UnexpectedToken(other).with_span(&token)),
        };

        let operand = self.pop_operand(ErrorKind::MissingOperand, &token)?;
        if !is_binary {
            return Ok(AstNode::new(token, vec![operand]));
        }
        let first = self.pop_operand(ErrorKind::MissingSecondOperand, &token)?;
        Ok(AstNode::new(token, vec![first, operand]))
    }
}

/// Builds an abstract syntax tree from `tokens` produced for `source`.
///
/// # Errors
///
/// Returns an error if the tokens do not form a valid expression, or if a function call
/// does not match the function registry.
pub fn parse_tokens<'a, O, F>(
    source: &'a str,
    tokens: &[Token<'a>],
    operators: &O,
    functions: &F,
) -> Result<AstNode<'a>, Error>
where
    O: OperatorLookup + ?Sized,
    F: FunctionArity + ?Sized,
{
    Parser::new(source, operators, functions).run(tokens)
}

/// Tokenizes and parses `source`.
///
/// # Errors
///
/// Returns lexer or parser errors.
///
/// # Examples
///
/// ```
/// use formula_parser::{parse, Features, FunctionArity, OperatorTable, TokenKind};
///
/// struct Max;
///
/// impl FunctionArity for Max {
///     fn has_function(&self, name: &str) -> bool {
///         name.eq_ignore_ascii_case("max")
///     }
///
///     fn accepts_arg_count(&self, name: &str, arg_count: usize) -> bool {
///         self.has_function(name) && arg_count > 0
///     }
/// }
///
/// let ast = parse("max(1, 2) * 3", &OperatorTable::standard(), &Max, Features::all())?;
/// assert_eq!(*ast.token.fragment(), "*");
/// assert_eq!(ast.children[0].token.kind(), TokenKind::Function);
/// assert_eq!(ast.children[0].children.len(), 2);
/// assert_eq!(ast.to_string(), "(max(1, 2) * 3)");
/// # Ok::<_, formula_parser::Error>(())
/// ```
pub fn parse<'a, O, F>(
    source: &'a str,
    operators: &O,
    functions: &F,
    features: Features,
) -> Result<AstNode<'a>, Error>
where
    O: OperatorLookup + ?Sized,
    F: FunctionArity + ?Sized,
{
    let tokens = tokenize(source, operators, features)?;
    parse_tokens(source, &tokens, operators, functions)
}
