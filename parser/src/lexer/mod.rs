//! Lexer turning expression source into a sequence of [`Token`]s.
//!
//! Character-level scanners for numbers, identifiers and whitespace are `nom` combinators;
//! the rest of the lexer is a loop keeping track of the previous token (which decides
//! operator roles) and of the open brackets.

use nom::{
    branch::alt,
    bytes::complete::{tag_no_case, take_while},
    character::complete::{char as tag_char, digit0, digit1, hex_digit1, one_of, satisfy},
    combinator::{opt, recognize},
    sequence::{pair, tuple},
    InputTake, Slice,
};

use crate::{
    error::{Bracket, Error, ErrorKind},
    ops::{OperatorLookup, OperatorRole},
    spans::{with_span, InputSpan, NomResult, Spanned},
    token::{escaped_char, Token, TokenKind},
    Features,
};


fn is_identifier_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

fn is_identifier_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

fn whitespace(input: InputSpan<'_>) -> NomResult<'_, InputSpan<'_>> {
    take_while(char::is_whitespace)(input)
}

fn identifier(input: InputSpan<'_>) -> NomResult<'_, InputSpan<'_>> {
    recognize(pair(
        satisfy(is_identifier_start),
        take_while(is_identifier_char),
    ))(input)
}

fn hex_prefix(input: InputSpan<'_>) -> NomResult<'_, InputSpan<'_>> {
    tag_no_case("0x")(input)
}

fn hex_literal(input: InputSpan<'_>) -> NomResult<'_, InputSpan<'_>> {
    recognize(pair(hex_prefix, hex_digit1))(input)
}

/// Mantissa of a decimal literal: `1`, `1.`, `1.5` or `.5`.
fn mantissa(input: InputSpan<'_>) -> NomResult<'_, InputSpan<'_>> {
    alt((
        recognize(pair(digit1, opt(pair(tag_char('.'), digit0)))),
        recognize(pair(tag_char('.'), digit1)),
    ))(input)
}

fn exponent(input: InputSpan<'_>) -> NomResult<'_, InputSpan<'_>> {
    recognize(tuple((one_of("eE"), opt(one_of("+-")), digit1)))(input)
}

fn decimal_literal(input: InputSpan<'_>) -> NomResult<'_, InputSpan<'_>> {
    recognize(pair(mantissa, opt(exponent)))(input)
}

/// Can the token of the specified kind be followed by `[`, `{` or `.`?
fn accepts_accessor(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Variable
            | TokenKind::StringLiteral
            | TokenKind::BraceClose
            | TokenKind::ArrayClose
            | TokenKind::AssociateClose
    )
}

/// Can the token of the specified kind be followed by `]` or `}`?
fn accepts_closing_bracket(kind: TokenKind) -> bool {
    !matches!(
        kind,
        TokenKind::BraceOpen
            | TokenKind::ArrayOpen
            | TokenKind::AssociateOpen
            | TokenKind::Function
            | TokenKind::Comma
            | TokenKind::PrefixOperator
            | TokenKind::InfixOperator
    )
}

struct Lexer<'a, 'r, O: ?Sized> {
    rest: InputSpan<'a>,
    operators: &'r O,
    features: Features,
    tokens: Vec<Token<'a>>,
    // Currently open brackets, innermost last.
    open_brackets: Vec<(Bracket, Token<'a>)>,
}

impl<'a, 'r, O: OperatorLookup + ?Sized> Lexer<'a, 'r, O> {
    fn new(source: &'a str, operators: &'r O, features: Features) -> Self {
        Self {
            rest: InputSpan::new(source),
            operators,
            features,
            tokens: vec![],
            open_brackets: vec![],
        }
    }

    fn previous_kind(&self) -> Option<TokenKind> {
        self.tokens.last().map(Token::kind)
    }

    fn prefix_allowed(&self) -> bool {
        self.previous_kind().map_or(true, |kind| {
            kind.is_opening()
                || matches!(
                    kind,
                    TokenKind::InfixOperator | TokenKind::Comma | TokenKind::PrefixOperator
                )
        })
    }

    fn postfix_allowed(&self) -> bool {
        self.previous_kind().map_or(false, TokenKind::ends_operand)
    }

    fn infix_allowed(&self) -> bool {
        self.previous_kind().map_or(false, |kind| {
            kind.ends_operand() || kind == TokenKind::PostfixOperator
        })
    }

    fn has_operator_starting_with(&self, text: &str) -> bool {
        (self.prefix_allowed() && self.operators.has_prefix_starting_with(text))
            || (self.postfix_allowed() && self.operators.has_postfix_starting_with(text))
            || self.operators.has_infix_starting_with(text)
    }

    fn operator_role(&self, text: &str) -> Option<OperatorRole> {
        if self.prefix_allowed() && self.operators.prefix_operator(text).is_some() {
            Some(OperatorRole::Prefix)
        } else if self.postfix_allowed() && self.operators.postfix_operator(text).is_some() {
            Some(OperatorRole::Postfix)
        } else if self.operators.infix_operator(text).is_some() {
            Some(OperatorRole::Infix)
        } else {
            None
        }
    }

    fn take(&mut self, len: usize, kind: TokenKind) -> Token<'a> {
        let (rest, taken) = self.rest.take_split(len);
        self.rest = rest;
        Spanned::new(taken, kind)
    }

    fn error(&self, len: usize, kind: ErrorKind) -> Error {
        let len = len.min(self.rest.fragment().len());
        kind.with_span(&Spanned::new(self.rest.slice(..len), ()))
    }

    fn run(mut self) -> Result<Vec<Token<'a>>, Error> {
        loop {
            if let Ok((rest, _)) = whitespace(self.rest) {
                self.rest = rest;
            }
            if self.rest.fragment().is_empty() {
                break;
            }
            if let Some(token) = self.next_token()? {
                self.push(token)?;
            }
        }

        if let Some((bracket, open)) = self.open_brackets.last() {
            return Err(ErrorKind::Unclosed(*bracket).with_span(open));
        }
        Ok(self.tokens)
    }

    /// Scans the next token. Returns `None` at the end of input.
    fn next_token(&mut self) -> Result<Option<Token<'a>>, Error> {
        let mut chars = self.rest.fragment().chars();
        let Some(ch) = chars.next() else {
            return Ok(None);
        };
        let next_is_digit = chars.next().map_or(false, |next| next.is_ascii_digit());
        let previous = self.previous_kind();

        let token = match ch {
            '"' => self.scan_string()?,
            '(' => {
                let token = self.take(1, TokenKind::BraceOpen);
                self.open_brackets.push((Bracket::Brace, token));
                token
            }
            ')' => {
                self.pop_bracket(Bracket::Brace)?;
                self.take(1, TokenKind::BraceClose)
            }
            ',' => self.take(1, TokenKind::Comma),

            '[' if self.features.contains(Features::ARRAYS) => {
                self.open_bracket(Bracket::Array, TokenKind::ArrayOpen)?
            }
            ']' if self.features.contains(Features::ARRAYS) => {
                self.close_bracket(Bracket::Array, TokenKind::ArrayClose)?
            }
            '{' if self.features.contains(Features::ASSOCIATES) => {
                self.open_bracket(Bracket::Associate, TokenKind::AssociateOpen)?
            }
            '}' if self.features.contains(Features::ASSOCIATES) => {
                self.close_bracket(Bracket::Associate, TokenKind::AssociateClose)?
            }
            '.' if !next_is_digit && self.features.contains(Features::STRUCTURES) => {
                if !previous.map_or(false, accepts_accessor) {
                    return Err(self.error(1, ErrorKind::MisplacedStructureSeparator));
                }
                self.take(1, TokenKind::StructureSeparator)
            }

            _ if ch.is_ascii_digit() || (ch == '.' && next_is_digit) => self.scan_number()?,
            _ if is_identifier_start(ch) => self.scan_identifier()?,
            _ => self.scan_operator()?,
        };
        Ok(Some(token))
    }

    fn open_bracket(&mut self, bracket: Bracket, kind: TokenKind) -> Result<Token<'a>, Error> {
        if !self.previous_kind().map_or(false, accepts_accessor) {
            let kind = ErrorKind::MisplacedBracket {
                bracket,
                closing: false,
            };
            return Err(self.error(1, kind));
        }
        let token = self.take(1, kind);
        self.open_brackets.push((bracket, token));
        Ok(token)
    }

    fn close_bracket(&mut self, bracket: Bracket, kind: TokenKind) -> Result<Token<'a>, Error> {
        if !self.previous_kind().map_or(false, accepts_closing_bracket) {
            let kind = ErrorKind::MisplacedBracket {
                bracket,
                closing: true,
            };
            return Err(self.error(1, kind));
        }
        self.pop_bracket(bracket)?;
        Ok(self.take(1, kind))
    }

    /// Matches a closing `bracket` with the innermost open bracket.
    fn pop_bracket(&mut self, bracket: Bracket) -> Result<(), Error> {
        match self.open_brackets.last().copied() {
            Some((open, _)) if open == bracket => {
                self.open_brackets.pop();
                Ok(())
            }
            // Crossed brackets, e.g. `(a[0)]`
            Some((open, token)) => Err(ErrorKind::Unclosed(open).with_span(&token)),
            None => Err(self.error(1, ErrorKind::UnexpectedClosing(bracket))),
        }
    }

    fn scan_string(&mut self) -> Result<Token<'a>, Error> {
        let fragment = *self.rest.fragment();
        let mut chars = fragment.char_indices().skip(1);
        while let Some((idx, ch)) = chars.next() {
            match ch {
                '"' => return Ok(self.take(idx + 1, TokenKind::StringLiteral)),
                '\\' => match chars.next() {
                    Some((_, escaped)) if escaped_char(escaped).is_some() => { /* valid escape */ }
                    Some((escaped_idx, escaped)) => {
                        let span = self.rest.slice(idx..escaped_idx + escaped.len_utf8());
                        return Err(ErrorKind::UnknownEscape.with_span(&Spanned::new(span, ())));
                    }
                    None => break,
                },
                _ => { /* regular char */ }
            }
        }
        Err(self.error(fragment.len(), ErrorKind::UnterminatedString))
    }

    fn scan_number(&mut self) -> Result<Token<'a>, Error> {
        if let Ok((rest, literal)) = with_span(hex_literal)(self.rest) {
            self.rest = rest;
            return Ok(literal.copy_with_extra(TokenKind::NumberLiteral));
        }
        if hex_prefix(self.rest).is_ok() {
            return Err(self.error(2, ErrorKind::IllegalHexFormat));
        }

        let (rest, literal) = decimal_literal(self.rest)
            .map_err(|_| self.error(1, ErrorKind::IllegalScientificFormat))?;
        let len = literal.fragment().len();
        let mut rest_chars = rest.fragment().chars();
        match rest_chars.next() {
            Some('e' | 'E') => {
                // Exponent marker not followed by digits (otherwise, it would be consumed).
                let sign_len = usize::from(matches!(rest_chars.next(), Some('+' | '-')));
                Err(self.error(len + 1 + sign_len, ErrorKind::IllegalScientificFormat))
            }
            Some('.') => Err(self.error(len + 1, ErrorKind::MultipleDecimalPoints)),
            _ => Ok(self.take(len, TokenKind::NumberLiteral)),
        }
    }

    fn scan_identifier(&mut self) -> Result<Token<'a>, Error> {
        let (_, name) = identifier(self.rest)
            .map_err(|_| self.error(1, ErrorKind::UnexpectedToken(TokenKind::Variable)))?;
        let name = *name.fragment();

        let kind = if let Some(role) = self.operator_role(name) {
            TokenKind::from_role(role)
        } else {
            let rest = self.rest.slice(name.len()..);
            let next_char = whitespace(rest)
                .ok()
                .and_then(|(rest, _)| rest.fragment().chars().next());
            if next_char == Some('(') {
                TokenKind::Function
            } else {
                TokenKind::Variable
            }
        };
        Ok(self.take(name.len(), kind))
    }

    /// Scans an operator using the longest match among operators allowed in this position.
    fn scan_operator(&mut self) -> Result<Token<'a>, Error> {
        let fragment = *self.rest.fragment();
        let mut scanned_len = 0;
        let mut matched = None;
        for (idx, ch) in fragment.char_indices() {
            let end = idx + ch.len_utf8();
            let candidate = &fragment[..end];
            if !self.has_operator_starting_with(candidate) {
                if scanned_len == 0 {
                    scanned_len = end;
                }
                break;
            }
            scanned_len = end;
            if let Some(role) = self.operator_role(candidate) {
                matched = Some((end, role));
            }
        }

        if let Some((len, role)) = matched {
            Ok(self.take(len, TokenKind::from_role(role)))
        } else {
            let text = fragment[..scanned_len].to_owned();
            Err(self.error(scanned_len, ErrorKind::UndefinedOperator(text)))
        }
    }

    fn push(&mut self, token: Token<'a>) -> Result<(), Error> {
        let previous = self.previous_kind();
        let empty_argument = match token.kind() {
            TokenKind::Comma => {
                previous.map_or(false, |kind| kind.is_opening() || kind == TokenKind::Comma)
            }
            TokenKind::BraceClose => previous == Some(TokenKind::Comma),
            _ => false,
        };
        if empty_argument {
            return Err(ErrorKind::EmptyArgument.with_span(&token));
        }

        if let Some(previous) = previous {
            let needs_operator = match token.kind() {
                TokenKind::BraceOpen => {
                    matches!(previous, TokenKind::NumberLiteral | TokenKind::BraceClose)
                }
                TokenKind::Variable | TokenKind::Function => previous == TokenKind::NumberLiteral,
                _ => false,
            };
            if needs_operator {
                if !self.features.contains(Features::IMPLICIT_MULTIPLICATION) {
                    return Err(ErrorKind::MissingOperator.with_span(&token));
                }
                let mul = token
                    .with_fragment("*")
                    .copy_with_extra(TokenKind::InfixOperator);
                self.tokens.push(mul);
            }

            let after_infix = self.previous_kind() == Some(TokenKind::InfixOperator);
            let incompatible = matches!(
                token.kind(),
                TokenKind::InfixOperator | TokenKind::BraceClose | TokenKind::Comma
            );
            if after_infix && incompatible {
                return Err(ErrorKind::UnexpectedAfterInfix.with_span(&token));
            }
        }

        if token.kind() == TokenKind::InfixOperator && !self.infix_allowed() {
            return Err(ErrorKind::MissingOperand.with_span(&token));
        }
        self.tokens.push(token);
        Ok(())
    }
}

/// Splits `source` into tokens, resolving operator roles with the provided `operators`.
///
/// # Errors
///
/// Returns an error on malformed literals, undefined operators and unbalanced or
/// misplaced brackets.
///
/// # Examples
///
/// ```
/// use formula_parser::{tokenize, Features, OperatorTable, TokenKind};
///
/// let tokens = tokenize("-x * 2", &OperatorTable::standard(), Features::all())?;
/// let kinds: Vec<_> = tokens.iter().map(|token| token.kind()).collect();
/// assert_eq!(
///     kinds,
///     [
///         TokenKind::PrefixOperator,
///         TokenKind::Variable,
///         TokenKind::InfixOperator,
///         TokenKind::NumberLiteral,
///     ]
/// );
/// # Ok::<_, formula_parser::Error>(())
/// ```
pub fn tokenize<'a, O>(
    source: &'a str,
    operators: &O,
    features: Features,
) -> Result<Vec<Token<'a>>, Error>
where
    O: OperatorLookup + ?Sized,
{
    Lexer::new(source, operators, features).run()
}
