//! Expression parsing and evaluation for derived parameters
//!
//! Expressions use a closed arithmetic grammar: decimal numbers, the operators
//! `+ - * / %` with the usual precedence (all left-associative), parentheses,
//! a leading unary minus, and references to other parameters written as
//! `main##sub##item` or `{main##sub##item}`. Nothing in an expression is ever
//! executed as code.
//!
//! Parsing happens in two steps: a nom-based tokenizer that records the byte
//! offset of every token, and a precedence parser over the token stream that
//! reports grammar violations at those offsets.

use crate::error::{ParamError, Result};
use crate::parameters::guard::DependencyGuard;
use crate::parameters::path::{is_bare_segment_char, validate_segment, ParamPath, DELIMITER};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{char, digit0, digit1, multispace0, one_of},
    combinator::{opt, recognize},
    sequence::delimited,
    IResult, Parser,
};
use std::collections::HashMap;
use std::fmt;

/// Deepest parenthesis nesting the parser accepts.
pub const MAX_EXPRESSION_DEPTH: usize = 256;

/// Most terms a single expression may chain together, counted along the
/// deepest path of the parsed tree.
pub const MAX_EXPRESSION_TERMS: usize = 1024;

/// Expression AST node
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Constant number
    Number(f64),

    /// Reference to another parameter
    Reference(ParamPath),

    /// Unary operations
    Unary(UnaryOp, Box<Expression>),

    /// Binary operations
    Binary(BinaryOp, Box<Expression>, Box<Expression>),

    /// Parenthesized sub-expression
    Group(Box<Expression>),
}

/// Unary operations
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOp {
    /// Negation (-)
    Neg,
}

/// Binary operations
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOp {
    /// Addition (+)
    Add,

    /// Subtraction (-)
    Sub,

    /// Multiplication (*)
    Mul,

    /// Division (/)
    Div,

    /// Remainder (%)
    Rem,
}

impl BinaryOp {
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '+' => Some(Self::Add),
            '-' => Some(Self::Sub),
            '*' => Some(Self::Mul),
            '/' => Some(Self::Div),
            '%' => Some(Self::Rem),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Self::Add => '+',
            Self::Sub => '-',
            Self::Mul => '*',
            Self::Div => '/',
            Self::Rem => '%',
        }
    }

    fn apply(self, lhs: f64, rhs: f64) -> Result<f64> {
        match self {
            Self::Add => Ok(lhs + rhs),
            Self::Sub => Ok(lhs - rhs),
            Self::Mul => Ok(lhs * rhs),
            Self::Div => {
                if rhs == 0.0 {
                    Err(ParamError::DivisionByZero)
                } else {
                    Ok(lhs / rhs)
                }
            }
            Self::Rem => {
                if rhs == 0.0 {
                    Err(ParamError::DivisionByZero)
                } else {
                    Ok(lhs % rhs)
                }
            }
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Source of values for reference leaves
///
/// The evaluator hands every reference to its resolver together with the
/// in-progress dependency chain, so nested derived parameters are resolved
/// under the same cycle and depth checks.
pub trait Resolve {
    /// Produce the effective value of `path`
    fn resolve(&self, path: &ParamPath, guard: &mut DependencyGuard) -> Result<f64>;
}

/// Fixed values keyed by path; every entry behaves like a literal.
impl Resolve for HashMap<ParamPath, f64> {
    fn resolve(&self, path: &ParamPath, _guard: &mut DependencyGuard) -> Result<f64> {
        self.get(path)
            .copied()
            .ok_or_else(|| ParamError::NotFound { path: path.clone() })
    }
}

impl Expression {
    /// Parse an expression from a string
    ///
    /// # Examples
    ///
    /// ```
    /// use paramtree::parameters::Expression;
    ///
    /// let expr = Expression::parse("Env##Temp##A * 2").unwrap();
    /// assert_eq!(expr.references().len(), 1);
    ///
    /// let err = Expression::parse("Env##Temp##A +").unwrap_err();
    /// assert!(err.to_string().contains("offset 13"));
    /// ```
    pub fn parse(input: &str) -> Result<Self> {
        let tokens = tokenize(input)?;
        let mut parser = TokenParser {
            tokens: &tokens,
            pos: 0,
        };

        let (expr, _) = parser.additive(0)?;

        // Make sure the entire input was consumed
        if let Some(token) = parser.peek() {
            return Err(match token.kind {
                TokenKind::Close => ParamError::syntax(token.offset, "unbalanced ')'"),
                _ => ParamError::syntax(token.offset, "expected an operator"),
            });
        }

        Ok(expr)
    }

    /// Evaluate the expression, resolving references through `resolver`
    pub fn evaluate<R>(&self, resolver: &R, guard: &mut DependencyGuard) -> Result<f64>
    where
        R: Resolve + ?Sized,
    {
        match self {
            Self::Number(n) => Ok(*n),

            Self::Reference(path) => resolver.resolve(path, guard),

            Self::Unary(UnaryOp::Neg, inner) => Ok(-inner.evaluate(resolver, guard)?),

            Self::Binary(op, left, right) => {
                let lhs = left.evaluate(resolver, guard)?;
                let rhs = right.evaluate(resolver, guard)?;
                op.apply(lhs, rhs)
            }

            Self::Group(inner) => inner.evaluate(resolver, guard),
        }
    }

    /// Every path referenced by the expression, sorted and deduplicated
    pub fn references(&self) -> Vec<ParamPath> {
        let mut refs = Vec::new();
        self.collect_references(&mut refs);
        refs.sort();
        refs.dedup();
        refs
    }

    fn collect_references(&self, refs: &mut Vec<ParamPath>) {
        match self {
            Self::Number(_) => {}
            Self::Reference(path) => refs.push(path.clone()),
            Self::Unary(_, inner) | Self::Group(inner) => inner.collect_references(refs),
            Self::Binary(_, left, right) => {
                left.collect_references(refs);
                right.collect_references(refs);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Number(f64),
    Reference(ParamPath),
    Op(BinaryOp),
    Open,
    Close,
}

#[derive(Debug, Clone, PartialEq)]
struct Token {
    kind: TokenKind,
    /// Byte offset of the token's first character
    offset: usize,
}

// Tokenizer functions using nom

/// Parse a decimal number: `12`, `1.5`, `5.`, `.5`, with an optional exponent
fn decimal(input: &str) -> IResult<&str, &str> {
    recognize((
        alt((
            recognize((digit1, opt((char('.'), digit0)))),
            recognize((char('.'), digit1)),
        )),
        opt((one_of("eE"), opt(one_of("+-")), digit1)),
    ))
    .parse(input)
}

/// Parse one segment of an unbraced reference
fn bare_segment(input: &str) -> IResult<&str, &str> {
    take_while1(is_bare_segment_char).parse(input)
}

/// Parse an unbraced reference `main##sub##item`
fn bare_reference(input: &str) -> IResult<&str, ParamPath> {
    let (input, (main, _, sub, _, item)) = (
        bare_segment,
        tag(DELIMITER),
        bare_segment,
        tag(DELIMITER),
        bare_segment,
    )
        .parse(input)?;
    Ok((input, ParamPath::new(main, sub, item)))
}

/// Parse the body of a braced reference `{...}`
fn braced_reference(input: &str) -> IResult<&str, &str> {
    delimited(char('{'), take_while1(|c: char| c != '}'), char('}')).parse(input)
}

/// Parse a single operator or parenthesis
fn symbol(input: &str) -> IResult<&str, char> {
    one_of("+-*/%()").parse(input)
}

fn skip_space(input: &str) -> &str {
    multispace0::<&str, nom::error::Error<&str>>(input)
        .map(|(rest, _)| rest)
        .unwrap_or(input)
}

/// Split the body of a braced reference, ignoring whitespace around segments
fn split_braced(body: &str, offset: usize) -> Result<ParamPath> {
    let parts: Vec<&str> = body.split(DELIMITER).map(str::trim).collect();
    if parts.len() != 3 {
        return Err(ParamError::syntax(
            offset,
            format!("reference '{{{}}}' must have three segments", body),
        ));
    }
    for part in &parts {
        validate_segment(part).map_err(|e| ParamError::syntax(offset, e.to_string()))?;
    }
    Ok(ParamPath::new(parts[0], parts[1], parts[2]))
}

fn tokenize(source: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut rest = skip_space(source);

    while !rest.is_empty() {
        let offset = source.len() - rest.len();

        let (remaining, kind) = if rest.starts_with('{') {
            match braced_reference(rest) {
                Ok((remaining, body)) => {
                    (remaining, TokenKind::Reference(split_braced(body, offset)?))
                }
                Err(_) => {
                    return Err(ParamError::syntax(offset, "unterminated '{' in reference"))
                }
            }
        } else if let Ok((remaining, path)) = bare_reference(rest) {
            (remaining, TokenKind::Reference(path))
        } else if let Ok((remaining, text)) = decimal(rest) {
            let value = text
                .parse::<f64>()
                .map_err(|_| ParamError::syntax(offset, format!("invalid number '{}'", text)))?;
            (remaining, TokenKind::Number(value))
        } else if let Ok((_, word)) = bare_segment(rest) {
            return Err(ParamError::syntax(
                offset,
                format!(
                    "'{}' is not a reference; expected main{d}sub{d}item",
                    word,
                    d = DELIMITER
                ),
            ));
        } else if let Ok((remaining, c)) = symbol(rest) {
            let kind = match c {
                '(' => TokenKind::Open,
                ')' => TokenKind::Close,
                _ => match BinaryOp::from_symbol(c) {
                    Some(op) => TokenKind::Op(op),
                    None => {
                        return Err(ParamError::syntax(
                            offset,
                            format!("unexpected character '{}'", c),
                        ))
                    }
                },
            };
            (remaining, kind)
        } else {
            let c = rest.chars().next().unwrap_or(' ');
            return Err(ParamError::syntax(
                offset,
                format!("unexpected character '{}'", c),
            ));
        };

        tokens.push(Token { kind, offset });
        rest = skip_space(remaining);
    }

    Ok(tokens)
}

/// Precedence parser over the token stream.
///
/// Every production returns the parsed node with its tree depth.
struct TokenParser<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl<'t> TokenParser<'t> {
    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn previous(&self) -> Option<&'t Token> {
        if self.pos == 0 {
            None
        } else {
            self.tokens.get(self.pos - 1)
        }
    }

    fn next_op(&mut self, ops: &[BinaryOp]) -> Option<(BinaryOp, usize)> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::Op(op),
                offset,
            }) if ops.contains(op) => {
                self.pos += 1;
                Some((*op, *offset))
            }
            _ => None,
        }
    }

    /// additive := multiplicative (('+' | '-') multiplicative)*
    fn additive(&mut self, nesting: usize) -> Result<(Expression, usize)> {
        let (mut lhs, mut depth) = self.multiplicative(nesting)?;

        while let Some((op, offset)) = self.next_op(&[BinaryOp::Add, BinaryOp::Sub]) {
            let (rhs, rhs_depth) = self.multiplicative(nesting)?;
            depth = check_depth(depth.max(rhs_depth) + 1, offset)?;
            lhs = Expression::Binary(op, Box::new(lhs), Box::new(rhs));
        }

        Ok((lhs, depth))
    }

    /// multiplicative := operand (('*' | '/' | '%') operand)*
    fn multiplicative(&mut self, nesting: usize) -> Result<(Expression, usize)> {
        let (mut lhs, mut depth) = self.operand(nesting)?;

        while let Some((op, offset)) =
            self.next_op(&[BinaryOp::Mul, BinaryOp::Div, BinaryOp::Rem])
        {
            let (rhs, rhs_depth) = self.operand(nesting)?;
            depth = check_depth(depth.max(rhs_depth) + 1, offset)?;
            lhs = Expression::Binary(op, Box::new(lhs), Box::new(rhs));
        }

        Ok((lhs, depth))
    }

    /// operand := number | reference | '(' additive ')' | '-' operand
    ///
    /// Unary minus is only accepted where no operator precedes it.
    fn operand(&mut self, nesting: usize) -> Result<(Expression, usize)> {
        let previous = self.previous();

        let token = match self.peek() {
            Some(token) => token,
            None => return Err(missing_operand(previous)),
        };

        match &token.kind {
            TokenKind::Number(n) => {
                self.pos += 1;
                Ok((Expression::Number(*n), 1))
            }

            TokenKind::Reference(path) => {
                self.pos += 1;
                Ok((Expression::Reference(path.clone()), 1))
            }

            TokenKind::Open => {
                if nesting >= MAX_EXPRESSION_DEPTH {
                    return Err(ParamError::syntax(
                        token.offset,
                        "parentheses nest too deeply",
                    ));
                }
                self.pos += 1;

                let (inner, depth) = self.additive(nesting + 1)?;
                match self.peek() {
                    Some(Token {
                        kind: TokenKind::Close,
                        ..
                    }) => {
                        self.pos += 1;
                        let depth = check_depth(depth + 1, token.offset)?;
                        Ok((Expression::Group(Box::new(inner)), depth))
                    }
                    Some(other) => {
                        Err(ParamError::syntax(other.offset, "expected an operator or ')'"))
                    }
                    None => Err(ParamError::syntax(token.offset, "unclosed '('")),
                }
            }

            TokenKind::Op(BinaryOp::Sub) if opens_operand(previous) => {
                self.pos += 1;
                let (inner, depth) = self.operand(nesting)?;
                let depth = check_depth(depth + 1, token.offset)?;
                Ok((Expression::Unary(UnaryOp::Neg, Box::new(inner)), depth))
            }

            TokenKind::Op(op) => match previous {
                Some(Token {
                    kind: TokenKind::Op(prev),
                    ..
                }) => Err(ParamError::syntax(
                    token.offset,
                    format!("operator '{}' follows operator '{}'", op, prev),
                )),
                _ => Err(ParamError::syntax(
                    token.offset,
                    format!("operator '{}' has no left operand", op),
                )),
            },

            TokenKind::Close => Err(match previous {
                Some(
                    prev @ Token {
                        kind: TokenKind::Open,
                        ..
                    },
                ) => ParamError::syntax(prev.offset, "empty parentheses"),
                Some(Token {
                    kind: TokenKind::Op(_),
                    ..
                }) => missing_operand(previous),
                _ => ParamError::syntax(token.offset, "unbalanced ')'"),
            }),
        }
    }
}

/// Whether an operand may start with a unary minus after `previous`
fn opens_operand(previous: Option<&Token>) -> bool {
    matches!(
        previous,
        None | Some(Token {
            kind: TokenKind::Open,
            ..
        })
    )
}

fn missing_operand(previous: Option<&Token>) -> ParamError {
    match previous {
        None => ParamError::syntax(0, "empty expression"),
        Some(Token {
            kind: TokenKind::Op(op),
            offset,
        }) => ParamError::syntax(*offset, format!("operator '{}' has no right operand", op)),
        Some(Token {
            kind: TokenKind::Open,
            offset,
        }) => ParamError::syntax(*offset, "unclosed '('"),
        Some(token) => ParamError::syntax(token.offset, "unexpected end of expression"),
    }
}

fn check_depth(depth: usize, offset: usize) -> Result<usize> {
    if depth > MAX_EXPRESSION_TERMS {
        Err(ParamError::syntax(
            offset,
            format!("expression chains more than {} terms", MAX_EXPRESSION_TERMS),
        ))
    } else {
        Ok(depth)
    }
}
