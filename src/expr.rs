//! Predicate parser and evaluator for per-column filter conditions.
//!
//! Every filter line targets exactly one column, so an expression never names a
//! column: `_` stands for "this row's value", and may be omitted on the left.
//!
//! Supports expressions like:
//! - `> 90` or `_ > 90`
//! - `== 'Alice'`
//! - `10 <= _` (operands flipped, read as `_ >= 10`)
//! - `contains 'ice'`
//! - `is null`, `is not null`
//!
//! Boolean connectives (`and`, `or`) and any other identifier are rejected.
//! Parsing produces an untyped `Predicate`; `compile` checks it against the
//! column's declared type and yields a `TypedPredicate` that is evaluated per
//! row without allocating.

use crate::column::{CellRef, ColumnType};
use crate::temporal::{has_time_part, parse_date, parse_datetime};
use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

/// Why an expression could not be turned into a typed predicate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    #[error("{0}")]
    Parse(String),
    #[error("{0}")]
    TypeMismatch(String),
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq, // ==
    Ne, // !=
    Lt, // <
    Le, // <=
    Gt, // >
    Ge, // >=
}

impl CompareOp {
    /// The operator that gives the same result with operands swapped.
    pub fn mirror(self) -> Self {
        match self {
            CompareOp::Eq => CompareOp::Eq,
            CompareOp::Ne => CompareOp::Ne,
            CompareOp::Lt => CompareOp::Gt,
            CompareOp::Le => CompareOp::Ge,
            CompareOp::Gt => CompareOp::Lt,
            CompareOp::Ge => CompareOp::Le,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }

    fn test<T: PartialOrd + ?Sized>(self, a: &T, b: &T) -> bool {
        match self {
            CompareOp::Eq => a == b,
            CompareOp::Ne => a != b,
            CompareOp::Lt => a < b,
            CompareOp::Le => a <= b,
            CompareOp::Gt => a > b,
            CompareOp::Ge => a >= b,
        }
    }
}

/// Literal values that can appear in expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
    Null,
}

impl Literal {
    fn describe(&self) -> &'static str {
        match self {
            Literal::Int(_) => "an integer",
            Literal::Float(_) => "a float",
            Literal::String(_) => "a string",
            Literal::Bool(_) => "a boolean",
            Literal::Null => "null",
        }
    }
}

/// A parsed, not yet type-checked predicate on one column.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare { op: CompareOp, value: Literal },
    Contains(String),
    IsNull,
    IsNotNull,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Placeholder,
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
    Null,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Contains,
    Is,
    Not,
    Eof,
}

struct Lexer {
    input: Vec<char>,
    pos: usize,
}

impl Lexer {
    fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        self.pos += 1;
        c
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|c| c.is_whitespace()) {
            self.advance();
        }
    }

    fn read_word(&mut self) -> String {
        let mut word = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                word.push(c);
                self.advance();
            } else {
                break;
            }
        }
        word
    }

    fn read_number(&mut self, negative: bool) -> Result<Token, String> {
        let mut num_str = String::new();
        if negative {
            num_str.push('-');
        }
        let mut is_float = false;

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                num_str.push(c);
                self.advance();
            } else if c == '.' && !is_float {
                is_float = true;
                num_str.push(c);
                self.advance();
            } else if (c == 'e' || c == 'E')
                && self
                    .peek_at(1)
                    .is_some_and(|n| n.is_ascii_digit() || n == '-' || n == '+')
            {
                is_float = true;
                num_str.push(c);
                self.advance();
                if let Some(sign) = self.peek().filter(|s| *s == '-' || *s == '+') {
                    num_str.push(sign);
                    self.advance();
                }
            } else {
                break;
            }
        }

        if is_float {
            num_str
                .parse()
                .map(Token::Float)
                .map_err(|_| format!("Invalid number '{}'", num_str))
        } else {
            num_str
                .parse()
                .map(Token::Int)
                .map_err(|_| format!("Integer '{}' is out of range", num_str))
        }
    }

    fn read_string(&mut self, quote: char) -> Result<Token, String> {
        self.advance(); // opening quote
        let mut s = String::new();

        while let Some(c) = self.advance() {
            if c == quote {
                return Ok(Token::String(s));
            } else if c == '\\' {
                match self.advance() {
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some(escaped) => s.push(escaped),
                    None => break,
                }
            } else {
                s.push(c);
            }
        }

        Err("Unterminated string".to_string())
    }

    fn two_char(&mut self, single: Token, double: Token) -> Token {
        self.advance();
        if self.peek() == Some('=') {
            self.advance();
            double
        } else {
            single
        }
    }

    fn next_token(&mut self) -> Result<Token, String> {
        self.skip_whitespace();

        let c = match self.peek() {
            None => return Ok(Token::Eof),
            Some(c) => c,
        };

        match c {
            '=' => Ok(self.two_char(Token::Eq, Token::Eq)), // single = also means ==
            '<' => Ok(self.two_char(Token::Lt, Token::Le)),
            '>' => Ok(self.two_char(Token::Gt, Token::Ge)),
            '!' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    Ok(Token::Ne)
                } else {
                    Err("Expected '=' after '!'".to_string())
                }
            }
            '\'' | '"' => self.read_string(c),
            '-' if self
                .peek_at(1)
                .is_some_and(|n| n.is_ascii_digit() || n == '.') =>
            {
                self.advance();
                self.read_number(true)
            }
            '.' if self.peek_at(1).is_some_and(|n| n.is_ascii_digit()) => self.read_number(false),
            _ if c.is_ascii_digit() => self.read_number(false),
            _ if c.is_alphabetic() || c == '_' => {
                let word = self.read_word();
                match word.to_lowercase().as_str() {
                    "_" => Ok(Token::Placeholder),
                    "contains" => Ok(Token::Contains),
                    "is" => Ok(Token::Is),
                    "not" => Ok(Token::Not),
                    "null" => Ok(Token::Null),
                    "true" => Ok(Token::Bool(true)),
                    "false" => Ok(Token::Bool(false)),
                    "and" | "or" => Err(format!(
                        "'{}' is not supported: use one condition per filter line",
                        word
                    )),
                    _ => Err(format!(
                        "Unexpected identifier '{}' (use _ for the column value)",
                        word
                    )),
                }
            }
            _ => Err(format!("Unexpected character: {}", c)),
        }
    }
}

struct Parser {
    lexer: Lexer,
    current: Token,
}

impl Parser {
    fn new(input: &str) -> Result<Self, String> {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token()?;
        Ok(Parser { lexer, current })
    }

    fn advance(&mut self) -> Result<(), String> {
        self.current = self.lexer.next_token()?;
        Ok(())
    }

    fn current_op(&self) -> Option<CompareOp> {
        match self.current {
            Token::Eq => Some(CompareOp::Eq),
            Token::Ne => Some(CompareOp::Ne),
            Token::Lt => Some(CompareOp::Lt),
            Token::Le => Some(CompareOp::Le),
            Token::Gt => Some(CompareOp::Gt),
            Token::Ge => Some(CompareOp::Ge),
            _ => None,
        }
    }

    fn current_literal(&self) -> Option<Literal> {
        match &self.current {
            Token::Int(n) => Some(Literal::Int(*n)),
            Token::Float(f) => Some(Literal::Float(*f)),
            Token::String(s) => Some(Literal::String(s.clone())),
            Token::Bool(b) => Some(Literal::Bool(*b)),
            Token::Null => Some(Literal::Null),
            _ => None,
        }
    }

    fn parse(&mut self) -> Result<Predicate, String> {
        if self.current == Token::Placeholder {
            self.advance()?;
            return self.parse_tail();
        }

        // literal op _
        if let Some(value) = self.current_literal() {
            self.advance()?;
            let op = self
                .current_op()
                .ok_or_else(|| format!("Expected comparison operator, got {:?}", self.current))?;
            self.advance()?;
            if self.current != Token::Placeholder {
                return Err(format!("Expected _ after '{}'", op.symbol()));
            }
            self.advance()?;
            return Ok(Predicate::Compare {
                op: op.mirror(),
                value,
            });
        }

        self.parse_tail()
    }

    /// Everything after the (optional) leading placeholder.
    fn parse_tail(&mut self) -> Result<Predicate, String> {
        if let Some(op) = self.current_op() {
            self.advance()?;
            let value = self
                .current_literal()
                .ok_or_else(|| format!("Expected literal value, got {:?}", self.current))?;
            self.advance()?;
            return Ok(Predicate::Compare { op, value });
        }

        match self.current {
            Token::Contains => {
                self.advance()?;
                let needle = match &self.current {
                    Token::String(s) => s.clone(),
                    other => return Err(format!("Expected string after contains, got {:?}", other)),
                };
                self.advance()?;
                Ok(Predicate::Contains(needle))
            }
            Token::Is => {
                self.advance()?;
                let negated = if self.current == Token::Not {
                    self.advance()?;
                    true
                } else {
                    false
                };
                if self.current != Token::Null {
                    return Err("Expected NULL after IS".to_string());
                }
                self.advance()?;
                Ok(if negated {
                    Predicate::IsNotNull
                } else {
                    Predicate::IsNull
                })
            }
            Token::Eof => Err("Expected comparison operator".to_string()),
            _ => Err(format!("Expected comparison operator, got {:?}", self.current)),
        }
    }
}

/// Parse a condition expression into a `Predicate`.
pub fn parse_predicate(input: &str) -> Result<Predicate, ExprError> {
    let mut parser = Parser::new(input).map_err(ExprError::Parse)?;
    let predicate = parser.parse().map_err(ExprError::Parse)?;

    if parser.current != Token::Eof {
        return Err(ExprError::Parse(format!(
            "Unexpected token after expression: {:?}",
            parser.current
        )));
    }

    Ok(predicate)
}

/// A predicate checked against a column type, ready for per-row evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedPredicate {
    Integer { op: CompareOp, value: i64 },
    Number { op: CompareOp, value: f64 },
    Text { op: CompareOp, value: String },
    Contains(String),
    Bool { op: CompareOp, value: bool },
    Date { op: CompareOp, value: NaiveDate },
    DateTime { op: CompareOp, value: NaiveDateTime },
    IsNull,
    IsNotNull,
}

/// Type-check `predicate` against a column of type `column_type`.
pub fn compile(predicate: &Predicate, column_type: ColumnType) -> Result<TypedPredicate, ExprError> {
    let mismatch = |what: &str| {
        Err(ExprError::TypeMismatch(format!(
            "cannot apply {} to a {} column",
            what, column_type
        )))
    };

    let (op, value) = match predicate {
        Predicate::IsNull => return Ok(TypedPredicate::IsNull),
        Predicate::IsNotNull => return Ok(TypedPredicate::IsNotNull),
        Predicate::Contains(needle) => {
            return if column_type == ColumnType::String {
                Ok(TypedPredicate::Contains(needle.clone()))
            } else {
                mismatch("contains")
            };
        }
        Predicate::Compare { op, value } => (*op, value),
    };

    match (value, column_type) {
        (Literal::Null, _) => match op {
            CompareOp::Eq => Ok(TypedPredicate::IsNull),
            CompareOp::Ne => Ok(TypedPredicate::IsNotNull),
            _ => mismatch(&format!("'{} null'", op.symbol())),
        },
        (Literal::Int(n), t) if t.is_integer() => Ok(TypedPredicate::Integer { op, value: *n }),
        (Literal::Int(n), t) if t.is_numeric() => Ok(TypedPredicate::Number {
            op,
            value: *n as f64,
        }),
        (Literal::Float(f), t) if t.is_numeric() => Ok(TypedPredicate::Number { op, value: *f }),
        (Literal::String(s), ColumnType::String) => Ok(TypedPredicate::Text {
            op,
            value: s.clone(),
        }),
        (Literal::Bool(b), ColumnType::Bool) => match op {
            CompareOp::Eq | CompareOp::Ne => Ok(TypedPredicate::Bool { op, value: *b }),
            _ => mismatch(&format!("'{}'", op.symbol())),
        },
        (Literal::String(s), ColumnType::Date) => {
            if has_time_part(s) {
                return mismatch("a datetime literal");
            }
            parse_date(s)
                .map(|value| TypedPredicate::Date { op, value })
                .ok_or_else(|| {
                    ExprError::TypeMismatch(format!("'{}' is not a date (expected YYYY-MM-DD)", s))
                })
        }
        (Literal::String(s), ColumnType::DateTime) => parse_datetime(s)
            .map(|value| TypedPredicate::DateTime { op, value })
            .ok_or_else(|| {
                ExprError::TypeMismatch(format!(
                    "'{}' is not a datetime (expected YYYY-MM-DDTHH:MM:SS)",
                    s
                ))
            }),
        (literal, _) => mismatch(&format!("a comparison with {}", literal.describe())),
    }
}

impl TypedPredicate {
    /// The comparison operator, if the predicate has one.
    pub fn op(&self) -> Option<CompareOp> {
        match self {
            TypedPredicate::Integer { op, .. }
            | TypedPredicate::Number { op, .. }
            | TypedPredicate::Text { op, .. }
            | TypedPredicate::Bool { op, .. }
            | TypedPredicate::Date { op, .. }
            | TypedPredicate::DateTime { op, .. } => Some(*op),
            TypedPredicate::Contains(_) | TypedPredicate::IsNull | TypedPredicate::IsNotNull => None,
        }
    }

    /// Whether one cell satisfies the predicate. A null cell satisfies `IsNull`
    /// and `!=` comparisons only; a cell of an unexpected kind never matches.
    #[inline]
    pub fn matches(&self, cell: CellRef<'_>) -> bool {
        match (self, cell) {
            (TypedPredicate::IsNull, cell) => cell.is_null(),
            (TypedPredicate::IsNotNull, cell) => !cell.is_null(),
            (predicate, CellRef::Null) => predicate.op() == Some(CompareOp::Ne),
            (TypedPredicate::Integer { op, value }, CellRef::Int(v)) => op.test(&v, value),
            (TypedPredicate::Integer { op, value }, CellRef::Float(v)) => {
                op.test(&v, &(*value as f64))
            }
            (TypedPredicate::Number { op, value }, cell) => match cell.as_f64() {
                Some(v) => op.test(&v, value),
                None => false,
            },
            (TypedPredicate::Text { op, value }, CellRef::Text(s)) => op.test(s, value.as_str()),
            (TypedPredicate::Contains(needle), CellRef::Text(s)) => s.contains(needle.as_str()),
            (TypedPredicate::Bool { op, value }, CellRef::Bool(b)) => op.test(&b, value),
            (TypedPredicate::Date { op, value }, CellRef::Date(d)) => op.test(&d, value),
            (TypedPredicate::DateTime { op, value }, CellRef::DateTime(dt)) => op.test(&dt, value),
            _ => false,
        }
    }
}

/// Parse and type-check in one step.
pub fn parse_for_column(input: &str, column_type: ColumnType) -> Result<TypedPredicate, ExprError> {
    compile(&parse_predicate(input)?, column_type)
}
