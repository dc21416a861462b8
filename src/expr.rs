//! Formula parsing for functions of a single variable `x`.
//!
//! Text is tokenized, parsed by recursive descent into an [`Expr`] tree and
//! evaluated by walking the tree. Both `^` and `**` denote powers.

use std::f64::consts::{E, PI};
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Op(char),
    Ident(String),
    LParen,
    RParen,
    Comma,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "'{}'", n),
            Token::Op(op) => write!(f, "'{}'", op),
            Token::Ident(name) => write!(f, "'{}'", name),
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
            Token::Comma => f.write_str("','"),
        }
    }
}

/// Errors raised while turning formula text into an [`Expr`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("empty expression")]
    Empty,

    #[error("invalid number: '{0}'")]
    InvalidNumber(String),

    #[error("unknown character: '{0}'")]
    UnknownCharacter(char),

    #[error("unexpected end of input")]
    UnexpectedEnd,

    #[error("unexpected token {0}")]
    UnexpectedToken(String),

    #[error("missing closing parenthesis")]
    MissingParen,

    #[error("unknown name '{0}' (the only variable is x)")]
    UnknownName(String),

    #[error("function '{0}' requires parentheses")]
    MissingCallParens(String),

    #[error("expression nested deeper than {0} levels")]
    TooDeep(usize),

    #[error("{name} expects {expected}, got {got}")]
    Arity {
        name: &'static str,
        expected: &'static str,
        got: usize,
    },
}

/// Errors raised while evaluating a parsed expression at a point.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("{func} domain: {domain}, got {arg}")]
    Domain {
        func: &'static str,
        domain: &'static str,
        arg: f64,
    },

    #[error("'{0}' produced a non-finite value")]
    NonFinite(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinOp {
    fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
        }
    }

    fn precedence(self) -> u8 {
        match self {
            BinOp::Add | BinOp::Sub => 1,
            BinOp::Mul | BinOp::Div | BinOp::Rem => 2,
        }
    }

    fn apply(self, left: f64, right: f64) -> Result<f64, EvalError> {
        let value = match self {
            BinOp::Add => left + right,
            BinOp::Sub => left - right,
            BinOp::Mul => left * right,
            BinOp::Div => {
                if right == 0.0 {
                    return Err(EvalError::DivisionByZero);
                }
                left / right
            }
            // Floored modulo: the result takes the sign of the divisor.
            BinOp::Rem => {
                if right == 0.0 {
                    return Err(EvalError::DivisionByZero);
                }
                left - right * (left / right).floor()
            }
        };
        finite(value, self.symbol())
    }
}

/// Built-in functions. Trigonometry works in radians.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Asinh,
    Acosh,
    Atanh,
    Exp,
    Ln,
    Log,
    Log10,
    Sqrt,
    Abs,
    Floor,
    Ceil,
    Round,
}

impl Func {
    pub const ALL: [Func; 21] = [
        Func::Sin,
        Func::Cos,
        Func::Tan,
        Func::Asin,
        Func::Acos,
        Func::Atan,
        Func::Sinh,
        Func::Cosh,
        Func::Tanh,
        Func::Asinh,
        Func::Acosh,
        Func::Atanh,
        Func::Exp,
        Func::Ln,
        Func::Log,
        Func::Log10,
        Func::Sqrt,
        Func::Abs,
        Func::Floor,
        Func::Ceil,
        Func::Round,
    ];

    /// Looks a function up by name, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_lowercase();
        Self::ALL.into_iter().find(|func| func.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Func::Sin => "sin",
            Func::Cos => "cos",
            Func::Tan => "tan",
            Func::Asin => "asin",
            Func::Acos => "acos",
            Func::Atan => "atan",
            Func::Sinh => "sinh",
            Func::Cosh => "cosh",
            Func::Tanh => "tanh",
            Func::Asinh => "asinh",
            Func::Acosh => "acosh",
            Func::Atanh => "atanh",
            Func::Exp => "exp",
            Func::Ln => "ln",
            Func::Log => "log",
            Func::Log10 => "log10",
            Func::Sqrt => "sqrt",
            Func::Abs => "abs",
            Func::Floor => "floor",
            Func::Ceil => "ceil",
            Func::Round => "round",
        }
    }

    fn check_arity(self, got: usize) -> Result<(), ParseError> {
        let (ok, expected) = match self {
            Func::Log => ((1..=2).contains(&got), "1 or 2 arguments"),
            _ => (got == 1, "1 argument"),
        };
        if ok {
            Ok(())
        } else {
            Err(ParseError::Arity {
                name: self.name(),
                expected,
                got,
            })
        }
    }

    fn apply(self, args: &[f64]) -> Result<f64, EvalError> {
        let v = args[0];
        let domain = |domain: &'static str| EvalError::Domain {
            func: self.name(),
            domain,
            arg: v,
        };

        let value = match self {
            Func::Sin => v.sin(),
            Func::Cos => v.cos(),
            Func::Tan => v.tan(),
            Func::Asin => {
                if !(-1.0..=1.0).contains(&v) {
                    return Err(domain("[-1, 1]"));
                }
                v.asin()
            }
            Func::Acos => {
                if !(-1.0..=1.0).contains(&v) {
                    return Err(domain("[-1, 1]"));
                }
                v.acos()
            }
            Func::Atan => v.atan(),
            Func::Sinh => v.sinh(),
            Func::Cosh => v.cosh(),
            Func::Tanh => v.tanh(),
            Func::Asinh => v.asinh(),
            Func::Acosh => {
                if v < 1.0 {
                    return Err(domain("x >= 1"));
                }
                v.acosh()
            }
            Func::Atanh => {
                if v <= -1.0 || v >= 1.0 {
                    return Err(domain("|x| < 1"));
                }
                v.atanh()
            }
            Func::Exp => v.exp(),
            Func::Ln | Func::Log | Func::Log10 if v <= 0.0 => {
                return Err(domain("positive numbers"));
            }
            Func::Ln => v.ln(),
            Func::Log => match args.get(1) {
                None => v.ln(),
                Some(&base) => {
                    if base <= 0.0 || base == 1.0 {
                        return Err(EvalError::Domain {
                            func: "log",
                            domain: "base > 0 and base != 1",
                            arg: base,
                        });
                    }
                    v.ln() / base.ln()
                }
            },
            Func::Log10 => v.log10(),
            Func::Sqrt => {
                if v < 0.0 {
                    return Err(domain("non-negative numbers"));
                }
                v.sqrt()
            }
            Func::Abs => v.abs(),
            Func::Floor => v.floor(),
            Func::Ceil => v.ceil(),
            Func::Round => v.round(),
        };
        finite(value, self.name())
    }
}

fn finite(value: f64, what: &'static str) -> Result<f64, EvalError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EvalError::NonFinite(what))
    }
}

/// Expression tree over the single variable `x`.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Const(f64),
    Var,
    Neg(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Pow(Box<Expr>, Box<Expr>),
    Call(Func, Vec<Expr>),
}

impl Expr {
    /// Evaluates the tree with `x` bound to the given value.
    pub fn eval(&self, x: f64) -> Result<f64, EvalError> {
        match self {
            Expr::Const(value) => Ok(*value),
            Expr::Var => Ok(x),
            Expr::Neg(inner) => Ok(-inner.eval(x)?),
            Expr::Binary(op, left, right) => op.apply(left.eval(x)?, right.eval(x)?),
            Expr::Pow(base, exponent) => finite(base.eval(x)?.powf(exponent.eval(x)?), "^"),
            Expr::Call(func, args) => {
                let values = args
                    .iter()
                    .map(|arg| arg.eval(x))
                    .collect::<Result<Vec<_>, _>>()?;
                func.apply(&values)
            }
        }
    }

    /// Returns true if the variable appears anywhere in the tree.
    pub fn has_var(&self) -> bool {
        match self {
            Expr::Const(_) => false,
            Expr::Var => true,
            Expr::Neg(inner) => inner.has_var(),
            Expr::Binary(_, left, right) | Expr::Pow(left, right) => {
                left.has_var() || right.has_var()
            }
            Expr::Call(_, args) => args.iter().any(Expr::has_var),
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Binary(op, _, _) => op.precedence(),
            Expr::Neg(_) => 3,
            Expr::Const(value) if *value < 0.0 => 3,
            Expr::Pow(_, _) => 4,
            Expr::Const(_) | Expr::Var | Expr::Call(_, _) => 5,
        }
    }

    fn fmt_child(&self, f: &mut fmt::Formatter<'_>, min_precedence: u8) -> fmt::Result {
        if self.precedence() < min_precedence {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Const(value) => write!(f, "{}", value),
            Expr::Var => f.write_str("x"),
            Expr::Neg(inner) => {
                f.write_str("-")?;
                inner.fmt_child(f, 3)
            }
            Expr::Binary(op, left, right) => {
                let precedence = op.precedence();
                left.fmt_child(f, precedence)?;
                write!(f, " {} ", op.symbol())?;
                right.fmt_child(f, precedence + 1)
            }
            Expr::Pow(base, exponent) => {
                base.fmt_child(f, 5)?;
                f.write_str("^")?;
                exponent.fmt_child(f, 4)
            }
            Expr::Call(func, args) => {
                write!(f, "{}(", func.name())?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
        }
    }
}

pub fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                tokens.push(Token::LParen);
                chars.next();
            }
            ')' => {
                tokens.push(Token::RParen);
                chars.next();
            }
            ',' => {
                tokens.push(Token::Comma);
                chars.next();
            }
            '*' => {
                chars.next();
                if chars.peek() == Some(&'*') {
                    chars.next();
                    tokens.push(Token::Op('^'));
                } else {
                    tokens.push(Token::Op('*'));
                }
            }
            '+' | '-' | '/' | '^' | '%' => {
                tokens.push(Token::Op(c));
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut num_str = String::new();
                let mut has_dot = false;
                let mut has_exp = false;

                while let Some(&ch) = chars.peek() {
                    match ch {
                        '.' if has_dot || has_exp => break,
                        '.' => {
                            has_dot = true;
                            num_str.push(ch);
                            chars.next();
                        }
                        // Only an exponent when digits follow; `2e` stays `2` then `e`.
                        'e' | 'E' if !has_exp => {
                            let mut ahead = chars.clone();
                            ahead.next();
                            let sign = ahead.peek().copied().filter(|s| *s == '+' || *s == '-');
                            if sign.is_some() {
                                ahead.next();
                            }
                            if !ahead.peek().is_some_and(char::is_ascii_digit) {
                                break;
                            }
                            has_exp = true;
                            num_str.push(ch);
                            chars.next();
                            if let Some(sign) = sign {
                                num_str.push(sign);
                                chars.next();
                            }
                        }
                        '0'..='9' => {
                            num_str.push(ch);
                            chars.next();
                        }
                        _ => break,
                    }
                }

                match num_str.parse::<f64>() {
                    Ok(n) if n.is_finite() => tokens.push(Token::Number(n)),
                    _ => return Err(ParseError::InvalidNumber(num_str)),
                }
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_alphanumeric() || ch == '_' {
                        ident.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(ident));
            }
            _ => return Err(ParseError::UnknownCharacter(c)),
        }
    }
    Ok(tokens)
}

/// Nesting limit for parentheses, calls and exponents.
pub const MAX_DEPTH: usize = 256;

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            current: 0,
            depth: 0,
        }
    }

    pub fn parse(&mut self) -> Result<Expr, ParseError> {
        if self.tokens.is_empty() {
            return Err(ParseError::Empty);
        }
        let expr = self.expr()?;
        if let Some(token) = self.peek() {
            return Err(ParseError::UnexpectedToken(token.to_string()));
        }
        Ok(expr)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.current)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.current += 1;
            true
        } else {
            false
        }
    }

    fn expr(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.term()?;

        loop {
            let op = match self.peek() {
                Some(Token::Op('+')) => BinOp::Add,
                Some(Token::Op('-')) => BinOp::Sub,
                _ => break,
            };
            self.current += 1;
            let right = self.term()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn term(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.unary()?;

        loop {
            let op = match self.peek() {
                Some(Token::Op('*')) => BinOp::Mul,
                Some(Token::Op('/')) => BinOp::Div,
                Some(Token::Op('%')) => BinOp::Rem,
                _ => break,
            };
            self.current += 1;
            let right = self.unary()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    // Every nested subexpression passes through here.
    fn unary(&mut self) -> Result<Expr, ParseError> {
        if self.depth >= MAX_DEPTH {
            return Err(ParseError::TooDeep(MAX_DEPTH));
        }
        self.depth += 1;
        let result = self.signed();
        self.depth -= 1;
        result
    }

    fn signed(&mut self) -> Result<Expr, ParseError> {
        let mut negate = false;

        loop {
            match self.peek() {
                Some(Token::Op('+')) => self.current += 1,
                Some(Token::Op('-')) => {
                    negate = !negate;
                    self.current += 1;
                }
                _ => break,
            }
        }

        let operand = self.power()?;
        Ok(if negate {
            Expr::Neg(Box::new(operand))
        } else {
            operand
        })
    }

    // Right-associative; the exponent may carry its own sign (`2^-1`).
    fn power(&mut self) -> Result<Expr, ParseError> {
        let base = self.primary()?;

        if self.eat(&Token::Op('^')) {
            let exponent = self.unary()?;
            Ok(Expr::Pow(Box::new(base), Box::new(exponent)))
        } else {
            Ok(base)
        }
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        let token = self.peek().cloned().ok_or(ParseError::UnexpectedEnd)?;
        self.current += 1;

        match token {
            Token::Number(n) => Ok(Expr::Const(n)),
            Token::LParen => {
                let expr = self.expr()?;
                if self.eat(&Token::RParen) {
                    Ok(expr)
                } else {
                    Err(ParseError::MissingParen)
                }
            }
            Token::Ident(ident) => {
                let name = ident.to_lowercase();
                match name.as_str() {
                    "x" => return Ok(Expr::Var),
                    "pi" => return Ok(Expr::Const(PI)),
                    "e" => return Ok(Expr::Const(E)),
                    _ => {}
                }

                let func = Func::from_name(&name).ok_or(ParseError::UnknownName(ident))?;
                if !self.eat(&Token::LParen) {
                    return Err(ParseError::MissingCallParens(name));
                }

                let mut args = Vec::new();
                if !self.eat(&Token::RParen) {
                    loop {
                        args.push(self.expr()?);
                        if self.eat(&Token::Comma) {
                            continue;
                        }
                        if self.eat(&Token::RParen) {
                            break;
                        }
                        return match self.peek() {
                            Some(token) => Err(ParseError::UnexpectedToken(token.to_string())),
                            None => Err(ParseError::MissingParen),
                        };
                    }
                }

                func.check_arity(args.len())?;
                Ok(Expr::Call(func, args))
            }
            other => Err(ParseError::UnexpectedToken(other.to_string())),
        }
    }
}

/// A parsed formula together with the text it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    source: String,
    expr: Expr,
}

impl Function {
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        let expr = Parser::new(tokenize(source)?).parse()?;
        Ok(Function {
            source: source.trim().to_string(),
            expr,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn call(&self, x: f64) -> Result<f64, EvalError> {
        self.expr.eval(x)
    }
}

impl FromStr for Function {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Function::parse(s)
    }
}
