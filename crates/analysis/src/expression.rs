//! Arithmetic expressions over particle columns.
//!
//! Expressions such as `(vx^2 + vy^2 + vz^2) * m / 2` are parsed once into an
//! AST and evaluated per snapshot. Every value carries a [`Dimension`], so
//! adding a length to a velocity fails with [`UnitError::Incompatible`].
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := '-' unary | power
//! power   := primary (('^' | '**') unary)?
//! primary := number | identifier | identifier '(' expr ')' | '(' expr ')'
//! ```

use std::collections::BTreeMap;
use std::fmt;

use nbody::ParticleSet;
use units::{Dimension, Unit, UnitError};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExpressionError {
    #[error("syntax error at {position}: {message}")]
    Syntax { position: usize, message: String },
    #[error("unknown variable `{0}`")]
    UnknownVariable(String),
    #[error("unknown function `{0}`")]
    UnknownFunction(String),
    #[error("cannot combine arrays of length {left} and {right}")]
    LengthMismatch { left: usize, right: usize },
    #[error("exponent must be a dimensionless number, got {0}")]
    InvalidExponent(String),
    #[error(transparent)]
    Unit(#[from] UnitError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Pow => "^",
        };
        f.write_str(symbol)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Sqrt,
    Abs,
    Exp,
    Log,
    Sin,
    Cos,
}

impl Function {
    fn from_name(name: &str) -> Option<Self> {
        let function = match name {
            "sqrt" => Function::Sqrt,
            "abs" => Function::Abs,
            "exp" => Function::Exp,
            "log" => Function::Log,
            "sin" => Function::Sin,
            "cos" => Function::Cos,
            _ => return None,
        };
        Some(function)
    }

    fn name(self) -> &'static str {
        match self {
            Function::Sqrt => "sqrt",
            Function::Abs => "abs",
            Function::Exp => "exp",
            Function::Log => "log",
            Function::Sin => "sin",
            Function::Cos => "cos",
        }
    }

    fn apply(self, arg: Evaluated) -> Result<Evaluated, ExpressionError> {
        let dim = match self {
            Function::Sqrt => arg.dim.sqrt().ok_or(UnitError::InvalidOperation {
                operation: "square root",
                dim: arg.dim,
            })?,
            Function::Abs => arg.dim,
            _ if arg.dim.is_dimensionless() => Dimension::NONE,
            _ => {
                return Err(UnitError::InvalidOperation {
                    operation: self.name(),
                    dim: arg.dim,
                }
                .into());
            }
        };
        let f: fn(f64) -> f64 = match self {
            Function::Sqrt => f64::sqrt,
            Function::Abs => f64::abs,
            Function::Exp => f64::exp,
            Function::Log => f64::ln,
            Function::Sin => f64::sin,
            Function::Cos => f64::cos,
        };
        Ok(Evaluated {
            values: arg.values.into_iter().map(f).collect(),
            dim,
            scalar: arg.scalar,
        })
    }
}

/// Parsed expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Variable(String),
    Neg(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        function: Function,
        arg: Box<Expr>,
    },
}

/// Result of an evaluation: SI values sharing one dimension.
///
/// A scalar broadcasts against arrays of any length.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluated {
    pub values: Vec<f64>,
    pub dim: Dimension,
    pub scalar: bool,
}

impl Evaluated {
    pub fn scalar(value: f64, dim: Dimension) -> Self {
        Self {
            values: vec![value],
            dim,
            scalar: true,
        }
    }

    pub fn array(values: Vec<f64>, dim: Dimension) -> Self {
        Self {
            values,
            dim,
            scalar: false,
        }
    }

    /// Builds a column from values given in `unit`.
    pub fn column(values: impl IntoIterator<Item = f64>, unit: &Unit) -> Self {
        let scale = unit.scale();
        Self::array(
            values.into_iter().map(|v| v * scale).collect(),
            unit.dimension(),
        )
    }

    /// The values as numbers of `unit`.
    pub fn values_in(&self, unit: &Unit) -> Result<Vec<f64>, UnitError> {
        if self.dim != unit.dimension() {
            return Err(UnitError::Incompatible {
                left: self.dim,
                right: unit.dimension(),
            });
        }
        let scale = unit.scale();
        Ok(self.values.iter().map(|v| v / scale).collect())
    }

    fn zip_with(
        self,
        rhs: Evaluated,
        dim: Dimension,
        f: impl Fn(f64, f64) -> f64,
    ) -> Result<Evaluated, ExpressionError> {
        let values = match (self.scalar, rhs.scalar) {
            (true, true) => vec![f(self.values[0], rhs.values[0])],
            (true, false) => rhs.values.iter().map(|b| f(self.values[0], *b)).collect(),
            (false, true) => self.values.iter().map(|a| f(*a, rhs.values[0])).collect(),
            (false, false) => {
                if self.values.len() != rhs.values.len() {
                    return Err(ExpressionError::LengthMismatch {
                        left: self.values.len(),
                        right: rhs.values.len(),
                    });
                }
                self.values
                    .iter()
                    .zip(&rhs.values)
                    .map(|(a, b)| f(*a, *b))
                    .collect()
            }
        };
        Ok(Evaluated {
            values,
            dim,
            scalar: self.scalar && rhs.scalar,
        })
    }
}

/// Named columns an expression may refer to.
pub type Variables = BTreeMap<String, Evaluated>;

/// `x, y, z` (kpc), `vx, vy, vz` (km/s) and `m` (M_sun) of a particle set.
pub fn particle_variables(particles: &ParticleSet) -> Variables {
    let kpc = Unit::kpc();
    let kms = Unit::kms();
    let positions = particles.positions();
    let velocities = particles.velocities();

    let mut vars = Variables::new();
    vars.insert("x".into(), Evaluated::column(positions.iter().map(|p| p.x), &kpc));
    vars.insert("y".into(), Evaluated::column(positions.iter().map(|p| p.y), &kpc));
    vars.insert("z".into(), Evaluated::column(positions.iter().map(|p| p.z), &kpc));
    vars.insert("vx".into(), Evaluated::column(velocities.iter().map(|v| v.x), &kms));
    vars.insert("vy".into(), Evaluated::column(velocities.iter().map(|v| v.y), &kms));
    vars.insert("vz".into(), Evaluated::column(velocities.iter().map(|v| v.z), &kms));
    vars.insert(
        "m".into(),
        Evaluated::column(particles.masses().iter().copied(), &Unit::msun()),
    );
    vars
}

/// A parsed expression together with its source text.
///
/// # Examples
///
/// ```
/// use analysis::expression::{Evaluated, Expression, Variables};
/// use units::Unit;
///
/// let expr = Expression::parse("sqrt(x^2 + y^2)").unwrap();
///
/// let mut vars = Variables::new();
/// vars.insert("x".into(), Evaluated::column([3.0], &Unit::kpc()));
/// vars.insert("y".into(), Evaluated::column([4.0], &Unit::kpc()));
///
/// let r = expr.evaluate(&vars).unwrap();
/// assert!((r.values_in(&Unit::kpc()).unwrap()[0] - 5.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    root: Expr,
}

impl Expression {
    pub fn parse(source: &str) -> Result<Self, ExpressionError> {
        let tokens = tokenize(source)?;
        let mut parser = Parser { tokens, pos: 0 };
        let root = parser.expression(0)?;
        if let Some((position, token)) = parser.peek_with_position() {
            return Err(ExpressionError::Syntax {
                position,
                message: format!("unexpected {token}"),
            });
        }
        Ok(Self {
            source: source.to_string(),
            root,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> &Expr {
        &self.root
    }

    pub fn evaluate(&self, vars: &Variables) -> Result<Evaluated, ExpressionError> {
        eval(&self.root, vars)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn eval(expr: &Expr, vars: &Variables) -> Result<Evaluated, ExpressionError> {
    match expr {
        Expr::Number(v) => Ok(Evaluated::scalar(*v, Dimension::NONE)),
        Expr::Variable(name) => vars
            .get(name)
            .cloned()
            .ok_or_else(|| ExpressionError::UnknownVariable(name.clone())),
        Expr::Neg(inner) => {
            let mut value = eval(inner, vars)?;
            value.values.iter_mut().for_each(|v| *v = -*v);
            Ok(value)
        }
        Expr::Call { function, arg } => function.apply(eval(arg, vars)?),
        Expr::Binary { op, lhs, rhs } => {
            let lhs = eval(lhs, vars)?;
            let rhs = eval(rhs, vars)?;
            match op {
                BinaryOp::Add | BinaryOp::Sub => {
                    if lhs.dim != rhs.dim {
                        return Err(UnitError::Incompatible {
                            left: lhs.dim,
                            right: rhs.dim,
                        }
                        .into());
                    }
                    let dim = lhs.dim;
                    if *op == BinaryOp::Add {
                        lhs.zip_with(rhs, dim, |a, b| a + b)
                    } else {
                        lhs.zip_with(rhs, dim, |a, b| a - b)
                    }
                }
                BinaryOp::Mul => {
                    let dim = lhs.dim * rhs.dim;
                    lhs.zip_with(rhs, dim, |a, b| a * b)
                }
                BinaryOp::Div => {
                    let dim = lhs.dim / rhs.dim;
                    lhs.zip_with(rhs, dim, |a, b| a / b)
                }
                BinaryOp::Pow => power(lhs, rhs),
            }
        }
    }
}

/// Dimensioned bases need a constant integer or half-integer exponent.
fn power(base: Evaluated, exponent: Evaluated) -> Result<Evaluated, ExpressionError> {
    if !exponent.dim.is_dimensionless() {
        return Err(ExpressionError::InvalidExponent(exponent.dim.to_string()));
    }
    if base.dim.is_dimensionless() {
        return base.zip_with(exponent, Dimension::NONE, f64::powf);
    }
    if !exponent.scalar {
        return Err(ExpressionError::InvalidExponent(
            "an array on a dimensioned base".to_string(),
        ));
    }

    let e = exponent.values[0];
    let doubled = 2.0 * e;
    if doubled.fract() != 0.0 || doubled.abs() > i8::MAX as f64 {
        return Err(ExpressionError::InvalidExponent(e.to_string()));
    }
    let dim = if e.fract() == 0.0 {
        base.dim.powi(e as i8)
    } else {
        base.dim
            .sqrt()
            .ok_or(UnitError::InvalidOperation {
                operation: "fractional power",
                dim: base.dim,
            })?
            .powi(doubled as i8)
    };
    base.zip_with(exponent, dim, f64::powf)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Op(BinaryOp),
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(v) => write!(f, "number {v}"),
            Token::Ident(name) => write!(f, "`{name}`"),
            Token::Op(op) => write!(f, "`{op}`"),
            Token::LParen => f.write_str("`(`"),
            Token::RParen => f.write_str("`)`"),
        }
    }
}

fn tokenize(source: &str) -> Result<Vec<(usize, Token)>, ExpressionError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let start = i;
        let token = match c {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '+' => Token::Op(BinaryOp::Add),
            '-' => Token::Op(BinaryOp::Sub),
            '/' => Token::Op(BinaryOp::Div),
            '^' => Token::Op(BinaryOp::Pow),
            '*' if chars.get(i + 1) == Some(&'*') => {
                i += 1;
                Token::Op(BinaryOp::Pow)
            }
            '*' => Token::Op(BinaryOp::Mul),
            '(' => Token::LParen,
            ')' => Token::RParen,
            c if c.is_ascii_digit() || c == '.' => {
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                if i < chars.len() && matches!(chars[i], 'e' | 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && matches!(chars[j], '+' | '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        i = j;
                        while i < chars.len() && chars[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let text: String = chars[start..i].iter().collect();
                let value = text.parse().map_err(|_| ExpressionError::Syntax {
                    position: start,
                    message: format!("invalid number `{text}`"),
                })?;
                tokens.push((start, Token::Number(value)));
                continue;
            }
            c if c.is_alphabetic() || c == '_' => {
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push((start, Token::Ident(chars[start..i].iter().collect())));
                continue;
            }
            other => {
                return Err(ExpressionError::Syntax {
                    position: start,
                    message: format!("unexpected character `{other}`"),
                });
            }
        };
        tokens.push((start, token));
        i += 1;
    }
    Ok(tokens)
}

/// Pratt parser over the token stream.
struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
}

const UNARY_BP: u8 = 5;

/// Left and right binding power of an infix operator.
fn binding_power(op: BinaryOp) -> (u8, u8) {
    match op {
        BinaryOp::Add | BinaryOp::Sub => (1, 2),
        BinaryOp::Mul | BinaryOp::Div => (3, 4),
        // right associative and tighter than unary minus: -x^2 == -(x^2)
        BinaryOp::Pow => (8, 7),
    }
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn peek_with_position(&self) -> Option<(usize, &Token)> {
        self.tokens.get(self.pos).map(|(p, t)| (*p, t))
    }

    fn end_position(&self) -> usize {
        self.tokens.last().map_or(0, |(p, _)| p + 1)
    }

    fn next(&mut self) -> Option<(usize, Token)> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expect_rparen(&mut self) -> Result<(), ExpressionError> {
        match self.next() {
            Some((_, Token::RParen)) => Ok(()),
            Some((position, token)) => Err(ExpressionError::Syntax {
                position,
                message: format!("expected `)`, found {token}"),
            }),
            None => Err(ExpressionError::Syntax {
                position: self.end_position(),
                message: "expected `)`".to_string(),
            }),
        }
    }

    fn expression(&mut self, min_bp: u8) -> Result<Expr, ExpressionError> {
        let mut lhs = self.prefix()?;

        while let Some(Token::Op(op)) = self.peek() {
            let op = *op;
            let (left_bp, right_bp) = binding_power(op);
            if left_bp < min_bp {
                break;
            }
            self.pos += 1;
            let rhs = self.expression(right_bp)?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn prefix(&mut self) -> Result<Expr, ExpressionError> {
        let Some((position, token)) = self.next() else {
            return Err(ExpressionError::Syntax {
                position: self.end_position(),
                message: "unexpected end of expression".to_string(),
            });
        };

        match token {
            Token::Number(v) => Ok(Expr::Number(v)),
            Token::Op(BinaryOp::Sub) => Ok(Expr::Neg(Box::new(self.expression(UNARY_BP)?))),
            Token::Op(BinaryOp::Add) => self.expression(UNARY_BP),
            Token::LParen => {
                let inner = self.expression(0)?;
                self.expect_rparen()?;
                Ok(inner)
            }
            Token::Ident(name) => {
                if self.peek() != Some(&Token::LParen) {
                    return Ok(Expr::Variable(name));
                }
                let function = Function::from_name(&name)
                    .ok_or_else(|| ExpressionError::UnknownFunction(name.clone()))?;
                self.pos += 1;
                let arg = self.expression(0)?;
                self.expect_rparen()?;
                Ok(Expr::Call {
                    function,
                    arg: Box::new(arg),
                })
            }
            other => Err(ExpressionError::Syntax {
                position,
                message: format!("unexpected {other}"),
            }),
        }
    }
}
