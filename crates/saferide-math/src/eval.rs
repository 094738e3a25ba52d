//! Closed-grammar arithmetic evaluator.
//!
//! ```text
//! expr  := term  (('+' | '-') term)*
//! term  := unary (('*' | '/') unary)*
//! unary := ('+' | '-') unary | power
//! power := atom (('^' | '**') unary)?
//! atom  := number | '(' expr ')'
//! ```
//!
//! Power is right-associative and binds tighter than a sign on its left, so
//! `-2^2 = -4` and `2^-1 = 0.5`. Nothing but numbers and these operators is
//! reachable: input is sanitized to `[0-9+\-*/.()^ ]` before tokenizing.

use thiserror::Error;

/// Nesting limit for parentheses and chained signs.
const MAX_DEPTH: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("nothing to evaluate")]
    Empty,
    #[error("malformed expression")]
    Syntax,
    #[error("division by zero")]
    DivisionByZero,
    #[error("result is not a finite number")]
    NonFinite,
    #[error("expression nested too deeply")]
    TooDeep,
}

/// Operator substitutions followed by removal of every character outside
/// the arithmetic alphabet.
pub fn sanitize(expr: &str) -> String {
    expr.chars()
        .map(|c| match c {
            '×' | 'x' => '*',
            '÷' => '/',
            other => other,
        })
        .filter(|c| matches!(c, '0'..='9' | '+' | '-' | '*' | '/' | '.' | '(' | ')' | '^' | ' '))
        .collect()
}

/// Evaluates a free-form expression; every failure collapses to `None`.
pub fn evaluate(expr: &str) -> Option<f64> {
    match try_evaluate(expr) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::debug!(expr, error = %e, "math evaluation failed");
            None
        }
    }
}

pub fn try_evaluate(expr: &str) -> Result<f64, EvalError> {
    let clean = sanitize(expr);
    if clean.trim().is_empty() {
        return Err(EvalError::Empty);
    }
    let tokens = tokenize(&clean)?;
    let mut parser = Parser { tokens: &tokens, pos: 0, depth: 0 };
    let value = parser.expr()?;
    if parser.pos != tokens.len() {
        return Err(EvalError::Syntax);
    }
    if value.is_finite() { Ok(value) } else { Err(EvalError::NonFinite) }
}

/// Integer-valued results print without a fractional part; anything else is
/// rounded to four decimals on the exact binary value, ties to even.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        if value == 0.0 { "0".to_string() } else { format!("{value:.0}") }
    } else {
        let rounded = format!("{value:.4}").parse::<f64>().unwrap_or(value);
        if rounded.fract() == 0.0 { format!("{rounded:.1}") } else { format!("{rounded}") }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Num(f64),
    Plus,
    Minus,
    Star,
    Slash,
    Pow,
    LParen,
    RParen,
}

fn tokenize(src: &str) -> Result<Vec<Token>, EvalError> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' => {}
            '+' => tokens.push(Token::Plus),
            '-' => tokens.push(Token::Minus),
            '*' if chars.get(i + 1) == Some(&'*') => {
                tokens.push(Token::Pow);
                i += 1;
            }
            '*' => tokens.push(Token::Star),
            '/' => tokens.push(Token::Slash),
            '^' => tokens.push(Token::Pow),
            '(' => tokens.push(Token::LParen),
            ')' => tokens.push(Token::RParen),
            '0'..='9' | '.' => {
                let start = i;
                while i + 1 < chars.len() && matches!(chars[i + 1], '0'..='9' | '.') {
                    i += 1;
                }
                let literal: String = chars[start..=i].iter().collect();
                let value = literal.parse::<f64>().map_err(|_| EvalError::Syntax)?;
                tokens.push(Token::Num(value));
            }
            _ => return Err(EvalError::Syntax),
        }
        i += 1;
    }
    Ok(tokens)
}

struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<Token> {
        let t = self.peek();
        if t.is_some() { self.pos += 1; }
        t
    }

    fn descend(&mut self) -> Result<(), EvalError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH { Err(EvalError::TooDeep) } else { Ok(()) }
    }

    fn expr(&mut self) -> Result<f64, EvalError> {
        let mut acc = self.term()?;
        while let Some(op @ (Token::Plus | Token::Minus)) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            acc = if op == Token::Plus { acc + rhs } else { acc - rhs };
        }
        Ok(acc)
    }

    fn term(&mut self) -> Result<f64, EvalError> {
        let mut acc = self.unary()?;
        while let Some(op @ (Token::Star | Token::Slash)) = self.peek() {
            self.pos += 1;
            let rhs = self.unary()?;
            acc = if op == Token::Star {
                acc * rhs
            } else {
                if rhs == 0.0 {
                    return Err(EvalError::DivisionByZero);
                }
                acc / rhs
            };
        }
        Ok(acc)
    }

    fn unary(&mut self) -> Result<f64, EvalError> {
        match self.peek() {
            Some(sign @ (Token::Plus | Token::Minus)) => {
                self.pos += 1;
                self.descend()?;
                let v = self.unary()?;
                self.depth -= 1;
                Ok(if sign == Token::Minus { -v } else { v })
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<f64, EvalError> {
        let base = self.atom()?;
        if self.peek() == Some(Token::Pow) {
            self.pos += 1;
            self.descend()?;
            let exp = self.unary()?;
            self.depth -= 1;
            if base == 0.0 && exp < 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            let v = base.powf(exp);
            return if v.is_finite() { Ok(v) } else { Err(EvalError::NonFinite) };
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<f64, EvalError> {
        match self.bump() {
            Some(Token::Num(v)) => Ok(v),
            Some(Token::LParen) => {
                self.descend()?;
                let v = self.expr()?;
                self.depth -= 1;
                match self.bump() {
                    Some(Token::RParen) => Ok(v),
                    _ => Err(EvalError::Syntax),
                }
            }
            _ => Err(EvalError::Syntax),
        }
    }
}
