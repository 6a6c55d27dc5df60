//! Formula parser
//!
//! A recursive descent parser for cell formulas. It does not build a tree
//! itself: every recognized operand and operator is reported to an
//! [`ExprBuilder`] in postfix order.
//!
//! Precedence, lowest to highest:
//! 1. Comparison: `=`, `<>`, `<`, `<=`, `>`, `>=`
//! 2. Addition/Subtraction: `+`, `-`
//! 3. Multiplication/Division: `*`, `/`
//! 4. Prefix sign: `-`, `+`
//! 5. Exponentiation: `^` (left-associative, the exponent may carry a sign)
//! 6. Primary: literals, references, ranges, function calls, parentheses
//!
//! A prefix minus therefore applies to the whole power: `-A1^2` is
//! `-(A1^2)`.

use crate::ast::FormulaExpr;
use crate::builder::{AstBuilder, ExprBuilder, MAX_TREE_DEPTH};
use crate::error::{FormulaError, FormulaResult};
use lazy_regex::regex_is_match;

/// Parse a formula string into an AST
///
/// # Example
/// ```rust
/// use gridcalc_formula::parse_formula;
///
/// let ast = parse_formula("=1+2").unwrap();
/// assert_eq!(ast.to_string(), "(1.0000000000000000e0+2.0000000000000000e0)");
///
/// assert!(parse_formula("1+2").is_err());
/// assert!(parse_formula("=A1:B2").is_err());
/// ```
pub fn parse_formula(formula: &str) -> FormulaResult<FormulaExpr> {
    let mut builder = AstBuilder::new();
    parse_formula_with(formula, &mut builder)?;
    builder.take_result()
}

/// Parse a formula string, reporting it to `builder`
///
/// On error the builder may have received a partial event stream.
pub fn parse_formula_with<B: ExprBuilder + ?Sized>(
    formula: &str,
    builder: &mut B,
) -> FormulaResult<()> {
    // Formula must start with '='
    let body = formula
        .strip_prefix('=')
        .ok_or_else(|| FormulaError::Parse("Formula must start with '='".into()))?;

    let mut parser = FormulaParser::new(body, builder)?;
    parser.parse_comparison()?;

    // Make sure we consumed all input
    if parser.current_token != Token::Eof {
        return Err(FormulaError::Parse(format!(
            "Unexpected {:?} after expression",
            parser.current_token
        )));
    }

    Ok(())
}

/// Deepest nesting of parentheses and function calls
///
/// The canonical text of any tree [`AstBuilder`] accepts nests less deeply
/// than this, so it always parses back.
pub const MAX_NESTING: usize = MAX_TREE_DEPTH;

/// Token types
#[derive(Debug, Clone, PartialEq)]
enum Token {
    // Literals
    Number(f64),
    String(String),
    RefError,

    // Identifiers and references
    Identifier(String), // Function name
    CellRef(String),    // Cell reference like A1, $A$1

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    Colon,
    Comma,

    // Delimiters
    LeftParen,
    RightParen,

    // End of input
    Eof,
}

/// Formula parser
struct FormulaParser<'a, B: ?Sized> {
    input: &'a str,
    pos: usize,
    current_token: Token,
    builder: &'a mut B,
    /// Current nesting level
    depth: usize,
}

impl<'a, B: ExprBuilder + ?Sized> FormulaParser<'a, B> {
    fn new(input: &'a str, builder: &'a mut B) -> FormulaResult<Self> {
        let mut parser = Self {
            input,
            pos: 0,
            current_token: Token::Eof,
            builder,
            depth: 0,
        };
        parser.advance_token()?;
        Ok(parser)
    }

    // === Token scanning ===

    fn advance_token(&mut self) -> FormulaResult<()> {
        self.current_token = self.scan_token()?;
        Ok(())
    }

    fn scan_token(&mut self) -> FormulaResult<Token> {
        self.skip_whitespace();

        let Some(c) = self.peek_char() else {
            return Ok(Token::Eof);
        };

        // Single-character tokens
        let single = match c {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '^' => Some(Token::Caret),
            '=' => Some(Token::Equal),
            ':' => Some(Token::Colon),
            ',' => Some(Token::Comma),
            '(' => Some(Token::LeftParen),
            ')' => Some(Token::RightParen),
            _ => None,
        };
        if let Some(token) = single {
            self.advance();
            return Ok(token);
        }

        // Two-character operators
        if c == '<' {
            self.advance();
            if self.peek_char() == Some('=') {
                self.advance();
                return Ok(Token::LessEqual);
            } else if self.peek_char() == Some('>') {
                self.advance();
                return Ok(Token::NotEqual);
            }
            return Ok(Token::LessThan);
        }

        if c == '>' {
            self.advance();
            if self.peek_char() == Some('=') {
                self.advance();
                return Ok(Token::GreaterEqual);
            }
            return Ok(Token::GreaterThan);
        }

        // String literal
        if c == '"' {
            return self.scan_string();
        }

        // Number
        if c.is_ascii_digit()
            || (c == '.' && self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit()))
        {
            return self.scan_number();
        }

        if c == '#' {
            return self.scan_error_literal();
        }

        // Identifier or cell reference
        if c.is_ascii_alphabetic() || c == '_' || c == '$' {
            return Ok(self.scan_identifier_or_ref());
        }

        Err(FormulaError::Parse(format!(
            "Unexpected character '{}' at offset {}",
            c, self.pos
        )))
    }

    fn scan_string(&mut self) -> FormulaResult<Token> {
        let start = self.pos;
        self.advance(); // Skip opening quote

        let mut s = String::new();
        loop {
            match self.peek_char() {
                Some('"') => {
                    self.advance();
                    // A doubled quote is a literal quote
                    if self.peek_char() == Some('"') {
                        s.push('"');
                        self.advance();
                    } else {
                        return Ok(Token::String(s));
                    }
                }
                Some(c) => {
                    s.push(c);
                    self.advance();
                }
                None => {
                    return Err(FormulaError::Parse(format!(
                        "Unterminated string starting at offset {}",
                        start
                    )))
                }
            }
        }
    }

    fn scan_number(&mut self) -> FormulaResult<Token> {
        let start = self.pos;

        // Integer part
        self.skip_digits();

        // Decimal part
        if self.peek_char() == Some('.') {
            self.advance();
            self.skip_digits();
        }

        // Exponent part
        if self.peek_char().map_or(false, |c| c == 'e' || c == 'E') {
            self.advance();
            if self.peek_char().map_or(false, |c| c == '+' || c == '-') {
                self.advance();
            }
            self.skip_digits();
        }

        let num_str = &self.input[start..self.pos];
        num_str
            .parse::<f64>()
            .map(Token::Number)
            .map_err(|_| FormulaError::Parse(format!("Invalid number '{}'", num_str)))
    }

    fn scan_error_literal(&mut self) -> FormulaResult<Token> {
        let start = self.pos;
        self.advance();
        while self
            .peek_char()
            .map_or(false, |c| c.is_ascii_alphanumeric() || matches!(c, '!' | '/' | '?'))
        {
            self.advance();
        }

        match &self.input[start..self.pos] {
            "#REF!" => Ok(Token::RefError),
            other => Err(FormulaError::Parse(format!(
                "Unsupported error literal '{}'",
                other
            ))),
        }
    }

    fn scan_identifier_or_ref(&mut self) -> Token {
        let start = self.pos;

        while self
            .peek_char()
            .map_or(false, |c| c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '.')
        {
            self.advance();
        }

        let text = &self.input[start..self.pos];

        // LOG10(...) is a call, not a reference to LOG10
        if regex_is_match!(r"^\$?[A-Z]+\$?[0-9]+$", text) && self.peek_char() != Some('(') {
            return Token::CellRef(text.to_string());
        }

        Token::Identifier(text.to_string())
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().map_or(false, char::is_whitespace) {
            self.advance();
        }
    }

    fn skip_digits(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    fn consume(&mut self) -> FormulaResult<Token> {
        let next = self.scan_token()?;
        Ok(std::mem::replace(&mut self.current_token, next))
    }

    fn expect(&mut self, expected: &Token) -> FormulaResult<()> {
        if &self.current_token == expected {
            self.consume()?;
            Ok(())
        } else {
            Err(FormulaError::Parse(format!(
                "Expected {:?}, got {:?}",
                expected, self.current_token
            )))
        }
    }

    /// Run `parse` one nesting level deeper
    fn nested(&mut self, parse: impl FnOnce(&mut Self) -> FormulaResult<()>) -> FormulaResult<()> {
        if self.depth >= MAX_NESTING {
            return Err(FormulaError::Parse(format!(
                "formula is nested deeper than {} levels",
                MAX_NESTING
            )));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    // === Expression parsing with precedence ===

    fn parse_comparison(&mut self) -> FormulaResult<()> {
        self.parse_additive()?;

        loop {
            let emit: fn(&mut B) -> FormulaResult<()> = match self.current_token {
                Token::Equal => B::op_eq,
                Token::NotEqual => B::op_ne,
                Token::LessThan => B::op_lt,
                Token::LessEqual => B::op_le,
                Token::GreaterThan => B::op_gt,
                Token::GreaterEqual => B::op_ge,
                _ => break,
            };

            self.consume()?;
            self.parse_additive()?;
            emit(&mut *self.builder)?;
        }

        Ok(())
    }

    fn parse_additive(&mut self) -> FormulaResult<()> {
        self.parse_multiplicative()?;

        loop {
            let emit: fn(&mut B) -> FormulaResult<()> = match self.current_token {
                Token::Plus => B::op_add,
                Token::Minus => B::op_sub,
                _ => break,
            };

            self.consume()?;
            self.parse_multiplicative()?;
            emit(&mut *self.builder)?;
        }

        Ok(())
    }

    fn parse_multiplicative(&mut self) -> FormulaResult<()> {
        self.parse_unary()?;

        loop {
            let emit: fn(&mut B) -> FormulaResult<()> = match self.current_token {
                Token::Star => B::op_mul,
                Token::Slash => B::op_div,
                _ => break,
            };

            self.consume()?;
            self.parse_unary()?;
            emit(&mut *self.builder)?;
        }

        Ok(())
    }

    fn parse_unary(&mut self) -> FormulaResult<()> {
        let negations = self.skip_signs()?;
        self.parse_power()?;
        self.emit_negations(negations)
    }

    fn parse_power(&mut self) -> FormulaResult<()> {
        self.parse_primary()?;

        while self.current_token == Token::Caret {
            self.consume()?;
            self.parse_power_operand()?;
            self.builder.op_pow()?;
        }

        Ok(())
    }

    fn parse_power_operand(&mut self) -> FormulaResult<()> {
        let negations = self.skip_signs()?;
        self.parse_primary()?;
        self.emit_negations(negations)
    }

    /// Consume a run of prefix signs, counting the minuses
    fn skip_signs(&mut self) -> FormulaResult<usize> {
        let mut negations = 0;
        loop {
            match self.current_token {
                Token::Minus => negations += 1,
                // Prefix plus (no-op)
                Token::Plus => {}
                _ => return Ok(negations),
            }
            self.consume()?;
        }
    }

    fn emit_negations(&mut self, count: usize) -> FormulaResult<()> {
        for _ in 0..count {
            self.builder.op_neg()?;
        }
        Ok(())
    }

    fn parse_primary(&mut self) -> FormulaResult<()> {
        match self.consume()? {
            Token::Number(n) => self.builder.val_number(n),

            Token::String(s) => self.builder.val_string(s),

            Token::RefError => self.builder.val_reference("#REF!"),

            Token::CellRef(start) => {
                if self.current_token != Token::Colon {
                    return self.builder.val_reference(&start);
                }
                self.consume()?;
                match self.consume()? {
                    Token::CellRef(end) => self.builder.val_range(&format!("{}:{}", start, end)),
                    other => Err(FormulaError::Parse(format!(
                        "Expected cell reference after ':', got {:?}",
                        other
                    ))),
                }
            }

            Token::Identifier(name) => {
                if self.current_token == Token::LeftParen {
                    self.nested(|parser| parser.parse_function_call(&name))
                } else {
                    Err(FormulaError::Parse(format!("Unknown name '{}'", name)))
                }
            }

            Token::LeftParen => {
                self.nested(Self::parse_comparison)?;
                self.expect(&Token::RightParen)
            }

            other => Err(FormulaError::Parse(format!("Unexpected token: {:?}", other))),
        }
    }

    fn parse_function_call(&mut self, name: &str) -> FormulaResult<()> {
        self.expect(&Token::LeftParen)?;

        let mut arg_count = 0;

        // Parse arguments
        if self.current_token != Token::RightParen {
            self.parse_comparison()?;
            arg_count += 1;

            while self.current_token == Token::Comma {
                self.consume()?;
                self.parse_comparison()?;
                arg_count += 1;
            }
        }

        self.expect(&Token::RightParen)?;
        self.builder.func_call(&name.to_uppercase(), arg_count)
    }
}
