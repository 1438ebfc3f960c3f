//! On-demand tokenizer for Mython source text.
//!
//! Tokens are materialized lazily: the buffer holds everything produced so
//! far and a cursor marks the current token. Block structure is synthesized
//! from leading whitespace as `Indent`/`Dedent` tokens (off-side rule).

use thiserror::Error;

use crate::token::Token;

/// Width of one indentation level, in spaces.
pub const INDENT_WIDTH: usize = 2;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexerError {
    #[error("Indent of {width} spaces at position {position} is not a multiple of 2")]
    MisalignedIndent { width: usize, position: usize },
    #[error("Unexpected character '{character}' at position {position}")]
    UnexpectedCharacter { character: char, position: usize },
    #[error("Number literal '{literal}' at position {position} is out of range")]
    NumberOutOfRange { literal: String, position: usize },
    #[error("Expected {expected:?}, found {found:?}")]
    TokenMismatch { expected: Token, found: Token },
    #[error("Expected an identifier, found {found:?}")]
    ExpectedIdentifier { found: Token },
}

pub type LexResult<T> = Result<T, LexerError>;

pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    /// Current indentation level in units of [`INDENT_WIDTH`] spaces.
    indent: usize,
    tokens: Vec<Token>,
    current: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer and scans the first token, so [`Lexer::current`] is
    /// valid immediately.
    pub fn new(input: &'a str) -> LexResult<Self> {
        let mut lexer = Self {
            input,
            pos: 0,
            indent: 0,
            tokens: Vec::new(),
            current: 0,
        };
        lexer.scan_step()?;
        Ok(lexer)
    }

    /// The token under the cursor. The constructor guarantees the buffer is
    /// never empty.
    pub fn current(&self) -> &Token {
        &self.tokens[self.current]
    }

    /// Advances one position and returns the new current token. Once `Eof`
    /// is current, every further call keeps returning `Eof`.
    pub fn next_token(&mut self) -> LexResult<&Token> {
        if self.current + 1 >= self.tokens.len()
            && !matches!(self.tokens.last(), Some(Token::Eof))
        {
            self.scan_step()?;
        }
        if self.current + 1 < self.tokens.len() {
            self.current += 1;
        }
        Ok(self.current())
    }

    /// Asserts that the current token equals `expected` and returns it.
    pub fn expect(&self, expected: &Token) -> LexResult<&Token> {
        let current = self.current();
        if current == expected {
            Ok(current)
        } else {
            Err(LexerError::TokenMismatch {
                expected: expected.clone(),
                found: current.clone(),
            })
        }
    }

    /// Advances, then asserts the new current token equals `expected`.
    pub fn expect_next(&mut self, expected: &Token) -> LexResult<&Token> {
        self.next_token()?;
        self.expect(expected)
    }

    /// Asserts that the current token is an identifier and returns its text.
    pub fn expect_id(&self) -> LexResult<&str> {
        match self.current() {
            Token::Id(name) => Ok(name),
            other => Err(LexerError::ExpectedIdentifier {
                found: other.clone(),
            }),
        }
    }

    /// Advances, then asserts the new current token is an identifier.
    pub fn expect_next_id(&mut self) -> LexResult<&str> {
        self.next_token()?;
        self.expect_id()
    }

    /// Runs the scanning state machine until at least one token has been
    /// appended to the buffer.
    fn scan_step(&mut self) -> LexResult<()> {
        loop {
            if self.at_line_begin() {
                let start = self.pos;
                let width = self.consume_while(|c| c == ' ');
                match self.peek_char() {
                    // Blank and comment-only lines keep the current level.
                    Some('\n') | Some('#') | None => {}
                    Some(_) => {
                        if width % INDENT_WIDTH != 0 {
                            return Err(LexerError::MisalignedIndent {
                                width,
                                position: start,
                            });
                        }
                        if self.apply_indentation(width / INDENT_WIDTH) {
                            return Ok(());
                        }
                    }
                }
            }

            let Some(ch) = self.peek_char() else {
                self.push_eof_sequence();
                return Ok(());
            };

            match ch {
                ' ' => {
                    self.consume_while(|c| c == ' ');
                }
                '\n' => {
                    self.consume_char();
                    if !self.tokens.is_empty()
                        && !matches!(self.tokens.last(), Some(Token::Newline | Token::Indent))
                    {
                        self.tokens.push(Token::Newline);
                        return Ok(());
                    }
                }
                '#' => {
                    self.consume_while(|c| c != '\n');
                }
                '\'' | '"' => {
                    self.read_string(ch);
                    return Ok(());
                }
                '<' | '>' | '!' | '=' => {
                    let token = self.read_operator(ch);
                    self.tokens.push(token);
                    return Ok(());
                }
                '+' | '-' | '*' | '/' | ':' | '(' | ')' | ',' | '.' => {
                    self.consume_char();
                    self.tokens.push(Token::Char(ch));
                    return Ok(());
                }
                c if c.is_ascii_digit() => {
                    let token = self.read_number()?;
                    self.tokens.push(token);
                    return Ok(());
                }
                c if c.is_ascii_alphabetic() || c == '_' => {
                    let token = self.read_word();
                    self.tokens.push(token);
                    return Ok(());
                }
                other => {
                    return Err(LexerError::UnexpectedCharacter {
                        character: other,
                        position: self.pos,
                    });
                }
            }
        }
    }

    /// A logical line begins when nothing has been emitted yet or the last
    /// emitted token was `Newline`.
    fn at_line_begin(&self) -> bool {
        matches!(self.tokens.last(), None | Some(Token::Newline))
    }

    /// Emits the `Indent`/`Dedent` run for the new level. Returns whether
    /// any tokens were emitted.
    fn apply_indentation(&mut self, level: usize) -> bool {
        if level == self.indent {
            return false;
        }
        while self.indent < level {
            self.tokens.push(Token::Indent);
            self.indent += 1;
        }
        while self.indent > level {
            self.tokens.push(Token::Dedent);
            self.indent -= 1;
        }
        true
    }

    /// Terminates the stream: a `Newline` unless one was just emitted, the
    /// `Dedent`s needed to return to level 0, then `Eof`.
    fn push_eof_sequence(&mut self) {
        if !self.tokens.is_empty() && !matches!(self.tokens.last(), Some(Token::Newline)) {
            self.tokens.push(Token::Newline);
        }
        while self.indent > 0 {
            self.tokens.push(Token::Dedent);
            self.indent -= 1;
        }
        self.tokens.push(Token::Eof);
    }

    fn read_word(&mut self) -> Token {
        let start = self.pos;
        self.consume_while(|c| c.is_ascii_alphanumeric() || c == '_');
        Token::from_word(&self.input[start..self.pos])
    }

    fn read_number(&mut self) -> LexResult<Token> {
        let start = self.pos;
        self.consume_while(|c| c.is_ascii_digit());
        let literal = &self.input[start..self.pos];
        let value = literal
            .parse::<i64>()
            .map_err(|_| LexerError::NumberOutOfRange {
                literal: literal.to_string(),
                position: start,
            })?;
        Ok(Token::Number(value))
    }

    /// Consumes a quoted string literal and pushes its token. Reaching end
    /// of input before the closing quote abandons the partial literal and
    /// terminates the stream instead.
    fn read_string(&mut self, quote: char) {
        self.consume_char();
        let mut value = String::new();
        loop {
            match self.peek_char() {
                None => {
                    self.push_eof_sequence();
                    return;
                }
                Some(c) if c == quote => {
                    self.consume_char();
                    self.tokens.push(Token::String(value));
                    return;
                }
                Some('\\') => {
                    self.consume_char();
                    let Some(escaped) = self.peek_char() else {
                        self.push_eof_sequence();
                        return;
                    };
                    self.consume_char();
                    match escaped {
                        '"' => value.push('"'),
                        '\'' => value.push('\''),
                        't' => value.push('\t'),
                        'n' => value.push('\n'),
                        // Unknown escapes drop both characters.
                        _ => {}
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.consume_char();
                }
            }
        }
    }

    /// Scans a token starting with `<`, `>`, `!` or `=`, peeking one
    /// character for the two-character comparison operators.
    fn read_operator(&mut self, first: char) -> Token {
        self.consume_char();
        match (first, self.peek_char()) {
            ('=', Some('=')) => {
                self.consume_char();
                Token::Eq
            }
            ('!', Some('=')) => {
                self.consume_char();
                Token::NotEq
            }
            ('<', Some('=')) => {
                self.consume_char();
                Token::LessOrEq
            }
            ('>', Some('=')) => {
                self.consume_char();
                Token::GreaterOrEq
            }
            _ => Token::Char(first),
        }
    }

    fn consume_while<P>(&mut self, keep_predicate: P) -> usize
    where
        P: Fn(char) -> bool,
    {
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if !keep_predicate(c) {
                break;
            }
            self.consume_char();
        }
        self.pos - start
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn consume_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }
}

/// Drains a full token stream, `Eof` included. Mostly useful for tests and
/// benches; the parser pulls tokens one at a time.
pub fn tokenize(input: &str) -> LexResult<Vec<Token>> {
    let mut lexer = Lexer::new(input)?;
    let mut tokens = vec![lexer.current().clone()];
    while !matches!(tokens.last(), Some(Token::Eof)) {
        tokens.push(lexer.next_token()?.clone());
    }
    Ok(tokens)
}
