use log::{debug, trace};
use crate::language::token::{Token, TokenType};

/// Hand-written scanner. Never fails: unknown characters are dropped and an
/// unterminated string runs to the end of the input.
pub struct Lexer {
    pub(crate) input: Vec<char>,
    pub(crate) position: usize,
    pub(crate) line: usize,
    pub(crate) column: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    pub fn peek_next(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    pub fn consume(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += 1;

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    fn consume_if(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.consume();
            true
        } else {
            false
        }
    }

    pub fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == ' ' || ch == '\t' || ch == '\r' {
                self.consume();
            } else {
                break;
            }
        }
    }

    /// Skips a `//` or `/* */` comment if one starts here.
    fn skip_comment(&mut self) -> bool {
        match (self.peek(), self.peek_next()) {
            (Some('/'), Some('/')) => {
                while let Some(ch) = self.peek() {
                    if ch == '\n' {
                        break;
                    }
                    self.consume();
                }
                true
            }
            (Some('/'), Some('*')) => {
                self.consume();
                self.consume();
                loop {
                    match (self.peek(), self.peek_next()) {
                        (Some('*'), Some('/')) => {
                            self.consume();
                            self.consume();
                            break;
                        }
                        (Some(_), _) => {
                            self.consume();
                        }
                        (None, _) => break,
                    }
                }
                true
            }
            _ => false,
        }
    }

    pub fn read_identifier(&mut self) -> String {
        let mut identifier = String::new();

        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                identifier.push(ch);
                self.consume();
            } else {
                break;
            }
        }

        identifier
    }

    pub fn read_string(&mut self, quote: char) -> String {
        self.consume();

        let mut string = String::new();

        while let Some(ch) = self.consume() {
            if ch == quote {
                return string;
            }
            if ch != '\\' {
                string.push(ch);
                continue;
            }
            match self.consume() {
                Some('n') => string.push('\n'),
                Some('t') => string.push('\t'),
                Some('r') => string.push('\r'),
                Some(other) => string.push(other),
                None => break,
            }
        }

        debug!("Unterminated string literal consumed to end of input");
        string
    }

    fn read_number(&mut self) -> TokenType {
        let mut number = String::new();

        while let Some(ch) = self.peek().filter(char::is_ascii_digit) {
            number.push(ch);
            self.consume();
        }

        let is_float = self.peek() == Some('.')
            && self.peek_next().is_some_and(|ch| ch.is_ascii_digit());

        if is_float {
            number.push('.');
            self.consume();
            while let Some(ch) = self.peek().filter(char::is_ascii_digit) {
                number.push(ch);
                self.consume();
            }
        }

        if !is_float {
            if let Ok(value) = number.parse::<i64>() {
                return TokenType::Integer(value);
            }
            trace!("Integer literal {} does not fit in i64, lexing as float", number);
        }

        // A run of ASCII digits with at most one dot always parses as f64.
        TokenType::Float(number.parse::<f64>().unwrap_or(f64::INFINITY))
    }

    fn symbol(&mut self, ch: char) -> Option<TokenType> {
        self.consume();

        let token_type = match ch {
            '(' => TokenType::LParen,
            ')' => TokenType::RParen,
            '[' => TokenType::LBracket,
            ']' => TokenType::RBracket,
            '{' => TokenType::LBrace,
            '}' => TokenType::RBrace,
            ',' => TokenType::Comma,
            ';' => TokenType::Semicolon,
            '.' => TokenType::Dot,
            '?' => TokenType::Question,
            '+' => TokenType::Plus,
            '/' => TokenType::Slash,
            '%' => TokenType::Percent,
            '\n' => TokenType::Newline,
            '*' => {
                if self.consume_if('*') { TokenType::Power } else { TokenType::Star }
            }
            '-' => {
                if self.consume_if('>') { TokenType::Arrow } else { TokenType::Minus }
            }
            '=' => {
                if self.consume_if('=') {
                    TokenType::DoubleEquals
                } else if self.consume_if('>') {
                    TokenType::FatArrow
                } else {
                    TokenType::Equals
                }
            }
            '!' => {
                if self.consume_if('=') { TokenType::NotEquals } else { TokenType::Bang }
            }
            '<' => {
                if self.consume_if('=') { TokenType::LessEquals } else { TokenType::Less }
            }
            '>' => {
                if self.consume_if('=') { TokenType::GreaterEquals } else { TokenType::Greater }
            }
            ':' => {
                if self.consume_if(':') { TokenType::DoubleColon } else { TokenType::Colon }
            }
            '&' => {
                if self.consume_if('&') { TokenType::LogicalAnd } else { TokenType::Ampersand }
            }
            '|' => {
                if self.consume_if('|') { TokenType::LogicalOr } else { TokenType::Pipe }
            }
            _ => {
                trace!("Skipping unrecognized character {:?} at {}:{}", ch, self.line, self.column);
                return None;
            }
        };

        Some(token_type)
    }

    /// Returns the next token, `EOF` once the input is exhausted.
    pub fn next_token(&mut self) -> Token {
        loop {
            self.skip_whitespace();
            if self.skip_comment() {
                continue;
            }

            let line = self.line;
            let column = self.column;

            let Some(ch) = self.peek() else {
                return Token { token_type: TokenType::EOF, line, column };
            };

            let token_type = match ch {
                '"' | '\'' => TokenType::String(self.read_string(ch)),
                '0'..='9' => self.read_number(),
                _ if ch.is_ascii_alphabetic() || ch == '_' => {
                    let ident = self.read_identifier();
                    TokenType::keyword(&ident).unwrap_or(TokenType::Identifier(ident))
                }
                _ => match self.symbol(ch) {
                    Some(token_type) => token_type,
                    None => continue,
                },
            };

            return Token { token_type, line, column };
        }
    }

    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token();
            let done = token.token_type == TokenType::EOF;
            tokens.push(token);
            if done {
                break;
            }
        }

        trace!("Tokenized {} characters into {} tokens", self.input.len(), tokens.len());
        tokens
    }
}

pub fn tokenize(source: &str) -> Vec<Token> {
    Lexer::new(source).tokenize()
}
