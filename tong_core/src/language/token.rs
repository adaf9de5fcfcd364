use std::fmt;
use serde::Serialize;

#[derive(Debug, PartialEq, Clone, Serialize)]
pub enum TokenType {
    Integer(i64),       // 42
    Float(f64),         // 4.2
    String(String),     // "..." / '...'
    Identifier(String), // names
    // -------- //
    Let,                // let
    Var,                // var
    Fn,                 // fn
    If,                 // if
    Else,               // else
    Match,              // match
    While,              // while
    For,                // for
    Loop,               // loop
    Break,              // break
    Continue,           // continue
    Return,             // return
    Async,              // async
    Await,              // await
    Parallel,           // parallel
    Distributed,        // distributed
    GpuKernel,          // gpu_kernel
    Owned,              // owned
    Shared,             // shared
    True,               // true
    False,              // false
    None,               // None
    Some,               // Some
    // -------- //
    Plus,               // +
    Minus,              // -
    Star,               // *
    Slash,              // /
    Percent,            // %
    Power,              // **
    Equals,             // =
    DoubleEquals,       // ==
    NotEquals,          // !=
    Less,               // <
    LessEquals,         // <=
    Greater,            // >
    GreaterEquals,      // >=
    Bang,               // !
    LogicalAnd,         // &&
    LogicalOr,          // ||
    Ampersand,          // &
    Pipe,               // |
    Arrow,              // ->
    FatArrow,           // =>
    DoubleColon,        // ::
    // -------- //
    LParen,             // (
    RParen,             // )
    LBracket,           // [
    RBracket,           // ]
    LBrace,             // {
    RBrace,             // }
    Comma,              // ,
    Semicolon,          // ;
    Colon,              // :
    Dot,                // .
    Question,           // ?
    Newline,            // \n
    EOF,
}

impl TokenType {
    pub fn keyword(word: &str) -> Option<TokenType> {
        let token = match word {
            "let" => TokenType::Let,
            "var" => TokenType::Var,
            "fn" => TokenType::Fn,
            "if" => TokenType::If,
            "else" => TokenType::Else,
            "match" => TokenType::Match,
            "while" => TokenType::While,
            "for" => TokenType::For,
            "loop" => TokenType::Loop,
            "break" => TokenType::Break,
            "continue" => TokenType::Continue,
            "return" => TokenType::Return,
            "async" => TokenType::Async,
            "await" => TokenType::Await,
            "parallel" => TokenType::Parallel,
            "distributed" => TokenType::Distributed,
            "gpu_kernel" => TokenType::GpuKernel,
            "owned" => TokenType::Owned,
            "shared" => TokenType::Shared,
            "true" => TokenType::True,
            "false" => TokenType::False,
            "None" => TokenType::None,
            "Some" => TokenType::Some,
            _ => return None,
        };
        Some(token)
    }

    /// Upper-case kind name used by the token dump.
    pub fn kind_name(&self) -> &'static str {
        match self {
            TokenType::Integer(_) => "INTEGER",
            TokenType::Float(_) => "FLOAT",
            TokenType::String(_) => "STRING",
            TokenType::Identifier(_) => "IDENTIFIER",
            TokenType::Newline => "NEWLINE",
            TokenType::EOF => "EOF",
            t if t.is_keyword() => "KEYWORD",
            _ => "SYMBOL",
        }
    }

    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenType::Let | TokenType::Var | TokenType::Fn | TokenType::If | TokenType::Else
                | TokenType::Match | TokenType::While | TokenType::For | TokenType::Loop
                | TokenType::Break | TokenType::Continue | TokenType::Return | TokenType::Async
                | TokenType::Await | TokenType::Parallel | TokenType::Distributed
                | TokenType::GpuKernel | TokenType::Owned | TokenType::Shared | TokenType::True
                | TokenType::False | TokenType::None | TokenType::Some
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub token_type: TokenType,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TokenType::Integer(n) => write!(f, "{}", n),
            TokenType::Float(n) => write!(f, "{:?}", n),
            TokenType::String(s) => write!(f, "{:?}", s),
            TokenType::Identifier(id) => write!(f, "{}", id),
            TokenType::Let => write!(f, "let"),
            TokenType::Var => write!(f, "var"),
            TokenType::Fn => write!(f, "fn"),
            TokenType::If => write!(f, "if"),
            TokenType::Else => write!(f, "else"),
            TokenType::Match => write!(f, "match"),
            TokenType::While => write!(f, "while"),
            TokenType::For => write!(f, "for"),
            TokenType::Loop => write!(f, "loop"),
            TokenType::Break => write!(f, "break"),
            TokenType::Continue => write!(f, "continue"),
            TokenType::Return => write!(f, "return"),
            TokenType::Async => write!(f, "async"),
            TokenType::Await => write!(f, "await"),
            TokenType::Parallel => write!(f, "parallel"),
            TokenType::Distributed => write!(f, "distributed"),
            TokenType::GpuKernel => write!(f, "gpu_kernel"),
            TokenType::Owned => write!(f, "owned"),
            TokenType::Shared => write!(f, "shared"),
            TokenType::True => write!(f, "true"),
            TokenType::False => write!(f, "false"),
            TokenType::None => write!(f, "None"),
            TokenType::Some => write!(f, "Some"),
            TokenType::Plus => write!(f, "+"),
            TokenType::Minus => write!(f, "-"),
            TokenType::Star => write!(f, "*"),
            TokenType::Slash => write!(f, "/"),
            TokenType::Percent => write!(f, "%"),
            TokenType::Power => write!(f, "**"),
            TokenType::Equals => write!(f, "="),
            TokenType::DoubleEquals => write!(f, "=="),
            TokenType::NotEquals => write!(f, "!="),
            TokenType::Less => write!(f, "<"),
            TokenType::LessEquals => write!(f, "<="),
            TokenType::Greater => write!(f, ">"),
            TokenType::GreaterEquals => write!(f, ">="),
            TokenType::Bang => write!(f, "!"),
            TokenType::LogicalAnd => write!(f, "&&"),
            TokenType::LogicalOr => write!(f, "||"),
            TokenType::Ampersand => write!(f, "&"),
            TokenType::Pipe => write!(f, "|"),
            TokenType::Arrow => write!(f, "->"),
            TokenType::FatArrow => write!(f, "=>"),
            TokenType::DoubleColon => write!(f, "::"),
            TokenType::LParen => write!(f, "("),
            TokenType::RParen => write!(f, ")"),
            TokenType::LBracket => write!(f, "["),
            TokenType::RBracket => write!(f, "]"),
            TokenType::LBrace => write!(f, "{{"),
            TokenType::RBrace => write!(f, "}}"),
            TokenType::Comma => write!(f, ","),
            TokenType::Semicolon => write!(f, ";"),
            TokenType::Colon => write!(f, ":"),
            TokenType::Dot => write!(f, "."),
            TokenType::Question => write!(f, "?"),
            TokenType::Newline => write!(f, "\\n"),
            TokenType::EOF => write!(f, "<eof>"),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{} {} {}", self.line, self.column, self.token_type.kind_name(), self.token_type)
    }
}
