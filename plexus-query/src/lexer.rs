use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenType {
    // Keywords
    Match,
    Where,
    Return,
    As,
    And,
    Or,
    Contains,
    Starts,
    With,

    // Symbols
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    LeftParen,
    RightParen,
    Colon,
    Comma,
    Dot,
    Pipe,
    Tilde,

    // Connections
    LeftArrow,
    RightArrow,
    Dash,

    // Operators
    Equals,
    NotEquals,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,

    // Literals
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),

    // Identifiers
    Identifier(String),

    // Special
    Asterisk,
    RangeDots,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    pub line: usize,
    pub column: usize,
}

pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, (usize, usize, String)> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        tokens.push(Token {
            token_type: TokenType::Eof,
            line: self.line,
            column: self.column,
        });
        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Option<Token>, (usize, usize, String)> {
        self.skip_whitespace();

        if self.chars.peek().is_none() {
            return Ok(None);
        }

        let start_line = self.line;
        let start_column = self.column;
        let char = self.advance().unwrap();

        // String literals
        if char == '\'' || char == '"' {
            return Ok(Some(self.read_string(char, start_line, start_column)?));
        }

        // Number literals
        if char.is_ascii_digit() {
            return Ok(Some(self.read_number(char, start_line, start_column)?));
        }

        // Identifiers and keywords
        if char.is_alphabetic() || char == '_' {
            return Ok(Some(self.read_identifier(char, start_line, start_column)));
        }

        // Operators and symbols
        let token_type = match char {
            '[' => TokenType::LeftBracket,
            ']' => TokenType::RightBracket,
            '{' => TokenType::LeftBrace,
            '}' => TokenType::RightBrace,
            '(' => TokenType::LeftParen,
            ')' => TokenType::RightParen,
            ':' => TokenType::Colon,
            ',' => TokenType::Comma,
            '|' => TokenType::Pipe,
            '~' => TokenType::Tilde,
            '*' => TokenType::Asterisk,
            '.' => {
                if let Some(&'.') = self.chars.peek() {
                    self.advance();
                    TokenType::RangeDots
                } else {
                    TokenType::Dot
                }
            }
            '-' => {
                if let Some(&'>') = self.chars.peek() {
                    self.advance();
                    TokenType::RightArrow
                } else {
                    TokenType::Dash
                }
            }
            '<' => {
                if let Some(&'-') = self.chars.peek() {
                    self.advance();
                    TokenType::LeftArrow
                } else if let Some(&'=') = self.chars.peek() {
                    self.advance();
                    TokenType::LessEqual
                } else if let Some(&'>') = self.chars.peek() {
                    self.advance();
                    TokenType::NotEquals
                } else {
                    TokenType::LessThan
                }
            }
            '>' => {
                if let Some(&'=') = self.chars.peek() {
                    self.advance();
                    TokenType::GreaterEqual
                } else {
                    TokenType::GreaterThan
                }
            }
            '=' => TokenType::Equals,
            '!' => {
                if let Some(&'=') = self.chars.peek() {
                    self.advance();
                    TokenType::NotEquals
                } else {
                    return Err((
                        start_line,
                        start_column,
                        format!("unexpected character: {char}"),
                    ));
                }
            }
            _ => {
                return Err((
                    start_line,
                    start_column,
                    format!("unexpected character: {char}"),
                ));
            }
        };

        Ok(Some(Token {
            token_type,
            line: start_line,
            column: start_column,
        }))
    }

    fn advance(&mut self) -> Option<char> {
        let char = self.chars.next();
        if let Some(c) = char {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        char
    }

    fn skip_whitespace(&mut self) {
        while let Some(&char) = self.chars.peek() {
            if char.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_string(
        &mut self,
        quote: char,
        line: usize,
        column: usize,
    ) -> Result<Token, (usize, usize, String)> {
        let mut value = String::new();
        loop {
            match self.chars.peek() {
                Some(&char) if char == quote => {
                    self.advance();
                    break;
                }
                Some(&char) => {
                    value.push(char);
                    self.advance();
                }
                None => return Err((line, column, "unterminated string literal".to_string())),
            }
        }
        Ok(Token {
            token_type: TokenType::Str(value),
            line,
            column,
        })
    }

    fn read_number(
        &mut self,
        first: char,
        line: usize,
        column: usize,
    ) -> Result<Token, (usize, usize, String)> {
        let mut value = String::new();
        value.push(first);
        let mut has_dot = false;
        while let Some(&char) = self.chars.peek() {
            if char.is_ascii_digit() {
                value.push(char);
                self.advance();
            } else if char == '.' && !has_dot {
                // Distinguish a float fraction (2.5) from the range operator (2..5).
                let mut lookahead = self.chars.clone();
                lookahead.next();
                if lookahead.peek() == Some(&'.') {
                    break;
                }
                has_dot = true;
                value.push(char);
                self.advance();
            } else {
                break;
            }
        }
        let token_type = if has_dot {
            let number = value
                .parse::<f64>()
                .map_err(|_| (line, column, format!("invalid number: {value}")))?;
            TokenType::Float(number)
        } else {
            let number = value
                .parse::<i64>()
                .map_err(|_| (line, column, format!("invalid number: {value}")))?;
            TokenType::Int(number)
        };
        Ok(Token {
            token_type,
            line,
            column,
        })
    }

    fn read_identifier(&mut self, first: char, line: usize, column: usize) -> Token {
        let mut value = String::new();
        value.push(first);
        while let Some(&char) = self.chars.peek() {
            if char.is_alphanumeric() || char == '_' {
                value.push(char);
                self.advance();
            } else {
                break;
            }
        }

        let token_type = match value.to_uppercase().as_str() {
            "MATCH" => TokenType::Match,
            "WHERE" => TokenType::Where,
            "RETURN" => TokenType::Return,
            "AS" => TokenType::As,
            "AND" => TokenType::And,
            "OR" => TokenType::Or,
            "CONTAINS" => TokenType::Contains,
            "STARTS" => TokenType::Starts,
            "WITH" => TokenType::With,
            "TRUE" => TokenType::Bool(true),
            "FALSE" => TokenType::Bool(false),
            _ => TokenType::Identifier(value),
        };

        Token {
            token_type,
            line,
            column,
        }
    }
}
