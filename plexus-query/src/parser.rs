use crate::ast::*;
use crate::error::{Error, Result};
use crate::lexer::{Lexer, Token, TokenType};
use plexus_api::PropertyValue;

pub struct Parser;

impl Parser {
    pub fn parse(input: &str) -> Result<Pattern> {
        let mut lexer = Lexer::new(input);
        let tokens = lexer
            .tokenize()
            .map_err(|(line, column, message)| Error::syntax(line, column, message))?;
        let mut parser = TokenParser::new(tokens);
        parser.parse_pattern()
    }
}

struct TokenParser {
    tokens: Vec<Token>,
    position: usize,
}

impl TokenParser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    fn parse_pattern(&mut self) -> Result<Pattern> {
        // Leading MATCH is optional.
        self.match_token(&TokenType::Match);

        // An empty pattern is legal and matches nothing.
        if self.is_at_end() {
            return Ok(Pattern {
                segments: Vec::new(),
                connections: Vec::new(),
                where_clause: None,
                return_items: None,
            });
        }

        let mut segments = vec![self.parse_segment()?];
        let mut connections = Vec::new();

        while self.check_connection_start() {
            connections.push(self.parse_connection()?);
            segments.push(self.parse_segment()?);
        }

        let where_clause = if self.match_token(&TokenType::Where) {
            Some(self.parse_or_expr()?)
        } else {
            None
        };

        let return_items = if self.match_token(&TokenType::Return) {
            Some(self.parse_return_items()?)
        } else {
            None
        };

        if !self.is_at_end() {
            return Err(self.error_here(format!(
                "unexpected token {:?}",
                self.peek().token_type
            )));
        }

        Ok(Pattern {
            segments,
            connections,
            where_clause,
            return_items,
        })
    }

    fn check_connection_start(&self) -> bool {
        matches!(
            self.peek().token_type,
            TokenType::Dash | TokenType::LeftArrow
        )
    }

    fn parse_segment(&mut self) -> Result<Segment> {
        let alias = self.parse_identifier("segment alias")?;

        let kind = if self.match_token(&TokenType::Colon) {
            Some(self.parse_identifier("segment type")?)
        } else {
            None
        };

        let filters = if self.check(&TokenType::LeftBrace) {
            self.parse_filters()?
        } else {
            Vec::new()
        };

        Ok(Segment {
            alias,
            kind,
            filters,
        })
    }

    fn parse_connection(&mut self) -> Result<Connection> {
        let direction = if self.match_token(&TokenType::LeftArrow) {
            Direction::In
        } else {
            self.consume(&TokenType::Dash, "expected '-' or '<-'")?;
            Direction::Out
        };

        self.consume(&TokenType::LeftBracket, "expected '[' in connection")?;

        // `[x:T]` binds x; `[:T]` has no variable.
        let variable = if self.peek_is_identifier() {
            Some(self.parse_identifier("edge variable")?)
        } else {
            None
        };

        let mut kinds = Vec::new();
        if self.match_token(&TokenType::Colon) {
            kinds.push(self.parse_identifier("edge type")?);
            while self.match_token(&TokenType::Pipe) {
                kinds.push(self.parse_identifier("edge type")?);
            }
        }

        let var_length = if self.match_token(&TokenType::Asterisk) {
            Some(self.parse_var_length()?)
        } else {
            None
        };

        let filters = if self.check(&TokenType::LeftBrace) {
            self.parse_filters()?
        } else {
            Vec::new()
        };

        self.consume(&TokenType::RightBracket, "expected ']' in connection")?;

        match direction {
            Direction::Out => {
                self.consume(&TokenType::RightArrow, "expected '->' after ']'")?;
            }
            Direction::In => {
                self.consume(&TokenType::Dash, "expected '-' after ']'")?;
            }
        }

        Ok(Connection {
            direction,
            kinds,
            variable,
            var_length,
            filters,
        })
    }

    /// `*`, `*N`, `*N..`, `*..M`, `*N..M` — the asterisk is already consumed.
    fn parse_var_length(&mut self) -> Result<VarLength> {
        let min = if let TokenType::Int(n) = self.peek().token_type {
            self.advance();
            Some(self.non_negative(n, "minimum hop count")?)
        } else {
            None
        };

        let max = if self.match_token(&TokenType::RangeDots) {
            if let TokenType::Int(n) = self.peek().token_type {
                self.advance();
                Some(self.non_negative(n, "maximum hop count")?)
            } else {
                None
            }
        } else {
            // `*N` alone pins both bounds.
            min
        };

        Ok(VarLength { min, max })
    }

    fn non_negative(&self, n: i64, what: &str) -> Result<u32> {
        u32::try_from(n).map_err(|_| self.error_here(format!("{what} must be non-negative")))
    }

    fn parse_filters(&mut self) -> Result<Vec<PropertyFilter>> {
        self.consume(&TokenType::LeftBrace, "expected '{'")?;
        let mut filters = Vec::new();

        while !self.check(&TokenType::RightBrace) {
            let key = self.parse_identifier("filter key")?;
            let op = if self.match_token(&TokenType::Equals) || self.match_token(&TokenType::Colon)
            {
                FilterOp::Eq
            } else if self.match_token(&TokenType::Tilde) {
                FilterOp::ContainsCi
            } else {
                return Err(self.error_here("expected '=', ':' or '~' in property filter"));
            };
            let value = self.parse_literal()?;
            filters.push(PropertyFilter { key, op, value });

            if !self.match_token(&TokenType::Comma) {
                break;
            }
        }

        self.consume(&TokenType::RightBrace, "expected '}'")?;
        Ok(filters)
    }

    /// Quoted string, boolean, integer, or float; integers and floats may
    /// carry a leading minus.
    fn parse_literal(&mut self) -> Result<PropertyValue> {
        let negate = self.match_token(&TokenType::Dash);
        let token = self.advance().clone();
        let value = match token.token_type {
            TokenType::Str(s) if !negate => PropertyValue::Str(s),
            TokenType::Bool(b) if !negate => PropertyValue::Bool(b),
            TokenType::Int(n) => PropertyValue::Int(if negate { -n } else { n }),
            TokenType::Float(f) => PropertyValue::Float(if negate { -f } else { f }),
            _ => {
                return Err(Error::syntax(
                    token.line,
                    token.column,
                    "expected a string, boolean, or number literal",
                ));
            }
        };
        Ok(value)
    }

    fn parse_or_expr(&mut self) -> Result<WhereExpr> {
        let mut terms = vec![self.parse_and_expr()?];
        while self.match_token(&TokenType::Or) {
            terms.push(self.parse_and_expr()?);
        }
        if terms.len() == 1 {
            Ok(terms.pop().unwrap())
        } else {
            Ok(WhereExpr::Or(terms))
        }
    }

    fn parse_and_expr(&mut self) -> Result<WhereExpr> {
        let mut terms = vec![self.parse_primary()?];
        while self.match_token(&TokenType::And) {
            terms.push(self.parse_primary()?);
        }
        if terms.len() == 1 {
            Ok(terms.pop().unwrap())
        } else {
            Ok(WhereExpr::And(terms))
        }
    }

    fn parse_primary(&mut self) -> Result<WhereExpr> {
        if self.match_token(&TokenType::LeftParen) {
            let inner = self.parse_or_expr()?;
            self.consume(&TokenType::RightParen, "expected ')'")?;
            return Ok(inner);
        }

        let left = self.parse_operand()?;
        let op = self.parse_cmp_op()?;
        let right = self.parse_operand()?;
        Ok(WhereExpr::Cmp(Comparison { left, op, right }))
    }

    fn parse_operand(&mut self) -> Result<Operand> {
        if let TokenType::Identifier(name) = &self.peek().token_type {
            let name = name.clone();
            // `type(edgeVar)` — the only supported function call.
            if name.eq_ignore_ascii_case("type") && self.peek_next_is(&TokenType::LeftParen) {
                self.advance();
                self.advance();
                let variable = self.parse_identifier("edge variable in type()")?;
                self.consume(&TokenType::RightParen, "expected ')' after type()")?;
                return Ok(Operand::EdgeKind(variable));
            }
            self.advance();
            self.consume(&TokenType::Dot, "expected '.' after variable in comparison")?;
            let key = self.parse_identifier("property name")?;
            return Ok(Operand::Property {
                variable: name,
                key,
            });
        }

        Ok(Operand::Literal(self.parse_literal()?))
    }

    fn parse_cmp_op(&mut self) -> Result<CmpOp> {
        let token = self.advance().clone();
        let op = match token.token_type {
            TokenType::Equals => CmpOp::Eq,
            TokenType::NotEquals => CmpOp::Ne,
            TokenType::LessThan => CmpOp::Lt,
            TokenType::LessEqual => CmpOp::Le,
            TokenType::GreaterThan => CmpOp::Gt,
            TokenType::GreaterEqual => CmpOp::Ge,
            TokenType::Contains => CmpOp::Contains,
            TokenType::Starts => {
                self.consume(&TokenType::With, "expected WITH after STARTS")?;
                CmpOp::StartsWith
            }
            _ => {
                return Err(Error::syntax(
                    token.line,
                    token.column,
                    "expected a comparison operator",
                ));
            }
        };
        Ok(op)
    }

    fn parse_return_items(&mut self) -> Result<Vec<ReturnItem>> {
        let mut items = Vec::new();
        loop {
            items.push(self.parse_return_item()?);
            if !self.match_token(&TokenType::Comma) {
                break;
            }
        }
        Ok(items)
    }

    fn parse_return_item(&mut self) -> Result<ReturnItem> {
        let variable = self.parse_identifier("RETURN item")?;
        let expr = if self.match_token(&TokenType::Dot) {
            let key = self.parse_identifier("property name")?;
            ReturnExpr::Property { variable, key }
        } else {
            ReturnExpr::Variable(variable)
        };

        let alias = if self.match_token(&TokenType::As) {
            Some(self.parse_identifier("RETURN alias")?)
        } else {
            None
        };

        Ok(ReturnItem { expr, alias })
    }

    fn parse_identifier(&mut self, ctx: &str) -> Result<String> {
        let token = self.advance().clone();
        match token.token_type {
            TokenType::Identifier(name) => Ok(name),
            other => Err(Error::syntax(
                token.line,
                token.column,
                format!("expected identifier for {ctx}, found {other:?}"),
            )),
        }
    }

    fn peek_is_identifier(&self) -> bool {
        matches!(self.peek().token_type, TokenType::Identifier(_))
    }

    fn peek_next_is(&self, token_type: &TokenType) -> bool {
        self.tokens
            .get(self.position + 1)
            .is_some_and(|t| std::mem::discriminant(&t.token_type) == std::mem::discriminant(token_type))
    }

    fn match_token(&mut self, token_type: &TokenType) -> bool {
        if self.check(token_type) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check(&self, token_type: &TokenType) -> bool {
        std::mem::discriminant(token_type) == std::mem::discriminant(&self.peek().token_type)
    }

    fn consume(&mut self, token_type: &TokenType, message: &str) -> Result<()> {
        if self.check(token_type) {
            self.advance();
            Ok(())
        } else {
            Err(self.error_here(message))
        }
    }

    fn error_here(&self, message: impl Into<String>) -> Error {
        let token = self.peek();
        Error::syntax(token.line, token.column, message)
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek().token_type, TokenType::Eof)
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.position]
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.position += 1;
        }
        &self.tokens[self.position - 1]
    }
}
