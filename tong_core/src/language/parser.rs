use std::mem::discriminant;
use std::sync::Arc;
use log::{debug, info};
use crate::language::ast::{
    BinaryOperator, Expression, FunctionDeclaration, Lambda, MatchArm, Parameter, Pattern,
    Program, Statement, TypeAnnotation, UnaryOperator,
};
use crate::language::error::Result;
use crate::language::lexer::Lexer;
use crate::language::token::{Token, TokenType};
use crate::parser_error;

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().is_none_or(|t| t.token_type != TokenType::EOF) {
            let (line, column) = tokens.last().map_or((1, 1), |t| (t.line, t.column));
            tokens.push(Token { token_type: TokenType::EOF, line, column });
        }
        Parser {
            tokens,
            current: 0,
        }
    }

    pub fn parse(&mut self) -> Result<Program> {
        let mut statements = Vec::new();

        loop {
            self.skip_separators();
            if self.is_at_end() {
                break;
            }
            statements.push(self.statement()?);
        }

        Ok(Program { statements })
    }

    // ---- token cursor ----

    fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::EOF
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn peek_at(&self, offset: usize) -> &TokenType {
        let index = (self.current + offset).min(self.tokens.len() - 1);
        &self.tokens[index].token_type
    }

    /// First token at or after the cursor that is not a newline.
    fn peek_past_newlines(&self) -> &TokenType {
        self.tokens[self.current..]
            .iter()
            .find(|t| t.token_type != TokenType::Newline)
            .map_or(&self.peek().token_type, |t| &t.token_type)
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn check(&self, token_type: &TokenType) -> bool {
        discriminant(&self.peek().token_type) == discriminant(token_type)
    }

    fn check_identifier(&self, word: &str) -> bool {
        matches!(&self.peek().token_type, TokenType::Identifier(name) if name == word)
    }

    fn match_token(&mut self, token_type: &TokenType) -> bool {
        if self.check(token_type) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, token_type: &TokenType, message: &str) -> Result<&Token> {
        if self.check(token_type) {
            Ok(self.advance())
        } else {
            self.error_here(message)
        }
    }

    fn consume_identifier(&mut self, message: &str) -> Result<String> {
        match &self.peek().token_type {
            TokenType::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => self.error_here(message),
        }
    }

    fn error_here<T>(&self, message: &str) -> Result<T> {
        let token = self.peek();
        parser_error!(format!("{}, found '{}'", message, token.token_type), token.line, token.column)
    }

    fn skip_newlines(&mut self) {
        while self.check(&TokenType::Newline) {
            self.advance();
        }
    }

    fn skip_separators(&mut self) {
        while self.check(&TokenType::Newline) || self.check(&TokenType::Semicolon) {
            self.advance();
        }
    }

    // ---- statements ----

    fn statement(&mut self) -> Result<Statement> {
        let token_type = self.peek().token_type.clone();

        match token_type {
            TokenType::Fn => self.function_declaration(),
            TokenType::Async | TokenType::GpuKernel | TokenType::Distributed
                if *self.peek_at(1) == TokenType::Fn => self.function_declaration(),
            TokenType::Let | TokenType::Var => self.var_declaration(),
            TokenType::If => self.if_statement(),
            TokenType::While => self.while_statement(),
            TokenType::For => self.for_statement(),
            TokenType::Loop => self.loop_statement(),
            TokenType::Match => {
                self.advance();
                let (subject, arms) = self.match_body()?;
                Ok(Statement::Match { subject, arms })
            }
            TokenType::Return => self.return_statement(),
            TokenType::Break => {
                self.advance();
                Ok(Statement::Break)
            }
            TokenType::Continue => {
                self.advance();
                Ok(Statement::Continue)
            }
            TokenType::Identifier(ref word)
                if word == "import" && matches!(self.peek_at(1), TokenType::Identifier(_)) =>
            {
                self.import_statement()
            }
            TokenType::Identifier(ref word)
                if word == "module"
                    && matches!(self.peek_at(1), TokenType::Identifier(_))
                    && *self.peek_at(2) == TokenType::LBrace =>
            {
                self.module_declaration()
            }
            _ => self.expression_statement(),
        }
    }

    fn block(&mut self) -> Result<Vec<Statement>> {
        self.consume(&TokenType::LBrace, "Expected '{'")?;

        let mut statements = Vec::new();
        loop {
            self.skip_separators();
            if self.check(&TokenType::RBrace) || self.is_at_end() {
                break;
            }
            statements.push(self.statement()?);
        }

        self.consume(&TokenType::RBrace, "Expected '}' after block")?;
        Ok(statements)
    }

    fn function_declaration(&mut self) -> Result<Statement> {
        let mut is_async = false;
        let mut is_gpu_kernel = false;
        let mut is_distributed = false;

        if self.match_token(&TokenType::Async) {
            is_async = true;
        } else if self.match_token(&TokenType::GpuKernel) {
            is_gpu_kernel = true;
        } else if self.match_token(&TokenType::Distributed) {
            is_distributed = true;
        }

        self.consume(&TokenType::Fn, "Expected 'fn'")?;
        let name = self.consume_identifier("Expected function name")?;

        let mut generics = Vec::new();
        if self.match_token(&TokenType::Less) {
            loop {
                generics.push(self.consume_identifier("Expected generic parameter name")?);
                if !self.match_token(&TokenType::Comma) {
                    break;
                }
            }
            self.consume(&TokenType::Greater, "Expected '>' after generic parameters")?;
        }

        self.consume(&TokenType::LParen, "Expected '(' after function name")?;
        let params = self.parameters(&TokenType::RParen, true)?;

        let return_type = if self.match_token(&TokenType::Arrow) {
            Some(self.type_annotation()?)
        } else {
            None
        };

        let body = self.block()?;

        debug!("Parsed function declaration '{}' with {} parameters", name, params.len());

        Ok(Statement::FunctionDeclaration(Arc::new(FunctionDeclaration {
            name,
            generics,
            params,
            return_type,
            body,
            is_async,
            is_gpu_kernel,
            is_distributed,
        })))
    }

    /// Parameter list after the opening delimiter, consuming the closing one.
    fn parameters(&mut self, closing: &TokenType, allow_defaults: bool) -> Result<Vec<Parameter>> {
        let mut params = Vec::new();

        self.skip_newlines();
        if self.match_token(closing) {
            return Ok(params);
        }

        loop {
            self.skip_newlines();
            let name = self.consume_identifier("Expected parameter name")?;

            let type_annotation = if self.match_token(&TokenType::Colon) {
                Some(self.type_annotation()?)
            } else {
                None
            };

            let default_value = if allow_defaults && self.match_token(&TokenType::Equals) {
                Some(self.expression()?)
            } else {
                None
            };

            params.push(Parameter { name, type_annotation, default_value });

            self.skip_newlines();
            if self.match_token(&TokenType::Comma) {
                self.skip_newlines();
                if self.match_token(closing) {
                    break;
                }
                continue;
            }
            self.consume(closing, &format!("Expected ',' or '{}' in parameter list", closing))?;
            break;
        }

        Ok(params)
    }

    fn var_declaration(&mut self) -> Result<Statement> {
        let mutable = self.advance().token_type == TokenType::Var;
        let name = self.consume_identifier("Expected variable name")?;

        let type_annotation = if self.match_token(&TokenType::Colon) {
            Some(self.type_annotation()?)
        } else {
            None
        };

        let initializer = if self.match_token(&TokenType::Equals) {
            Some(self.expression()?)
        } else {
            None
        };

        Ok(Statement::VariableDeclaration { name, type_annotation, initializer, mutable })
    }

    fn if_statement(&mut self) -> Result<Statement> {
        self.consume(&TokenType::If, "Expected 'if'")?;
        let condition = self.expression()?;
        let then_branch = self.block()?;

        let else_branch = if *self.peek_past_newlines() == TokenType::Else {
            self.skip_newlines();
            self.advance();
            if self.check(&TokenType::If) {
                Some(vec![self.if_statement()?])
            } else {
                Some(self.block()?)
            }
        } else {
            None
        };

        Ok(Statement::If { condition, then_branch, else_branch })
    }

    fn while_statement(&mut self) -> Result<Statement> {
        self.consume(&TokenType::While, "Expected 'while'")?;
        let condition = self.expression()?;
        let body = self.block()?;

        Ok(Statement::While { condition, body })
    }

    fn for_statement(&mut self) -> Result<Statement> {
        self.consume(&TokenType::For, "Expected 'for'")?;
        let variable = self.consume_identifier("Expected loop variable name after 'for'")?;

        if self.check_identifier("in") && *self.peek_at(1) != TokenType::LBrace {
            self.advance();
        }

        let iterable = self.expression()?;
        let body = self.block()?;

        Ok(Statement::For { variable, iterable, body })
    }

    fn loop_statement(&mut self) -> Result<Statement> {
        self.consume(&TokenType::Loop, "Expected 'loop'")?;
        let body = self.block()?;

        Ok(Statement::While { condition: Expression::Boolean(true), body })
    }

    fn return_statement(&mut self) -> Result<Statement> {
        self.consume(&TokenType::Return, "Expected 'return'")?;

        let ends_statement = matches!(
            self.peek().token_type,
            TokenType::Newline | TokenType::Semicolon | TokenType::RBrace | TokenType::EOF
        );

        if ends_statement {
            Ok(Statement::Return(None))
        } else {
            Ok(Statement::Return(Some(self.expression()?)))
        }
    }

    fn import_statement(&mut self) -> Result<Statement> {
        self.advance();

        let mut path = vec![self.consume_identifier("Expected module name after 'import'")?];
        let mut items = Vec::new();

        while self.match_token(&TokenType::DoubleColon) {
            if self.match_token(&TokenType::LBrace) {
                loop {
                    self.skip_newlines();
                    items.push(self.consume_identifier("Expected imported name")?);
                    self.skip_newlines();
                    if !self.match_token(&TokenType::Comma) {
                        break;
                    }
                }
                self.consume(&TokenType::RBrace, "Expected '}' after imported names")?;
                break;
            }
            path.push(self.consume_identifier("Expected module path segment after '::'")?);
        }

        let alias = if self.check_identifier("as") {
            self.advance();
            Some(self.consume_identifier("Expected alias after 'as'")?)
        } else {
            None
        };

        Ok(Statement::Import { path, items, alias })
    }

    fn module_declaration(&mut self) -> Result<Statement> {
        self.advance();
        let name = self.consume_identifier("Expected module name")?;
        let body = self.block()?;

        Ok(Statement::Module { name, body })
    }

    fn expression_statement(&mut self) -> Result<Statement> {
        let expr = self.expression()?;

        if self.match_token(&TokenType::Equals) {
            let value = self.expression()?;
            return Ok(Statement::Assignment { target: expr, value });
        }

        Ok(Statement::Expression(expr))
    }

    /// `subject { [_] [if guard] => body, ... }` after the `match` keyword.
    fn match_body(&mut self) -> Result<(Expression, Vec<MatchArm>)> {
        let subject = self.expression()?;
        self.consume(&TokenType::LBrace, "Expected '{' after match subject")?;

        let mut arms = Vec::new();
        loop {
            self.skip_separators();
            if self.match_token(&TokenType::RBrace) {
                break;
            }
            if self.is_at_end() {
                return self.error_here("Expected '}' after match arms");
            }

            if self.check_identifier("_") {
                self.advance();
            } else if !self.check(&TokenType::If) && !self.check(&TokenType::FatArrow) {
                return self.error_here("Pattern matching is not supported");
            }

            let guard = if self.match_token(&TokenType::If) {
                Some(self.expression()?)
            } else {
                None
            };

            self.consume(&TokenType::FatArrow, "Expected '=>' in match arm")?;
            let body = self.expression()?;

            arms.push(MatchArm { pattern: Pattern::Wildcard, guard, body });

            self.skip_newlines();
            self.match_token(&TokenType::Comma);
        }

        Ok((subject, arms))
    }

    // ---- types ----

    fn type_annotation(&mut self) -> Result<TypeAnnotation> {
        if self.match_token(&TokenType::Ampersand) {
            let mutable = self.match_token(&TokenType::Var);
            let inner = Box::new(self.type_annotation()?);
            return Ok(TypeAnnotation::Reference { inner, mutable });
        }

        if self.match_token(&TokenType::LBracket) {
            let element = Box::new(self.type_annotation()?);
            let size = if self.match_token(&TokenType::Semicolon) {
                Some(Box::new(self.expression()?))
            } else {
                None
            };
            self.consume(&TokenType::RBracket, "Expected ']' after array type")?;
            return Ok(TypeAnnotation::Array { element, size });
        }

        if self.match_token(&TokenType::LParen) {
            let mut items = Vec::new();
            if !self.check(&TokenType::RParen) {
                loop {
                    items.push(self.type_annotation()?);
                    if !self.match_token(&TokenType::Comma) {
                        break;
                    }
                }
            }
            self.consume(&TokenType::RParen, "Expected ')' after tuple type")?;

            if self.match_token(&TokenType::Arrow) {
                let return_type = Box::new(self.type_annotation()?);
                return Ok(TypeAnnotation::Function { params: items, return_type });
            }
            return Ok(TypeAnnotation::Tuple(items));
        }

        let name = if self.match_token(&TokenType::None) {
            "None".to_string()
        } else {
            self.consume_identifier("Expected type")?
        };

        let mut generics = Vec::new();
        if self.match_token(&TokenType::Less) {
            loop {
                generics.push(self.type_annotation()?);
                if !self.match_token(&TokenType::Comma) {
                    break;
                }
            }
            self.consume(&TokenType::Greater, "Expected '>' after type arguments")?;
        }

        Ok(TypeAnnotation::Named { name, generics })
    }

    // ---- expressions ----

    pub fn expression(&mut self) -> Result<Expression> {
        self.logical_or()
    }

    fn binary(left: Expression, operator: BinaryOperator, right: Expression) -> Expression {
        Expression::Binary {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        }
    }

    fn logical_or(&mut self) -> Result<Expression> {
        let mut expr = self.logical_and()?;

        while self.match_token(&TokenType::LogicalOr) {
            let right = self.logical_and()?;
            expr = Self::binary(expr, BinaryOperator::Or, right);
        }

        Ok(expr)
    }

    fn logical_and(&mut self) -> Result<Expression> {
        let mut expr = self.equality()?;

        while self.match_token(&TokenType::LogicalAnd) {
            let right = self.equality()?;
            expr = Self::binary(expr, BinaryOperator::And, right);
        }

        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expression> {
        let mut expr = self.comparison()?;

        loop {
            let operator = match self.peek().token_type {
                TokenType::DoubleEquals => BinaryOperator::Equal,
                TokenType::NotEquals => BinaryOperator::NotEqual,
                _ => break,
            };
            self.advance();
            let right = self.comparison()?;
            expr = Self::binary(expr, operator, right);
        }

        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expression> {
        let mut expr = self.additive()?;

        loop {
            let operator = match self.peek().token_type {
                TokenType::Less => BinaryOperator::Less,
                TokenType::LessEquals => BinaryOperator::LessEqual,
                TokenType::Greater => BinaryOperator::Greater,
                TokenType::GreaterEquals => BinaryOperator::GreaterEqual,
                _ => break,
            };
            self.advance();
            let right = self.additive()?;
            expr = Self::binary(expr, operator, right);
        }

        Ok(expr)
    }

    fn additive(&mut self) -> Result<Expression> {
        let mut expr = self.multiplicative()?;

        loop {
            let operator = match self.peek().token_type {
                TokenType::Plus => BinaryOperator::Add,
                TokenType::Minus => BinaryOperator::Subtract,
                _ => break,
            };
            self.advance();
            let right = self.multiplicative()?;
            expr = Self::binary(expr, operator, right);
        }

        Ok(expr)
    }

    fn multiplicative(&mut self) -> Result<Expression> {
        let mut expr = self.unary()?;

        loop {
            let operator = match self.peek().token_type {
                TokenType::Star => BinaryOperator::Multiply,
                TokenType::Slash => BinaryOperator::Divide,
                TokenType::Percent => BinaryOperator::Modulo,
                _ => break,
            };
            self.advance();
            let right = self.unary()?;
            expr = Self::binary(expr, operator, right);
        }

        if self.check(&TokenType::Power) {
            return self.error_here("The power operator '**' is not supported");
        }

        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expression> {
        let operator = match self.peek().token_type {
            TokenType::Minus => UnaryOperator::Negate,
            TokenType::Bang => UnaryOperator::Not,
            TokenType::Ampersand => UnaryOperator::Reference,
            TokenType::Star => UnaryOperator::Dereference,
            _ => return self.call_chain(),
        };
        self.advance();

        let operand = self.unary()?;
        Ok(Expression::Unary { operator, operand: Box::new(operand) })
    }

    fn call_chain(&mut self) -> Result<Expression> {
        let mut expr = self.primary()?;

        loop {
            if self.match_token(&TokenType::Dot) {
                let name = self.consume_identifier("Expected property name after '.'")?;

                if self.match_token(&TokenType::LParen) {
                    let args = self.arguments()?;
                    expr = Expression::MethodCall { object: Box::new(expr), method: name, args };
                } else {
                    expr = Expression::FieldAccess { object: Box::new(expr), field: name };
                }
            } else if self.match_token(&TokenType::LBracket) {
                self.skip_newlines();
                let index = self.expression()?;
                self.skip_newlines();
                self.consume(&TokenType::RBracket, "Expected ']' after index")?;

                expr = Expression::Index { object: Box::new(expr), index: Box::new(index) };
            } else if self.match_token(&TokenType::LParen) {
                let args = self.arguments()?;
                expr = Expression::Call { callee: Box::new(expr), args };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expression> {
        let token = self.peek().clone();

        let expr = match token.token_type {
            TokenType::Integer(value) => {
                self.advance();
                Expression::Integer(value)
            }
            TokenType::Float(value) => {
                self.advance();
                Expression::Float(value)
            }
            TokenType::String(value) => {
                self.advance();
                Expression::String(value)
            }
            TokenType::True => {
                self.advance();
                Expression::Boolean(true)
            }
            TokenType::False => {
                self.advance();
                Expression::Boolean(false)
            }
            TokenType::None => {
                self.advance();
                Expression::None
            }
            TokenType::Identifier(name) => {
                self.advance();
                Expression::Identifier(name)
            }
            TokenType::LParen => {
                self.advance();
                self.skip_newlines();
                let expr = self.expression()?;
                self.skip_newlines();
                self.consume(&TokenType::RParen, "Expected ')' after expression")?;
                expr
            }
            TokenType::LBracket => {
                self.advance();
                self.parse_array_literal()?
            }
            TokenType::Pipe | TokenType::LogicalOr => self.lambda()?,
            TokenType::Parallel => {
                self.advance();
                Expression::Parallel(Arc::new(self.block()?))
            }
            TokenType::Distributed => {
                self.advance();
                Expression::Distributed(Arc::new(self.block()?))
            }
            TokenType::Await => {
                self.advance();
                Expression::Await(Box::new(self.unary()?))
            }
            TokenType::If => self.if_expression()?,
            TokenType::Match => {
                self.advance();
                let (subject, arms) = self.match_body()?;
                Expression::Match { subject: Box::new(subject), arms }
            }
            TokenType::GpuKernel => {
                self.advance();
                match self.call_chain()? {
                    Expression::Call { callee, args } => Expression::GpuKernelCall { kernel: callee, args },
                    _ => return parser_error!("Expected a call after 'gpu_kernel'", token.line, token.column),
                }
            }
            _ => return self.error_here("Expected expression"),
        };

        Ok(expr)
    }

    fn lambda(&mut self) -> Result<Expression> {
        let params = if self.match_token(&TokenType::LogicalOr) {
            Vec::new()
        } else {
            self.consume(&TokenType::Pipe, "Expected '|' to open lambda parameters")?;
            self.parameters(&TokenType::Pipe, false)?
        };

        let return_type = if self.match_token(&TokenType::Arrow) {
            Some(self.type_annotation()?)
        } else {
            None
        };

        let body = self.expression()?;

        Ok(Expression::Lambda(Arc::new(Lambda { params, return_type, body })))
    }

    fn if_expression(&mut self) -> Result<Expression> {
        self.consume(&TokenType::If, "Expected 'if'")?;
        let condition = self.expression()?;
        let then_branch = self.braced_expression()?;

        let else_branch = if *self.peek_past_newlines() == TokenType::Else {
            self.skip_newlines();
            self.advance();
            if self.check(&TokenType::If) {
                Some(Box::new(self.if_expression()?))
            } else {
                Some(Box::new(self.braced_expression()?))
            }
        } else {
            None
        };

        Ok(Expression::If {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch,
        })
    }

    fn braced_expression(&mut self) -> Result<Expression> {
        self.consume(&TokenType::LBrace, "Expected '{'")?;
        self.skip_separators();
        let expr = self.expression()?;
        self.skip_separators();
        self.consume(&TokenType::RBrace, "Expected '}' after expression")?;
        Ok(expr)
    }

    fn parse_array_literal(&mut self) -> Result<Expression> {
        let mut elements = Vec::new();

        self.skip_newlines();
        if self.match_token(&TokenType::RBracket) {
            return Ok(Expression::Array(elements));
        }

        loop {
            self.skip_newlines();
            elements.push(self.expression()?);
            self.skip_newlines();

            if self.match_token(&TokenType::Comma) {
                self.skip_newlines();
                if self.match_token(&TokenType::RBracket) {
                    break;
                }
            } else if self.match_token(&TokenType::RBracket) {
                break;
            } else {
                return self.error_here("Expected ',' or ']' in array literal");
            }
        }

        Ok(Expression::Array(elements))
    }

    fn arguments(&mut self) -> Result<Vec<Expression>> {
        let mut args = Vec::new();

        self.skip_newlines();
        if self.match_token(&TokenType::RParen) {
            return Ok(args);
        }

        loop {
            self.skip_newlines();
            args.push(self.expression()?);
            self.skip_newlines();

            if self.match_token(&TokenType::Comma) {
                self.skip_newlines();
                if self.match_token(&TokenType::RParen) {
                    break;
                }
            } else if self.match_token(&TokenType::RParen) {
                break;
            } else {
                return self.error_here("Expected ',' or ')' after argument");
            }
        }

        Ok(args)
    }
}

pub fn parse_tokens(tokens: Vec<Token>) -> Result<Program> {
    Parser::new(tokens).parse()
}

pub fn parse(input: &str) -> Result<Program> {
    debug!("Parsing {} bytes of source", input.len());

    let tokens = Lexer::new(input).tokenize();
    info!("Tokenized source into {} tokens", tokens.len());

    match Parser::new(tokens).parse() {
        Ok(program) => {
            info!("Parsed {} top-level statements", program.statements.len());
            Ok(program)
        }
        Err(e) => {
            debug!("Parsing failed: {}", e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::error::ErrorKind;

    fn expr(source: &str) -> Expression {
        let program = parse(source).unwrap();
        match program.statements.into_iter().next() {
            Some(Statement::Expression(expr)) => expr,
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    fn render(source: &str) -> String {
        expr(source).to_string()
    }

    fn parse_err(source: &str) -> crate::language::error::Error {
        parse(source).unwrap_err()
    }

    #[test]
    fn binary_tiers_are_left_associative() {
        assert_eq!(render("1 - 2 - 3"), "((1 - 2) - 3)");
        assert_eq!(render("8 / 4 / 2"), "((8 / 4) / 2)");
    }

    #[test]
    fn precedence_climbs_from_or_to_unary() {
        assert_eq!(render("1 + 2 * 3 % 4"), "(1 + ((2 * 3) % 4))");
        assert_eq!(render("a || b && c == d < e + f"), "(a || (b && (c == (d < (e + f)))))");
        assert_eq!(render("-!x * 2"), "((-(!x)) * 2)");
    }

    #[test]
    fn postfix_chain_preserves_source_order() {
        assert_eq!(render("a.b[0](x).c"), "a.b[0](x).c");
        match expr("a.b[0](x).c") {
            Expression::FieldAccess { object, field } => {
                assert_eq!(field, "c");
                assert!(matches!(*object, Expression::Call { .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(expr("obj.run(1, 2)"), Expression::MethodCall { ref method, .. } if method == "run"));
    }

    #[test]
    fn power_operator_is_rejected() {
        let error = parse_err("2 ** 3");
        assert_eq!(error.kind, ErrorKind::Parser);
        assert!(error.message.contains("'**'"));
    }

    #[test]
    fn lambdas_take_a_single_expression_body() {
        match expr("|x, y: i64| -> i64 x * y") {
            Expression::Lambda(lambda) => {
                assert_eq!(lambda.params.len(), 2);
                assert!(lambda.return_type.is_some());
                assert_eq!(lambda.body.to_string(), "(x * y)");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(expr("|| 1"), Expression::Lambda(ref l) if l.params.is_empty()));
    }

    #[test]
    fn function_declaration_with_modifiers_and_types() {
        let program = parse("gpu_kernel fn scale<T>(xs: [f64; 4], k: f64 = 2.0) -> [f64] { return xs }").unwrap();
        match &program.statements[0] {
            Statement::FunctionDeclaration(decl) => {
                assert_eq!(decl.name, "scale");
                assert!(decl.is_gpu_kernel && !decl.is_async && !decl.is_distributed);
                assert_eq!(decl.generics, vec!["T".to_string()]);
                assert_eq!(decl.params.len(), 2);
                assert!(matches!(decl.params[0].type_annotation, Some(TypeAnnotation::Array { size: Some(_), .. })));
                assert_eq!(decl.params[1].default_value, Some(Expression::Float(2.0)));
                assert!(matches!(decl.body[0], Statement::Return(Some(_))));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn type_annotations_cover_every_form() {
        let program = parse("let a: Array<i64> = []\nlet b: (i64, f64)\nlet c: (i64) -> bool\nvar d: &var String").unwrap();
        let types: Vec<&TypeAnnotation> = program
            .statements
            .iter()
            .filter_map(|s| match s {
                Statement::VariableDeclaration { type_annotation, .. } => type_annotation.as_ref(),
                _ => None,
            })
            .collect();
        assert!(matches!(types[0], TypeAnnotation::Named { generics, .. } if generics.len() == 1));
        assert!(matches!(types[1], TypeAnnotation::Tuple(items) if items.len() == 2));
        assert!(matches!(types[2], TypeAnnotation::Function { .. }));
        assert!(matches!(types[3], TypeAnnotation::Reference { mutable: true, .. }));
        assert!(matches!(program.statements[3], Statement::VariableDeclaration { mutable: true, .. }));
    }

    #[test]
    fn statements_split_on_newlines_and_semicolons() {
        let program = parse("let f = |x| x * x; print(f(4))\n\nx = 3").unwrap();
        assert_eq!(program.statements.len(), 3);
        assert!(matches!(program.statements[2], Statement::Assignment { .. }));
    }

    #[test]
    fn control_flow_statements() {
        let source = "
            for x in items { if x > 2 { break } else if x == 1 { continue }
            else { print(x) } }
            loop { return }
        ";
        let program = parse(source).unwrap();
        match &program.statements[0] {
            Statement::For { variable, body, .. } => {
                assert_eq!(variable, "x");
                match &body[0] {
                    Statement::If { else_branch: Some(else_branch), .. } => {
                        assert!(matches!(else_branch[0], Statement::If { else_branch: Some(_), .. }));
                    }
                    other => panic!("unexpected {:?}", other),
                }
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            &program.statements[1],
            Statement::While { condition: Expression::Boolean(true), body } if body == &vec![Statement::Return(None)]
        ));
    }

    #[test]
    fn match_arms_are_wildcards_with_optional_guards() {
        let program = parse("match n {\n if n > 1 => \"big\",\n _ => \"small\"\n}").unwrap();
        match &program.statements[0] {
            Statement::Match { arms, .. } => {
                assert_eq!(arms.len(), 2);
                assert!(arms.iter().all(|arm| arm.pattern == Pattern::Wildcard));
                assert!(arms[0].guard.is_some());
                assert!(arms[1].guard.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn literal_match_patterns_are_rejected() {
        let error = parse_err("match x {\n 1 => \"one\"\n}");
        assert_eq!(error.kind, ErrorKind::Parser);
        assert_eq!(error.message, "Pattern matching is not supported, found '1'");
        assert_eq!(error.line, Some(2));
    }

    #[test]
    fn imports_and_modules() {
        let program = parse("import linalg as la\nimport linalg::{zeros, ones}\nmodule util { fn id(x) { return x } }").unwrap();
        assert_eq!(
            program.statements[0],
            Statement::Import { path: vec!["linalg".into()], items: vec![], alias: Some("la".into()) }
        );
        assert_eq!(
            program.statements[1],
            Statement::Import { path: vec!["linalg".into()], items: vec!["zeros".into(), "ones".into()], alias: None }
        );
        assert!(matches!(&program.statements[2], Statement::Module { name, body } if name == "util" && body.len() == 1));
        assert!(matches!(expr("import(\"linalg\")"), Expression::Call { .. }));
    }

    #[test]
    fn block_expressions() {
        assert!(matches!(expr("parallel { 1\n 2 }"), Expression::Parallel(ref s) if s.len() == 2));
        assert!(matches!(expr("distributed { let a = 1; a }"), Expression::Distributed(ref s) if s.len() == 2));
        assert!(matches!(expr("await f(1)"), Expression::Await(_)));
        assert!(matches!(expr("gpu_kernel blur(img, 3)"), Expression::GpuKernelCall { ref args, .. } if args.len() == 2));
        assert!(matches!(expr("(if a { 1 } else { 2 })"), Expression::If { else_branch: Some(_), .. }));
    }

    #[test]
    fn multi_line_lists() {
        assert_eq!(render("[\n 1,\n 2,\n]"), "[1, 2]");
        assert_eq!(render("f(\n a,\n b\n)"), "f(a, b)");
    }

    #[test]
    fn errors_report_offending_token_position() {
        let error = parse_err("let = 5");
        assert_eq!(error.kind, ErrorKind::Parser);
        assert_eq!((error.line, error.column), (Some(1), Some(5)));

        let error = parse_err("f(1, 2");
        assert!(error.message.starts_with("Expected ',' or ')'"));

        let error = parse_err("fn broken( {");
        assert!(error.message.contains("parameter name"));
    }
}
