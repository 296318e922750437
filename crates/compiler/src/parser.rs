//! Recursive-descent parser: token stream to AST.
//!
//! One method per grammar production, grounded on the grammar implied by
//! `original_source/src/compile.c`'s AST consumption and written in the
//! teacher's general "hand-roll your own parsing, no parser-generator
//! dependency" style. Operator precedence follows the conventional C-like
//! ladder: `||` < `&&` < equality < relational < additive < multiplicative
//! < unary < postfix (call/index) < primary.

use crate::ast::*;
use crate::error::CompileError;
use crate::token::{Token, TokenKind};

pub struct Parser {
    filename: String,
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(filename: &str, tokens: Vec<Token>) -> Self {
        Parser {
            filename: filename.to_string(),
            tokens,
            pos: 0,
        }
    }

    fn error(&self, line: u32, message: impl Into<String>) -> CompileError {
        CompileError::Parse {
            file: self.filename.clone(),
            line,
            message: message.into(),
        }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_line(&self) -> u32 {
        self.peek().line
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, CompileError> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            Err(self.error(
                self.peek_line(),
                format!("expected {:?}, found {:?}", kind, self.peek().kind),
            ))
        }
    }

    fn expect_identifier(&mut self) -> Result<String, CompileError> {
        match self.advance().kind {
            TokenKind::Identifier(name) => Ok(name),
            other => Err(self.error(self.peek_line(), format!("expected an identifier, found {:?}", other))),
        }
    }

    pub fn parse_program(mut self) -> Result<Program, CompileError> {
        let mut declarations = Vec::new();
        while !self.check(&TokenKind::Eof) {
            declarations.push(self.parse_declaration()?);
        }
        Ok(Program { declarations })
    }

    fn parse_declaration(&mut self) -> Result<Declaration, CompileError> {
        let line = self.peek_line();
        match &self.peek().kind {
            TokenKind::Function => self.parse_function_declaration().map(Declaration::Function),
            TokenKind::Global => {
                self.advance();
                let name = self.expect_identifier()?;
                self.expect(TokenKind::Semicolon)?;
                Ok(Declaration::Global { name })
            }
            TokenKind::Import => {
                self.advance();
                let path = match self.advance().kind {
                    TokenKind::StringLiteral(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                    other => return Err(self.error(line, format!("expected a string after 'import', found {:?}", other))),
                };
                self.expect(TokenKind::Semicolon)?;
                Ok(Declaration::Import { path, line })
            }
            other => Err(self.error(line, format!("expected a declaration, found {:?}", other))),
        }
    }

    fn parse_function_declaration(&mut self) -> Result<FunctionDecl, CompileError> {
        let line = self.peek_line();
        self.expect(TokenKind::Function)?;
        let name = self.expect_identifier()?;
        self.expect(TokenKind::LParen)?;

        let mut argument_names = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                argument_names.push(self.expect_identifier()?);
                if self.check(&TokenKind::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;

        let body = self.parse_block()?;
        Ok(FunctionDecl { name, argument_names, body, line })
    }

    fn parse_block(&mut self) -> Result<Vec<Stmt>, CompileError> {
        self.expect(TokenKind::LBrace)?;
        let mut statements = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            statements.push(self.parse_statement()?);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(statements)
    }

    fn parse_statement(&mut self) -> Result<Stmt, CompileError> {
        match &self.peek().kind {
            TokenKind::Local => self.parse_local_statement(),
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::If => self.parse_if_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::Break => {
                let line = self.advance().line;
                self.expect(TokenKind::Semicolon)?;
                Ok(Stmt::Break { line })
            }
            TokenKind::Continue => {
                let line = self.advance().line;
                self.expect(TokenKind::Semicolon)?;
                Ok(Stmt::Continue { line })
            }
            TokenKind::For => Err(self.error(self.peek_line(), "'for' is reserved but has no statement grammar")),
            _ => {
                let expr = self.parse_expression()?;
                self.expect(TokenKind::Semicolon)?;
                Ok(Stmt::Expression(expr))
            }
        }
    }

    fn parse_local_statement(&mut self) -> Result<Stmt, CompileError> {
        self.expect(TokenKind::Local)?;
        let name = self.expect_identifier()?;
        let initializer = if self.check(&TokenKind::Assign) {
            self.advance();
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon)?;
        Ok(Stmt::Local { name, initializer })
    }

    fn parse_return_statement(&mut self) -> Result<Stmt, CompileError> {
        self.expect(TokenKind::Return)?;
        let value = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(TokenKind::Semicolon)?;
        Ok(Stmt::Return { value })
    }

    fn parse_if_statement(&mut self) -> Result<Stmt, CompileError> {
        self.expect(TokenKind::If)?;
        let condition = self.parse_expression()?;
        let then_block = self.parse_block()?;
        let else_block = if self.check(&TokenKind::Else) {
            self.advance();
            if self.check(&TokenKind::If) {
                Some(vec![self.parse_if_statement()?])
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };
        Ok(Stmt::If { condition, then_block, else_block })
    }

    fn parse_while_statement(&mut self) -> Result<Stmt, CompileError> {
        self.expect(TokenKind::While)?;
        let condition = self.parse_expression()?;
        let body = self.parse_block()?;
        Ok(Stmt::While { condition, body })
    }

    fn parse_expression(&mut self) -> Result<Expr, CompileError> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Result<Expr, CompileError> {
        let target = self.parse_or()?;

        let op = match &self.peek().kind {
            TokenKind::Assign => None,
            TokenKind::AddAssign => Some(BinaryOp::Add),
            TokenKind::SubtractAssign => Some(BinaryOp::Subtract),
            TokenKind::MultiplyAssign => Some(BinaryOp::Multiply),
            TokenKind::DivideAssign => Some(BinaryOp::Divide),
            TokenKind::ModuloAssign => Some(BinaryOp::Modulo),
            _ => return Ok(target),
        };
        let line = self.advance().line;
        let value = Box::new(self.parse_assignment()?);

        match target {
            Expr::Variable { name, .. } => Ok(Expr::Assign { name, op, value, line }),
            Expr::Index { source, index, .. } => Ok(Expr::IndexAssign { source, index, op, value, line }),
            _ => Err(self.error(line, "invalid assignment target")),
        }
    }

    fn parse_or(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.parse_and()?;
        while self.check(&TokenKind::OrOr) {
            let line = self.advance().line;
            let rhs = self.parse_and()?;
            lhs = Expr::ShortCircuit { op: ShortCircuitOp::Or, lhs: Box::new(lhs), rhs: Box::new(rhs), line };
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.parse_equality()?;
        while self.check(&TokenKind::AndAnd) {
            let line = self.advance().line;
            let rhs = self.parse_equality()?;
            lhs = Expr::ShortCircuit { op: ShortCircuitOp::And, lhs: Box::new(lhs), rhs: Box::new(rhs), line };
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.parse_relational()?;
        loop {
            let op = match &self.peek().kind {
                TokenKind::Equal => BinaryOp::Equal,
                TokenKind::NotEqual => BinaryOp::NotEqual,
                _ => break,
            };
            let line = self.advance().line;
            let rhs = self.parse_relational()?;
            lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs), line };
        }
        Ok(lhs)
    }

    fn parse_relational(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match &self.peek().kind {
                TokenKind::LessThan => BinaryOp::LessThan,
                TokenKind::LessThanOrEqual => BinaryOp::LessThanOrEqual,
                TokenKind::GreaterThan => BinaryOp::GreaterThan,
                TokenKind::GreaterThanOrEqual => BinaryOp::GreaterThanOrEqual,
                _ => break,
            };
            let line = self.advance().line;
            let rhs = self.parse_additive()?;
            lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs), line };
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match &self.peek().kind {
                TokenKind::Add => BinaryOp::Add,
                TokenKind::Subtract => BinaryOp::Subtract,
                _ => break,
            };
            let line = self.advance().line;
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs), line };
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match &self.peek().kind {
                TokenKind::Multiply => BinaryOp::Multiply,
                TokenKind::Divide => BinaryOp::Divide,
                TokenKind::Modulo => BinaryOp::Modulo,
                _ => break,
            };
            let line = self.advance().line;
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs), line };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, CompileError> {
        let op = match &self.peek().kind {
            TokenKind::Subtract => UnaryOp::Negate,
            TokenKind::Not => UnaryOp::Not,
            _ => return self.parse_postfix(),
        };
        let line = self.advance().line;
        let operand = Box::new(self.parse_unary()?);
        Ok(Expr::Unary { op, operand, line })
    }

    fn parse_postfix(&mut self) -> Result<Expr, CompileError> {
        let mut expr = self.parse_primary()?;
        loop {
            match &self.peek().kind {
                TokenKind::LBracket => {
                    let line = self.advance().line;
                    let index = self.parse_expression()?;
                    self.expect(TokenKind::RBracket)?;
                    expr = Expr::Index { source: Box::new(expr), index: Box::new(index), line };
                }
                TokenKind::LParen => {
                    let line = self.advance().line;
                    let mut arguments = Vec::new();
                    if !self.check(&TokenKind::RParen) {
                        loop {
                            arguments.push(self.parse_expression()?);
                            if self.check(&TokenKind::Comma) {
                                self.advance();
                            } else {
                                break;
                            }
                        }
                    }
                    self.expect(TokenKind::RParen)?;
                    expr = Expr::Call { callee: Box::new(expr), arguments, line };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, CompileError> {
        let line = self.peek_line();
        if let Some(value) = self.peek().kind.literal_value() {
            self.advance();
            return Ok(Expr::Literal(value));
        }

        match self.peek().kind.clone() {
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::LBracket => {
                self.advance();
                let mut elements = Vec::new();
                if !self.check(&TokenKind::RBracket) {
                    loop {
                        elements.push(self.parse_expression()?);
                        if self.check(&TokenKind::Comma) {
                            self.advance();
                        } else {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RBracket)?;
                Ok(Expr::ArrayLiteral { elements, line })
            }
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(Expr::Variable { name, line })
            }
            other => Err(self.error(line, format!("expected an expression, found {:?}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse(src: &str) -> Program {
        let tokens = Lexer::new("<test>", src.as_bytes()).tokenize().unwrap();
        Parser::new("<test>", tokens).parse_program().unwrap()
    }

    #[test]
    fn parses_function_with_return() {
        let program = parse("function main() { return 2 + 3 * 4; }");
        assert_eq!(program.declarations.len(), 1);
        match &program.declarations[0] {
            Declaration::Function(f) => {
                assert_eq!(f.name, "main");
                assert!(f.argument_names.is_empty());
                assert_eq!(f.body.len(), 1);
            }
            _ => panic!("expected a function declaration"),
        }
    }

    #[test]
    fn multiplicative_binds_tighter_than_additive() {
        let program = parse("function main() { return 2 + 3 * 4; }");
        let Declaration::Function(f) = &program.declarations[0] else { panic!() };
        let Stmt::Return { value: Some(Expr::Binary { op: BinaryOp::Add, rhs, .. }) } = &f.body[0] else {
            panic!("expected a top-level add")
        };
        assert!(matches!(**rhs, Expr::Binary { op: BinaryOp::Multiply, .. }));
    }

    #[test]
    fn parses_if_else() {
        let program = parse("function f() { if true { return 1; } else { return 2; } }");
        let Declaration::Function(f) = &program.declarations[0] else { panic!() };
        assert!(matches!(&f.body[0], Stmt::If { else_block: Some(_), .. }));
    }

    #[test]
    fn parses_index_assignment() {
        let program = parse("function f() { local a = []; a[0] = 1; }");
        let Declaration::Function(f) = &program.declarations[0] else { panic!() };
        assert!(matches!(&f.body[1], Stmt::Expression(Expr::IndexAssign { .. })));
    }

    #[test]
    fn parses_compound_assignment() {
        let program = parse("function f() { local a = 1; a += 2; }");
        let Declaration::Function(f) = &program.declarations[0] else { panic!() };
        assert!(matches!(
            &f.body[1],
            Stmt::Expression(Expr::Assign { op: Some(BinaryOp::Add), .. })
        ));
    }

    #[test]
    fn parses_import_and_global() {
        let program = parse("import \"lib.fen\"; global counter;");
        assert!(matches!(program.declarations[0], Declaration::Import { .. }));
        assert!(matches!(program.declarations[1], Declaration::Global { .. }));
    }

    #[test]
    fn for_keyword_is_reserved_and_unusable() {
        let tokens = Lexer::new("<test>", b"function f() { for }").tokenize().unwrap();
        assert!(Parser::new("<test>", tokens).parse_program().is_err());
    }
}
