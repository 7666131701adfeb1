use std::sync::Arc;

use super::ast::{AssignTarget, BinOp, Expr, FnDecl, Location, Program, Stmt, UnOp};
use super::lexer::{self, Token, TokenKind};
use super::ParseError;

/// Parse a whole EZ source file into a [`Program`].
///
/// `file` is the name the debugger will report in locations and match
/// breakpoints against; callers usually pass the file's basename.
pub fn parse(file: &str, src: &str) -> Result<Program, ParseError> {
    let tokens = lexer::tokenize(src)?;
    let mut parser = Parser {
        file: Arc::from(file),
        tokens,
        pos: 0,
    };
    let body = parser.block_body(TokenKind::Eof)?;
    Ok(Program {
        file: parser.file,
        body: Arc::new(body),
    })
}

struct Parser {
    file: Arc<str>,
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn bump(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn loc_of(&self, token: &Token) -> Location {
        Location::new(self.file.clone(), token.line, token.column)
    }

    fn here(&self) -> Location {
        self.loc_of(self.peek())
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.check(&kind) {
            Ok(self.bump())
        } else {
            let found = self.peek();
            Err(ParseError::Unexpected {
                expected: kind.describe(),
                found: found.kind.describe(),
                line: found.line,
                column: found.column,
            })
        }
    }

    fn expect_ident(&mut self) -> Result<(String, Location), ParseError> {
        let token = self.bump();
        let loc = self.loc_of(&token);
        match token.kind {
            TokenKind::Ident(name) => Ok((name, loc)),
            other => Err(ParseError::Unexpected {
                expected: "identifier".to_string(),
                found: other.describe(),
                line: loc.line,
                column: loc.column,
            }),
        }
    }

    /// Parse statements until `end` (consumed by the caller for `Eof`,
    /// consumed here for `}`).
    fn block_body(&mut self, end: TokenKind) -> Result<Vec<Stmt>, ParseError> {
        let mut body = Vec::new();
        while !self.check(&end) {
            if self.check(&TokenKind::Eof) {
                let found = self.peek();
                return Err(ParseError::Unexpected {
                    expected: end.describe(),
                    found: found.kind.describe(),
                    line: found.line,
                    column: found.column,
                });
            }
            body.push(self.statement()?);
        }
        if end != TokenKind::Eof {
            self.bump();
        }
        Ok(body)
    }

    fn braced_block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.expect(TokenKind::LBrace)?;
        self.block_body(TokenKind::RBrace)
    }

    fn statement(&mut self) -> Result<Stmt, ParseError> {
        let loc = self.here();
        match &self.peek().kind {
            TokenKind::Fn => self.fn_decl(),
            TokenKind::Var => {
                self.bump();
                let (name, _) = self.expect_ident()?;
                self.expect(TokenKind::Assign)?;
                let value = self.expression()?;
                self.expect(TokenKind::Semicolon)?;
                Ok(Stmt::VarDecl { name, value, loc })
            }
            TokenKind::Return => {
                self.bump();
                let value = if self.check(&TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.expression()?)
                };
                self.expect(TokenKind::Semicolon)?;
                Ok(Stmt::Return { value, loc })
            }
            TokenKind::If => self.if_stmt(),
            TokenKind::While => {
                self.bump();
                let cond = self.expression()?;
                let body = self.braced_block()?;
                Ok(Stmt::While { cond, body, loc })
            }
            TokenKind::For => {
                self.bump();
                let (var, _) = self.expect_ident()?;
                self.expect(TokenKind::In)?;
                let from = self.expression()?;
                self.expect(TokenKind::DotDot)?;
                let to = self.expression()?;
                let body = self.braced_block()?;
                Ok(Stmt::For {
                    var,
                    from,
                    to,
                    body,
                    loc,
                })
            }
            TokenKind::Loop => {
                self.bump();
                let body = self.braced_block()?;
                Ok(Stmt::Loop { body, loc })
            }
            TokenKind::Break => {
                self.bump();
                self.expect(TokenKind::Semicolon)?;
                Ok(Stmt::Break { loc })
            }
            TokenKind::Continue => {
                self.bump();
                self.expect(TokenKind::Semicolon)?;
                Ok(Stmt::Continue { loc })
            }
            _ => self.expr_or_assign(),
        }
    }

    fn fn_decl(&mut self) -> Result<Stmt, ParseError> {
        let fn_token = self.bump();
        let loc = self.loc_of(&fn_token);
        let (name, _) = self.expect_ident()?;
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                let (param, _) = self.expect_ident()?;
                params.push(param);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;
        let body = self.braced_block()?;
        Ok(Stmt::FnDecl(Arc::new(FnDecl {
            name,
            params,
            body: Arc::new(body),
            loc,
        })))
    }

    fn if_stmt(&mut self) -> Result<Stmt, ParseError> {
        let if_token = self.bump();
        let loc = self.loc_of(&if_token);
        let cond = self.expression()?;
        let then_body = self.braced_block()?;
        let else_body = if self.eat(&TokenKind::Else) {
            if self.check(&TokenKind::If) {
                // `else if` chains become a nested conditional.
                Some(vec![self.if_stmt()?])
            } else {
                Some(self.braced_block()?)
            }
        } else {
            None
        };
        Ok(Stmt::If {
            cond,
            then_body,
            else_body,
            loc,
        })
    }

    fn expr_or_assign(&mut self) -> Result<Stmt, ParseError> {
        let loc = self.here();
        let expr = self.expression()?;
        if self.eat(&TokenKind::Assign) {
            let target = match expr {
                Expr::Ident(name, _) => AssignTarget::Name(name),
                Expr::Index { target, index, .. } => AssignTarget::Index {
                    target: *target,
                    index: *index,
                },
                other => {
                    let at = other.loc();
                    return Err(ParseError::BadAssignTarget {
                        line: at.line,
                        column: at.column,
                    });
                }
            };
            let value = self.expression()?;
            self.expect(TokenKind::Semicolon)?;
            return Ok(Stmt::Assign { target, value, loc });
        }
        self.expect(TokenKind::Semicolon)?;
        Ok(Stmt::Expr { expr, loc })
    }

    fn expression(&mut self) -> Result<Expr, ParseError> {
        self.or_expr()
    }

    fn or_expr(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.and_expr()?;
        while self.check(&TokenKind::OrOr) {
            let loc = self.here();
            self.bump();
            let rhs = self.and_expr()?;
            lhs = Expr::Binary {
                op: BinOp::Or,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                loc,
            };
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.equality()?;
        while self.check(&TokenKind::AndAnd) {
            let loc = self.here();
            self.bump();
            let rhs = self.equality()?;
            lhs = Expr::Binary {
                op: BinOp::And,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                loc,
            };
        }
        Ok(lhs)
    }

    fn equality(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.comparison()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::EqEq => BinOp::Eq,
                TokenKind::NotEq => BinOp::Ne,
                _ => break,
            };
            let loc = self.here();
            self.bump();
            let rhs = self.comparison()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                loc,
            };
        }
        Ok(lhs)
    }

    fn comparison(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Lt => BinOp::Lt,
                TokenKind::Le => BinOp::Le,
                TokenKind::Gt => BinOp::Gt,
                TokenKind::Ge => BinOp::Ge,
                _ => break,
            };
            let loc = self.here();
            self.bump();
            let rhs = self.term()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                loc,
            };
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.factor()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            let loc = self.here();
            self.bump();
            let rhs = self.factor()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                loc,
            };
        }
        Ok(lhs)
    }

    fn factor(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            let loc = self.here();
            self.bump();
            let rhs = self.unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                loc,
            };
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek().kind {
            TokenKind::Minus => Some(UnOp::Neg),
            TokenKind::Bang => Some(UnOp::Not),
            _ => None,
        };
        if let Some(op) = op {
            let loc = self.here();
            self.bump();
            let expr = self.unary()?;
            return Ok(Expr::Unary {
                op,
                expr: Box::new(expr),
                loc,
            });
        }
        self.postfix()
    }

    fn postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.primary()?;
        loop {
            if self.check(&TokenKind::LParen) {
                let loc = self.here();
                self.bump();
                let mut args = Vec::new();
                if !self.check(&TokenKind::RParen) {
                    loop {
                        args.push(self.expression()?);
                        if !self.eat(&TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RParen)?;
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                    loc,
                };
            } else if self.check(&TokenKind::LBracket) {
                let loc = self.here();
                self.bump();
                let index = self.expression()?;
                self.expect(TokenKind::RBracket)?;
                expr = Expr::Index {
                    target: Box::new(expr),
                    index: Box::new(index),
                    loc,
                };
            } else {
                return Ok(expr);
            }
        }
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        let token = self.bump();
        let loc = self.loc_of(&token);
        match token.kind {
            TokenKind::Nil => Ok(Expr::Nil(loc)),
            TokenKind::True => Ok(Expr::Bool(true, loc)),
            TokenKind::False => Ok(Expr::Bool(false, loc)),
            TokenKind::Int(v) => Ok(Expr::Int(v, loc)),
            TokenKind::Float(v) => Ok(Expr::Float(v, loc)),
            TokenKind::Str(v) => Ok(Expr::Str(v, loc)),
            TokenKind::Ident(name) => Ok(Expr::Ident(name, loc)),
            TokenKind::LParen => {
                let expr = self.expression()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::LBracket => {
                let mut items = Vec::new();
                if !self.check(&TokenKind::RBracket) {
                    loop {
                        items.push(self.expression()?);
                        if !self.eat(&TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RBracket)?;
                Ok(Expr::List(items, loc))
            }
            other => Err(ParseError::Unexpected {
                expected: "expression".to_string(),
                found: other.describe(),
                line: loc.line,
                column: loc.column,
            }),
        }
    }
}
