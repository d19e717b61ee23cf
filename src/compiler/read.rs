use std::rc::Rc;

use crate::{
    common::{
        lit::Lit,
        span::{Span, Spanned},
    },
    compiler::syntax::Syntax,
    construct::{
        token::{Delim, ResIden, Token, Tokens},
        tree::{
            BinOp, DeclKind, Expr, ForHead, Function, LogicOp, Program, Stmt,
            UnOp,
        },
    },
};

/// Every level of template nesting turns into a few levels of script
/// nesting (the statement, its block, the expression inside), so the
/// reader allows this many script levels per template level.
const NESTING_PER_LEVEL: usize = 4;

/// We're using a Pratt parser, so this little enum
/// defines different precedence levels.
/// Each successive level is higher, so, for example,
/// multiplication is higher than addition: `* > +`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Prec {
    /// No precedence.
    None = 0,
    /// `,`
    Comma,
    /// `=`, `+=`, etc.
    Assign,
    /// `?:`
    Conditional,
    /// `||`
    Or,
    /// `&&`
    And,
    /// `==`, `===`, etc.
    Equality,
    /// `<`, `>=`, etc.
    Compare,
    /// `+`, `-`
    AddSub,
    /// `*`, `/`, `%`
    MulDiv,
    /// `!`, `-`, `typeof`, `++x`, etc.
    Prefix,
    /// `x++`, `x--`
    Postfix,
    /// Calls, indexing, `.`
    Call,
    /// Highest precedence.
    End,
}

impl Prec {
    /// Increments precedence level to cause the
    /// parser to associate infix operators to the left.
    /// For example, addition is left-associated:
    /// `a + b + c` left-associated becomes `(a + b) + c`.
    /// By default, the parser associates right.
    ///
    /// `Prec::End` is the highest precedence and stays where it is.
    pub fn left(&self) -> Prec {
        use Prec::*;
        match self {
            None => Comma,
            Comma => Assign,
            Assign => Conditional,
            Conditional => Or,
            Or => And,
            And => Equality,
            Equality => Compare,
            Compare => AddSub,
            AddSub => MulDiv,
            MulDiv => Prefix,
            Prefix => Postfix,
            Postfix => Call,
            Call | End => End,
        }
    }
}

/// Reads a stream of tokens into a `Program`.
#[derive(Debug)]
pub struct Reader {
    tokens: Tokens,
    index: usize,
    /// The `var`s declared by each function being read, innermost last.
    vars: Vec<Vec<String>>,
    depth: usize,
    max_depth: usize,
}

impl Reader {
    /// Reads a whole script.
    /// Expects the token stream to be terminated by a `Token::End`.
    pub fn read(tokens: Tokens, max_nesting: usize) -> Result<Program, Syntax> {
        let mut reader = Reader {
            tokens,
            index: 0,
            vars: vec![vec![]],
            depth: 0,
            max_depth: max_nesting.saturating_mul(NESTING_PER_LEVEL),
        };

        let mut body = vec![];
        while !reader.at_end() {
            body.push(reader.statement()?);
        }

        let vars = reader.vars.pop().unwrap_or_default();
        let main = Function {
            name: None,
            params: vec![],
            body,
            vars,
        };
        Ok(Program {
            main: Rc::new(main),
        })
    }

    fn nested<T>(
        &mut self,
        rule: impl FnOnce(&mut Reader) -> Result<T, Syntax>,
    ) -> Result<T, Syntax> {
        if self.depth >= self.max_depth {
            return Err(Syntax::error("Nesting too deep", &self.peek().span));
        }
        self.depth += 1;
        let result = rule(self);
        self.depth -= 1;
        result
    }

    // token stream navigation

    fn peek(&self) -> &Spanned<Token> {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.index.min(last)]
    }

    fn peek_next(&self) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[(self.index + 1).min(last)].item
    }

    /// Moves past the current token, but never past the end.
    fn advance(&mut self) -> Spanned<Token> {
        let token = self.peek().clone();
        if token.item != Token::End {
            self.index += 1;
        }
        token
    }

    fn at_end(&self) -> bool { self.peek().item == Token::End }

    /// The span of the last token that was consumed.
    fn previous_span(&self) -> Span {
        let previous = self.index.saturating_sub(1);
        self.tokens[previous.min(self.tokens.len() - 1)].span.clone()
    }

    /// Whether a line break separates the current token from the last one.
    fn newline_before(&self) -> bool {
        if self.index == 0 {
            return false;
        }
        let previous = &self.tokens[self.index - 1].span;
        let current = &self.peek().span;
        let contents = &current.source().contents;
        contents
            .get(previous.end()..current.offset())
            .map_or(false, |between| between.contains('\n'))
    }

    fn is_op(&self, op: &str) -> bool {
        matches!(&self.peek().item, Token::Op(o) if o == op)
    }

    fn is_keyword(&self, keyword: ResIden) -> bool {
        self.keyword() == Some(keyword)
    }

    fn keyword(&self) -> Option<ResIden> {
        match &self.peek().item {
            Token::Iden(name) => ResIden::try_new(name),
            _ => None,
        }
    }

    fn is_close(&self, delim: Delim) -> bool {
        self.peek().item == Token::Close(delim)
    }

    fn unexpected(&self, expected: &str) -> Syntax {
        let token = self.peek();
        Syntax::error(
            &format!("Expected {}, found {}", expected, token.item),
            &token.span,
        )
    }

    fn eat_op(&mut self, op: &str) -> bool {
        let found = self.is_op(op);
        if found {
            self.advance();
        }
        found
    }

    fn expect_op(&mut self, op: &str) -> Result<(), Syntax> {
        if !self.eat_op(op) {
            return Err(self.unexpected(&format!("`{}`", op)));
        }
        Ok(())
    }

    fn expect_open(&mut self, delim: Delim) -> Result<(), Syntax> {
        if self.peek().item != Token::Open(delim) {
            return Err(self.unexpected(&format!("`{}`", delim.open())));
        }
        self.advance();
        Ok(())
    }

    fn expect_close(&mut self, delim: Delim) -> Result<(), Syntax> {
        if !self.is_close(delim) {
            return Err(self.unexpected(&format!("`{}`", delim.close())));
        }
        self.advance();
        Ok(())
    }

    fn expect_keyword(&mut self, keyword: ResIden, name: &str) -> Result<(), Syntax> {
        if !self.is_keyword(keyword) {
            return Err(self.unexpected(&format!("`{}`", name)));
        }
        self.advance();
        Ok(())
    }

    /// A statement ends at a `;`, before a `}`, at the end of the script,
    /// or at a line break.
    fn end_statement(&mut self) -> Result<(), Syntax> {
        match self.peek().item {
            Token::Sep => {
                self.advance();
                Ok(())
            },
            Token::Close(Delim::Curly) | Token::End => Ok(()),
            _ if self.newline_before() => Ok(()),
            _ => Err(self.unexpected("`;`")),
        }
    }

    /// A name that can be bound, i.e. any identifier that isn't reserved.
    fn name(&mut self) -> Result<String, Syntax> {
        match &self.peek().item {
            Token::Iden(name) if ResIden::try_new(name).is_none() => {
                let name = name.clone();
                self.advance();
                Ok(name)
            },
            _ => Err(self.unexpected("a name")),
        }
    }

    fn declare_var(&mut self, name: &str) {
        if let Some(vars) = self.vars.last_mut() {
            if !vars.iter().any(|v| v == name) {
                vars.push(name.to_string());
            }
        }
    }

    fn spanned<T>(&self, item: T, start: &Span) -> Spanned<T> {
        Spanned::new(item, Span::combine(start, &self.previous_span()))
    }

    // statements

    fn statement(&mut self) -> Result<Spanned<Stmt>, Syntax> {
        self.nested(|reader| {
            let start = reader.peek().span.clone();
            let stmt = reader.rule_statement()?;
            Ok(reader.spanned(stmt, &start))
        })
    }

    fn rule_statement(&mut self) -> Result<Stmt, Syntax> {
        if self.peek().item == Token::Sep {
            self.advance();
            return Ok(Stmt::Empty);
        }
        if self.peek().item == Token::Open(Delim::Curly) {
            return Ok(Stmt::Block(self.block()?));
        }

        let stmt = match self.keyword() {
            Some(ResIden::Var) => self.declaration(DeclKind::Var)?,
            Some(ResIden::Let) => self.declaration(DeclKind::Let)?,
            Some(ResIden::Const) => self.declaration(DeclKind::Const)?,
            Some(ResIden::If) => self.if_()?,
            Some(ResIden::For) => self.for_()?,
            Some(ResIden::While) => {
                self.advance();
                let test = self.condition()?;
                let body = self.statement()?;
                Stmt::While(test, Box::new(body))
            },
            Some(ResIden::Do) => {
                self.advance();
                let body = self.statement()?;
                self.expect_keyword(ResIden::While, "while")?;
                let test = self.condition()?;
                if self.peek().item == Token::Sep {
                    self.advance();
                }
                Stmt::DoWhile(Box::new(body), test)
            },
            Some(ResIden::Function) if matches!(self.peek_next(), Token::Iden(_)) => {
                Stmt::Function(self.function()?)
            },
            Some(ResIden::Return) => {
                self.advance();
                let ends = matches!(
                    self.peek().item,
                    Token::Sep | Token::Close(Delim::Curly) | Token::End
                );
                let value = if ends || self.newline_before() {
                    None
                } else {
                    Some(self.expr(Prec::None)?)
                };
                self.end_statement()?;
                Stmt::Return(value)
            },
            Some(ResIden::Break) => {
                self.advance();
                self.end_statement()?;
                Stmt::Break
            },
            Some(ResIden::Continue) => {
                self.advance();
                self.end_statement()?;
                Stmt::Continue
            },
            Some(ResIden::Throw) => {
                self.advance();
                let value = self.expr(Prec::None)?;
                self.end_statement()?;
                Stmt::Throw(value)
            },
            _ => {
                let expr = self.expr(Prec::None)?;
                self.end_statement()?;
                Stmt::Expr(expr)
            },
        };
        Ok(stmt)
    }

    /// `{ statement* }`
    fn block(&mut self) -> Result<Vec<Spanned<Stmt>>, Syntax> {
        self.expect_open(Delim::Curly)?;
        let mut body = vec![];
        while !self.is_close(Delim::Curly) {
            if self.at_end() {
                return Err(self.unexpected("`}`"));
            }
            body.push(self.statement()?);
        }
        self.advance();
        Ok(body)
    }

    /// `( expression )`, as in the head of an `if` or a `while`.
    fn condition(&mut self) -> Result<Spanned<Expr>, Syntax> {
        self.expect_open(Delim::Paren)?;
        let test = self.expr(Prec::None)?;
        self.expect_close(Delim::Paren)?;
        Ok(test)
    }

    fn declaration(&mut self, kind: DeclKind) -> Result<Stmt, Syntax> {
        let declarators = self.declarators(kind)?;
        self.end_statement()?;
        Ok(Stmt::Decl(kind, declarators))
    }

    /// The keyword and comma separated `name = value` pairs of a declaration.
    fn declarators(
        &mut self,
        kind: DeclKind,
    ) -> Result<Vec<(String, Option<Spanned<Expr>>)>, Syntax> {
        self.advance();
        let mut declarators = vec![];
        loop {
            let name_span = self.peek().span.clone();
            let name = self.name()?;
            if kind == DeclKind::Var {
                self.declare_var(&name);
            }

            let value = if self.eat_op("=") {
                Some(self.expr(Prec::Assign)?)
            } else if kind == DeclKind::Const {
                return Err(Syntax::error(
                    "Missing initializer in const declaration",
                    &name_span,
                ));
            } else {
                None
            };
            declarators.push((name, value));

            if !self.eat_op(",") {
                return Ok(declarators);
            }
        }
    }

    fn decl_kind(&self) -> Option<DeclKind> {
        match self.keyword() {
            Some(ResIden::Var) => Some(DeclKind::Var),
            Some(ResIden::Let) => Some(DeclKind::Let),
            Some(ResIden::Const) => Some(DeclKind::Const),
            _ => None,
        }
    }

    fn if_(&mut self) -> Result<Stmt, Syntax> {
        self.advance();
        let test = self.condition()?;
        let then = self.statement()?;
        let otherwise = if self.is_keyword(ResIden::Else) {
            self.advance();
            Some(Box::new(self.statement()?))
        } else {
            None
        };
        Ok(Stmt::If(test, Box::new(then), otherwise))
    }

    fn for_(&mut self) -> Result<Stmt, Syntax> {
        self.advance();
        self.expect_open(Delim::Paren)?;

        if let Some(head) = self.for_head() {
            let collection = self.expr(Prec::None)?;
            self.expect_close(Delim::Paren)?;
            let body = self.statement()?;
            return Ok(Stmt::ForIn(head, collection, Box::new(body)));
        }

        let init = if self.peek().item == Token::Sep {
            None
        } else {
            let start = self.peek().span.clone();
            let init = match self.decl_kind() {
                Some(kind) => Stmt::Decl(kind, self.declarators(kind)?),
                None => Stmt::Expr(self.expr(Prec::None)?),
            };
            Some(Box::new(self.spanned(init, &start)))
        };
        if self.peek().item != Token::Sep {
            return Err(self.unexpected("`;`"));
        }
        self.advance();

        let test = if self.peek().item == Token::Sep {
            None
        } else {
            Some(self.expr(Prec::None)?)
        };
        if self.peek().item != Token::Sep {
            return Err(self.unexpected("`;`"));
        }
        self.advance();

        let update = if self.is_close(Delim::Paren) {
            None
        } else {
            Some(self.expr(Prec::None)?)
        };
        self.expect_close(Delim::Paren)?;

        let body = self.statement()?;
        Ok(Stmt::For {
            init,
            test,
            update,
            body: Box::new(body),
        })
    }

    /// Reads `[var] name in` or `[var] name of`, if that's what comes next.
    /// Leaves the reader untouched otherwise.
    fn for_head(&mut self) -> Option<ForHead> {
        let checkpoint = self.index;
        let kind = self.decl_kind();
        if kind.is_some() {
            self.advance();
        }

        let name = match &self.peek().item {
            Token::Iden(name) if ResIden::try_new(name).is_none() => name.clone(),
            _ => {
                self.index = checkpoint;
                return None;
            },
        };
        let values = match self.peek_next() {
            Token::Iden(word) if word == "in" => false,
            Token::Iden(word) if word == "of" => true,
            _ => {
                self.index = checkpoint;
                return None;
            },
        };

        self.advance();
        self.advance();
        if kind == Some(DeclKind::Var) {
            self.declare_var(&name);
        }
        Some(ForHead { kind, name, values })
    }

    /// `function [name](params) { body }`, either as a declaration or as
    /// an expression.
    fn function(&mut self) -> Result<Rc<Function>, Syntax> {
        self.advance();
        let name = match &self.peek().item {
            Token::Iden(_) => Some(self.name()?),
            _ => None,
        };

        self.expect_open(Delim::Paren)?;
        let mut params = vec![];
        while !self.is_close(Delim::Paren) {
            params.push(self.name()?);
            if !self.eat_op(",") {
                break;
            }
        }
        self.expect_close(Delim::Paren)?;

        self.vars.push(vec![]);
        let body = self.block()?;
        let vars = self.vars.pop().unwrap_or_default();

        Ok(Rc::new(Function {
            name,
            params,
            body,
            vars,
        }))
    }

    // expressions

    fn expr(&mut self, prec: Prec) -> Result<Spanned<Expr>, Syntax> {
        self.nested(|reader| {
            let mut left = reader.rule_prefix()?;

            loop {
                let next = reader.prec();
                if next == Prec::None || next < prec {
                    break;
                }
                left = reader.rule_infix(left, next)?;
            }

            Ok(left)
        })
    }

    /// Returns the precedence of the current token as an infix operator,
    /// `Prec::None` if it can't continue an expression.
    fn prec(&self) -> Prec {
        match &self.peek().item {
            Token::Op(op) => match op.as_str() {
                "," => Prec::Comma,
                "=" | "+=" | "-=" | "*=" | "/=" | "%=" => Prec::Assign,
                "?" => Prec::Conditional,
                "||" => Prec::Or,
                "&&" => Prec::And,
                "==" | "!=" | "===" | "!==" => Prec::Equality,
                "<" | ">" | "<=" | ">=" => Prec::Compare,
                "+" | "-" => Prec::AddSub,
                "*" | "/" | "%" => Prec::MulDiv,
                // `a \n ++b` is two statements
                "++" | "--" if !self.newline_before() => Prec::Postfix,
                "." => Prec::Call,
                _ => Prec::None,
            },
            Token::Open(Delim::Paren) | Token::Open(Delim::Square) => Prec::Call,
            _ => Prec::None,
        }
    }

    fn rule_prefix(&mut self) -> Result<Spanned<Expr>, Syntax> {
        let start = self.peek().span.clone();
        let token = self.peek().item.clone();

        let expr = match token {
            Token::Lit(lit) => {
                self.advance();
                Expr::Lit(lit)
            },
            Token::Iden(name) => match ResIden::try_new(&name) {
                None => {
                    self.advance();
                    Expr::Iden(name)
                },
                Some(ResIden::This) => {
                    self.advance();
                    Expr::This
                },
                Some(ResIden::TypeOf) => {
                    self.advance();
                    Expr::unary(UnOp::TypeOf, self.expr(Prec::Prefix)?)
                },
                Some(ResIden::Function) => Expr::Function(self.function()?),
                Some(_) => {
                    return Err(Syntax::error(
                        &format!("Unexpected keyword `{}`", name),
                        &start,
                    ))
                },
            },
            Token::Op(op) => {
                self.advance();
                match op.as_str() {
                    "!" => Expr::unary(UnOp::Not, self.expr(Prec::Prefix)?),
                    "-" => Expr::unary(UnOp::Neg, self.expr(Prec::Prefix)?),
                    "+" => Expr::unary(UnOp::Plus, self.expr(Prec::Prefix)?),
                    "++" | "--" => {
                        let target = self.expr(Prec::Prefix)?;
                        Reader::check_target(&target)?;
                        Expr::update(op == "++", true, target)
                    },
                    _ => {
                        return Err(Syntax::error(
                            &format!("Unexpected operator `{}`", op),
                            &start,
                        ))
                    },
                }
            },
            Token::Open(Delim::Paren) => {
                self.advance();
                let inner = self.expr(Prec::None)?;
                self.expect_close(Delim::Paren)?;
                inner.item
            },
            Token::Open(Delim::Square) => self.array()?,
            Token::Open(Delim::Curly) => self.object()?,
            _ => return Err(self.unexpected("an expression")),
        };

        Ok(self.spanned(expr, &start))
    }

    fn rule_infix(
        &mut self,
        left: Spanned<Expr>,
        prec: Prec,
    ) -> Result<Spanned<Expr>, Syntax> {
        let start = left.span.clone();
        let token = self.advance();

        let expr = match token.item {
            Token::Open(Delim::Paren) => {
                let args = self.arguments()?;
                Expr::call(left, args)
            },
            Token::Open(Delim::Square) => {
                let index = self.expr(Prec::None)?;
                self.expect_close(Delim::Square)?;
                Expr::index(left, index)
            },
            Token::Op(op) => match op.as_str() {
                "." => {
                    let field = self.field()?;
                    Expr::member(left, &field)
                },
                "," => {
                    let right = self.expr(prec.left())?;
                    let mut items = match left.item {
                        Expr::Sequence(items) => items,
                        _ => vec![left],
                    };
                    items.push(right);
                    Expr::Sequence(items)
                },
                "?" => {
                    let then = self.expr(Prec::Assign)?;
                    self.expect_op(":")?;
                    let otherwise = self.expr(Prec::Assign)?;
                    Expr::conditional(left, then, otherwise)
                },
                "++" | "--" => {
                    Reader::check_target(&left)?;
                    Expr::update(op == "++", false, left)
                },
                "||" => Expr::logic(LogicOp::Or, left, self.expr(prec.left())?),
                "&&" => Expr::logic(LogicOp::And, left, self.expr(prec.left())?),
                assign if prec == Prec::Assign => {
                    Reader::check_target(&left)?;
                    // assignment associates right
                    let value = self.expr(Prec::Assign)?;
                    let op = match assign {
                        "+=" => Some(BinOp::Add),
                        "-=" => Some(BinOp::Sub),
                        "*=" => Some(BinOp::Mul),
                        "/=" => Some(BinOp::Div),
                        "%=" => Some(BinOp::Rem),
                        _ => None,
                    };
                    Expr::assign(op, left, value)
                },
                binary => {
                    let op = Reader::binop(binary).ok_or_else(|| {
                        Syntax::error(
                            &format!("Invalid operator `{}`", binary),
                            &token.span,
                        )
                    })?;
                    Expr::binary(op, left, self.expr(prec.left())?)
                },
            },
            _ => return Err(Syntax::error("Expected an operator", &token.span)),
        };

        Ok(self.spanned(expr, &start))
    }

    fn binop(name: &str) -> Option<BinOp> {
        use BinOp::*;
        Some(match name {
            "+" => Add,
            "-" => Sub,
            "*" => Mul,
            "/" => Div,
            "%" => Rem,
            "<" => Lt,
            ">" => Gt,
            "<=" => LtEq,
            ">=" => GtEq,
            "==" => Eq,
            "!=" => NotEq,
            "===" => StrictEq,
            "!==" => StrictNotEq,
            _ => return None,
        })
    }

    fn check_target(target: &Spanned<Expr>) -> Result<(), Syntax> {
        if !target.item.is_target() {
            return Err(Syntax::error("Invalid assignment target", &target.span));
        }
        Ok(())
    }

    /// The name after a `.`; reserved words are fine here.
    fn field(&mut self) -> Result<String, Syntax> {
        let field = match &self.peek().item {
            Token::Iden(name) => name.clone(),
            Token::Lit(lit @ (Lit::Boolean(_) | Lit::Null | Lit::Undefined)) => {
                lit.to_string()
            },
            _ => return Err(self.unexpected("a property name")),
        };
        self.advance();
        Ok(field)
    }

    /// Comma separated expressions up to a closing `)`,
    /// the opening `(` already consumed.
    fn arguments(&mut self) -> Result<Vec<Spanned<Expr>>, Syntax> {
        let mut args = vec![];
        while !self.is_close(Delim::Paren) {
            args.push(self.expr(Prec::Assign)?);
            if !self.eat_op(",") {
                break;
            }
        }
        self.expect_close(Delim::Paren)?;
        Ok(args)
    }

    /// `[a, b, c]`, trailing comma allowed.
    fn array(&mut self) -> Result<Expr, Syntax> {
        self.advance();
        let mut items = vec![];
        while !self.is_close(Delim::Square) {
            items.push(self.expr(Prec::Assign)?);
            if !self.eat_op(",") {
                break;
            }
        }
        self.expect_close(Delim::Square)?;
        Ok(Expr::Array(items))
    }

    /// `{ key: value, "quoted": value, shorthand }`, trailing comma allowed.
    fn object(&mut self) -> Result<Expr, Syntax> {
        self.advance();
        let mut fields = vec![];
        while !self.is_close(Delim::Curly) {
            let key_span = self.peek().span.clone();
            let key = match &self.peek().item {
                Token::Iden(name) => name.clone(),
                Token::Lit(Lit::String(s)) => s.clone(),
                Token::Lit(lit) => lit.to_string(),
                _ => return Err(self.unexpected("a property name")),
            };
            self.advance();

            let value = if self.eat_op(":") {
                self.expr(Prec::Assign)?
            } else {
                Spanned::new(Expr::Iden(key.clone()), key_span)
            };
            fields.push((key, value));

            if !self.eat_op(",") {
                break;
            }
        }
        self.expect_close(Delim::Curly)?;
        Ok(Expr::Object(fields))
    }
}
