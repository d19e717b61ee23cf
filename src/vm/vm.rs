use std::{
    cmp::Ordering,
    collections::HashMap,
    rc::{Rc, Weak},
};

use indexmap::IndexMap;
use tracing::trace;

use crate::{
    common::{
        closure::Closure,
        data::{format_number, Array, Data},
        span::{Span, Spanned},
    },
    construct::tree::{
        BinOp, DeclKind, Expr, ForHead, Function, LogicOp, Program, Stmt, UnOp,
    },
    config::Config,
    core::{self, array::Callback, extract::arg},
    vm::{
        scope::{Assigned, Scope},
        trace::{Kind, Trace},
    },
};

/// How control leaves a statement.
#[derive(Debug)]
enum Flow {
    Next,
    Break,
    Continue,
    Return(Data),
}

/// Something that can be assigned to.
enum Place {
    Name(String),
    Field(Data, String),
}

/// A `VM` walks the tree of a `Program` and evaluates it.
/// Each VM's state is self-contained and lives for one render,
/// so more than one can be spawned if needed.
#[derive(Debug)]
pub struct VM {
    globals: HashMap<String, Data>,
    /// The data the template is rendered with.
    context: Data,
    /// Every scope entered so far, cleared after the run.
    scopes: Vec<Weak<Scope>>,
    depth: usize,
    max_calls: usize,
    /// Where the native stack was when the run started.
    base: usize,
    max_stack: usize,
}

/// The address of a local in a fresh frame, i.e. roughly the current
/// top of the native stack.
#[inline(never)]
fn stack_position() -> usize {
    let marker = 0u8;
    std::hint::black_box(&marker) as *const u8 as usize
}

fn error(kind: Kind, message: &str, span: &Span) -> Trace {
    Trace::error(kind, message, vec![span.clone()])
}

/// The array index a property name stands for, if any.
/// Only canonical forms count: `"1"` is an index, `"01"` isn't.
fn index(name: &str) -> Option<usize> {
    let n = name.parse::<u32>().ok()?;
    (n != u32::MAX && n.to_string() == name).then_some(n as usize)
}

/// The property name a computed key stands for.
fn key(data: &Data) -> String {
    match data {
        Data::Number(n) => format_number(*n),
        other => other.to_string(),
    }
}

fn callable(data: &Data) -> bool {
    matches!(data, Data::Function(_) | Data::Native(_))
}

/// Arrays and objects compare by their string form.
fn primitive(data: Data) -> Data {
    match data {
        Data::Array(_) | Data::Object(_) => Data::String(data.to_string()),
        other => other,
    }
}

fn compare(left: Data, right: Data) -> Option<Ordering> {
    match (primitive(left), primitive(right)) {
        (Data::String(a), Data::String(b)) => Some(a.cmp(&b)),
        (a, b) => a.to_number().partial_cmp(&b.to_number()),
    }
}

/// Applies an operator that can't fail.
pub fn binary(op: BinOp, left: Data, right: Data) -> Data {
    let concat = |data: &Data| {
        matches!(
            data,
            Data::String(_)
                | Data::Array(_)
                | Data::Object(_)
                | Data::Function(_)
                | Data::Native(_)
        )
    };

    match op {
        BinOp::Add if concat(&left) || concat(&right) => {
            Data::String(format!("{}{}", left, right))
        },
        BinOp::Add => Data::Number(left.to_number() + right.to_number()),
        BinOp::Sub => Data::Number(left.to_number() - right.to_number()),
        BinOp::Mul => Data::Number(left.to_number() * right.to_number()),
        BinOp::Div => Data::Number(left.to_number() / right.to_number()),
        BinOp::Rem => Data::Number(left.to_number() % right.to_number()),

        BinOp::Lt => Data::Boolean(compare(left, right) == Some(Ordering::Less)),
        BinOp::Gt => Data::Boolean(compare(left, right) == Some(Ordering::Greater)),
        BinOp::LtEq => Data::Boolean(matches!(
            compare(left, right),
            Some(Ordering::Less | Ordering::Equal)
        )),
        BinOp::GtEq => Data::Boolean(matches!(
            compare(left, right),
            Some(Ordering::Greater | Ordering::Equal)
        )),

        BinOp::Eq => Data::Boolean(left.loose_eq(&right)),
        BinOp::NotEq => Data::Boolean(!left.loose_eq(&right)),
        BinOp::StrictEq => Data::Boolean(left.strict_eq(&right)),
        BinOp::StrictNotEq => Data::Boolean(!left.strict_eq(&right)),
    }
}

impl VM {
    /// Initialize a new VM.
    /// Names the program doesn't bind are looked up in `context`,
    /// when it is an object, before the globals.
    pub fn init(context: Data, config: &Config) -> VM {
        VM {
            globals: core::globals(),
            context,
            scopes: vec![],
            depth: 0,
            max_calls: config.max_calls,
            base: stack_position(),
            max_stack: config.max_stack,
        }
    }

    /// Runs a program to completion, returning what it returns.
    pub fn run(&mut self, program: &Program) -> Result<Data, Trace> {
        self.base = stack_position();
        let root = Scope::root();
        self.scopes.push(Rc::downgrade(&root));
        root.declare("this", Data::Undefined, true);

        let result = self.body(&program.main, &root);

        // closures and the scopes they close over refer to each other
        for scope in self.scopes.drain(..) {
            if let Some(scope) = scope.upgrade() {
                scope.clear();
            }
        }

        match result? {
            Flow::Return(data) => Ok(data),
            _ => Ok(Data::Undefined),
        }
    }

    /// Fails once the run has used up its native stack budget.
    /// Checked on every statement and expression, so the overshoot is at
    /// most one frame of each.
    fn guard(&self, span: &Span) -> Result<(), Trace> {
        if stack_position().abs_diff(self.base) > self.max_stack {
            return Err(error(Kind::Range, "Maximum call stack size exceeded", span));
        }
        Ok(())
    }

    fn enter(&mut self, parent: &Rc<Scope>) -> Rc<Scope> {
        if self.scopes.len() == self.scopes.capacity() {
            self.scopes.retain(|scope| scope.strong_count() > 0);
        }
        let scope = Scope::child(parent);
        self.scopes.push(Rc::downgrade(&scope));
        scope
    }

    // names

    fn resolve(&self, name: &str, scope: &Rc<Scope>) -> Option<Data> {
        if let Some(data) = scope.lookup(name) {
            return Some(data);
        }
        if let Data::Object(fields) = &self.context {
            if let Some(data) = fields.borrow().get(name) {
                return Some(data.clone());
            }
        }
        self.globals.get(name).cloned()
    }

    fn lookup(&self, name: &str, scope: &Rc<Scope>, span: &Span) -> Result<Data, Trace> {
        self.resolve(name, scope).ok_or_else(|| {
            error(Kind::Reference, &format!("{} is not defined", name), span)
        })
    }

    /// Assigns to the nearest binding of a name.
    /// Unbound names write the data field of the same name,
    /// or become new globals for the rest of the render.
    fn assign(
        &self,
        name: &str,
        value: Data,
        scope: &Rc<Scope>,
        span: &Span,
    ) -> Result<(), Trace> {
        match scope.assign(name, value.clone()) {
            Assigned::Done => Ok(()),
            Assigned::Constant => {
                Err(error(Kind::Type, "Assignment to constant variable.", span))
            },
            Assigned::Unbound => {
                if let Data::Object(fields) = &self.context {
                    let mut fields = fields.borrow_mut();
                    if let Some(field) = fields.get_mut(name) {
                        *field = value;
                        return Ok(());
                    }
                }
                scope.root_of().declare(name, value, false);
                Ok(())
            },
        }
    }

    // properties

    fn get(&self, target: &Data, name: &str, span: &Span) -> Result<Data, Trace> {
        let found = match target {
            Data::Undefined | Data::Null => {
                return Err(error(
                    Kind::Type,
                    &format!(
                        "Cannot read properties of {} (reading '{}')",
                        target, name
                    ),
                    span,
                ))
            },
            Data::Object(fields) => fields.borrow().get(name).cloned(),
            Data::Array(items) => {
                let items = items.borrow();
                if name == "length" {
                    Some(Data::Number(items.len() as f64))
                } else if let Some(i) = index(name) {
                    Some(items.get(i).cloned().unwrap_or(Data::Undefined))
                } else {
                    None
                }
            },
            Data::String(s) => {
                if name == "length" {
                    Some(Data::Number(s.chars().count() as f64))
                } else if let Some(i) = index(name) {
                    Some(match s.chars().nth(i) {
                        Some(c) => Data::String(c.to_string()),
                        None => Data::Undefined,
                    })
                } else {
                    None
                }
            },
            Data::Function(closure) => match name {
                "name" => Some(Data::string(closure.name())),
                "length" => Some(Data::Number(closure.function.params.len() as f64)),
                _ => None,
            },
            Data::Native(native) => match name {
                "name" => Some(Data::string(native.name)),
                _ => None,
            },
            Data::Boolean(_) | Data::Number(_) => None,
        };

        Ok(found
            .or_else(|| core::member(target, name))
            .unwrap_or(Data::Undefined))
    }

    fn set(&self, target: &Data, name: String, value: Data, span: &Span) -> Result<(), Trace> {
        match target {
            Data::Undefined | Data::Null => Err(error(
                Kind::Type,
                &format!("Cannot set properties of {} (setting '{}')", target, name),
                span,
            )),
            Data::Object(fields) => {
                fields.borrow_mut().insert(name, value);
                Ok(())
            },
            Data::Array(items) if name == "length" => {
                let len = value.to_number();
                if len < 0.0 || len.fract() != 0.0 || len > u32::MAX as f64 {
                    return Err(error(Kind::Range, "Invalid array length", span));
                }
                items.borrow_mut().resize(len as usize, Data::Undefined);
                Ok(())
            },
            Data::Array(items) => {
                if let Some(i) = index(&name) {
                    let mut items = items.borrow_mut();
                    if i >= items.len() {
                        items.resize(i + 1, Data::Undefined);
                    }
                    items[i] = value;
                }
                Ok(())
            },
            // primitives can't hold properties
            _ => Ok(()),
        }
    }

    fn place(&mut self, target: &Spanned<Expr>, scope: &Rc<Scope>) -> Result<Place, Trace> {
        Ok(match &target.item {
            Expr::Iden(name) => Place::Name(name.clone()),
            Expr::Member(object, name) => {
                Place::Field(self.expr(object, scope)?, name.clone())
            },
            Expr::Index(object, field) => {
                let object = self.expr(object, scope)?;
                Place::Field(object, key(&self.expr(field, scope)?))
            },
            _ => return Err(error(Kind::Type, "Invalid assignment target", &target.span)),
        })
    }

    fn read(&self, place: &Place, scope: &Rc<Scope>, span: &Span) -> Result<Data, Trace> {
        match place {
            Place::Name(name) => self.lookup(name, scope, span),
            Place::Field(target, name) => self.get(target, name, span),
        }
    }

    fn write(
        &self,
        place: Place,
        value: Data,
        scope: &Rc<Scope>,
        span: &Span,
    ) -> Result<(), Trace> {
        match place {
            Place::Name(name) => self.assign(&name, value, scope, span),
            Place::Field(target, name) => self.set(&target, name, value, span),
        }
    }

    // calls

    fn call(&mut self, fun: Data, this: Data, args: Vec<Data>, span: &Span) -> Result<Data, Trace> {
        match fun {
            Data::Native(native) => {
                if let (Some(callback), Data::Array(items)) =
                    (Callback::from_name(native.name), &this)
                {
                    return self.callback(callback, items.clone(), args, span);
                }
                native
                    .call(this, args)
                    .map_err(|message| error(Kind::Type, &message, span))
            },
            Data::Function(closure) => self.invoke(&closure, this, args, span),
            other => Err(error(
                Kind::Type,
                &format!("{} is not a function", other.type_of()),
                span,
            )),
        }
    }

    fn invoke(
        &mut self,
        closure: &Rc<Closure>,
        this: Data,
        args: Vec<Data>,
        span: &Span,
    ) -> Result<Data, Trace> {
        if self.depth >= self.max_calls {
            return Err(error(Kind::Range, "Maximum call stack size exceeded", span));
        }
        self.depth += 1;
        trace!(function = closure.name(), depth = self.depth, "call");

        let scope = self.enter(&closure.scope);
        scope.declare("this", this, true);
        if let Some(name) = &closure.function.name {
            scope.declare(name, Data::Function(Rc::clone(closure)), false);
        }
        let mut args = args.into_iter();
        for param in closure.function.params.iter() {
            scope.declare(param, args.next().unwrap_or(Data::Undefined), false);
        }

        let result = self.body(&closure.function, &scope);
        self.depth -= 1;

        match result {
            Ok(Flow::Return(data)) => Ok(data),
            Ok(_) => Ok(Data::Undefined),
            Err(trace) => Err(trace.add_context(span.clone())),
        }
    }

    /// Runs `map`, `filter` or `forEach`.
    /// Items pushed by the callback are not visited.
    fn callback(
        &mut self,
        callback: Callback,
        items: Array,
        args: Vec<Data>,
        span: &Span,
    ) -> Result<Data, Trace> {
        let fun = arg(&args, 0);
        if !callable(&fun) {
            return Err(error(
                Kind::Type,
                &format!("{} is not a function", fun),
                span,
            ));
        }
        let this = arg(&args, 1);

        let snapshot = items.borrow().clone();
        let array = Data::Array(items);
        let mut results = vec![];
        for (i, item) in snapshot.into_iter().enumerate() {
            let args = vec![item.clone(), Data::Number(i as f64), array.clone()];
            let output = self.call(fun.clone(), this.clone(), args, span)?;
            match callback {
                Callback::Map => results.push(output),
                Callback::Filter if output.truthy() => results.push(item),
                _ => (),
            }
        }

        Ok(match callback {
            Callback::ForEach => Data::Undefined,
            _ => Data::array(results),
        })
    }

    // statements

    /// Runs a function body in a fresh scope.
    fn body(&mut self, function: &Function, scope: &Rc<Scope>) -> Result<Flow, Trace> {
        for var in function.vars.iter() {
            scope.hoist(var);
        }
        self.statements(&function.body, scope)
    }

    /// Runs statements in order; function declarations are bound first.
    fn statements(&mut self, statements: &[Spanned<Stmt>], scope: &Rc<Scope>) -> Result<Flow, Trace> {
        for statement in statements.iter() {
            if let Stmt::Function(function) = &statement.item {
                if let Some(name) = &function.name {
                    let closure = Closure::wrap(Rc::clone(function), Rc::clone(scope));
                    scope.declare(name, Data::Function(Rc::new(closure)), false);
                }
            }
        }

        for statement in statements.iter() {
            match self.statement(statement, scope)? {
                Flow::Next => (),
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Next)
    }

    /// Runs the body of a loop, returning whether the loop should stop
    /// and how the enclosing statement should continue.
    fn looped(&mut self, body: &Spanned<Stmt>, scope: &Rc<Scope>) -> Result<Option<Flow>, Trace> {
        Ok(match self.statement(body, scope)? {
            Flow::Break => Some(Flow::Next),
            Flow::Return(data) => Some(Flow::Return(data)),
            Flow::Next | Flow::Continue => None,
        })
    }

    fn statement(&mut self, statement: &Spanned<Stmt>, scope: &Rc<Scope>) -> Result<Flow, Trace> {
        self.guard(&statement.span)?;
        match &statement.item {
            Stmt::Expr(expr) => {
                self.expr(expr, scope)?;
            },
            Stmt::Decl(kind, declarations) => {
                for (name, init) in declarations.iter() {
                    let value = match init {
                        Some(init) => self.expr(init, scope)?,
                        None if *kind == DeclKind::Var => continue,
                        None => Data::Undefined,
                    };
                    match kind {
                        DeclKind::Var => self.assign(name, value, scope, &statement.span)?,
                        DeclKind::Let => scope.declare(name, value, false),
                        DeclKind::Const => scope.declare(name, value, true),
                    }
                }
            },
            Stmt::Function(_) | Stmt::Empty => (),
            Stmt::Block(statements) => {
                let inner = self.enter(scope);
                return self.statements(statements, &inner);
            },
            Stmt::If(test, then, otherwise) => {
                if self.expr(test, scope)?.truthy() {
                    return self.statement(then, scope);
                } else if let Some(otherwise) = otherwise {
                    return self.statement(otherwise, scope);
                }
            },
            Stmt::For {
                init,
                test,
                update,
                body,
            } => {
                let inner = self.enter(scope);
                if let Some(init) = init {
                    self.statement(init, &inner)?;
                }
                loop {
                    if let Some(test) = test {
                        if !self.expr(test, &inner)?.truthy() {
                            break;
                        }
                    }
                    if let Some(flow) = self.looped(body, &inner)? {
                        return Ok(flow);
                    }
                    if let Some(update) = update {
                        self.expr(update, &inner)?;
                    }
                }
            },
            Stmt::ForIn(head, subject, body) => {
                return self.for_in(head, subject, body, scope, &statement.span)
            },
            Stmt::While(test, body) => {
                while self.expr(test, scope)?.truthy() {
                    if let Some(flow) = self.looped(body, scope)? {
                        return Ok(flow);
                    }
                }
            },
            Stmt::DoWhile(body, test) => loop {
                if let Some(flow) = self.looped(body, scope)? {
                    return Ok(flow);
                }
                if !self.expr(test, scope)?.truthy() {
                    break;
                }
            },
            Stmt::Return(value) => {
                let value = match value {
                    Some(value) => self.expr(value, scope)?,
                    None => Data::Undefined,
                };
                return Ok(Flow::Return(value));
            },
            Stmt::Break => return Ok(Flow::Break),
            Stmt::Continue => return Ok(Flow::Continue),
            Stmt::Throw(value) => {
                let value = self.expr(value, scope)?;
                let message = match &value {
                    Data::Object(fields) => match fields.borrow().get("message") {
                        Some(message) => message.to_string(),
                        None => value.to_string(),
                    },
                    other => other.to_string(),
                };
                return Err(error(Kind::Thrown, &message, &statement.span));
            },
        }

        Ok(Flow::Next)
    }

    /// `for (x in subject)` visits keys, `for (x of subject)` visits values.
    fn for_in(
        &mut self,
        head: &ForHead,
        subject: &Spanned<Expr>,
        body: &Spanned<Stmt>,
        scope: &Rc<Scope>,
        span: &Span,
    ) -> Result<Flow, Trace> {
        let value = self.expr(subject, scope)?;
        let items: Vec<Data> = match (&value, head.values) {
            (Data::Object(fields), false) => {
                fields.borrow().keys().map(Data::string).collect()
            },
            (Data::Array(items), false) => {
                (0..items.borrow().len()).map(|i| Data::String(i.to_string())).collect()
            },
            (Data::String(s), false) => {
                (0..s.chars().count()).map(|i| Data::String(i.to_string())).collect()
            },
            (_, false) => vec![],
            (Data::Array(items), true) => items.borrow().clone(),
            (Data::String(s), true) => s.chars().map(|c| Data::String(c.to_string())).collect(),
            (_, true) => {
                return Err(error(
                    Kind::Type,
                    &format!("{} is not iterable", subject.span.contents()),
                    &subject.span,
                ))
            },
        };

        for item in items {
            let flow = match head.kind {
                Some(kind @ (DeclKind::Let | DeclKind::Const)) => {
                    let iteration = self.enter(scope);
                    iteration.declare(&head.name, item, kind == DeclKind::Const);
                    self.looped(body, &iteration)?
                },
                _ => {
                    self.assign(&head.name, item, scope, span)?;
                    self.looped(body, scope)?
                },
            };
            if let Some(flow) = flow {
                return Ok(flow);
            }
        }
        Ok(Flow::Next)
    }

    // expressions

    fn expr(&mut self, expr: &Spanned<Expr>, scope: &Rc<Scope>) -> Result<Data, Trace> {
        let span = &expr.span;
        self.guard(span)?;
        Ok(match &expr.item {
            Expr::Lit(lit) => lit.clone().to_data(),
            Expr::Iden(name) => self.lookup(name, scope, span)?,
            Expr::This => scope.lookup("this").unwrap_or(Data::Undefined),
            Expr::Array(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items.iter() {
                    values.push(self.expr(item, scope)?);
                }
                Data::array(values)
            },
            Expr::Object(fields) => {
                let mut values = IndexMap::new();
                for (name, field) in fields.iter() {
                    values.insert(name.clone(), self.expr(field, scope)?);
                }
                Data::object(values)
            },
            Expr::Function(function) => {
                let closure = Closure::wrap(Rc::clone(function), Rc::clone(scope));
                Data::Function(Rc::new(closure))
            },

            Expr::Member(object, name) => {
                let target = self.expr(object, scope)?;
                self.get(&target, name, span)?
            },
            Expr::Index(object, field) => {
                let target = self.expr(object, scope)?;
                let name = key(&self.expr(field, scope)?);
                self.get(&target, &name, span)?
            },
            Expr::Call(callee, args) => {
                let (this, fun) = match &callee.item {
                    Expr::Member(object, name) => {
                        let this = self.expr(object, scope)?;
                        let fun = self.get(&this, name, &callee.span)?;
                        (this, fun)
                    },
                    Expr::Index(object, field) => {
                        let this = self.expr(object, scope)?;
                        let name = key(&self.expr(field, scope)?);
                        let fun = self.get(&this, &name, &callee.span)?;
                        (this, fun)
                    },
                    _ => (Data::Undefined, self.expr(callee, scope)?),
                };

                if !callable(&fun) {
                    return Err(error(
                        Kind::Type,
                        &format!("{} is not a function", callee.span.contents()),
                        span,
                    ));
                }

                let mut values = Vec::with_capacity(args.len());
                for arg in args.iter() {
                    values.push(self.expr(arg, scope)?);
                }
                self.call(fun, this, values, span)?
            },

            Expr::Unary(UnOp::TypeOf, operand) => {
                let value = match &operand.item {
                    // undeclared names are fine here
                    Expr::Iden(name) => self.resolve(name, scope).unwrap_or(Data::Undefined),
                    _ => self.expr(operand, scope)?,
                };
                Data::string(value.type_of())
            },
            Expr::Unary(op, operand) => {
                let value = self.expr(operand, scope)?;
                match op {
                    UnOp::Not => Data::Boolean(!value.truthy()),
                    UnOp::Neg => Data::Number(-value.to_number()),
                    UnOp::Plus | UnOp::TypeOf => Data::Number(value.to_number()),
                }
            },
            Expr::Update {
                increment,
                prefix,
                target,
            } => {
                let place = self.place(target, scope)?;
                let old = self.read(&place, scope, span)?.to_number();
                let new = if *increment { old + 1.0 } else { old - 1.0 };
                self.write(place, Data::Number(new), scope, span)?;
                Data::Number(if *prefix { new } else { old })
            },
            Expr::Binary(op, left, right) => {
                let left = self.expr(left, scope)?;
                let right = self.expr(right, scope)?;
                binary(*op, left, right)
            },
            Expr::Logic(op, left, right) => {
                let left = self.expr(left, scope)?;
                match (op, left.truthy()) {
                    (LogicOp::And, true) | (LogicOp::Or, false) => self.expr(right, scope)?,
                    _ => left,
                }
            },
            Expr::Conditional(test, then, otherwise) => {
                if self.expr(test, scope)?.truthy() {
                    self.expr(then, scope)?
                } else {
                    self.expr(otherwise, scope)?
                }
            },
            Expr::Assign(op, target, value) => {
                let place = self.place(target, scope)?;
                let value = match op {
                    None => self.expr(value, scope)?,
                    Some(op) => {
                        let old = self.read(&place, scope, span)?;
                        binary(*op, old, self.expr(value, scope)?)
                    },
                };
                self.write(place, value.clone(), scope, span)?;
                value
            },
            Expr::Sequence(exprs) => {
                let mut last = Data::Undefined;
                for expr in exprs.iter() {
                    last = self.expr(expr, scope)?;
                }
                last
            },
        })
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;
    use crate::{
        common::source::Source,
        compiler::{lex::Lexer, read::Reader},
    };

    fn run_with(script: &str, context: Data) -> Result<Data, Trace> {
        let source = Source::generated(script);
        let tokens = Lexer::lex(source).unwrap();
        let program = Reader::read(tokens, 64).unwrap();
        let config = Config {
            max_calls: 64,
            ..Config::default()
        };
        VM::init(context, &config).run(&program)
    }

    fn run(script: &str) -> String {
        run_with(script, Data::Undefined).unwrap().to_string()
    }

    fn fails(script: &str) -> Trace { run_with(script, Data::Undefined).unwrap_err() }

    #[test]
    fn arithmetic_and_concatenation() {
        assert_eq!(run("return 1 + 2 * 3;"), "7");
        assert_eq!(run("return 'a' + 1 + 2;"), "a12");
        assert_eq!(run("return 1 + 2 + 'a';"), "3a");
        assert_eq!(run("return [1, 2] + 3;"), "1,23");
        assert_eq!(run("return 7 % 3;"), "1");
        assert_eq!(run("return 1 / 0;"), "Infinity");
        assert_eq!(run("return '3' * '4';"), "12");
    }

    #[test]
    fn comparisons() {
        assert_eq!(run("return 'b' > 'a';"), "true");
        assert_eq!(run("return '10' < '9';"), "true");
        assert_eq!(run("return 10 < '9';"), "false");
        assert_eq!(run("return 1 == '1';"), "true");
        assert_eq!(run("return 1 === '1';"), "false");
        assert_eq!(run("return null == undefined;"), "true");
        assert_eq!(run("return NaN < 1;"), "false");
    }

    #[test]
    fn short_circuits() {
        assert_eq!(run("return 0 || 'x';"), "x");
        assert_eq!(run("return 'a' && 'b';"), "b");
        assert_eq!(run("return null && missing();"), "null");
        assert_eq!(run("return true ? 1 : 2;"), "1");
    }

    #[test]
    fn variables_and_scopes() {
        assert_eq!(run("var a = 1; { let a = 2; } return a;"), "1");
        assert_eq!(run("var a = 1; { var a = 2; } return a;"), "2");
        assert_eq!(run("return typeof a; var a = 1;"), "undefined");
        assert_eq!(run("let a = 1; a += 2; a *= 3; return a;"), "9");
        assert_eq!(run("var i = 0; var j = i++; return [i, j, ++i];"), "1,0,2");
    }

    #[test]
    fn functions_and_closures() {
        assert_eq!(run("return f(2); function f(x) { return x * 2; }"), "4");
        assert_eq!(
            run("function counter() { var n = 0; return function() { return ++n; }; }
                 var c = counter(); c(); c(); return c();"),
            "3"
        );
        assert_eq!(
            run("var fact = function f(n) { return n <= 1 ? 1 : n * f(n - 1); }; return fact(5);"),
            "120"
        );
        assert_eq!(run("function f(a, b) { return b; } return f(1);"), "undefined");
        assert_eq!(run("function f() {} return f.name + f.length;"), "f0");
    }

    #[test]
    fn methods_see_this() {
        assert_eq!(
            run("var o = { n: 2, get: function() { return this.n; } }; return o.get();"),
            "2"
        );
        assert_eq!(run("function f() { return typeof this; } return f();"), "undefined");
    }

    #[test]
    fn loops() {
        assert_eq!(
            run("var s = ''; for (var i = 0; i < 5; i++) { if (i == 1) continue; if (i == 4) break; s += i; } return s;"),
            "023"
        );
        assert_eq!(run("var n = 0; while (n < 10) n += 3; return n;"), "12");
        assert_eq!(run("var n = 0; do { n++; } while (false); return n;"), "1");
        assert_eq!(
            run("var s = ''; for (var k in { a: 1, b: 2 }) s += k; return s;"),
            "ab"
        );
        assert_eq!(run("var s = ''; for (let x of [1, 2, 3]) s += x; return s;"), "123");
        assert_eq!(run("var s = ''; for (var i in 'ab') s += i; return s;"), "01");
        assert_eq!(run("function f() { for (;;) { return 'out'; } } return f();"), "out");
    }

    #[test]
    fn arrays() {
        assert_eq!(run("var a = [1, 2, 3]; a.push(4); return a.length;"), "4");
        assert_eq!(run("var a = []; a[2] = 'x'; return a.length + a.join('-');"), "3--x");
        assert_eq!(run("var a = [1, 2, 3]; a.length = 1; return a;"), "1");
        assert_eq!(run("return [1, 2, 3].map(function(x) { return x * 2; });"), "2,4,6");
        assert_eq!(
            run("return [1, 2, 3, 4].filter(function(x, i) { return i % 2 == 0; });"),
            "1,3"
        );
        assert_eq!(
            run("var s = 0; [1, 2, 3].forEach(function(x) { s += x; }); return s;"),
            "6"
        );
        assert_eq!(run("return [3, 4][1];"), "4");
    }

    #[test]
    fn strings() {
        assert_eq!(run("return 'héllo'.length;"), "5");
        assert_eq!(run("return 'abc'[1];"), "b");
        assert_eq!(run("return 'a-b'.split('-').join('+').toUpperCase();"), "A+B");
        assert_eq!(run("return (1.005).toFixed(1);"), "1.0");
        assert_eq!(run("return Math.max(1, 5, 3);"), "5");
    }

    #[test]
    fn context_fields_are_names() {
        let context = Data::from_json(&json!({ "name": "world", "n": 1 }));
        let result = run_with("n = n + 1; return name + n;", context.clone()).unwrap();
        assert_eq!(result.to_string(), "world2");
        // assignment wrote through to the data
        if let Data::Object(fields) = context {
            assert_eq!(fields.borrow()["n"].to_string(), "2");
        }
    }

    #[test]
    fn undeclared_assignment_is_global() {
        assert_eq!(run("function f() { g = 5; } f(); return g;"), "5");
    }

    #[test]
    fn reference_errors() {
        let trace = fails("return missing;");
        assert_eq!(trace.kind(), Kind::Reference);
        assert_eq!(trace.message(), "missing is not defined");
    }

    #[test]
    fn type_errors() {
        let trace = fails("var o = null; return o.name;");
        assert_eq!(trace.kind(), Kind::Type);
        assert_eq!(trace.message(), "Cannot read properties of null (reading 'name')");

        let trace = fails("var o = {}; o.f();");
        assert_eq!(trace.message(), "o.f is not a function");

        let trace = fails("const c = 1; c = 2;");
        assert_eq!(trace.message(), "Assignment to constant variable.");

        let trace = fails("for (var x of 5) {}");
        assert_eq!(trace.message(), "5 is not iterable");
    }

    #[test]
    fn errors_trace_through_calls() {
        let trace = fails("function f(x) { return x.name; }\nf(null);");
        assert_eq!(trace.spans().len(), 2);
        assert_eq!(trace.spans()[0].contents(), "x.name");
        assert_eq!(trace.spans()[1].contents(), "f(null)");
    }

    #[test]
    fn thrown_values() {
        let trace = fails("throw { message: 'bad input' };");
        assert_eq!(trace.kind(), Kind::Thrown);
        assert_eq!(trace.message(), "bad input");
        assert_eq!(fails("throw 'plain';").message(), "plain");
    }

    #[test]
    fn call_depth_is_limited() {
        let trace = fails("function f() { return f(); } f();");
        assert_eq!(trace.kind(), Kind::Range);
        assert_eq!(trace.message(), "Maximum call stack size exceeded");
    }

    #[test]
    fn stack_budget_is_limited() {
        let source = Source::generated("function f(n) { return n == 0 ? 0 : f(n - 1); } return f(10);");
        let program = Reader::read(Lexer::lex(source).unwrap(), 64).unwrap();
        let config = Config {
            max_stack: 0,
            ..Config::default()
        };
        let trace = VM::init(Data::Undefined, &config).run(&program).unwrap_err();
        assert_eq!(trace.kind(), Kind::Range);

        let result = VM::init(Data::Undefined, &Config::default()).run(&program);
        assert_eq!(result.unwrap().to_string(), "0");
    }

    #[test]
    fn native_errors_point_at_the_call() {
        let trace = fails("var n = 1; n.toFixed(200);");
        assert_eq!(trace.kind(), Kind::Type);
        assert_eq!(trace.spans()[0].contents(), "n.toFixed(200)");
    }
}
