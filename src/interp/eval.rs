use std::sync::Arc;

use super::ast::{AssignTarget, BinOp, Expr, Location, Program, Stmt, UnOp};
use super::env::Environment;
use super::value::{EzFn, Value};
use super::EvalError;
use crate::debugger::hook::EvalHook;

/// Hard cap on EZ call nesting; recursion past this raises a runtime error
/// instead of exhausting the native stack.
const MAX_CALL_DEPTH: usize = 256;

/// Destination for `print` output. The console routes it to the terminal,
/// the JSON server turns it into `output` events.
pub type OutputFn = Box<dyn FnMut(&str) + Send>;

/// Tree-walking evaluator.
///
/// Every function call produces exactly one `on_enter_call`/`on_leave_call`
/// pair, including on error exits, and no frame is ever elided, so step-out
/// semantics in the debugger are exact.
pub struct Interpreter {
    hook: Arc<dyn EvalHook>,
    output: OutputFn,
    call_depth: usize,
}

enum Flow {
    Normal,
    Return(Value),
    Break(Location),
    Continue(Location),
}

impl Interpreter {
    pub fn new(hook: Arc<dyn EvalHook>, output: OutputFn) -> Self {
        Self {
            hook,
            output,
            call_depth: 0,
        }
    }

    /// Execute a program to completion. The program root runs inside its own
    /// call frame, so the root is frame depth 1.
    pub fn run(&mut self, program: &Program) -> Result<(), EvalError> {
        let globals = Environment::global();

        // Hoist top-level functions so calls may precede their declaration.
        for stmt in program.body.iter() {
            if let Stmt::FnDecl(decl) = stmt {
                globals.define(
                    &decl.name,
                    Value::Fn(Arc::new(EzFn {
                        name: decl.name.clone(),
                        params: decl.params.clone(),
                        body: decl.body.clone(),
                        env: globals.clone(),
                        loc: decl.loc.clone(),
                    })),
                );
            }
        }

        let entry = entry_location(&program.body)
            .unwrap_or_else(|| Location::new(program.file.clone(), 1, 1));
        self.hook
            .on_enter_call("<program>", &program.body, &globals, &entry)
            .map_err(|_| EvalError::Interrupted)?;
        self.call_depth += 1;

        let result = self.exec_stmts(&program.body, &globals);

        self.call_depth -= 1;
        let leave = self.hook.on_leave_call();
        let flow = result?;
        leave.map_err(|_| EvalError::Interrupted)?;

        match flow {
            Flow::Break(loc) => Err(EvalError::StrayLoopControl {
                keyword: "break",
                loc,
            }),
            Flow::Continue(loc) => Err(EvalError::StrayLoopControl {
                keyword: "continue",
                loc,
            }),
            _ => Ok(()),
        }
    }

    /// Run a statement list in the given environment, without opening a new
    /// scope. Callers open scopes where the language demands them.
    fn exec_stmts(&mut self, stmts: &[Stmt], env: &Environment) -> Result<Flow, EvalError> {
        for stmt in stmts {
            match self.exec_stmt(stmt, env)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&mut self, stmt: &Stmt, env: &Environment) -> Result<Flow, EvalError> {
        if stmt.is_steppable() {
            self.hook
                .before_eval(stmt, env)
                .map_err(|_| EvalError::Interrupted)?;
        }

        match stmt {
            Stmt::VarDecl { name, value, .. } => {
                let value = self.eval_expr(value, env)?;
                env.define(name, value);
                Ok(Flow::Normal)
            }
            Stmt::Assign { target, value, loc } => {
                let value = self.eval_expr(value, env)?;
                match target {
                    AssignTarget::Name(name) => {
                        if !env.assign(name, value) {
                            return Err(EvalError::Undefined {
                                name: name.clone(),
                                loc: loc.clone(),
                            });
                        }
                    }
                    AssignTarget::Index { target, index } => {
                        self.assign_index(target, index, value, env)?;
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::Expr { expr, .. } => {
                self.eval_expr(expr, env)?;
                Ok(Flow::Normal)
            }
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.eval_expr(expr, env)?,
                    None => Value::Nil,
                };
                Ok(Flow::Return(value))
            }
            Stmt::If {
                cond,
                then_body,
                else_body,
                ..
            } => {
                let cond = self.eval_expr(cond, env)?;
                if cond.is_truthy() {
                    self.exec_stmts(then_body, &env.child())
                } else if let Some(else_body) = else_body {
                    self.exec_stmts(else_body, &env.child())
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::While { cond, body, .. } => {
                loop {
                    let cond = self.eval_expr(cond, env)?;
                    if !cond.is_truthy() {
                        break;
                    }
                    match self.exec_stmts(body, &env.child())? {
                        Flow::Normal | Flow::Continue(_) => {}
                        Flow::Break(_) => break,
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::For {
                var,
                from,
                to,
                body,
                loc,
            } => {
                let from = self.expect_int(from, env, loc)?;
                let to = self.expect_int(to, env, loc)?;
                for i in from..to {
                    let scope = env.child();
                    scope.define(var, Value::Int(i));
                    match self.exec_stmts(body, &scope)? {
                        Flow::Normal | Flow::Continue(_) => {}
                        Flow::Break(_) => break,
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::Loop { body, .. } => {
                loop {
                    match self.exec_stmts(body, &env.child())? {
                        Flow::Normal | Flow::Continue(_) => {}
                        Flow::Break(_) => break,
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::Break { loc } => Ok(Flow::Break(loc.clone())),
            Stmt::Continue { loc } => Ok(Flow::Continue(loc.clone())),
            Stmt::FnDecl(decl) => {
                env.define(
                    &decl.name,
                    Value::Fn(Arc::new(EzFn {
                        name: decl.name.clone(),
                        params: decl.params.clone(),
                        body: decl.body.clone(),
                        env: env.clone(),
                        loc: decl.loc.clone(),
                    })),
                );
                Ok(Flow::Normal)
            }
        }
    }

    fn assign_index(
        &mut self,
        target: &Expr,
        index: &Expr,
        value: Value,
        env: &Environment,
    ) -> Result<(), EvalError> {
        let loc = target.loc().clone();
        let list = self.eval_expr(target, env)?;
        let index = self.eval_expr(index, env)?;
        let Value::List(items) = list else {
            return Err(EvalError::TypeMismatch {
                message: format!("cannot index a value of type `{}`", list.type_tag()),
                loc,
            });
        };
        let Value::Int(i) = index else {
            return Err(EvalError::TypeMismatch {
                message: format!("list index must be `int`, got `{}`", index.type_tag()),
                loc,
            });
        };
        let mut items = items.write().expect("list lock poisoned");
        let len = items.len();
        let slot = usize::try_from(i)
            .ok()
            .and_then(|i| items.get_mut(i))
            .ok_or(EvalError::IndexOutOfBounds { index: i, len, loc })?;
        *slot = value;
        Ok(())
    }

    fn expect_int(
        &mut self,
        expr: &Expr,
        env: &Environment,
        loc: &Location,
    ) -> Result<i64, EvalError> {
        match self.eval_expr(expr, env)? {
            Value::Int(v) => Ok(v),
            other => Err(EvalError::TypeMismatch {
                message: format!("range bound must be `int`, got `{}`", other.type_tag()),
                loc: loc.clone(),
            }),
        }
    }

    fn eval_expr(&mut self, expr: &Expr, env: &Environment) -> Result<Value, EvalError> {
        match expr {
            Expr::Nil(_) => Ok(Value::Nil),
            Expr::Bool(v, _) => Ok(Value::Bool(*v)),
            Expr::Int(v, _) => Ok(Value::Int(*v)),
            Expr::Float(v, _) => Ok(Value::Float(*v)),
            Expr::Str(v, _) => Ok(Value::Str(v.clone())),
            Expr::List(items, _) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval_expr(item, env)?);
                }
                Ok(Value::list(values))
            }
            Expr::Ident(name, loc) => env.get(name).ok_or_else(|| EvalError::Undefined {
                name: name.clone(),
                loc: loc.clone(),
            }),
            Expr::Unary { op, expr, loc } => {
                let value = self.eval_expr(expr, env)?;
                match (op, value) {
                    (UnOp::Neg, Value::Int(v)) => Ok(Value::Int(-v)),
                    (UnOp::Neg, Value::Float(v)) => Ok(Value::Float(-v)),
                    (UnOp::Not, value) => Ok(Value::Bool(!value.is_truthy())),
                    (UnOp::Neg, value) => Err(EvalError::TypeMismatch {
                        message: format!("cannot negate a value of type `{}`", value.type_tag()),
                        loc: loc.clone(),
                    }),
                }
            }
            Expr::Binary { op, lhs, rhs, loc } => self.eval_binary(*op, lhs, rhs, env, loc),
            Expr::Call { callee, args, loc } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval_expr(arg, env)?);
                }
                match callee.as_ref() {
                    // An unbound name in call position may be a builtin.
                    Expr::Ident(name, _) if env.get(name).is_none() => {
                        self.call_builtin(name, values, loc)
                    }
                    other => match self.eval_expr(other, env)? {
                        Value::Fn(func) => self.call_function(&func, values, loc),
                        value => Err(EvalError::NotCallable {
                            ty: value.type_tag(),
                            loc: loc.clone(),
                        }),
                    },
                }
            }
            Expr::Index { target, index, loc } => {
                let target = self.eval_expr(target, env)?;
                let index = self.eval_expr(index, env)?;
                let Value::List(items) = target else {
                    return Err(EvalError::TypeMismatch {
                        message: format!("cannot index a value of type `{}`", target.type_tag()),
                        loc: loc.clone(),
                    });
                };
                let Value::Int(i) = index else {
                    return Err(EvalError::TypeMismatch {
                        message: format!("list index must be `int`, got `{}`", index.type_tag()),
                        loc: loc.clone(),
                    });
                };
                let items = items.read().expect("list lock poisoned");
                usize::try_from(i)
                    .ok()
                    .and_then(|i| items.get(i).cloned())
                    .ok_or(EvalError::IndexOutOfBounds {
                        index: i,
                        len: items.len(),
                        loc: loc.clone(),
                    })
            }
        }
    }

    fn eval_binary(
        &mut self,
        op: BinOp,
        lhs: &Expr,
        rhs: &Expr,
        env: &Environment,
        loc: &Location,
    ) -> Result<Value, EvalError> {
        // Short-circuit operators evaluate to the deciding operand.
        if op == BinOp::And {
            let lhs = self.eval_expr(lhs, env)?;
            return if lhs.is_truthy() {
                self.eval_expr(rhs, env)
            } else {
                Ok(lhs)
            };
        }
        if op == BinOp::Or {
            let lhs = self.eval_expr(lhs, env)?;
            return if lhs.is_truthy() {
                Ok(lhs)
            } else {
                self.eval_expr(rhs, env)
            };
        }

        let lhs = self.eval_expr(lhs, env)?;
        let rhs = self.eval_expr(rhs, env)?;

        match op {
            BinOp::Eq => return Ok(Value::Bool(lhs == rhs)),
            BinOp::Ne => return Ok(Value::Bool(lhs != rhs)),
            _ => {}
        }

        if let (Value::Str(a), Value::Str(b)) = (&lhs, &rhs) {
            return match op {
                BinOp::Add => Ok(Value::Str(format!("{a}{b}"))),
                BinOp::Lt => Ok(Value::Bool(a < b)),
                BinOp::Le => Ok(Value::Bool(a <= b)),
                BinOp::Gt => Ok(Value::Bool(a > b)),
                BinOp::Ge => Ok(Value::Bool(a >= b)),
                _ => Err(self.binary_type_error(op, &lhs, &rhs, loc)),
            };
        }

        match (&lhs, &rhs) {
            (Value::Int(a), Value::Int(b)) => {
                let (a, b) = (*a, *b);
                match op {
                    BinOp::Add => Ok(Value::Int(a.wrapping_add(b))),
                    BinOp::Sub => Ok(Value::Int(a.wrapping_sub(b))),
                    BinOp::Mul => Ok(Value::Int(a.wrapping_mul(b))),
                    BinOp::Div => {
                        if b == 0 {
                            Err(EvalError::DivisionByZero { loc: loc.clone() })
                        } else {
                            Ok(Value::Int(a.wrapping_div(b)))
                        }
                    }
                    BinOp::Mod => {
                        if b == 0 {
                            Err(EvalError::DivisionByZero { loc: loc.clone() })
                        } else {
                            Ok(Value::Int(a.wrapping_rem(b)))
                        }
                    }
                    BinOp::Lt => Ok(Value::Bool(a < b)),
                    BinOp::Le => Ok(Value::Bool(a <= b)),
                    BinOp::Gt => Ok(Value::Bool(a > b)),
                    BinOp::Ge => Ok(Value::Bool(a >= b)),
                    _ => unreachable!("handled above"),
                }
            }
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                let a = as_f64(&lhs);
                let b = as_f64(&rhs);
                match op {
                    BinOp::Add => Ok(Value::Float(a + b)),
                    BinOp::Sub => Ok(Value::Float(a - b)),
                    BinOp::Mul => Ok(Value::Float(a * b)),
                    BinOp::Div => Ok(Value::Float(a / b)),
                    BinOp::Mod => Ok(Value::Float(a % b)),
                    BinOp::Lt => Ok(Value::Bool(a < b)),
                    BinOp::Le => Ok(Value::Bool(a <= b)),
                    BinOp::Gt => Ok(Value::Bool(a > b)),
                    BinOp::Ge => Ok(Value::Bool(a >= b)),
                    _ => unreachable!("handled above"),
                }
            }
            _ => Err(self.binary_type_error(op, &lhs, &rhs, loc)),
        }
    }

    fn binary_type_error(&self, op: BinOp, lhs: &Value, rhs: &Value, loc: &Location) -> EvalError {
        EvalError::TypeMismatch {
            message: format!(
                "`{op}` is not defined for `{}` and `{}`",
                lhs.type_tag(),
                rhs.type_tag()
            ),
            loc: loc.clone(),
        }
    }

    fn call_function(
        &mut self,
        func: &EzFn,
        args: Vec<Value>,
        call_loc: &Location,
    ) -> Result<Value, EvalError> {
        if args.len() != func.params.len() {
            return Err(EvalError::Arity {
                name: func.name.clone(),
                expected: func.params.len(),
                got: args.len(),
                loc: call_loc.clone(),
            });
        }
        if self.call_depth >= MAX_CALL_DEPTH {
            return Err(EvalError::CallDepth {
                loc: call_loc.clone(),
            });
        }

        let scope = func.env.child();
        for (param, value) in func.params.iter().zip(args) {
            scope.define(param, value);
        }

        let entry = entry_location(&func.body).unwrap_or_else(|| func.loc.clone());
        self.hook
            .on_enter_call(&func.name, &func.body, &scope, &entry)
            .map_err(|_| EvalError::Interrupted)?;
        self.call_depth += 1;

        let result = self.exec_stmts(&func.body, &scope);

        // The leave hook fires on every exit path, error or not.
        self.call_depth -= 1;
        let leave = self.hook.on_leave_call();
        let flow = result?;
        leave.map_err(|_| EvalError::Interrupted)?;

        match flow {
            Flow::Return(value) => Ok(value),
            Flow::Break(loc) => Err(EvalError::StrayLoopControl {
                keyword: "break",
                loc,
            }),
            Flow::Continue(loc) => Err(EvalError::StrayLoopControl {
                keyword: "continue",
                loc,
            }),
            Flow::Normal => Ok(Value::Nil),
        }
    }

    fn call_builtin(
        &mut self,
        name: &str,
        args: Vec<Value>,
        loc: &Location,
    ) -> Result<Value, EvalError> {
        match name {
            "print" => {
                let text = args
                    .iter()
                    .map(Value::to_string)
                    .collect::<Vec<_>>()
                    .join(" ");
                (self.output)(&text);
                Ok(Value::Nil)
            }
            "len" => {
                let [value] = &args[..] else {
                    return Err(EvalError::Arity {
                        name: name.to_string(),
                        expected: 1,
                        got: args.len(),
                        loc: loc.clone(),
                    });
                };
                match value {
                    Value::Str(s) => Ok(Value::Int(s.chars().count() as i64)),
                    Value::List(items) => {
                        Ok(Value::Int(items.read().expect("list lock poisoned").len() as i64))
                    }
                    other => Err(EvalError::TypeMismatch {
                        message: format!("`len` is not defined for `{}`", other.type_tag()),
                        loc: loc.clone(),
                    }),
                }
            }
            "push" => {
                let mut args = args;
                if args.len() != 2 {
                    return Err(EvalError::Arity {
                        name: name.to_string(),
                        expected: 2,
                        got: args.len(),
                        loc: loc.clone(),
                    });
                }
                let value = args.pop().expect("checked length");
                let list = args.pop().expect("checked length");
                let Value::List(items) = list else {
                    return Err(EvalError::TypeMismatch {
                        message: format!("`push` expects a list, got `{}`", list.type_tag()),
                        loc: loc.clone(),
                    });
                };
                items.write().expect("list lock poisoned").push(value);
                Ok(Value::Nil)
            }
            _ => Err(EvalError::Undefined {
                name: name.to_string(),
                loc: loc.clone(),
            }),
        }
    }
}

fn as_f64(value: &Value) -> f64 {
    match value {
        Value::Int(v) => *v as f64,
        Value::Float(v) => *v,
        _ => unreachable!("numeric operands checked by caller"),
    }
}

/// Location of the first steppable statement of a body.
fn entry_location(body: &[Stmt]) -> Option<Location> {
    body.iter()
        .find(|stmt| stmt.is_steppable())
        .map(|stmt| stmt.loc().clone())
}
