//! Tree‑walking evaluator.
//!
//! Each `Interpreter` owns its own global scope, so independent program runs
//! never share state.  Statements run for effect and report control transfer
//! through [`Flow`]; genuine failures travel separately as
//! [`LoxError::Runtime`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use log::{debug, info};

use crate::environment::{self, EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::expr::{Expr, ExprId, LiteralValue};
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::{Token, TokenType};
use crate::value::{Class, Function, Instance, Value};

/// How a statement finished.
#[derive(Debug)]
pub enum Flow {
    Normal,
    /// A `return` unwinding towards the nearest call boundary.
    Return(Value),
}

pub struct Interpreter<W: Write = io::Stdout> {
    globals: EnvRef,
    environment: EnvRef,
    /// Scope distances recorded by the resolver, keyed by node identity.
    locals: HashMap<ExprId, usize>,
    /// Lox calls currently on the stack.
    depth: usize,
    out: W,
}

/// Deepest Lox call chain allowed before the host stack is at risk.
pub const MAX_CALL_DEPTH: usize = 255;

impl Interpreter<io::Stdout> {
    /// Interpreter printing to standard output.
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl Default for Interpreter<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Interpreter<W> {
    /// Creates an Interpreter writing `print` output to `out` and defines
    /// native functions such as `clock`.
    pub fn with_output(out: W) -> Self {
        info!("Initializing Interpreter");

        let globals: EnvRef = Rc::new(RefCell::new(Environment::new()));

        debug!("Defining native function 'clock'");

        globals.borrow_mut().define(
            "clock",
            Value::NativeFunction {
                name: "clock",
                arity: 0,
                func: |_args: &[Value]| {
                    let millis: i64 = chrono::Utc::now().timestamp_millis();
                    Ok(Value::Number(millis as f64 / 1000.0))
                },
            },
        );

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            depth: 0,
            out,
        }
    }

    pub fn output_mut(&mut self) -> &mut W {
        &mut self.out
    }

    /// Record that the node `id` refers to a binding `depth` scopes out.
    pub fn resolve(&mut self, id: ExprId, depth: usize) {
        debug!("Recording {:?} at depth {}", id, depth);
        self.locals.insert(id, depth);
    }

    /// Interprets a list of statements (a "program").  The first runtime
    /// error stops the run and is returned.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            self.execute(stmt)?;
        }

        info!("Interpretation completed successfully");
        Ok(())
    }

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;
                debug!("Printing value: {}", value);
                writeln!(self.out, "{}", value)?;
                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Defining variable '{}' = {}", name.lexeme, value);
                self.environment.borrow_mut().define(&name.lexeme, value);
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let scope: Environment = Environment::with_enclosing(Rc::clone(&self.environment));
                self.execute_block(statements, Rc::new(RefCell::new(scope)))
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_stmt) = else_branch {
                    self.execute(else_stmt)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let Flow::Return(value) = self.execute(body)? {
                        return Ok(Flow::Return(value));
                    }
                }

                Ok(Flow::Normal)
            }

            Stmt::Function(declaration) => {
                debug!("Defining function '{}'", declaration.name.lexeme);

                let function: Function =
                    Function::new(Rc::clone(declaration), Rc::clone(&self.environment), false);

                self.environment
                    .borrow_mut()
                    .define(&declaration.name.lexeme, Value::Function(Rc::new(function)));
                Ok(Flow::Normal)
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.execute_class(name, superclass.as_ref(), methods),

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Returning value: {}", value);
                Ok(Flow::Return(value))
            }
        }
    }

    /// Run `statements` inside `scope`, restoring the previous scope on every
    /// exit path.
    pub fn execute_block(&mut self, statements: &[Stmt], scope: EnvRef) -> Result<Flow> {
        let previous: EnvRef = std::mem::replace(&mut self.environment, scope);

        let result: Result<Flow> = self.execute_all(statements);

        self.environment = previous;
        result
    }

    fn execute_all(&mut self, statements: &[Stmt]) -> Result<Flow> {
        for stmt in statements {
            if let Flow::Return(value) = self.execute(stmt)? {
                return Ok(Flow::Return(value));
            }
        }

        Ok(Flow::Normal)
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
    ) -> Result<Flow> {
        debug!("Defining class '{}'", name.lexeme);

        let superclass: Option<Rc<Class>> = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(class) => Some(class),
                _ => {
                    let token: &Token = match expr {
                        Expr::Variable { name, .. } => name,
                        _ => name,
                    };
                    return Err(LoxError::runtime(token, "Superclass must be a class."));
                }
            },
            None => None,
        };

        self.environment
            .borrow_mut()
            .define(&name.lexeme, Value::Nil);

        // Methods of a subclass close over a scope holding `super`.
        let method_scope: EnvRef = match &superclass {
            Some(class) => {
                let mut scope: Environment = Environment::with_enclosing(Rc::clone(&self.environment));
                scope.define("super", Value::Class(Rc::clone(class)));
                Rc::new(RefCell::new(scope))
            }
            None => Rc::clone(&self.environment),
        };

        let methods: HashMap<String, Rc<Function>> = methods
            .iter()
            .map(|method| {
                let is_initializer: bool = method.name.lexeme == "init";
                let function: Function =
                    Function::new(Rc::clone(method), Rc::clone(&method_scope), is_initializer);
                (method.name.lexeme.clone(), Rc::new(function))
            })
            .collect();

        let class: Class = Class {
            name: name.lexeme.clone(),
            superclass,
            methods,
        };

        self.environment
            .borrow_mut()
            .define(&name.lexeme, Value::Class(Rc::new(class)));

        Ok(Flow::Normal)
    }

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left_val: Value = self.evaluate(left)?;

                if operator.token_type == TokenType::OR {
                    if left_val.is_truthy() {
                        return Ok(left_val);
                    }
                } else if !left_val.is_truthy() {
                    return Ok(left_val);
                }

                self.evaluate(right)
            }

            Expr::Variable { id, name } => self.look_up_variable(name, *id),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;

                let assigned: bool = match self.locals.get(id) {
                    Some(&distance) => {
                        environment::assign_at(&self.environment, distance, &name.lexeme, value.clone())
                    }
                    None => {
                        let mut globals = self.globals.borrow_mut();

                        if globals.get_here(&name.lexeme).is_some() {
                            globals.define(&name.lexeme, value.clone());
                            true
                        } else {
                            false
                        }
                    }
                };

                if !assigned {
                    return Err(undefined_variable(name));
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee_val: Value = self.evaluate(callee)?;

                let mut arg_values: Vec<Value> = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    arg_values.push(self.evaluate(arg)?);
                }

                self.call(callee_val, paren, arg_values)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => self.get_property(&instance, name),
                _ => Err(LoxError::runtime(name, "Only instances have properties.")),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(LoxError::runtime(name, "Only instances have fields."));
                };

                let value: Value = self.evaluate(value)?;

                instance
                    .borrow_mut()
                    .fields
                    .insert(name.lexeme.clone(), value.clone());

                Ok(value)
            }

            Expr::This { id, keyword } => self.look_up_variable(keyword, *id),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),
        }
    }

    fn evaluate_unary(&mut self, op: &Token, right: &Expr) -> Result<Value> {
        let right_val: Value = self.evaluate(right)?;

        match op.token_type {
            TokenType::MINUS => match right_val {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(LoxError::runtime(op, "Operand must be a number.")),
            },
            TokenType::BANG => Ok(Value::Bool(!right_val.is_truthy())),
            _ => Err(LoxError::runtime(op, "Invalid unary operator.")),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, op: &Token, right: &Expr) -> Result<Value> {
        let left_val: Value = self.evaluate(left)?;
        let right_val: Value = self.evaluate(right)?;

        debug!("Binary {} on {} and {}", op.lexeme, left_val, right_val);

        match op.token_type {
            TokenType::PLUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
                _ => Err(LoxError::runtime(
                    op,
                    "Operands must be two numbers or two strings.",
                )),
            },
            TokenType::MINUS => numbers(op, &left_val, &right_val).map(|(a, b)| Value::Number(a - b)),
            TokenType::STAR => numbers(op, &left_val, &right_val).map(|(a, b)| Value::Number(a * b)),
            TokenType::SLASH => numbers(op, &left_val, &right_val).map(|(a, b)| Value::Number(a / b)),
            TokenType::GREATER => numbers(op, &left_val, &right_val).map(|(a, b)| Value::Bool(a > b)),
            TokenType::GREATER_EQUAL => {
                numbers(op, &left_val, &right_val).map(|(a, b)| Value::Bool(a >= b))
            }
            TokenType::LESS => numbers(op, &left_val, &right_val).map(|(a, b)| Value::Bool(a < b)),
            TokenType::LESS_EQUAL => {
                numbers(op, &left_val, &right_val).map(|(a, b)| Value::Bool(a <= b))
            }
            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left_val.is_equal(&right_val))),
            TokenType::BANG_EQUAL => Ok(Value::Bool(!left_val.is_equal(&right_val))),
            _ => Err(LoxError::runtime(op, "Invalid binary operator.")),
        }
    }

    fn look_up_variable(&self, name: &Token, id: ExprId) -> Result<Value> {
        let value: Option<Value> = match self.locals.get(&id) {
            Some(&distance) => environment::get_at(&self.environment, distance, &name.lexeme),
            None => self.globals.borrow().get_here(&name.lexeme),
        };

        value.ok_or_else(|| undefined_variable(name))
    }

    fn get_property(&self, instance: &Rc<RefCell<Instance>>, name: &Token) -> Result<Value> {
        let class: Rc<Class> = {
            let borrowed = instance.borrow();

            if let Some(value) = borrowed.fields.get(&name.lexeme) {
                return Ok(value.clone());
            }

            Rc::clone(&borrowed.class)
        };

        match class.find_method(&name.lexeme) {
            Some(method) => Ok(Value::Function(Rc::new(method.bind(Rc::clone(instance))))),
            None => Err(LoxError::runtime(
                name,
                format!("Undefined property '{}'.", name.lexeme),
            )),
        }
    }

    fn evaluate_super(&mut self, id: ExprId, keyword: &Token, method: &Token) -> Result<Value> {
        let distance: usize = *self
            .locals
            .get(&id)
            .ok_or_else(|| LoxError::runtime(keyword, "Can't use 'super' outside of a class."))?;

        let superclass: Option<Value> = environment::get_at(&self.environment, distance, "super");
        let object: Option<Value> = distance
            .checked_sub(1)
            .and_then(|d| environment::get_at(&self.environment, d, "this"));

        let (Some(Value::Class(superclass)), Some(Value::Instance(instance))) = (superclass, object)
        else {
            return Err(LoxError::runtime(keyword, "Can't use 'super' outside of a class."));
        };

        match superclass.find_method(&method.lexeme) {
            Some(found) => Ok(Value::Function(Rc::new(found.bind(instance)))),
            None => Err(LoxError::runtime(
                method,
                format!("Undefined property '{}'.", method.lexeme),
            )),
        }
    }

    /// Invokes a callable (native function, user function, or class).
    fn call(&mut self, callee: Value, paren: &Token, arguments: Vec<Value>) -> Result<Value> {
        match callee {
            Value::NativeFunction { name, arity, func } => {
                debug!("Calling native function '{}'", name);
                check_arity(paren, arity, arguments.len())?;
                func(&arguments).map_err(|msg| LoxError::runtime(paren, msg))
            }

            Value::Function(function) => {
                check_arity(paren, function.arity(), arguments.len())?;
                self.call_function(&function, paren, arguments)
            }

            Value::Class(class) => {
                check_arity(paren, class.arity(), arguments.len())?;

                let instance: Rc<RefCell<Instance>> =
                    Rc::new(RefCell::new(Instance::new(Rc::clone(&class))));

                if let Some(init) = class.find_method("init") {
                    self.call_function(&init.bind(Rc::clone(&instance)), paren, arguments)?;
                }

                Ok(Value::Instance(instance))
            }

            _ => Err(LoxError::runtime(
                paren,
                "Can only call functions and classes.",
            )),
        }
    }

    fn call_function(
        &mut self,
        function: &Function,
        paren: &Token,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        debug!("Calling function '{}'", function.declaration.name.lexeme);

        if self.depth >= MAX_CALL_DEPTH {
            return Err(LoxError::runtime(paren, "Stack overflow."));
        }

        let mut scope: Environment = Environment::with_enclosing(Rc::clone(&function.closure));

        for (param, value) in function.declaration.params.iter().zip(arguments) {
            scope.define(&param.lexeme, value);
        }

        self.depth += 1;
        let result: Result<Flow> =
            self.execute_block(&function.declaration.body, Rc::new(RefCell::new(scope)));
        self.depth -= 1;

        let flow: Flow = result?;

        if function.is_initializer {
            return Ok(environment::get_at(&function.closure, 0, "this").unwrap_or(Value::Nil));
        }

        Ok(match flow {
            Flow::Return(value) => value,
            Flow::Normal => Value::Nil,
        })
    }
}

fn numbers(op: &Token, left: &Value, right: &Value) -> Result<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(LoxError::runtime(op, "Operands must be numbers.")),
    }
}

fn check_arity(paren: &Token, expected: usize, got: usize) -> Result<()> {
    if expected != got {
        return Err(LoxError::runtime(
            paren,
            format!("Expected {} arguments but got {}.", expected, got),
        ));
    }

    Ok(())
}

fn undefined_variable(name: &Token) -> LoxError {
    LoxError::runtime(name, format!("Undefined variable '{}'.", name.lexeme))
}
