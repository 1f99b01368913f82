//! Scope resolution between parsing and execution.
//!
//! One walk over the tree mirrors the block structure the interpreter will
//! build at run time.  For every local read or write it records in the
//! interpreter how many scopes separate the use from its declaration; names
//! found in no enclosing scope are left for a global lookup.  Misuse of
//! `return`, `this` and `super` and local redeclarations are reported along
//! the way without stopping the walk.

use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

use crate::error::{LoxError, Reporter};
use crate::expr::{Expr, ExprId};
use crate::interpreter::Interpreter;
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::Token;
use log::{debug, info};

/// What kind of function body are we inside?  Used to validate `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Method,
    Initializer,
}

/// What kind of class body are we inside?  Used to validate `this`/`super`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
    Subclass,
}

/// Records binding distances by calling back into the interpreter.
pub struct Resolver<'i, W: Write> {
    interpreter: &'i mut Interpreter<W>,
    scopes: Vec<HashMap<String, bool>>, // false=declared, true=defined
    current_function: FunctionType,
    current_class: ClassType,
    errors: usize,
}

impl<'i, W: Write> Resolver<'i, W> {
    pub fn new(interpreter: &'i mut Interpreter<W>) -> Self {
        info!("Resolver instantiated");

        Resolver {
            interpreter,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
            errors: 0,
        }
    }

    /// Walk all top‑level statements, reporting every static error.  Returns
    /// the number of errors found.
    pub fn resolve(&mut self, statements: &[Stmt], reporter: &mut dyn Reporter) -> usize {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        self.resolve_stmts(statements, reporter);

        self.errors
    }

    fn error(&mut self, token: &Token, message: &str, reporter: &mut dyn Reporter) {
        self.errors += 1;
        reporter.report(&LoxError::resolve(token, message));
    }

    fn resolve_stmts(&mut self, statements: &[Stmt], reporter: &mut dyn Reporter) {
        for stmt in statements {
            self.resolve_stmt(stmt, reporter);
        }
    }

    fn resolve_stmt(&mut self, stmt: &Stmt, reporter: &mut dyn Reporter) {
        match stmt {
            Stmt::Block(statements) => {
                self.begin_scope();
                self.resolve_stmts(statements, reporter);
                self.end_scope();
            }

            Stmt::Var { name, initializer } => {
                // declare → resolve initializer → define
                self.declare(name);
                if let Some(expr) = initializer {
                    self.resolve_expr(expr, reporter);
                }
                self.define(name);
            }

            Stmt::Function(declaration) => {
                // The name is visible inside its own body, so recursion works.
                self.declare(&declaration.name);
                self.define(&declaration.name);
                self.resolve_function(declaration, FunctionType::Function, reporter);
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.resolve_class(name, superclass.as_ref(), methods, reporter),

            Stmt::Expression(expr) | Stmt::Print(expr) => {
                self.resolve_expr(expr, reporter);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition, reporter);
                self.resolve_stmt(then_branch, reporter);
                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb, reporter);
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition, reporter);
                self.resolve_stmt(body, reporter);
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.error(keyword, "Can't return from top-level code.", reporter);
                }

                if let Some(expr) = value {
                    if self.current_function == FunctionType::Initializer {
                        self.error(
                            keyword,
                            "Can't return a value from an initializer.",
                            reporter,
                        );
                    }

                    self.resolve_expr(expr, reporter);
                }
            }
        }
    }

    fn resolve_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
        reporter: &mut dyn Reporter,
    ) {
        let enclosing_class: ClassType = self.current_class;
        self.current_class = ClassType::Class;

        self.declare(name);
        self.define(name);

        if let Some(superclass) = superclass {
            if let Expr::Variable {
                name: super_name, ..
            } = superclass
            {
                if super_name.lexeme == name.lexeme {
                    self.error(super_name, "A class can't inherit from itself.", reporter);
                }
            }

            self.current_class = ClassType::Subclass;
            self.resolve_expr(superclass, reporter);

            self.begin_scope();
            self.define_name("super");
        }

        self.begin_scope();
        self.define_name("this");

        for method in methods {
            let kind: FunctionType = if method.name.lexeme == "init" {
                FunctionType::Initializer
            } else {
                FunctionType::Method
            };

            self.resolve_function(method, kind, reporter);
        }

        self.end_scope();

        if superclass.is_some() {
            self.end_scope();
        }

        self.current_class = enclosing_class;
    }

    fn resolve_expr(&mut self, expr: &Expr, reporter: &mut dyn Reporter) {
        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => self.resolve_expr(inner, reporter),

            Expr::Unary { right, .. } => self.resolve_expr(right, reporter),

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left, reporter);
                self.resolve_expr(right, reporter);
            }

            Expr::Variable { id, name } => {
                let unready: bool = self
                    .scopes
                    .last()
                    .is_some_and(|scope| scope.get(&name.lexeme) == Some(&false));

                if unready {
                    self.error(
                        name,
                        "Can't read local variable in its own initializer.",
                        reporter,
                    );
                }

                self.resolve_local(*id, name);
            }

            Expr::Assign { id, name, value } => {
                // RHS first, then bind the target
                self.resolve_expr(value, reporter);
                self.resolve_local(*id, name);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee, reporter);
                for arg in arguments {
                    self.resolve_expr(arg, reporter);
                }
            }

            // Properties are looked up dynamically; only the object resolves.
            Expr::Get { object, .. } => self.resolve_expr(object, reporter),

            Expr::Set { object, value, .. } => {
                self.resolve_expr(value, reporter);
                self.resolve_expr(object, reporter);
            }

            Expr::This { id, keyword } => {
                if self.current_class == ClassType::None {
                    self.error(keyword, "Can't use 'this' outside of a class.", reporter);
                    return;
                }

                self.resolve_local(*id, keyword);
            }

            Expr::Super { id, keyword, .. } => {
                match self.current_class {
                    ClassType::None => {
                        self.error(keyword, "Can't use 'super' outside of a class.", reporter);
                    }
                    ClassType::Class => {
                        self.error(
                            keyword,
                            "Can't use 'super' in a class with no superclass.",
                            reporter,
                        );
                    }
                    ClassType::Subclass => {}
                }

                self.resolve_local(*id, keyword);
            }
        }
    }

    /// Parameters and body share one scope.
    fn resolve_function(
        &mut self,
        function: &FunctionDecl,
        kind: FunctionType,
        reporter: &mut dyn Reporter,
    ) {
        let enclosing: FunctionType = self.current_function;
        self.current_function = kind;

        self.begin_scope();
        for param in &function.params {
            self.declare(param);
            self.define(param);
        }
        self.resolve_stmts(&function.body, reporter);
        self.end_scope();

        self.current_function = enclosing;
    }

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token) {
        // Globals are dynamic and never tracked.
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), false);
        }
    }

    fn define(&mut self, name: &Token) {
        self.define_name(&name.lexeme);
    }

    fn define_name(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), true);
        }
    }

    /// Record this occurrence as a local at depth `d` (0 = innermost), or
    /// leave it unannotated when no scope declares the name.
    fn resolve_local(&mut self, id: ExprId, name: &Token) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                debug!("Resolved '{}' at depth {}", name.lexeme, depth);
                self.interpreter.resolve(id, depth);
                return;
            }
        }

        debug!("Resolved '{}' as global", name.lexeme);
    }
}
