use std::collections::HashMap;

use crate::ast::{ExprId, Stmt, StmtId, StmtKind, Type, TypeKind};
use crate::error::Diagnostic;
use crate::infer::{infer_expression_type, resolve_full_type};
use crate::intern::{Interner, Symbol};
use crate::parser::ParsedFile;

/// A `(name, type)` pair visible at some statement. The type is absent
/// when the binding had neither an annotation nor an inferable value.
#[derive(Debug, Clone)]
pub struct ScopedVariable {
    pub name: Symbol,
    pub ty: Option<Type>,
}

/// Top-level declarations in source order.
#[derive(Debug, Default)]
pub struct GlobalContext {
    pub fn_types: Vec<Type>,
    pub data_types: Vec<Type>,
}

impl GlobalContext {
    pub fn find_struct(&self, name: Symbol) -> Option<&Type> {
        self.data_types
            .iter()
            .find(|ty| matches!(ty.kind, TypeKind::Struct { .. }) && ty.name() == Some(name))
    }

    pub fn find_enum(&self, name: Symbol) -> Option<&Type> {
        self.data_types
            .iter()
            .find(|ty| matches!(ty.kind, TypeKind::Enum { .. }) && ty.name() == Some(name))
    }

    pub fn find_data_type(&self, name: Symbol) -> Option<&Type> {
        self.data_types.iter().find(|ty| ty.name() == Some(name))
    }

    pub fn find_fn(&self, name: Symbol) -> Option<&Type> {
        self.fn_types.iter().find(|ty| ty.name() == Some(name))
    }
}

/// Derived facts about the program, keyed by stable node ids. The
/// tables reference AST nodes by id and never own them.
#[derive(Debug, Default)]
pub struct Context {
    /// Variables visible at each statement's point.
    pub statement_scopes: HashMap<StmtId, Vec<ScopedVariable>>,
    /// Inferred type of each expression; `null` and `_` record nothing.
    pub expr_types: HashMap<ExprId, Type>,
}

impl Context {
    pub fn scope_of(&self, id: StmtId) -> &[ScopedVariable] {
        self.statement_scopes.get(&id).map_or(&[], |v| v.as_slice())
    }

    pub fn type_of(&self, id: ExprId) -> Option<&Type> {
        self.expr_types.get(&id)
    }
}

/// Build the global table and the per-statement scope / per-expression
/// type tables in one pre-order walk.
pub fn contextualise<'a>(
    file: &ParsedFile<'a>,
    interner: &Interner,
) -> Result<(GlobalContext, Context), Diagnostic> {
    let mut global = GlobalContext::default();
    for stmt in &file.statements {
        if let StmtKind::TypeDeclaration { ty, .. } = &stmt.kind {
            match ty.kind {
                TypeKind::Struct { .. } | TypeKind::Enum { .. } => {
                    global.data_types.push(ty.clone())
                }
                TypeKind::Function { .. } => global.fn_types.push(ty.clone()),
                TypeKind::Primitive(_) => {}
            }
        }
    }

    let mut context = Context::default();
    let builder = ContextBuilder {
        file,
        global: &global,
        interner,
    };
    let scoped: Vec<ScopedVariable> = Vec::new();
    for stmt in &file.statements {
        builder.statement(stmt, &scoped, &mut context)?;
    }
    Ok((global, context))
}

struct ContextBuilder<'b, 'a> {
    file: &'b ParsedFile<'a>,
    global: &'b GlobalContext,
    interner: &'b Interner,
}

impl<'b, 'a> ContextBuilder<'b, 'a> {
    fn diagnostic(&self, stmt: &Stmt<'_>, message: String) -> Diagnostic {
        Diagnostic::new(self.file.position_of(stmt.id), message)
    }

    fn infer(
        &self,
        stmt: &Stmt<'_>,
        expr: &crate::ast::Expr<'_>,
        scoped: &[ScopedVariable],
        context: &mut Context,
    ) -> Result<Option<Type>, Diagnostic> {
        infer_expression_type(
            expr,
            self.global,
            scoped,
            self.interner,
            &mut context.expr_types,
        )
        .map_err(|message| self.diagnostic(stmt, message))
    }

    fn statement(
        &self,
        stmt: &Stmt<'_>,
        scoped: &[ScopedVariable],
        context: &mut Context,
    ) -> Result<(), Diagnostic> {
        context.statement_scopes.insert(stmt.id, scoped.to_vec());

        match &stmt.kind {
            StmtKind::Binding { value, .. } => {
                self.infer(stmt, value, scoped, context)?;
                Ok(())
            }
            StmtKind::Return(value) | StmtKind::Action(value) => {
                self.infer(stmt, value, scoped, context)?;
                Ok(())
            }
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.infer(stmt, condition, scoped, context)?;
                // Each branch works on its own copy of the scope.
                self.statement(then_branch, scoped, context)?;
                if let Some(else_branch) = else_branch {
                    self.statement(else_branch, scoped, context)?;
                }
                Ok(())
            }
            StmtKind::While { condition, body } => {
                self.infer(stmt, condition, scoped, context)?;
                self.statement(body, scoped, context)
            }
            StmtKind::Block(statements) => {
                let mut inner = scoped.to_vec();
                self.block_children(statements, &mut inner, context)
            }
            StmtKind::Switch { scrutinee, cases } => {
                self.infer(stmt, scrutinee, scoped, context)?;
                for case in cases {
                    self.statement(case.body, scoped, context)?;
                }
                Ok(())
            }
            StmtKind::TypeDeclaration { ty, body } => {
                let (params, body) = match (&ty.kind, body) {
                    (TypeKind::Function { params, .. }, Some(body)) => (params, body),
                    _ => return Ok(()),
                };

                let mut fn_scope = scoped.to_vec();
                for param in params {
                    let resolved = resolve_full_type(&param.ty, self.global, self.interner)
                        .map_err(|message| self.diagnostic(stmt, message))?;
                    fn_scope.push(ScopedVariable {
                        name: param.name,
                        ty: Some(resolved),
                    });
                }
                context
                    .statement_scopes
                    .insert(stmt.id, fn_scope.clone());

                if let StmtKind::Block(statements) = &body.kind {
                    context.statement_scopes.insert(body.id, fn_scope.clone());
                    self.block_children(statements, &mut fn_scope, context)
                } else {
                    self.statement(body, &fn_scope, context)
                }
            }
            StmtKind::Break | StmtKind::Include { .. } | StmtKind::CBlock(_) => Ok(()),
        }
    }

    /// Walk the statements of one block. A binding becomes visible to
    /// the siblings after it, never to the ones before.
    fn block_children(
        &self,
        statements: &[&Stmt<'_>],
        scoped: &mut Vec<ScopedVariable>,
        context: &mut Context,
    ) -> Result<(), Diagnostic> {
        for stmt in statements {
            self.statement(stmt, scoped, context)?;
            if let StmtKind::Binding {
                name,
                annotation,
                value,
            } = &stmt.kind
            {
                let ty = match context.expr_types.get(&value.id) {
                    Some(inferred) => Some(inferred.clone()),
                    None => match annotation {
                        Some(annotation) => {
                            Some(resolve_full_type(annotation, self.global, self.interner)
                                .map_err(|message| self.diagnostic(stmt, message))?)
                        }
                        None => None,
                    },
                };
                scoped.push(ScopedVariable { name: *name, ty });
            }
        }
        Ok(())
    }
}
