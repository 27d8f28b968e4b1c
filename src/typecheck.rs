use crate::ast::{
    ArraySize, Expr, ExprKind, Literal, Primitive, Stmt, StmtKind, Type, TypeKind, TypeModifier,
};
use crate::context::{Context, GlobalContext};
use crate::error::Diagnostic;
use crate::intern::Interner;
use crate::parser::ParsedFile;

/// Structural type equality: same kind, equal modifier lists, then a
/// kind-specific rule. Primitives compare by value, structs and enums
/// by name, functions by parameter and return types.
pub fn type_eq(l: &Type, r: &Type) -> bool {
    if l.modifiers.len() != r.modifiers.len() {
        return false;
    }
    for (lm, rm) in l.modifiers.iter().zip(r.modifiers.iter()) {
        if !modifier_eq(lm, rm) {
            return false;
        }
    }

    match (&l.kind, &r.kind) {
        (TypeKind::Primitive(lp), TypeKind::Primitive(rp)) => lp == rp,
        (TypeKind::Struct { name: ln, .. }, TypeKind::Struct { name: rn, .. }) => ln == rn,
        (TypeKind::Enum { name: ln, .. }, TypeKind::Enum { name: rn, .. }) => ln == rn,
        (
            TypeKind::Function {
                params: lp,
                return_type: lr,
                ..
            },
            TypeKind::Function {
                params: rp,
                return_type: rr,
                ..
            },
        ) => {
            lp.len() == rp.len()
                && type_eq(lr, rr)
                && lp.iter().zip(rp.iter()).all(|(l, r)| type_eq(&l.ty, &r.ty))
        }
        _ => false,
    }
}

fn modifier_eq(l: &TypeModifier, r: &TypeModifier) -> bool {
    match (l, r) {
        (TypeModifier::Array(ls), TypeModifier::Array(rs)) => match (ls, rs) {
            // Two literal sizes must agree; reference and unsized
            // arrays compare equal to any array of the same shape.
            (ArraySize::Literal(ln), ArraySize::Literal(rn)) => ln == rn,
            _ => true,
        },
        (TypeModifier::Pointer, TypeModifier::Pointer) => true,
        (TypeModifier::Nullable, TypeModifier::Nullable) => true,
        (TypeModifier::Mutable, TypeModifier::Mutable) => true,
        _ => false,
    }
}

fn is_boolean(ty: &Type) -> bool {
    matches!(ty.kind, TypeKind::Primitive(Primitive::Bool))
}

/// Human-readable type rendering for diagnostics, in source syntax.
pub fn show_type(ty: &Type, interner: &Interner) -> String {
    let mut out = String::new();
    for modifier in &ty.modifiers {
        match modifier {
            TypeModifier::Pointer => out.push('*'),
            TypeModifier::Nullable => out.push('?'),
            TypeModifier::Mutable => out.push_str("mut "),
            TypeModifier::Array(size) => {
                out.push('[');
                match size {
                    ArraySize::Literal(n) => out.push_str(&n.to_string()),
                    ArraySize::Reference(name) => out.push_str(interner.resolve(*name)),
                    ArraySize::Unsized => {}
                }
                out.push(']');
            }
        }
    }

    match &ty.kind {
        TypeKind::Primitive(primitive) => out.push_str(primitive.name()),
        TypeKind::Struct { name, .. } => {
            out.push_str("struct ");
            out.push_str(interner.resolve(*name));
        }
        TypeKind::Enum { name, .. } => {
            out.push_str("enum ");
            out.push_str(interner.resolve(*name));
        }
        TypeKind::Function {
            params,
            return_type,
            ..
        } => {
            out.push_str("fn(");
            for (i, param) in params.iter().enumerate() {
                out.push_str(&show_type(&param.ty, interner));
                if i + 1 < params.len() {
                    out.push_str(", ");
                }
            }
            out.push_str(") -> ");
            out.push_str(&show_type(return_type, interner));
        }
    }
    out
}

fn mismatch_message(expected: &Type, actual: &Type, interner: &Interner) -> String {
    format!(
        "mismatch types; expected `{}` but got `{}`.",
        show_type(expected, interner),
        show_type(actual, interner)
    )
}

/// Verify type equality at every site the inferencer constrained:
/// call arguments against declared parameters, `if`/`while` conditions
/// against `bool`, returns against the enclosing function's return
/// type, and annotated bindings against their inferred values.
pub fn type_check(
    file: &ParsedFile<'_>,
    global: &GlobalContext,
    context: &Context,
    interner: &Interner,
) -> Result<(), Diagnostic> {
    let checker = TypeChecker {
        file,
        global,
        context,
        interner,
    };

    for stmt in &file.statements {
        if let StmtKind::TypeDeclaration { ty, body: Some(body) } = &stmt.kind {
            if let TypeKind::Function { return_type, .. } = &ty.kind {
                checker.function(body, return_type)?;
            }
        }
    }
    Ok(())
}

struct TypeChecker<'b, 'a> {
    file: &'b ParsedFile<'a>,
    global: &'b GlobalContext,
    context: &'b Context,
    interner: &'b Interner,
}

impl<'b, 'a> TypeChecker<'b, 'a> {
    fn diagnostic(&self, stmt: &Stmt<'_>, message: String) -> Diagnostic {
        Diagnostic::new(self.file.position_of(stmt.id), message)
    }

    fn function(&self, body: &Stmt<'_>, return_type: &Type) -> Result<(), Diagnostic> {
        let mut returns = Vec::new();
        collect_return_statements(body, &mut returns);
        for ret in returns {
            let StmtKind::Return(value) = &ret.kind else {
                continue;
            };
            // `return null;` constrains nothing.
            if let Some(actual) = self.context.type_of(value.id) {
                if !type_eq(return_type, actual) {
                    return Err(self.diagnostic(
                        ret,
                        mismatch_message(return_type, actual, self.interner),
                    ));
                }
            }
        }

        self.statement(body)
    }

    fn statement(&self, stmt: &Stmt<'_>) -> Result<(), Diagnostic> {
        match &stmt.kind {
            StmtKind::Binding {
                name,
                annotation,
                value,
            } => {
                self.call_sites(stmt, value)?;
                let inferred = self.context.type_of(value.id);
                match (annotation, inferred) {
                    (Some(annotation), Some(inferred)) => {
                        if !type_eq(annotation, inferred) {
                            return Err(self.diagnostic(
                                stmt,
                                mismatch_message(annotation, inferred, self.interner),
                            ));
                        }
                        Ok(())
                    }
                    (None, None) => Err(self.diagnostic(
                        stmt,
                        format!(
                            "type annotations needed for `{}`.",
                            self.interner.resolve(*name)
                        ),
                    )),
                    _ => Ok(()),
                }
            }
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.call_sites(stmt, condition)?;
                self.condition(stmt, condition, "the condition of an if statement must be a boolean.")?;
                self.statement(then_branch)?;
                if let Some(else_branch) = else_branch {
                    self.statement(else_branch)?;
                }
                Ok(())
            }
            StmtKind::While { condition, body } => {
                self.call_sites(stmt, condition)?;
                self.condition(stmt, condition, "the condition of a while loop must be a boolean.")?;
                self.statement(body)
            }
            StmtKind::Return(value) | StmtKind::Action(value) => self.call_sites(stmt, value),
            StmtKind::Block(statements) => {
                for stmt in statements {
                    self.statement(stmt)?;
                }
                Ok(())
            }
            StmtKind::Switch { scrutinee, cases } => {
                self.call_sites(stmt, scrutinee)?;
                for case in cases {
                    self.statement(case.body)?;
                }
                Ok(())
            }
            StmtKind::Break
            | StmtKind::CBlock(_)
            | StmtKind::TypeDeclaration { .. }
            | StmtKind::Include { .. } => Ok(()),
        }
    }

    fn condition(
        &self,
        stmt: &Stmt<'_>,
        condition: &Expr<'_>,
        message: &str,
    ) -> Result<(), Diagnostic> {
        let boolean = self
            .context
            .type_of(condition.id)
            .map_or(false, is_boolean);
        if boolean {
            Ok(())
        } else {
            Err(self.diagnostic(stmt, message.to_string()))
        }
    }

    /// Check every function call reachable inside `expr`: each supplied
    /// argument's inferred type must equal the declared parameter type.
    fn call_sites(&self, stmt: &Stmt<'_>, expr: &Expr<'_>) -> Result<(), Diagnostic> {
        match &expr.kind {
            ExprKind::Call { callee, args } => {
                for arg in args {
                    self.call_sites(stmt, arg)?;
                }
                self.call(stmt, *callee, args)
            }
            ExprKind::Unary { operand, .. } => self.call_sites(stmt, operand),
            ExprKind::Group(inner) => self.call_sites(stmt, inner),
            ExprKind::Binary { left, right, .. } => {
                self.call_sites(stmt, left)?;
                self.call_sites(stmt, right)
            }
            ExprKind::Member { base, .. } => self.call_sites(stmt, base),
            ExprKind::Literal(Literal::Struct { inits, .. })
            | ExprKind::Literal(Literal::Enum { inits, .. }) => {
                for init in inits {
                    self.call_sites(stmt, init.value)?;
                }
                Ok(())
            }
            ExprKind::Literal(_) | ExprKind::Void => Ok(()),
        }
    }

    fn call(
        &self,
        stmt: &Stmt<'_>,
        callee: crate::intern::Symbol,
        args: &[&Expr<'_>],
    ) -> Result<(), Diagnostic> {
        let fn_type = match self.global.find_fn(callee) {
            Some(fn_type) => Some(fn_type.clone()),
            None => self
                .context
                .scope_of(stmt.id)
                .iter()
                .rev()
                .find(|var| var.name == callee)
                .and_then(|var| var.ty.clone())
                .filter(|ty| matches!(ty.kind, TypeKind::Function { .. })),
        };
        let Some(fn_type) = fn_type else {
            // Resolution failures were already reported by inference.
            return Ok(());
        };
        let TypeKind::Function { params, .. } = &fn_type.kind else {
            return Ok(());
        };

        debug_assert!(args.len() <= params.len());
        for (arg, param) in args.iter().zip(params.iter()) {
            // Unconstrained arguments (`null`, `_`) pass any parameter.
            let Some(actual) = self.context.type_of(arg.id) else {
                continue;
            };
            if !type_eq(actual, &param.ty) {
                let fn_name = fn_type
                    .name()
                    .map(|sym| self.interner.resolve(sym).to_string())
                    .unwrap_or_else(|| self.interner.resolve(callee).to_string());
                return Err(self.diagnostic(
                    stmt,
                    format!(
                        "mismatch types; expected `{}` for parameter '{}' but got `{}` (in function '{}').",
                        show_type(&param.ty, self.interner),
                        self.interner.resolve(param.name),
                        show_type(actual, self.interner),
                        fn_name
                    ),
                ));
            }
        }
        Ok(())
    }
}

/// Returns are discovered through every nested statement form,
/// including branch arms and loop and switch bodies.
fn collect_return_statements<'a>(stmt: &'a Stmt<'a>, out: &mut Vec<&'a Stmt<'a>>) {
    match &stmt.kind {
        StmtKind::Return(_) => out.push(stmt),
        StmtKind::If {
            then_branch,
            else_branch,
            ..
        } => {
            collect_return_statements(then_branch, out);
            if let Some(else_branch) = else_branch {
                collect_return_statements(else_branch, out);
            }
        }
        StmtKind::Block(statements) => {
            for stmt in statements {
                collect_return_statements(stmt, out);
            }
        }
        StmtKind::While { body, .. } => collect_return_statements(body, out),
        StmtKind::Switch { cases, .. } => {
            for case in cases {
                collect_return_statements(case.body, out);
            }
        }
        StmtKind::Binding { .. }
        | StmtKind::Action(_)
        | StmtKind::Break
        | StmtKind::CBlock(_)
        | StmtKind::TypeDeclaration { .. }
        | StmtKind::Include { .. } => {}
    }
}
