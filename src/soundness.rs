use crate::ast::{
    ArraySize, Expr, ExprKind, Field, Literal, Stmt, StmtKind, TypeKind, TypeModifier,
};
use crate::context::{Context, GlobalContext, ScopedVariable};
use crate::error::Diagnostic;
use crate::infer::unresolved_name_message;
use crate::intern::{Interner, Symbol};
use crate::parser::ParsedFile;

/// Name and shape validity, independent of type equality: unique
/// data-type names, unique fields, array-modifier rules, resolvable
/// identifiers, well-formed struct/enum literals, and binding names
/// that collide with nothing already visible.
pub fn soundness_check(
    file: &ParsedFile<'_>,
    global: &GlobalContext,
    context: &Context,
    interner: &Interner,
) -> Result<(), Diagnostic> {
    let checker = SoundnessChecker {
        file,
        global,
        context,
        interner,
    };

    for stmt in &file.statements {
        match &stmt.kind {
            StmtKind::TypeDeclaration { ty, body } => match &ty.kind {
                TypeKind::Function { .. } => {
                    if let Some(body) = body {
                        checker.statement(body)?;
                    }
                }
                TypeKind::Struct { name, fields, .. } => {
                    checker
                        .data_type_shape("struct", *name, fields)
                        .map_err(|message| checker.diagnostic(stmt, message))?;
                }
                TypeKind::Enum { name, variants, .. } => {
                    checker
                        .data_type_shape("enum", *name, variants)
                        .map_err(|message| checker.diagnostic(stmt, message))?;
                }
                TypeKind::Primitive(_) => {}
            },
            _ => {}
        }
    }
    Ok(())
}

struct SoundnessChecker<'b, 'a> {
    file: &'b ParsedFile<'a>,
    global: &'b GlobalContext,
    context: &'b Context,
    interner: &'b Interner,
}

impl<'b, 'a> SoundnessChecker<'b, 'a> {
    fn diagnostic(&self, stmt: &Stmt<'_>, message: String) -> Diagnostic {
        Diagnostic::new(self.file.position_of(stmt.id), message)
    }

    fn resolve(&self, sym: Symbol) -> &str {
        self.interner.resolve(sym)
    }

    /// Shared shape rules for structs and enums: a unique name in the
    /// global table, unique members, and lawful array modifiers.
    fn data_type_shape(&self, kind: &str, name: Symbol, members: &[Field]) -> Result<(), String> {
        let same_name = self
            .global
            .data_types
            .iter()
            .filter(|ty| ty.name() == Some(name))
            .count();
        if same_name > 1 {
            return Err(format!(
                "`{} {}` already exists.",
                kind,
                self.resolve(name)
            ));
        }

        let mut visited: Vec<Symbol> = Vec::new();
        for member in members {
            if visited.contains(&member.name) {
                return Err(format!(
                    "field `{}` already exists on {}.",
                    self.resolve(member.name),
                    kind
                ));
            }
            visited.push(member.name);
        }

        for member in members {
            self.array_modifier_rules(name, member, members)?;
        }
        Ok(())
    }

    /// Every array modifier is either literally sized, sized by a
    /// sibling `usize` field, or (unsized) sits directly under a
    /// pointer modifier.
    fn array_modifier_rules(
        &self,
        owner: Symbol,
        member: &Field,
        siblings: &[Field],
    ) -> Result<(), String> {
        for (index, modifier) in member.ty.modifiers.iter().enumerate() {
            let TypeModifier::Array(size) = modifier else {
                continue;
            };
            let under_pointer =
                index >= 1 && matches!(member.ty.modifiers[index - 1], TypeModifier::Pointer);
            match size {
                ArraySize::Literal(_) => {}
                ArraySize::Reference(reference) => {
                    let target = siblings.iter().find(|f| f.name == *reference);
                    match target {
                        Some(target) => {
                            let is_usize = matches!(
                                target.ty.kind,
                                TypeKind::Primitive(crate::ast::Primitive::Usize)
                            );
                            if !is_usize {
                                return Err(format!(
                                    "`{}` must be bound to a field of type `usize`.",
                                    self.resolve(*reference)
                                ));
                            }
                        }
                        None => {
                            return Err(format!(
                                "`{}` is unbounded within `{}`.",
                                self.resolve(*reference),
                                self.resolve(owner)
                            ));
                        }
                    }
                    // A runtime-sized member has no in-place layout;
                    // it must live behind a pointer.
                    if !under_pointer {
                        return Err(format!(
                            "`{}` must have a pointer modifier.",
                            self.resolve(member.name)
                        ));
                    }
                }
                ArraySize::Unsized => {
                    if !under_pointer {
                        return Err(format!(
                            "`{}` must have a pointer modifier.",
                            self.resolve(member.name)
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    fn statement(&self, stmt: &Stmt<'_>) -> Result<(), Diagnostic> {
        let scoped = self.context.scope_of(stmt.id);
        match &stmt.kind {
            StmtKind::Binding { name, value, .. } => {
                self.binding_name(stmt, *name, scoped)?;
                self.expression(value, scoped)
                    .map_err(|message| self.diagnostic(stmt, message))
            }
            StmtKind::Return(expr) | StmtKind::Action(expr) => self
                .expression(expr, scoped)
                .map_err(|message| self.diagnostic(stmt, message)),
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.expression(condition, scoped)
                    .map_err(|message| self.diagnostic(stmt, message))?;
                self.statement(then_branch)?;
                if let Some(else_branch) = else_branch {
                    self.statement(else_branch)?;
                }
                Ok(())
            }
            StmtKind::While { condition, body } => {
                self.expression(condition, scoped)
                    .map_err(|message| self.diagnostic(stmt, message))?;
                self.statement(body)
            }
            StmtKind::Block(statements) => {
                for stmt in statements {
                    self.statement(stmt)?;
                }
                Ok(())
            }
            StmtKind::Switch { scrutinee, cases } => {
                self.expression(scrutinee, scoped)
                    .map_err(|message| self.diagnostic(stmt, message))?;
                for case in cases {
                    self.statement(case.body)?;
                }
                Ok(())
            }
            StmtKind::Break | StmtKind::CBlock(_) => Ok(()),
            StmtKind::TypeDeclaration { .. } | StmtKind::Include { .. } => Ok(()),
        }
    }

    /// A binding may not redefine a name already in scope, nor shadow
    /// a global function.
    fn binding_name(
        &self,
        stmt: &Stmt<'_>,
        name: Symbol,
        scoped: &[ScopedVariable],
    ) -> Result<(), Diagnostic> {
        if scoped.iter().any(|var| var.name == name) {
            return Err(self.diagnostic(
                stmt,
                format!(
                    "the binding name `{}` is already defined in this scope.",
                    self.resolve(name)
                ),
            ));
        }
        if self.global.find_fn(name).is_some() {
            return Err(self.diagnostic(
                stmt,
                format!(
                    "the binding name `{}` conflicts with a function in this scope.",
                    self.resolve(name)
                ),
            ));
        }
        Ok(())
    }

    fn expression(&self, expr: &Expr<'_>, scoped: &[ScopedVariable]) -> Result<(), String> {
        match &expr.kind {
            ExprKind::Literal(literal) => self.literal(literal, scoped),
            ExprKind::Unary { operand, .. } => self.expression(operand, scoped),
            ExprKind::Group(inner) => self.expression(inner, scoped),
            ExprKind::Binary { left, right, .. } => {
                self.expression(left, scoped)?;
                self.expression(right, scoped)
            }
            ExprKind::Call { args, .. } => {
                for arg in args {
                    self.expression(arg, scoped)?;
                }
                Ok(())
            }
            ExprKind::Member { base, .. } => self.expression(base, scoped),
            ExprKind::Void => Ok(()),
        }
    }

    fn literal(&self, literal: &Literal<'_>, scoped: &[ScopedVariable]) -> Result<(), String> {
        match literal {
            Literal::Name(name) => {
                if scoped.iter().any(|var| var.name == *name) {
                    return Ok(());
                }
                if self.global.find_fn(*name).is_some() {
                    return Ok(());
                }
                Err(unresolved_name_message(
                    *name,
                    self.global,
                    scoped,
                    self.interner,
                ))
            }
            Literal::Struct { name, inits } | Literal::Enum { name, inits } => {
                let Some(data_type) = self.global.find_data_type(*name) else {
                    return Err(format!(
                        "`{}` is not a known data type.",
                        self.resolve(*name)
                    ));
                };
                let members = match &data_type.kind {
                    TypeKind::Struct { fields, .. } => fields,
                    TypeKind::Enum { variants, .. } => variants,
                    _ => return Err(format!("`{}` is not a data type.", self.resolve(*name))),
                };

                if inits.len() > members.len() {
                    return Err("too many fields provided.".to_string());
                }

                let mut seen: Vec<Symbol> = Vec::new();
                for init in inits {
                    if members.iter().all(|m| m.name != init.name) {
                        return Err(format!(
                            "`{}` is not a field of `{}`.",
                            self.resolve(init.name),
                            self.resolve(*name)
                        ));
                    }
                    if seen.contains(&init.name) {
                        return Err(format!(
                            "field `{}` is provided more than once.",
                            self.resolve(init.name)
                        ));
                    }
                    seen.push(init.name);
                }

                for member in members {
                    match inits.iter().find(|init| init.name == member.name) {
                        Some(init) => self.expression(init.value, scoped)?,
                        None => {
                            return Err(format!(
                                "required field `{}` is missing.",
                                self.resolve(member.name)
                            ));
                        }
                    }
                }
                Ok(())
            }
            Literal::Bool(_)
            | Literal::Char(_)
            | Literal::Str(_)
            | Literal::Numeric(_)
            | Literal::Hole
            | Literal::Null => Ok(()),
        }
    }
}
