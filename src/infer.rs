use std::collections::HashMap;

use crate::ast::{
    ArraySize, BinaryOp, Expr, ExprId, ExprKind, Field, Literal, Primitive, Type, TypeKind,
    TypeModifier,
};
use crate::context::{GlobalContext, ScopedVariable};
use crate::intern::{Interner, Symbol};
use crate::suggest::find_similar;

/// Bottom-up expression typing. Every successfully typed expression is
/// recorded in `types` keyed by its id; `null` and `_` stay absent so
/// they constrain nothing. Errors are plain messages; the caller
/// anchors them at the enclosing statement.
pub fn infer_expression_type(
    expr: &Expr<'_>,
    global: &GlobalContext,
    scoped: &[ScopedVariable],
    interner: &Interner,
    types: &mut HashMap<ExprId, Type>,
) -> Result<Option<Type>, String> {
    let inferred = match &expr.kind {
        ExprKind::Literal(literal) => {
            infer_literal_type(literal, global, scoped, interner, types)?
        }
        ExprKind::Unary { operand, .. } => {
            infer_expression_type(operand, global, scoped, interner, types)?
        }
        ExprKind::Group(inner) => infer_expression_type(inner, global, scoped, interner, types)?,
        ExprKind::Binary { op, left, right } => {
            let left_ty = infer_expression_type(left, global, scoped, interner, types)?;
            infer_expression_type(right, global, scoped, interner, types)?;
            match op {
                // Comparisons and logical connectives produce booleans.
                BinaryOp::Greater
                | BinaryOp::Less
                | BinaryOp::Eq
                | BinaryOp::And
                | BinaryOp::Or => Some(Type::primitive(Primitive::Bool)),
                // Arithmetic, bitwise, and assignment take the type of
                // the left operand.
                BinaryOp::Add
                | BinaryOp::Subtract
                | BinaryOp::Multiply
                | BinaryOp::BitAnd
                | BinaryOp::BitOr
                | BinaryOp::Assign => left_ty,
            }
        }
        ExprKind::Call { callee, args } => {
            for arg in args {
                infer_expression_type(arg, global, scoped, interner, types)?;
            }
            Some(infer_call_type(*callee, args.len(), global, scoped, interner)?)
        }
        ExprKind::Member { base, field } => {
            let base_ty = infer_expression_type(base, global, scoped, interner, types)?;
            Some(infer_member_type(base_ty, *field, global, interner)?)
        }
        ExprKind::Void => Some(Type::primitive(Primitive::Void)),
    };

    if let Some(ty) = &inferred {
        types.insert(expr.id, ty.clone());
    }
    Ok(inferred)
}

fn infer_literal_type(
    literal: &Literal<'_>,
    global: &GlobalContext,
    scoped: &[ScopedVariable],
    interner: &Interner,
    types: &mut HashMap<ExprId, Type>,
) -> Result<Option<Type>, String> {
    match literal {
        Literal::Bool(_) => Ok(Some(Type::primitive(Primitive::Bool))),
        Literal::Char(_) => Ok(Some(Type::primitive(Primitive::U8))),
        Literal::Numeric(_) => Ok(Some(Type::primitive(Primitive::I32))),
        Literal::Str(sym) => {
            let len = interner.resolve(*sym).len();
            Ok(Some(Type::with_modifiers(
                TypeKind::Primitive(Primitive::U8),
                vec![TypeModifier::Array(ArraySize::Literal(len))],
            )))
        }
        Literal::Hole | Literal::Null => Ok(None),
        Literal::Struct { name, inits } => {
            for init in inits {
                infer_expression_type(init.value, global, scoped, interner, types)?;
            }
            match global.find_struct(*name) {
                Some(def) => Ok(Some(def.clone())),
                None => Err(format!(
                    "`struct {}` does not exist.",
                    interner.resolve(*name)
                )),
            }
        }
        Literal::Enum { name, inits } => {
            for init in inits {
                infer_expression_type(init.value, global, scoped, interner, types)?;
            }
            match global.find_enum(*name) {
                Some(def) => Ok(Some(def.clone())),
                None => Err(format!(
                    "`enum {}` does not exist.",
                    interner.resolve(*name)
                )),
            }
        }
        Literal::Name(name) => infer_name_type(*name, global, scoped, interner).map(Some),
    }
}

/// Identifier lookup order: scoped variables (most recent wins), then
/// global data types, then global function types.
fn infer_name_type(
    name: Symbol,
    global: &GlobalContext,
    scoped: &[ScopedVariable],
    interner: &Interner,
) -> Result<Type, String> {
    for var in scoped.iter().rev() {
        if var.name == name {
            let ty = var.ty.as_ref().ok_or_else(|| {
                format!(
                    "the type of `{}` cannot be inferred here.",
                    interner.resolve(name)
                )
            })?;
            return resolve_full_type(ty, global, interner);
        }
    }

    if let Some(data_type) = global.find_data_type(name) {
        return Ok(data_type.clone());
    }
    if let Some(fn_type) = global.find_fn(name) {
        return Ok(fn_type.clone());
    }

    Err(unresolved_name_message(name, global, scoped, interner))
}

fn infer_call_type(
    callee: Symbol,
    arg_count: usize,
    global: &GlobalContext,
    scoped: &[ScopedVariable],
    interner: &Interner,
) -> Result<Type, String> {
    if let Some(fn_type) = global.find_fn(callee) {
        return infer_applied_type(fn_type, callee, arg_count, global, interner);
    }

    for var in scoped.iter().rev() {
        if var.name != callee {
            continue;
        }
        if let Some(ty @ Type {
            kind: TypeKind::Function { .. },
            ..
        }) = &var.ty
        {
            return infer_applied_type(ty, callee, arg_count, global, interner);
        }
    }

    Err(format!(
        "the function `{}` does not exist.",
        interner.resolve(callee)
    ))
}

/// Applying `arg_count` values to a function type: too many arguments
/// fail, a full application yields the return type, and a partial one
/// yields the function type of the remaining parameters.
fn infer_applied_type(
    fn_type: &Type,
    callee: Symbol,
    arg_count: usize,
    global: &GlobalContext,
    interner: &Interner,
) -> Result<Type, String> {
    let (params, return_type) = match &fn_type.kind {
        TypeKind::Function {
            params,
            return_type,
            ..
        } => (params, return_type),
        _ => {
            return Err(format!(
                "`{}` is not a function.",
                interner.resolve(callee)
            ))
        }
    };

    if params.len() < arg_count {
        return Err(format!(
            "too many values provided to `{}`.",
            interner.resolve(callee)
        ));
    }

    if params.len() == arg_count {
        return resolve_full_type(return_type, global, interner);
    }

    Ok(Type::new(TypeKind::Function {
        name: None,
        params: params[arg_count..].to_vec(),
        return_type: return_type.clone(),
    }))
}

fn infer_member_type(
    base: Option<Type>,
    field: Symbol,
    global: &GlobalContext,
    interner: &Interner,
) -> Result<Type, String> {
    let base = match base {
        Some(base) => resolve_full_type(&base, global, interner)?,
        None => return Err("can only access fields of structs.".to_string()),
    };

    let (name, fields) = match &base.kind {
        TypeKind::Struct { name, fields, .. } => (*name, fields),
        _ => return Err("can only access fields of structs.".to_string()),
    };

    match field_type(fields, field, global, interner)? {
        Some(ty) => Ok(ty),
        None => Err(format!(
            "field `{}` does not exist on `struct {}`.",
            interner.resolve(field),
            interner.resolve(name)
        )),
    }
}

/// Field lookup that resolves predefined struct/enum references to
/// their full definitions while keeping the field's own modifiers.
pub fn field_type(
    fields: &[Field],
    name: Symbol,
    global: &GlobalContext,
    interner: &Interner,
) -> Result<Option<Type>, String> {
    for field in fields {
        if field.name == name {
            return resolve_full_type(&field.ty, global, interner).map(Some);
        }
    }
    Ok(None)
}

/// Replace a predefined struct/enum reference with its definition from
/// the global table. The reference's own modifiers survive; only the
/// body is filled in. Other types pass through unchanged.
pub fn resolve_full_type(
    ty: &Type,
    global: &GlobalContext,
    interner: &Interner,
) -> Result<Type, String> {
    match &ty.kind {
        TypeKind::Struct {
            name,
            predefined: true,
            ..
        } => match global.find_struct(*name) {
            Some(def) => Ok(Type::with_modifiers(def.kind.clone(), ty.modifiers.clone())),
            None => Err(format!(
                "`struct {}` does not exist.",
                interner.resolve(*name)
            )),
        },
        TypeKind::Enum {
            name,
            predefined: true,
            ..
        } => match global.find_enum(*name) {
            Some(def) => Ok(Type::with_modifiers(def.kind.clone(), ty.modifiers.clone())),
            None => Err(format!(
                "`enum {}` does not exist.",
                interner.resolve(*name)
            )),
        },
        _ => Ok(ty.clone()),
    }
}

pub fn unresolved_name_message(
    name: Symbol,
    global: &GlobalContext,
    scoped: &[ScopedVariable],
    interner: &Interner,
) -> String {
    let word = interner.resolve(name);
    let mut message = format!("`{}` is not in the current scope.", word);

    let candidates = scoped
        .iter()
        .map(|var| interner.resolve(var.name))
        .chain(
            global
                .fn_types
                .iter()
                .chain(global.data_types.iter())
                .filter_map(|ty| ty.name())
                .map(|sym| interner.resolve(sym)),
        );
    if let Some(suggestion) = find_similar(word, candidates, 2) {
        message.push_str(&format!(" did you mean `{}`?", suggestion));
    }
    message
}
