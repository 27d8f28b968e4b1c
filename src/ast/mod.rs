pub mod stmt;
pub mod types;

pub use stmt::{
    BinaryOp, Case, Expr, ExprId, ExprKind, FieldInit, Literal, Pattern, Stmt, StmtId, StmtKind,
    UnaryOp,
};
pub use types::{ArraySize, Field, Primitive, Type, TypeKind, TypeModifier};
