use std::fmt::Write as _;

use crate::ast::{
    ArraySize, BinaryOp, Expr, ExprKind, Field, Literal, Pattern, Stmt, StmtKind, Type, TypeKind,
    TypeModifier, UnaryOp,
};
use crate::context::{Context, GlobalContext};
use crate::intern::Interner;
use crate::parser::ParsedFile;

/// The two generated C translation units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CArtifacts {
    pub header: String,
    pub source: String,
}

/// Lower a checked program to C. Reads the AST and the context tables;
/// mutates neither, so emission is idempotent.
pub fn generate_c(
    file: &ParsedFile<'_>,
    global: &GlobalContext,
    context: &Context,
    interner: &Interner,
) -> CArtifacts {
    let emitter = CEmitter {
        global,
        context,
        interner,
    };
    CArtifacts {
        header: emitter.generate_header(),
        source: emitter.generate_source(file),
    }
}

struct CEmitter<'b> {
    global: &'b GlobalContext,
    context: &'b Context,
    interner: &'b Interner,
}

impl<'b> CEmitter<'b> {
    fn resolve(&self, sym: crate::intern::Symbol) -> &str {
        self.interner.resolve(sym)
    }

    // ------------------------------------------------------------------
    // Header
    // ------------------------------------------------------------------

    fn generate_header(&self) -> String {
        let mut out = String::new();
        out.push_str("#ifndef C_OUTPUT_H\n#define C_OUTPUT_H\n");
        out.push_str("#include <stdio.h>\n");
        out.push_str("#include <stdlib.h>\n");
        out.push_str("#include <unistd.h>\n");

        for data_type in &self.global.data_types {
            match &data_type.kind {
                TypeKind::Struct { .. } => self.write_struct_type(data_type, true, &mut out),
                TypeKind::Enum { .. } => self.write_enum_type(data_type, true, &mut out),
                _ => {}
            }
            out.push('\n');
        }

        for fn_type in &self.global.fn_types {
            self.write_function_type(fn_type, &mut out);
            out.push_str(";\n");
        }

        out.push_str("\n#endif\n");
        out
    }

    // ------------------------------------------------------------------
    // Implementation file
    // ------------------------------------------------------------------

    fn generate_source(&self, file: &ParsedFile<'_>) -> String {
        let mut out = String::new();
        out.push_str("#include \"c_output.h\"\n");

        for stmt in &file.statements {
            match &stmt.kind {
                StmtKind::Include { .. } => self.write_statement(stmt, &mut out),
                StmtKind::TypeDeclaration { ty, .. } => {
                    if matches!(ty.kind, TypeKind::Function { .. }) {
                        self.write_statement(stmt, &mut out);
                        out.push('\n');
                    }
                }
                _ => {}
            }
        }
        out
    }

    // ------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------

    /// The leaf form of a type; modifiers are applied separately to the
    /// declared name.
    fn write_type(&self, ty: &Type, out: &mut String) {
        match &ty.kind {
            TypeKind::Primitive(primitive) => out.push_str(primitive.c_name()),
            TypeKind::Struct { .. } => self.write_struct_type(ty, false, out),
            TypeKind::Enum { .. } => self.write_enum_type(ty, false, out),
            TypeKind::Function { .. } => self.write_function_type(ty, out),
        }
    }

    /// Wrap the declared name in the type's modifiers, outermost
    /// first: pointer becomes `(*name)`, array `(name[N])` (empty for
    /// reference-sized and unsized arrays), nullable passes through,
    /// and mutable is erased in C.
    fn apply_type_modifiers(&self, modifiers: &[TypeModifier], name: &str) -> String {
        let mut output = name.to_string();
        for modifier in modifiers {
            output = match modifier {
                TypeModifier::Pointer => format!("(*{})", output),
                TypeModifier::Nullable | TypeModifier::Mutable => output,
                TypeModifier::Array(size) => match size {
                    ArraySize::Literal(n) => format!("({}[{}])", output, n),
                    ArraySize::Reference(_) | ArraySize::Unsized => format!("({}[])", output),
                },
            };
        }
        output
    }

    fn write_member_list(&self, members: &[Field], names: Vec<String>, out: &mut String) {
        for (member, name) in members.iter().zip(names) {
            out.push(' ');
            self.write_type(&member.ty, out);
            let declared = self.apply_type_modifiers(&member.ty.modifiers, &name);
            let _ = write!(out, " {};", declared);
        }
    }

    fn write_struct_type(&self, ty: &Type, full: bool, out: &mut String) {
        let TypeKind::Struct { name, fields, .. } = &ty.kind else {
            return;
        };
        if !full {
            let _ = write!(out, "struct {}", self.resolve(*name));
            return;
        }

        let _ = write!(out, "struct {} {{", self.resolve(*name));
        let field_names = fields
            .iter()
            .map(|f| self.resolve(f.name).to_string())
            .collect();
        self.write_member_list(fields, field_names, out);
        out.push_str("};");
    }

    /// An enum lowers to a tag enum plus a tagged union:
    /// `enum N_kind { N_kind_a, ... };`
    /// `struct N_type { enum N_kind N_kind; union { ... }; };`
    fn write_enum_type(&self, ty: &Type, full: bool, out: &mut String) {
        let TypeKind::Enum { name, variants, .. } = &ty.kind else {
            return;
        };
        let name = self.resolve(*name);
        if !full {
            let _ = write!(out, "struct {}_type", name);
            return;
        }

        let _ = write!(out, "enum {}_kind {{", name);
        for (i, variant) in variants.iter().enumerate() {
            let _ = write!(out, "{}_kind_{}", name, self.resolve(variant.name));
            if i + 1 < variants.len() {
                out.push(',');
            }
        }
        out.push_str("}; ");

        let _ = write!(
            out,
            "struct {}_type {{ enum {}_kind {}_kind; union {{",
            name, name, name
        );
        let payload_names = variants
            .iter()
            .map(|v| format!("{}_type_{}", name, self.resolve(v.name)))
            .collect();
        self.write_member_list(variants, payload_names, out);
        out.push_str("};};");
    }

    fn write_function_type(&self, ty: &Type, out: &mut String) {
        let TypeKind::Function {
            name,
            params,
            return_type,
        } = &ty.kind
        else {
            return;
        };

        self.write_type(return_type, out);
        for modifier in &return_type.modifiers {
            if matches!(modifier, TypeModifier::Pointer) {
                out.push('*');
            }
        }
        let fn_name = name.map(|sym| self.resolve(sym)).unwrap_or("");
        let _ = write!(out, " {}(", fn_name);

        for (i, param) in params.iter().enumerate() {
            self.write_type(&param.ty, out);
            let declared =
                self.apply_type_modifiers(&param.ty.modifiers, self.resolve(param.name));
            let _ = write!(out, " {}", declared);
            if i + 1 < params.len() {
                out.push_str(", ");
            }
        }
        out.push(')');
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn write_expression(&self, expr: &Expr<'_>, out: &mut String) {
        match &expr.kind {
            ExprKind::Literal(literal) => self.write_literal(literal, out),
            ExprKind::Unary { op, operand } => {
                out.push_str(match op {
                    UnaryOp::Not => "!",
                    UnaryOp::Deref => "*",
                    UnaryOp::Negate => "-",
                });
                self.write_expression(operand, out);
            }
            ExprKind::Binary { op, left, right } => {
                self.write_expression(left, out);
                out.push_str(match op {
                    BinaryOp::Add => " + ",
                    BinaryOp::Subtract => " - ",
                    BinaryOp::Multiply => " * ",
                    BinaryOp::Or => " || ",
                    BinaryOp::And => " && ",
                    BinaryOp::BitOr => " | ",
                    BinaryOp::BitAnd => " & ",
                    BinaryOp::Greater => " > ",
                    BinaryOp::Less => " < ",
                    BinaryOp::Eq => " == ",
                    BinaryOp::Assign => " = ",
                });
                self.write_expression(right, out);
            }
            ExprKind::Group(inner) => {
                out.push('(');
                self.write_expression(inner, out);
                out.push(')');
            }
            ExprKind::Call { callee, args } => {
                let _ = write!(out, "{}(", self.resolve(*callee));
                for (i, arg) in args.iter().enumerate() {
                    self.write_expression(arg, out);
                    if i + 1 < args.len() {
                        out.push_str(", ");
                    }
                }
                out.push(')');
            }
            ExprKind::Member { base, field } => {
                self.write_expression(base, out);
                // `->` when the accessed value is a pointer at the
                // outermost modifier position.
                let through_pointer = self
                    .context
                    .type_of(base.id)
                    .map_or(false, Type::has_outer_pointer);
                out.push_str(if through_pointer { "->" } else { "." });
                out.push_str(self.resolve(*field));
            }
            ExprKind::Void => {}
        }
    }

    fn write_literal(&self, literal: &Literal<'_>, out: &mut String) {
        match literal {
            Literal::Bool(value) => out.push_str(if *value { "1" } else { "0" }),
            Literal::Char(byte) => {
                let _ = write!(out, "'{}'", *byte as char);
            }
            Literal::Str(sym) => {
                let _ = write!(out, "\"{}\"", self.resolve(*sym));
            }
            // Numeric literals truncate to integers on the way out.
            Literal::Numeric(value) => {
                let _ = write!(out, "{}", *value as i64);
            }
            Literal::Name(name) => out.push_str(self.resolve(*name)),
            Literal::Hole => out.push('0'),
            Literal::Null => out.push_str("NULL"),
            Literal::Struct { name, inits } => {
                let _ = write!(out, "(struct {}) {{", self.resolve(*name));
                for (i, init) in inits.iter().enumerate() {
                    let _ = write!(out, ".{} = ", self.resolve(init.name));
                    self.write_expression(init.value, out);
                    if i + 1 < inits.len() {
                        out.push(',');
                    }
                }
                out.push('}');
            }
            // Variant constructors are not synthesised yet; an enum
            // literal lowers to a zeroed value of the tagged union.
            Literal::Enum { name, .. } => {
                let _ = write!(out, "(struct {}_type) {{0}}", self.resolve(*name));
            }
        }
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn write_statement(&self, stmt: &Stmt<'_>, out: &mut String) {
        match &stmt.kind {
            StmtKind::Binding {
                name,
                annotation,
                value,
            } => {
                let inferred = self.context.type_of(value.id);
                let declared = inferred.or(annotation.as_ref());
                if let Some(ty) = declared {
                    self.write_type(ty, out);
                }
                let _ = write!(out, " {} = ", self.resolve(*name));
                if matches!(value.kind, ExprKind::Literal(Literal::Null)) {
                    self.write_type_default(declared, out);
                } else {
                    self.write_expression(value, out);
                }
                out.push(';');
            }
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                out.push_str("if (");
                self.write_expression(condition, out);
                out.push(')');
                self.write_statement(then_branch, out);
                if let Some(else_branch) = else_branch {
                    out.push_str(" else ");
                    self.write_statement(else_branch, out);
                }
            }
            StmtKind::While { condition, body } => {
                out.push_str("while (");
                self.write_expression(condition, out);
                out.push(')');
                self.write_statement(body, out);
            }
            StmtKind::Return(value) => {
                out.push_str("return ");
                self.write_expression(value, out);
                out.push(';');
            }
            StmtKind::Break => out.push_str("break;"),
            StmtKind::Block(statements) => {
                out.push('{');
                for stmt in statements {
                    self.write_statement(stmt, out);
                }
                out.push('}');
            }
            StmtKind::Action(expr) => {
                self.write_expression(expr, out);
                out.push(';');
            }
            StmtKind::Switch { scrutinee, cases } => {
                self.write_switch(scrutinee, cases, out)
            }
            StmtKind::TypeDeclaration { ty, body } => {
                self.write_type(ty, out);
                if let Some(body) = body {
                    self.write_statement(body, out);
                }
            }
            StmtKind::Include { path, external } => {
                if *external {
                    let _ = write!(out, "#include <{}>\n", path);
                } else {
                    let _ = write!(out, "#include \"{}\"\n", path);
                }
            }
            StmtKind::CBlock(raw) => {
                out.push_str(raw);
                out.push('\n');
            }
        }
    }

    fn write_type_default(&self, ty: Option<&Type>, out: &mut String) {
        match ty {
            Some(Type {
                kind: TypeKind::Struct { .. },
                ..
            }) => out.push_str("{0}"),
            _ => out.push('0'),
        }
    }

    /// Switch lowers to a scoped temporary pointer at the scrutinee
    /// plus a chain of guarded blocks, one per case.
    fn write_switch(&self, scrutinee: &Expr<'_>, cases: &[crate::ast::Case<'_>], out: &mut String) {
        out.push('{');
        match self.context.type_of(scrutinee.id) {
            Some(ty) => self.write_type(ty, out),
            None => out.push_str("void"),
        }
        out.push_str(" *_t = &");
        self.write_expression(scrutinee, out);
        out.push(';');

        for case in cases {
            self.write_case_guard(&case.pattern, out);
            out.push('{');
            self.write_statement(case.body, out);
            out.push('}');
        }
        out.push('}');
    }

    fn write_case_guard(&self, pattern: &Pattern, out: &mut String) {
        match pattern {
            Pattern::Number(value) => {
                let _ = write!(out, "if (*_t == {})", value);
            }
            Pattern::Str(sym) => {
                let _ = write!(out, "if (strcmp(_t, \"{}\") == 0)", self.resolve(*sym));
            }
            Pattern::Variable(_) | Pattern::Underscore | Pattern::Rest => {
                out.push_str("if (1)");
            }
            // TODO: destructure object and array patterns instead of
            // matching unconditionally.
            Pattern::Object(_) | Pattern::Array(_) => out.push_str("if (1)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ExprId, StmtId};
    use crate::compile::compile_source;

    fn squish(s: &str) -> String {
        s.chars().filter(|c| !c.is_whitespace()).collect()
    }

    fn artifacts(source: &str) -> CArtifacts {
        compile_source(source, "t.sm").unwrap_or_else(|e| panic!("should compile: {}", e))
    }

    fn assert_contains(haystack: &str, needle: &str) {
        assert!(
            squish(haystack).contains(&squish(needle)),
            "expected output to contain `{}`, got:\n{}",
            needle,
            haystack
        );
    }

    #[test]
    fn functions_get_prototypes_and_definitions() {
        let out = artifacts("fn add(a: i32, b: i32) -> i32 { return a + b; }");
        assert_contains(&out.header, "int add(int a, int b);");
        assert_contains(&out.source, "int add(int a, int b){return a + b;}");
    }

    #[test]
    fn header_is_guarded_and_includes_the_standard_trio() {
        let out = artifacts("fn f() -> i32 { return 0; }");
        assert!(out.header.starts_with("#ifndef C_OUTPUT_H\n#define C_OUTPUT_H\n"));
        assert!(out.header.contains("#include <stdio.h>"));
        assert!(out.header.contains("#include <stdlib.h>"));
        assert!(out.header.contains("#include <unistd.h>"));
        assert!(out.header.trim_end().ends_with("#endif"));
        assert!(out.source.starts_with("#include \"c_output.h\"\n"));
    }

    #[test]
    fn structs_lower_field_by_field() {
        let out = artifacts(
            "struct Point { x: i32, y: i32 } \
             fn mk() -> struct Point { p: struct Point = struct Point { x = 1, y = 2 }; return p; }",
        );
        assert_contains(&out.header, "struct Point { int x; int y;};");
        assert_contains(&out.header, "struct Point mk();");
        assert_contains(&out.source, "struct Point p = (struct Point) {.x = 1,.y = 2};");
    }

    #[test]
    fn enums_lower_to_a_tag_enum_and_a_tagged_union() {
        let out = artifacts("enum R { ok: i32, err: u8 }");
        assert_contains(&out.header, "enum R_kind { R_kind_ok, R_kind_err };");
        assert_contains(
            &out.header,
            "struct R_type { enum R_kind R_kind; union { int R_type_ok; unsigned char R_type_err;};};",
        );
    }

    #[test]
    fn member_access_follows_pointerness() {
        let out = artifacts(
            "struct Point { x: i32, y: i32 } \
             fn through_pointer(p: *struct Point) -> i32 { return p.x; } \
             fn by_value(p: struct Point) -> i32 { return p.x; }",
        );
        assert_contains(&out.source, "return p->x;");
        assert_contains(&out.source, "return p.x;");
    }

    #[test]
    fn pointer_modifiers_wrap_declared_names() {
        let out = artifacts("struct S { data: *[]u8, n: usize }");
        assert_contains(&out.header, "unsigned char ((*data)[]); size_t n;");
    }

    #[test]
    fn reference_sized_arrays_print_empty_brackets() {
        let out = artifacts("struct S { data: *u8[n], n: usize }");
        assert_contains(&out.header, "unsigned char ((*data)[]);");
    }

    #[test]
    fn function_pointer_returns_gain_a_star() {
        let out = artifacts("fn f() -> *u8 { return null; }");
        assert_contains(&out.header, "unsigned char* f();");
    }

    #[test]
    fn null_bindings_default_by_type_kind() {
        let out = artifacts(
            "struct P { x: i32 } \
             fn f() -> i32 { p: struct P = null; n: i32 = null; return n; }",
        );
        assert_contains(&out.source, "struct P p = {0};");
        assert_contains(&out.source, "int n = 0;");
    }

    #[test]
    fn mutable_modifiers_are_erased_in_c() {
        let out = artifacts("fn f(x: mut i32) -> i32 { return x; }");
        assert_contains(&out.header, "int f(int x);");
    }

    #[test]
    fn numerics_truncate_to_integers() {
        let out = artifacts("fn f() -> i32 { return 3; }");
        assert_contains(&out.source, "return 3;");
        let out = artifacts("fn f() -> i32 { x: i32 = 2; return x * 2; }");
        assert_contains(&out.source, "int x = 2;");
    }

    #[test]
    fn booleans_lower_to_zero_and_one() {
        let out = artifacts("fn f() -> bool { if (true) { return false; } return true; }");
        assert_contains(&out.source, "if (1){return 0;}");
        assert_contains(&out.source, "return 1;");
    }

    #[test]
    fn includes_are_re_emitted_into_the_implementation() {
        let out = artifacts("# include <string.h> # include \"shim.h\" fn f() -> i32 { return 0; }");
        assert!(out.source.contains("#include <string.h>"));
        assert!(out.source.contains("#include \"shim.h\""));
    }

    #[test]
    fn switch_lowers_to_a_guard_chain_over_a_scrutinee_pointer() {
        let out = artifacts(
            "fn f() -> i32 { n = 3; switch (n) { \
               case 1: { return 1; } \
               case \"one\": { return 2; } \
               case _: { return 3; } \
             } return 0; }",
        );
        assert_contains(&out.source, "int *_t = &n;");
        assert_contains(&out.source, "if (*_t == 1){{return 1;}}");
        assert_contains(&out.source, "if (strcmp(_t, \"one\") == 0){{return 2;}}");
        assert_contains(&out.source, "if (1){{return 3;}}");
    }

    #[test]
    fn assignment_operator_lowers_even_without_a_surface_form() {
        let mut interner = Interner::new();
        let a = interner.intern("a");
        let global = GlobalContext::default();
        let context = Context::default();
        let emitter = CEmitter {
            global: &global,
            context: &context,
            interner: &interner,
        };

        let left = Expr {
            id: ExprId(0),
            kind: ExprKind::Literal(Literal::Name(a)),
        };
        let right = Expr {
            id: ExprId(1),
            kind: ExprKind::Literal(Literal::Numeric(7.0)),
        };
        let assign = Expr {
            id: ExprId(2),
            kind: ExprKind::Binary {
                op: BinaryOp::Assign,
                left: &left,
                right: &right,
            },
        };

        let mut out = String::new();
        emitter.write_expression(&assign, &mut out);
        assert_eq!(out, "a = 7");
    }

    #[test]
    fn raw_c_blocks_emit_verbatim() {
        let interner = Interner::new();
        let global = GlobalContext::default();
        let context = Context::default();
        let emitter = CEmitter {
            global: &global,
            context: &context,
            interner: &interner,
        };

        let stmt = Stmt {
            id: StmtId(0),
            kind: StmtKind::CBlock("int raw = 42; /* untouched */".to_string()),
        };
        let mut out = String::new();
        emitter.write_statement(&stmt, &mut out);
        assert_eq!(out, "int raw = 42; /* untouched */\n");
    }

    #[test]
    fn holes_lower_to_zero() {
        let interner = Interner::new();
        let global = GlobalContext::default();
        let context = Context::default();
        let emitter = CEmitter {
            global: &global,
            context: &context,
            interner: &interner,
        };

        let hole = Expr {
            id: ExprId(0),
            kind: ExprKind::Literal(Literal::Hole),
        };
        let mut out = String::new();
        emitter.write_expression(&hole, &mut out);
        assert_eq!(out, "0");
    }
}
