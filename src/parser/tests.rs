use super::*;
use crate::arena::{Arena, AstContext};
use crate::ast::{
    ArraySize, BinaryOp, ExprKind, Literal, Pattern, Primitive, StmtKind, TypeKind, TypeModifier,
    UnaryOp,
};
use crate::lexer::Lexer;

fn with_parsed<R>(source: &str, check: impl FnOnce(&ParsedFile<'_>, &Interner) -> R) -> R {
    let mut interner = Interner::new();
    let tokens = Lexer::new(source, &mut interner).tokenize();
    let expr_arena = Arena::new();
    let stmt_arena = Arena::new();
    let ctx = AstContext::new(&expr_arena, &stmt_arena);
    let file = Parser::new(tokens, &mut interner, ctx)
        .parse_file()
        .expect("source should parse");
    check(&file, &interner)
}

fn parse_error(source: &str) -> Diagnostic {
    let mut interner = Interner::new();
    let tokens = Lexer::new(source, &mut interner).tokenize();
    let expr_arena = Arena::new();
    let stmt_arena = Arena::new();
    let ctx = AstContext::new(&expr_arena, &stmt_arena);
    Parser::new(tokens, &mut interner, ctx)
        .parse_file()
        .expect_err("source should fail to parse")
}

fn fn_body<'f, 'a>(file: &'f ParsedFile<'a>, index: usize) -> &'f [&'a crate::ast::Stmt<'a>] {
    match &file.statements[index].kind {
        StmtKind::TypeDeclaration {
            body: Some(body), ..
        } => match &body.kind {
            StmtKind::Block(statements) => statements,
            other => panic!("function body should be a block, got {:?}", other),
        },
        other => panic!("expected a function declaration, got {:?}", other),
    }
}

#[test]
fn parses_a_function_declaration() {
    with_parsed("fn add(a: i32, b: i32) -> i32 { return a + b; }", |file, interner| {
        assert_eq!(file.statements.len(), 1);
        let StmtKind::TypeDeclaration { ty, body } = &file.statements[0].kind else {
            panic!("expected a type declaration");
        };
        assert!(body.is_some());
        let TypeKind::Function {
            name,
            params,
            return_type,
        } = &ty.kind
        else {
            panic!("expected a function type");
        };
        assert_eq!(interner.resolve(name.unwrap()), "add");
        assert_eq!(params.len(), 2);
        assert_eq!(interner.resolve(params[0].name), "a");
        assert_eq!(
            return_type.kind,
            TypeKind::Primitive(Primitive::I32)
        );
    });
}

#[test]
fn parses_an_empty_parameter_list() {
    with_parsed("fn main() -> void { return 0; }", |file, _| {
        let StmtKind::TypeDeclaration { ty, .. } = &file.statements[0].kind else {
            panic!("expected a type declaration");
        };
        let TypeKind::Function { params, .. } = &ty.kind else {
            panic!("expected a function type");
        };
        assert!(params.is_empty());
    });
}

#[test]
fn parses_struct_and_enum_declarations() {
    with_parsed(
        "struct Point { x: i32, y: i32 } enum R { ok: i32, err: u8 }",
        |file, interner| {
            let StmtKind::TypeDeclaration { ty, body } = &file.statements[0].kind else {
                panic!("expected a struct declaration");
            };
            assert!(body.is_none());
            let TypeKind::Struct { fields, predefined, .. } = &ty.kind else {
                panic!("expected a struct type");
            };
            assert!(!predefined);
            assert_eq!(fields.len(), 2);
            assert_eq!(interner.resolve(fields[1].name), "y");

            let StmtKind::TypeDeclaration { ty, .. } = &file.statements[1].kind else {
                panic!("expected an enum declaration");
            };
            let TypeKind::Enum { variants, .. } = &ty.kind else {
                panic!("expected an enum type");
            };
            assert_eq!(variants.len(), 2);
        },
    );
}

#[test]
fn field_type_mentions_are_predefined_references() {
    with_parsed("struct Line { from: struct Point, to: struct Point }", |file, _| {
        let StmtKind::TypeDeclaration { ty, .. } = &file.statements[0].kind else {
            panic!("expected a declaration");
        };
        let TypeKind::Struct { fields, .. } = &ty.kind else {
            panic!("expected a struct");
        };
        for field in fields {
            let TypeKind::Struct { predefined, fields, .. } = &field.ty.kind else {
                panic!("field should have struct type");
            };
            assert!(predefined);
            assert!(fields.is_empty());
        }
    });
}

#[test]
fn modifiers_compose_outside_in() {
    with_parsed("struct S { data: *?[4]mut u8, n: usize }", |file, _| {
        let StmtKind::TypeDeclaration { ty, .. } = &file.statements[0].kind else {
            panic!("expected a declaration");
        };
        let TypeKind::Struct { fields, .. } = &ty.kind else {
            panic!("expected a struct");
        };
        assert_eq!(
            fields[0].ty.modifiers,
            vec![
                TypeModifier::Pointer,
                TypeModifier::Nullable,
                TypeModifier::Array(ArraySize::Literal(4)),
                TypeModifier::Mutable,
            ]
        );
    });
}

#[test]
fn array_modifiers_take_literal_reference_or_no_size() {
    with_parsed(
        "struct S { a: [4]u8, b: *[]u8, data: *u8[n], n: usize }",
        |file, interner| {
            let StmtKind::TypeDeclaration { ty, .. } = &file.statements[0].kind else {
                panic!("expected a declaration");
            };
            let TypeKind::Struct { fields, .. } = &ty.kind else {
                panic!("expected a struct");
            };
            assert_eq!(
                fields[0].ty.modifiers,
                vec![TypeModifier::Array(ArraySize::Literal(4))]
            );
            assert_eq!(
                fields[1].ty.modifiers,
                vec![TypeModifier::Pointer, TypeModifier::Array(ArraySize::Unsized)]
            );
            match fields[2].ty.modifiers.as_slice() {
                [TypeModifier::Pointer, TypeModifier::Array(ArraySize::Reference(name))] => {
                    assert_eq!(interner.resolve(*name), "n");
                }
                other => panic!("unexpected modifiers: {:?}", other),
            }
        },
    );
}

#[test]
fn binding_with_and_without_annotation() {
    with_parsed(
        "fn f() -> void { x: i32 = 1; y = 2; return x; }",
        |file, interner| {
            let body = fn_body(file, 0);
            let StmtKind::Binding {
                name, annotation, ..
            } = &body[0].kind
            else {
                panic!("expected a binding");
            };
            assert_eq!(interner.resolve(*name), "x");
            assert!(annotation.is_some());

            let StmtKind::Binding { annotation, .. } = &body[1].kind else {
                panic!("expected a binding");
            };
            assert!(annotation.is_none());
        },
    );
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    with_parsed("fn f() -> i32 { return a + b * c; }", |file, _| {
        let body = fn_body(file, 0);
        let StmtKind::Return(expr) = &body[0].kind else {
            panic!("expected a return");
        };
        let ExprKind::Binary { op, right, .. } = &expr.kind else {
            panic!("expected a binary expression");
        };
        assert_eq!(*op, BinaryOp::Add);
        let ExprKind::Binary { op, .. } = &right.kind else {
            panic!("expected the right operand to be a product");
        };
        assert_eq!(*op, BinaryOp::Multiply);
    });
}

#[test]
fn comparison_binds_tighter_than_logical() {
    with_parsed("fn f() -> bool { return a < b && c > d; }", |file, _| {
        let body = fn_body(file, 0);
        let StmtKind::Return(expr) = &body[0].kind else {
            panic!("expected a return");
        };
        let ExprKind::Binary { op, left, right } = &expr.kind else {
            panic!("expected a binary expression");
        };
        assert_eq!(*op, BinaryOp::And);
        assert!(matches!(
            left.kind,
            ExprKind::Binary { op: BinaryOp::Less, .. }
        ));
        assert!(matches!(
            right.kind,
            ExprKind::Binary { op: BinaryOp::Greater, .. }
        ));
    });
}

#[test]
fn doubled_eq_is_equality_and_single_eq_is_not_an_operator() {
    with_parsed("fn f() -> bool { return a == b; }", |file, _| {
        let body = fn_body(file, 0);
        let StmtKind::Return(expr) = &body[0].kind else {
            panic!("expected a return");
        };
        assert!(matches!(
            expr.kind,
            ExprKind::Binary { op: BinaryOp::Eq, .. }
        ));
    });
}

#[test]
fn single_ampersand_is_bitwise_and_doubled_is_logical() {
    with_parsed("fn f() -> i32 { return a & b; }", |file, _| {
        let body = fn_body(file, 0);
        let StmtKind::Return(expr) = &body[0].kind else {
            panic!("expected a return");
        };
        assert!(matches!(
            expr.kind,
            ExprKind::Binary { op: BinaryOp::BitAnd, .. }
        ));
    });
    with_parsed("fn f() -> bool { return a && b; }", |file, _| {
        let body = fn_body(file, 0);
        let StmtKind::Return(expr) = &body[0].kind else {
            panic!("expected a return");
        };
        assert!(matches!(
            expr.kind,
            ExprKind::Binary { op: BinaryOp::And, .. }
        ));
    });
}

#[test]
fn member_access_is_a_dedicated_left_associative_node() {
    with_parsed("fn f() -> i32 { return p.inner.x; }", |file, interner| {
        let body = fn_body(file, 0);
        let StmtKind::Return(expr) = &body[0].kind else {
            panic!("expected a return");
        };
        let ExprKind::Member { base, field } = &expr.kind else {
            panic!("expected member access");
        };
        assert_eq!(interner.resolve(*field), "x");
        let ExprKind::Member { field, .. } = &base.kind else {
            panic!("expected nested member access");
        };
        assert_eq!(interner.resolve(*field), "inner");
    });
}

#[test]
fn unary_operators_nest_and_bind_tighter_than_binary() {
    with_parsed("fn f() -> i32 { return -a * !*b; }", |file, _| {
        let body = fn_body(file, 0);
        let StmtKind::Return(expr) = &body[0].kind else {
            panic!("expected a return");
        };
        let ExprKind::Binary { op, left, right } = &expr.kind else {
            panic!("expected a product");
        };
        assert_eq!(*op, BinaryOp::Multiply);
        assert!(matches!(
            left.kind,
            ExprKind::Unary { op: UnaryOp::Negate, .. }
        ));
        let ExprKind::Unary { op, operand } = &right.kind else {
            panic!("expected unary");
        };
        assert_eq!(*op, UnaryOp::Not);
        assert!(matches!(
            operand.kind,
            ExprKind::Unary { op: UnaryOp::Deref, .. }
        ));
    });
}

#[test]
fn grouping_overrides_precedence() {
    with_parsed("fn f() -> i32 { return (a + b) * c; }", |file, _| {
        let body = fn_body(file, 0);
        let StmtKind::Return(expr) = &body[0].kind else {
            panic!("expected a return");
        };
        let ExprKind::Binary { op, left, .. } = &expr.kind else {
            panic!("expected a product");
        };
        assert_eq!(*op, BinaryOp::Multiply);
        assert!(matches!(left.kind, ExprKind::Group(_)));
    });
}

#[test]
fn calls_take_zero_or_more_arguments() {
    with_parsed("fn f() -> i32 { a = g(); b = g(1, x, h(2)); return b; }", |file, _| {
        let body = fn_body(file, 0);
        let StmtKind::Binding { value, .. } = &body[0].kind else {
            panic!("expected a binding");
        };
        let ExprKind::Call { args, .. } = &value.kind else {
            panic!("expected a call");
        };
        assert!(args.is_empty());

        let StmtKind::Binding { value, .. } = &body[1].kind else {
            panic!("expected a binding");
        };
        let ExprKind::Call { args, .. } = &value.kind else {
            panic!("expected a call");
        };
        assert_eq!(args.len(), 3);
        assert!(matches!(args[2].kind, ExprKind::Call { .. }));
    });
}

#[test]
fn struct_literals_parse_in_expression_position() {
    with_parsed(
        "fn f() -> struct Point { return struct Point { x = 1, y = 2 }; }",
        |file, interner| {
            let body = fn_body(file, 0);
            let StmtKind::Return(expr) = &body[0].kind else {
                panic!("expected a return");
            };
            let ExprKind::Literal(Literal::Struct { name, inits }) = &expr.kind else {
                panic!("expected a struct literal");
            };
            assert_eq!(interner.resolve(*name), "Point");
            assert_eq!(inits.len(), 2);
        },
    );
}

#[test]
fn underscore_is_a_hole() {
    with_parsed("fn f() -> i32 { return g(_); }", |file, _| {
        let body = fn_body(file, 0);
        let StmtKind::Return(expr) = &body[0].kind else {
            panic!("expected a return");
        };
        let ExprKind::Call { args, .. } = &expr.kind else {
            panic!("expected a call");
        };
        assert!(matches!(args[0].kind, ExprKind::Literal(Literal::Hole)));
    });
}

#[test]
fn if_else_chains_parse() {
    with_parsed(
        "fn f() -> i32 { if (a) { return 1; } else if (b) { return 2; } else { return 3; } }",
        |file, _| {
            let body = fn_body(file, 0);
            let StmtKind::If { else_branch, .. } = &body[0].kind else {
                panic!("expected an if");
            };
            let nested = else_branch.expect("should have an else");
            let StmtKind::If { else_branch, .. } = &nested.kind else {
                panic!("else should chain into another if");
            };
            assert!(else_branch.is_some());
        },
    );
}

#[test]
fn while_loops_and_break_parse() {
    with_parsed("fn f() -> void { while (c) { break; } return x; }", |file, _| {
        let body = fn_body(file, 0);
        let StmtKind::While { body: loop_body, .. } = &body[0].kind else {
            panic!("expected a while");
        };
        let StmtKind::Block(inner) = &loop_body.kind else {
            panic!("loop body should be a block");
        };
        assert!(matches!(inner[0].kind, StmtKind::Break));
    });
}

#[test]
fn switch_parses_each_pattern_form() {
    with_parsed(
        "fn f() -> void { switch (x) { \
           case 1: { break; } \
           case \"s\": { break; } \
           case [1, ..]: { break; } \
           case { a: 1, .. }: { break; } \
           case v: { break; } \
           case _: { break; } \
         } return y; }",
        |file, _| {
            let body = fn_body(file, 0);
            let StmtKind::Switch { cases, .. } = &body[0].kind else {
                panic!("expected a switch");
            };
            assert_eq!(cases.len(), 6);
            assert!(matches!(cases[0].pattern, Pattern::Number(_)));
            assert!(matches!(cases[1].pattern, Pattern::Str(_)));
            match &cases[2].pattern {
                Pattern::Array(items) => {
                    assert!(matches!(items[0], Pattern::Number(_)));
                    assert!(matches!(items[1], Pattern::Rest));
                }
                other => panic!("expected an array pattern, got {:?}", other),
            }
            assert!(matches!(cases[3].pattern, Pattern::Object(_)));
            assert!(matches!(cases[4].pattern, Pattern::Variable(_)));
            assert!(matches!(cases[5].pattern, Pattern::Underscore));
        },
    );
}

#[test]
fn include_statements_parse_in_both_forms() {
    with_parsed("# include <stdio.h> # include \"local.h\"", |file, _| {
        let StmtKind::Include { path, external } = &file.statements[0].kind else {
            panic!("expected an include");
        };
        assert_eq!(path, "stdio.h");
        assert!(external);

        let StmtKind::Include { path, external } = &file.statements[1].kind else {
            panic!("expected an include");
        };
        assert_eq!(path, "local.h");
        assert!(!external);
    });
}

#[test]
fn every_statement_gets_position_metadata() {
    with_parsed("fn f() -> i32 { x = 1; return x; }", |file, _| {
        let body = fn_body(file, 0);
        let binding_pos = file.position_of(body[0].id);
        let return_pos = file.position_of(body[1].id);
        assert_eq!(binding_pos.row, 1);
        assert!(binding_pos.col < return_pos.col);
    });
}

#[test]
fn missing_annotation_after_colon_is_fatal() {
    let diag = parse_error("fn f() -> void { x: = 5; return x; }");
    assert!(diag.message.contains("type annotation is required"));
}

#[test]
fn missing_eq_in_binding_is_fatal() {
    let diag = parse_error("fn f() -> void { x 5; return x; }");
    assert!(diag.message.contains("expected a `=`"));
}

#[test]
fn missing_semicolon_is_fatal() {
    let diag = parse_error("fn f() -> void { x = 5 return x; }");
    assert!(diag.message.contains("semicolon"));
}

#[test]
fn bad_binding_value_is_fatal_and_names_the_variable() {
    let diag = parse_error("fn f() -> void { x = ; }");
    assert!(diag.message.contains("`x`"));
    assert!(diag.message.contains("valid expression"));
}

#[test]
fn binding_failures_chain_the_inner_cause() {
    let diag = parse_error("fn f() -> void { x = (1; }");
    assert!(diag.message.contains("`x` must be bound"));
    let inner = diag.inner.as_deref().expect("should carry the inner cause");
    assert!(inner.message.contains("closing `)`"));
}

#[test]
fn unclosed_block_is_fatal() {
    let diag = parse_error("fn f() -> void { x = 5;");
    assert!(diag.message.contains("`}`") || diag.message.contains("statement"));
}

#[test]
fn top_level_garbage_is_fatal() {
    let diag = parse_error("notatype");
    assert!(diag.message.contains("top level"));
}

#[test]
fn function_declaration_without_body_is_fatal() {
    let diag = parse_error("fn f() -> i32");
    assert!(diag.message.contains("body"));
}
