use super::{ParseResult, Parser};
use crate::ast::{ArraySize, Field, Primitive, Type, TypeKind, TypeModifier};
use crate::token::TokenKind;

/// Type grammar: a greedy run of outside-in modifiers followed by one
/// of `fn`, `struct`, `enum`, or a primitive name.
pub trait TypeParsing<'a> {
    fn parse_modifiers(&mut self) -> ParseResult<Vec<TypeModifier>>;
    fn parse_type(&mut self, named_fn: bool, predefined: bool) -> ParseResult<Option<Type>>;
    fn parse_field_list(&mut self) -> ParseResult<Option<Vec<Field>>>;
}

impl<'a, 'int> TypeParsing<'a> for Parser<'a, 'int> {
    fn parse_modifiers(&mut self) -> ParseResult<Vec<TypeModifier>> {
        let mut modifiers = Vec::new();
        loop {
            if self.eat(&TokenKind::Star) {
                modifiers.push(TypeModifier::Pointer);
                continue;
            }
            if self.eat(&TokenKind::Question) {
                modifiers.push(TypeModifier::Nullable);
                continue;
            }
            if self.eat(&TokenKind::Mut) {
                modifiers.push(TypeModifier::Mutable);
                continue;
            }
            if self.check(&TokenKind::OpenSquare) {
                if let Some(modifier) = self.try_parse(parse_array_modifier)? {
                    modifiers.push(modifier);
                    continue;
                }
            }
            break;
        }
        Ok(modifiers)
    }

    fn parse_type(&mut self, named_fn: bool, predefined: bool) -> ParseResult<Option<Type>> {
        let checkpoint = self.checkpoint();
        let mut modifiers = self.parse_modifiers()?;

        let kind = if self.eat(&TokenKind::Fn) {
            parse_function_type(self, named_fn)?
        } else if self.eat(&TokenKind::Struct) {
            parse_struct_type(self, predefined)?
        } else if self.eat(&TokenKind::Enum) {
            parse_enum_type(self, predefined)?
        } else {
            parse_primitive_type(self)
        };

        let Some(kind) = kind else {
            self.restore(checkpoint);
            return Ok(None);
        };

        // Array modifiers may also trail the leaf type (`u8[n]`,
        // `*u8[]`); they compose after any prefix modifiers.
        while self.check(&TokenKind::OpenSquare) {
            match self.try_parse(parse_array_modifier)? {
                Some(modifier) => modifiers.push(modifier),
                None => break,
            }
        }

        Ok(Some(Type::with_modifiers(kind, modifiers)))
    }

    /// `name: type, name: type, ...` with at least one entry.
    fn parse_field_list(&mut self) -> ParseResult<Option<Vec<Field>>> {
        let mut fields = Vec::new();
        loop {
            let name = match self.eat_ident() {
                Some(name) => name,
                None => return Ok(None),
            };
            if !self.eat(&TokenKind::Colon) {
                return Ok(None);
            }
            let ty = match self.parse_type(false, true)? {
                Some(ty) => ty,
                None => return Ok(None),
            };
            fields.push(Field { name, ty });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        Ok(Some(fields))
    }
}

/// `[4]`, `[n]`, or `[]`.
fn parse_array_modifier<'a, 'int>(
    p: &mut Parser<'a, 'int>,
) -> ParseResult<Option<TypeModifier>> {
    if !p.eat(&TokenKind::OpenSquare) {
        return Ok(None);
    }
    let size = if let Some(n) = p.eat_numeric() {
        ArraySize::Literal(n as usize)
    } else if let Some(name) = p.eat_ident() {
        ArraySize::Reference(name)
    } else {
        ArraySize::Unsized
    };
    if !p.eat(&TokenKind::CloseSquare) {
        return Ok(None);
    }
    Ok(Some(TypeModifier::Array(size)))
}

fn parse_function_type<'a, 'int>(
    p: &mut Parser<'a, 'int>,
    named: bool,
) -> ParseResult<Option<TypeKind>> {
    let name = if named {
        match p.eat_ident() {
            Some(name) => Some(name),
            None => return Ok(None),
        }
    } else {
        None
    };

    if !p.eat(&TokenKind::OpenRound) {
        return Ok(None);
    }
    let params = if matches!(p.peek_kind(), Some(TokenKind::Ident(_))) {
        match p.parse_field_list()? {
            Some(params) => params,
            None => return Ok(None),
        }
    } else {
        Vec::new()
    };
    if !p.eat(&TokenKind::CloseRound) {
        return Ok(None);
    }
    if !p.eat(&TokenKind::RightArrow) {
        return Ok(None);
    }
    let return_type = match p.parse_type(false, true)? {
        Some(ty) => ty,
        None => return Ok(None),
    };

    Ok(Some(TypeKind::Function {
        name,
        params,
        return_type: Box::new(return_type),
    }))
}

fn parse_struct_type<'a, 'int>(
    p: &mut Parser<'a, 'int>,
    predefined: bool,
) -> ParseResult<Option<TypeKind>> {
    let name = match p.eat_ident() {
        Some(name) => name,
        None => return Ok(None),
    };

    let mut fields = Vec::new();
    if !predefined && p.eat(&TokenKind::OpenCurly) {
        fields = match p.parse_field_list()? {
            Some(fields) => fields,
            None => return Ok(None),
        };
        if !p.eat(&TokenKind::CloseCurly) {
            return Ok(None);
        }
    }

    Ok(Some(TypeKind::Struct {
        name,
        fields,
        predefined,
    }))
}

fn parse_enum_type<'a, 'int>(
    p: &mut Parser<'a, 'int>,
    predefined: bool,
) -> ParseResult<Option<TypeKind>> {
    let name = match p.eat_ident() {
        Some(name) => name,
        None => return Ok(None),
    };

    let mut variants = Vec::new();
    if !predefined && p.eat(&TokenKind::OpenCurly) {
        variants = match p.parse_field_list()? {
            Some(variants) => variants,
            None => return Ok(None),
        };
        if !p.eat(&TokenKind::CloseCurly) {
            return Ok(None);
        }
    }

    Ok(Some(TypeKind::Enum {
        name,
        variants,
        predefined,
    }))
}

fn parse_primitive_type<'a, 'int>(p: &mut Parser<'a, 'int>) -> Option<TypeKind> {
    let checkpoint = p.checkpoint();
    let name = p.eat_ident()?;
    match Primitive::from_name(p.interner.resolve(name)) {
        Some(primitive) => Some(TypeKind::Primitive(primitive)),
        None => {
            p.restore(checkpoint);
            None
        }
    }
}
