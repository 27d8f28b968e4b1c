use crate::intern::Symbol;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Void,
    Bool,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    Usize,
    F32,
    F64,
}

impl Primitive {
    pub fn from_name(name: &str) -> Option<Primitive> {
        let primitive = match name {
            "void" => Primitive::Void,
            "bool" => Primitive::Bool,
            "i8" => Primitive::I8,
            "u8" => Primitive::U8,
            "i16" => Primitive::I16,
            "u16" => Primitive::U16,
            "i32" => Primitive::I32,
            "u32" => Primitive::U32,
            "i64" => Primitive::I64,
            "u64" => Primitive::U64,
            "usize" => Primitive::Usize,
            "f32" => Primitive::F32,
            "f64" => Primitive::F64,
            _ => return None,
        };
        Some(primitive)
    }

    pub fn name(self) -> &'static str {
        match self {
            Primitive::Void => "void",
            Primitive::Bool => "bool",
            Primitive::I8 => "i8",
            Primitive::U8 => "u8",
            Primitive::I16 => "i16",
            Primitive::U16 => "u16",
            Primitive::I32 => "i32",
            Primitive::U32 => "u32",
            Primitive::I64 => "i64",
            Primitive::U64 => "u64",
            Primitive::Usize => "usize",
            Primitive::F32 => "f32",
            Primitive::F64 => "f64",
        }
    }

    /// The C spelling of the primitive. `bool` maps to `char`; the
    /// 16-bit types widen to `int` like the 32-bit ones.
    pub fn c_name(self) -> &'static str {
        match self {
            Primitive::Void => "void",
            Primitive::Bool => "char",
            Primitive::I8 => "char",
            Primitive::U8 => "unsigned char",
            Primitive::I16 => "int",
            Primitive::U16 => "unsigned int",
            Primitive::I32 => "int",
            Primitive::U32 => "unsigned int",
            Primitive::I64 => "long",
            Primitive::U64 => "unsigned long",
            Primitive::Usize => "size_t",
            Primitive::F32 => "float",
            Primitive::F64 => "double",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArraySize {
    /// `[4]`
    Literal(usize),
    /// `[n]` where `n` names a sibling `usize` field
    Reference(Symbol),
    /// `[]`; only valid directly under a pointer modifier
    Unsized,
}

/// One outside-in type qualifier. Modifiers compose in declaration
/// order on the declared name: `*u8[]` is a pointer to an unsized
/// array of bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeModifier {
    Pointer,
    Nullable,
    Array(ArraySize),
    Mutable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: Symbol,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Primitive(Primitive),
    Struct {
        name: Symbol,
        fields: Vec<Field>,
        /// A reference-only mention (`struct Point` with no body); the
        /// definition lives in the global table.
        predefined: bool,
    },
    Enum {
        name: Symbol,
        variants: Vec<Field>,
        predefined: bool,
    },
    Function {
        name: Option<Symbol>,
        params: Vec<Field>,
        return_type: Box<Type>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Type {
    pub kind: TypeKind,
    pub modifiers: Vec<TypeModifier>,
}

impl Type {
    pub fn new(kind: TypeKind) -> Self {
        Type {
            kind,
            modifiers: Vec::new(),
        }
    }

    pub fn with_modifiers(kind: TypeKind, modifiers: Vec<TypeModifier>) -> Self {
        Type { kind, modifiers }
    }

    pub fn primitive(primitive: Primitive) -> Self {
        Type::new(TypeKind::Primitive(primitive))
    }

    /// The declared name of a struct, enum, or named function type.
    pub fn name(&self) -> Option<Symbol> {
        match &self.kind {
            TypeKind::Primitive(_) => None,
            TypeKind::Struct { name, .. } | TypeKind::Enum { name, .. } => Some(*name),
            TypeKind::Function { name, .. } => *name,
        }
    }

    /// True if the outermost modifier is a pointer. Member access on
    /// such a value lowers to `->` in C.
    pub fn has_outer_pointer(&self) -> bool {
        matches!(self.modifiers.first(), Some(TypeModifier::Pointer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_names_round_trip() {
        for primitive in [
            Primitive::Void,
            Primitive::Bool,
            Primitive::I8,
            Primitive::U8,
            Primitive::I16,
            Primitive::U16,
            Primitive::I32,
            Primitive::U32,
            Primitive::I64,
            Primitive::U64,
            Primitive::Usize,
            Primitive::F32,
            Primitive::F64,
        ] {
            assert_eq!(Primitive::from_name(primitive.name()), Some(primitive));
        }
    }

    #[test]
    fn unknown_primitive_name_is_rejected() {
        assert_eq!(Primitive::from_name("int"), None);
        assert_eq!(Primitive::from_name("usize_t"), None);
    }

    #[test]
    fn sixteen_bit_types_widen_to_int_in_c() {
        assert_eq!(Primitive::I16.c_name(), "int");
        assert_eq!(Primitive::U16.c_name(), "unsigned int");
    }

    #[test]
    fn outer_pointer_looks_at_first_modifier_only() {
        let mut ty = Type::primitive(Primitive::U8);
        assert!(!ty.has_outer_pointer());

        ty.modifiers = vec![TypeModifier::Pointer, TypeModifier::Array(ArraySize::Unsized)];
        assert!(ty.has_outer_pointer());

        ty.modifiers = vec![TypeModifier::Array(ArraySize::Literal(4)), TypeModifier::Pointer];
        assert!(!ty.has_outer_pointer());
    }

    #[test]
    fn named_types_report_their_name() {
        let plain = Type::primitive(Primitive::Bool);
        assert_eq!(plain.name(), None);

        let mut interner = crate::intern::Interner::new();
        let sym = interner.intern("Point");
        let ty = Type::new(TypeKind::Struct {
            name: sym,
            fields: Vec::new(),
            predefined: true,
        });
        assert_eq!(ty.name(), Some(sym));
    }
}
