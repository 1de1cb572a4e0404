//! Type and attribute mapping shared by both directions

use pin_dialect::{InlineHint, Linkage, Type};
use pin_native as native;
use native::IrType;
use crate::TranslateError;

pub(crate) fn type_to_dialect(ty: &IrType) -> Type {
    match ty {
        IrType::Void => Type::Void,
        IrType::I1 => Type::Bool,
        IrType::I8 => Type::int(8),
        IrType::I16 => Type::int(16),
        IrType::I32 => Type::int(32),
        IrType::I64 => Type::int(64),
        IrType::Ptr(pointee) => Type::Ptr(Box::new(type_to_dialect(pointee))),
        IrType::Array { size, element_type } => Type::Array {
            len: *size,
            elem: Box::new(type_to_dialect(element_type)),
        },
        IrType::Function { return_type, param_types, is_vararg } => Type::Func {
            ret: Box::new(type_to_dialect(return_type)),
            params: param_types.iter().map(type_to_dialect).collect(),
            vararg: *is_vararg,
        },
        IrType::Struct { name, fields, packed } => Type::Struct {
            name: name.clone(),
            fields: fields.iter().map(type_to_dialect).collect(),
            packed: *packed,
        },
        IrType::Label => Type::Label,
    }
}

pub(crate) fn type_from_dialect(ty: &Type) -> Result<IrType, TranslateError> {
    Ok(match ty {
        Type::Void => IrType::Void,
        Type::Bool => IrType::I1,
        Type::Int { bits: 8 } => IrType::I8,
        Type::Int { bits: 16 } => IrType::I16,
        Type::Int { bits: 32 } => IrType::I32,
        Type::Int { bits: 64 } => IrType::I64,
        Type::Int { bits } => return Err(TranslateError::InvalidType { bits: *bits }),
        Type::Ptr(pointee) => IrType::Ptr(Box::new(type_from_dialect(pointee)?)),
        Type::Array { len, elem } => IrType::Array {
            size: *len,
            element_type: Box::new(type_from_dialect(elem)?),
        },
        Type::Func { ret, params, vararg } => IrType::Function {
            return_type: Box::new(type_from_dialect(ret)?),
            param_types: params.iter().map(type_from_dialect).collect::<Result<_, _>>()?,
            is_vararg: *vararg,
        },
        Type::Struct { name, fields, packed } => IrType::Struct {
            name: name.clone(),
            fields: fields.iter().map(type_from_dialect).collect::<Result<_, _>>()?,
            packed: *packed,
        },
        Type::Label => IrType::Label,
    })
}

pub(crate) fn hint_to_dialect(hint: native::InlineHint) -> InlineHint {
    match hint {
        native::InlineHint::None => InlineHint::None,
        native::InlineHint::Inline => InlineHint::Inline,
        native::InlineHint::AlwaysInline => InlineHint::AlwaysInline,
        native::InlineHint::NoInline => InlineHint::NoInline,
    }
}

pub(crate) fn hint_from_dialect(hint: InlineHint) -> native::InlineHint {
    match hint {
        InlineHint::None => native::InlineHint::None,
        InlineHint::Inline => native::InlineHint::Inline,
        InlineHint::AlwaysInline => native::InlineHint::AlwaysInline,
        InlineHint::NoInline => native::InlineHint::NoInline,
    }
}

pub(crate) fn linkage_to_dialect(linkage: native::Linkage) -> Linkage {
    match linkage {
        native::Linkage::External => Linkage::External,
        native::Linkage::Internal => Linkage::Internal,
        native::Linkage::Private => Linkage::Private,
    }
}

pub(crate) fn linkage_from_dialect(linkage: Linkage) -> native::Linkage {
    match linkage {
        Linkage::External => native::Linkage::External,
        Linkage::Internal => native::Linkage::Internal,
        Linkage::Private => native::Linkage::Private,
    }
}
