//! Value-level model of the conversions generated adapters perform.
//!
//! A sequence crossing into the simplified representation becomes an
//! element buffer plus a separate length; crossing back it becomes a
//! self-describing sequence again. Strings become NUL-terminated on the
//! simplified side, so they may not contain NUL themselves.

use crate::error::MarshalError;
use ccigen_tree::TypeDesc;

/// A single non-sequence value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Boolean(bool),
    Octet(u8),
    Short(i16),
    UShort(u16),
    Long(i32),
    ULong(u32),
    LongLong(i64),
    ULongLong(u64),
    Float(f32),
    Double(f64),
    Char(u8),
    WChar(char),
    String(String),
    WString(String),
    /// Enumerator ordinal.
    Enum(u32),
    /// Repository id of the referenced object; `None` is the nil reference.
    Object(Option<String>),
}

/// A value in the distributed-object representation.
#[derive(Debug, Clone, PartialEq)]
pub enum ForeignValue {
    Scalar(Scalar),
    /// Self-describing sequence.
    Sequence(Vec<Scalar>),
}

/// A value in the simplified representation.
#[derive(Debug, Clone, PartialEq)]
pub enum LocalValue {
    Scalar(Scalar),
    /// Element buffer with its separately passed length.
    Sequence {
        /// Length passed alongside the buffer.
        length: u32,
        /// Buffer contents.
        items: Vec<Scalar>,
    },
}

/// Converts a distributed-object value to its simplified counterpart.
///
/// # Errors
/// Returns `MarshalError` if the value does not fit `ty`.
pub fn foreign_to_local(ty: &TypeDesc, value: &ForeignValue) -> Result<LocalValue, MarshalError> {
    match (ty, value) {
        (TypeDesc::Sequence { element, .. }, ForeignValue::Sequence(items)) => {
            check_element(element)?;
            let length = u32::try_from(items.len())
                .map_err(|_| MarshalError::TooLong { actual: items.len() })?;
            for item in items {
                check_scalar(element, item)?;
            }
            Ok(LocalValue::Sequence {
                length,
                items: items.clone(),
            })
        }
        (TypeDesc::Sequence { .. }, _) => Err(MarshalError::mismatch(ty.idl_name())),
        (_, ForeignValue::Scalar(scalar)) => {
            check_scalar(ty, scalar)?;
            Ok(LocalValue::Scalar(scalar.clone()))
        }
        (_, ForeignValue::Sequence(_)) => Err(MarshalError::mismatch(ty.idl_name())),
    }
}

/// Converts a simplified value back to the distributed-object side.
///
/// # Errors
/// Returns `MarshalError` if the value does not fit `ty` or a sequence's
/// length disagrees with its buffer.
pub fn local_to_foreign(ty: &TypeDesc, value: &LocalValue) -> Result<ForeignValue, MarshalError> {
    match (ty, value) {
        (TypeDesc::Sequence { element, .. }, LocalValue::Sequence { length, items }) => {
            check_element(element)?;
            if usize::try_from(*length).ok() != Some(items.len()) {
                return Err(MarshalError::LengthMismatch {
                    declared: *length,
                    actual: items.len(),
                });
            }
            for item in items {
                check_scalar(element, item)?;
            }
            Ok(ForeignValue::Sequence(items.clone()))
        }
        (TypeDesc::Sequence { .. }, _) => Err(MarshalError::mismatch(ty.idl_name())),
        (_, LocalValue::Scalar(scalar)) => {
            check_scalar(ty, scalar)?;
            Ok(ForeignValue::Scalar(scalar.clone()))
        }
        (_, LocalValue::Sequence { .. }) => Err(MarshalError::mismatch(ty.idl_name())),
    }
}

fn check_element(element: &TypeDesc) -> Result<(), MarshalError> {
    match element {
        TypeDesc::Sequence { .. } | TypeDesc::Void => Err(MarshalError::Unsupported {
            type_name: element.idl_name(),
        }),
        _ => Ok(()),
    }
}

fn check_scalar(ty: &TypeDesc, scalar: &Scalar) -> Result<(), MarshalError> {
    let matches = match (ty, scalar) {
        (TypeDesc::Void | TypeDesc::Sequence { .. }, _) => {
            return Err(MarshalError::Unsupported {
                type_name: ty.idl_name(),
            });
        }
        (TypeDesc::String, Scalar::String(s)) | (TypeDesc::WString, Scalar::WString(s)) => {
            if s.contains('\0') {
                return Err(MarshalError::InteriorNul);
            }
            true
        }
        (TypeDesc::Boolean, Scalar::Boolean(_))
        | (TypeDesc::Octet, Scalar::Octet(_))
        | (TypeDesc::Short, Scalar::Short(_))
        | (TypeDesc::UShort, Scalar::UShort(_))
        | (TypeDesc::Long, Scalar::Long(_))
        | (TypeDesc::ULong, Scalar::ULong(_))
        | (TypeDesc::LongLong, Scalar::LongLong(_))
        | (TypeDesc::ULongLong, Scalar::ULongLong(_))
        | (TypeDesc::Float, Scalar::Float(_))
        | (TypeDesc::Double, Scalar::Double(_))
        | (TypeDesc::Char, Scalar::Char(_))
        | (TypeDesc::WChar, Scalar::WChar(_))
        | (TypeDesc::Enum(_), Scalar::Enum(_))
        | (TypeDesc::Interface(_), Scalar::Object(_)) => true,
        _ => false,
    };
    if matches {
        Ok(())
    } else {
        Err(MarshalError::mismatch(ty.idl_name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccigen_tree::ScopedName;

    fn seq_of(element: TypeDesc) -> TypeDesc {
        TypeDesc::Sequence {
            name: ScopedName::parse("m::Seq"),
            element: Box::new(element),
        }
    }

    #[test]
    fn test_sequence_gains_length() {
        let ty = seq_of(TypeDesc::Long);
        let value = ForeignValue::Sequence(vec![Scalar::Long(1), Scalar::Long(2)]);
        let local = foreign_to_local(&ty, &value).unwrap();
        assert_eq!(
            local,
            LocalValue::Sequence {
                length: 2,
                items: vec![Scalar::Long(1), Scalar::Long(2)],
            }
        );
    }

    #[test]
    fn test_empty_sequence() {
        let ty = seq_of(TypeDesc::String);
        let local = foreign_to_local(&ty, &ForeignValue::Sequence(Vec::new())).unwrap();
        assert_eq!(
            local,
            LocalValue::Sequence {
                length: 0,
                items: Vec::new(),
            }
        );
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let ty = seq_of(TypeDesc::Octet);
        let value = LocalValue::Sequence {
            length: 3,
            items: vec![Scalar::Octet(1)],
        };
        assert_eq!(
            local_to_foreign(&ty, &value),
            Err(MarshalError::LengthMismatch {
                declared: 3,
                actual: 1,
            })
        );
    }

    #[test]
    fn test_interior_nul_rejected() {
        let value = ForeignValue::Scalar(Scalar::String("a\0b".to_string()));
        assert_eq!(
            foreign_to_local(&TypeDesc::String, &value),
            Err(MarshalError::InteriorNul)
        );
    }

    #[test]
    fn test_nil_reference_passes_through() {
        let ty = TypeDesc::Interface(ScopedName::parse("dom::Node"));
        let value = LocalValue::Scalar(Scalar::Object(None));
        assert_eq!(
            local_to_foreign(&ty, &value).unwrap(),
            ForeignValue::Scalar(Scalar::Object(None))
        );
    }

    #[test]
    fn test_shape_mismatch() {
        let err = foreign_to_local(&TypeDesc::Long, &ForeignValue::Scalar(Scalar::Short(1)))
            .unwrap_err();
        assert!(matches!(err, MarshalError::TypeMismatch { .. }));
        let err = foreign_to_local(&seq_of(TypeDesc::Long), &ForeignValue::Scalar(Scalar::Long(1)))
            .unwrap_err();
        assert!(matches!(err, MarshalError::TypeMismatch { .. }));
    }

    #[test]
    fn test_unsupported_types() {
        let nested = seq_of(seq_of(TypeDesc::Long));
        let err = foreign_to_local(&nested, &ForeignValue::Sequence(Vec::new())).unwrap_err();
        assert!(matches!(err, MarshalError::Unsupported { .. }));
        let err = foreign_to_local(&TypeDesc::Void, &ForeignValue::Scalar(Scalar::Long(0)))
            .unwrap_err();
        assert!(matches!(err, MarshalError::Unsupported { .. }));
    }
}
