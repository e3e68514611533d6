//! Declarative binding between parameter names and typed record fields.
//!
//! A record type lists its fields with [`param_fields!`], pairing each field
//! with the parameter name it is stored under. The macro generates the struct
//! and a [`ParamFields`] implementation; every field type converts through
//! [`FieldValue`].
//!
//! Reading ignores parameters no field is bound to and gives absent fields
//! their default value. A value that is present but does not parse is a
//! [`FieldError`].

mod values;

use encoding_rs::Encoding;
use thiserror::Error;

use crate::params::{ParameterCollection, ParameterWriter, ValueError};

pub use values::{Color, Font, FontTable, MilCoord, Vertices};

/// A bound parameter held a value that could not be converted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("field {field}: {message}")]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    pub(crate) fn from_value(field: &[&str], err: ValueError) -> Self {
        Self::new(field.concat(), err.to_string())
    }
}

/// Conversion between parameter text and one field type.
pub trait FieldValue: Sized + Default + PartialEq {
    /// Read the field bound to `name`, or the default when it is absent.
    fn read_field(
        params: &ParameterCollection<'_>,
        name: &str,
        encoding: &'static Encoding,
    ) -> Result<Self, FieldError>;

    /// Append the parameters for this field.
    fn write_field(&self, name: &str, w: &mut ParameterWriter<'_>);

    #[inline]
    fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// A type whose fields map one-to-one onto named parameters.
pub trait ParamFields: Sized {
    /// Bound parameter names in declaration order.
    const PARAMS: &'static [&'static str];

    fn read_fields(
        params: &ParameterCollection<'_>,
        encoding: &'static Encoding,
    ) -> Result<Self, FieldError>;

    fn write_fields(&self, w: &mut ParameterWriter<'_>);
}

/// Write one field, leaving it out when the dialect omits defaults.
#[inline]
pub fn write_value<T: FieldValue>(value: &T, name: &str, w: &mut ParameterWriter<'_>) {
    if w.omits_defaults() && value.is_default() {
        return;
    }
    value.write_field(name, w);
}

/// Declare a struct whose fields are bound to parameter names.
///
/// ```ignore
/// param_fields! {
///     pub struct Sizes {
///         pub width: Coord = "WIDTH",
///         pub solid: bool = "ISSOLID",
///     }
/// }
/// ```
macro_rules! param_fields {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $fvis:vis $field:ident : $ty:ty = $param:literal
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        $vis struct $name {
            $( $(#[$fmeta])* $fvis $field: $ty, )*
        }

        impl $crate::mapping::ParamFields for $name {
            const PARAMS: &'static [&'static str] = &[$($param),*];

            #[allow(unused_variables)]
            fn read_fields(
                params: &$crate::params::ParameterCollection<'_>,
                encoding: &'static encoding_rs::Encoding,
            ) -> ::std::result::Result<Self, $crate::mapping::FieldError> {
                Ok(Self {
                    $( $field: $crate::mapping::FieldValue::read_field(params, $param, encoding)?, )*
                })
            }

            #[allow(unused_variables)]
            fn write_fields(&self, w: &mut $crate::params::ParameterWriter<'_>) {
                $( $crate::mapping::write_value(&self.$field, $param, w); )*
            }
        }
    };
}

pub(crate) use param_fields;

/// Declare an enum stored as an integer parameter.
///
/// Values without a named variant are kept in `Other` so they survive a
/// rewrite. The default is whatever `0` maps to.
macro_rules! int_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $value:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant, )+
            /// A value with no named variant
            Other(i32),
        }

        impl From<i32> for $name {
            fn from(value: i32) -> Self {
                match value {
                    $( $value => $name::$variant, )+
                    other => $name::Other(other),
                }
            }
        }

        impl From<$name> for i32 {
            fn from(value: $name) -> i32 {
                match value {
                    $( $name::$variant => $value, )+
                    $name::Other(other) => other,
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::from(0)
            }
        }

        impl $crate::mapping::FieldValue for $name {
            fn read_field(
                params: &$crate::params::ParameterCollection<'_>,
                name: &str,
                encoding: &'static encoding_rs::Encoding,
            ) -> ::std::result::Result<Self, $crate::mapping::FieldError> {
                <i32 as $crate::mapping::FieldValue>::read_field(params, name, encoding).map($name::from)
            }

            fn write_field(&self, name: &str, w: &mut $crate::params::ParameterWriter<'_>) {
                w.int(&[name], i64::from(i32::from(*self)));
            }

            fn is_default(&self) -> bool {
                i32::from(*self) == 0
            }
        }
    };
}

pub(crate) use int_enum;
