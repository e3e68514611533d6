//! The `|NAME=VALUE|...` parameter text carried inside record blocks.
//!
//! Tokens are separated by a level-dependent delimiter (`|` for records,
//! `` ` `` for lists nested in a value). Each non-empty segment splits at its
//! first `=`; trailing whitespace, line breaks and NULs are trimmed from the
//! value, and a leading `%UTF8%` marks the value as UTF-8 rather than the
//! file codepage. Names compare case-insensitively and the first occurrence
//! of a duplicate name wins.
//!
//! Parsing borrows from the input; [`OwnedParameters`] is the decoded form
//! used for pass-through.

mod owned;
mod parser;
mod writer;

pub use owned::{OwnedParameter, OwnedParameters};
pub use parser::{
    Parameter, ParameterCollection, ParameterLevel, Tokens, UTF8_MARKER, ValueError,
};
pub(crate) use parser::parse_bool;
pub use writer::{Dialect, ParameterWriter};
