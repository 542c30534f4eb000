//! Chained-reduction value conversion.
//!
//! A [`Converter`] holds a caller-declared set of terminal types and a
//! registry of per-type reduction handlers. [`Converter::convert`] reduces
//! its input one handler at a time until the current value's runtime tag
//! lands in the terminal set. Each handler only needs to return something
//! closer to a terminal type; the loop resolves the rest.

pub mod convert;
pub mod error;
pub mod tag;
pub mod validate;
pub mod value;

pub use convert::{Converter, ReduceFn};
pub use error::TypeKindError;
pub use tag::{TerminalSet, TypeClass, TypeSpec, TypeTag};
pub use validate::{DeepValidate, ShallowValidate, Validate};
pub use value::{Foreign, Value};
