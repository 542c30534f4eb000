use crate::convert::Converter;
use crate::error::TypeKindError;
use crate::value::Value;

/// Pre-flight validation hook, run once at the start of every
/// [`Converter::convert`] call.
///
/// The provided method body is the base check: the value's runtime type
/// must be terminal, handler-registered, or covered by a default handler.
/// Extending implementations chain to the base explicitly via
/// [`Converter::check_reducible`], then add their own checks.
pub trait Validate: Send + Sync {
    fn assert_type(&self, cx: &Converter, value: &Value) -> Result<(), TypeKindError> {
        cx.check_reducible(value)
    }
}

/// Base behavior: top-level check only.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShallowValidate;

impl Validate for ShallowValidate {}

/// Eager recursive variant: also walks sequence elements and map
/// keys/values, so a deeply nested unconvertible value fails before any
/// handler runs instead of midway through a handler's own recursion.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeepValidate;

impl Validate for DeepValidate {
    fn assert_type(&self, cx: &Converter, value: &Value) -> Result<(), TypeKindError> {
        cx.check_reducible(value)?;
        match value {
            Value::List(items) | Value::Tuple(items) => {
                for item in items {
                    self.assert_type(cx, item)?;
                }
            }
            Value::Map(entries) => {
                for (key, val) in entries {
                    self.assert_type(cx, key)?;
                    self.assert_type(cx, val)?;
                }
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::TypeTag;

    struct Opaque;

    fn nested_bad() -> Value {
        // An unconvertible foreign value two levels down.
        Value::List(vec![
            "ok".into(),
            Value::Tuple(vec![Value::foreign(Opaque)]),
        ])
    }

    #[test]
    fn shallow_check_stops_at_the_top_level() {
        let mut conv = Converter::new([TypeTag::Str]);
        conv.handle([TypeTag::List, TypeTag::Tuple], |_, _| Ok(Value::Str(String::new())));

        assert!(conv.assert_type(&nested_bad()).is_ok());
    }

    #[test]
    fn deep_check_rejects_nested_unconvertible() {
        let mut conv = Converter::new([TypeTag::Str]);
        conv.handle([TypeTag::List, TypeTag::Tuple], |_, _| Ok(Value::Str(String::new())));
        let conv = conv.with_validator(DeepValidate);

        let err = conv.assert_type(&nested_bad()).unwrap_err();
        assert!(matches!(err, TypeKindError::Unconvertible { .. }));
    }

    #[test]
    fn deep_check_walks_map_keys_and_values() {
        let conv = Converter::new([TypeTag::Map, TypeTag::Str]).with_validator(DeepValidate);

        let bad_key = Value::Map(vec![(Value::foreign(Opaque), "v".into())]);
        assert!(conv.assert_type(&bad_key).is_err());

        let bad_value = Value::Map(vec![("k".into(), Value::foreign(Opaque))]);
        assert!(conv.assert_type(&bad_value).is_err());

        let fine = Value::Map(vec![("k".into(), "v".into())]);
        assert!(conv.assert_type(&fine).is_ok());
    }

    #[test]
    fn deep_check_accepts_default_covered_leaves() {
        let mut conv = Converter::new([TypeTag::Str]).with_validator(DeepValidate);
        conv.handle([TypeTag::List], |_, _| Ok(Value::Str(String::new())));
        // No handler for the foreign leaf, but the default covers it.
        conv.set_default(|_, v| Ok(Value::Str(v.to_string())));

        assert!(conv.assert_type(&nested_bad()).is_ok());
    }
}
