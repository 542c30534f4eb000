use std::collections::HashMap;
use std::sync::Arc;

use crate::error::TypeKindError;
use crate::tag::{TerminalSet, TypeSpec, TypeTag};
use crate::validate::{ShallowValidate, Validate};
use crate::value::Value;

/// Reduction handler: transforms a value of one type into another value,
/// closer to a terminal type. Receives the converter so it can recurse
/// with `cx.convert(...)` for contained values.
pub type ReduceFn = dyn Fn(&Converter, Value) -> Result<Value, TypeKindError> + Send + Sync;

/// The conversion engine.
///
/// Holds the terminal set declared at construction, a registry mapping an
/// exact runtime tag to a reduction handler, an optional catch-all
/// default, and the installed validation hook. [`Converter::convert`]
/// reduces its input one handler invocation at a time until the current
/// value's tag is terminal.
///
/// No internal synchronization: registration takes `&mut self`, conversion
/// `&self`. A host that mutates the registry from several threads wraps
/// the converter in a lock of its choosing.
pub struct Converter {
    terminals: TerminalSet,
    handlers: HashMap<TypeTag, Arc<ReduceFn>>,
    default: Option<Arc<ReduceFn>>,
    validator: Box<dyn Validate>,
    step_limit: Option<usize>,
}

impl std::fmt::Debug for Converter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converter")
            .field("terminals", &self.terminals)
            .field("handlers", &self.handlers.len())
            .field("default", &self.default.is_some())
            .field("step_limit", &self.step_limit)
            .finish()
    }
}

impl Converter {
    /// Create a converter with the given terminal set, an empty registry,
    /// no default handler and the shallow validator.
    ///
    /// Accepts anything iterable into [`TypeSpec`]s: a list of exact tags,
    /// class descriptors, or a mix. Panics if it yields no descriptor.
    pub fn new(terminals: impl IntoIterator<Item = impl Into<TypeSpec>>) -> Self {
        Self {
            terminals: TerminalSet::new(terminals),
            handlers: HashMap::new(),
            default: None,
            validator: Box::new(ShallowValidate),
            step_limit: None,
        }
    }

    /// Replace the validation hook.
    pub fn with_validator(mut self, validator: impl Validate + 'static) -> Self {
        self.validator = Box::new(validator);
        self
    }

    /// Bound the number of handler invocations per [`Converter::convert`]
    /// call.
    ///
    /// Unset by default: a handler that returns a value of its own
    /// non-terminal input type re-enters itself forever. With a limit the
    /// loop reports [`TypeKindError::NonConverging`] instead.
    pub fn with_step_limit(mut self, limit: usize) -> Self {
        self.step_limit = Some(limit);
        self
    }

    pub fn terminals(&self) -> &TerminalSet {
        &self.terminals
    }

    /// Register `handler` for every tag in `tags`.
    ///
    /// Entries may be added at any time, including after conversions have
    /// run; re-registering a tag overwrites the previous entry (last
    /// registration wins).
    pub fn handle<F>(&mut self, tags: impl IntoIterator<Item = TypeTag>, handler: F) -> &mut Self
    where
        F: Fn(&Converter, Value) -> Result<Value, TypeKindError> + Send + Sync + 'static,
    {
        let handler: Arc<ReduceFn> = Arc::new(handler);
        for tag in tags {
            tracing::debug!(tag = %tag, "registered handler");
            self.handlers.insert(tag, Arc::clone(&handler));
        }
        self
    }

    /// Install the catch-all handler used when no exact tag matches.
    /// Replaces any previous default.
    pub fn set_default<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&Converter, Value) -> Result<Value, TypeKindError> + Send + Sync + 'static,
    {
        tracing::debug!("registered default handler");
        self.default = Some(Arc::new(handler));
        self
    }

    /// Whether `tag` is a member of the terminal set.
    pub fn is_terminal(&self, tag: TypeTag) -> bool {
        self.terminals.contains(tag)
    }

    /// Base processability check: the value's tag is terminal,
    /// handler-registered, or covered by a default handler.
    ///
    /// This is the chaining point for [`Validate`] implementations that
    /// extend the pre-flight hook.
    pub fn check_reducible(&self, value: &Value) -> Result<(), TypeKindError> {
        let tag = value.tag();
        if self.is_terminal(tag) || self.handlers.contains_key(&tag) || self.default.is_some() {
            Ok(())
        } else {
            Err(TypeKindError::unconvertible(value.type_name()))
        }
    }

    /// Run the installed validation hook against `value`.
    ///
    /// Invoked once at the start of every [`Converter::convert`] call;
    /// also callable directly for standalone validation.
    pub fn assert_type(&self, value: &Value) -> Result<(), TypeKindError> {
        self.validator.assert_type(self, value)
    }

    /// Reduce `value` until its runtime tag is terminal.
    ///
    /// A value that is already terminal comes back unchanged, with zero
    /// handler invocations, even when a handler is registered for its
    /// tag. Each iteration dispatches on the current value's exact tag, so
    /// a handler may return another non-terminal type and leave the rest
    /// of the chain to whichever handler matches that one.
    pub fn convert(&self, value: Value) -> Result<Value, TypeKindError> {
        self.assert_type(&value)?;
        self.reduce(value)
    }

    fn reduce(&self, mut value: Value) -> Result<Value, TypeKindError> {
        let mut steps = 0usize;
        loop {
            let tag = value.tag();
            if self.is_terminal(tag) {
                return Ok(value);
            }
            if self.step_limit.is_some_and(|limit| steps >= limit) {
                return Err(TypeKindError::NonConverging {
                    type_name: value.type_name().to_owned(),
                    steps,
                });
            }
            let handler: &ReduceFn = match self.handlers.get(&tag) {
                Some(handler) => handler.as_ref(),
                None => self
                    .default
                    .as_ref()
                    .ok_or_else(|| TypeKindError::unconvertible(value.type_name()))?
                    .as_ref(),
            };
            tracing::trace!(from = %tag, step = steps, "reducing");
            value = handler(self, value)?;
            steps += 1;
        }
    }
}
