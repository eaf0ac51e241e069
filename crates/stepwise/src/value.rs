//! Type-erased values and the type tags that describe them.
//!
//! Step bodies, injected callbacks and the context all exchange [`Value`]s: a
//! shared, immutable `Rc<dyn Any>` paired with the [`TypeTag`] of the concrete
//! type it was built from. Tags are what parameter descriptors are made of, so
//! binding and injection compare tag identities instead of inspecting types at
//! runtime.

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::str::FromStr;

use crate::coerce::{self, CoercionError};

/// Produces the zero value used for parameters nobody supplied.
pub type ZeroFn = fn() -> Value;

/// Converts captured phrase text into a typed value.
pub type ParseFn = fn(&str) -> Result<Value, CoercionError>;

/// Identity of a parameter or value type.
///
/// Equality and hashing consider the [`TypeId`] only; the optional zero and
/// parse hooks let callers teach the binder about their own types without
/// touching the built-in coercion table.
#[derive(Clone, Copy)]
pub struct TypeTag {
    id: TypeId,
    name: &'static str,
    zero: Option<ZeroFn>,
    parse: Option<ParseFn>,
}

impl TypeTag {
    /// Tag for `T` without any custom hooks.
    ///
    /// # Examples
    ///
    /// ```
    /// use stepwise::TypeTag;
    ///
    /// assert_eq!(TypeTag::of::<i64>(), TypeTag::of::<i64>());
    /// assert_ne!(TypeTag::of::<i64>(), TypeTag::of::<i32>());
    /// ```
    #[must_use]
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            zero: None,
            parse: None,
        }
    }

    /// Tag for `T` whose missing arguments are filled with `T::default()`.
    #[must_use]
    pub fn defaulted<T: Any + Default>() -> Self {
        Self {
            zero: Some(zero_of::<T>),
            ..Self::of::<T>()
        }
    }

    /// Tag for `T` whose captured text is converted with [`FromStr`].
    #[must_use]
    pub fn parsed<T: Any + FromStr>() -> Self {
        Self {
            parse: Some(parse_with::<T>),
            ..Self::of::<T>()
        }
    }

    /// Add a zero-value hook to this tag.
    #[must_use]
    pub fn with_zero(self, zero: ZeroFn) -> Self {
        Self {
            zero: Some(zero),
            ..self
        }
    }

    /// Add a parse hook to this tag.
    #[must_use]
    pub fn with_parser(self, parse: ParseFn) -> Self {
        Self {
            parse: Some(parse),
            ..self
        }
    }

    /// The tagged type's identifier.
    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The tagged type's name as reported by [`std::any::type_name`].
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether the tag describes `T`.
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }

    /// Zero value for the tagged type, if one is known.
    ///
    /// A hook set on the tag wins over the built-in table of primitive zeros.
    #[must_use]
    pub fn zero_value(&self) -> Option<Value> {
        self.zero
            .or_else(|| coerce::builtin_zero(self.id))
            .map(|zero| zero())
    }

    pub(crate) fn zero_hook(&self) -> Option<ZeroFn> {
        self.zero
    }

    pub(crate) fn parse_hook(&self) -> Option<ParseFn> {
        self.parse
    }
}

impl PartialEq for TypeTag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeTag {}

impl Hash for TypeTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

pub(crate) fn zero_of<T: Any + Default>() -> Value {
    Value::new(T::default())
}

fn parse_with<T: Any + FromStr>(raw: &str) -> Result<Value, CoercionError> {
    raw.parse::<T>()
        .map(Value::new)
        .map_err(|_| CoercionError::Invalid {
            raw: raw.to_string(),
            ty: type_name::<T>(),
        })
}

/// A shared, type-erased value.
///
/// Cloning is cheap and shares the payload, so a context entry injected into
/// several callbacks is the same allocation each time. Types that need shared
/// mutation should be stored as `Rc<RefCell<T>>`.
///
/// # Examples
///
/// ```
/// use stepwise::Value;
///
/// let value = Value::new(String::from("Batman"));
/// assert!(value.is::<String>());
/// assert_eq!(value.get::<String>().as_deref(), Some("Batman"));
/// assert_eq!(value.get::<i32>(), None);
/// ```
#[derive(Clone)]
pub struct Value {
    inner: Rc<dyn Any>,
    tag: TypeTag,
}

impl Value {
    /// Wrap `value`, recording its type.
    pub fn new<T: Any>(value: T) -> Self {
        Self {
            inner: Rc::new(value),
            tag: TypeTag::of::<T>(),
        }
    }

    /// Tag of the wrapped value's concrete type.
    #[must_use]
    pub fn tag(&self) -> TypeTag {
        self.tag
    }

    /// Identifier of the wrapped value's concrete type.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.tag.id()
    }

    /// Name of the wrapped value's concrete type.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.tag.name()
    }

    /// Whether the wrapped value is a `T`.
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.tag.is::<T>()
    }

    /// Borrow the wrapped value as `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Clone the wrapped value out as `T`.
    #[must_use]
    pub fn get<T: Any + Clone>(&self) -> Option<T> {
        self.downcast_ref::<T>().cloned()
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Value").field(&self.tag).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Debug, Default, PartialEq)]
    struct Gadget;

    #[test]
    fn tags_compare_by_type_only() {
        let plain = TypeTag::of::<Gadget>();
        let defaulted = TypeTag::defaulted::<Gadget>();
        assert_eq!(plain, defaulted);
        assert!(plain.zero_value().is_none());
        assert!(defaulted.zero_value().is_some());
    }

    #[test]
    fn builtin_zero_covers_primitives() {
        let zero = TypeTag::of::<u16>().zero_value();
        assert_eq!(zero.and_then(|value| value.get::<u16>()), Some(0));
        let empty = TypeTag::of::<String>().zero_value();
        assert_eq!(empty.and_then(|value| value.get::<String>()), Some(String::new()));
    }

    #[test]
    fn parsed_tag_uses_from_str() {
        let tag = TypeTag::parsed::<std::net::Ipv4Addr>();
        let Some(parse) = tag.parse_hook() else {
            panic!("parsed tag should carry a parse hook");
        };
        let value = parse("127.0.0.1").unwrap_or_else(|err| panic!("should parse: {err}"));
        assert_eq!(
            value.get::<std::net::Ipv4Addr>(),
            Some(std::net::Ipv4Addr::LOCALHOST)
        );
        assert!(parse("localhost").is_err());
    }

    #[test]
    fn clones_share_the_payload() {
        let value = Value::new(Rc::new(RefCell::new(1)));
        let copy = value.clone();
        if let Some(cell) = copy.downcast_ref::<Rc<RefCell<i32>>>() {
            *cell.borrow_mut() = 2;
        }
        let seen = value
            .downcast_ref::<Rc<RefCell<i32>>>()
            .map(|cell| *cell.borrow());
        assert_eq!(seen, Some(2));
    }

    #[test]
    fn debug_names_the_type() {
        assert_eq!(format!("{:?}", Value::new(5_u8)), "Value(u8)");
    }
}
