//! Dynamically typed argument and return values
//!
//! A double sees every call as a method name plus a list of [`Value`]s, and
//! answers with another list of [`Value`]s. A value is either `nil` or an
//! owned payload that can be compared, cloned and printed.

use std::any::{Any, TypeId};
use std::fmt;

use crate::signature::short_type_name;

/// Object-safe view of a payload stored in a [`Value`].
///
/// Implemented for every `'static` type that is `Debug + PartialEq + Clone`.
pub trait AnyValue: Any + fmt::Debug {
    /// Upcast for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Structural equality against another payload of any type
    fn eq_value(&self, other: &dyn AnyValue) -> bool;

    /// Clone into a new box
    fn clone_value(&self) -> Box<dyn AnyValue>;

    /// Full type name of the payload
    fn payload_type_name(&self) -> &'static str;

    /// Whether the payload is `None` of some `Option<T>`
    fn is_none_option(&self) -> bool;
}

impl<T> AnyValue for T
where
    T: Any + fmt::Debug + PartialEq + Clone,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_value(&self, other: &dyn AnyValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }

    fn clone_value(&self) -> Box<dyn AnyValue> {
        Box::new(self.clone())
    }

    fn payload_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn is_none_option(&self) -> bool {
        // `Debug` for any `Option<T>` renders `None` as exactly "None".
        std::any::type_name::<T>().starts_with("core::option::Option<")
            && format!("{self:?}") == "None"
    }
}

/// An argument or return value observed or configured on a double.
///
/// `&'static str` payloads are stored as `String`, so a literal configured in
/// a test equals the owned string a double builds at call time. `None` of any
/// `Option<T>` is stored as `nil`, so a configured `Value::nil()` matches an
/// observed `None` and a nilable return kind accepts it.
///
/// # Example
///
/// ```
/// use understudy::Value;
///
/// let configured = Value::new("life");
/// let observed = Value::new(String::from("life"));
/// assert_eq!(configured, observed);
/// assert_ne!(Value::new(42), Value::new(42_u8));
/// assert_eq!(format!("{:?}", Value::nil()), "nil");
/// assert_eq!(Value::new(None::<String>), Value::nil());
/// ```
pub struct Value {
    payload: Option<Box<dyn AnyValue>>,
}

impl Value {
    /// Wrap a payload.
    ///
    /// Wrapping a `Value` returns a copy of it instead of nesting. Wrapping
    /// `None` gives `nil`.
    #[must_use]
    pub fn new<T: AnyValue>(value: T) -> Self {
        let any: &dyn Any = &value;
        if let Some(value) = any.downcast_ref::<Self>() {
            return value.clone();
        }
        if value.is_none_option() {
            return Self::nil();
        }
        if let Some(text) = any.downcast_ref::<&'static str>() {
            return Self {
                payload: Some(Box::new((*text).to_string())),
            };
        }
        Self {
            payload: Some(Box::new(value)),
        }
    }

    /// The "no value" sentinel
    #[must_use]
    pub const fn nil() -> Self {
        Self { payload: None }
    }

    /// Whether this is the `nil` sentinel
    #[must_use]
    pub const fn is_nil(&self) -> bool {
        self.payload.is_none()
    }

    /// Borrow the payload as `T`
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.as_deref()?.as_any().downcast_ref::<T>()
    }

    /// Clone the payload out as `T`
    #[must_use]
    pub fn get<T: Any + Clone>(&self) -> Option<T> {
        self.downcast_ref::<T>().cloned()
    }

    /// `TypeId` of the payload, `None` for `nil`
    #[must_use]
    pub fn payload_type_id(&self) -> Option<TypeId> {
        self.payload.as_deref().map(|payload| payload.as_any().type_id())
    }

    /// Short type name of the payload, or `nil`
    #[must_use]
    pub fn kind_name(&self) -> String {
        self.payload.as_deref().map_or_else(
            || "nil".to_string(),
            |payload| short_type_name(payload.payload_type_name()),
        )
    }
}

impl Clone for Value {
    fn clone(&self) -> Self {
        Self {
            payload: self.payload.as_deref().map(|payload| payload.clone_value()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self.payload.as_deref(), other.payload.as_deref()) {
            (None, None) => true,
            (Some(left), Some(right)) => left.eq_value(right),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.payload.as_deref() {
            Some(payload) => fmt::Debug::fmt(payload, f),
            None => f.write_str("nil"),
        }
    }
}

/// Build a `Vec<Value>` of call arguments.
///
/// ```
/// use understudy::{args, Value};
///
/// let args = args!["life", 42, Value::nil()];
/// assert_eq!(args.len(), 3);
/// assert!(args[2].is_nil());
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::Value::new($value)),+]
    };
}

/// Build a `Vec<Value>` of return values. Same syntax as [`args!`].
#[macro_export]
macro_rules! values {
    ($($tokens:tt)*) => {
        $crate::args!($($tokens)*)
    };
}
