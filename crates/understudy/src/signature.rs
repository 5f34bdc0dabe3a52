//! Signature tables: the method shapes of a collaborator type
//!
//! A [`SignatureTable`] lists, for one collaborator type, every method with
//! its ordered parameter kinds and ordered return kinds. Tables are built once
//! per type, either by hand or with `#[understudy::signatures]`, and shared
//! read-only between doubles.
//!
//! ```
//! use understudy::{SignatureTable, TypeKind};
//!
//! let table = SignatureTable::new("DeepThought").method(
//!     "ultimate_question",
//!     [TypeKind::of::<String>(), TypeKind::of::<String>(), TypeKind::of::<String>()],
//!     [TypeKind::of::<i32>(), TypeKind::of::<Option<String>>()],
//! );
//! assert_eq!(table.get("ultimate_question").map(|m| m.params().len()), Some(3));
//! ```

use std::any::TypeId;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Broad category of a declared kind.
///
/// Decides whether `nil` may stand in for a value of the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KindClass {
    /// Numbers, `bool`, `char`, `()`
    Scalar,
    /// `String`
    Text,
    /// Any other value type (structs, enums, tuples, arrays)
    Struct,
    /// `Option`, `Box`, `Rc`, `Arc`, references and raw pointers
    Pointer,
    /// Function pointers
    Callable,
    /// Trait objects and generic parameters; accepts any value
    Interface,
    /// `Vec`, `VecDeque`, `LinkedList`
    Sequence,
    /// Maps and sets
    Mapping,
    /// `mpsc` senders and receivers
    Channel,
}

const POINTER_PREFIXES: &[&str] = &[
    "core::option::Option<",
    "alloc::boxed::Box<",
    "alloc::rc::Rc<",
    "alloc::sync::Arc<",
    "core::ptr::non_null::NonNull<",
    "&",
    "*const ",
    "*mut ",
];

const SEQUENCE_PREFIXES: &[&str] = &[
    "alloc::vec::Vec<",
    "alloc::collections::vec_deque::VecDeque<",
    "alloc::collections::linked_list::LinkedList<",
];

const MAPPING_PREFIXES: &[&str] = &[
    "std::collections::hash::map::HashMap<",
    "std::collections::hash::set::HashSet<",
    "alloc::collections::btree::map::BTreeMap<",
    "alloc::collections::btree::set::BTreeSet<",
];

const CHANNEL_PREFIXES: &[&str] = &[
    "std::sync::mpsc::Sender<",
    "std::sync::mpsc::SyncSender<",
    "std::sync::mpsc::Receiver<",
];

const SCALARS: &[&str] = &[
    "bool", "char", "()", "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64",
    "u128", "usize", "f32", "f64",
];

impl KindClass {
    /// Whether `nil` is an acceptable value for this class
    #[must_use]
    pub const fn is_nilable(self) -> bool {
        matches!(
            self,
            Self::Pointer
                | Self::Callable
                | Self::Interface
                | Self::Sequence
                | Self::Mapping
                | Self::Channel
        )
    }

    /// Classify a full type name as produced by `std::any::type_name`
    #[must_use]
    pub fn classify(type_name: &str) -> Self {
        let name = type_name.trim();
        if name.starts_with("dyn ") {
            return Self::Interface;
        }
        if let Some(inner) = strip_any_prefix(name, POINTER_PREFIXES) {
            let inner = inner.trim_start_matches("mut ").trim_start();
            if inner.starts_with("dyn ") {
                return Self::Interface;
            }
            return Self::Pointer;
        }
        if name.starts_with("fn(")
            || name.starts_with("unsafe fn(")
            || name.starts_with("extern ")
            || name.starts_with("unsafe extern ")
        {
            return Self::Callable;
        }
        if strip_any_prefix(name, SEQUENCE_PREFIXES).is_some() {
            return Self::Sequence;
        }
        if strip_any_prefix(name, MAPPING_PREFIXES).is_some() {
            return Self::Mapping;
        }
        if strip_any_prefix(name, CHANNEL_PREFIXES).is_some() {
            return Self::Channel;
        }
        if name == "alloc::string::String" || name == "str" {
            return Self::Text;
        }
        if SCALARS.contains(&name) {
            return Self::Scalar;
        }
        Self::Struct
    }
}

fn strip_any_prefix<'a>(name: &'a str, prefixes: &[&str]) -> Option<&'a str> {
    prefixes.iter().find_map(|prefix| name.strip_prefix(prefix))
}

/// Remove module paths from a type name.
///
/// `alloc::vec::Vec<alloc::string::String>` becomes `Vec<String>`.
#[must_use]
pub fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut segment_start = 0;
    let mut chars = full.chars().peekable();

    while let Some(c) = chars.next() {
        if c == ':' && chars.peek() == Some(&':') {
            chars.next();
            out.truncate(segment_start);
        } else {
            out.push(c);
            if !(c.is_alphanumeric() || c == '_') {
                segment_start = out.len();
            }
        }
    }

    out
}

/// Declared kind of a parameter or return value.
#[derive(Clone, PartialEq, Eq)]
pub struct TypeKind {
    name: String,
    class: KindClass,
    type_id: Option<TypeId>,
}

impl TypeKind {
    /// Kind of the concrete type `T`.
    ///
    /// `&'static str` and `str` are described as `String`, matching how
    /// [`Value`] stores text.
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        let id = TypeId::of::<T>();
        if id == TypeId::of::<&'static str>() || id == TypeId::of::<str>() {
            return Self::of::<String>();
        }
        let full = std::any::type_name::<T>();
        Self {
            name: short_type_name(full),
            class: KindClass::classify(full),
            type_id: Some(id),
        }
    }

    /// Dynamic kind that accepts any value, including `nil`.
    ///
    /// Used for trait objects, `impl Trait` and generic parameters.
    #[must_use]
    pub fn interface(name: &str) -> Self {
        Self {
            name: name.to_string(),
            class: KindClass::Interface,
            type_id: None,
        }
    }

    /// Display name used in diagnostics
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kind class
    #[must_use]
    pub const fn class(&self) -> KindClass {
        self.class
    }

    /// Whether `nil` may stand in for this kind
    #[must_use]
    pub const fn is_nilable(&self) -> bool {
        self.class.is_nilable()
    }

    /// Whether `value` may be configured where this kind is declared
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        match value.payload_type_id() {
            None => self.is_nilable(),
            Some(_) if self.class == KindClass::Interface => true,
            Some(id) => self.type_id == Some(id),
        }
    }
}

impl fmt::Debug for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeKind")
            .field("name", &self.name)
            .field("class", &self.class)
            .finish()
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Shape of one method: ordered parameter kinds and ordered return kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    name: String,
    params: Vec<TypeKind>,
    returns: Vec<TypeKind>,
}

impl MethodSignature {
    /// Create a method signature
    #[must_use]
    pub fn new(
        name: &str,
        params: impl IntoIterator<Item = TypeKind>,
        returns: impl IntoIterator<Item = TypeKind>,
    ) -> Self {
        Self {
            name: name.to_string(),
            params: params.into_iter().collect(),
            returns: returns.into_iter().collect(),
        }
    }

    /// Method name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameter kinds, receiver excluded
    #[must_use]
    pub fn params(&self) -> &[TypeKind] {
        &self.params
    }

    /// Declared return kinds
    #[must_use]
    pub fn returns(&self) -> &[TypeKind] {
        &self.returns
    }
}

/// Method shapes of one collaborator type, keyed by method name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureTable {
    type_name: String,
    methods: BTreeMap<String, MethodSignature>,
}

impl SignatureTable {
    /// Create an empty table for `type_name`
    #[must_use]
    pub fn new(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            methods: BTreeMap::new(),
        }
    }

    /// Add a method (builder style).
    ///
    /// A later method with the same name replaces the earlier one.
    #[must_use]
    pub fn method(
        mut self,
        name: &str,
        params: impl IntoIterator<Item = TypeKind>,
        returns: impl IntoIterator<Item = TypeKind>,
    ) -> Self {
        self.insert(MethodSignature::new(name, params, returns));
        self
    }

    /// Add a method signature
    pub fn insert(&mut self, signature: MethodSignature) {
        let _ = self.methods.insert(signature.name.clone(), signature);
    }

    /// Look up a method by name
    #[must_use]
    pub fn get(&self, method_name: &str) -> Option<&MethodSignature> {
        self.methods.get(method_name)
    }

    /// Collaborator type name
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Number of methods
    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Whether the table has no methods
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Methods in name order
    pub fn methods(&self) -> impl Iterator<Item = &MethodSignature> {
        self.methods.values()
    }
}

/// Types that can describe the method shapes of a collaborator.
///
/// Implemented by the `<Trait>Signatures` marker that
/// `#[understudy::signatures]` generates, or by hand.
pub trait Signatures {
    /// The signature table, built once and shared
    fn signature_table() -> Arc<SignatureTable>;
}
