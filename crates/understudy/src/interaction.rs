//! Interactions: configured response rules
//!
//! An interaction decides whether an observed call matches it and, if so,
//! produces the response. Two kinds ship with the crate:
//!
//! - [`ArgsInteraction`] matches on method name and arguments and answers with
//!   fixed return values.
//! - [`BodyInteraction`] matches on method name only and computes its answer
//!   from the observed arguments.
//!
//! [`ExpectedInteraction`] wraps either one and adds a "must occur"
//! requirement checked at verification time.

use std::fmt;

use crate::result::{DoubleError, DoubleResult};
use crate::signature::SignatureTable;
use crate::validator::check_method_shape;
use crate::value::Value;

/// Render a call as `method_name(arg1, arg2, ...)` using each argument's
/// debug form.
#[must_use]
pub fn format_method_call(method_name: &str, args: &[Value]) -> String {
    let rendered: Vec<String> = args.iter().map(|arg| format!("{arg:?}")).collect();
    format!("{method_name}({})", rendered.join(", "))
}

/// A configured rule describing how a double responds to one class of call.
pub trait Interaction {
    /// Try to answer a call.
    ///
    /// Returns `Some(return_values)` when the call matches, `None` otherwise.
    fn call(&mut self, method_name: &str, args: &[Value]) -> Option<Vec<Value>>;

    /// Check the occurrence requirement
    fn verify(&self) -> DoubleResult<()>;

    /// Human readable form used in diagnostics
    fn describe(&self) -> String;

    /// Check the interaction against the method shapes of a collaborator type
    fn check_type(&self, table: &SignatureTable) -> DoubleResult<()>;

    /// Whether the interaction must occur before verification succeeds
    fn is_expected(&self) -> bool {
        false
    }

    /// Whether a required interaction has been observed.
    ///
    /// `None` for interactions without an occurrence requirement.
    fn observed(&self) -> Option<bool> {
        None
    }
}

/// Which arguments an [`ArgsInteraction`] accepts.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ArgsMatcher {
    /// Any argument list, including an empty one
    #[default]
    Any,
    /// Exactly this argument list (same length, element-wise equal)
    Exact(Vec<Value>),
}

impl ArgsMatcher {
    /// Whether `args` satisfy the matcher
    #[must_use]
    pub fn matches(&self, args: &[Value]) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(expected) => expected.as_slice() == args,
        }
    }

    /// Whether this is the wildcard matcher
    #[must_use]
    pub const fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }
}

impl From<Vec<Value>> for ArgsMatcher {
    fn from(args: Vec<Value>) -> Self {
        Self::Exact(args)
    }
}

/// Interaction that matches on method name and arguments and answers with
/// fixed return values.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgsInteraction {
    method_name: String,
    args: ArgsMatcher,
    return_values: Vec<Value>,
}

impl ArgsInteraction {
    /// Create an interaction.
    ///
    /// `args` is either [`ArgsMatcher::Any`] or a `Vec<Value>` of exact
    /// arguments.
    #[must_use]
    pub fn new(
        method_name: &str,
        args: impl Into<ArgsMatcher>,
        return_values: Vec<Value>,
    ) -> Self {
        Self {
            method_name: method_name.to_string(),
            args: args.into(),
            return_values,
        }
    }

    /// Method name
    #[must_use]
    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    /// Argument matcher
    #[must_use]
    pub const fn args(&self) -> &ArgsMatcher {
        &self.args
    }

    /// Configured return values
    #[must_use]
    pub fn return_values(&self) -> &[Value] {
        &self.return_values
    }
}

impl Interaction for ArgsInteraction {
    fn call(&mut self, method_name: &str, args: &[Value]) -> Option<Vec<Value>> {
        if self.method_name == method_name && self.args.matches(args) {
            Some(self.return_values.clone())
        } else {
            None
        }
    }

    fn verify(&self) -> DoubleResult<()> {
        Ok(())
    }

    fn describe(&self) -> String {
        match &self.args {
            ArgsMatcher::Any => format_method_call(&self.method_name, &[]),
            ArgsMatcher::Exact(args) => format_method_call(&self.method_name, args),
        }
    }

    fn check_type(&self, table: &SignatureTable) -> DoubleResult<()> {
        match &self.args {
            ArgsMatcher::Any => Ok(()),
            ArgsMatcher::Exact(args) => {
                check_method_shape(table, &self.method_name, args, &self.return_values)
            }
        }
    }
}

/// Callable computing return values from observed arguments
pub type Body = Box<dyn FnMut(&[Value]) -> Vec<Value>>;

/// Interaction that matches on method name only and runs a body to compute
/// its answer.
///
/// A panic inside the body is not caught: it reaches the code that called the
/// double, which is how a double simulates a failing collaborator.
pub struct BodyInteraction {
    method_name: String,
    body: Body,
}

impl BodyInteraction {
    /// Create an interaction running `body` for every call to `method_name`
    pub fn new<F>(method_name: &str, body: F) -> Self
    where
        F: FnMut(&[Value]) -> Vec<Value> + 'static,
    {
        Self {
            method_name: method_name.to_string(),
            body: Box::new(body),
        }
    }

    /// Method name
    #[must_use]
    pub fn method_name(&self) -> &str {
        &self.method_name
    }
}

impl fmt::Debug for BodyInteraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodyInteraction")
            .field("method_name", &self.method_name)
            .finish_non_exhaustive()
    }
}

impl Interaction for BodyInteraction {
    fn call(&mut self, method_name: &str, args: &[Value]) -> Option<Vec<Value>> {
        if self.method_name == method_name {
            Some((self.body)(args))
        } else {
            None
        }
    }

    fn verify(&self) -> DoubleResult<()> {
        Ok(())
    }

    fn describe(&self) -> String {
        format_method_call(&self.method_name, &[])
    }

    fn check_type(&self, _table: &SignatureTable) -> DoubleResult<()> {
        Ok(())
    }
}

/// Decorator requiring the wrapped interaction to match at least once.
pub struct ExpectedInteraction {
    inner: Box<dyn Interaction>,
    observed: bool,
}

impl ExpectedInteraction {
    /// Wrap an interaction
    pub fn new<I: Interaction + 'static>(interaction: I) -> Self {
        Self::from_boxed(Box::new(interaction))
    }

    /// Wrap an already boxed interaction
    #[must_use]
    pub fn from_boxed(interaction: Box<dyn Interaction>) -> Self {
        Self {
            inner: interaction,
            observed: false,
        }
    }

    /// Whether the wrapped interaction has matched
    #[must_use]
    pub const fn is_observed(&self) -> bool {
        self.observed
    }
}

impl fmt::Debug for ExpectedInteraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpectedInteraction")
            .field("interaction", &self.inner.describe())
            .field("observed", &self.observed)
            .finish()
    }
}

impl Interaction for ExpectedInteraction {
    fn call(&mut self, method_name: &str, args: &[Value]) -> Option<Vec<Value>> {
        let returned = self.inner.call(method_name, args);
        if returned.is_some() {
            self.observed = true;
        }
        returned
    }

    fn verify(&self) -> DoubleResult<()> {
        if self.observed {
            Ok(())
        } else {
            Err(DoubleError::ExpectedInteraction {
                interaction: self.inner.describe(),
            })
        }
    }

    fn describe(&self) -> String {
        self.inner.describe()
    }

    // Expectations are shape-checked like any other interaction.
    fn check_type(&self, table: &SignatureTable) -> DoubleResult<()> {
        self.inner.check_type(table)
    }

    fn is_expected(&self) -> bool {
        true
    }

    fn observed(&self) -> Option<bool> {
        Some(self.observed)
    }
}
