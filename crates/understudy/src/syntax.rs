//! Fluent configuration syntax
//!
//! ```
//! use understudy::prelude::*;
//!
//! let log = FailureLog::new();
//! let collaborator = Double::builder().fail_handler(log.handler()).build();
//!
//! allow_double(&collaborator)
//!     .to(receive_call_to("query").with(args!["arg"]).and_return(values!["result"]));
//! expect_double(&collaborator).to(receive_call_to("command"));
//!
//! assert_eq!(collaborator.call("query", &args!["arg"]), Ok(values!["result"]));
//! assert_eq!(collaborator.call("command", &args![1, 2]), Ok(values![]));
//!
//! verify_calls(&collaborator);
//! assert!(log.is_empty());
//! ```

use std::fmt;

use crate::double::Double;
use crate::interaction::{
    ArgsInteraction, ArgsMatcher, Body, BodyInteraction, ExpectedInteraction, Interaction,
};
use crate::value::Value;

enum Response {
    Values(Vec<Value>),
    Body(Body),
}

/// Builder for one interaction, started by [`receive_call_to`].
///
/// Without [`with`](Self::with) the interaction matches any arguments; without
/// [`and_return`](Self::and_return) it answers with no values.
pub struct InteractionBuilder {
    method_name: String,
    args: ArgsMatcher,
    response: Response,
}

/// Start building an interaction for `method_name`
#[must_use]
pub fn receive_call_to(method_name: &str) -> InteractionBuilder {
    InteractionBuilder {
        method_name: method_name.to_string(),
        args: ArgsMatcher::Any,
        response: Response::Values(Vec::new()),
    }
}

impl InteractionBuilder {
    /// Match only calls with exactly these arguments
    #[must_use]
    pub fn with(mut self, args: Vec<Value>) -> Self {
        self.args = ArgsMatcher::Exact(args);
        self
    }

    /// Answer with fixed return values
    #[must_use]
    pub fn and_return(mut self, return_values: Vec<Value>) -> Self {
        self.response = Response::Values(return_values);
        self
    }

    /// Compute the answer with `body`.
    ///
    /// A body interaction matches on method name only, so arguments given
    /// with [`with`](Self::with) are ignored.
    #[must_use]
    pub fn and_do<F>(mut self, body: F) -> Self
    where
        F: FnMut(&[Value]) -> Vec<Value> + 'static,
    {
        self.response = Response::Body(Box::new(body));
        self
    }

    /// Build the interaction
    #[must_use]
    pub fn build(self) -> Box<dyn Interaction> {
        match self.response {
            Response::Values(return_values) => Box::new(ArgsInteraction::new(
                &self.method_name,
                self.args,
                return_values,
            )),
            Response::Body(body) => Box::new(BodyInteraction::new(&self.method_name, body)),
        }
    }
}

impl fmt::Debug for InteractionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let response = match &self.response {
            Response::Values(values) => format!("{values:?}"),
            Response::Body(_) => "<body>".to_string(),
        };
        f.debug_struct("InteractionBuilder")
            .field("method_name", &self.method_name)
            .field("args", &self.args)
            .field("response", &response)
            .finish()
    }
}

/// Target configuring allowed interactions; see [`allow_double`]
#[derive(Debug, Clone, Copy)]
pub struct AllowanceTarget<'a> {
    double: &'a Double,
}

/// Configure interactions that may happen on `double`
#[must_use]
pub const fn allow_double(double: &Double) -> AllowanceTarget<'_> {
    AllowanceTarget { double }
}

impl AllowanceTarget<'_> {
    /// Add the built interaction to the double
    pub fn to(self, builder: InteractionBuilder) {
        self.double.add_boxed_interaction(builder.build());
    }
}

/// Target configuring expected interactions; see [`expect_double`]
#[derive(Debug, Clone, Copy)]
pub struct ExpectationTarget<'a> {
    double: &'a Double,
}

/// Configure interactions that must happen on `double`
#[must_use]
pub const fn expect_double(double: &Double) -> ExpectationTarget<'_> {
    ExpectationTarget { double }
}

impl ExpectationTarget<'_> {
    /// Add the built interaction to the double as an expectation
    pub fn to(self, builder: InteractionBuilder) {
        self.double
            .add_interaction(ExpectedInteraction::from_boxed(builder.build()));
    }
}

/// Verify that every expected interaction on `double` has happened.
///
/// Failures go to the double's fail handler.
pub fn verify_calls(double: &Double) {
    let _ = double.verify_interactions();
}
