//! Understudy: programmable test doubles for Rust
//!
//! A [`Double`] stands in for a collaborator of the code under test. Tests
//! configure it with an ordered list of interactions, the subject calls it
//! through a hand-written trait implementation, and the test finally verifies
//! that every expected interaction happened.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  call(name, args)  ┌───────────────────────────────┐
//! │ Subject      │───────────────────►│ Double                        │
//! │ (under test) │◄───────────────────│  [Interaction, Interaction..] │
//! └──────────────┘   return values    │  first match answers          │
//!                                     └──────────────┬────────────────┘
//!                 add_interaction ──► Validator      │ failures
//!                                     (signatures)   ▼
//!                                                FailHandler
//! ```
//!
//! # Example
//!
//! ```
//! use understudy::prelude::*;
//!
//! trait Collaborator {
//!     fn query(&self, arg: &str) -> String;
//! }
//!
//! struct CollaboratorDouble(Double);
//!
//! impl Collaborator for CollaboratorDouble {
//!     fn query(&self, arg: &str) -> String {
//!         self.0
//!             .call("query", &args![arg.to_string()])
//!             .ok()
//!             .and_then(|values| values.first().and_then(Value::get::<String>))
//!             .unwrap_or_default()
//!     }
//! }
//!
//! let log = FailureLog::new();
//! let double = CollaboratorDouble(Double::builder().fail_handler(log.handler()).build());
//! allow_double(&double.0)
//!     .to(receive_call_to("query").with(args!["arg"]).and_return(values!["result"]));
//!
//! assert_eq!(double.query("arg"), "result");
//! assert!(log.is_empty());
//! ```

#![warn(missing_docs)]

mod double;
mod fail_handler;
mod interaction;
/// Test subscriber for the double's `tracing` events
pub mod logging;
mod result;
mod signature;
/// Fluent configuration syntax
pub mod syntax;
mod validator;
mod value;

pub use double::{Double, DoubleBuilder, DoubleConfig, InteractionSummary};
pub use fail_handler::{
    clear_doubles_fail_handler, default_fail_handler, register_doubles_fail_handler,
    register_fail_handler, try_default_fail_handler, FailHandler, FailureLog,
};
pub use interaction::{
    format_method_call, ArgsInteraction, ArgsMatcher, Body, BodyInteraction, ExpectedInteraction,
    Interaction,
};
pub use result::{DoubleError, DoubleResult};
pub use signature::{
    short_type_name, KindClass, MethodSignature, SignatureTable, Signatures, TypeKind,
};
pub use syntax::{
    allow_double, expect_double, receive_call_to, verify_calls, AllowanceTarget,
    ExpectationTarget, InteractionBuilder,
};
pub use validator::{
    check_method_shape, InteractionValidator, NullInteractionValidator, TypeInteractionValidator,
};
pub use value::{AnyValue, Value};

/// Generate a signature table for a trait.
///
/// See the `understudy-derive` crate for the rules.
#[cfg(feature = "derive")]
pub use understudy_derive::signatures;

/// Everything needed to configure and verify doubles
pub mod prelude {
    pub use super::syntax::*;
    pub use super::{
        args, register_doubles_fail_handler, values, ArgsInteraction, ArgsMatcher,
        BodyInteraction, Double, DoubleError, DoubleResult, ExpectedInteraction, FailHandler,
        FailureLog, Interaction, SignatureTable, Signatures, TypeKind, Value,
    };
}
