//! The double: registry, dispatcher and verifier for one collaborator
//!
//! A [`Double`] owns an ordered list of interactions. Calls are answered by the
//! first interaction that matches, in configuration order; verification walks
//! the same list and reports the first unmet expectation.
//!
//! # Example
//!
//! ```
//! use understudy::{args, values, ArgsInteraction, Double, ExpectedInteraction, FailureLog};
//!
//! let log = FailureLog::new();
//! let double = Double::builder().fail_handler(log.handler()).build();
//!
//! double.add_interaction(ExpectedInteraction::new(ArgsInteraction::new(
//!     "command",
//!     args!["arg"],
//!     values!["result"],
//! )));
//!
//! assert_eq!(double.call("command", &args!["arg"]), Ok(values!["result"]));
//! assert_eq!(double.verify_interactions(), Ok(()));
//! assert!(log.is_empty());
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::fail_handler::{default_fail_handler, FailHandler};
use crate::interaction::{format_method_call, Interaction};
use crate::result::{DoubleError, DoubleResult};
use crate::signature::{SignatureTable, Signatures};
use crate::validator::{InteractionValidator, NullInteractionValidator, TypeInteractionValidator};
use crate::value::Value;

/// Configuration for a double
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoubleConfig {
    /// Name used in logs and summaries
    pub name: String,
    /// Verify expectations when the double is dropped unverified
    pub verify_on_drop: bool,
}

impl Default for DoubleConfig {
    fn default() -> Self {
        Self {
            name: "double".to_string(),
            verify_on_drop: false,
        }
    }
}

impl DoubleConfig {
    /// Create a new config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the name
    #[must_use]
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Enable or disable verification on drop
    #[must_use]
    pub const fn with_verify_on_drop(mut self, enabled: bool) -> Self {
        self.verify_on_drop = enabled;
        self
    }
}

/// Reporting view of one configured interaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionSummary {
    /// Position in configuration order, starting at 0
    pub index: usize,
    /// Rendered interaction
    pub description: String,
    /// Whether the interaction must occur
    pub expected: bool,
    /// Whether a required interaction has occurred; `None` for stubs
    pub observed: Option<bool>,
}

type SharedInteraction = Rc<RefCell<Box<dyn Interaction>>>;

/// Programmable stand-in for one collaborator.
///
/// `Double` is single-threaded: it is neither `Send` nor `Sync`. Every method
/// takes `&self`, so a hand-written collaborator implementation can forward
/// its `&self` trait methods to [`Double::call`], and an interaction body may
/// call back into the double.
pub struct Double {
    config: DoubleConfig,
    interactions: RefCell<Vec<SharedInteraction>>,
    validator: Box<dyn InteractionValidator>,
    fail_handler: FailHandler,
    verified: Cell<bool>,
}

impl Double {
    /// Double without shape validation, reporting to the default fail handler
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Double validated against the signature table of `S`
    #[must_use]
    pub fn with_type<S: Signatures>() -> Self {
        Self::builder().type_of::<S>().build()
    }

    /// Double validated against `table`
    #[must_use]
    pub fn with_signature_table(table: impl Into<Arc<SignatureTable>>) -> Self {
        Self::builder().signature_table(table).build()
    }

    /// Double using a custom validator
    #[must_use]
    pub fn with_validator<V: InteractionValidator + 'static>(validator: V) -> Self {
        Self::builder().validator(validator).build()
    }

    /// Start building a double
    #[must_use]
    pub fn builder() -> DoubleBuilder {
        DoubleBuilder::new()
    }

    /// Configuration in use
    #[must_use]
    pub const fn config(&self) -> &DoubleConfig {
        &self.config
    }

    /// Name from the configuration
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Validate and store an interaction.
    ///
    /// A rejected interaction is reported to the fail handler and dropped: it
    /// never takes part in matching.
    pub fn add_interaction<I: Interaction + 'static>(&self, interaction: I) {
        self.add_boxed_interaction(Box::new(interaction));
    }

    /// Validate and store an already boxed interaction
    pub fn add_boxed_interaction(&self, interaction: Box<dyn Interaction>) {
        if let Err(err) = self.validator.validate(interaction.as_ref()) {
            tracing::warn!(
                double = %self.config.name,
                interaction = %interaction.describe(),
                error = %err,
                "rejected interaction"
            );
            self.fail(&err);
            return;
        }

        tracing::debug!(
            double = %self.config.name,
            interaction = %interaction.describe(),
            expected = interaction.is_expected(),
            "added interaction"
        );
        self.interactions
            .borrow_mut()
            .push(Rc::new(RefCell::new(interaction)));
    }

    /// Dispatch a call to the first matching interaction.
    ///
    /// Interactions are tried in configuration order and the first match
    /// answers; later interactions are not consulted.
    ///
    /// # Errors
    ///
    /// Returns [`DoubleError::UnexpectedInteraction`] when nothing matches,
    /// after reporting the same error to the fail handler.
    pub fn call(&self, method_name: &str, args: &[Value]) -> DoubleResult<Vec<Value>> {
        // Snapshot so bodies can add interactions or call back in.
        let interactions: Vec<SharedInteraction> = self.interactions.borrow().clone();

        for (index, interaction) in interactions.iter().enumerate() {
            // An interaction already running further up the stack is skipped.
            let Ok(mut interaction) = interaction.try_borrow_mut() else {
                continue;
            };
            if let Some(return_values) = interaction.call(method_name, args) {
                tracing::trace!(
                    double = %self.config.name,
                    method = method_name,
                    index,
                    "call matched"
                );
                return Ok(return_values);
            }
        }

        let err = DoubleError::UnexpectedInteraction {
            call: format_method_call(method_name, args),
        };
        tracing::warn!(double = %self.config.name, error = %err, "unexpected call");
        self.fail(&err);
        Err(err)
    }

    /// Check every interaction's occurrence requirement.
    ///
    /// Stops at the first unmet requirement; later interactions are not
    /// checked. An interaction whose body is running, when a body verifies
    /// its own double, is skipped.
    ///
    /// # Errors
    ///
    /// Returns the first failure, after reporting it to the fail handler.
    pub fn verify_interactions(&self) -> DoubleResult<()> {
        self.verified.set(true);
        let interactions: Vec<SharedInteraction> = self.interactions.borrow().clone();

        for interaction in &interactions {
            let Ok(interaction) = interaction.try_borrow() else {
                continue;
            };
            let outcome = interaction.verify();
            if let Err(err) = outcome {
                tracing::warn!(double = %self.config.name, error = %err, "verification failed");
                self.fail(&err);
                return Err(err);
            }
        }

        tracing::debug!(
            double = %self.config.name,
            interactions = interactions.len(),
            "verified interactions"
        );
        Ok(())
    }

    /// Number of stored interactions
    #[must_use]
    pub fn interaction_count(&self) -> usize {
        self.interactions.borrow().len()
    }

    /// Reporting view of every stored interaction, in configuration order.
    ///
    /// An interaction whose body is running cannot be inspected and is left
    /// out; `index` still counts it.
    #[must_use]
    pub fn summary(&self) -> Vec<InteractionSummary> {
        let interactions: Vec<SharedInteraction> = self.interactions.borrow().clone();
        interactions
            .iter()
            .enumerate()
            .filter_map(|(index, interaction)| {
                let interaction = interaction.try_borrow().ok()?;
                Some(InteractionSummary {
                    index,
                    description: interaction.describe(),
                    expected: interaction.is_expected(),
                    observed: interaction.observed(),
                })
            })
            .collect()
    }

    fn fail(&self, err: &DoubleError) {
        self.fail_handler.fail(&err.to_string());
    }
}

impl Default for Double {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Double {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Double")
            .field("config", &self.config)
            .field("interaction_count", &self.interaction_count())
            .field("verified", &self.verified.get())
            .finish_non_exhaustive()
    }
}

impl Drop for Double {
    fn drop(&mut self) {
        if self.config.verify_on_drop && !self.verified.get() && !std::thread::panicking() {
            let _ = self.verify_interactions();
        }
    }
}

/// Builder for [`Double`]
pub struct DoubleBuilder {
    config: DoubleConfig,
    validator: Option<Box<dyn InteractionValidator>>,
    fail_handler: Option<FailHandler>,
}

impl DoubleBuilder {
    /// Start from the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: DoubleConfig::default(),
            validator: None,
            fail_handler: None,
        }
    }

    /// Replace the whole configuration
    #[must_use]
    pub fn config(mut self, config: DoubleConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the name
    #[must_use]
    pub fn name(mut self, name: &str) -> Self {
        self.config.name = name.to_string();
        self
    }

    /// Verify expectations when the double is dropped unverified
    #[must_use]
    pub fn verify_on_drop(mut self, enabled: bool) -> Self {
        self.config.verify_on_drop = enabled;
        self
    }

    /// Use a custom validator
    #[must_use]
    pub fn validator<V: InteractionValidator + 'static>(mut self, validator: V) -> Self {
        self.validator = Some(Box::new(validator));
        self
    }

    /// Validate against `table`
    #[must_use]
    pub fn signature_table(self, table: impl Into<Arc<SignatureTable>>) -> Self {
        self.validator(TypeInteractionValidator::new(table))
    }

    /// Validate against the signature table of `S`
    #[must_use]
    pub fn type_of<S: Signatures>(self) -> Self {
        self.validator(TypeInteractionValidator::for_type::<S>())
    }

    /// Report failures to `handler` instead of the thread's default
    #[must_use]
    pub fn fail_handler(mut self, handler: FailHandler) -> Self {
        self.fail_handler = Some(handler);
        self
    }

    /// Build the double
    #[must_use]
    pub fn build(self) -> Double {
        Double {
            config: self.config,
            interactions: RefCell::new(Vec::new()),
            validator: self
                .validator
                .unwrap_or_else(|| Box::new(NullInteractionValidator::new())),
            fail_handler: self.fail_handler.unwrap_or_else(default_fail_handler),
            verified: Cell::new(false),
        }
    }
}

impl Default for DoubleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DoubleBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DoubleBuilder")
            .field("config", &self.config)
            .field("has_validator", &self.validator.is_some())
            .field("has_fail_handler", &self.fail_handler.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fail_handler::{clear_doubles_fail_handler, register_doubles_fail_handler, FailureLog};
    use crate::interaction::{ArgsInteraction, ArgsMatcher, BodyInteraction, ExpectedInteraction};
    use crate::signature::TypeKind;
    use crate::{args, values};

    /// Interaction with scripted outcomes that counts how it was used
    struct FakeInteraction {
        answer: Option<Vec<Value>>,
        verify_outcome: DoubleResult<()>,
        calls: Rc<Cell<usize>>,
        verifies: Rc<Cell<usize>>,
    }

    impl FakeInteraction {
        fn new(answer: Option<Vec<Value>>) -> Self {
            Self {
                answer,
                verify_outcome: Ok(()),
                calls: Rc::new(Cell::new(0)),
                verifies: Rc::new(Cell::new(0)),
            }
        }

        fn failing_verification(message: &str) -> Self {
            Self {
                verify_outcome: Err(DoubleError::rejected(message)),
                ..Self::new(None)
            }
        }

        fn counters(&self) -> (Rc<Cell<usize>>, Rc<Cell<usize>>) {
            (Rc::clone(&self.calls), Rc::clone(&self.verifies))
        }
    }

    impl Interaction for FakeInteraction {
        fn call(&mut self, _method_name: &str, _args: &[Value]) -> Option<Vec<Value>> {
            self.calls.set(self.calls.get() + 1);
            self.answer.clone()
        }

        fn verify(&self) -> DoubleResult<()> {
            self.verifies.set(self.verifies.get() + 1);
            self.verify_outcome.clone()
        }

        fn describe(&self) -> String {
            "<fake>".to_string()
        }

        fn check_type(&self, _table: &SignatureTable) -> DoubleResult<()> {
            Ok(())
        }
    }

    /// Validator returning a fixed outcome
    struct FakeValidator(DoubleResult<()>);

    impl InteractionValidator for FakeValidator {
        fn validate(&self, _interaction: &dyn Interaction) -> DoubleResult<()> {
            self.0.clone()
        }
    }

    fn double_with(validator: FakeValidator) -> (Double, FailureLog) {
        let log = FailureLog::new();
        let double = Double::builder()
            .validator(validator)
            .fail_handler(log.handler())
            .build();
        (double, log)
    }

    fn recording_double() -> (Double, FailureLog) {
        double_with(FakeValidator(Ok(())))
    }

    mod add_interaction_tests {
        use super::*;

        #[test]
        fn test_valid_interaction_is_added() {
            let (double, log) = recording_double();
            double.add_interaction(FakeInteraction::new(Some(values!["result"])));

            assert!(log.is_empty());
            assert_eq!(double.interaction_count(), 1);
            assert_eq!(double.call("", &[]), Ok(values!["result"]));
        }

        #[test]
        fn test_invalid_interaction_is_reported_and_dropped() {
            let (double, log) =
                double_with(FakeValidator(Err(DoubleError::rejected("invalid interaction!"))));
            double.add_interaction(FakeInteraction::new(Some(values!["result"])));

            assert_eq!(log.messages(), vec!["invalid interaction!"]);
            assert_eq!(double.interaction_count(), 0);
            assert!(double.call("", &[]).is_err());
        }
    }

    mod call_tests {
        use super::*;

        #[test]
        fn test_first_match_wins() {
            let (double, log) = recording_double();
            let first = FakeInteraction::new(None);
            let second = FakeInteraction::new(Some(values![42, Value::nil()]));
            let third = FakeInteraction::new(Some(values![43, Value::nil()]));
            let (first_calls, _) = first.counters();
            let (second_calls, _) = second.counters();
            let (third_calls, _) = third.counters();
            double.add_interaction(first);
            double.add_interaction(second);
            double.add_interaction(third);

            let returned =
                double.call("ultimate_question", &args!["life", "universe", "everything"]);

            assert_eq!(returned, Ok(values![42, Value::nil()]));
            assert_eq!(first_calls.get(), 1);
            assert_eq!(second_calls.get(), 1);
            assert_eq!(third_calls.get(), 0);
            assert!(log.is_empty());
        }

        #[test]
        fn test_no_match_reports_and_returns_error() {
            let (double, log) = recording_double();
            let interactions: Vec<FakeInteraction> =
                (0..3).map(|_| FakeInteraction::new(None)).collect();
            let counters: Vec<_> = interactions.iter().map(FakeInteraction::counters).collect();
            for interaction in interactions {
                double.add_interaction(interaction);
            }

            let returned =
                double.call("ultimate_question", &args!["life", "universe", "everything"]);

            let message =
                "Unexpected interaction: ultimate_question(\"life\", \"universe\", \"everything\")";
            assert_eq!(returned.unwrap_err().to_string(), message);
            assert_eq!(log.messages(), vec![message]);
            assert!(counters.iter().all(|(calls, _)| calls.get() == 1));
        }

        #[test]
        fn test_unconfigured_method_fails_once() {
            let (double, log) = recording_double();
            assert_eq!(
                double.call("foo", &[]),
                Err(DoubleError::UnexpectedInteraction {
                    call: "foo()".to_string()
                })
            );
            assert_eq!(log.count(), 1);
            assert_eq!(log.first().as_deref(), Some("Unexpected interaction: foo()"));
        }

        #[test]
        fn test_get_scenario() {
            let log = FailureLog::new();
            let double = Double::builder().fail_handler(log.handler()).build();
            double.add_interaction(ArgsInteraction::new("get", args![], values!["value"]));

            assert_eq!(double.call("get", &[]), Ok(values!["value"]));
            assert!(log.is_empty());

            assert!(double.call("get", &args!["x"]).is_err());
            assert_eq!(log.messages(), vec!["Unexpected interaction: get(\"x\")"]);
        }

        #[test]
        fn test_specific_stub_before_wildcard() {
            let (double, _log) = recording_double();
            double.add_interaction(ArgsInteraction::new("query", args!["special"], values![1]));
            double.add_interaction(ArgsInteraction::new("query", ArgsMatcher::Any, values![0]));

            assert_eq!(double.call("query", &args!["special"]), Ok(values![1]));
            assert_eq!(double.call("query", &args!["other"]), Ok(values![0]));
            assert_eq!(double.call("query", &[]), Ok(values![0]));
        }

        #[test]
        fn test_body_can_call_back_into_double() {
            let double = Rc::new(Double::builder().fail_handler(FailureLog::new().handler()).build());
            double.add_interaction(ArgsInteraction::new("base", args![], values![40]));
            let inner = Rc::downgrade(&double);
            double.add_interaction(BodyInteraction::new("derived", move |_| {
                let base = inner
                    .upgrade()
                    .and_then(|double| double.call("base", &[]).ok())
                    .and_then(|values| values.first().and_then(Value::get::<i32>))
                    .unwrap_or_default();
                values![base + 2]
            }));

            assert_eq!(double.call("derived", &[]), Ok(values![42]));
        }

        #[test]
        fn test_body_can_verify_its_own_double() {
            let log = FailureLog::new();
            let double = Rc::new(Double::builder().fail_handler(log.handler()).build());
            let inner = Rc::downgrade(&double);
            double.add_interaction(ExpectedInteraction::new(BodyInteraction::new(
                "check",
                move |_| {
                    let Some(double) = inner.upgrade() else {
                        return values![];
                    };
                    let verified = double.verify_interactions().is_ok();
                    let described: Vec<String> = double
                        .summary()
                        .into_iter()
                        .map(|entry| entry.description)
                        .collect();
                    values![verified, described]
                },
            )));
            double.add_interaction(ArgsInteraction::new("other", args![], values![]));

            assert_eq!(
                double.call("check", &[]),
                Ok(values![true, vec!["other()".to_string()]])
            );
            assert!(log.is_empty());
        }

        #[test]
        fn test_body_verification_reports_other_unmet_expectations() {
            let log = FailureLog::new();
            let double = Rc::new(Double::builder().fail_handler(log.handler()).build());
            double.add_interaction(ExpectedInteraction::new(ArgsInteraction::new(
                "command",
                args!["arg"],
                values![],
            )));
            let inner = Rc::downgrade(&double);
            double.add_interaction(BodyInteraction::new("check", move |_| {
                let verified = inner
                    .upgrade()
                    .is_some_and(|double| double.verify_interactions().is_ok());
                values![verified]
            }));

            assert_eq!(double.call("check", &[]), Ok(values![false]));
            assert_eq!(log.messages(), vec!["Expected interaction: command(\"arg\")"]);
        }

        #[test]
        #[should_panic(expected = "body exploded")]
        fn test_body_panic_propagates_through_call() {
            let (double, _log) = recording_double();
            double.add_interaction(BodyInteraction::new("explode", |_| panic!("body exploded")));
            let _ = double.call("explode", &[]);
        }

        #[test]
        fn test_double_stays_usable_after_body_panic() {
            let (double, log) = recording_double();
            double.add_interaction(BodyInteraction::new("explode", |_| panic!("body exploded")));
            double.add_interaction(ArgsInteraction::new("query", args![], values!["result"]));

            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                double.call("explode", &[])
            }));
            assert!(outcome.is_err());

            assert_eq!(double.call("query", &[]), Ok(values!["result"]));
            assert!(std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                double.call("explode", &[])
            }))
            .is_err());
            assert_eq!(double.interaction_count(), 2);
            assert_eq!(double.summary().len(), 2);
            assert_eq!(double.verify_interactions(), Ok(()));
            assert!(log.is_empty());
        }

        #[test]
        fn test_calls_are_allowed_before_configuration() {
            let (double, log) = recording_double();
            assert!(double.call("later", &[]).is_err());
            double.add_interaction(ArgsInteraction::new("later", args![], values![]));
            assert_eq!(double.call("later", &[]), Ok(Vec::new()));
            assert_eq!(log.count(), 1);
        }
    }

    mod verify_tests {
        use super::*;

        #[test]
        fn test_all_verified() {
            let (double, log) = recording_double();
            let fakes: Vec<FakeInteraction> = (0..3).map(|_| FakeInteraction::new(None)).collect();
            let counters: Vec<_> = fakes.iter().map(FakeInteraction::counters).collect();
            for fake in fakes {
                double.add_interaction(fake);
            }

            assert_eq!(double.verify_interactions(), Ok(()));
            assert!(counters.iter().all(|(_, verifies)| verifies.get() == 1));
            assert!(log.is_empty());
        }

        #[test]
        fn test_stops_at_first_failure() {
            let (double, log) = recording_double();
            let first = FakeInteraction::new(None);
            let second = FakeInteraction::failing_verification("nope");
            let third = FakeInteraction::new(None);
            let (_, first_verifies) = first.counters();
            let (_, second_verifies) = second.counters();
            let (_, third_verifies) = third.counters();
            double.add_interaction(first);
            double.add_interaction(second);
            double.add_interaction(third);

            assert_eq!(double.verify_interactions(), Err(DoubleError::rejected("nope")));
            assert_eq!(first_verifies.get(), 1);
            assert_eq!(second_verifies.get(), 1);
            assert_eq!(third_verifies.get(), 0);
            assert_eq!(log.messages(), vec!["nope"]);
        }

        #[test]
        fn test_expectation_lifecycle() {
            let (double, log) = recording_double();
            double.add_interaction(ExpectedInteraction::new(ArgsInteraction::new(
                "foo",
                args!["x"],
                values![],
            )));

            assert_eq!(
                double.verify_interactions().unwrap_err().to_string(),
                "Expected interaction: foo(\"x\")"
            );
            assert_eq!(log.messages(), vec!["Expected interaction: foo(\"x\")"]);

            log.clear();
            assert_eq!(double.call("foo", &args!["x"]), Ok(Vec::new()));
            assert_eq!(double.verify_interactions(), Ok(()));
            assert!(log.is_empty());
        }

        #[test]
        fn test_summary() {
            let (double, _log) = recording_double();
            double.add_interaction(ArgsInteraction::new("query", ArgsMatcher::Any, values![1]));
            double.add_interaction(ExpectedInteraction::new(ArgsInteraction::new(
                "command",
                args!["arg"],
                values![],
            )));
            let _ = double.call("command", &args!["arg"]);

            let summary = double.summary();
            assert_eq!(
                summary,
                vec![
                    InteractionSummary {
                        index: 0,
                        description: "query()".to_string(),
                        expected: false,
                        observed: None,
                    },
                    InteractionSummary {
                        index: 1,
                        description: "command(\"arg\")".to_string(),
                        expected: true,
                        observed: Some(true),
                    },
                ]
            );

            let json = serde_json::to_string(&summary[1]).unwrap();
            assert!(json.contains("\"observed\":true"));
        }
    }

    mod type_checked_tests {
        use super::*;

        fn table() -> SignatureTable {
            SignatureTable::new("T")
                .method(
                    "bar",
                    [TypeKind::of::<String>(), TypeKind::of::<String>()],
                    [],
                )
                .method("count", [], [TypeKind::of::<i32>()])
                .method("find", [], [TypeKind::of::<Option<String>>()])
                .method("lookup", [TypeKind::of::<Option<String>>()], [TypeKind::of::<i32>()])
        }

        #[test]
        fn test_configured_nil_matches_observed_none() {
            let log = FailureLog::new();
            let double = Double::builder()
                .signature_table(table())
                .fail_handler(log.handler())
                .build();

            double.add_interaction(ArgsInteraction::new("lookup", args![Value::nil()], values![1]));
            double.add_interaction(ArgsInteraction::new(
                "lookup",
                args![Some("key".to_string())],
                values![2],
            ));
            assert_eq!(double.interaction_count(), 2);

            assert_eq!(double.call("lookup", &args![None::<String>]), Ok(values![1]));
            assert_eq!(
                double.call("lookup", &args![Some("key".to_string())]),
                Ok(values![2])
            );
            assert!(log.is_empty());
        }

        #[test]
        fn test_arity_violation_never_enters_the_list() {
            let log = FailureLog::new();
            let double = Double::builder()
                .signature_table(table())
                .fail_handler(log.handler())
                .build();

            double.add_interaction(ArgsInteraction::new("bar", args!["a"], values![]));
            assert_eq!(
                log.messages(),
                vec!["Invalid interaction: method 'T.bar' takes 2 arguments, 1 specified"]
            );

            assert!(double.call("bar", &args!["a"]).is_err());
            assert_eq!(log.messages()[1], "Unexpected interaction: bar(\"a\")");
        }

        #[test]
        fn test_nil_return_compatibility() {
            let log = FailureLog::new();
            let double = Double::builder()
                .signature_table(table())
                .fail_handler(log.handler())
                .build();

            double.add_interaction(ArgsInteraction::new("find", args![], values![Value::nil()]));
            assert!(log.is_empty());
            assert_eq!(double.interaction_count(), 1);

            double.add_interaction(ArgsInteraction::new("count", args![], values![Value::nil()]));
            assert_eq!(
                log.messages(),
                vec!["Invalid interaction: type of return value 1 of method 'T.count' is 'i32', 'nil' given"]
            );
            assert_eq!(double.interaction_count(), 1);
        }
    }

    mod construction_tests {
        use super::*;

        #[test]
        fn test_default_handler_is_captured_at_build() {
            let log = FailureLog::new();
            crate::fail_handler::register_fail_handler(log.handler());
            let double = Double::new();
            clear_doubles_fail_handler();

            assert!(double.call("foo", &[]).is_err());
            assert_eq!(log.messages(), vec!["Unexpected interaction: foo()"]);
        }

        #[test]
        #[should_panic(expected = "Unexpected interaction: foo()")]
        fn test_without_registered_handler_failures_panic() {
            clear_doubles_fail_handler();
            let double = Double::default();
            let _ = double.call("foo", &[]);
        }

        #[test]
        fn test_registered_closure_handler() {
            let seen = Rc::new(RefCell::new(Vec::new()));
            let sink = Rc::clone(&seen);
            register_doubles_fail_handler(move |message| sink.borrow_mut().push(message.to_string()));
            let double = Double::with_signature_table(SignatureTable::new("Empty"));
            clear_doubles_fail_handler();

            double.add_interaction(ArgsInteraction::new("missing", args![], values![]));
            assert_eq!(
                seen.borrow().as_slice(),
                ["Invalid interaction: type 'Empty' has no method 'missing'"]
            );
        }

        #[test]
        fn test_custom_validator_constructor() {
            let double = Double::with_validator(FakeValidator(Ok(())));
            assert_eq!(double.name(), "double");
            assert_eq!(double.interaction_count(), 0);
        }

        #[test]
        fn test_config_roundtrip_and_builder() {
            let config = DoubleConfig::new()
                .with_name("collaborator")
                .with_verify_on_drop(true);
            let json = serde_json::to_string(&config).unwrap();
            let parsed: DoubleConfig = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, config);

            let partial: DoubleConfig = serde_json::from_str(r#"{"name":"x"}"#).unwrap();
            assert!(!partial.verify_on_drop);

            let double = Double::builder()
                .config(config)
                .verify_on_drop(false)
                .fail_handler(FailureLog::new().handler())
                .build();
            assert_eq!(double.name(), "collaborator");
            assert!(format!("{double:?}").contains("collaborator"));
            assert!(format!("{:?}", Double::builder().name("b")).contains("has_validator"));
        }
    }

    mod drop_tests {
        use super::*;

        #[test]
        fn test_verify_on_drop_reports_unmet_expectation() {
            let log = FailureLog::new();
            {
                let double = Double::builder()
                    .verify_on_drop(true)
                    .fail_handler(log.handler())
                    .build();
                double.add_interaction(ExpectedInteraction::new(ArgsInteraction::new(
                    "command",
                    ArgsMatcher::Any,
                    values![],
                )));
            }
            assert_eq!(log.messages(), vec!["Expected interaction: command()"]);
        }

        #[test]
        fn test_explicit_verification_disables_drop_check() {
            let log = FailureLog::new();
            {
                let double = Double::builder()
                    .verify_on_drop(true)
                    .fail_handler(log.handler())
                    .build();
                double.add_interaction(ExpectedInteraction::new(ArgsInteraction::new(
                    "command",
                    ArgsMatcher::Any,
                    values![],
                )));
                let _ = double.verify_interactions();
            }
            assert_eq!(log.count(), 1);
        }

        #[test]
        fn test_no_drop_check_by_default() {
            let log = FailureLog::new();
            {
                let double = Double::builder().fail_handler(log.handler()).build();
                double.add_interaction(ExpectedInteraction::new(ArgsInteraction::new(
                    "command",
                    ArgsMatcher::Any,
                    values![],
                )));
            }
            assert!(log.is_empty());
        }
    }
}
