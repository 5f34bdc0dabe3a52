//! Fail handlers: how a double reports a failure to the test framework
//!
//! A double never aborts on its own. Every failure (rejected interaction,
//! unexpected call, unmet expectation) is handed to a [`FailHandler`], and the
//! double then finishes its own control flow. The handler decides whether the
//! test stops: the built-in [`FailHandler::panicking`] handler fails a libtest
//! test by panicking, [`FailureLog`] only records.
//!
//! The default handler is registered per thread, so test runners that run one
//! test per thread never share it.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::result::{DoubleError, DoubleResult};

/// Callback receiving failure messages.
#[derive(Clone)]
pub struct FailHandler {
    callback: Rc<dyn Fn(&str)>,
}

impl FailHandler {
    /// Wrap a callback
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&str) + 'static,
    {
        Self {
            callback: Rc::new(callback),
        }
    }

    /// Handler that panics with the failure message
    #[must_use]
    pub fn panicking() -> Self {
        Self::new(|message| panic!("{message}"))
    }

    /// Report a failure
    pub fn fail(&self, message: &str) {
        (self.callback)(message);
    }
}

impl fmt::Debug for FailHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FailHandler").finish_non_exhaustive()
    }
}

thread_local! {
    static DEFAULT_FAIL_HANDLER: RefCell<Option<FailHandler>> = const { RefCell::new(None) };
}

/// Register the default fail handler for doubles created on this thread.
///
/// Doubles capture the handler when they are built; registering a new one
/// does not affect existing doubles.
pub fn register_doubles_fail_handler<F>(callback: F)
where
    F: Fn(&str) + 'static,
{
    register_fail_handler(FailHandler::new(callback));
}

/// Register an existing [`FailHandler`] as this thread's default
pub fn register_fail_handler(handler: FailHandler) {
    DEFAULT_FAIL_HANDLER.with(|slot| *slot.borrow_mut() = Some(handler));
}

/// Remove this thread's default fail handler
pub fn clear_doubles_fail_handler() {
    DEFAULT_FAIL_HANDLER.with(|slot| *slot.borrow_mut() = None);
}

/// This thread's registered fail handler.
///
/// # Errors
///
/// Returns [`DoubleError::NoFailHandler`] when nothing is registered.
pub fn try_default_fail_handler() -> DoubleResult<FailHandler> {
    DEFAULT_FAIL_HANDLER
        .with(|slot| slot.borrow().clone())
        .ok_or(DoubleError::NoFailHandler)
}

/// This thread's registered fail handler, or [`FailHandler::panicking`].
#[must_use]
pub fn default_fail_handler() -> FailHandler {
    try_default_fail_handler().unwrap_or_else(|_| FailHandler::panicking())
}

/// Fail handler that records every message instead of stopping the test.
///
/// # Example
///
/// ```
/// use understudy::{args, Double, FailureLog};
///
/// let log = FailureLog::new();
/// let double = Double::builder().fail_handler(log.handler()).build();
///
/// assert!(double.call("query", &args!["x"]).is_err());
/// assert_eq!(log.messages(), vec!["Unexpected interaction: query(\"x\")"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FailureLog {
    messages: Rc<RefCell<Vec<String>>>,
}

impl FailureLog {
    /// Create an empty log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A handler appending to this log
    #[must_use]
    pub fn handler(&self) -> FailHandler {
        let messages = Rc::clone(&self.messages);
        FailHandler::new(move |message| messages.borrow_mut().push(message.to_string()))
    }

    /// All recorded messages, oldest first
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }

    /// First recorded message
    #[must_use]
    pub fn first(&self) -> Option<String> {
        self.messages.borrow().first().cloned()
    }

    /// Number of recorded messages
    #[must_use]
    pub fn count(&self) -> usize {
        self.messages.borrow().len()
    }

    /// Whether nothing was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.borrow().is_empty()
    }

    /// Forget recorded messages
    pub fn clear(&self) {
        self.messages.borrow_mut().clear();
    }
}
