//! Interaction validators
//!
//! A double runs its validator on every interaction before storing it. The
//! [`TypeInteractionValidator`] catches interactions whose method name, arity
//! or value kinds do not fit the real collaborator type; the
//! [`NullInteractionValidator`] accepts everything and is used when no type is
//! available to check against.

use std::sync::Arc;

use crate::interaction::Interaction;
use crate::result::{DoubleError, DoubleResult};
use crate::signature::{SignatureTable, Signatures, TypeKind};
use crate::value::Value;

/// Static compatibility check run when an interaction is configured.
pub trait InteractionValidator {
    /// Accept or reject an interaction
    fn validate(&self, interaction: &dyn Interaction) -> DoubleResult<()>;
}

/// Validator that accepts every interaction.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullInteractionValidator;

impl NullInteractionValidator {
    /// Create the validator
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl InteractionValidator for NullInteractionValidator {
    fn validate(&self, _interaction: &dyn Interaction) -> DoubleResult<()> {
        Ok(())
    }
}

/// Validator checking interactions against a collaborator's signature table.
#[derive(Debug, Clone)]
pub struct TypeInteractionValidator {
    table: Arc<SignatureTable>,
}

impl TypeInteractionValidator {
    /// Validate against `table`
    #[must_use]
    pub fn new(table: impl Into<Arc<SignatureTable>>) -> Self {
        Self {
            table: table.into(),
        }
    }

    /// Validate against the table of a [`Signatures`] type
    #[must_use]
    pub fn for_type<S: Signatures>() -> Self {
        Self::new(S::signature_table())
    }

    /// The signature table in use
    #[must_use]
    pub fn table(&self) -> &SignatureTable {
        &self.table
    }
}

impl InteractionValidator for TypeInteractionValidator {
    fn validate(&self, interaction: &dyn Interaction) -> DoubleResult<()> {
        interaction.check_type(&self.table)
    }
}

/// Which side of a method a value belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Argument,
    ReturnValue,
}

/// Check a method name, its arguments and its return values against `table`.
///
/// Fail-fast: method lookup, argument count, argument kinds, return count,
/// return kinds. The first violation is returned.
pub fn check_method_shape(
    table: &SignatureTable,
    method_name: &str,
    args: &[Value],
    return_values: &[Value],
) -> DoubleResult<()> {
    let Some(signature) = table.get(method_name) else {
        return Err(DoubleError::NoSuchMethod {
            type_name: table.type_name().to_string(),
            method: method_name.to_string(),
        });
    };

    check_values(
        table,
        method_name,
        signature.params(),
        args,
        Position::Argument,
    )?;
    check_values(
        table,
        method_name,
        signature.returns(),
        return_values,
        Position::ReturnValue,
    )
}

fn check_values(
    table: &SignatureTable,
    method_name: &str,
    declared: &[TypeKind],
    given: &[Value],
    position: Position,
) -> DoubleResult<()> {
    let type_name = table.type_name().to_string();
    let method = method_name.to_string();

    if declared.len() != given.len() {
        let (expected, given) = (declared.len(), given.len());
        return Err(match position {
            Position::Argument => DoubleError::ArgumentCount {
                type_name,
                method,
                expected,
                given,
            },
            Position::ReturnValue => DoubleError::ReturnCount {
                type_name,
                method,
                expected,
                given,
            },
        });
    }

    let Some((offset, (kind, value))) = declared
        .iter()
        .zip(given)
        .enumerate()
        .find(|(_, (kind, value))| !kind.accepts(value))
    else {
        return Ok(());
    };

    let index = offset + 1;
    let expected = kind.name().to_string();
    let given = value.kind_name();
    Err(match position {
        Position::Argument => DoubleError::ArgumentType {
            index,
            type_name,
            method,
            expected,
            given,
        },
        Position::ReturnValue => DoubleError::ReturnType {
            index,
            type_name,
            method,
            expected,
            given,
        },
    })
}
