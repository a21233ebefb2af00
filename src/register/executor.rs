//! The method-specific half of a registration attempt.

use async_trait::async_trait;
use tracing::{error, warn};

use crate::actor::Actor;
use crate::db::Account;
use crate::message::{MessageKey, Messenger};
use crate::GatekeepError;

/// How an execution ended. The actor has already been told.
#[derive(Debug, Clone)]
pub enum ExecutionOutcome {
    /// The account was created.
    Registered(Account),
    /// A precondition no longer held when execution started.
    Rejected,
    /// Another attempt stored the name first.
    NameTaken,
    /// Hashing or storage failed.
    Failed,
}

impl ExecutionOutcome {
    pub fn is_registered(&self) -> bool {
        matches!(self, ExecutionOutcome::Registered(_))
    }

    /// The created account, if any.
    pub fn account(&self) -> Option<&Account> {
        match self {
            ExecutionOutcome::Registered(account) => Some(account),
            _ => None,
        }
    }
}

/// Strategy for one registration method.
///
/// An executor is built for a single attempt and handed to
/// [`AsyncRegister::register`](super::AsyncRegister::register) by value.
/// Both operations report their own failures to the actor.
#[async_trait]
pub trait RegistrationExecutor: Send + Sync {
    /// Method-specific precondition. Must not write to persistence or the
    /// session cache.
    async fn is_registration_admitted(&self) -> bool;

    /// Create the account and tell the actor how it went.
    async fn execute_registration(&self, actor: &Actor) -> ExecutionOutcome;
}

/// Check that `actor` is the one the executor was built for.
///
/// Admission is decided for the bound actor, so executing for anyone else
/// would register a name nobody proved anything for.
pub(crate) fn is_bound_actor(messenger: &dyn Messenger, bound: &Actor, actor: &Actor) -> bool {
    if bound.normalized_name() == actor.normalized_name() {
        return true;
    }
    warn!(
        bound = %bound.name(),
        name = %actor.name(),
        "Executor was built for another actor, refusing to register"
    );
    messenger.send(actor, MessageKey::ErrorOccurred);
    false
}

/// Report a failed account insert and map it to an outcome.
pub(crate) fn report_create_error(
    messenger: &dyn Messenger,
    actor: &Actor,
    err: GatekeepError,
) -> ExecutionOutcome {
    if err.is_conflict() {
        warn!(name = %actor.name(), "Name was registered by a concurrent attempt");
        messenger.send(actor, MessageKey::NameAlreadyRegistered);
        ExecutionOutcome::NameTaken
    } else {
        error!(name = %actor.name(), error = %err, "Failed to store new account");
        messenger.send(actor, MessageKey::ErrorOccurred);
        ExecutionOutcome::Failed
    }
}
