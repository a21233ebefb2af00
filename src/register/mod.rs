//! Registration pipeline.
//!
//! [`AsyncRegister`] runs the checks every registration method shares, in a
//! fixed order, and hands the attempt to a [`RegistrationExecutor`] only
//! when all of them pass:
//!
//! 1. the actor is not already logged in,
//! 2. registration is enabled,
//! 3. the name is not taken,
//! 4. the source address is below its account ceiling,
//! 5. the executor admits the attempt,
//! 6. the executor creates the account.
//!
//! The first failing check tells the actor why and ends the attempt.
//! Steps 3 to 6 run under a per-name lock, so two attempts for one name
//! cannot both pass the name check.

mod code;
mod executor;
mod locks;
mod password;

pub use code::{CodeCheck, PendingCodes, VerificationCodeExecutor};
pub use executor::{ExecutionOutcome, RegistrationExecutor};
pub use locks::{NameGuard, NameLocks};
pub use password::PasswordRegisterExecutor;

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error, info_span, Instrument};

use crate::actor::Actor;
use crate::auth::{PasswordPolicy, SessionCache};
use crate::config::Config;
use crate::db::DataSource;
use crate::message::{MessageKey, Messenger};
use crate::rate_limit::{AddressLimiter, LimitDecision};
use crate::Result;

/// Collaborators shared by the pipeline and the executors.
#[derive(Clone)]
pub struct RegistrationContext {
    pub config: Arc<Config>,
    pub sessions: Arc<SessionCache>,
    pub data_source: Arc<dyn DataSource>,
    pub messenger: Arc<dyn Messenger>,
    /// Compiled once from `config.registration`.
    pub password_policy: Arc<PasswordPolicy>,
}

impl RegistrationContext {
    /// Fails if the password rules in `config` do not compile.
    pub fn new(
        config: Arc<Config>,
        sessions: Arc<SessionCache>,
        data_source: Arc<dyn DataSource>,
        messenger: Arc<dyn Messenger>,
    ) -> Result<Self> {
        let password_policy = Arc::new(PasswordPolicy::from_config(&config.registration)?);
        Ok(Self {
            config,
            sessions,
            data_source,
            messenger,
            password_policy,
        })
    }
}

/// Why the pipeline stopped an attempt before the executor ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    AlreadyLoggedIn,
    RegistrationDisabled,
    NameTaken,
    AddressLimit { count: i64, ceiling: i64 },
}

/// Runs registration attempts.
pub struct AsyncRegister {
    context: RegistrationContext,
    limiter: AddressLimiter,
    locks: NameLocks,
}

impl AsyncRegister {
    pub fn new(context: RegistrationContext) -> Self {
        let limiter = AddressLimiter::from_config(&context.config.restriction);
        Self {
            context,
            limiter,
            locks: NameLocks::new(),
        }
    }

    pub fn context(&self) -> &RegistrationContext {
        &self.context
    }

    /// Run one registration attempt for `actor`.
    ///
    /// Outcomes are reported to the actor through the messenger; nothing is
    /// returned. The executor is consumed and runs at most once.
    pub async fn register(&self, actor: &Actor, executor: Box<dyn RegistrationExecutor>) {
        if let Some(rejection) = self.check_session_and_settings(actor) {
            self.reject(actor, rejection);
            return;
        }

        let _guard = self.locks.lock(actor.normalized_name()).await;

        match self.check_name_and_address(actor).await {
            Ok(None) => {}
            Ok(Some(rejection)) => {
                self.reject(actor, rejection);
                return;
            }
            Err(e) => {
                error!(name = %actor.name(), error = %e, "Registration check failed");
                self.context.messenger.send(actor, MessageKey::ErrorOccurred);
                return;
            }
        }

        if !executor.is_registration_admitted().await {
            debug!(name = %actor.name(), "Registration not admitted by executor");
            return;
        }

        let outcome = executor.execute_registration(actor).await;
        debug!(
            name = %actor.name(),
            registered = outcome.is_registered(),
            "Registration attempt finished"
        );
    }

    /// Run [`register`](Self::register) on a tokio worker task.
    pub fn spawn_register(
        self: &Arc<Self>,
        actor: Actor,
        executor: Box<dyn RegistrationExecutor>,
    ) -> JoinHandle<()> {
        let register = Arc::clone(self);
        let span = info_span!("register", name = %actor.name(), address = %actor.address());
        tokio::spawn(
            async move {
                register.register(&actor, executor).await;
            }
            .instrument(span),
        )
    }

    /// Checks that need neither the name lock nor persistence.
    fn check_session_and_settings(&self, actor: &Actor) -> Option<Rejection> {
        if self.context.sessions.is_authenticated(actor.normalized_name()) {
            return Some(Rejection::AlreadyLoggedIn);
        }
        if !self.context.config.registration.enabled {
            return Some(Rejection::RegistrationDisabled);
        }
        None
    }

    async fn check_name_and_address(&self, actor: &Actor) -> Result<Option<Rejection>> {
        let data_source = self.context.data_source.as_ref();

        if data_source.is_account_present(actor.normalized_name()).await? {
            return Ok(Some(Rejection::NameTaken));
        }

        match self.limiter.check(actor, data_source).await? {
            LimitDecision::Denied { count, ceiling } => {
                Ok(Some(Rejection::AddressLimit { count, ceiling }))
            }
            LimitDecision::Exempt(_) | LimitDecision::Allowed { .. } => Ok(None),
        }
    }

    fn reject(&self, actor: &Actor, rejection: Rejection) {
        debug!(name = %actor.name(), ?rejection, "Registration rejected");
        let messenger = self.context.messenger.as_ref();
        match rejection {
            Rejection::AlreadyLoggedIn => messenger.send(actor, MessageKey::AlreadyLoggedIn),
            Rejection::RegistrationDisabled => {
                messenger.send(actor, MessageKey::RegistrationDisabled)
            }
            Rejection::NameTaken => messenger.send(actor, MessageKey::NameAlreadyRegistered),
            Rejection::AddressLimit { count, ceiling } => {
                let (count, max) = (count.to_string(), ceiling.to_string());
                messenger.send_with(
                    actor,
                    MessageKey::MaxRegistrationsExceeded,
                    &[("count", count.as_str()), ("max", max.as_str())],
                );
            }
        }
    }
}
