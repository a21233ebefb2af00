//! Registration with a user-chosen password.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, error, info};

use super::executor::{
    is_bound_actor, report_create_error, ExecutionOutcome, RegistrationExecutor,
};
use super::RegistrationContext;
use crate::actor::Actor;
use crate::auth::{hash_password, validate_email, Permission, ValidationError};
use crate::db::{NewAccount, RegistrationMethod};
use crate::message::MessageKey;
use crate::rate_limit::Ceiling;

/// Registers an account protected by an Argon2id password hash.
///
/// # Example
///
/// ```no_run
/// # async fn example(register: &gatekeep::register::AsyncRegister,
/// #                  context: &gatekeep::register::RegistrationContext,
/// #                  actor: gatekeep::Actor) {
/// use gatekeep::register::PasswordRegisterExecutor;
///
/// let executor = PasswordRegisterExecutor::new(context, actor.clone(), "correct-horse")
///     .with_email("robert@example.com");
/// register.register(&actor, Box::new(executor)).await;
/// # }
/// ```
pub struct PasswordRegisterExecutor {
    context: RegistrationContext,
    actor: Actor,
    password: SecretString,
    email: Option<String>,
}

impl PasswordRegisterExecutor {
    pub fn new(context: &RegistrationContext, actor: Actor, password: impl Into<String>) -> Self {
        Self {
            context: context.clone(),
            actor,
            password: SecretString::from(password.into()),
            email: None,
        }
    }

    /// Attach an email address to the new account.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    fn deny(&self, err: &ValidationError) {
        debug!(name = %self.actor.name(), reason = %err, "Registration credentials rejected");
        let messenger = &self.context.messenger;
        match err {
            ValidationError::PasswordLength { min, max } => {
                let (min, max) = (min.to_string(), max.to_string());
                messenger.send_with(
                    &self.actor,
                    err.message_key(),
                    &[("min", min.as_str()), ("max", max.as_str())],
                );
            }
            _ => messenger.send(&self.actor, err.message_key()),
        }
    }

    async fn is_email_admitted(&self, email: &str) -> bool {
        if let Err(err) = validate_email(email) {
            self.deny(&err);
            return false;
        }

        let ceiling = Ceiling::new(self.context.config.restriction.max_registrations_per_email);
        if ceiling.is_unlimited() || self.actor.has_permission(Permission::AllowMultipleAccounts) {
            return true;
        }

        match self.context.data_source.count_accounts_by_email(email).await {
            Ok(count) if ceiling.admits(count) => true,
            Ok(count) => {
                debug!(name = %self.actor.name(), count, max = ceiling.get(), "Email ceiling reached");
                let max = ceiling.get().to_string();
                self.context.messenger.send_with(
                    &self.actor,
                    MessageKey::MaxEmailRegistrationsExceeded,
                    &[("max", max.as_str())],
                );
                false
            }
            Err(e) => {
                error!(name = %self.actor.name(), error = %e, "Failed to count accounts by email");
                self.context.messenger.send(&self.actor, MessageKey::ErrorOccurred);
                false
            }
        }
    }
}

#[async_trait]
impl RegistrationExecutor for PasswordRegisterExecutor {
    async fn is_registration_admitted(&self) -> bool {
        let policy = &self.context.password_policy;
        if let Err(err) = policy.check(self.actor.name(), self.password.expose_secret()) {
            self.deny(&err);
            return false;
        }

        match &self.email {
            Some(email) => self.is_email_admitted(email).await,
            None => true,
        }
    }

    async fn execute_registration(&self, actor: &Actor) -> ExecutionOutcome {
        let messenger = self.context.messenger.as_ref();
        if !is_bound_actor(messenger, &self.actor, actor) {
            return ExecutionOutcome::Rejected;
        }

        // Argon2 is CPU-bound; keep it off the async workers.
        let password = self.password.expose_secret().to_owned();
        let hash = match tokio::task::spawn_blocking(move || hash_password(&password)).await {
            Ok(Ok(hash)) => hash,
            Ok(Err(e)) => {
                error!(name = %actor.name(), error = %e, "Failed to hash password");
                messenger.send(actor, MessageKey::ErrorOccurred);
                return ExecutionOutcome::Failed;
            }
            Err(e) => {
                error!(name = %actor.name(), error = %e, "Password hashing task failed");
                messenger.send(actor, MessageKey::ErrorOccurred);
                return ExecutionOutcome::Failed;
            }
        };

        let mut account = NewAccount::new(actor.name(), actor.address(), RegistrationMethod::Password)
            .with_password_hash(hash);
        if let Some(email) = &self.email {
            account = account.with_email(email.as_str());
        }

        match self.context.data_source.create_account(&account).await {
            Ok(account) => {
                info!(
                    name = %account.username,
                    id = account.id,
                    address = %account.registration_ip,
                    "Registered account with password"
                );
                messenger.send(actor, MessageKey::RegisterSuccess);
                if self.context.config.registration.force_login_after_register {
                    self.context.sessions.authenticate(actor.name());
                }
                ExecutionOutcome::Registered(account)
            }
            Err(e) => report_create_error(messenger, actor, e),
        }
    }
}
