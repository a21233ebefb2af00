//! Passwordless registration confirmed by a verification code.
//!
//! Codes are generated and delivered elsewhere (mail, chat, an admin);
//! [`PendingCodes`] only remembers what was issued and for how long.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, info};

use super::executor::{
    is_bound_actor, report_create_error, ExecutionOutcome, RegistrationExecutor,
};
use super::RegistrationContext;
use crate::actor::{normalize_name, Actor};
use crate::config::RegistrationConfig;
use crate::db::{NewAccount, RegistrationMethod};
use crate::message::MessageKey;

/// Result of comparing a supplied code with the pending one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeCheck {
    Valid,
    NotRequested,
    Expired,
    Incorrect,
}

impl CodeCheck {
    /// Message explaining a failed check.
    pub fn message_key(&self) -> Option<MessageKey> {
        match self {
            CodeCheck::Valid => None,
            CodeCheck::NotRequested => Some(MessageKey::CodeNotRequested),
            CodeCheck::Expired => Some(MessageKey::CodeExpired),
            CodeCheck::Incorrect => Some(MessageKey::CodeIncorrect),
        }
    }
}

#[derive(Debug, Clone)]
struct PendingCode {
    code: String,
    issued_at: Instant,
}

/// Verification codes awaiting confirmation, keyed by normalized name.
#[derive(Debug)]
pub struct PendingCodes {
    codes: RwLock<HashMap<String, PendingCode>>,
    validity: Duration,
}

impl PendingCodes {
    pub fn new(validity: Duration) -> Self {
        Self {
            codes: RwLock::new(HashMap::new()),
            validity,
        }
    }

    pub fn from_secs(validity_secs: u64) -> Self {
        Self::new(Duration::from_secs(validity_secs))
    }

    pub fn from_config(config: &RegistrationConfig) -> Self {
        Self::from_secs(config.code_validity_secs)
    }

    /// Remember `code` for `name`, replacing any earlier one.
    pub fn issue(&self, name: &str, code: impl Into<String>) {
        let key = normalize_name(name);
        debug!(name = %key, "Verification code issued");
        let mut codes = self.codes.write().unwrap_or_else(|e| e.into_inner());
        codes.insert(
            key,
            PendingCode {
                code: code.into(),
                issued_at: Instant::now(),
            },
        );
    }

    /// Compare `supplied` with the code pending for `name`.
    pub fn check(&self, name: &str, supplied: &str) -> CodeCheck {
        let key = normalize_name(name);
        let codes = self.codes.read().unwrap_or_else(|e| e.into_inner());
        match codes.get(&key) {
            None => CodeCheck::NotRequested,
            Some(pending) if pending.issued_at.elapsed() >= self.validity => CodeCheck::Expired,
            Some(pending) if pending.code != supplied.trim() => CodeCheck::Incorrect,
            Some(_) => CodeCheck::Valid,
        }
    }

    /// Forget the code pending for `name`.
    pub fn remove(&self, name: &str) -> bool {
        let key = normalize_name(name);
        let mut codes = self.codes.write().unwrap_or_else(|e| e.into_inner());
        codes.remove(&key).is_some()
    }

    /// Drop expired codes. Returns how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let mut codes = self.codes.write().unwrap_or_else(|e| e.into_inner());
        let before = codes.len();
        codes.retain(|_, pending| pending.issued_at.elapsed() < self.validity);
        before - codes.len()
    }

    pub fn len(&self) -> usize {
        self.codes.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Registers a passwordless account once the actor proves it received a code.
pub struct VerificationCodeExecutor {
    context: RegistrationContext,
    codes: Arc<PendingCodes>,
    actor: Actor,
    code: String,
}

impl VerificationCodeExecutor {
    pub fn new(
        context: &RegistrationContext,
        codes: Arc<PendingCodes>,
        actor: Actor,
        code: impl Into<String>,
    ) -> Self {
        Self {
            context: context.clone(),
            codes,
            actor,
            code: code.into(),
        }
    }
}

#[async_trait]
impl RegistrationExecutor for VerificationCodeExecutor {
    async fn is_registration_admitted(&self) -> bool {
        let check = self.codes.check(self.actor.name(), &self.code);
        match check.message_key() {
            None => true,
            Some(key) => {
                debug!(name = %self.actor.name(), ?check, "Verification code rejected");
                self.context.messenger.send(&self.actor, key);
                false
            }
        }
    }

    async fn execute_registration(&self, actor: &Actor) -> ExecutionOutcome {
        let messenger = self.context.messenger.as_ref();
        if !is_bound_actor(messenger, &self.actor, actor) {
            return ExecutionOutcome::Rejected;
        }

        let account = NewAccount::new(
            actor.name(),
            actor.address(),
            RegistrationMethod::VerificationCode,
        );

        match self.context.data_source.create_account(&account).await {
            Ok(account) => {
                self.codes.remove(actor.name());
                info!(
                    name = %account.username,
                    id = account.id,
                    address = %account.registration_ip,
                    "Registered account with verification code"
                );
                messenger.send(actor, MessageKey::RegisterSuccess);
                ExecutionOutcome::Registered(account)
            }
            Err(e) => report_create_error(messenger, actor, e),
        }
    }
}
