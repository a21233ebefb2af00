//! Outcome messages delivered to actors.
//!
//! Every user-facing outcome is one [`MessageKey`]. A [`Messenger`] turns a
//! key into text and delivers it; delivery to an actor that is no longer
//! connected is a silent no-op.

mod delivery;

pub use delivery::{Connections, LocalizedMessenger};

use std::fmt;

use crate::actor::Actor;

/// Closed set of messages the registration flow can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    /// The actor already holds an authenticated session.
    AlreadyLoggedIn,
    /// Registration is turned off in the configuration.
    RegistrationDisabled,
    /// An account with this name already exists.
    NameAlreadyRegistered,
    /// The address has reached its account ceiling. Args: `count`, `max`.
    MaxRegistrationsExceeded,
    /// The email address has reached its account ceiling. Args: `max`.
    MaxEmailRegistrationsExceeded,
    /// The supplied email address is malformed.
    EmailInvalid,
    /// Password length out of bounds. Args: `min`, `max`.
    PasswordLength,
    /// Password contains characters outside the allowed pattern.
    PasswordCharacters,
    /// Password equals or contains the account name.
    PasswordIsUsername,
    /// Password is on the unsafe list.
    PasswordUnsafe,
    /// No verification code was issued for this actor.
    CodeNotRequested,
    /// The issued verification code has expired.
    CodeExpired,
    /// The supplied verification code does not match.
    CodeIncorrect,
    /// The account was created.
    RegisterSuccess,
    /// The request could not be evaluated.
    ErrorOccurred,
}

impl MessageKey {
    /// Every key, in declaration order.
    pub const ALL: [MessageKey; 15] = [
        MessageKey::AlreadyLoggedIn,
        MessageKey::RegistrationDisabled,
        MessageKey::NameAlreadyRegistered,
        MessageKey::MaxRegistrationsExceeded,
        MessageKey::MaxEmailRegistrationsExceeded,
        MessageKey::EmailInvalid,
        MessageKey::PasswordLength,
        MessageKey::PasswordCharacters,
        MessageKey::PasswordIsUsername,
        MessageKey::PasswordUnsafe,
        MessageKey::CodeNotRequested,
        MessageKey::CodeExpired,
        MessageKey::CodeIncorrect,
        MessageKey::RegisterSuccess,
        MessageKey::ErrorOccurred,
    ];

    /// Catalogue path of the message text.
    pub fn path(&self) -> &'static str {
        match self {
            MessageKey::AlreadyLoggedIn => "error.logged_in",
            MessageKey::RegistrationDisabled => "registration.disabled",
            MessageKey::NameAlreadyRegistered => "registration.name_taken",
            MessageKey::MaxRegistrationsExceeded => "registration.max_per_address",
            MessageKey::MaxEmailRegistrationsExceeded => "email.max_registrations",
            MessageKey::EmailInvalid => "email.invalid",
            MessageKey::PasswordLength => "password.length",
            MessageKey::PasswordCharacters => "password.characters",
            MessageKey::PasswordIsUsername => "password.is_username",
            MessageKey::PasswordUnsafe => "password.unsafe",
            MessageKey::CodeNotRequested => "code.not_requested",
            MessageKey::CodeExpired => "code.expired",
            MessageKey::CodeIncorrect => "code.incorrect",
            MessageKey::RegisterSuccess => "registration.success",
            MessageKey::ErrorOccurred => "error.unexpected",
        }
    }
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Delivers outcome messages to actors.
pub trait Messenger: Send + Sync {
    /// Send a message with `{{name}}` placeholder arguments.
    fn send_with(&self, actor: &Actor, key: MessageKey, args: &[(&str, &str)]);

    /// Send a message without arguments.
    fn send(&self, actor: &Actor, key: MessageKey) {
        self.send_with(actor, key, &[]);
    }
}
