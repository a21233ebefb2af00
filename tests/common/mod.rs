//! Test helpers for registration tests.
//!
//! Recording fakes for the data source, messenger and executor, plus
//! builders for configured pipelines.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use gatekeep::{
    Account, Actor, AsyncRegister, Config, DataSource, ExecutionOutcome, GatekeepError,
    MessageKey, Messenger, NewAccount, RegistrationContext, RegistrationExecutor, Result,
    SessionCache,
};

/// Address used by most test actors.
pub const REMOTE_ADDRESS: &str = "33.44.55.66";

/// An actor connecting from [`REMOTE_ADDRESS`].
pub fn remote_actor(name: &str) -> Actor {
    Actor::new(name, REMOTE_ADDRESS.parse().unwrap())
}

/// Configuration with the two settings the pipeline reads.
pub fn config(enabled: bool, max_per_address: i64) -> Config {
    let mut config = Config::default();
    config.registration.enabled = enabled;
    config.restriction.max_registrations_per_address = max_per_address;
    config
}

/// Data source that records every call.
#[derive(Default)]
pub struct RecordingDataSource {
    accounts: Mutex<HashMap<String, Account>>,
    next_id: AtomicUsize,
    fail: AtomicBool,
    fail_address_counts: AtomicBool,
    pub presence_checks: AtomicUsize,
    pub address_counts: AtomicUsize,
    pub email_counts: AtomicUsize,
    pub creates: AtomicUsize,
}

impl RecordingDataSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Store an account directly, bypassing call counters.
    pub fn seed(&self, name: &str, address: &str) {
        let new = NewAccount::new(
            name,
            address.parse::<IpAddr>().unwrap(),
            gatekeep::RegistrationMethod::Password,
        );
        let account = self.to_account(&new);
        self.accounts.lock().unwrap().insert(account.username.clone(), account);
    }

    /// Make every later call fail with a database error.
    pub fn fail_all(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    /// Make only the per-address count fail.
    pub fn fail_address_counts(&self) {
        self.fail_address_counts.store(true, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.accounts.lock().unwrap().len()
    }

    pub fn presence_checks(&self) -> usize {
        self.presence_checks.load(Ordering::SeqCst)
    }

    pub fn address_counts(&self) -> usize {
        self.address_counts.load(Ordering::SeqCst)
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    /// Total calls of any kind.
    pub fn total_calls(&self) -> usize {
        self.presence_checks()
            + self.address_counts()
            + self.email_counts.load(Ordering::SeqCst)
            + self.creates()
    }

    fn check_failure(&self) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            Err(GatekeepError::Database("connection reset".into()))
        } else {
            Ok(())
        }
    }

    fn to_account(&self, new: &NewAccount) -> Account {
        Account {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) as i64 + 1,
            username: new.username.clone(),
            realname: new.realname.clone(),
            password: new.password.clone(),
            email: new.email.clone(),
            method: new.method.as_str().to_string(),
            registration_ip: new.registration_ip.clone(),
            registered_at: Utc::now(),
        }
    }
}

#[async_trait]
impl DataSource for RecordingDataSource {
    async fn is_account_present(&self, name: &str) -> Result<bool> {
        self.presence_checks.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .contains_key(&gatekeep::normalize_name(name)))
    }

    async fn count_accounts_by_address(&self, address: &str) -> Result<i64> {
        self.address_counts.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        if self.fail_address_counts.load(Ordering::SeqCst) {
            return Err(GatekeepError::Database("database is locked".into()));
        }
        let accounts = self.accounts.lock().unwrap();
        Ok(accounts
            .values()
            .filter(|a| a.registration_ip == address)
            .count() as i64)
    }

    async fn count_accounts_by_email(&self, email: &str) -> Result<i64> {
        self.email_counts.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        let accounts = self.accounts.lock().unwrap();
        Ok(accounts
            .values()
            .filter(|a| a.email.as_deref().is_some_and(|e| e.eq_ignore_ascii_case(email)))
            .count() as i64)
    }

    async fn create_account(&self, account: &NewAccount) -> Result<Account> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(&account.username) {
            return Err(GatekeepError::Conflict("accounts.username".into()));
        }
        let stored = self.to_account(account);
        accounts.insert(stored.username.clone(), stored.clone());
        Ok(stored)
    }

    async fn get_account(&self, name: &str) -> Result<Option<Account>> {
        self.check_failure()?;
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .get(&gatekeep::normalize_name(name))
            .cloned())
    }
}

/// A message as recorded by [`RecordingMessenger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub to: String,
    pub key: MessageKey,
    pub args: Vec<(String, String)>,
}

/// Messenger that keeps everything it is asked to send.
#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<SentMessage>>,
}

impl RecordingMessenger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn keys(&self) -> Vec<MessageKey> {
        self.sent().into_iter().map(|m| m.key).collect()
    }

    pub fn keys_for(&self, name: &str) -> Vec<MessageKey> {
        self.sent()
            .into_iter()
            .filter(|m| m.to == name)
            .map(|m| m.key)
            .collect()
    }
}

impl Messenger for RecordingMessenger {
    fn send_with(&self, actor: &Actor, key: MessageKey, args: &[(&str, &str)]) {
        self.sent.lock().unwrap().push(SentMessage {
            to: actor.name().to_string(),
            key,
            args: args
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });
    }
}

/// Call counters shared with a [`MockExecutor`] after it is moved away.
#[derive(Debug, Default)]
pub struct ExecutorCalls {
    pub admission: AtomicUsize,
    pub execution: AtomicUsize,
}

impl ExecutorCalls {
    pub fn admission(&self) -> usize {
        self.admission.load(Ordering::SeqCst)
    }

    pub fn execution(&self) -> usize {
        self.execution.load(Ordering::SeqCst)
    }
}

/// Executor with a fixed admission answer that creates a bare account.
pub struct MockExecutor {
    admitted: bool,
    data_source: Option<Arc<dyn DataSource>>,
    calls: Arc<ExecutorCalls>,
}

impl MockExecutor {
    /// Executor that never touches persistence.
    pub fn new(admitted: bool) -> (Box<dyn RegistrationExecutor>, Arc<ExecutorCalls>) {
        let calls = Arc::new(ExecutorCalls::default());
        let executor = Self {
            admitted,
            data_source: None,
            calls: Arc::clone(&calls),
        };
        (Box::new(executor), calls)
    }

    /// Executor that stores a passwordless account when executed.
    pub fn storing(
        data_source: Arc<dyn DataSource>,
    ) -> (Box<dyn RegistrationExecutor>, Arc<ExecutorCalls>) {
        let calls = Arc::new(ExecutorCalls::default());
        let executor = Self {
            admitted: true,
            data_source: Some(data_source),
            calls: Arc::clone(&calls),
        };
        (Box::new(executor), calls)
    }
}

#[async_trait]
impl RegistrationExecutor for MockExecutor {
    async fn is_registration_admitted(&self) -> bool {
        self.calls.admission.fetch_add(1, Ordering::SeqCst);
        self.admitted
    }

    async fn execute_registration(&self, actor: &Actor) -> ExecutionOutcome {
        self.calls.execution.fetch_add(1, Ordering::SeqCst);
        let Some(data_source) = &self.data_source else {
            return ExecutionOutcome::Failed;
        };
        let new = NewAccount::new(
            actor.name(),
            actor.address(),
            gatekeep::RegistrationMethod::VerificationCode,
        );
        match data_source.create_account(&new).await {
            Ok(account) => ExecutionOutcome::Registered(account),
            Err(e) if e.is_conflict() => ExecutionOutcome::NameTaken,
            Err(_) => ExecutionOutcome::Failed,
        }
    }
}

/// A pipeline wired to recording fakes.
pub struct Harness {
    pub register: Arc<AsyncRegister>,
    pub context: RegistrationContext,
    pub sessions: Arc<SessionCache>,
    pub data_source: Arc<RecordingDataSource>,
    pub messenger: Arc<RecordingMessenger>,
}

impl Harness {
    pub fn new(config: Config) -> Self {
        let sessions = Arc::new(SessionCache::new());
        let data_source = RecordingDataSource::new();
        let messenger = RecordingMessenger::new();
        let context = RegistrationContext::new(
            Arc::new(config),
            Arc::clone(&sessions),
            data_source.clone(),
            messenger.clone(),
        )
        .unwrap();
        Self {
            register: Arc::new(AsyncRegister::new(context.clone())),
            context,
            sessions,
            data_source,
            messenger,
        }
    }
}
