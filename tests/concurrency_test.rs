//! Concurrency tests for the registration pipeline.
//!
//! These run many attempts at once against a real SQLite database and
//! check that the per-name lock and the unique index keep one account
//! per name.

mod common;

use std::sync::Arc;

use common::{config, remote_actor, RecordingMessenger};
use gatekeep::db::AccountRepository;
use gatekeep::{
    AsyncRegister, Database, MessageKey, PendingCodes, RegistrationContext, SessionCache,
    VerificationCodeExecutor,
};

/// Pipeline over a file database so several pool connections are in play.
async fn setup(dir: &tempfile::TempDir) -> (Arc<AsyncRegister>, Database, Arc<RecordingMessenger>) {
    let db = Database::open(dir.path().join("gatekeep.db")).await.unwrap();
    let messenger = RecordingMessenger::new();
    let context = RegistrationContext::new(
        Arc::new(config(true, 0)),
        Arc::new(SessionCache::new()),
        Arc::new(db.clone()),
        messenger.clone(),
    )
    .unwrap();
    (Arc::new(AsyncRegister::new(context)), db, messenger)
}

/// Many simultaneous attempts for one name create exactly one account.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_same_name_creates_one_account() {
    let dir = tempfile::tempdir().unwrap();
    let (register, db, messenger) = setup(&dir).await;
    let codes = Arc::new(PendingCodes::from_secs(600));
    codes.issue("robert", "777777");

    const ATTEMPTS: usize = 10;

    let mut handles = Vec::new();
    for i in 0..ATTEMPTS {
        // Mixed case: the lock and the index are both case-insensitive.
        let name = if i % 2 == 0 { "robert" } else { "ROBERT" };
        let actor = remote_actor(name);
        let executor = VerificationCodeExecutor::new(
            register.context(),
            Arc::clone(&codes),
            actor.clone(),
            "777777",
        );
        handles.push(register.spawn_register(actor, Box::new(executor)));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let repo = AccountRepository::new(db.pool());
    assert_eq!(repo.count().await.unwrap(), 1);

    let keys = messenger.keys();
    let successes = keys.iter().filter(|k| **k == MessageKey::RegisterSuccess).count();
    assert_eq!(successes, 1);
    assert_eq!(keys.len(), ATTEMPTS);
    // Losers queue on the name lock and find the name taken.
    assert!(keys
        .iter()
        .filter(|k| **k != MessageKey::RegisterSuccess)
        .all(|k| *k == MessageKey::NameAlreadyRegistered));

    db.close().await;
}

/// Attempts for different names do not interfere.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_distinct_names_all_succeed() {
    let dir = tempfile::tempdir().unwrap();
    let (register, db, messenger) = setup(&dir).await;
    let codes = Arc::new(PendingCodes::from_secs(600));

    const USERS: usize = 12;

    let mut handles = Vec::new();
    for i in 0..USERS {
        let name = format!("user{i}");
        codes.issue(&name, format!("{i:06}"));
        let actor = remote_actor(&name);
        let executor = VerificationCodeExecutor::new(
            register.context(),
            Arc::clone(&codes),
            actor.clone(),
            format!("{i:06}"),
        );
        handles.push(register.spawn_register(actor, Box::new(executor)));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let repo = AccountRepository::new(db.pool());
    assert_eq!(repo.count().await.unwrap(), USERS as i64);
    assert!(messenger.keys().iter().all(|k| *k == MessageKey::RegisterSuccess));
    assert!(codes.is_empty());

    db.close().await;
}
