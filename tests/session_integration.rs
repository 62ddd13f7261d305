//! Integration tests for the login/restore cycle through the public API
//!
//! These drive the manager and the strategy together over the same request
//! context, the way a request pipeline would.

use futures::future::BoxFuture;
use multi_session::session::{BoxError, DeserializeResult, RequestEvent, SerializeResult};
use multi_session::{
    AuthenticateOptions, Deserializer, EventStream, LoginInfo, RequestContext, Restored,
    SessionConfig, SessionContainer, SessionManager, SessionStrategy, Serializer,
};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Identity as the application sees it
#[derive(Debug, Clone, PartialEq)]
struct Account {
    id: u64,
    email: String,
    tenant: String,
}

/// Stands in for a user database behind async lookups
#[derive(Default)]
struct Directory {
    accounts: Mutex<HashMap<u64, String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    lookups: Mutex<Vec<u64>>,
}

impl Directory {
    fn with_accounts(accounts: &[(u64, &str)]) -> Arc<Self> {
        let directory = Directory::default();
        {
            let mut map = directory.accounts.lock().unwrap();
            for (id, email) in accounts {
                map.insert(*id, email.to_string());
            }
        }
        Arc::new(directory)
    }
}

fn account(id: u64, email: &str) -> Account {
    Account {
        id,
        email: email.to_string(),
        tenant: String::new(),
    }
}

fn manager() -> SessionManager<RequestContext, Account> {
    SessionManager::new(
        SessionConfig::default(),
        Serializer::new(|account: &Account| -> BoxFuture<'static, SerializeResult> {
            let value = json!({ "id": account.id });
            Box::pin(async move { Ok::<Value, BoxError>(value) })
        }),
    )
}

/// Deserializer that looks accounts up asynchronously and tags them with the
/// tenant named by the request's selector, if any
fn strategy(directory: Arc<Directory>) -> SessionStrategy<RequestContext, Account> {
    SessionStrategy::new(
        SessionConfig::default(),
        Deserializer::with_context(
            move |ctx: &RequestContext, value: Value| -> BoxFuture<'static, DeserializeResult<Account>> {
                let directory = Arc::clone(&directory);
                let tenant = ctx.selector.clone().unwrap_or_default();
                Box::pin(async move {
                    let Some(id) = value["id"].as_u64() else {
                        return Err(BoxError::from("stored user has no numeric id"));
                    };
                    let now = directory.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    directory.max_in_flight.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    directory.in_flight.fetch_sub(1, Ordering::SeqCst);
                    directory.lookups.lock().unwrap().push(id);

                    let email = directory.accounts.lock().unwrap().get(&id).cloned();
                    Ok::<_, BoxError>(email.map(|email| Account { id, email, tenant }))
                })
            },
        ),
    )
}

#[tokio::test]
async fn test_login_then_restore_default() {
    let directory = Directory::with_accounts(&[(1, "jane@example.com")]);
    let mut ctx = RequestContext::new();

    let handle = manager()
        .log_in(&mut ctx, &account(1, "jane@example.com"), &LoginInfo::method("password"))
        .await
        .unwrap();

    let restored = strategy(directory)
        .authenticate(&mut ctx, &AuthenticateOptions::default())
        .await
        .unwrap();

    match restored {
        Restored::Single { user, info } => {
            assert_eq!(user.email, "jane@example.com");
            assert_eq!(info.session_selector, handle);
        }
        other => panic!("expected a single account, got {:?}", other),
    }
}

#[tokio::test]
async fn test_multi_restore_is_sequential_and_ordered() {
    let directory = Directory::with_accounts(&[
        (1, "jane@example.com"),
        (2, "john@example.com"),
        (3, "ops@example.com"),
    ]);
    let manager = manager();
    let mut ctx = RequestContext::new();
    let mut handles = Vec::new();
    for (id, email) in [(3, "ops@example.com"), (1, "jane@example.com"), (2, "john@example.com")] {
        handles.push(
            manager
                .log_in(&mut ctx, &account(id, email), &LoginInfo::method("password"))
                .await
                .unwrap(),
        );
    }

    let restored = strategy(Arc::clone(&directory))
        .authenticate(&mut ctx, &AuthenticateOptions::multi())
        .await
        .unwrap();

    let ids: Vec<u64> = restored.users().iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![3, 1, 2]);
    let selectors: Vec<_> = restored
        .infos()
        .iter()
        .map(|i| i.session_selector.clone())
        .collect();
    assert_eq!(selectors, handles);
    assert_eq!(directory.max_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(*directory.lookups.lock().unwrap(), vec![3, 1, 2]);
}

#[tokio::test]
async fn test_contextual_deserializer_sees_selector() {
    let directory = Directory::with_accounts(&[(1, "jane@example.com"), (2, "john@example.com")]);
    let manager = manager();
    let mut ctx = RequestContext::new();
    manager
        .log_in(&mut ctx, &account(1, "jane@example.com"), &LoginInfo::method("password"))
        .await
        .unwrap();
    let second = manager
        .log_in(&mut ctx, &account(2, "john@example.com"), &LoginInfo::method("password"))
        .await
        .unwrap();

    let mut ctx = ctx.select(second.clone());
    let restored = strategy(directory)
        .authenticate(&mut ctx, &AuthenticateOptions::multi())
        .await
        .unwrap();

    match restored {
        Restored::Single { user, .. } => {
            assert_eq!(user.id, 2);
            assert_eq!(user.tenant, second);
        }
        other => panic!("expected selected account, got {:?}", other),
    }
}

#[tokio::test]
async fn test_deleted_account_is_not_restored() {
    let directory = Directory::with_accounts(&[(1, "jane@example.com"), (2, "john@example.com")]);
    let manager = manager();
    let mut ctx = RequestContext::new();
    let first = manager
        .log_in(&mut ctx, &account(1, "jane@example.com"), &LoginInfo::method("password"))
        .await
        .unwrap();
    manager
        .log_in(&mut ctx, &account(2, "john@example.com"), &LoginInfo::method("otp"))
        .await
        .unwrap();

    directory.accounts.lock().unwrap().remove(&1);
    let strategy = strategy(directory);

    let restored = strategy
        .authenticate(&mut ctx, &AuthenticateOptions::default())
        .await
        .unwrap();
    assert!(restored.is_anonymous());
    assert_eq!(ctx.forgotten, vec![first.clone()]);

    let restored = strategy
        .authenticate(&mut ctx, &AuthenticateOptions::multi())
        .await
        .unwrap();
    match restored {
        Restored::Single { user, info } => {
            assert_eq!(user.id, 2);
            assert_eq!(info.methods.unwrap()[0].method.as_deref(), Some("otp"));
        }
        other => panic!("expected the remaining account, got {:?}", other),
    }
}

#[tokio::test]
async fn test_events_are_held_until_restore_finishes() {
    let directory = Directory::with_accounts(&[(1, "jane@example.com")]);
    let (stream, mut rx) = EventStream::channel();
    let mut ctx = RequestContext::new().with_stream(stream.clone());
    manager()
        .log_in(&mut ctx, &account(1, "jane@example.com"), &LoginInfo::method("password"))
        .await
        .unwrap();

    let strategy = strategy(directory);
    let options = AuthenticateOptions::default().with_pause_stream();
    let emitter = stream.clone();
    let (restored, _) = tokio::join!(strategy.authenticate(&mut ctx, &options), async move {
        // Lands while the lookup is sleeping
        tokio::time::sleep(Duration::from_millis(2)).await;
        emitter.emit(RequestEvent::Data(b"body".to_vec()));
    });

    assert!(!restored.unwrap().is_anonymous());
    assert!(!stream.is_paused());
    assert_eq!(stream.resume_count(), 1);
    assert_eq!(
        rx.recv().await,
        Some(RequestEvent::Data(b"body".to_vec()))
    );
}

#[tokio::test]
async fn test_store_written_by_other_process_is_read_back() {
    let container: SessionContainer = serde_json::from_value(json!({
        "cart": { "items": 3 },
        "multisession": {
            "default": "b2",
            "sessions": {
                "a1": { "user": { "id": 1 }, "methods": [ { "type": "password", "timestamp": "2024-05-01T10:00:00Z" } ] },
                "b2": { "user": { "id": 2 }, "methods": [ { "method": "otp", "timestamp": "2024-05-02T10:00:00Z", "device": "phone" } ] }
            }
        }
    }))
    .unwrap();
    let directory = Directory::with_accounts(&[(1, "jane@example.com"), (2, "john@example.com")]);
    let mut ctx = RequestContext::with_session(container);

    let restored = strategy(directory)
        .authenticate(&mut ctx, &AuthenticateOptions::default())
        .await
        .unwrap();
    let info = restored.infos()[0].clone();
    assert_eq!(info.session_selector, "b2");

    // A later login of account 1 keeps unknown fields and other middleware's data
    manager()
        .log_in(&mut ctx, &account(1, "jane@example.com"), &LoginInfo::method("otp"))
        .await
        .unwrap();
    let session = serde_json::to_value(ctx.session.as_ref().unwrap()).unwrap();
    assert_eq!(session["cart"], json!({ "items": 3 }));
    assert_eq!(session["multisession"]["default"], json!("b2"));
    assert_eq!(
        session["multisession"]["sessions"]["b2"]["methods"][0]["device"],
        json!("phone")
    );
    let a1_methods = session["multisession"]["sessions"]["a1"]["methods"]
        .as_array()
        .unwrap();
    assert_eq!(a1_methods.len(), 2);
    assert_eq!(a1_methods[0]["type"], json!("password"));
}
