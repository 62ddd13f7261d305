//! Identity (de)serialization hooks supplied by the application.
//!
//! Each hook comes in two shapes: one that only sees the identity, and one
//! that also sees the request context (for lookups scoped to the request).
//! The shape is fixed when the hook is constructed, so dispatch never has to
//! be decided per call.

use crate::session::types::BoxError;
use futures::future::{self, BoxFuture};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

pub type SerializeResult = Result<Value, BoxError>;
pub type DeserializeResult<U> = Result<Option<U>, BoxError>;

type PlainSerializeFn<U> = dyn Fn(&U) -> BoxFuture<'static, SerializeResult> + Send + Sync;
type ContextSerializeFn<C, U> =
    dyn Fn(&C, &U) -> BoxFuture<'static, SerializeResult> + Send + Sync;
type PlainDeserializeFn<U> =
    dyn Fn(Value) -> BoxFuture<'static, DeserializeResult<U>> + Send + Sync;
type ContextDeserializeFn<C, U> =
    dyn Fn(&C, Value) -> BoxFuture<'static, DeserializeResult<U>> + Send + Sync;

/// Turns an identity into the opaque value stored in the session
pub enum Serializer<C, U> {
    Plain(Arc<PlainSerializeFn<U>>),
    Contextual(Arc<ContextSerializeFn<C, U>>),
}

impl<C, U> Serializer<C, U> {
    /// Asynchronous hook that only sees the identity
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&U) -> BoxFuture<'static, SerializeResult> + Send + Sync + 'static,
    {
        Serializer::Plain(Arc::new(f))
    }

    /// Asynchronous hook that also sees the request context
    pub fn with_context<F>(f: F) -> Self
    where
        F: Fn(&C, &U) -> BoxFuture<'static, SerializeResult> + Send + Sync + 'static,
    {
        Serializer::Contextual(Arc::new(f))
    }

    /// Synchronous hook that only sees the identity
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&U) -> SerializeResult + Send + Sync + 'static,
    {
        Serializer::Plain(Arc::new(move |user: &U| -> BoxFuture<'static, SerializeResult> {
            Box::pin(future::ready(f(user)))
        }))
    }

    pub fn takes_context(&self) -> bool {
        matches!(self, Serializer::Contextual(_))
    }

    pub fn serialize(&self, ctx: &C, user: &U) -> BoxFuture<'static, SerializeResult> {
        match self {
            Serializer::Plain(f) => f(user),
            Serializer::Contextual(f) => f(ctx, user),
        }
    }
}

impl<C, U> Clone for Serializer<C, U> {
    fn clone(&self) -> Self {
        match self {
            Serializer::Plain(f) => Serializer::Plain(Arc::clone(f)),
            Serializer::Contextual(f) => Serializer::Contextual(Arc::clone(f)),
        }
    }
}

impl<C, U> fmt::Debug for Serializer<C, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Serializer::Plain(_) => f.write_str("Serializer::Plain"),
            Serializer::Contextual(_) => f.write_str("Serializer::Contextual"),
        }
    }
}

/// Turns a stored value back into an identity; `Ok(None)` means the identity
/// no longer resolves (deleted account, revoked access, ...)
pub enum Deserializer<C, U> {
    Plain(Arc<PlainDeserializeFn<U>>),
    Contextual(Arc<ContextDeserializeFn<C, U>>),
}

impl<C, U> Deserializer<C, U> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Value) -> BoxFuture<'static, DeserializeResult<U>> + Send + Sync + 'static,
    {
        Deserializer::Plain(Arc::new(f))
    }

    pub fn with_context<F>(f: F) -> Self
    where
        F: Fn(&C, Value) -> BoxFuture<'static, DeserializeResult<U>> + Send + Sync + 'static,
    {
        Deserializer::Contextual(Arc::new(f))
    }

    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(Value) -> DeserializeResult<U> + Send + Sync + 'static,
        U: Send + 'static,
    {
        Deserializer::Plain(Arc::new(
            move |value: Value| -> BoxFuture<'static, DeserializeResult<U>> {
                Box::pin(future::ready(f(value)))
            },
        ))
    }

    pub fn takes_context(&self) -> bool {
        matches!(self, Deserializer::Contextual(_))
    }

    pub fn deserialize(&self, ctx: &C, value: Value) -> BoxFuture<'static, DeserializeResult<U>> {
        match self {
            Deserializer::Plain(f) => f(value),
            Deserializer::Contextual(f) => f(ctx, value),
        }
    }
}

impl<C, U> Clone for Deserializer<C, U> {
    fn clone(&self) -> Self {
        match self {
            Deserializer::Plain(f) => Deserializer::Plain(Arc::clone(f)),
            Deserializer::Contextual(f) => Deserializer::Contextual(Arc::clone(f)),
        }
    }
}

impl<C, U> fmt::Debug for Deserializer<C, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Deserializer::Plain(_) => f.write_str("Deserializer::Plain"),
            Deserializer::Contextual(_) => f.write_str("Deserializer::Contextual"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Ctx {
        tenant: String,
    }

    #[tokio::test]
    async fn test_plain_serializer_ignores_context() {
        let serializer: Serializer<Ctx, String> = Serializer::from_fn(|user: &String| Ok(json!(user)));
        assert!(!serializer.takes_context());

        let ctx = Ctx {
            tenant: "acme".to_string(),
        };
        let value = serializer.serialize(&ctx, &"jane".to_string()).await.unwrap();
        assert_eq!(value, json!("jane"));
    }

    #[tokio::test]
    async fn test_contextual_serializer_sees_context() {
        let serializer: Serializer<Ctx, String> =
            Serializer::with_context(|ctx: &Ctx, user: &String| -> BoxFuture<'static, SerializeResult> {
                let value = json!({ "id": user, "tenant": ctx.tenant });
                Box::pin(async move { Ok::<_, BoxError>(value) })
            });
        assert!(serializer.takes_context());

        let ctx = Ctx {
            tenant: "acme".to_string(),
        };
        let value = serializer.serialize(&ctx, &"jane".to_string()).await.unwrap();
        assert_eq!(value, json!({ "id": "jane", "tenant": "acme" }));
    }

    #[tokio::test]
    async fn test_hook_is_called_once_per_invocation() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let deserializer: Deserializer<Ctx, String> = Deserializer::from_fn(move |value: Value| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(value.as_str().map(str::to_string))
        });

        let ctx = Ctx {
            tenant: String::new(),
        };
        let user = deserializer.deserialize(&ctx, json!("jane")).await.unwrap();
        assert_eq!(user.as_deref(), Some("jane"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let gone = deserializer.deserialize(&ctx, json!(42)).await.unwrap();
        assert!(gone.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
