use crate::env;
use crate::session::store::MethodEvent;
use serde_json::Value;

/// Decides when a login refers to an already recorded account, and when an
/// authentication event repeats one already in that account's history.
pub trait IdentityPolicy: Send + Sync {
    fn equals_user(&self, a: &Value, b: &Value) -> bool;

    fn equals_method(&self, a: &MethodEvent, b: &MethodEvent) -> bool {
        a.discriminator() == b.discriminator()
    }
}

/// Compares scalar identities directly and structured identities by one id field
#[derive(Debug, Clone)]
pub struct IdFieldPolicy {
    field: String,
}

impl IdFieldPolicy {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }
}

impl Default for IdFieldPolicy {
    fn default() -> Self {
        Self::new(env::session::DEFAULT_ID_FIELD)
    }
}

impl IdentityPolicy for IdFieldPolicy {
    fn equals_user(&self, a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => match (a.get(&self.field), b.get(&self.field)) {
                (Some(x), Some(y)) => !x.is_null() && x == y,
                _ => false,
            },
            _ => false,
        }
    }
}

impl<F> IdentityPolicy for F
where
    F: Fn(&Value, &Value) -> bool + Send + Sync,
{
    fn equals_user(&self, a: &Value, b: &Value) -> bool {
        self(a, b)
    }
}
