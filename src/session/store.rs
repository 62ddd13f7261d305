use crate::env;
use crate::session::types::{Handle, SessionError};
use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// One recorded authentication event
///
/// Stores written by other implementations may name the discriminator
/// `type` instead of `method`, or leave out the timestamp; both decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodEvent {
    /// How the identity was verified (password, otp, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Login kind, `federated` for logins through an external provider
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(
        default,
        rename = "idToken",
        skip_serializing_if = "Option::is_none"
    )]
    pub id_token: Option<String>,
    /// Fields written by other writers of the same store, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MethodEvent {
    /// Build the event recorded for a login described by `info`
    pub fn from_info(info: &LoginInfo, timestamp: DateTime<Utc>) -> Self {
        let federated = info.is_federated();

        Self {
            method: info.method.clone(),
            kind: info.kind.clone().filter(|_| federated),
            timestamp: Some(timestamp),
            provider: info.provider.clone().filter(|_| federated),
            protocol: info.protocol.clone().filter(|_| federated),
            id_token: info.id_token.clone().filter(|_| federated),
            extra: Map::new(),
        }
    }

    /// What two events are compared by: `method`, else `type`
    pub fn discriminator(&self) -> Option<&str> {
        self.method.as_deref().or(self.kind.as_deref())
    }
}

/// Description of how an identity was just authenticated
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(
        default,
        rename = "idToken",
        skip_serializing_if = "Option::is_none"
    )]
    pub id_token: Option<String>,
}

impl LoginInfo {
    pub fn method(method: impl Into<String>) -> Self {
        Self {
            method: Some(method.into()),
            ..Default::default()
        }
    }

    pub fn federated(provider: impl Into<String>, protocol: impl Into<String>) -> Self {
        Self {
            kind: Some(env::session::FEDERATED_KIND.to_string()),
            provider: Some(provider.into()),
            protocol: Some(protocol.into()),
            ..Default::default()
        }
    }

    pub fn with_id_token(mut self, id_token: impl Into<String>) -> Self {
        self.id_token = Some(id_token.into());
        self
    }

    pub fn is_federated(&self) -> bool {
        self.kind.as_deref() == Some(env::session::FEDERATED_KIND)
    }
}

/// One authenticated identity and its method history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(default)]
    pub user: Value,
    /// Absent in records written without a method history; an empty list stays empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub methods: Option<Vec<MethodEvent>>,
}

impl SessionRecord {
    pub fn new(user: Value, event: MethodEvent) -> Self {
        Self {
            user,
            methods: Some(vec![event]),
        }
    }

    /// Recorded events, oldest first
    pub fn events(&self) -> &[MethodEvent] {
        self.methods.as_deref().unwrap_or(&[])
    }
}

/// Handle → record mapping that keeps insertion order through serialization
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionMap {
    entries: Vec<(Handle, SessionRecord)>,
}

impl SessionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, handle: &str) -> bool {
        self.get(handle).is_some()
    }

    pub fn get(&self, handle: &str) -> Option<&SessionRecord> {
        self.entries
            .iter()
            .find(|(h, _)| h == handle)
            .map(|(_, record)| record)
    }

    pub fn get_mut(&mut self, handle: &str) -> Option<&mut SessionRecord> {
        self.entries
            .iter_mut()
            .find(|(h, _)| h == handle)
            .map(|(_, record)| record)
    }

    /// Insert or replace; a new handle goes to the end
    pub fn insert(&mut self, handle: Handle, record: SessionRecord) {
        match self.get_mut(&handle) {
            Some(existing) => *existing = record,
            None => self.entries.push((handle, record)),
        }
    }

    pub fn remove(&mut self, handle: &str) -> Option<SessionRecord> {
        let index = self.entries.iter().position(|(h, _)| h == handle)?;
        Some(self.entries.remove(index).1)
    }

    pub fn handles(&self) -> impl Iterator<Item = &Handle> {
        self.entries.iter().map(|(h, _)| h)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Handle, &SessionRecord)> {
        self.entries.iter().map(|(h, record)| (h, record))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&Handle, &mut SessionRecord)> {
        self.entries.iter_mut().map(|(h, record)| (&*h, record))
    }
}

impl Serialize for SessionMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (handle, record) in &self.entries {
            map.serialize_entry(handle, record)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SessionMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SessionMapVisitor;

        impl<'de> Visitor<'de> for SessionMapVisitor {
            type Value = SessionMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of session handles to records")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<SessionMap, A::Error> {
                let mut sessions = SessionMap::new();
                while let Some((handle, record)) = access.next_entry::<Handle, SessionRecord>()? {
                    sessions.insert(handle, record);
                }
                Ok(sessions)
            }
        }

        deserializer.deserialize_map(SessionMapVisitor)
    }
}

/// Per-client multi-identity state, nested in the session container under a key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStore {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Handle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sessions: Option<SessionMap>,
}

impl SessionStore {
    pub fn has_sessions(&self) -> bool {
        self.sessions.as_ref().is_some_and(|s| !s.is_empty())
    }

    pub fn record(&self, handle: &str) -> Option<&SessionRecord> {
        self.sessions.as_ref()?.get(handle)
    }

    /// The record `default` points at, if it still exists
    pub fn default_record(&self) -> Option<(&Handle, &SessionRecord)> {
        let handle = self.default.as_ref()?;
        self.record(handle).map(|record| (handle, record))
    }

    pub fn len(&self) -> usize {
        self.sessions.as_ref().map_or(0, SessionMap::len)
    }

    pub fn is_empty(&self) -> bool {
        !self.has_sessions()
    }
}

/// The per-client session object a request exposes
///
/// Other middleware may keep unrelated values next to the store, so only the
/// property named by the configured key is ever decoded or rewritten.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionContainer(Map<String, Value>);

impl SessionContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.0.get_mut(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Decode the store under `key`; `None` when the property is absent or null
    pub fn load_store(&self, key: &str) -> Result<Option<SessionStore>, SessionError> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => SessionStore::deserialize(value)
                .map(Some)
                .map_err(|source| SessionError::MalformedStore {
                    key: key.to_string(),
                    source,
                }),
        }
    }

    /// Write `store` back under `key`, replacing the previous value
    pub fn save_store(&mut self, key: &str, store: &SessionStore) -> Result<(), SessionError> {
        let value = serde_json::to_value(store).map_err(|source| SessionError::MalformedStore {
            key: key.to_string(),
            source,
        })?;
        self.0.insert(key.to_string(), value);
        Ok(())
    }
}

impl From<Map<String, Value>> for SessionContainer {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
