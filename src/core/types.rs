use std::fmt;
use uuid::Uuid;

/// Prefix marking session proxies among the resources of a transaction context.
pub const SESSION_RESOURCE_PREFIX: &str = "_nosqlSESSPROXY_";

/// Key under which a profile's proxy is cached in a transaction context.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey(String);

impl ResourceKey {
    /// Key for the session proxy of `profile`
    pub fn session(profile: &str) -> Self {
        ResourceKey(format!("{}{}", SESSION_RESOURCE_PREFIX, profile))
    }

    /// Arbitrary key for other resources sharing the same context
    pub fn other(name: impl Into<String>) -> Self {
        ResourceKey(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Profile name, if this key names a session proxy
    pub fn profile(&self) -> Option<&str> {
        self.0.strip_prefix(SESSION_RESOURCE_PREFIX)
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of one coordinator transaction branch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Xid(Uuid);

impl Xid {
    /// Generate a new random transaction identifier
    pub fn new() -> Self {
        Xid(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Xid(id)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for Xid {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Xid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "xid_{}", self.0.simple())
    }
}
