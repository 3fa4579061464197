use crate::core::{Result, TxError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Driver family a profile's sessions belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverFamily {
    Graph,
    Document,
}

impl DriverFamily {
    pub fn default_port(&self) -> u16 {
        match self {
            DriverFamily::Graph => 7687,
            DriverFamily::Document => 27017,
        }
    }

    fn from_scheme(scheme: &str) -> Option<Self> {
        match scheme {
            "bolt" | "neo4j" | "graph" => Some(DriverFamily::Graph),
            "mongodb" | "document" => Some(DriverFamily::Document),
            _ => None,
        }
    }

    fn scheme(&self) -> &'static str {
        match self {
            DriverFamily::Graph => "bolt",
            DriverFamily::Document => "mongodb",
        }
    }
}

/// One configured data-source profile
///
/// Similar to a driver connection string plus the name the session is
/// published under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    /// Profile name, unique per configuration
    pub name: String,

    /// Resource name reported by the enlisted participant
    #[serde(default)]
    pub resource_name: Option<String>,

    pub driver: DriverFamily,

    #[serde(default = "default_host")]
    pub host: String,

    /// Defaults to the driver family's port
    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub database: Option<String>,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default, skip_serializing)]
    pub password: Option<String>,

    /// Participant transaction timeout in seconds (0 or absent: coordinator default)
    #[serde(default)]
    pub transaction_timeout: Option<u32>,
}

fn default_host() -> String {
    "localhost".to_string()
}

impl ProfileConfig {
    pub fn new(name: &str, driver: DriverFamily) -> Self {
        Self {
            name: name.to_string(),
            resource_name: None,
            driver,
            host: default_host(),
            port: None,
            database: None,
            username: None,
            password: None,
            transaction_timeout: None,
        }
    }

    /// Set the resource name
    pub fn resource_name(mut self, resource_name: &str) -> Self {
        self.resource_name = Some(resource_name.to_string());
        self
    }

    /// Set the host
    pub fn host(mut self, host: &str) -> Self {
        self.host = host.to_string();
        self
    }

    /// Set the port
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the database name
    pub fn database(mut self, database: &str) -> Self {
        self.database = Some(database.to_string());
        self
    }

    /// Set credentials
    pub fn credentials(mut self, username: &str, password: &str) -> Self {
        self.username = Some(username.to_string());
        self.password = Some(password.to_string());
        self
    }

    /// Set the participant transaction timeout
    pub fn transaction_timeout(mut self, seconds: u32) -> Self {
        self.transaction_timeout = Some(seconds);
        self
    }

    pub fn effective_resource_name(&self) -> String {
        self.resource_name
            .clone()
            .unwrap_or_else(|| format!("nosql/{}", self.name))
    }

    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.driver.default_port())
    }

    pub fn timeout_secs(&self) -> u32 {
        self.transaction_timeout.unwrap_or(0)
    }

    /// Parse from connection string
    ///
    /// Format: "scheme://[username:password@]host[:port][/database]" where the
    /// scheme selects the driver family (`bolt`, `neo4j`, `mongodb`).
    ///
    /// # Examples
    ///
    /// ```
    /// # use nosqltx::ProfileConfig;
    /// let config = ProfileConfig::from_url("graph-db", "bolt://neo4j:secret@db:7687/movies").unwrap();
    /// assert_eq!(config.effective_port(), 7687);
    /// ```
    pub fn from_url(name: &str, url: &str) -> Result<Self> {
        let (scheme, rest) = url
            .split_once("://")
            .ok_or_else(|| TxError::Config("URL must start with '<scheme>://'".to_string()))?;
        let driver = DriverFamily::from_scheme(scheme)
            .ok_or_else(|| TxError::Config(format!("Unsupported scheme '{}'", scheme)))?;

        let mut config = Self::new(name, driver);

        let address = match rest.rsplit_once('@') {
            Some((auth, address)) => {
                let (username, password) = auth
                    .split_once(':')
                    .ok_or_else(|| TxError::Config("Invalid credentials format".to_string()))?;
                config = config.credentials(username, password);
                address
            }
            None => rest,
        };

        let (host_port, database) = match address.split_once('/') {
            Some((host_port, database)) => (host_port, Some(database)),
            None => (address, None),
        };

        match host_port.split_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse()
                    .map_err(|_| TxError::Config(format!("Invalid port '{}'", port)))?;
                config = config.host(host).port(port);
            }
            None => config = config.host(host_port),
        }

        if let Some(database) = database.filter(|db| !db.is_empty()) {
            config = config.database(database);
        }

        Ok(config)
    }

    /// Convert to connection string
    pub fn to_url(&self) -> String {
        let auth = match &self.username {
            Some(username) => format!("{}:***@", username), // Don't expose password
            None => String::new(),
        };
        let database = self
            .database
            .as_ref()
            .map(|db| format!("/{}", db))
            .unwrap_or_default();

        format!(
            "{}://{}{}:{}{}",
            self.driver.scheme(),
            auth,
            self.host,
            self.effective_port(),
            database
        )
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(TxError::Config("Profile name cannot be empty".to_string()));
        }

        if self.host.is_empty() {
            return Err(TxError::Config(format!(
                "Profile '{}': host cannot be empty",
                self.name
            )));
        }

        if self.port == Some(0) {
            return Err(TxError::Config(format!(
                "Profile '{}': port must be > 0",
                self.name
            )));
        }

        if self.username.is_some() != self.password.is_some() {
            return Err(TxError::Config(format!(
                "Profile '{}': username and password must be set together",
                self.name
            )));
        }

        Ok(())
    }
}

/// Every profile of one deployment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfilesConfig {
    #[serde(default)]
    pub profiles: Vec<ProfileConfig>,
}

impl ProfilesConfig {
    /// Parse and validate a `{ "profiles": [...] }` document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ProfilesConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn get(&self, name: &str) -> Option<&ProfileConfig> {
        self.profiles.iter().find(|profile| profile.name == name)
    }

    /// Validate every profile; names and resource names must be unique
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        let mut resources = HashSet::new();

        for profile in &self.profiles {
            profile.validate()?;

            if !names.insert(profile.name.as_str()) {
                return Err(TxError::Config(format!(
                    "Duplicate profile name '{}'",
                    profile.name
                )));
            }
            let resource = profile.effective_resource_name();
            if !resources.insert(resource.clone()) {
                return Err(TxError::Config(format!(
                    "Duplicate resource name '{}'",
                    resource
                )));
            }
        }

        Ok(())
    }
}
