use crate::error::{
    BadEnvVarSnafu, ParseConfigNumberSnafu, ParseServerAddressSnafu, RosterResult,
};
use secrecy::SecretString;
use snafu::ResultExt;
use std::{env::VarError, net::SocketAddr, sync::Arc, time::Duration};

const DEFAULT_SERVER_IP: &str = "127.0.0.1:8080";
const DEFAULT_MAX_CONNECTIONS: u32 = 15;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Clone, Debug)]
pub struct RuntimeConfiguration {
    db_config: Arc<DbConfig>,
    server_config: ServerConfig,
}

impl RuntimeConfiguration {
    pub fn new() -> RosterResult<Self> {
        Self::from_lookup(dotenvy::var)
    }

    pub fn from_lookup(
        lookup: impl Fn(&'static str) -> Result<String, dotenvy::Error>,
    ) -> RosterResult<Self> {
        Ok(Self {
            db_config: Arc::new(DbConfig::new(&lookup)?),
            server_config: ServerConfig::new(&lookup)?,
        })
    }

    pub fn db_config(&self) -> Arc<DbConfig> {
        self.db_config.clone()
    }

    pub const fn server_config(&self) -> &ServerConfig {
        &self.server_config
    }
}

#[derive(Debug)]
pub struct DbConfig {
    url: SecretString,
    max_connections: u32,
}

impl DbConfig {
    fn new(lookup: &impl Fn(&'static str) -> Result<String, dotenvy::Error>) -> RosterResult<Self> {
        let max_connections = match optional(lookup, "ROSTER_MAX_CONNECTIONS")? {
            Some(n) => n.parse().context(ParseConfigNumberSnafu {
                name: "ROSTER_MAX_CONNECTIONS",
            })?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self {
            url: SecretString::from(required(lookup, "DATABASE_URL")?),
            max_connections,
        })
    }

    pub const fn url(&self) -> &SecretString {
        &self.url
    }

    pub const fn max_connections(&self) -> u32 {
        self.max_connections
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub address: SocketAddr,
    pub request_timeout: Duration,
}

impl ServerConfig {
    fn new(lookup: &impl Fn(&'static str) -> Result<String, dotenvy::Error>) -> RosterResult<Self> {
        let address = optional(lookup, "ROSTER_SERVER_IP")?
            .unwrap_or_else(|| DEFAULT_SERVER_IP.to_owned());
        let address = address
            .parse()
            .context(ParseServerAddressSnafu { original: address })?;

        let request_timeout = match optional(lookup, "ROSTER_REQUEST_TIMEOUT_SECS")? {
            Some(secs) => secs.parse().context(ParseConfigNumberSnafu {
                name: "ROSTER_REQUEST_TIMEOUT_SECS",
            })?,
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        Ok(Self {
            address,
            request_timeout: Duration::from_secs(request_timeout),
        })
    }
}

fn required(
    lookup: &impl Fn(&'static str) -> Result<String, dotenvy::Error>,
    name: &'static str,
) -> RosterResult<String> {
    lookup(name).context(BadEnvVarSnafu { name })
}

fn optional(
    lookup: &impl Fn(&'static str) -> Result<String, dotenvy::Error>,
    name: &'static str,
) -> RosterResult<Option<String>> {
    match lookup(name) {
        Ok(value) => Ok(Some(value)),
        Err(dotenvy::Error::EnvVar(VarError::NotPresent)) => Ok(None),
        Err(source) => Err(source).context(BadEnvVarSnafu { name }),
    }
}
