//! Reference connection pool configured from resolved properties.
//!
//! Reads `<prefix>.server`, `<prefix>.password`, `<prefix>.max-idle`,
//! `<prefix>.max-active` and `<prefix>.db` (prefix `redis` by default). On
//! startup it dials the server once and pings the connection before
//! reporting ready. A connection that fails the ping is closed, never pooled.
//!
//! The pool itself only enforces `max-idle` and `max-active`. `password` and
//! `db` are handed to [`Connector::connect`] untouched so a protocol-aware
//! connector can authenticate and select a database; [`TcpConnector`]
//! ignores them.

use crate::error::{ConfigError, ConfigResult};
use crate::resource::{Resource, ResourceKey, ResourceSettings};
use std::fmt;
use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::ops::{Deref, DerefMut};
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

/// Default key prefix.
pub const DEFAULT_PREFIX: &str = "redis";

const DEFAULT_MAX_IDLE: &str = "2";
const DEFAULT_MAX_ACTIVE: &str = "10";
const DEFAULT_DB: &str = "0";

/// Settings read from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSettings {
    pub server: String,
    pub password: String,
    pub max_idle: usize,
    pub max_active: usize,
    pub db: i64,
}

/// Opens and checks connections for a [`ConnectionPool`].
pub trait Connector {
    type Conn;

    fn connect(&self, settings: &PoolSettings) -> io::Result<Self::Conn>;

    /// Verify a connection is usable.
    fn ping(&self, conn: &mut Self::Conn) -> io::Result<()>;
}

/// Plain TCP connector.
///
/// Its ping peeks the socket without blocking: pending data or nothing to
/// read means the peer is alive, end of stream means it hung up.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    pub timeout: Duration,
}

impl Default for TcpConnector {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
        }
    }
}

impl Connector for TcpConnector {
    type Conn = TcpStream;

    fn connect(&self, settings: &PoolSettings) -> io::Result<TcpStream> {
        let mut last_err = None;
        for addr in settings.server.to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, self.timeout) {
                Ok(stream) => return Ok(stream),
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "server address resolved to nothing")
        }))
    }

    fn ping(&self, conn: &mut TcpStream) -> io::Result<()> {
        if let Some(e) = conn.take_error()? {
            return Err(e);
        }
        conn.set_nonblocking(true)?;
        let mut buf = [0u8; 1];
        let peeked = conn.peek(&mut buf);
        conn.set_nonblocking(false)?;
        match peeked {
            Ok(0) => Err(io::Error::new(
                io::ErrorKind::ConnectionAborted,
                "server closed the connection",
            )),
            Ok(_) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(()),
            Err(e) => Err(e),
        }
    }
}

struct PoolState<C> {
    idle: Vec<C>,
    active: usize,
}

/// A bounded pool of connections.
pub struct ConnectionPool<K: Connector> {
    prefix: String,
    connector: K,
    settings: Option<PoolSettings>,
    state: Mutex<PoolState<K::Conn>>,
}

impl<K: Connector> ConnectionPool<K> {
    pub fn new(connector: K) -> Self {
        Self::with_prefix(DEFAULT_PREFIX, connector)
    }

    pub fn with_prefix(prefix: impl Into<String>, connector: K) -> Self {
        Self {
            prefix: prefix.into(),
            connector,
            settings: None,
            state: Mutex::new(PoolState {
                idle: Vec::new(),
                active: 0,
            }),
        }
    }

    fn key(&self, suffix: &str) -> String {
        format!("{}.{}", self.prefix, suffix)
    }

    /// Settings in effect, once initialized.
    pub fn settings(&self) -> Option<&PoolSettings> {
        self.settings.as_ref()
    }

    /// Number of idle connections held.
    pub fn idle_count(&self) -> usize {
        self.state.lock().map(|s| s.idle.len()).unwrap_or(0)
    }

    /// Check out a connection, reusing an idle one when possible.
    ///
    /// Fails when the pool is not initialized or `max-active` connections are
    /// already checked out.
    pub fn get(&self) -> io::Result<Pooled<'_, K>> {
        let settings = self
            .settings
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "pool not initialized"))?;

        let reused = {
            let mut state = self
                .state
                .lock()
                .map_err(|_| io::Error::other("pool state poisoned"))?;
            if settings.max_active > 0 && state.active >= settings.max_active {
                return Err(io::Error::new(
                    io::ErrorKind::WouldBlock,
                    "connection pool exhausted",
                ));
            }
            state.active += 1;
            state.idle.pop()
        };

        let conn = match reused {
            Some(conn) => conn,
            None => match self.connector.connect(settings) {
                Ok(conn) => conn,
                Err(e) => {
                    self.release_slot();
                    return Err(e);
                }
            },
        };

        Ok(Pooled {
            pool: self,
            conn: Some(conn),
        })
    }

    fn release_slot(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.active = state.active.saturating_sub(1);
        }
    }

    fn put_back(&self, conn: K::Conn) {
        let max_idle = self.settings.as_ref().map(|s| s.max_idle).unwrap_or(0);
        if let Ok(mut state) = self.state.lock() {
            state.active = state.active.saturating_sub(1);
            if state.idle.len() < max_idle {
                state.idle.push(conn);
            }
        }
    }
}

impl<K: Connector> Resource for ConnectionPool<K> {
    fn name(&self) -> &str {
        &self.prefix
    }

    fn keys(&self) -> Vec<ResourceKey> {
        vec![
            ResourceKey::string(self.key("server")),
            ResourceKey::string(self.key("password")).with_default(""),
            ResourceKey::int(self.key("max-idle")).with_default(DEFAULT_MAX_IDLE),
            ResourceKey::int(self.key("max-active")).with_default(DEFAULT_MAX_ACTIVE),
            ResourceKey::int(self.key("db")).with_default(DEFAULT_DB),
        ]
    }

    fn initialize(&mut self, settings: &ResourceSettings) -> ConfigResult<()> {
        let count = |suffix: &str| -> ConfigResult<usize> {
            let key = self.key(suffix);
            let value = settings.int(&key)?;
            usize::try_from(value).map_err(|_| {
                ConfigError::invalid_value(&key, &value.to_string(), "must not be negative")
            })
        };

        let pool_settings = PoolSettings {
            server: settings.string(&self.key("server"))?.to_string(),
            password: settings.string(&self.key("password"))?.to_string(),
            max_idle: count("max-idle")?,
            max_active: count("max-active")?,
            db: settings.int(&self.key("db"))?,
        };
        debug!(
            server = %pool_settings.server,
            max_idle = pool_settings.max_idle,
            max_active = pool_settings.max_active,
            db = pool_settings.db,
            "Initializing connection pool"
        );
        self.settings = Some(pool_settings);

        let checked = self.get().and_then(|mut conn| {
            let pinged = self.connector.ping(&mut conn);
            if pinged.is_err() {
                conn.discard();
            }
            pinged
        });
        if let Err(e) = checked {
            if let Ok(mut state) = self.state.lock() {
                state.idle.clear();
                state.active = 0;
            }
            self.settings = None;
            return Err(ConfigError::resource_start(&self.prefix, e));
        }
        Ok(())
    }

    fn shutdown(&mut self) -> ConfigResult<()> {
        if let Ok(mut state) = self.state.lock() {
            state.idle.clear();
        }
        self.settings = None;
        Ok(())
    }
}

/// A checked-out connection, returned to the pool on drop.
pub struct Pooled<'a, K: Connector> {
    pool: &'a ConnectionPool<K>,
    conn: Option<K::Conn>,
}

impl<K: Connector> Pooled<'_, K> {
    /// Close the connection instead of returning it to the pool.
    pub fn discard(mut self) {
        if self.conn.take().is_some() {
            self.pool.release_slot();
        }
    }
}

impl<K: Connector> fmt::Debug for Pooled<'_, K>
where
    K::Conn: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pooled").field("conn", &self.conn).finish()
    }
}

impl<K: Connector> Deref for Pooled<'_, K> {
    type Target = K::Conn;

    fn deref(&self) -> &K::Conn {
        self.conn.as_ref().expect("connection present until drop")
    }
}

impl<K: Connector> DerefMut for Pooled<'_, K> {
    fn deref_mut(&mut self) -> &mut K::Conn {
        self.conn.as_mut().expect("connection present until drop")
    }
}

impl<K: Connector> Drop for Pooled<'_, K> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.put_back(conn);
        }
    }
}
