//! Process configuration.
//!
//! [`Config`] is what the operator writes (a YAML file named by
//! `CITADEL_CONFIG`, or environment variables). [`ServerConfig`] is the
//! validated, immutable form one listening server and all of its sessions
//! share.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tokio_rustls::TlsAcceptor;

use crate::fs::{ExtensionMediaTypes, FileResolver, MediaTypeDetector, RootFileResolver};
use crate::report::{ErrorReporter, TracingErrorReporter};
use crate::tls::{self, TlsFiles};

pub const DEFAULT_LISTEN: &str = "127.0.0.1:8080";
pub const DEFAULT_ROOT: &str = "/var/www/html";
pub const DEFAULT_PRODUCT_NAME: &str = "Citadel";

/// Per-connection request policy, shared by every session of a server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SecurityPolicy {
    /// 0 disables the limit.
    pub max_requests_per_connection: u64,
    /// When the limit is reached: `true` ends the connection after that
    /// response, `false` answers further requests with 429.
    pub max_requests_close_immediately: bool,
    /// 0 disables the limit.
    pub max_method_length: usize,
}

/// One listening socket.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListenerConfig {
    pub listen: String,
    pub root: PathBuf,
    #[serde(default)]
    pub tls: bool,
    #[serde(default)]
    pub upgrade_to_https: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(default = "default_product_name")]
    pub product_name: String,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub security: SecurityPolicy,
    #[serde(default)]
    pub tls: Option<TlsFiles>,
    #[serde(default)]
    pub read_timeout_secs: Option<u64>,
    pub servers: Vec<ListenerConfig>,
}

fn default_product_name() -> String {
    DEFAULT_PRODUCT_NAME.to_string()
}

impl Config {
    /// Reads `CITADEL_CONFIG` if set, the environment otherwise.
    pub fn load() -> Result<Self> {
        match std::env::var("CITADEL_CONFIG") {
            Ok(path) => Self::from_file(&path),
            Err(_) => Ok(Self::from_env()),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(text)?;
        if config.servers.is_empty() {
            anyhow::bail!("no servers configured");
        }
        Ok(config)
    }

    /// A single server from `LISTEN`, `WS_ROOT`, `WS_HOSTNAME` and the
    /// `WS_TLS_*` variables. TLS is enabled when a certificate and a private
    /// key are both given.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        let listen = var("LISTEN").unwrap_or_else(|| DEFAULT_LISTEN.to_string());
        let root = var("WS_ROOT").unwrap_or_else(|| DEFAULT_ROOT.to_string());

        let tls = match (var("WS_TLS_CERT"), var("WS_TLS_PRIVATE_KEY")) {
            (Some(certificate), Some(private_key)) => Some(TlsFiles {
                certificate: certificate.into(),
                chain: var("WS_TLS_CHAIN").map(PathBuf::from),
                private_key: private_key.into(),
            }),
            _ => None,
        };

        Self {
            product_name: default_product_name(),
            hostname: var("WS_HOSTNAME"),
            security: SecurityPolicy::default(),
            servers: vec![ListenerConfig {
                listen,
                root: root.into(),
                tls: tls.is_some(),
                upgrade_to_https: false,
            }],
            tls,
            read_timeout_secs: None,
        }
    }

    /// Validates every listener into a [`ServerConfig`].
    ///
    /// The TLS acceptor is built once and shared by all TLS listeners.
    pub fn server_configs(&self) -> Result<Vec<ServerConfig>> {
        let acceptor = if self.servers.iter().any(|s| s.tls) {
            let files = self
                .tls
                .as_ref()
                .context("a server uses TLS but no TLS files are configured")?;
            Some(tls::load_acceptor(files)?)
        } else {
            None
        };

        self.servers
            .iter()
            .map(|server| {
                let mut builder = ServerConfig::builder(&server.root)
                    .listen(&server.listen)
                    .product_name(&self.product_name)
                    .policy(self.security)
                    .read_timeout(self.read_timeout_secs.map(Duration::from_secs));

                if server.tls {
                    builder = builder.tls(acceptor.clone());
                }
                if server.upgrade_to_https {
                    let hostname = self
                        .hostname
                        .clone()
                        .context("upgrade_to_https requires a hostname")?;
                    builder = builder.upgrade_to_https(hostname);
                }

                builder.build()
            })
            .collect()
    }
}

/// Validated configuration of one server, read-only once built.
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    /// Canonical root directory
    pub root: PathBuf,
    pub policy: SecurityPolicy,
    pub product_name: String,
    pub tls: Option<TlsAcceptor>,
    pub read_timeout: Option<Duration>,
    /// Host to redirect plaintext requests to, when upgrading to HTTPS
    pub https_hostname: Option<String>,
    pub resolver: Arc<dyn FileResolver>,
    pub media_types: Arc<dyn MediaTypeDetector>,
    pub reporter: Arc<dyn ErrorReporter>,
}

impl ServerConfig {
    pub fn builder(root: impl Into<PathBuf>) -> ServerConfigBuilder {
        ServerConfigBuilder::new(root)
    }

    pub fn upgrades_to_https(&self) -> bool {
        self.https_hostname.is_some()
    }
}

/// Builder for [`ServerConfig`]. Unset collaborators default to
/// [`RootFileResolver`], [`ExtensionMediaTypes`] and [`TracingErrorReporter`].
pub struct ServerConfigBuilder {
    root: PathBuf,
    listen: String,
    policy: SecurityPolicy,
    product_name: String,
    tls: Option<TlsAcceptor>,
    read_timeout: Option<Duration>,
    https_hostname: Option<String>,
    resolver: Option<Arc<dyn FileResolver>>,
    media_types: Option<Arc<dyn MediaTypeDetector>>,
    reporter: Option<Arc<dyn ErrorReporter>>,
}

impl ServerConfigBuilder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            listen: DEFAULT_LISTEN.to_string(),
            policy: SecurityPolicy::default(),
            product_name: DEFAULT_PRODUCT_NAME.to_string(),
            tls: None,
            read_timeout: None,
            https_hostname: None,
            resolver: None,
            media_types: None,
            reporter: None,
        }
    }

    pub fn listen(mut self, addr: impl Into<String>) -> Self {
        self.listen = addr.into();
        self
    }

    pub fn policy(mut self, policy: SecurityPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn product_name(mut self, name: impl Into<String>) -> Self {
        self.product_name = name.into();
        self
    }

    pub fn tls(mut self, acceptor: Option<TlsAcceptor>) -> Self {
        self.tls = acceptor;
        self
    }

    pub fn read_timeout(mut self, read_timeout: Option<Duration>) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    pub fn upgrade_to_https(mut self, hostname: impl Into<String>) -> Self {
        self.https_hostname = Some(hostname.into());
        self
    }

    pub fn resolver(mut self, resolver: Arc<dyn FileResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn media_types(mut self, media_types: Arc<dyn MediaTypeDetector>) -> Self {
        self.media_types = Some(media_types);
        self
    }

    pub fn reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Canonicalizes the root and parses the listen address.
    pub fn build(self) -> Result<ServerConfig> {
        let root = std::fs::canonicalize(&self.root)
            .with_context(|| format!("resolving root directory {}", self.root.display()))?;
        let listen_addr = self
            .listen
            .parse()
            .with_context(|| format!("invalid listen address {:?}", self.listen))?;

        let resolver = self
            .resolver
            .unwrap_or_else(|| Arc::new(RootFileResolver::new(&root)) as Arc<dyn FileResolver>);

        Ok(ServerConfig {
            listen_addr,
            root,
            policy: self.policy,
            product_name: self.product_name,
            tls: self.tls,
            read_timeout: self.read_timeout,
            https_hostname: self.https_hostname,
            resolver,
            media_types: self
                .media_types
                .unwrap_or_else(|| Arc::new(ExtensionMediaTypes::default()) as Arc<dyn MediaTypeDetector>),
            reporter: self
                .reporter
                .unwrap_or_else(|| Arc::new(TracingErrorReporter) as Arc<dyn ErrorReporter>),
        })
    }
}
