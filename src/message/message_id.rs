//! Message-ID generation
//!
//! Ids take the form `<timestamp.pid.random@host>`: nanoseconds since the
//! Unix epoch, the process id, 64 bits from a secure random source and the
//! machine hostname.

use std::{
    fmt,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use once_cell::sync::Lazy;
use rand::{rngs::OsRng, RngCore};

use crate::Error;

/// Right hand side used when the hostname is unknown or unusable
pub const FALLBACK_DOMAIN: &str = "localhost.localdomain";

static HOSTNAME: Lazy<String> = Lazy::new(|| match lookup_hostname() {
    Some(host) if is_dot_atom(&host) => host,
    _host => {
        #[cfg(feature = "tracing")]
        tracing::debug!(hostname = ?_host, "using fallback Message-ID domain");
        FALLBACK_DOMAIN.to_owned()
    }
});

#[cfg(feature = "hostname")]
fn lookup_hostname() -> Option<String> {
    hostname::get().ok()?.into_string().ok()
}

#[cfg(not(feature = "hostname"))]
fn lookup_hostname() -> Option<String> {
    None
}

/// RFC 5322 `dot-atom-text`
fn is_dot_atom(s: &str) -> bool {
    !s.is_empty()
        && s.split('.').all(|atom| {
            !atom.is_empty()
                && atom
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-/=?^_`{|}~".contains(&b))
        })
}

/// A secure source of random bytes
///
/// Implementations must fail rather than hand out predictable bytes.
pub trait RandomSource: Send + Sync {
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<(), Error>;
}

/// The operating system's random source
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<(), Error> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| Error::RandomnessUnavailable(e.to_string()))
    }
}

impl<R: RandomSource + ?Sized> RandomSource for Arc<R> {
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<(), Error> {
        (**self).fill_bytes(dest)
    }
}

impl<R: RandomSource + ?Sized> RandomSource for Box<R> {
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<(), Error> {
        (**self).fill_bytes(dest)
    }
}

/// Generates Message-IDs, safe to share between threads
#[derive(Clone)]
pub struct MessageIdGenerator<R = OsRandom> {
    random: R,
    domain: Option<String>,
}

impl<R> fmt::Debug for MessageIdGenerator<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageIdGenerator")
            .field("domain", &self.domain)
            .finish()
    }
}

impl Default for MessageIdGenerator<OsRandom> {
    fn default() -> Self {
        Self::new(OsRandom)
    }
}

impl<R: RandomSource> MessageIdGenerator<R> {
    pub fn new(random: R) -> Self {
        Self {
            random,
            domain: None,
        }
    }

    /// Uses `domain` instead of the hostname
    pub fn with_domain<S: Into<String>>(mut self, domain: S) -> Result<Self, Error> {
        let domain = domain.into();
        if domain.bytes().any(|b| b == b'\r' || b == b'\n') {
            return Err(Error::HeaderInjection("Message-ID".into()));
        }
        if !is_dot_atom(&domain) {
            return Err(Error::InvalidDomain(domain));
        }
        self.domain = Some(domain);
        Ok(self)
    }

    /// Right hand side of generated ids
    pub fn domain(&self) -> &str {
        self.domain.as_deref().unwrap_or(&HOSTNAME)
    }

    pub fn generate(&self) -> Result<String, Error> {
        let mut bytes = [0; 8];
        self.random.fill_bytes(&mut bytes)?;
        let random = u64::from_be_bytes(bytes);

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();

        Ok(format!(
            "<{}.{}.{}@{}>",
            timestamp,
            std::process::id(),
            random,
            self.domain()
        ))
    }
}
