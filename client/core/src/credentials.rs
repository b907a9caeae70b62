//! Credential Store and Network Monitor
//!
//! Platform capabilities the session machine consults around a login:
//!
//! - [`CredentialStore`] persists the last successful login and the
//!   auto-login preference. How it persists them is the platform's business.
//! - [`NetworkMonitor`] answers whether a gateway call is worth attempting.
//!
//! In-process implementations are provided for the headless surface and tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

/// Saved phone number and password
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Digits-only phone number
    pub phone_number: String,
    /// Password
    pub password: String,
}

impl Credentials {
    /// Create a credential pair
    pub fn new(phone_number: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            phone_number: phone_number.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("phone_number", &self.phone_number)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Persistent store for saved login information
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Whether the user opted into auto-login
    async fn is_auto_login_enabled(&self) -> anyhow::Result<bool>;

    /// The last saved credentials, if any
    async fn saved_credentials(&self) -> anyhow::Result<Option<Credentials>>;

    /// Save credentials together with the auto-login preference
    async fn save_login_info(
        &self,
        credentials: &Credentials,
        auto_login_enabled: bool,
    ) -> anyhow::Result<()>;
}

/// Pre-flight connectivity check
pub trait NetworkMonitor: Send + Sync {
    /// Whether the network is currently reachable
    fn is_network_available(&self) -> bool;
}

// ============================================================================
// In-process implementations
// ============================================================================

#[derive(Default)]
struct StoredLogin {
    credentials: Option<Credentials>,
    auto_login_enabled: bool,
}

/// Credential store kept in memory for the lifetime of the process
#[derive(Default)]
pub struct MemoryCredentialStore {
    stored: Mutex<StoredLogin>,
    unreadable: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryCredentialStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds a saved login
    #[must_use]
    pub fn with_saved(credentials: Credentials, auto_login_enabled: bool) -> Self {
        let store = Self::new();
        *store.stored.lock() = StoredLogin {
            credentials: Some(credentials),
            auto_login_enabled,
        };
        store
    }

    /// Make every read fail, as a corrupted backing store would
    pub fn set_unreadable(&self, unreadable: bool) {
        self.unreadable.store(unreadable, Ordering::SeqCst);
    }

    /// Currently stored credentials and auto-login flag
    pub fn stored(&self) -> (Option<Credentials>, bool) {
        let stored = self.stored.lock();
        (stored.credentials.clone(), stored.auto_login_enabled)
    }

    /// Number of successful `save_login_info` calls
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    fn check_readable(&self) -> anyhow::Result<()> {
        if self.unreadable.load(Ordering::SeqCst) {
            anyhow::bail!("credential store is unreadable");
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn is_auto_login_enabled(&self) -> anyhow::Result<bool> {
        self.check_readable()?;
        Ok(self.stored.lock().auto_login_enabled)
    }

    async fn saved_credentials(&self) -> anyhow::Result<Option<Credentials>> {
        self.check_readable()?;
        Ok(self.stored.lock().credentials.clone())
    }

    async fn save_login_info(
        &self,
        credentials: &Credentials,
        auto_login_enabled: bool,
    ) -> anyhow::Result<()> {
        *self.stored.lock() = StoredLogin {
            credentials: Some(credentials.clone()),
            auto_login_enabled,
        };
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Network monitor with a settable answer
pub struct StaticNetwork {
    online: AtomicBool,
}

impl StaticNetwork {
    /// A monitor that reports the network as reachable
    #[must_use]
    pub fn online() -> Self {
        Self {
            online: AtomicBool::new(true),
        }
    }

    /// A monitor that reports the network as unreachable
    #[must_use]
    pub fn offline() -> Self {
        Self {
            online: AtomicBool::new(false),
        }
    }

    /// Change the reported reachability
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

impl NetworkMonitor for StaticNetwork {
    fn is_network_available(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_round_trips_login() {
        let store = MemoryCredentialStore::new();
        assert!(store.saved_credentials().await.unwrap().is_none());
        assert!(!store.is_auto_login_enabled().await.unwrap());

        store
            .save_login_info(&Credentials::new("0101234", "pw"), true)
            .await
            .unwrap();

        assert_eq!(
            store.saved_credentials().await.unwrap(),
            Some(Credentials::new("0101234", "pw"))
        );
        assert!(store.is_auto_login_enabled().await.unwrap());
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test]
    async fn test_unreadable_store_fails_reads() {
        let store = MemoryCredentialStore::with_saved(Credentials::new("1", "2"), true);
        store.set_unreadable(true);
        assert!(store.is_auto_login_enabled().await.is_err());
        assert!(store.saved_credentials().await.is_err());
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let debug = format!("{:?}", Credentials::new("0101234", "hunter2"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_static_network_toggles() {
        let network = StaticNetwork::offline();
        assert!(!network.is_network_available());
        network.set_online(true);
        assert!(network.is_network_available());
    }
}
