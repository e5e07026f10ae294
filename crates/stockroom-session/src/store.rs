//! Persistence for the three session slots.
//!
//! A [`TokenStore`] is a passive key/value surface: it holds the access
//! token, refresh token and tenant id as plain strings under fixed keys and
//! knows nothing about expiry or refresh. The [`SessionManager`] owns all
//! business logic.
//!
//! [`SessionManager`]: crate::SessionManager

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};

use crate::error::{Result, SessionError};

/// The slots of a stored session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Short-lived bearer credential.
    Access,
    /// Long-lived credential used to mint access tokens.
    Refresh,
    /// Tenant partition the session is scoped to.
    Tenant,
}

impl TokenKind {
    /// Every slot, in storage order.
    pub const ALL: [TokenKind; 3] = [TokenKind::Access, TokenKind::Refresh, TokenKind::Tenant];

    /// The persisted key for this slot.
    pub fn storage_key(self) -> &'static str {
        match self {
            TokenKind::Access => "token",
            TokenKind::Refresh => "refresh-token",
            TokenKind::Tenant => "tenant-id",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.storage_key())
    }
}

/// Key/value persistence for session slots.
pub trait TokenStore: Send + Sync + 'static {
    /// Read one slot.
    fn get(&self, kind: TokenKind) -> Result<Option<String>>;

    /// Replace one slot.
    fn set_token(&self, kind: TokenKind, value: &str) -> Result<()>;

    /// Persist a whole session.
    fn set(&self, access: &str, refresh: &str, tenant: &str) -> Result<()> {
        self.set_token(TokenKind::Access, access)?;
        self.set_token(TokenKind::Refresh, refresh)?;
        self.set_token(TokenKind::Tenant, tenant)
    }

    /// Remove all three slots. Clearing an empty store is not an error.
    fn clear(&self) -> Result<()>;
}

// ============================================================================
// MemoryTokenStore
// ============================================================================

/// In-process store. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    slots: RwLock<HashMap<TokenKind, String>>,
}

impl MemoryTokenStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, kind: TokenKind) -> Result<Option<String>> {
        let slots = self.slots.read().map_err(SessionError::storage)?;
        Ok(slots.get(&kind).cloned())
    }

    fn set_token(&self, kind: TokenKind, value: &str) -> Result<()> {
        let mut slots = self.slots.write().map_err(SessionError::storage)?;
        slots.insert(kind, value.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut slots = self.slots.write().map_err(SessionError::storage)?;
        slots.clear();
        Ok(())
    }
}

// ============================================================================
// FileTokenStore
// ============================================================================

/// Store backed by a flat JSON object on disk.
///
/// Writes land in a sibling temp file that is then renamed over the target.
/// A missing file reads as an empty store. A corrupt file still fails
/// reads, but `set` and `clear` replace it.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileTokenStore {
    /// Use (or later create) the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_content(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(None),
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SessionError::Storage(format!(
                "failed to read {}: {e}",
                self.path.display()
            ))),
        }
    }

    fn parse_slots(&self, content: &str) -> Result<BTreeMap<String, String>> {
        serde_json::from_str(content).map_err(|e| {
            SessionError::Storage(format!("failed to parse {}: {e}", self.path.display()))
        })
    }

    fn read_slots(&self) -> Result<BTreeMap<String, String>> {
        match self.read_content()? {
            Some(content) => self.parse_slots(&content),
            None => Ok(BTreeMap::new()),
        }
    }

    fn write_slots(&self, slots: &BTreeMap<String, String>) -> Result<()> {
        if slots.is_empty() {
            return match std::fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(SessionError::Storage(format!(
                    "failed to remove {}: {e}",
                    self.path.display()
                ))),
            };
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                SessionError::Storage(format!("failed to create {}: {e}", parent.display()))
            })?;
        }

        let json = serde_json::to_string_pretty(slots).map_err(SessionError::storage)?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json)
            .map_err(|e| SessionError::Storage(format!("failed to write {}: {e}", tmp.display())))?;
        restrict_permissions(&tmp)?;
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            SessionError::Storage(format!("failed to replace {}: {e}", self.path.display()))
        })
    }

    fn update<F>(&self, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        // An unparseable file is overwritten rather than blocking every write.
        let mut slots = match self.read_content()? {
            Some(content) => self.parse_slots(&content).unwrap_or_else(|err| {
                log::warn!("Discarding unreadable token store: {err}");
                BTreeMap::new()
            }),
            None => BTreeMap::new(),
        };
        mutate(&mut slots);
        self.write_slots(&slots)
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| SessionError::Storage(format!("failed to chmod {}: {e}", path.display())))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

impl TokenStore for FileTokenStore {
    fn get(&self, kind: TokenKind) -> Result<Option<String>> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read_slots()?.remove(kind.storage_key()))
    }

    fn set_token(&self, kind: TokenKind, value: &str) -> Result<()> {
        self.update(|slots| {
            slots.insert(kind.storage_key().to_string(), value.to_string());
        })
    }

    fn set(&self, access: &str, refresh: &str, tenant: &str) -> Result<()> {
        self.update(|slots| {
            for (kind, value) in TokenKind::ALL.into_iter().zip([access, refresh, tenant]) {
                slots.insert(kind.storage_key().to_string(), value.to_string());
            }
        })
    }

    fn clear(&self) -> Result<()> {
        self.update(|slots| {
            for kind in TokenKind::ALL {
                slots.remove(kind.storage_key());
            }
        })
    }
}
