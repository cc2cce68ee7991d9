//! The logged-in identity, kept in a small JSON file between invocations.
//!
//! The server is stateless: whoever holds this file acts as the stored user.

use anyhow::Context;
use api_shared::AuthUser;
use skinhub_core::Role;
use std::fs;
use std::path::{Path, PathBuf};

const SESSION_FILE: &str = "session.json";

/// Default location: `<config dir>/skinhub/session.json`, or the working directory when the
/// platform has no config directory.
pub fn default_session_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("skinhub"))
        .unwrap_or_default()
        .join(SESSION_FILE)
}

#[derive(Debug)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, user: &AuthUser) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(user)?;
        fs::write(&self.path, json)
            .with_context(|| format!("writing session to {}", self.path.display()))
    }

    /// The stored user, or `None` when nobody is logged in.
    pub fn load(&self) -> anyhow::Result<Option<AuthUser>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("reading session from {}", self.path.display()))?;
        let user = serde_json::from_str(&raw).with_context(|| {
            format!(
                "session file {} is corrupt; run `skinhub logout`",
                self.path.display()
            )
        })?;
        Ok(Some(user))
    }

    /// Returns whether a session existed.
    pub fn clear(&self) -> anyhow::Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("removing {}", self.path.display())),
        }
    }

    /// The stored user; fails when nobody is logged in.
    pub fn require(&self) -> anyhow::Result<AuthUser> {
        self.load()?
            .ok_or_else(|| anyhow::anyhow!("Not logged in. Run `skinhub login` first."))
    }

    /// The stored user, who must hold `role`.
    pub fn require_role(&self, role: Role) -> anyhow::Result<AuthUser> {
        let user = self.require()?;
        ensure_role(&user, role)?;
        Ok(user)
    }
}

/// Refuses locally what the user's role may not do.
pub fn ensure_role(user: &AuthUser, role: Role) -> anyhow::Result<()> {
    if user.role == role {
        Ok(())
    } else {
        anyhow::bail!(
            "This command is only available to {} accounts (you are logged in as {}).",
            role,
            user.role
        )
    }
}
