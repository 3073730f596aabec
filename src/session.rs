use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::remote::{ApiError, RemoteClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Administrator,
}

/// Student row embedded in the account payload. Only the fields the daemon
/// acts on are typed; everything else rides along untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRef {
    pub id: i64,
    #[serde(default)]
    pub self_contract: Option<String>,
    #[serde(default)]
    pub late_free_streak: i64,
    #[serde(default)]
    pub reward_eligible: bool,
    #[serde(default)]
    pub pending_reward: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl StudentRef {
    /// A contract counts as signed only when non-empty after trimming.
    pub fn has_self_contract(&self) -> bool {
        self.self_contract
            .as_deref()
            .map(|s| !s.trim().is_empty())
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    pub role: Role,
    #[serde(default)]
    pub student: Option<StudentRef>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Tri-state account identity: not yet resolved, resolved to no user, or
/// resolved to a signed-in user.
#[derive(Debug, Clone, PartialEq)]
pub enum IdentityState {
    Loading,
    Anonymous,
    Authenticated(Identity),
}

/// Holds the bearer token and the current identity for one daemon run.
/// Handlers receive it through `AppState`; nothing here is process-global.
pub struct Session {
    token: Option<String>,
    identity: IdentityState,
}

impl Session {
    pub fn new() -> Session {
        Session {
            token: None,
            identity: IdentityState::Loading,
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub fn clear_token(&mut self) {
        self.token = None;
    }

    pub fn identity(&self) -> &IdentityState {
        &self.identity
    }

    /// Adopt a fresh login: the token and the user arrive together.
    pub fn establish(&mut self, token: String, user: Identity) {
        self.token = Some(token);
        self.identity = IdentityState::Authenticated(user);
    }

    /// Drop the identity. The token is untouched; a later refresh may
    /// resolve the account again.
    pub fn invalidate(&mut self) {
        self.identity = IdentityState::Anonymous;
    }

    pub fn student(&self) -> Option<&StudentRef> {
        match &self.identity {
            IdentityState::Authenticated(user) => user.student.as_ref(),
            _ => None,
        }
    }

    /// Local write-through after a mutation the daemon itself performed,
    /// so the gate sees the new state without another account fetch.
    pub fn patch_student<F>(&mut self, patch: F)
    where
        F: FnOnce(&mut StudentRef),
    {
        if let IdentityState::Authenticated(user) = &mut self.identity {
            if let Some(student) = user.student.as_mut() {
                patch(student);
            }
        }
    }

    /// Re-fetch the account. A 401 resolves cleanly to Anonymous; any other
    /// failure also invalidates (a failed refresh never keeps a stale
    /// identity) and is reported to the caller.
    pub fn refresh(&mut self, client: &RemoteClient) -> Result<(), ApiError> {
        match client.get_json("/user", self.token.as_deref()) {
            Ok(body) => match serde_json::from_value::<Identity>(body) {
                Ok(user) => {
                    self.identity = IdentityState::Authenticated(user);
                    Ok(())
                }
                Err(e) => {
                    self.identity = IdentityState::Anonymous;
                    Err(ApiError::Decode(e.to_string()))
                }
            },
            Err(ApiError::Status(401, _)) => {
                self.identity = IdentityState::Anonymous;
                Ok(())
            }
            Err(e) => {
                self.identity = IdentityState::Anonymous;
                Err(e)
            }
        }
    }
}

/// Only the token survives restarts, tied to the server it belongs to.
/// Identity is never persisted; a restored session starts unresolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedSession {
    pub server_url: String,
    pub token: String,
}

pub fn session_file_path(state_dir: &Path) -> PathBuf {
    state_dir.join("session.json")
}

pub fn load_session_file(state_dir: &Path) -> anyhow::Result<Option<SavedSession>> {
    let path = session_file_path(state_dir);
    if !path.is_file() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(&path)?;
    let saved = serde_json::from_str(&text)?;
    Ok(Some(saved))
}

pub fn store_session_file(state_dir: &Path, saved: &SavedSession) -> anyhow::Result<()> {
    std::fs::create_dir_all(state_dir)?;
    let text = serde_json::to_string_pretty(saved)?;
    std::fs::write(session_file_path(state_dir), text)?;
    Ok(())
}

pub fn clear_session_file(state_dir: &Path) -> anyhow::Result<()> {
    match std::fs::remove_file(session_file_path(state_dir)) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
