// src/provision.rs

//! On-demand OS accounts for sandboxed commands.
//!
//! A command may ask to run as a named user. The account is created with
//! `useradd -m <user>` the first time it is needed; an account that
//! already exists is fine.

use std::process::Stdio;

use tokio::process::Command as TokioCommand;
use tracing::debug;

use crate::error::RunError;

/// `useradd` exit status for "username already in use".
const USERADD_EXISTS: i32 = 9;

/// Numeric identity a child is launched under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub uid: u32,
    pub gid: u32,
}

/// Create `user` unless it already exists, then resolve its uid/gid.
pub async fn ensure_user(user: &str) -> Result<Identity, RunError> {
    if let Some(identity) = lookup(user)? {
        return Ok(identity);
    }

    debug!(user, "provisioning account");
    let status = TokioCommand::new("useradd")
        .arg("-m")
        .arg(user)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map_err(|source| RunError::Spawn {
            command: format!("useradd -m {}", user),
            source,
        })?;

    match status.code() {
        Some(0) | Some(USERADD_EXISTS) => {}
        code => {
            return Err(RunError::Provision {
                user: user.to_string(),
                status: code,
            })
        }
    }

    lookup(user)?.ok_or_else(|| RunError::UnknownUser(user.to_string()))
}

#[cfg(unix)]
fn lookup(user: &str) -> Result<Option<Identity>, RunError> {
    let found = nix::unistd::User::from_name(user).map_err(std::io::Error::from)?;
    Ok(found.map(|u| Identity {
        uid: u.uid.as_raw(),
        gid: u.gid.as_raw(),
    }))
}

#[cfg(not(unix))]
fn lookup(user: &str) -> Result<Option<Identity>, RunError> {
    Err(RunError::UnknownUser(user.to_string()))
}
