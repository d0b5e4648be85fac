/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Machine-wide claim on a pin, shared by every process that drives it.
//!
//! Each claim opens its own descriptor and takes an exclusive `flock` on it,
//! so two gates on the same path exclude each other whether they live in
//! one process or two.  The lock goes away with the descriptor, including
//! when the holder is killed.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use nix::errno::Errno;
use nix::fcntl::{Flock, FlockArg};
use tracing::debug;

use super::PinError;

/// Key for the machine-wide lock, usually the pin's own `value` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinClaim {
    path: PathBuf,
}

/// Held claim.  Dropping it unlocks.
pub struct ClaimGuard {
    _lock: Flock<File>,
}

impl PinClaim {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Take the claim without waiting.  `Ok(None)` means another holder
    /// has it.
    ///
    /// # Errors
    /// [`PinError::Claim`] if the lock file cannot be opened or locked for
    /// any reason other than contention.
    pub fn try_acquire(&self) -> Result<Option<ClaimGuard>, PinError> {
        let file = OpenOptions::new()
            .write(true)
            .open(&self.path)
            .map_err(|source| PinError::Claim {
                path: self.path.clone(),
                source,
            })?;

        match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
            Ok(lock) => {
                debug!(path = %self.path.display(), "Pin claimed");
                Ok(Some(ClaimGuard { _lock: lock }))
            }
            Err((_, errno)) if errno == Errno::EWOULDBLOCK => Ok(None),
            Err((_, errno)) => Err(PinError::Claim {
                path: self.path.clone(),
                source: errno.into(),
            }),
        }
    }
}
