// --- File: crates/portal_firebase/src/mock.rs ---
//! In-process account directory for local runs and tests.

use portal_common::error::{not_found, upstream_failure, PortalError};
use portal_common::models::{Role, UserRecord};
use portal_common::services::{BoxFuture, IdentityAdmin};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Directory {
    users: BTreeMap<String, UserRecord>,
    revoked: Vec<String>,
    fail_revocation: bool,
}

/// Identity admin over an in-memory map keyed by uid.
#[derive(Debug, Default)]
pub struct InMemoryIdentityAdmin {
    directory: Mutex<Directory>,
}

impl InMemoryIdentityAdmin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, uid: &str, email: &str, role: Role) -> Self {
        self.lock().users.insert(
            uid.to_string(),
            UserRecord {
                uid: uid.to_string(),
                email: Some(email.to_string()),
                role,
                last_sign_in_time: None,
                creation_time: None,
            },
        );
        self
    }

    pub fn user(&self, uid: &str) -> Option<UserRecord> {
        self.lock().users.get(uid).cloned()
    }

    /// Uids whose refresh tokens were revoked, in call order.
    pub fn revoked(&self) -> Vec<String> {
        self.lock().revoked.clone()
    }

    /// Makes `revoke_refresh_tokens` fail.
    pub fn fail_revocation(&self, fail: bool) {
        self.lock().fail_revocation = fail;
    }

    fn lock(&self) -> MutexGuard<'_, Directory> {
        self.directory
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl IdentityAdmin for InMemoryIdentityAdmin {
    fn list_users(&self, max_results: usize) -> BoxFuture<'_, Vec<UserRecord>, PortalError> {
        let users = self
            .lock()
            .users
            .values()
            .take(max_results)
            .cloned()
            .collect();
        Box::pin(async move { Ok(users) })
    }

    fn set_role(&self, uid: &str, role: Role) -> BoxFuture<'_, (), PortalError> {
        let result = match self.lock().users.get_mut(uid) {
            Some(user) => {
                user.role = role;
                Ok(())
            }
            None => Err(not_found(format!("User {} not found", uid))),
        };
        Box::pin(async move { result })
    }

    fn revoke_refresh_tokens(&self, uid: &str) -> BoxFuture<'_, (), PortalError> {
        let mut directory = self.lock();
        let result = if directory.fail_revocation {
            Err(upstream_failure("identity", "revocation unavailable"))
        } else {
            directory.revoked.push(uid.to_string());
            Ok(())
        };
        Box::pin(async move { result })
    }
}
