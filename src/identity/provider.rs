use std::sync::Arc;

use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::{PasswordHash, SaltString};
use serde_json::{json, Map, Value};

use super::principal::Identity;
use crate::error::{AppError, AppResult};
use crate::store::DocumentStore;
use crate::tprintln;

/// Minimum password length the provider itself enforces at identity creation.
const PROVIDER_MIN_PASSWORD: usize = 6;

const ACCOUNTS: &str = "accounts";
/// Secondary index: normalized email -> uid.
const ACCOUNT_EMAILS: &str = "account_emails";

/// Identity provider seam. Covers exactly the operations the application
/// consumes: create, verify, profile update, re-authenticate, password update
/// and session revocation.
pub trait AuthProvider: Send + Sync {
    fn create_identity(&self, email: &str, password: &str, display_name: &str)
        -> AppResult<Identity>;
    fn verify(&self, email: &str, password: &str) -> AppResult<Identity>;
    fn update_identity_profile(
        &self,
        uid: &str,
        display_name: &str,
        photo_url: Option<&str>,
    ) -> AppResult<Identity>;
    fn reauthenticate(&self, uid: &str, current_password: &str) -> AppResult<()>;
    fn update_password(&self, uid: &str, new_password: &str) -> AppResult<()>;
    /// Best-effort remote sign-out. Callers must clear local state regardless.
    fn revoke(&self, uid: &str) -> AppResult<()>;
}

fn hash_password(password: &str) -> AppResult<String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| AppError::unavailable(e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| AppError::unavailable(e.to_string()))?;
    let argon2 = Argon2::default();
    let phc = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::unavailable(e.to_string()))?
        .to_string();
    Ok(phc)
}

fn verify_password(hash: &str, password: &str) -> bool {
    if let Ok(parsed) = PasswordHash::new(hash) {
        Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
    } else {
        false
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

fn identity_from_account(doc: &Value) -> Identity {
    Identity {
        uid: doc["uid"].as_str().unwrap_or_default().to_string(),
        email: doc["email"].as_str().unwrap_or_default().to_string(),
        display_name: doc["displayName"].as_str().unwrap_or_default().to_string(),
        photo_url: doc["photoURL"].as_str().map(|s| s.to_string()),
    }
}

/// Document-store-backed provider holding argon2 PHC hashes, in the manner of
/// the user table the server's security layer keeps.
pub struct LocalAuthProvider {
    store: Arc<dyn DocumentStore>,
    /// Serializes registrations: the email uniqueness check and the account
    /// writes must not interleave with another registration.
    registration: parking_lot::Mutex<()>,
}

impl LocalAuthProvider {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store, registration: parking_lot::Mutex::new(()) }
    }

    fn account(&self, uid: &str) -> AppResult<Value> {
        self.store.get(ACCOUNTS, uid)?.ok_or(AppError::InvalidCredentials)
    }
}

impl AuthProvider for LocalAuthProvider {
    fn create_identity(&self, email: &str, password: &str, display_name: &str)
        -> AppResult<Identity>
    {
        let email = normalize_email(email);
        if email.is_empty() || !email.contains('@') {
            return Err(AppError::InvalidCredentials);
        }
        if password.len() < PROVIDER_MIN_PASSWORD {
            return Err(AppError::WeakPassword);
        }
        let _guard = self.registration.lock();
        if self.store.get(ACCOUNT_EMAILS, &email)?.is_some() {
            return Err(AppError::EmailInUse);
        }
        let uid = uuid::Uuid::new_v4().to_string();
        let phc = hash_password(password)?;
        let now = chrono::Utc::now().to_rfc3339();
        let doc = json!({
            "uid": uid,
            "email": email,
            "displayName": display_name,
            "photoURL": null,
            "passwordHash": phc,
            "createdAt": now,
            "updatedAt": now,
        });
        // Account first, then the email index. If the index write fails the
        // account is orphaned but the email stays registrable.
        self.store.create(ACCOUNTS, &uid, doc)?;
        self.store.create(ACCOUNT_EMAILS, &email, json!({ "uid": uid }))?;
        tprintln!("auth.create uid={} email={}", uid, email);
        Ok(Identity {
            uid,
            email,
            display_name: display_name.to_string(),
            photo_url: None,
        })
    }

    fn verify(&self, email: &str, password: &str) -> AppResult<Identity> {
        let email = normalize_email(email);
        let Some(index) = self.store.get(ACCOUNT_EMAILS, &email)? else {
            return Err(AppError::InvalidCredentials);
        };
        let uid = index["uid"].as_str().unwrap_or_default().to_string();
        let account = self.account(&uid)?;
        let hash = account["passwordHash"].as_str().unwrap_or_default();
        if !verify_password(hash, password) {
            return Err(AppError::InvalidCredentials);
        }
        Ok(identity_from_account(&account))
    }

    fn update_identity_profile(
        &self,
        uid: &str,
        display_name: &str,
        photo_url: Option<&str>,
    ) -> AppResult<Identity> {
        let mut fields = Map::new();
        fields.insert("displayName".into(), json!(display_name));
        fields.insert("photoURL".into(), photo_url.map(Value::from).unwrap_or(Value::Null));
        fields.insert("updatedAt".into(), json!(chrono::Utc::now().to_rfc3339()));
        self.store.merge(ACCOUNTS, uid, fields)?;
        Ok(identity_from_account(&self.account(uid)?))
    }

    fn reauthenticate(&self, uid: &str, current_password: &str) -> AppResult<()> {
        let account = self.account(uid)?;
        let hash = account["passwordHash"].as_str().unwrap_or_default();
        if !verify_password(hash, current_password) {
            return Err(AppError::WrongCurrentPassword);
        }
        Ok(())
    }

    fn update_password(&self, uid: &str, new_password: &str) -> AppResult<()> {
        if new_password.len() < PROVIDER_MIN_PASSWORD {
            return Err(AppError::WeakPassword);
        }
        let phc = hash_password(new_password)?;
        let mut fields = Map::new();
        fields.insert("passwordHash".into(), json!(phc));
        fields.insert("updatedAt".into(), json!(chrono::Utc::now().to_rfc3339()));
        self.store.merge(ACCOUNTS, uid, fields)?;
        tprintln!("auth.update_password uid={}", uid);
        Ok(())
    }

    fn revoke(&self, uid: &str) -> AppResult<()> {
        // The local provider keeps no remote session state.
        tracing::debug!(uid, "auth.revoke");
        Ok(())
    }
}
