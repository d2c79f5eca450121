//! Profile record manager: CRUD over the one-per-identity `users` document,
//! reconciled with the identity provider's own display name and photo fields.
//!
//! Ordering on save: the provider update goes first; if it fails the document
//! write is never issued, so prior state stays intact. This is a safe
//! fallback, not transactional atomicity.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map};

use crate::catalog::CourseId;
use crate::error::{AppError, AppResult};
use crate::identity::{AuthProvider, Identity};
use crate::locations::normalize_location;
use crate::store::DocumentStore;

pub const USERS: &str = "users";

/// The stored per-user document. Field names match the wire/document format.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileRecord {
    pub uid: String,
    pub full_name: String,
    pub whatsapp_number: String,
    pub email: String,
    pub district: String,
    pub taluk: String,
    pub college_name: String,
    pub username: String,
    pub pin_code: String,
    #[serde(rename = "photoURL")]
    pub photo_url: String,
    pub state: String,
    pub enrolled_courses: BTreeSet<CourseId>,
    pub created_at: String,
    pub updated_at: String,
}

/// Caller-supplied profile fields for both registration and profile edits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileUpdate {
    pub full_name: String,
    pub whatsapp_number: String,
    pub district: String,
    pub taluk: String,
    pub college_name: String,
    pub username: String,
    pub pin_code: String,
    #[serde(rename = "photoURL")]
    pub photo_url: String,
}

pub struct ProfileManager {
    provider: Arc<dyn AuthProvider>,
    store: Arc<dyn DocumentStore>,
}

impl ProfileManager {
    pub fn new(provider: Arc<dyn AuthProvider>, store: Arc<dyn DocumentStore>) -> Self {
        Self { provider, store }
    }

    /// Initial record write at registration time, keyed by the identity's uid.
    pub fn create_initial(&self, identity: &Identity, fields: &ProfileUpdate) -> AppResult<()> {
        let (district, taluk) = normalize_location(&fields.district, &fields.taluk);
        let now = chrono::Utc::now().to_rfc3339();
        let doc = json!({
            "uid": identity.uid,
            "fullName": fields.full_name,
            "whatsappNumber": fields.whatsapp_number,
            "email": identity.email,
            "district": district,
            "taluk": taluk,
            "collegeName": fields.college_name,
            "username": fields.username,
            "pinCode": fields.pin_code,
            "photoURL": fields.photo_url,
            "state": "Karnataka",
            "enrolledCourses": [],
            "createdAt": now,
            "updatedAt": now,
        });
        self.store.create(USERS, &identity.uid, doc)
    }

    /// Load the record for an identity. A missing record is not an error: the
    /// caller gets identity-only defaults (display name, email, photo).
    pub fn load(&self, identity: &Identity) -> AppResult<ProfileRecord> {
        let mut rec = match self.store.get(USERS, &identity.uid)? {
            Some(doc) => serde_json::from_value::<ProfileRecord>(doc)
                .map_err(|e| AppError::unavailable(format!("malformed record: {}", e)))?,
            None => ProfileRecord::default(),
        };
        rec.uid = identity.uid.clone();
        rec.email = identity.email.clone();
        if rec.full_name.is_empty() {
            rec.full_name = identity.display_name.clone();
        }
        if rec.photo_url.is_empty() {
            rec.photo_url = identity.photo_url.clone().unwrap_or_default();
        }
        Ok(rec)
    }

    /// Merge the supplied fields into the record and refresh `updatedAt`.
    /// Display-name/photo changes go to the identity provider first; a
    /// provider failure aborts the document write. Returns the refreshed
    /// identity so callers can replace their cached copy.
    pub fn save(&self, identity: &Identity, fields: &ProfileUpdate) -> AppResult<Identity> {
        let (district, taluk) = normalize_location(&fields.district, &fields.taluk);

        let photo = if fields.photo_url.is_empty() { None } else { Some(fields.photo_url.as_str()) };
        let identity_changed = identity.display_name != fields.full_name
            || identity.photo_url.as_deref() != photo;
        let refreshed = if identity_changed {
            self.provider
                .update_identity_profile(&identity.uid, &fields.full_name, photo)?
        } else {
            identity.clone()
        };

        let mut merged = Map::new();
        merged.insert("fullName".into(), json!(fields.full_name));
        merged.insert("whatsappNumber".into(), json!(fields.whatsapp_number));
        merged.insert("district".into(), json!(district));
        merged.insert("taluk".into(), json!(taluk));
        merged.insert("collegeName".into(), json!(fields.college_name));
        merged.insert("username".into(), json!(fields.username));
        merged.insert("pinCode".into(), json!(fields.pin_code));
        merged.insert("photoURL".into(), json!(fields.photo_url));
        merged.insert("updatedAt".into(), json!(chrono::Utc::now().to_rfc3339()));
        self.store.merge(USERS, &identity.uid, merged)?;
        Ok(refreshed)
    }
}
