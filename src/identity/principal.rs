use serde::{Deserialize, Serialize};

/// The authenticated principal as cached from the identity provider.
/// The uid is provider-assigned and stable; display name and photo are the
/// mutable provider-side profile fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
    pub email: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub photo_url: Option<String>,
}
