//! Process-wide session state: the currently observed identity and the
//! sign-in / sign-up / sign-out lifecycle. Consumers subscribe once and treat
//! every emission as authoritative.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use super::principal::Identity;
use super::provider::AuthProvider;
use crate::error::{AppError, AppResult};
use crate::profile::{ProfileManager, ProfileUpdate};

/// Local password prechecks shared by registration and the credential flow.
/// Runs before any provider call.
pub fn precheck_password(new_password: &str, confirm: &str) -> AppResult<()> {
    if new_password != confirm {
        return Err(AppError::PasswordMismatch);
    }
    if new_password.len() < 6 {
        return Err(AppError::PasswordTooWeak);
    }
    Ok(())
}

/// Registration form: identity credentials plus the initial profile fields.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationForm {
    pub full_name: String,
    pub whatsapp_number: String,
    pub email: String,
    pub district: String,
    pub taluk: String,
    pub college_name: String,
    pub username: String,
    pub pin_code: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegistrationForm {
    fn profile_fields(&self) -> ProfileUpdate {
        ProfileUpdate {
            full_name: self.full_name.clone(),
            whatsapp_number: self.whatsapp_number.clone(),
            district: self.district.clone(),
            taluk: self.taluk.clone(),
            college_name: self.college_name.clone(),
            username: self.username.clone(),
            pin_code: self.pin_code.clone(),
            photo_url: String::new(),
        }
    }
}

/// Single-writer holder of the current identity. One per process; injected
/// into everything that needs to know who is signed in.
pub struct SessionContext {
    provider: Arc<dyn AuthProvider>,
    profiles: Arc<ProfileManager>,
    current: watch::Sender<Option<Identity>>,
}

impl SessionContext {
    pub fn new(provider: Arc<dyn AuthProvider>, profiles: Arc<ProfileManager>) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { provider, profiles, current: tx }
    }

    /// The identity-change stream. Emissions arrive in operation order and
    /// each one replaces whatever the consumer had cached.
    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.current.subscribe()
    }

    pub fn current(&self) -> Option<Identity> {
        self.current.borrow().clone()
    }

    pub fn sign_in(&self, email: &str, password: &str) -> AppResult<Identity> {
        let identity = self.provider.verify(email, password)?;
        info!(uid = %identity.uid, "session.sign_in");
        self.current.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    /// Create the identity, set its display name, then write the profile
    /// record as a second dependent step. If the record write fails the
    /// identity still exists; the next load degrades to identity-only
    /// defaults. No compensating delete is attempted.
    pub fn sign_up(&self, form: &RegistrationForm) -> AppResult<Identity> {
        precheck_password(&form.password, &form.confirm_password)?;
        let identity = self
            .provider
            .create_identity(&form.email, &form.password, &form.full_name)?;
        if let Err(e) = self.profiles.create_initial(&identity, &form.profile_fields()) {
            warn!(uid = %identity.uid, error = %e,
                "registration: identity created but profile record write failed");
            return Err(e);
        }
        info!(uid = %identity.uid, "session.sign_up");
        self.current.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    /// Clears local session state unconditionally. The remote revocation is
    /// fire-and-forget: a transport failure must not leave a stale identity.
    pub fn sign_out(&self) -> AppResult<()> {
        if let Some(identity) = self.current() {
            if let Err(e) = self.provider.revoke(&identity.uid) {
                warn!(uid = %identity.uid, error = %e, "session.sign_out remote revoke failed");
            }
            info!(uid = %identity.uid, "session.sign_out");
        }
        self.current.send_replace(None);
        Ok(())
    }

    /// Replace the cached identity after a provider-side profile update,
    /// keeping observers consistent with the provider's view.
    pub fn update_cached_identity(&self, identity: Identity) {
        let matches = self
            .current
            .borrow()
            .as_ref()
            .map(|cur| cur.uid == identity.uid)
            .unwrap_or(false);
        if matches {
            self.current.send_replace(Some(identity));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::LocalAuthProvider;
    use crate::store::LocalDocStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Wraps a provider and counts remote calls, to prove prechecks fail
    /// before the provider is contacted.
    struct CountingProvider {
        inner: LocalAuthProvider,
        calls: AtomicUsize,
    }

    impl CountingProvider {
        fn bump(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl AuthProvider for CountingProvider {
        fn create_identity(&self, email: &str, password: &str, display_name: &str)
            -> AppResult<Identity>
        {
            self.bump();
            self.inner.create_identity(email, password, display_name)
        }
        fn verify(&self, email: &str, password: &str) -> AppResult<Identity> {
            self.bump();
            self.inner.verify(email, password)
        }
        fn update_identity_profile(
            &self,
            uid: &str,
            display_name: &str,
            photo_url: Option<&str>,
        ) -> AppResult<Identity> {
            self.bump();
            self.inner.update_identity_profile(uid, display_name, photo_url)
        }
        fn reauthenticate(&self, uid: &str, current_password: &str) -> AppResult<()> {
            self.bump();
            self.inner.reauthenticate(uid, current_password)
        }
        fn update_password(&self, uid: &str, new_password: &str) -> AppResult<()> {
            self.bump();
            self.inner.update_password(uid, new_password)
        }
        fn revoke(&self, uid: &str) -> AppResult<()> {
            self.bump();
            self.inner.revoke(uid)
        }
    }

    fn setup() -> (tempfile::TempDir, Arc<CountingProvider>, SessionContext) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LocalDocStore::new(dir.path()).unwrap());
        let provider = Arc::new(CountingProvider {
            inner: LocalAuthProvider::new(store.clone()),
            calls: AtomicUsize::new(0),
        });
        let profiles = Arc::new(ProfileManager::new(provider.clone(), store));
        let session = SessionContext::new(provider.clone(), profiles);
        (dir, provider, session)
    }

    fn form() -> RegistrationForm {
        RegistrationForm {
            full_name: "Asha K".into(),
            whatsapp_number: "9876543210".into(),
            email: "asha@example.com".into(),
            district: "Mysuru".into(),
            taluk: "Hunsur".into(),
            college_name: "UAS Bengaluru".into(),
            username: "asha".into(),
            pin_code: "570001".into(),
            password: "abc123".into(),
            confirm_password: "abc123".into(),
        }
    }

    #[test]
    fn mismatched_confirmation_fails_before_any_provider_call() {
        let (_d, provider, session) = setup();
        let mut f = form();
        f.confirm_password = "abc124".into();
        assert_eq!(session.sign_up(&f), Err(AppError::PasswordMismatch));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn short_password_fails_before_any_provider_call() {
        let (_d, provider, session) = setup();
        let mut f = form();
        f.password = "abc12".into();
        f.confirm_password = "abc12".into();
        assert_eq!(session.sign_up(&f), Err(AppError::PasswordTooWeak));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn sign_up_then_observe_then_sign_out() {
        let (_d, _provider, session) = setup();
        let rx = session.subscribe();
        assert!(rx.borrow().is_none());

        let id = session.sign_up(&form()).unwrap();
        assert_eq!(rx.borrow().as_ref().map(|i| i.uid.clone()), Some(id.uid.clone()));
        assert_eq!(session.current().map(|i| i.uid), Some(id.uid));

        session.sign_out().unwrap();
        assert!(rx.borrow().is_none());
        assert!(session.current().is_none());
    }

    #[test]
    fn sign_in_emits_identity() {
        let (_d, _provider, session) = setup();
        session.sign_up(&form()).unwrap();
        session.sign_out().unwrap();
        let id = session.sign_in("asha@example.com", "abc123").unwrap();
        assert_eq!(session.current().map(|i| i.uid), Some(id.uid));
        assert_eq!(
            session.sign_in("asha@example.com", "nope"),
            Err(AppError::InvalidCredentials)
        );
    }

    #[test]
    fn duplicate_registration_maps_to_email_in_use() {
        let (_d, _provider, session) = setup();
        session.sign_up(&form()).unwrap();
        assert_eq!(session.sign_up(&form()), Err(AppError::EmailInUse));
    }
}
