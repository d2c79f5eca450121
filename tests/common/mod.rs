//! Shared test harness: a document store wrapper whose writes can be made to
//! fail on demand, standing in for a transport outage.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::{Map, Value};

use agricoach::enroll::EnrollmentManager;
use agricoach::error::{AppError, AppResult};
use agricoach::identity::{AuthProvider, LocalAuthProvider, RegistrationForm, SessionContext};
use agricoach::profile::ProfileManager;
use agricoach::store::{DocumentStore, LocalDocStore};

pub struct FlakyStore {
    inner: LocalDocStore,
    fail_writes: AtomicBool,
}

impl FlakyStore {
    pub fn new(inner: LocalDocStore) -> Self {
        Self { inner, fail_writes: AtomicBool::new(false) }
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check(&self) -> AppResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::unavailable("simulated transport failure"));
        }
        Ok(())
    }
}

impl DocumentStore for FlakyStore {
    fn get(&self, collection: &str, key: &str) -> AppResult<Option<Value>> {
        self.inner.get(collection, key)
    }

    fn create(&self, collection: &str, key: &str, value: Value) -> AppResult<()> {
        self.check()?;
        self.inner.create(collection, key, value)
    }

    fn merge(&self, collection: &str, key: &str, fields: Map<String, Value>) -> AppResult<()> {
        self.check()?;
        self.inner.merge(collection, key, fields)
    }

    fn array_union(&self, collection: &str, key: &str, field: &str, value: Value) -> AppResult<()> {
        self.check()?;
        self.inner.array_union(collection, key, field, value)
    }
}

pub struct Harness {
    pub _dir: tempfile::TempDir,
    pub store: Arc<FlakyStore>,
    pub provider: Arc<dyn AuthProvider>,
    pub profiles: Arc<ProfileManager>,
    pub session: Arc<SessionContext>,
    pub enroll: Arc<EnrollmentManager>,
}

pub fn harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FlakyStore::new(LocalDocStore::new(dir.path()).unwrap()));
    let store_dyn: Arc<dyn DocumentStore> = store.clone();
    let provider: Arc<dyn AuthProvider> = Arc::new(LocalAuthProvider::new(store_dyn.clone()));
    let profiles = Arc::new(ProfileManager::new(provider.clone(), store_dyn.clone()));
    let session = Arc::new(SessionContext::new(provider.clone(), profiles.clone()));
    let enroll = Arc::new(EnrollmentManager::new(store_dyn));
    Harness { _dir: dir, store, provider, profiles, session, enroll }
}

pub fn registration(email: &str) -> RegistrationForm {
    RegistrationForm {
        full_name: "Asha K".into(),
        whatsapp_number: "9876543210".into(),
        email: email.into(),
        district: "Mysuru".into(),
        taluk: "Hunsur".into(),
        college_name: "UAS Bengaluru".into(),
        username: "asha".into(),
        pin_code: "570001".into(),
        password: "abc123".into(),
        confirm_password: "abc123".into(),
    }
}
