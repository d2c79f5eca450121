//! Enrollment manager: the set of course ids a user has joined.
//!
//! Operations take the authenticated identity the caller already resolved
//! (the HTTP edge's cookie session, or the session context's current
//! identity), so concurrent sessions never invalidate each other's view.
//!
//! Enrolling is idempotent even though the store primitive is an
//! append-unique array: membership is prechecked before any write. The
//! caller-visible set is updated optimistically and rolled back when the
//! write fails. A per-(user, course) in-flight guard stops a duplicate
//! operation from being issued while one is outstanding.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde_json::json;

use crate::catalog::{course_by_id, courses_for, Course, CourseId};
use crate::error::{AppError, AppResult};
use crate::identity::Identity;
use crate::profile::USERS;
use crate::store::DocumentStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollOutcome {
    /// Written to the store and confirmed.
    Enrolled,
    /// Already a member; success with no write.
    AlreadyEnrolled,
    /// An identical operation is outstanding; nothing was issued.
    InFlight,
}

impl EnrollOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollOutcome::Enrolled => "enrolled",
            EnrollOutcome::AlreadyEnrolled => "already_enrolled",
            EnrollOutcome::InFlight => "in_flight",
        }
    }
}

pub struct EnrollmentManager {
    store: Arc<dyn DocumentStore>,
    in_flight: Mutex<HashSet<(String, CourseId)>>,
    cache: RwLock<HashMap<String, BTreeSet<CourseId>>>,
}

impl EnrollmentManager {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            in_flight: Mutex::new(HashSet::new()),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// The enrolled set for the given identity. Empty when no record exists.
    pub fn list_enrolled(&self, who: &Identity) -> BTreeSet<CourseId> {
        if let Some(set) = self.cache.read().get(&who.uid) {
            return set.clone();
        }
        let set = self.read_stored(&who.uid).unwrap_or_default();
        self.cache.write().insert(who.uid.clone(), set.clone());
        set
    }

    fn read_stored(&self, uid: &str) -> AppResult<BTreeSet<CourseId>> {
        let Some(doc) = self.store.get(USERS, uid)? else {
            return Ok(BTreeSet::new());
        };
        let set = doc["enrolledCourses"]
            .as_array()
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_u64().map(|n| n as CourseId))
                    .collect()
            })
            .unwrap_or_default();
        Ok(set)
    }

    /// Idempotent add. Already-enrolled is success with no write; a failed
    /// write rolls the optimistic update back and surfaces the error for a
    /// user-initiated retry (never an automatic one).
    pub fn enroll(&self, who: &Identity, course_id: CourseId) -> AppResult<EnrollOutcome> {
        if course_by_id(course_id).is_none() {
            return Err(AppError::NotFound);
        }
        if self.list_enrolled(who).contains(&course_id) {
            return Ok(EnrollOutcome::AlreadyEnrolled);
        }

        let key = (who.uid.clone(), course_id);
        {
            let mut guard = self.in_flight.lock();
            if !guard.insert(key.clone()) {
                return Ok(EnrollOutcome::InFlight);
            }
        }

        // Optimistic: visible before remote confirmation.
        self.cache.write().entry(who.uid.clone()).or_default().insert(course_id);

        let result = self
            .store
            .array_union(USERS, &who.uid, "enrolledCourses", json!(course_id));

        self.in_flight.lock().remove(&key);

        match result {
            Ok(()) => {
                tracing::info!(uid = %who.uid, course_id, "enroll.confirmed");
                Ok(EnrollOutcome::Enrolled)
            }
            Err(e) => {
                // Rolled back: the displayed set returns to its prior state.
                if let Some(set) = self.cache.write().get_mut(&who.uid) {
                    set.remove(&course_id);
                }
                tracing::warn!(uid = %who.uid, course_id, error = %e, "enroll.rolled_back");
                Err(e)
            }
        }
    }

    /// The user's courses joined against the catalog, in catalog order.
    pub fn my_courses(&self, who: &Identity) -> Vec<&'static Course> {
        courses_for(&self.list_enrolled(who))
    }
}
