//! Enrollment flow: idempotence, catalog-order joins, optimistic rollback
//! and per-identity scoping.

mod common;

use anyhow::Result;
use common::{harness, registration};

use agricoach::catalog::CourseId;
use agricoach::enroll::EnrollOutcome;
use agricoach::error::AppError;
use agricoach::store::DocumentStore;

#[test]
fn enrolling_twice_yields_a_set_of_size_one() -> Result<()> {
    let h = harness();
    let id = h.session.sign_up(&registration("asha@example.com"))?;

    assert_eq!(h.enroll.enroll(&id, 3)?, EnrollOutcome::Enrolled);
    assert_eq!(h.enroll.enroll(&id, 3)?, EnrollOutcome::AlreadyEnrolled);

    let set = h.enroll.list_enrolled(&id);
    assert_eq!(set.len(), 1);
    assert!(set.contains(&3));

    // The stored array holds exactly one entry as well.
    let doc = h.store.get("users", &id.uid)?.unwrap();
    assert_eq!(doc["enrolledCourses"], serde_json::json!([3]));
    Ok(())
}

#[test]
fn my_courses_follow_catalog_order_not_enrollment_order() -> Result<()> {
    let h = harness();
    let id = h.session.sign_up(&registration("asha@example.com"))?;

    // Enroll in 5 first, then 2: the join must still come back [2, 5].
    h.enroll.enroll(&id, 5)?;
    h.enroll.enroll(&id, 2)?;

    let got: Vec<CourseId> = h.enroll.my_courses(&id).iter().map(|c| c.id).collect();
    assert_eq!(got, vec![2, 5]);
    Ok(())
}

#[test]
fn failed_enroll_rolls_the_visible_set_back() -> Result<()> {
    let h = harness();
    let id = h.session.sign_up(&registration("asha@example.com"))?;
    h.enroll.enroll(&id, 1)?;

    h.store.set_fail_writes(true);
    let err = h.enroll.enroll(&id, 4).unwrap_err();
    assert!(matches!(err, AppError::ProviderUnavailable(_)));

    // The previously displayed set is unchanged.
    let set = h.enroll.list_enrolled(&id);
    assert_eq!(set.into_iter().collect::<Vec<_>>(), vec![1]);

    // A user-initiated retry succeeds once the store recovers.
    h.store.set_fail_writes(false);
    assert_eq!(h.enroll.enroll(&id, 4)?, EnrollOutcome::Enrolled);
    Ok(())
}

#[test]
fn sign_out_leaves_no_identity_to_list_with() -> Result<()> {
    let h = harness();
    let rx = h.session.subscribe();
    let id = h.session.sign_up(&registration("asha@example.com"))?;
    h.enroll.enroll(&id, 2)?;
    assert_eq!(h.enroll.list_enrolled(&id).len(), 1);

    h.session.sign_out()?;
    assert!(rx.borrow().is_none());

    // The session yields no principal, so the visible enrollment set is empty.
    let visible = h
        .session
        .current()
        .map(|who| h.enroll.list_enrolled(&who))
        .unwrap_or_default();
    assert!(visible.is_empty());
    Ok(())
}

#[test]
fn enrollment_survives_re_sign_in() -> Result<()> {
    let h = harness();
    let id = h.session.sign_up(&registration("asha@example.com"))?;
    h.enroll.enroll(&id, 6)?;
    h.session.sign_out()?;

    let back = h.session.sign_in("asha@example.com", "abc123")?;
    let set = h.enroll.list_enrolled(&back);
    assert_eq!(set.into_iter().collect::<Vec<_>>(), vec![6]);
    Ok(())
}

#[test]
fn unknown_course_is_rejected() -> Result<()> {
    let h = harness();
    let id = h.session.sign_up(&registration("asha@example.com"))?;
    assert_eq!(h.enroll.enroll(&id, 99), Err(AppError::NotFound));
    Ok(())
}

#[test]
fn enrollment_sets_are_scoped_per_identity() -> Result<()> {
    let h = harness();
    let a = h.session.sign_up(&registration("asha@example.com"))?;
    h.enroll.enroll(&a, 2)?;

    let b = h.session.sign_up(&registration("ravi@example.com"))?;
    assert!(h.enroll.list_enrolled(&b).is_empty());
    assert_eq!(h.enroll.list_enrolled(&a).into_iter().collect::<Vec<_>>(), vec![2]);
    Ok(())
}

#[test]
fn a_second_sign_in_does_not_invalidate_the_first_identity() -> Result<()> {
    let h = harness();
    let a = h.session.sign_up(&registration("asha@example.com"))?;
    h.enroll.enroll(&a, 2)?;

    // Another user signs in; the first identity keeps a working view.
    let b = h.session.sign_up(&registration("ravi@example.com"))?;
    assert_eq!(h.session.current().map(|i| i.uid), Some(b.uid.clone()));

    assert_eq!(h.enroll.list_enrolled(&a).into_iter().collect::<Vec<_>>(), vec![2]);
    assert_eq!(h.enroll.enroll(&a, 3)?, EnrollOutcome::Enrolled);
    assert!(h.enroll.my_courses(&b).is_empty());
    Ok(())
}
