//! Session lifecycle: the identity stream, sign-in failure mapping, and the
//! credential update flow end to end.

mod common;

use anyhow::Result;
use common::{harness, registration};

use agricoach::credential::{ChangeState, PasswordChange};
use agricoach::error::AppError;

#[tokio::test]
async fn identity_stream_delivers_changes_in_order() -> Result<()> {
    let h = harness();
    let mut rx = h.session.subscribe();
    assert!(rx.borrow().is_none());

    let id = h.session.sign_up(&registration("asha@example.com"))?;
    rx.changed().await?;
    assert_eq!(rx.borrow_and_update().as_ref().map(|i| i.uid.clone()), Some(id.uid.clone()));

    h.session.sign_out()?;
    rx.changed().await?;
    assert!(rx.borrow_and_update().is_none());
    Ok(())
}

#[test]
fn sign_in_failures_map_to_invalid_credentials() -> Result<()> {
    let h = harness();
    h.session.sign_up(&registration("asha@example.com"))?;
    h.session.sign_out()?;

    assert_eq!(
        h.session.sign_in("asha@example.com", "wrong-password"),
        Err(AppError::InvalidCredentials)
    );
    assert_eq!(
        h.session.sign_in("stranger@example.com", "abc123"),
        Err(AppError::InvalidCredentials)
    );
    // The failed attempts did not establish a session.
    assert!(h.session.current().is_none());
    Ok(())
}

#[test]
fn email_is_normalized_at_registration() -> Result<()> {
    let h = harness();
    let id = h.session.sign_up(&registration("Asha@Example.COM"))?;
    assert_eq!(id.email, "asha@example.com");
    h.session.sign_out()?;
    assert!(h.session.sign_in("asha@example.com", "abc123").is_ok());
    Ok(())
}

#[test]
fn password_change_end_to_end() -> Result<()> {
    let h = harness();
    let id = h.session.sign_up(&registration("asha@example.com"))?;

    let mut flow = PasswordChange::new();
    flow.run(h.provider.as_ref(), &id, "abc123", "xyz789", "xyz789")?;
    assert_eq!(flow.state(), ChangeState::Done);

    h.session.sign_out()?;
    assert_eq!(
        h.session.sign_in("asha@example.com", "abc123"),
        Err(AppError::InvalidCredentials)
    );
    assert!(h.session.sign_in("asha@example.com", "xyz789").is_ok());
    Ok(())
}

#[test]
fn wrong_current_password_leaves_credential_unchanged() -> Result<()> {
    let h = harness();
    let id = h.session.sign_up(&registration("asha@example.com"))?;

    let mut flow = PasswordChange::new();
    let err = flow.run(h.provider.as_ref(), &id, "guess", "xyz789", "xyz789").unwrap_err();
    assert_eq!(err, AppError::WrongCurrentPassword);
    assert_eq!(flow.state(), ChangeState::Failed);

    h.session.sign_out()?;
    assert!(h.session.sign_in("asha@example.com", "abc123").is_ok());
    Ok(())
}
