//! Credential update flow. The provider requires a fresh re-authentication
//! with the current password before it will accept a password change.
//!
//! State machine: Idle -> Reauthenticating -> Updating -> Done | Failed.
//! Local validation fails fast without contacting the provider, and no
//! partial credential state is observable: either re-authentication and
//! update both succeed, or the stored credential is unchanged.

use crate::error::{AppError, AppResult};
use crate::identity::{precheck_password, AuthProvider, Identity};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeState {
    Idle,
    Reauthenticating,
    Updating,
    Done,
    Failed,
}

pub struct PasswordChange {
    state: ChangeState,
}

impl Default for PasswordChange {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordChange {
    pub fn new() -> Self {
        Self { state: ChangeState::Idle }
    }

    pub fn state(&self) -> ChangeState {
        self.state
    }

    /// Drive the flow to completion. Errors leave the machine in `Failed`
    /// and the stored credential untouched.
    pub fn run(
        &mut self,
        provider: &dyn AuthProvider,
        identity: &Identity,
        current_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> AppResult<()> {
        debug_assert_eq!(self.state, ChangeState::Idle);

        if let Err(e) = precheck_password(new_password, confirm_password) {
            self.state = ChangeState::Failed;
            return Err(e);
        }

        self.state = ChangeState::Reauthenticating;
        if let Err(e) = provider.reauthenticate(&identity.uid, current_password) {
            self.state = ChangeState::Failed;
            return Err(match e {
                AppError::InvalidCredentials => AppError::WrongCurrentPassword,
                other => other,
            });
        }

        self.state = ChangeState::Updating;
        if let Err(e) = provider.update_password(&identity.uid, new_password) {
            self.state = ChangeState::Failed;
            return Err(e);
        }

        self.state = ChangeState::Done;
        tracing::info!(uid = %identity.uid, "credential.updated");
        Ok(())
    }
}
