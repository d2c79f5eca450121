//! Identity, auth provider seam and session state.
//! Keep the public surface thin and split implementation across sub-modules.

mod principal;
mod provider;
mod session;

pub use principal::Identity;
pub use provider::{AuthProvider, LocalAuthProvider};
pub use session::{precheck_password, RegistrationForm, SessionContext};
