pub mod error;
pub mod google;
pub mod identity;
pub mod session;

pub use error::AuthError;
pub use google::{AuthorizationRequest, GoogleSignIn};
pub use identity::{decode_id_token, UserProfile};
pub use session::{AuthSession, AuthState, AUTH_USER_KEY};
