//! Google sign-in (OpenID Connect implicit flow returning an ID token).

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const SIGN_IN_SCOPES: &str = "openid email profile";

/// A prepared authorization request with the random `state` and `nonce`
/// sent to the provider.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: String,
    pub state: String,
    pub nonce: String,
}

pub struct GoogleSignIn {
    pub client_id: String,
}

impl GoogleSignIn {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
        }
    }

    /// Build the authorization URL for a sign-in that redirects to
    /// `redirect_uri` with an `id_token`.
    pub fn authorization_url(&self, redirect_uri: &str) -> AuthorizationRequest {
        let state = uuid::Uuid::new_v4().to_string();
        let nonce = uuid::Uuid::new_v4().to_string();

        let url = format!(
            "{}?client_id={}&redirect_uri={}&response_type=id_token&scope={}&state={}&nonce={}",
            GOOGLE_AUTH_URL,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(SIGN_IN_SCOPES),
            urlencoding::encode(&state),
            urlencoding::encode(&nonce),
        );

        AuthorizationRequest { url, state, nonce }
    }
}
