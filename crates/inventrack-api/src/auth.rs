// Session lifecycle endpoints.
//
// Login and signup set a session cookie in the client's jar; every later
// request (including logout and token validation) replays it.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::json;
use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;

/// The authenticated user as reported by the auth endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "full_name")]
    pub full_name: Option<String>,
}

#[derive(Deserialize)]
struct AuthResponse {
    user: SessionUser,
}

#[derive(Deserialize)]
struct TokenValidation {
    #[serde(default)]
    valid: Option<bool>,
    #[serde(default)]
    user: Option<SessionUser>,
}

fn string_or_number<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }
    Ok(match Raw::deserialize(de)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

/// Turn a credential rejection into `Error::Authentication`; leave the rest.
fn rejected_as_auth(err: Error) -> Error {
    match err {
        Error::Api {
            status: 400 | 401 | 403,
            message,
            ..
        } => Error::Authentication { message },
        other => other,
    }
}

impl ApiClient {
    /// Authenticate with email and password (`POST /user/login`).
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<SessionUser, Error> {
        debug!(email, "logging in");

        let body = json!({
            "email": email,
            "password": password.expose_secret(),
        });

        let resp: AuthResponse = self
            .post("user/login", &body)
            .await
            .map_err(rejected_as_auth)?;

        debug!(user = %resp.user.id, "login successful");
        Ok(resp.user)
    }

    /// Register a new account (`POST /user/signup`). The server starts a
    /// session for the new user.
    pub async fn signup(
        &self,
        email: &str,
        password: &SecretString,
        full_name: Option<&str>,
    ) -> Result<SessionUser, Error> {
        debug!(email, "signing up");

        let body = json!({
            "email": email,
            "password": password.expose_secret(),
            "fullName": full_name,
        });

        let resp: AuthResponse = self.post("user/signup", &body).await?;
        Ok(resp.user)
    }

    /// End the current session (`POST /user/logout`).
    pub async fn logout(&self) -> Result<(), Error> {
        self.post_empty("user/logout").await?;
        debug!("logout complete");
        Ok(())
    }

    /// Check whether the session cookie is still valid
    /// (`GET /user/validate-token`).
    ///
    /// Returns `Ok(None)` when the server says the session is gone, so a
    /// restart can distinguish "logged out" from "server unreachable".
    pub async fn validate_token(&self) -> Result<Option<SessionUser>, Error> {
        match self.get::<TokenValidation>("user/validate-token").await {
            Ok(v) if v.valid == Some(false) => Ok(None),
            Ok(v) => Ok(v.user),
            Err(e) if matches!(e.status(), Some(401 | 403)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
