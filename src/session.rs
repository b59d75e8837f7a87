use std::future::{ready, Ready};

use actix_web::{dev::Payload, error::ErrorUnauthorized, Error, FromRequest, HttpRequest};

/// Header the auth proxy sets to the signed-in user's id.
pub const USER_HEADER: &str = "x-user-id";

/// Identity of the signed-in user. Authentication itself happens upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionUser(pub String);

impl FromRequest for SessionUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let user = req
            .headers()
            .get(USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| SessionUser(v.to_string()));

        ready(user.ok_or_else(|| ErrorUnauthorized("Sign in required")))
    }
}
