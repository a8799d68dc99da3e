//! Session-based authentication guard.
//!
//! `CurrentUser` is an extractor composed into handler signatures; routes
//! that take it only run with an authenticated session, everything else is
//! bounced to `/login`.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::Redirect;
use tower_sessions::Session;

use crate::models::User;
use crate::web::Context;

const USER_ID_KEY: &str = "user_id";

/// The authenticated account behind the current session.
pub struct CurrentUser(pub User);

#[axum::async_trait]
impl FromRequestParts<Context> for CurrentUser {
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, ctx: &Context) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, ctx)
            .await
            .map_err(|_| Redirect::to("/login"))?;

        let Some(user_id) = session_user_id(&session).await else {
            return Err(Redirect::to("/login"));
        };

        let db = ctx.db.lock().await;
        match db.find_user_by_id(user_id) {
            Ok(Some(user)) => Ok(CurrentUser(user)),
            // A stale session pointing at a missing user is treated as
            // logged out rather than an error.
            _ => Err(Redirect::to("/login")),
        }
    }
}

/// The user id stored in the session, if any
pub async fn session_user_id(session: &Session) -> Option<i64> {
    session.get::<i64>(USER_ID_KEY).await.ok().flatten()
}

/// Mark the session as authenticated for the given account id
pub async fn login_session(
    session: &Session,
    user_id: i64,
) -> Result<(), tower_sessions::session::Error> {
    // New session id on login; the old anonymous id must not survive.
    session.cycle_id().await?;
    session.insert(USER_ID_KEY, user_id).await
}

/// Drop the authentication marker, keeping the session (and any flash) alive
pub async fn logout_session(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<i64>(USER_ID_KEY).await?;
    Ok(())
}
