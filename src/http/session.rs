use axum::extract::State;
use axum_extra::extract::{
    cookie::{Cookie, SameSite},
    CookieJar,
};
use serde::Deserialize;

use crate::{api, auth};

use super::{session_handle, Error, Json, SharedAppState};

#[derive(Deserialize)]
pub struct LoginInput {
    login: String,
    password: String,
}

pub async fn login(
    State(state): State<SharedAppState>,
    jar: CookieJar,
    Json(LoginInput { login, password }): Json<LoginInput>,
) -> Result<(CookieJar, Json<api::session::Status>), Error> {
    let session =
        auth::login(&*state.store, &login, &password, state.session.lifetime)
            .await?;

    let cookie = Cookie::build((
        state.session.cookie_name.clone(),
        session.handle.to_string(),
    ))
    .path("/")
    .http_only(true)
    .same_site(SameSite::Lax)
    .secure(state.session.secure);

    Ok((jar.add(cookie), Json(api::session::Status::success())))
}

pub async fn logout(
    State(state): State<SharedAppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<api::session::Status>), Error> {
    let handle = session_handle(&jar, &state.session);
    auth::logout(&*state.store, handle).await?;

    let jar = jar.remove(
        Cookie::build((state.session.cookie_name.clone(), "")).path("/"),
    );
    Ok((jar, Json(api::session::Status::success())))
}

pub async fn check_login(
    State(state): State<SharedAppState>,
    jar: CookieJar,
) -> Result<Json<api::session::CheckLogin>, Error> {
    let handle = session_handle(&jar, &state.session);
    let check = match auth::resolve(&*state.store, handle).await {
        Ok(identity) => api::session::CheckLogin {
            authenticated: true,
            role: identity.role_name().map(ToOwned::to_owned),
            login: Some(identity.user.login),
        },
        Err(auth::Error::Unauthenticated) => api::session::CheckLogin {
            authenticated: false,
            login: None,
            role: None,
        },
        Err(e) => return Err(e.into()),
    };
    Ok(Json(check))
}
