use tracing::{info, warn};

use crate::{
    error::AppError,
    state::AppState,
    users::{repo::RepoError, services::normalize_email},
};

/// Verifies credentials and issues a session token.
///
/// Unknown email, malformed email and wrong password all end in
/// [`AppError::InvalidCredentials`], and all of them pay for one Argon2
/// verification, so neither the response nor its latency tells them apart.
pub async fn login(state: &AppState, email: &str, password: String) -> Result<String, AppError> {
    let Ok(email) = normalize_email(email) else {
        state.passwords.verify_dummy_blocking(password).await?;
        return Err(AppError::InvalidCredentials);
    };

    let user = match state.users.find_by_email(&email).await {
        Ok(u) => u,
        Err(RepoError::NotFound) => {
            warn!(email = %email, "login unknown email");
            state.passwords.verify_dummy_blocking(password).await?;
            return Err(AppError::InvalidCredentials);
        }
        Err(e) => return Err(e.into()),
    };

    let ok = state
        .passwords
        .verify_blocking(password, user.password_hash.clone())
        .await?;
    if !ok {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let token = state.jwt.issue(user.id, &user.email)?;
    info!(user_id = %user.id, "user logged in");
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::{
        dto::{CreateUserRequest, UpdateUserRequest},
        services::{register, update},
    };

    async fn seeded() -> (AppState, uuid::Uuid) {
        let state = AppState::fake();
        let user = register(
            &state,
            CreateUserRequest {
                email: "ana@example.com".into(),
                password: "segredo123".into(),
                name: "Ana".into(),
                age: 30,
                address: "Rua A, 1".into(),
            },
        )
        .await
        .unwrap();
        (state, user.id)
    }

    #[tokio::test]
    async fn login_issues_verifiable_token() {
        let (state, id) = seeded().await;
        let token = login(&state, "Ana@Example.com", "segredo123".into()).await.unwrap();
        let claims = state.jwt.verify(&token).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.email, "ana@example.com");
    }

    #[tokio::test]
    async fn unknown_email_and_wrong_password_look_the_same() {
        let (state, _) = seeded().await;
        let unknown = login(&state, "bob@example.com", "segredo123".into()).await.unwrap_err();
        let wrong = login(&state, "ana@example.com", "errada1234".into()).await.unwrap_err();
        let malformed = login(&state, "nope", "segredo123".into()).await.unwrap_err();

        for err in [&unknown, &wrong, &malformed] {
            assert!(matches!(err, AppError::InvalidCredentials));
        }
        assert_eq!(unknown.to_string(), wrong.to_string());
        assert_eq!(unknown.status_code(), wrong.status_code());
    }

    #[tokio::test]
    async fn login_still_works_after_profile_update() {
        let (state, id) = seeded().await;
        update(
            &state,
            id,
            UpdateUserRequest {
                address: Some("Rua B, 2".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(login(&state, "ana@example.com", "segredo123".into()).await.is_ok());
    }
}
