use std::sync::Arc;

use tracing::{info, instrument};

use crate::data::profile_repository::ProfileRepository;
use crate::data::user_repository::UserRepository;
use crate::domain::{
    error::DomainError,
    user::{NewAccount, User},
};
use crate::infrastructure::security::{JwtKeys, hash_password, verify_password};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuperuserOutcome {
    Created,
    PasswordReset,
    AlreadyExists,
}

#[derive(Clone)]
pub struct AuthService<R, P>
where
    R: UserRepository + 'static,
    P: ProfileRepository + 'static,
{
    repo: Arc<R>,
    profiles: Arc<P>,
    keys: JwtKeys,
}

impl<R, P> AuthService<R, P>
where
    R: UserRepository + 'static,
    P: ProfileRepository + 'static,
{
    pub fn new(repo: Arc<R>, profiles: Arc<P>, keys: JwtKeys) -> Self {
        Self {
            repo,
            profiles,
            keys,
        }
    }

    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    pub async fn get_user(&self, id: uuid::Uuid) -> Result<User, DomainError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(DomainError::UserNotFound(id.to_string()))
    }

    #[instrument(skip(self, account), fields(username = %account.username))]
    pub async fn register(&self, account: NewAccount) -> Result<User, DomainError> {
        account.validate().map_err(DomainError::Validation)?;

        let username = account.username.trim().to_string();
        let email = account.email.trim().to_lowercase();
        if self.repo.find_by_username(&username).await?.is_some() {
            return Err(DomainError::UserAlreadyExists(
                "username already taken".to_string(),
            ));
        }
        if self.repo.find_by_email(&email).await?.is_some() {
            return Err(DomainError::UserAlreadyExists(
                "email already registered".to_string(),
            ));
        }

        let hash =
            hash_password(&account.password).map_err(|err| DomainError::Internal(err.to_string()))?;
        let user = User::new(
            username,
            email,
            account.first_name.trim().to_string(),
            account.last_name.trim().to_string(),
            hash,
        );
        let user = self.repo.create(user).await?;
        self.profiles.get_or_create(user.id).await?;
        Ok(user)
    }

    /// Accepts either the username or the email as `login`.
    #[instrument(skip(self, password))]
    pub async fn login(&self, login: &str, password: &str) -> Result<(User, String), DomainError> {
        let login = login.trim();
        let user = if login.contains('@') {
            self.repo.find_by_email(&login.to_lowercase()).await?
        } else {
            self.repo.find_by_username(login).await?
        }
        .ok_or(DomainError::Unauthorized)?;

        let valid = verify_password(password, &user.password_hash)
            .map_err(|_| DomainError::Unauthorized)?;
        if !valid {
            return Err(DomainError::Unauthorized);
        }

        let token = self.issue_token(&user)?;
        Ok((user, token))
    }

    pub fn issue_token(&self, user: &User) -> Result<String, DomainError> {
        self.keys
            .generate_token(user.id)
            .map_err(|err| DomainError::Internal(err.to_string()))
    }

    /// Creates a staff account, or with `reset` restores the password and
    /// staff flag of an existing one.
    #[instrument(skip(self, password))]
    pub async fn ensure_superuser(
        &self,
        username: &str,
        email: &str,
        password: &str,
        reset: bool,
    ) -> Result<SuperuserOutcome, DomainError> {
        if password.len() < 8 {
            return Err(DomainError::Validation(
                "password must be at least 8 characters".into(),
            ));
        }
        let email = email.trim().to_lowercase();

        if let Some(existing) = self.repo.find_by_username(username).await? {
            if !reset {
                return Ok(SuperuserOutcome::AlreadyExists);
            }
            let hash =
                hash_password(password).map_err(|err| DomainError::Internal(err.to_string()))?;
            self.repo
                .update_credentials(existing.id, &email, &hash, true)
                .await?;
            info!(user_id = %existing.id, "superuser password reset");
            return Ok(SuperuserOutcome::PasswordReset);
        }

        let hash = hash_password(password).map_err(|err| DomainError::Internal(err.to_string()))?;
        let mut user = User::new(
            username.to_string(),
            email,
            String::new(),
            String::new(),
            hash,
        );
        user.is_staff = true;
        let user = self.repo.create(user).await?;
        self.profiles.get_or_create(user.id).await?;
        info!(user_id = %user.id, "superuser created");
        Ok(SuperuserOutcome::Created)
    }
}
