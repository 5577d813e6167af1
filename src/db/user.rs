use std::error::Error as StdError;

use argon2::{
    password_hash::{self, rand_core::OsRng, SaltString},
    Argon2, PasswordHasher as _, PasswordVerifier as _,
};
use async_trait::async_trait;
use tokio_postgres::{
    types::{
        accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql,
        Type,
    },
    Error, Row,
};

use super::{role, Client};

#[derive(Clone, Debug)]
pub struct User {
    pub id: Id,
    pub login: String,
    pub password_hash: PasswordHash,
    pub role: Option<role::Id>,
}

define_id!(Id);

/// Argon2id digest in PHC string format.
///
/// Only obtainable by hashing a plaintext or by loading a stored value, so a
/// plaintext password can never reach the `password` column.
#[derive(Clone, Debug, PartialEq)]
pub struct PasswordHash(String);

impl PasswordHash {
    pub fn new(secret: &str) -> Result<Self, password_hash::Error> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default().hash_password(secret.as_bytes(), &salt)?;
        Ok(Self(hash.to_string()))
    }

    /// Returns `Ok(false)` on mismatch and `Err` if the stored digest is
    /// malformed.
    pub fn verify(&self, secret: &str) -> Result<bool, password_hash::Error> {
        let parsed = password_hash::PasswordHash::new(&self.0)?;
        match Argon2::default().verify_password(secret.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Restores a digest loaded from outside the database driver.
    pub fn from_stored(phc: impl Into<String>) -> Self {
        Self(phc.into())
    }
}

impl FromSql<'_> for PasswordHash {
    accepts!(TEXT, VARCHAR);

    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        String::from_sql(ty, raw).map(Self)
    }
}

impl ToSql for PasswordHash {
    accepts!(TEXT, VARCHAR);

    to_sql_checked!();

    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        self.0.to_sql(ty, out)
    }
}

#[async_trait]
pub trait UserStore {
    async fn get_user_by_id(&self, id: Id) -> Result<Option<User>, Error>;

    async fn get_user_by_login(
        &self,
        login: &str,
    ) -> Result<Option<User>, Error>;

    async fn list_users(&self) -> Result<Vec<User>, Error>;

    async fn write_user(&self, user: &User) -> Result<(), Error>;

    /// Removes the user together with its sessions; linked employees keep
    /// existing with the reference cleared.
    async fn delete_user(&self, id: Id) -> Result<bool, Error>;
}

fn from_row(row: &Row) -> User {
    User {
        id: row.get("id"),
        login: row.get("login"),
        password_hash: row.get("password"),
        role: row.get("role_id"),
    }
}

#[async_trait]
impl UserStore for Client {
    async fn get_user_by_id(&self, id: Id) -> Result<Option<User>, Error> {
        const SQL: &str = "SELECT id, login, password, role_id \
                           FROM users \
                           WHERE id = $1 \
                           LIMIT 1";
        Ok(self.0.query_opt(SQL, &[&id]).await?.as_ref().map(from_row))
    }

    async fn get_user_by_login(
        &self,
        login: &str,
    ) -> Result<Option<User>, Error> {
        const SQL: &str = "SELECT id, login, password, role_id \
                           FROM users \
                           WHERE login = $1 \
                           LIMIT 1";
        Ok(self.0.query_opt(SQL, &[&login]).await?.as_ref().map(from_row))
    }

    async fn list_users(&self) -> Result<Vec<User>, Error> {
        const SQL: &str = "SELECT id, login, password, role_id \
                           FROM users \
                           ORDER BY login";
        Ok(self.0.query(SQL, &[]).await?.iter().map(from_row).collect())
    }

    async fn write_user(&self, user: &User) -> Result<(), Error> {
        const SQL: &str = "\
            INSERT INTO users (id, login, password, role_id) \
            VALUES ($1, $2, $3, $4) \
            ON CONFLICT (id) DO UPDATE \
            SET login = EXCLUDED.login, \
                password = EXCLUDED.password, \
                role_id = EXCLUDED.role_id";

        self.0
            .execute(
                SQL,
                &[&user.id, &user.login, &user.password_hash, &user.role],
            )
            .await
            .map(drop)
    }

    async fn delete_user(&self, id: Id) -> Result<bool, Error> {
        const SQL: &str = "DELETE FROM users WHERE id = $1";
        Ok(self.0.execute(SQL, &[&id]).await? > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::PasswordHash;

    #[test]
    fn verifies_matching_secret() {
        let hash = PasswordHash::new("hunter22").unwrap();
        assert!(hash.verify("hunter22").unwrap());
        assert!(!hash.verify("hunter23").unwrap());
    }

    #[test]
    fn salts_every_hash() {
        let a = PasswordHash::new("password").unwrap();
        let b = PasswordHash::new("password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn rejects_malformed_digest() {
        let hash = PasswordHash::from_stored("pbkdf2_sha256$1$abc$def");
        assert!(hash.verify("password").is_err());
    }
}
