/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id hashing and the password length rule
/// - [`jwt`]: HS256 token generation and typed validation
/// - [`otp`]: one-time password generation and expiry
/// - [`policy`]: the authorization rules every mutation is gated by
///
/// # Example
///
/// ```
/// use taskdeck_shared::auth::{jwt, password};
/// use taskdeck_shared::auth::jwt::TokenType;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = password::hash_password("user_password")?;
/// assert!(password::verify_password("user_password", &hash)?);
///
/// let claims = jwt::Claims::new(Uuid::new_v4(), TokenType::Access);
/// let token = jwt::create_token(&claims, "secret-key")?;
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod otp;
pub mod password;
pub mod policy;
