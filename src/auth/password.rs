use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordVerifier},
};

/// Staff passwords are provisioned out of band as argon2 PHC strings.
pub fn verify_password(password: &str, hashed: &str) -> Result<(), argon2::password_hash::Error> {
    let argon2 = Argon2::default();
    let parsed = PasswordHash::new(hashed)?;

    argon2.verify_password(password.as_bytes(), &parsed)
}
