use crate::error::AppError;
use bcrypt::{hash, verify};

/// bcrypt hashing with a fixed work factor taken from the configuration.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Salts and hashes a plaintext password. The salt is generated by bcrypt.
    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        hash_password(password, self.cost)
    }

    pub fn verify(&self, password: &str, hashed_password: &str) -> Result<bool, AppError> {
        verify_password(password, hashed_password)
    }
}

pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    hash(password, cost)
        .map_err(|e| AppError::InternalServerError(format!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, hashed_password: &str) -> Result<bool, AppError> {
    verify(password, hashed_password)
        .map_err(|e| AppError::InternalServerError(format!("Failed to verify password: {}", e)))
}
