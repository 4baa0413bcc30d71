//! # LocalHub Security
//! 
//! Security utilities: JWT and password hashing/strength.

pub mod jwt;
pub mod password;

pub use jwt::{Claims, JwtError, JwtService, TokenPair};
pub use password::{PasswordError, PasswordPolicy, PasswordService};
