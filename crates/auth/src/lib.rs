//! `folio-auth` — identity, roles and authorization policy.
//!
//! This crate is decoupled from HTTP and storage: it knows how to validate
//! account forms, hash passwords, mint and check tokens, and decide whether
//! a principal may do something.

pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod password;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod user;

pub use authorize::{authorize, require_role, AuthzError};
pub use claims::{validate_claims, JwtClaims, TokenValidationError};
pub use jwt::{Hs256JwtValidator, JwtValidator};
pub use password::{hash_password, verify_password, PasswordError, DEFAULT_BCRYPT_COST};
pub use permissions::{permissions_for, Permission};
pub use principal::Principal;
pub use roles::Role;
pub use user::{NewUser, Profile, ProfileUpdate, RegistrationForm, User, UserUpdate};
