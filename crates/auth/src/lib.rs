//! `tillpoint-auth` — roles, role gates, and credential verification.
//!
//! This crate is intentionally decoupled from HTTP and storage: the role gate
//! and provisioning hierarchy are pure predicates, and token verification sits
//! behind the `IdentityVerifier` seam.

pub mod claims;
pub mod hierarchy;
pub mod identity;
pub mod roles;

pub use claims::{AccessClaims, validate_claims};
pub use hierarchy::can_provision;
pub use identity::{Hs256IdentityVerifier, IdentityVerifier, StaticIdentityVerifier, VerifiedSubject};
pub use roles::{Role, RoleParseError, allowed};
