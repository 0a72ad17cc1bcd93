//! `workhub-auth` — membership-scoped authorization boundary.
//!
//! Decoupled from HTTP and storage: every decision is made against a read-only
//! [`MembershipGraph`] supplied by the caller, so the storage layer can run the check
//! inside the same transaction as the write it protects.

pub mod access;
pub mod claims;
pub mod error;
pub mod guard;
pub mod membership;
pub mod principal;
pub mod roles;

pub use access::{Access, AccessTarget, MembershipGraph, has_access, require_access};
pub use claims::{IdentityClaims, TokenValidationError, validate_claims};
pub use error::{AuthzError, EntityKind};
pub use guard::{Action, authorize_mutation};
pub use membership::{Membership, MembershipScope};
pub use principal::PrincipalId;
pub use roles::Role;
