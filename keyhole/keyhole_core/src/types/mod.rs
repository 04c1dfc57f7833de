//! Data types shared across Keyhole crates.

pub mod roles;

pub use roles::{
    has_all_roles, has_any_role, has_no_roles, has_role, Candidates, RoleName, RoleProvider,
    RoleSet,
};
