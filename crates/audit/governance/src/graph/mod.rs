//! The governance graph of a rollup deployment.

mod provenance;
pub use provenance::{DeploymentProvenance, RollupInitialization};

mod admin;
pub use admin::admin_of;

mod roles;
pub use roles::{RoleEvent, RoleEventKind, RoleGrants, role_grants_of};

mod builder;
pub use builder::{CodePresence, GovernanceGraph, GovernanceGraphBuilder, TokenStatus};
