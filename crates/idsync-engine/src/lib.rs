//! # Dynamic-Membership Synchronization Engine
//!
//! Mirrors principal information from an external identity provider
//! into a local identity store, representing group membership as a
//! flattened principal-name attribute on each user instead of
//! materialized group objects.
//!
//! ## Key Components
//!
//! - [`SyncEngine`] - entry point; classifies identities and drives a sync
//! - [`MembershipResolver`] - depth-bounded flattening of nested groups
//! - [`GroupMaterializer`] - placeholder groups for dynamic-groups mode
//! - [`MembershipCleaner`] - strips legacy memberships, removes orphans
//! - [`SyncPolicy`] - per-principal-type sync configuration
//!
//! ## Control Flow
//!
//! ```text
//! ┌────────────┐  group   ┌──────────────────┐
//! │ SyncEngine │─────────►│ GroupMaterializer │
//! │   sync()   │          └──────────────────┘
//! └─────┬──────┘
//!       │ user (attributes via DefaultSyncPath)
//!       ▼
//! ┌────────────────────┐        ┌───────────────────┐
//! │ MembershipResolver │───────►│ MembershipCleaner │
//! │  sync_membership   │ legacy │      clear        │
//! └────────────────────┘        └───────────────────┘
//! ```
//!
//! ## Sync Modes
//!
//! A record is in exactly one of two membership modes:
//!
//! - **Legacy**: synced before dynamic membership existed; carries a
//!   last-synced timestamp and no principal-name attribute. Membership
//!   is materialized as local group objects.
//! - **Dynamic**: carries the flattened principal-name attribute.
//!   Local groups exist only as memberless placeholders, and only when
//!   the dynamic-groups option is enabled.
//!
//! The transition is one-directional, Legacy to Dynamic, through
//! [`SyncEngine::convert_to_dynamic_membership`].
//!
//! The engine holds no locks and performs no retries; the calling
//! scheduler serializes store access and owns retry policy.

pub mod cleaner;
pub mod delegate;
pub mod engine;
pub mod error;
pub mod materializer;
pub mod outcome;
pub mod policy;
pub mod resolver;
pub mod store;

pub use cleaner::MembershipCleaner;
pub use delegate::DefaultSyncPath;
pub use engine::SyncEngine;
pub use error::{SyncError, SyncResult};
pub use materializer::GroupMaterializer;
pub use outcome::{SyncOutcome, SyncStatus};
pub use policy::{GroupPolicy, SyncPolicy, UserPolicy};
pub use resolver::MembershipResolver;
pub use store::{LocalPrincipalRecord, LocalStore, MembershipMode, StoreError, StoreResult};
