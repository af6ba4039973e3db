//! Shared type definitions for the GABM opinion simulation.
//!
//! This crate is the leaf of the workspace: value types with no behaviour
//! beyond validation and lookup. Snapshot types are exported to `TypeScript`
//! via `ts-rs` so external plotting tools can consume run histories.
//!
//! # Modules
//!
//! - [`ids`] -- Integer newtypes for agents, groups, topics, and attributes
//! - [`opinion`] -- Topics, scale points, value maps, and held opinions
//! - [`attribute`] -- Gender and ethnicity categories and their maps
//! - [`snapshot`] -- Per-round opinion snapshots and run history
//! - [`error`] -- [`OpinionError`]

pub mod attribute;
pub mod error;
pub mod ids;
pub mod opinion;
pub mod snapshot;

// Re-export all public types at crate root for convenience.
pub use attribute::{Attribute, AttributeMap, Ethnicity, EthnicityMap, Gender, GenderMap};
pub use error::OpinionError;
pub use ids::{AgentId, EthnicityId, GenderId, GroupId, OpinionTopicId};
pub use opinion::{Opinion, OpinionTopic, OpinionValue, OpinionValueMap, UNKNOWN_DESCRIPTION};
pub use snapshot::{OpinionHistory, RoundSnapshot, mean_of};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation for the snapshot types.

    #[test]
    fn export_bindings() {
        use ts_rs::TS;

        let _ = crate::ids::AgentId::export_all();
        let _ = crate::ids::GroupId::export_all();
        let _ = crate::ids::OpinionTopicId::export_all();
        let _ = crate::ids::GenderId::export_all();
        let _ = crate::ids::EthnicityId::export_all();
        let _ = crate::snapshot::RoundSnapshot::export_all();
        let _ = crate::snapshot::OpinionHistory::export_all();
    }
}
