//! Error types for the `gabm-types` crate.

use crate::ids::OpinionTopicId;

/// Errors raised by the opinion value model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OpinionError {
    /// A value was assigned that is not on the topic's registered scale.
    #[error("value {value} is not a valid value for {topic}; valid values are {valid:?}")]
    InvalidOpinionValue {
        /// The topic the value was assigned to.
        topic: OpinionTopicId,
        /// The rejected value.
        value: i32,
        /// The values registered for the topic.
        valid: Vec<i32>,
    },
}
