//! Reference generative models.
//!
//! Model construction is normally the job of an external model-definition
//! collaborator; these are small, fully specified examples used by the CLI
//! demo and the integration tests.

pub mod battery;
