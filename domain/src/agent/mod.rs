//! Agent domain module

pub mod profile;

pub use profile::AgentProfile;
