mod client;
pub mod query;

pub use client::{Page, WorkspaceClient};
