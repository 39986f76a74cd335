//! Backend data access.

pub mod backend;

pub use backend::{BackendClient, ClientError, DiffQuery, DiffSource, SummarySource};
