//! Read access to the clinic's remote patient and visit tables.

pub mod api_types;
pub mod auth;
pub mod client;
pub mod error;
pub mod gateway;
pub mod memory;
pub mod query;
pub mod types;

pub use auth::{AuthProvider, StaticAuth, SupabaseAuth};
pub use client::{http_client, SupabaseGateway};
pub use error::{ErrorKind, GatewayError};
pub use gateway::RemoteGateway;
pub use memory::InMemoryGateway;
pub use query::{ParentFilter, PAGE_SIZE};
pub use types::{Patient, PatientId, Visit, VisitTotals};
