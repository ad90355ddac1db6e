// digiprobe-api: Async HTTP transport for probe endpoints, network identity
// providers, and the session/result store.

pub mod error;
pub mod identity;
pub mod probe;
pub mod records;
pub mod transport;

pub use error::Error;
pub use identity::{IdentityClient, IpApiResponse, IpWhoResponse};
pub use probe::{ProbeClient, ProbeEndpoints};
pub use records::{NewResult, NewSession, RecordsClient, ResultRow, SessionRow};
pub use transport::{TlsMode, TransportConfig};
