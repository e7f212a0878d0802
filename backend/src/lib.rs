//! Home-services marketplace backend.
//!
//! Customers spend prepaid credits to book household services, providers
//! accept or decline the jobs assigned to them, and admins can force any
//! booking status. Layers follow a ports-and-adapters split:
//!
//! - [`domain`]: entities, the booking state machine, ledger, ratings, and
//!   payment verification, plus the ports they talk through.
//! - [`inbound`]: the actix-web REST surface.
//! - [`outbound`]: PostgreSQL, in-memory, and payment gateway adapters.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
