//! Structured answers from the table-question-answering service.
//!
//! - `types.rs`: the strongly-shaped answer and the kWh quantity
//! - `normalize.rs`: loose JSON payload → `StructuredAnswer`
//! - `aggregate.rs`: answer string → `AggregatedQuantity`

pub mod aggregate;
pub mod normalize;
pub mod types;

pub use aggregate::aggregate;
pub use normalize::normalize;
pub use types::{AggregatedQuantity, StructuredAnswer};
