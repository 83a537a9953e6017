//! Natural-language questions over an energy-consumption table.
//!
//! A CSV table is loaded once ([`table`]), each query goes to a
//! table-question-answering service, the structured answer is normalized
//! and summed into a kWh quantity ([`answer`]), and an optional
//! text-generation service writes a recommendation ([`orchestrator`]).

pub mod answer;
pub mod config;
pub mod error;
pub mod input;
pub mod orchestrator;
pub mod remote;
pub mod table;

pub use config::Config;
pub use error::{Error, Result, Stage};
pub use orchestrator::{Orchestrator, QueryOutcome};
pub use table::{load_table, Table};
