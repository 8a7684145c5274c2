//! # RCE Sensor - Day-ahead electricity price integration
//!
//! A standalone Rust service that fetches day-ahead electricity market
//! prices (RCE, Rynkowa Cena Energii) from PSE's public CSV export, derives
//! daily statistics, and exposes the current hour's price plus rich metadata
//! as a sensor entity.
//!
//! ## Architecture
//!
//! The application follows a modular architecture with clear separation of concerns:
//!
//! - `config`: Configuration management and validation
//! - `logging`: Structured logging and tracing
//! - `pse`: CSV retrieval and parsing from the operator endpoint
//! - `stats`: Daily price statistics and tariff windows
//! - `sensor`: Sensor entity state and refresh orchestration
//! - `driver`: Update scheduling and snapshot publishing
//! - `web`: Read-only HTTP surface for the published state

pub mod config;
pub mod driver;
pub mod error;
pub mod logging;
pub mod pse;
pub mod sensor;
pub mod stats;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use driver::RceDriver;
pub use error::{RceError, Result};
pub use sensor::RceSensor;
