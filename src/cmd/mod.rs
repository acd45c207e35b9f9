//! CLI command implementations.
//!
//! | Module   | Commands handled |
//! |----------|------------------|
//! | `report` | `Report`         |
//! | `config` | `Config`         |

pub mod config;
pub mod report;

pub use config::cmd_config;
pub use report::cmd_report;
