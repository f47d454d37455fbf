//! zbxtools - command-line toolkit for the Zabbix HTTP/JSON API.
//!
//! One library, six small tools: problem queries (with a follow mode),
//! inventory dumps, chart downloads, interface listings, the API version
//! and a paginated PDF report assembler.

pub mod api;
pub mod cli;
pub mod config;
pub mod graph;
pub mod interface;
pub mod inventory;
pub mod problem;
pub mod report;
pub mod scope;
