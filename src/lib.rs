//! # MCP Server for MISP
//!
//! This library provides an MCP (Model Context Protocol) server implementation
//! for the MISP threat intelligence platform. It allows AI models and
//! automation scripts to interact with MISP through a standardized protocol.
//!
//! ## Features
//!
//! - Test connectivity and retrieve version information from a MISP instance
//! - Create events and retrieve them by ID or UUID
//! - Search events by date window, organization, tags, and threat level
//! - Add attributes to events and list them with type/category filters
//! - Browse recent events and configured feeds as MCP resources
//!
//! ## Usage
//!
//! The server is typically run as a standalone binary that communicates
//! over stdio with MCP clients.

pub mod format;
pub mod misp;

pub use misp::{client::MispClient, error::MispApiError};
