//! Business tools for CampaignBrain agents.
//!
//! Tools form a closed catalog ([`Tool`]). Each has a name, a description,
//! a JSON Schema for its arguments derived from a typed argument struct,
//! and a pure handler over a [`BusinessData`] snapshot. Dispatch through
//! [`ToolRegistry`] is lookup, permission check, argument validation, then
//! execution; every failure comes back as an error [`ToolResult`] rather
//! than an `Err`.
//!
//! [`ToolResult`]: brain_common::ToolResult

pub mod dataset;
pub mod error;
pub mod finance;
pub mod format;
pub mod marketing;
pub mod registry;
pub mod tool;

pub use dataset::{BusinessData, Campaign, Channel, RevenueRecord};
pub use error::ToolError;
pub use registry::{ToolRegistry, tools_for};
pub use tool::Tool;
