//! Network data normalization and force-directed layout.
//!
//! Raw JSON goes through [`normalize`] into a canonical [`Graph`], which a
//! [`ForceSimulation`] lays out step by step. Each step yields a [`Frame`] for a
//! [`RenderAdapter`]. [`NetworkController`] ties these together behind explicit commands.
//! Nothing in here touches the DOM, so it runs and tests natively.

pub mod config;
pub mod controller;
pub mod error;
pub mod frame;
pub mod layout;
pub mod normalize;
pub mod slot;
pub mod types;

pub use config::{CategoryStyle, Extent, LayoutConfig, NodeShape};
pub use controller::{Command, NetworkController, Outcome};
pub use error::{Error, Result};
pub use frame::{EdgeSegment, Frame, NodePosition, RenderAdapter};
pub use layout::{ForceSimulation, SimulationState, Viewport};
pub use normalize::{EndpointRef, NormalizeReport, Normalized, normalize, normalize_str};
pub use slot::{Dispose, Slot};
pub use types::{CategorySummary, Edge, Graph, GraphSummary, Node, Point};
