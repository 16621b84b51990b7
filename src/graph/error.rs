//! Error type shared by the whole pipeline.

/// Everything that can go wrong between a payload and a laid out frame.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// A node carries nothing to identify it by.
	#[error("node at position {index} has neither an `id` nor a `name`")]
	MissingIdentifier { index: usize },
	/// The payload or config is not the JSON shape expected.
	#[error("malformed network payload: {0}")]
	Payload(#[from] serde_json::Error),
	/// There are no nodes to lay out.
	#[error("no network data available")]
	GraphEmpty,
	/// Width or height is not finite and positive.
	#[error("viewport {width}x{height} does not have a positive area")]
	InvalidViewport { width: f64, height: f64 },
	/// A pin or drag target is not a finite point.
	#[error("coordinate ({x}, {y}) is not a finite point")]
	InvalidCoordinate { x: f64, y: f64 },
	/// No node has this id.
	#[error("unknown node `{0}`")]
	UnknownNode(String),
}

/// Result of the network pipeline.
pub type Result<T> = std::result::Result<T, Error>;
