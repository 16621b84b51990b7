mod component;
mod fetch;
mod render;
mod state;

pub use component::{LoadStatus, NetworkGraphCanvas};
