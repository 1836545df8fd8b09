mod component;
mod export;
pub mod history;
mod render;
mod state;
pub mod store;
mod svg;
pub mod types;

pub use component::Flowchart;
