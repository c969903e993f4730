pub mod construction;
pub mod model;
pub mod serialization;

pub use construction::GraphLoader;
pub use model::{GraphInstance, NodeId, SimpleGraph};
pub use serialization::{EdgeListFormat, GraphWriter};
