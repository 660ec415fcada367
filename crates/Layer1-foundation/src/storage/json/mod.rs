mod layer;

pub use layer::{ConfigLayer, LayerScope};
