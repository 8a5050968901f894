pub mod geojson;
pub mod sink;

pub use geojson::{LAYER_FILE_NAME, layer_path, write_geojson, write_layer};
pub use sink::TurbineSink;
