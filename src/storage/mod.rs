pub mod traits;
pub mod json_file;

pub use json_file::JsonFileStore;
pub use traits::WatermarkStore;
