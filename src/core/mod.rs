pub mod detect;
pub mod dir_walker;
pub mod manifest;
pub mod normalizer;
pub mod store;
pub mod tar_walker;
pub mod timestamp;
pub mod walker;
pub mod zip_walker;
