pub mod decode;
pub mod render;
