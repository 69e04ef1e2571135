pub mod data;
pub mod encode;
pub mod loader;
