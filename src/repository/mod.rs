pub mod interface;
pub mod memory;
