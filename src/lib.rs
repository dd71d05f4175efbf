pub mod config;
pub mod data_types;
pub mod explorer;
pub mod notify;
pub mod repository;
pub mod routing;
pub mod sync;
pub mod tabs;
pub mod tree;

#[cfg(test)]
pub(crate) mod testutils;
