pub mod process;
pub mod registry;
pub mod tree;
pub mod usage;
