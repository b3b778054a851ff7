pub mod builder;
pub mod registry;
pub mod rescale;
pub mod sync;
