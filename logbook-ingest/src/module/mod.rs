pub mod header;
pub mod names;
pub mod night;
pub mod scan;
pub mod sync;
pub mod target;
