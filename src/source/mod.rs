mod core;


pub use self::core::{MapError, MappedSource};
