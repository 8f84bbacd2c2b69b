//! Project data and UFO import

pub mod conversions;
pub mod project;
pub mod ufo;

pub use project::{
    JsonFilePersistence, MemoryPersistence, Project, ProjectChanges, ProjectPersistence,
};
