pub mod collaborator;
pub mod context;
pub mod handle;
pub mod manager;
pub mod policy;
pub mod store;
pub mod strategy;
pub mod stream;
pub mod types;


pub use collaborator::*;
pub use context::*;
pub use handle::*;
pub use manager::*;
pub use policy::*;
pub use store::*;
pub use strategy::*;
pub use stream::*;
pub use types::*;
