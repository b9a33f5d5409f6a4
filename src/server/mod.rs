mod catalog;
pub mod dto;
pub mod response;
mod router;
pub mod scope;

pub use catalog::catalog_router;
pub use router::{AppState, create_router};
pub use scope::TenantScope;
