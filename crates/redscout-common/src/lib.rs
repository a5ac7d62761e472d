pub mod backend;
pub mod error;
pub mod page_identity;
pub mod records;

pub use backend::{Backend, BoundingBox, ElementRef, Locator, NavigationResult, ScrollTarget};
pub use error::BackendError;
pub use page_identity::{PageIdentity, RouteKind};
