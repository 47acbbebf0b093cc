pub mod session_service;
pub use session_service::{AuthError, IssuedSession, SessionService};

pub mod session_service_impl;
pub use session_service_impl::SeaOrmSessionService;

pub mod catalog_service;
pub use catalog_service::{CatalogError, CatalogService, ProductWithStock};

pub mod catalog_service_impl;
pub use catalog_service_impl::SeaOrmCatalogService;

pub mod inventory_service;
pub use inventory_service::{BulkInsertOutcome, InventoryError, InventoryService};

pub mod inventory_service_impl;
pub use inventory_service_impl::SeaOrmInventoryService;

pub mod throttle;
pub use throttle::LoginThrottle;
