pub mod clock_in_service;
pub mod items_service;

pub use clock_in_service::ClockInServiceImpl;
pub use items_service::ItemsServiceImpl;
