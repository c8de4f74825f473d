//! HTTP request handlers for the counter service.

pub mod counter;
pub mod index;
pub mod metrics;
pub mod rooms;

pub use counter::counter_increment;
pub use index::index;
pub use metrics::metrics_handler;
pub use rooms::create_room;
