pub mod driver;
pub mod encoder;
pub mod event;
pub mod hid_report;
pub mod liveness;
pub mod state;
