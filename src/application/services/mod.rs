pub mod event_bus;
pub mod forwarder;
pub mod jwt;
