pub mod catalog;
pub mod errors;
pub mod event;
pub mod notification;
pub mod order;
pub mod ports;
