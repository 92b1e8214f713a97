// Services module - Business logic

pub mod booking_flow;
pub mod code_reader;
pub mod model_fetcher;
pub mod parcel;
pub mod scan_dispatcher;
pub mod ticketing_client;
