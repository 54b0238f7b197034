pub mod extractor;
pub mod i_wh_req_handler;
pub mod mapper;
pub mod wh_req_handler;
