pub mod config;
pub mod logging;

pub mod control;
pub mod fetch;
pub mod inspect;
pub mod pipeline;
pub mod storage;
pub mod task;
pub mod url_model;
