pub mod api;
pub mod climate;
pub mod config;
pub mod error;
pub mod features;
pub mod geocoder;
pub mod http;
pub mod model;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod recommend;
pub mod season;
pub mod session;
