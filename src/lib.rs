pub mod api;
pub mod dao;
pub mod etl;
pub mod model;
pub mod service;
