pub mod core;
pub mod db;
pub mod factory_link_web_server;
pub mod models;
pub mod routes;
