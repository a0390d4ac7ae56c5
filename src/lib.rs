pub mod clock;
pub mod config;
pub mod credentials;
pub mod db;
pub mod domain;
pub mod forms;
pub mod generator;
pub mod hosting;
pub mod models;
pub mod platform;
pub mod repository;
pub mod schema;
pub mod services;
