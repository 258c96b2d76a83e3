pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod integrations;
pub mod media;
pub mod queue;
pub mod realtime;
pub mod repository;
pub mod service;
