pub mod blob;
pub mod cli;
pub mod config;
pub mod index;
pub mod pipeline;
pub mod queue;
pub mod tls;
pub mod trail;
pub mod web;
