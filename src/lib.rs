pub mod aggregate;
pub mod chart;
pub mod config;
pub mod data;
