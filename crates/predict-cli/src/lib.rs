pub mod commands;
pub mod data_source;
