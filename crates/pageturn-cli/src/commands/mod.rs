pub mod config;
pub mod pointer;
pub mod routes;
pub mod simulate;
