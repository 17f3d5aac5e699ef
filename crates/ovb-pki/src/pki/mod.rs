pub mod pem;
pub mod runner;
pub mod toolkit;
pub mod types;
