pub mod controller;
pub mod session;
