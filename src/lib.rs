pub mod error;
pub mod config;
pub mod schema;
pub mod validation;
pub mod form;
pub mod dependency;
pub mod convert;
pub mod backend;
pub mod store;
