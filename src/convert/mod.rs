pub mod converter;
pub mod external;
