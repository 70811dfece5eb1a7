pub mod group;
pub mod migrate;
pub mod user;
