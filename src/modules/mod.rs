pub mod anime;
pub mod provider;
