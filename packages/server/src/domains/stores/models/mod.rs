pub mod product;
pub mod store_config;

pub use product::Product;
pub use store_config::StoreConfiguration;
