pub mod engine;
pub mod errors;
pub mod factory;

pub use engine::{Engine, HomeFeed, Recommender};
pub use errors::AppError;
pub use factory::AppFactory;
