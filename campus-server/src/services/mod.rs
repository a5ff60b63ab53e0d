mod group_service;
mod token_service;

pub use group_service::*;
pub use token_service::*;
