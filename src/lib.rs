pub mod fetch;
pub mod filter;
pub mod model;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod scale;
pub mod traffic;
