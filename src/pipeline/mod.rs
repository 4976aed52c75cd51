pub mod normalize;
pub mod extraction;
pub mod sections;
pub mod lines;
pub mod metadata;
pub mod pricing;
pub mod parser;
pub mod aggregate;
