pub mod candidate;
pub mod export;
pub mod load;
pub mod merge;
pub mod validate;
