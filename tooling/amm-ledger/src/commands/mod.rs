pub mod quote;
pub mod replay;
