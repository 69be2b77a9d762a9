pub mod base;
pub mod nasdaq;
pub mod yahoo;
