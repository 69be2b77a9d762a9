pub mod price;
pub mod symbol;
