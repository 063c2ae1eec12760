pub mod big;
pub mod number;
pub mod varint;

pub use big::{BigDecimal, BigInteger};
