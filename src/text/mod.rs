pub mod string;

pub use string::decode_text;
