pub mod body;
pub mod crypt;
pub mod value;
pub mod xml;
