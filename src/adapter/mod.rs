pub mod suri;
