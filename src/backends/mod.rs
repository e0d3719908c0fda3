pub mod file;

#[cfg(feature = "backend-mock")]
pub mod mock;
