//! Python extension around the `gridchase` core. Build with the `python`
//! feature (maturin enables `extension-module`) to get the `pygridchase` module.

pub use gridchase;

#[cfg(feature = "python")]
mod python;
