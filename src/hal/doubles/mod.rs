//! Host side stand-ins for every external collaborator, used by unit tests.
pub mod error;
pub mod flash;
pub mod gpio;
pub mod handoff;
pub mod marker;
pub mod power;
pub mod storage;
pub mod time;
