pub use hart::{Hart, HartConfig, HartError, MachineInfo, StepStatus};

pub mod alu;
pub mod bus;
pub mod csr;
pub mod hart;
pub mod ifu;
pub mod isa;
pub mod privilege_level;
pub mod ram;
pub mod registers;
pub mod trace;
