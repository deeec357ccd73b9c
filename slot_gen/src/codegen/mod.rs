pub mod shared;
pub mod solidity;
pub mod solidity_gen;
pub mod template;
