pub mod dto;
pub mod node;
pub mod servers;
