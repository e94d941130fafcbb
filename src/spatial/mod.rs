pub mod clustering;
pub mod index;
pub mod projection;
