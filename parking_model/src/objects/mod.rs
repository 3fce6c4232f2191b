pub mod area;
pub mod permit;
pub mod regulation;
