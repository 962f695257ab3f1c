pub mod classify;
pub mod cycles;
pub mod explain;
pub mod load;
