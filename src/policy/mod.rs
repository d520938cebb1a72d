pub mod bicache;

pub use bicache::{Bicache, BicacheCore, PromoteEvictReport, Tier};
