//! Promotion optimisation: dependency depths, value functions, allocation

pub mod allocator;
pub mod depth;
pub mod value;

pub use allocator::{PromotionAllocation, PromotionAllocator};
pub use depth::PromotionDepths;
pub use value::{PromotionValue, ValuePool};
