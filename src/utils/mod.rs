pub mod compare;
pub mod convexity;
pub mod point_order;
pub mod segment;
pub mod types;
pub mod vec2;
