pub mod albedo;
pub mod slice;
