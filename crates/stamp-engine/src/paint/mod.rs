//! Paint types for stamps.
//!
//! Stamps are colored by multiplying the sampled texel with a packed 32-bit
//! tint. Texture pixels share the same packing (see [`Tint`]).

mod tint;

pub use tint::Tint;
