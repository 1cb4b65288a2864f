pub mod stage0_normalize;
pub mod stage1_chunk;
pub mod stage2_revise;
pub mod stage3_render;

pub use stage0_normalize::*;
pub use stage1_chunk::*;
pub use stage2_revise::*;
pub use stage3_render::*;
