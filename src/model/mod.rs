pub mod attention;
pub mod target_generator;
pub mod vectornet;

pub use attention::InteractionAttention;
pub use target_generator::TargetGenerator;
pub use vectornet::{VectorNet, EMBED_DIM};
