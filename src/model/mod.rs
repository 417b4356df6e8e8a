//! Models: GRU generator, frozen oracle, bidirectional GRU discriminator.

pub mod discriminator;
pub mod generator;
pub mod oracle;

pub use discriminator::{Discriminator, DiscriminatorConfig};
pub use generator::{Generator, GeneratorConfig};
pub use oracle::Oracle;
