mod centroid;
mod dice;
mod volume;

pub use centroid::StructureCentroid;
pub use dice::DiceCoefficient;
pub use volume::StructureVolume;
