use std::path::PathBuf;

use clap::ValueEnum;

/// Camera rig layouts the network can be trained on. Each one fixes the
/// number of views per object and the candidate table shipped with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ViewpointCase {
    /// 12 views on a ring around the upright object.
    #[value(name = "1")]
    Ring12,
    /// 20 views on the vertices of a dodecahedron.
    #[value(name = "2")]
    Dodecahedron20,
    /// 160 views, dodecahedron vertices with in-plane rotations.
    #[value(name = "3")]
    Dense160,
}

impl ViewpointCase {
    pub fn num_views(self) -> usize {
        match self {
            ViewpointCase::Ring12 => 12,
            ViewpointCase::Dodecahedron20 => 20,
            ViewpointCase::Dense160 => 160,
        }
    }

    pub fn number(self) -> u8 {
        match self {
            ViewpointCase::Ring12 => 1,
            ViewpointCase::Dodecahedron20 => 2,
            ViewpointCase::Dense160 => 3,
        }
    }

    pub fn default_table_path(self) -> PathBuf {
        PathBuf::from(format!("vcand_case{}.npy", self.number()))
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/case.rs"]
mod tests;
