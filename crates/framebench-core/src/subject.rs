use serde::{Deserialize, Serialize};

/// Graphics workloads the benchmark knows how to launch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
    #[default]
    Liblava,
    D3d9,
}

impl Subject {
    pub fn label(&self) -> &'static str {
        match self {
            Subject::Liblava => "lava-triangle",
            Subject::D3d9 => "D3D9-benchmark",
        }
    }

    /// Only liblava understands resolution/fps-cap/buffering flags.
    pub fn accepts_launch_flags(&self) -> bool {
        matches!(self, Subject::Liblava)
    }
}
