//! Cluster and VM shape configuration.

use serde::{Deserialize, Serialize};

use crate::application::commands::VmShape;

/// Node naming.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Node count used when the command line does not give one.
    pub nodes: usize,
    /// Nodes are named `<node_prefix><index>`.
    pub node_prefix: String,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            nodes: 3,
            node_prefix: "microk8s-node".into(),
        }
    }
}

/// Shape of the launched VMs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VmConfig {
    pub memory: String,
    pub disk: String,
    pub image: String,
}

impl Default for VmConfig {
    fn default() -> Self {
        let shape = VmShape::default();
        Self {
            memory: shape.memory,
            disk: shape.disk,
            image: shape.image,
        }
    }
}

impl VmConfig {
    #[must_use]
    pub fn shape(&self) -> VmShape {
        VmShape {
            memory: self.memory.clone(),
            disk: self.disk.clone(),
            image: self.image.clone(),
        }
    }
}

/// Sizes look like `8G`, `512M` or `20GB`.
pub(crate) fn is_size(value: &str) -> bool {
    let digits = value.trim_end_matches(|c: char| c.is_ascii_alphabetic());
    let unit = &value[digits.len()..];
    !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit())
        && matches!(
            unit.to_ascii_uppercase().as_str(),
            "" | "K" | "M" | "G" | "KB" | "MB" | "GB"
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes() {
        assert!(is_size("8G"));
        assert!(is_size("20GB"));
        assert!(is_size("512M"));
        assert!(!is_size("G"));
        assert!(!is_size("8 G"));
        assert!(!is_size("8T"));
        assert!(!is_size("eight"));
    }
}
