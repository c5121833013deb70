//! Plot Style Module
//! Explicit styling configuration handed to rendering collaborators, in
//! place of process-global plot state.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StyleError {
    #[error("failed to read style file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse style file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Default series palette (RGB).
pub const PALETTE: [[u8; 3]; 10] = [
    [231, 76, 60],  // Red
    [46, 204, 113], // Green
    [155, 89, 182], // Purple
    [243, 156, 18], // Orange
    [26, 188, 156], // Teal
    [233, 30, 99],  // Pink
    [0, 188, 212],  // Cyan
    [255, 87, 34],  // Deep Orange
    [121, 85, 72],  // Brown
    [96, 125, 139], // Blue Grey
];

/// Chart styling for downstream renderers. The crate never draws anything
/// itself; consumers take this by value instead of reading shared state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotStyle {
    pub figure_width: u32,
    pub figure_height: u32,
    pub palette: Vec<[u8; 3]>,
    pub x_label_rotation: f32,
    pub show_legend: bool,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            figure_width: 1200,
            figure_height: 600,
            palette: PALETTE.to_vec(),
            x_label_rotation: 45.0,
            show_legend: true,
        }
    }
}

impl PlotStyle {
    /// Load a style from a JSON file; absent fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, StyleError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Color for the n-th plotted series, cycling through the palette.
    pub fn color_for(&self, index: usize) -> [u8; 3] {
        if self.palette.is_empty() {
            return PALETTE[index % PALETTE.len()];
        }
        self.palette[index % self.palette.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn partial_json_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"figure_width": 800, "show_legend": false}}"#).unwrap();
        file.flush().unwrap();

        let style = PlotStyle::from_json_file(file.path()).unwrap();
        assert_eq!(style.figure_width, 800);
        assert!(!style.show_legend);
        assert_eq!(style.figure_height, 600);
        assert_eq!(style.palette.len(), PALETTE.len());
    }

    #[test]
    fn malformed_json_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        file.flush().unwrap();

        let err = PlotStyle::from_json_file(file.path()).unwrap_err();
        assert!(matches!(err, StyleError::Json(_)));
    }

    #[test]
    fn palette_cycles() {
        let style = PlotStyle::default();
        assert_eq!(style.color_for(0), PALETTE[0]);
        assert_eq!(style.color_for(PALETTE.len()), PALETTE[0]);
    }
}
