//! Browser layout and dispenser configuration

use crate::CatalogError;
use serde::{Deserialize, Serialize};
use shelf_core::math::Vec3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub object_width: f32,
    pub horizontal_spacing: f32,
    pub vertical_spacing: f32,
    pub items_per_row: usize,
    pub items_per_page: usize,
    /// Carry distance (world units) beyond which a slot respawns.
    pub spawn_distance: f32,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            object_width: 5.0,
            horizontal_spacing: 7.0,
            vertical_spacing: 15.0,
            items_per_row: 3,
            items_per_page: 9,
            spawn_distance: 5.0,
        }
    }
}

impl BrowserConfig {
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.items_per_page == 0 {
            return Err(CatalogError::InvalidLayout("items_per_page must be at least 1"));
        }
        if self.items_per_row == 0 {
            return Err(CatalogError::InvalidLayout("items_per_row must be at least 1"));
        }
        Ok(())
    }

    pub fn total_pages(&self, total_items: usize) -> usize {
        total_items.div_ceil(self.items_per_page.max(1))
    }

    /// Offset of the `local_index`-th slot of a page, in anchor space.
    pub fn grid_offset(&self, local_index: usize) -> Vec3 {
        let per_row = self.items_per_row.max(1);
        let col = (local_index % per_row) as f32;
        let row = (local_index / per_row) as f32;
        Vec3::new(
            col * (self.object_width + self.horizontal_spacing),
            -row * self.vertical_spacing,
            0.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twenty_entries_make_three_pages() {
        let config = BrowserConfig::default();
        assert_eq!(config.total_pages(20), 3);
        assert_eq!(config.total_pages(18), 2);
        assert_eq!(config.total_pages(1), 1);
    }

    #[test]
    fn grid_offset_walks_rows_then_columns() {
        let config = BrowserConfig::default();
        assert_eq!(config.grid_offset(0), Vec3::ZERO);
        assert_eq!(config.grid_offset(2), Vec3::new(24.0, 0.0, 0.0));
        assert_eq!(config.grid_offset(4), Vec3::new(12.0, -15.0, 0.0));
    }

    #[test]
    fn zero_sized_pages_are_rejected() {
        let config = BrowserConfig {
            items_per_page: 0,
            ..BrowserConfig::default()
        };
        assert!(matches!(config.validate(), Err(CatalogError::InvalidLayout(_))));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: BrowserConfig = serde_json::from_str(r#"{"items_per_page":4}"#).unwrap();
        assert_eq!(config.items_per_page, 4);
        assert_eq!(config.spawn_distance, 5.0);
    }
}
