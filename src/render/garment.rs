use std::sync::Arc;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::render::color::{parse_hex, Rgb};

/// Catalog category. Unknown categories deserialise as [`GarmentCategory::Other`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GarmentCategory {
    Shirt,
    Dress,
    Jacket,
    Tshirt,
    #[default]
    #[serde(other)]
    Other,
}

impl GarmentCategory {
    /// Collar and hem colours used when nothing more specific is known.
    pub fn palette(self) -> (Rgb, Rgb) {
        let (top, bottom) = match self {
            Self::Shirt => ("#3B82F6", "#1E40AF"),
            Self::Dress => ("#EC4899", "#BE185D"),
            Self::Jacket => ("#059669", "#047857"),
            Self::Tshirt => ("#F59E0B", "#D97706"),
            Self::Other => ("#6366F1", "#4338CA"),
        };
        (
            parse_hex(top).unwrap_or([0, 0, 0]),
            parse_hex(bottom).unwrap_or([0, 0, 0]),
        )
    }
}

/// Immutable catalog record for a selectable garment.
///
/// Shared as `Arc<GarmentDescriptor>` while selected; the pipeline never
/// mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GarmentDescriptor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: GarmentCategory,
    /// Flat base colour, if the catalog provides one.
    #[serde(default)]
    pub color: Option<Rgb>,
    /// Base image stretched over the torso. Not part of the JSON shape.
    #[serde(skip)]
    pub image: Option<Arc<RgbaImage>>,
    pub price: f64,
}

impl GarmentDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>, category: GarmentCategory) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            color: None,
            image: None,
            price: 0.0,
        }
    }

    pub fn with_color(mut self, color: Rgb) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_image(mut self, image: RgbaImage) -> Self {
        self.image = Some(Arc::new(image));
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = price;
        self
    }

    /// The base image, ignoring zero-sized ones.
    pub fn usable_image(&self) -> Option<&Arc<RgbaImage>> {
        self.image
            .as_ref()
            .filter(|img| img.width() > 0 && img.height() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palettes_are_distinct_per_category() {
        assert_eq!(GarmentCategory::Shirt.palette().0, [0x3b, 0x82, 0xf6]);
        assert_eq!(GarmentCategory::Other.palette().1, [0x43, 0x38, 0xca]);
        assert_ne!(
            GarmentCategory::Dress.palette(),
            GarmentCategory::Jacket.palette()
        );
    }

    #[test]
    fn descriptor_deserialises_from_catalog_json() {
        let json = r#"{"id":"g1","name":"Linen Shirt","category":"shirt","color":[10,20,30],"price":39.5,"stock":4}"#;
        let g: GarmentDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(g.category, GarmentCategory::Shirt);
        assert_eq!(g.color, Some([10, 20, 30]));
        assert!(g.image.is_none());
        assert_eq!(g.price, 39.5);
    }

    #[test]
    fn unknown_category_falls_back_to_other() {
        let json = r#"{"id":"g2","name":"Scarf","category":"scarf","price":9.0}"#;
        let g: GarmentDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(g.category, GarmentCategory::Other);
    }

    #[test]
    fn empty_image_is_not_usable() {
        let g = GarmentDescriptor::new("g3", "Blank", GarmentCategory::Tshirt)
            .with_image(RgbaImage::new(0, 0));
        assert!(g.usable_image().is_none());
        let g = g.with_image(RgbaImage::new(2, 2));
        assert!(g.usable_image().is_some());
    }
}
