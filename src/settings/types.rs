use serde::{Deserialize, Deserializer, Serialize};

use crate::settings::error::{Result, SettingsError};

pub const MIN_OPACITY: f32 = 0.1;
pub const MAX_OPACITY: f32 = 1.0;

/// Garment draping tightness preset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitMode {
    Loose,
    #[default]
    Regular,
    Tight,
}

impl FitMode {
    /// Multiplier applied to every garment width. Loose >= regular >= tight.
    pub fn width_multiplier(self) -> f32 {
        match self {
            Self::Loose => 1.15,
            Self::Regular => 1.0,
            Self::Tight => 0.9,
        }
    }
}

/// Processing/export quality preset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    Low,
    #[default]
    Medium,
    High,
}

impl Quality {
    /// Side length in pixels of one segmentation mask cell.
    pub fn mask_block(self) -> u32 {
        match self {
            Self::Low => 8,
            Self::Medium => 4,
            Self::High => 1,
        }
    }

    /// JPEG encoder quality (1-100).
    pub fn jpeg_quality(self) -> u8 {
        match self {
            Self::Low => 60,
            Self::Medium => 80,
            Self::High => 95,
        }
    }
}

/// Validated overlay styling consumed by the compositor and estimator.
///
/// Fields are private: every value is inside its bounds because the only
/// way to change one is [`StyleSettings::apply`], which clamps. Deserialising
/// goes through the same path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "SettingsUpdate")]
pub struct StyleSettings {
    overlay_opacity: f32,
    hue: Option<f32>,
    fit_mode: FitMode,
    quality: Quality,
    pose_confidence_threshold: f32,
    segmentation_threshold: f32,
}

impl Default for StyleSettings {
    fn default() -> Self {
        Self {
            overlay_opacity: 0.8,
            hue: None,
            fit_mode: FitMode::Regular,
            quality: Quality::Medium,
            pose_confidence_threshold: 0.5,
            segmentation_threshold: 0.5,
        }
    }
}

/// Partial update to [`StyleSettings`]. Absent fields are left unchanged;
/// unknown JSON keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub overlay_opacity: Option<f32>,
    /// `Some(None)` clears the hue, falling back to the garment colour.
    #[serde(default, deserialize_with = "present")]
    pub hue: Option<Option<f32>>,
    pub fit_mode: Option<FitMode>,
    pub quality: Option<Quality>,
    pub pose_confidence_threshold: Option<f32>,
    pub segmentation_threshold: Option<f32>,
}

/// Distinguish an explicit `null` from a missing key.
fn present<'de, T, D>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl SettingsUpdate {
    /// Parse an update from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| SettingsError::Parse(e.to_string()))
    }

    fn reject_non_finite(&self) -> Result<()> {
        let numeric = [
            ("overlayOpacity", self.overlay_opacity),
            ("hue", self.hue.flatten()),
            ("poseConfidenceThreshold", self.pose_confidence_threshold),
            ("segmentationThreshold", self.segmentation_threshold),
        ];
        for (field, value) in numeric {
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(SettingsError::Rejected {
                        field,
                        reason: format!("{v} is not a finite number"),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Wrap a hue in degrees into [0, 360).
pub fn wrap_hue(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

fn clamp_recorded(
    value: f32,
    lo: f32,
    hi: f32,
    field: &'static str,
    clamped: &mut Vec<&'static str>,
) -> f32 {
    let out = value.clamp(lo, hi);
    if out != value {
        clamped.push(field);
    }
    out
}

impl StyleSettings {
    pub fn overlay_opacity(&self) -> f32 {
        self.overlay_opacity
    }

    pub fn hue(&self) -> Option<f32> {
        self.hue
    }

    pub fn fit_mode(&self) -> FitMode {
        self.fit_mode
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    pub fn pose_confidence_threshold(&self) -> f32 {
        self.pose_confidence_threshold
    }

    pub fn segmentation_threshold(&self) -> f32 {
        self.segmentation_threshold
    }

    /// Apply a partial update, clamping out-of-range values.
    ///
    /// Non-finite numbers reject the whole update and leave the settings
    /// untouched. On success returns the names of fields that were clamped
    /// or wrapped.
    pub fn apply(&mut self, update: &SettingsUpdate) -> Result<Vec<&'static str>> {
        update.reject_non_finite()?;

        let mut clamped = Vec::new();
        if let Some(v) = update.overlay_opacity {
            self.overlay_opacity =
                clamp_recorded(v, MIN_OPACITY, MAX_OPACITY, "overlayOpacity", &mut clamped);
        }
        if let Some(hue) = update.hue {
            self.hue = hue.map(|h| {
                let wrapped = wrap_hue(h);
                if wrapped != h {
                    clamped.push("hue");
                }
                wrapped
            });
        }
        if let Some(mode) = update.fit_mode {
            self.fit_mode = mode;
        }
        if let Some(quality) = update.quality {
            self.quality = quality;
        }
        if let Some(v) = update.pose_confidence_threshold {
            self.pose_confidence_threshold =
                clamp_recorded(v, 0.0, 1.0, "poseConfidenceThreshold", &mut clamped);
        }
        if let Some(v) = update.segmentation_threshold {
            self.segmentation_threshold =
                clamp_recorded(v, 0.0, 1.0, "segmentationThreshold", &mut clamped);
        }
        Ok(clamped)
    }

    /// Defaults with `update` applied.
    pub fn from_update(update: &SettingsUpdate) -> Result<Self> {
        let mut settings = Self::default();
        settings.apply(update)?;
        Ok(settings)
    }
}

impl From<SettingsUpdate> for StyleSettings {
    /// Lenient conversion used when loading persisted settings: a stored
    /// non-finite value falls back to the defaults instead of failing.
    fn from(update: SettingsUpdate) -> Self {
        Self::from_update(&update).unwrap_or_else(|e| {
            tracing::warn!("ignoring stored style settings: {e}");
            Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update_opacity(v: f32) -> SettingsUpdate {
        SettingsUpdate {
            overlay_opacity: Some(v),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_are_in_range() {
        let s = StyleSettings::default();
        assert_eq!(s.overlay_opacity(), 0.8);
        assert_eq!(s.hue(), None);
        assert_eq!(s.fit_mode(), FitMode::Regular);
        assert_eq!(s.quality(), Quality::Medium);
        assert_eq!(s.pose_confidence_threshold(), 0.5);
        assert_eq!(s.segmentation_threshold(), 0.5);
    }

    #[test]
    fn opacity_above_range_clamps_to_one() {
        let mut s = StyleSettings::default();
        let clamped = s.apply(&update_opacity(1.5)).unwrap();
        assert_eq!(s.overlay_opacity(), 1.0);
        assert_eq!(clamped, vec!["overlayOpacity"]);
    }

    #[test]
    fn opacity_below_range_clamps_to_minimum() {
        let mut s = StyleSettings::default();
        s.apply(&update_opacity(-3.0)).unwrap();
        assert_eq!(s.overlay_opacity(), MIN_OPACITY);
    }

    #[test]
    fn opacity_stays_in_bounds_for_any_finite_input() {
        for v in [-1e9, -1.0, 0.0, 0.05, 0.1, 0.5, 1.0, 1.0001, 7.0, 1e9] {
            let mut s = StyleSettings::default();
            s.apply(&update_opacity(v)).unwrap();
            assert!((MIN_OPACITY..=MAX_OPACITY).contains(&s.overlay_opacity()), "{v}");
        }
    }

    #[test]
    fn hue_wraps_into_range() {
        assert_eq!(wrap_hue(400.0), 40.0);
        assert_eq!(wrap_hue(360.0), 0.0);
        assert_eq!(wrap_hue(-30.0), 330.0);
        assert_eq!(wrap_hue(0.0), 0.0);
        let tiny = wrap_hue(-1e-9);
        assert!((0.0..360.0).contains(&tiny));
    }

    #[test]
    fn hue_update_sets_and_clears() {
        let mut s = StyleSettings::default();
        s.apply(&SettingsUpdate {
            hue: Some(Some(400.0)),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(s.hue(), Some(40.0));

        s.apply(&SettingsUpdate {
            hue: Some(None),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(s.hue(), None);
    }

    #[test]
    fn thresholds_clamp_to_unit_interval() {
        let mut s = StyleSettings::default();
        s.apply(&SettingsUpdate {
            pose_confidence_threshold: Some(2.0),
            segmentation_threshold: Some(-0.5),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(s.pose_confidence_threshold(), 1.0);
        assert_eq!(s.segmentation_threshold(), 0.0);
    }

    #[test]
    fn non_finite_value_rejects_whole_update() {
        let mut s = StyleSettings::default();
        let result = s.apply(&SettingsUpdate {
            overlay_opacity: Some(0.3),
            segmentation_threshold: Some(f32::NAN),
            ..Default::default()
        });
        assert!(matches!(
            result,
            Err(SettingsError::Rejected {
                field: "segmentationThreshold",
                ..
            })
        ));
        assert_eq!(s, StyleSettings::default());
    }

    #[test]
    fn fit_multipliers_are_ordered() {
        assert!(FitMode::Loose.width_multiplier() >= FitMode::Regular.width_multiplier());
        assert!(FitMode::Regular.width_multiplier() >= FitMode::Tight.width_multiplier());
    }

    #[test]
    fn quality_presets() {
        assert_eq!(Quality::High.mask_block(), 1);
        assert_eq!(Quality::Low.jpeg_quality(), 60);
        assert_eq!(Quality::High.jpeg_quality(), 95);
    }

    #[test]
    fn update_from_json_ignores_unknown_keys() {
        let update =
            SettingsUpdate::from_json(r#"{"overlayOpacity":0.4,"sparkle":true,"fitMode":"tight"}"#)
                .unwrap();
        assert_eq!(update.overlay_opacity, Some(0.4));
        assert_eq!(update.fit_mode, Some(FitMode::Tight));
        assert_eq!(update.hue, None);
    }

    #[test]
    fn update_from_json_distinguishes_null_hue() {
        let update = SettingsUpdate::from_json(r#"{"hue":null}"#).unwrap();
        assert_eq!(update.hue, Some(None));
    }

    #[test]
    fn update_from_json_rejects_garbage() {
        assert!(matches!(
            SettingsUpdate::from_json("not json"),
            Err(SettingsError::Parse(_))
        ));
    }

    #[test]
    fn deserialising_settings_clamps() {
        let s: StyleSettings =
            serde_json::from_str(r#"{"overlayOpacity":1.5,"hue":400,"quality":"high"}"#).unwrap();
        assert_eq!(s.overlay_opacity(), 1.0);
        assert_eq!(s.hue(), Some(40.0));
        assert_eq!(s.quality(), Quality::High);
    }

    #[test]
    fn settings_serialise_camel_case() {
        let json = serde_json::to_value(StyleSettings::default()).unwrap();
        assert_eq!(json["fitMode"], "regular");
        assert_eq!(json["quality"], "medium");
        assert!(json["hue"].is_null());
        assert!(json["poseConfidenceThreshold"].is_number());
    }

    #[test]
    fn serialised_settings_load_back_equal() {
        let mut s = StyleSettings::default();
        s.apply(&SettingsUpdate {
            hue: Some(Some(200.0)),
            fit_mode: Some(FitMode::Loose),
            ..Default::default()
        })
        .unwrap();
        let json = serde_json::to_string(&s).unwrap();
        let restored: StyleSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(s, restored);
    }
}
