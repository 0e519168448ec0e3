use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use coast_common::{RoiSettings, Settings};
use geo_types::{Geometry, Rect};
use tracing::{info, warn};

use crate::{
    collection::rings_bounding_rect,
    crs::most_accurate_epsg,
    error::{Result, ShorelineError},
    extracted::ExtractedShoreline,
    pipeline::ExtractionPipeline,
    reference::{ReferenceShoreline, clip_to_bbox},
};

/// Extraction results keyed by ROI id.
///
/// `None` marks an ROI that was processed but produced no shorelines.
#[derive(Debug, Clone, Default)]
pub struct RoiShorelines {
    entries: BTreeMap<String, Option<ExtractedShoreline>>,
}

impl RoiShorelines {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, roi_id: &str, extracted: Option<ExtractedShoreline>) {
        self.entries.insert(roi_id.to_string(), extracted);
    }

    pub fn get(&self, roi_id: &str) -> Option<&ExtractedShoreline> {
        self.entries.get(roi_id).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, roi_id: &str) -> Option<&mut ExtractedShoreline> {
        self.entries.get_mut(roi_id).and_then(Option::as_mut)
    }

    pub fn contains(&self, roi_id: &str) -> bool {
        self.entries.contains_key(roi_id)
    }

    /// Ids of the ROIs holding shorelines, sorted
    pub fn ids_with_extracted_shorelines(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, extracted)| extracted.is_some())
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Forget the given ROIs
    pub fn remove_selected(&mut self, roi_ids: &[String]) {
        for id in roi_ids {
            self.entries.remove(id);
        }
    }

    pub fn remove_all(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ExtractedShoreline)> {
        self.entries
            .iter()
            .filter_map(|(id, extracted)| extracted.as_ref().map(|e| (id, e)))
    }

    /// Extract shorelines for every id in `roi_ids`.
    ///
    /// A geographic `output_epsg` is first replaced by the UTM zone of the
    /// selected ROIs. Each ROI gets the part of `reference` inside its
    /// bounding box. Failures are logged and stored as `None`; they never
    /// stop the loop. Returns the ids that produced shorelines.
    pub fn extract_all(
        &mut self,
        roi_ids: &[String],
        reference: &ReferenceShoreline,
        rois: &[RoiSettings],
        settings: &Settings,
        pipeline: &ExtractionPipeline,
    ) -> Vec<String> {
        let selected: Vec<&RoiSettings> = roi_ids
            .iter()
            .filter_map(|id| rois.iter().find(|roi| &roi.roi_id == id))
            .collect();

        let mut settings = settings.clone();
        if let Some(area) = combined_bounds(&selected) {
            let epsg = most_accurate_epsg(settings.output_epsg, &Geometry::Rect(area));
            if epsg != settings.output_epsg {
                info!("Using EPSG:{} instead of EPSG:{}", epsg, settings.output_epsg);
                settings.output_epsg = epsg;
            }
        }

        let mut extracted_ids = Vec::new();
        for roi_id in roi_ids {
            match self.extract_one(roi_id, reference, rois, &settings, pipeline) {
                Ok(extracted) => {
                    self.add(roi_id, Some(extracted));
                    extracted_ids.push(roi_id.clone());
                }
                Err(e) => {
                    warn!(roi_id = %roi_id, "Skipping ROI: {}", e);
                    self.add(roi_id, None);
                }
            }
        }
        info!(
            "Extracted shorelines for {} of {} ROI(s)",
            extracted_ids.len(),
            roi_ids.len()
        );
        extracted_ids
    }

    fn extract_one(
        &self,
        roi_id: &str,
        reference: &ReferenceShoreline,
        rois: &[RoiSettings],
        settings: &Settings,
        pipeline: &ExtractionPipeline,
    ) -> Result<ExtractedShoreline> {
        let roi = rois
            .iter()
            .find(|roi| roi.roi_id == roi_id)
            .ok_or_else(|| ShorelineError::RoiNotFound(roi_id.to_string()))?;

        let shoreline = match rings_bounding_rect(&roi.polygon) {
            Some(bbox) if reference.crs.is_geographic() => clip_to_bbox(reference, &bbox)?,
            _ => reference.clone(),
        };
        ExtractedShoreline::new(roi_id, &shoreline, roi, settings, pipeline)
    }

    /// Save each ROI's session to `<session_dir>/<sitename>`
    pub fn save_all(&self, session_dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let mut saved = Vec::new();
        for (roi_id, extracted) in self.iter() {
            let dir = session_dir.as_ref().join(extracted.sitename());
            extracted.save_session(&dir)?;
            info!(roi_id = %roi_id, "Session saved to {}", dir.display());
            saved.push(dir);
        }
        Ok(saved)
    }
}

fn combined_bounds(rois: &[&RoiSettings]) -> Option<Rect<f64>> {
    let rings: Vec<Vec<[f64; 2]>> = rois.iter().flat_map(|roi| roi.polygon.iter().cloned()).collect();
    rings_bounding_rect(&rings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::builder::ExtractionPipelineBuilder;
    use crate::test_support::{StaticDetector, record, reference_geojson, roi_settings};

    fn reference() -> ReferenceShoreline {
        ReferenceShoreline::from_geojson_str(&reference_geojson()).unwrap()
    }

    fn pipeline() -> (std::sync::Arc<StaticDetector>, ExtractionPipeline) {
        let detector = std::sync::Arc::new(StaticDetector::from_records(&[
            record("2019-01-05 18:30:00", "L8", 4, 4.0),
            record("2019-01-21 18:30:00", "L8", 4, 5.0),
        ]));
        (detector.clone(), ExtractionPipelineBuilder::build_default(detector))
    }

    fn rois() -> Vec<RoiSettings> {
        let mut far = roi_settings("2");
        // No reference shoreline out here
        far.polygon = vec![vec![[10.0, 10.0], [10.1, 10.0], [10.1, 10.1], [10.0, 10.0]]];
        vec![roi_settings("1"), far]
    }

    #[test]
    fn test_extract_all_skips_failures() {
        let (detector, pipeline) = pipeline();
        let mut registry = RoiShorelines::new();
        let ids = vec!["1".to_string(), "2".to_string(), "missing".to_string()];

        let extracted = registry.extract_all(&ids, &reference(), &rois(), &Settings::new(32611), &pipeline);

        assert_eq!(extracted, vec!["1".to_string()]);
        assert_eq!(registry.len(), 3);
        assert!(registry.contains("missing"));
        assert!(registry.get("2").is_none());
        assert_eq!(registry.ids_with_extracted_shorelines(), vec!["1".to_string()]);
        assert_eq!(registry.get("1").map(|e| e.records().len()), Some(2));
        assert_eq!(detector.last_settings().unwrap().inputs.roi_id, "1");
    }

    #[test]
    fn test_most_accurate_epsg_for_selected_rois() {
        let (detector, pipeline) = pipeline();
        let mut registry = RoiShorelines::new();
        registry.extract_all(&["1".to_string()], &reference(), &rois(), &Settings::new(4326), &pipeline);
        assert_eq!(detector.last_settings().unwrap().output_epsg(), 32611);
    }

    #[test]
    fn test_reference_crossing_roi_is_cut_at_roi_edges() {
        let (detector, pipeline) = pipeline();
        // Both ends of the line lie outside ROI 1
        let crossing = ReferenceShoreline::from_geojson_str(
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "properties": {}, "geometry": {"type": "LineString",
                    "coordinates": [[-117.6, 33.12], [-117.3, 33.18]]}}]}"#,
        )
        .unwrap();
        let mut registry = RoiShorelines::new();

        let extracted = registry.extract_all(&["1".to_string()], &crossing, &rois(), &Settings::new(32611), &pipeline);

        assert_eq!(extracted, vec!["1".to_string()]);
        assert_eq!(detector.last_settings().unwrap().reference_shoreline.len(), 2);
    }

    #[test]
    fn test_remove_entries() {
        let (_, pipeline) = pipeline();
        let mut registry = RoiShorelines::new();
        registry.extract_all(&["1".to_string(), "2".to_string()], &reference(), &rois(), &Settings::new(32611), &pipeline);

        registry.remove_selected(&["2".to_string()]);
        assert_eq!(registry.len(), 1);
        registry.get_mut("1").unwrap().remove_items(&["L8_2019-01-05 18:30:00".to_string()]).unwrap();
        assert_eq!(registry.get("1").unwrap().records().len(), 1);

        registry.remove_all();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_save_all() {
        let (_, pipeline) = pipeline();
        let mut registry = RoiShorelines::new();
        registry.extract_all(&["1".to_string(), "2".to_string()], &reference(), &rois(), &Settings::new(32611), &pipeline);

        let tmp = tempfile::tempdir().unwrap();
        let session = tmp.path().join("session");
        let saved = registry.save_all(&session).unwrap();

        assert_eq!(saved, vec![session.join("ID_1_datetime06-05-23__04_16_45")]);
        let loaded = ExtractedShoreline::load_from_directory(&saved[0]).unwrap();
        assert_eq!(loaded.roi_id(), "1");
    }
}
