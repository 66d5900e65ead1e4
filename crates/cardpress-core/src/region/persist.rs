//! Deserialization boundary for persisted region data.
//!
//! Two wire shapes exist: the current one, an array of `{index, points}`
//! objects, and a legacy one, a bare array of four `{x, y}` points from the
//! era before multiple regions. Both are modeled as one untagged union and
//! migrated through an explicit pure function instead of shape-sniffing at
//! call sites.
//!
//! Malformed data never surfaces as an error to the operator: the loading
//! path falls back to a default single-region set.

use super::{Region, RegionSet, MAX_REGIONS};
use crate::geometry::Point;
use serde::Deserialize;
use thiserror::Error;

/// Validation failures for persisted region data.
///
/// These are internal: callers that load editor state use
/// [`deserialize_or_default`] and never see them. They exist separately so
/// tests and logging can name the exact defect.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegionDataError {
    #[error("Region list is empty")]
    Empty,
    #[error("Too many regions: {0} (maximum {MAX_REGIONS})")]
    TooMany(usize),
    #[error("Region {index} has {got} points, expected 4")]
    WrongPointCount { index: i64, got: usize },
    #[error("Region {index} has a non-finite coordinate")]
    NonFinite { index: i64 },
    #[error("Duplicate region index: {0}")]
    DuplicateIndex(i64),
    #[error("Region index out of range: {0}")]
    IndexOutOfRange(i64),
}

/// A point as persisted.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RawPoint {
    pub x: f32,
    pub y: f32,
}

/// A region as persisted.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRegion {
    pub index: i64,
    pub points: Vec<RawPoint>,
}

/// Either wire shape. serde picks the variant by structure: region objects
/// carry an `index` field, legacy points do not.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawRegionData {
    Multi(Vec<RawRegion>),
    Legacy(Vec<RawPoint>),
}

/// Migrate raw persisted data into a validated [`RegionSet`].
///
/// The legacy single-quadrilateral shape becomes a one-region set. Modern
/// data is index-sorted, then renumbered to the contiguous 0..n-1 range the
/// editor maintains. The first region is active.
pub fn migrate(raw: RawRegionData) -> Result<RegionSet, RegionDataError> {
    let raw_regions = match raw {
        RawRegionData::Legacy(points) => vec![RawRegion { index: 0, points }],
        RawRegionData::Multi(regions) => regions,
    };
    validate(&raw_regions)?;

    let mut regions: Vec<(i64, [Point; 4])> = raw_regions
        .into_iter()
        .map(|r| {
            let points = [
                Point::new(r.points[0].x, r.points[0].y),
                Point::new(r.points[1].x, r.points[1].y),
                Point::new(r.points[2].x, r.points[2].y),
                Point::new(r.points[3].x, r.points[3].y),
            ];
            (r.index, points)
        })
        .collect();
    regions.sort_by_key(|(index, _)| *index);

    Ok(RegionSet::from_regions(
        regions
            .into_iter()
            .enumerate()
            .map(|(i, (_, points))| Region {
                index: i as u8,
                points,
            })
            .collect(),
    ))
}

/// Check raw region data without building anything.
pub fn validate(regions: &[RawRegion]) -> Result<(), RegionDataError> {
    if regions.is_empty() {
        return Err(RegionDataError::Empty);
    }
    if regions.len() > MAX_REGIONS {
        return Err(RegionDataError::TooMany(regions.len()));
    }
    let mut seen = [false; MAX_REGIONS];
    for region in regions {
        if region.points.len() != 4 {
            return Err(RegionDataError::WrongPointCount {
                index: region.index,
                got: region.points.len(),
            });
        }
        if region.points.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(RegionDataError::NonFinite {
                index: region.index,
            });
        }
        let idx = region.index;
        if idx < 0 || idx >= MAX_REGIONS as i64 {
            return Err(RegionDataError::IndexOutOfRange(idx));
        }
        if seen[idx as usize] {
            return Err(RegionDataError::DuplicateIndex(idx));
        }
        seen[idx as usize] = true;
    }
    Ok(())
}

/// Load persisted region data, falling back to a default single-region set
/// on any validation failure.
pub fn deserialize_or_default(raw: RawRegionData) -> RegionSet {
    migrate(raw).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> RawRegionData {
        serde_json::from_str(json).expect("test JSON should parse")
    }

    #[test]
    fn test_modern_shape_parses_and_sorts() {
        let raw = parse(
            r#"[
                {"index": 1, "points": [{"x":10,"y":10},{"x":20,"y":10},{"x":20,"y":20},{"x":10,"y":20}]},
                {"index": 0, "points": [{"x":0,"y":0},{"x":5,"y":0},{"x":5,"y":5},{"x":0,"y":5}]}
            ]"#,
        );
        let set = migrate(raw).unwrap();
        assert_eq!(set.len(), 2);
        // Sorted by index: the index-0 region comes first
        assert_eq!(set.regions()[0].points[0], Point::new(0.0, 0.0));
        assert_eq!(set.regions()[1].points[0], Point::new(10.0, 10.0));
        assert_eq!(set.active_index(), 0);
    }

    #[test]
    fn test_legacy_shape_migrates_to_single_region() {
        let raw = parse(r#"[{"x":1,"y":2},{"x":3,"y":2},{"x":3,"y":4},{"x":1,"y":4}]"#);
        let set = migrate(raw).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.regions()[0].index, 0);
        assert_eq!(set.regions()[0].points[0], Point::new(1.0, 2.0));
    }

    #[test]
    fn test_gapped_indices_renumbered() {
        let raw = parse(
            r#"[
                {"index": 5, "points": [{"x":0,"y":0},{"x":1,"y":0},{"x":1,"y":1},{"x":0,"y":1}]},
                {"index": 2, "points": [{"x":9,"y":9},{"x":10,"y":9},{"x":10,"y":10},{"x":9,"y":10}]}
            ]"#,
        );
        let set = migrate(raw).unwrap();
        let indices: Vec<u8> = set.regions().iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1]);
        // Former index 2 sorts first
        assert_eq!(set.regions()[0].points[0], Point::new(9.0, 9.0));
    }

    #[test]
    fn test_wrong_point_count_rejected() {
        let raw = parse(r#"[{"index": 0, "points": [{"x":0,"y":0},{"x":1,"y":1}]}]"#);
        assert_eq!(
            migrate(raw),
            Err(RegionDataError::WrongPointCount { index: 0, got: 2 })
        );
    }

    #[test]
    fn test_duplicate_index_rejected() {
        let raw = parse(
            r#"[
                {"index": 0, "points": [{"x":0,"y":0},{"x":1,"y":0},{"x":1,"y":1},{"x":0,"y":1}]},
                {"index": 0, "points": [{"x":2,"y":2},{"x":3,"y":2},{"x":3,"y":3},{"x":2,"y":3}]}
            ]"#,
        );
        assert_eq!(migrate(raw), Err(RegionDataError::DuplicateIndex(0)));
    }

    #[test]
    fn test_out_of_range_index_rejected() {
        let raw = parse(
            r#"[{"index": 99, "points": [{"x":0,"y":0},{"x":1,"y":0},{"x":1,"y":1},{"x":0,"y":1}]}]"#,
        );
        assert_eq!(migrate(raw), Err(RegionDataError::IndexOutOfRange(99)));
    }

    #[test]
    fn test_empty_list_rejected() {
        assert_eq!(migrate(RawRegionData::Multi(vec![])), Err(RegionDataError::Empty));
    }

    #[test]
    fn test_non_finite_coordinate_rejected() {
        let raw = RawRegionData::Multi(vec![RawRegion {
            index: 0,
            points: vec![
                RawPoint { x: f32::NAN, y: 0.0 },
                RawPoint { x: 1.0, y: 0.0 },
                RawPoint { x: 1.0, y: 1.0 },
                RawPoint { x: 0.0, y: 1.0 },
            ],
        }]);
        assert_eq!(migrate(raw), Err(RegionDataError::NonFinite { index: 0 }));
    }

    #[test]
    fn test_deserialize_or_default_falls_back() {
        let bad = RawRegionData::Multi(vec![]);
        let set = deserialize_or_default(bad);
        assert_eq!(set, RegionSet::new());

        let good = parse(r#"[{"x":1,"y":1},{"x":2,"y":1},{"x":2,"y":2},{"x":1,"y":2}]"#);
        let set = deserialize_or_default(good);
        assert_eq!(set.len(), 1);
        assert_eq!(set.regions()[0].points[0], Point::new(1.0, 1.0));
    }

    #[test]
    fn test_non_array_json_fails_to_parse() {
        let result: Result<RawRegionData, _> = serde_json::from_str(r#"{"oops": true}"#);
        assert!(result.is_err());
    }
}
