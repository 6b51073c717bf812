use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{OperationError, RtGeomError};
use crate::math::SLICE_TOL_MM;

/// Engine-wide parameters.
///
/// Every operation takes its tolerances from one of these so that a caller
/// can tune the engine in one place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Maximum z distance (mm) at which two contours share a slice.
    pub slice_tol_mm: f64,
    /// Points per loop used by the cross-slice interpolator.
    pub interpolation_point_count: u32,
    /// World-mm to fixed-precision scale used by the boolean clipper.
    pub boolean_scale: f64,
    /// Output loops smaller than this (mm^2) are discarded.
    pub min_loop_area_mm2: f64,
    /// Slice thickness assumed when a structure has a single slice.
    pub default_slice_thickness_mm: f64,
    /// Largest distance-field grid the margin engine will allocate.
    pub max_grid_cells: usize,
    /// Vertex count of the structuring polygon used by the buffer fallback.
    pub buffer_segments: u32,
    /// Deadline for a background job.
    #[serde(with = "duration_ms")]
    pub worker_timeout: Duration,
    /// Smoothing passes applied to traced mask outlines.
    pub trace_smoothing_passes: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            slice_tol_mm: SLICE_TOL_MM,
            interpolation_point_count: 128,
            boolean_scale: 1e4,
            min_loop_area_mm2: 0.01,
            default_slice_thickness_mm: 2.0,
            max_grid_cells: 16 * 1024 * 1024,
            buffer_segments: 32,
            worker_timeout: Duration::from_secs(30),
            trace_smoothing_passes: 2,
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn with_slice_tol(mut self, mm: f64) -> Self {
        self.slice_tol_mm = mm;
        self
    }

    #[must_use]
    pub fn with_interpolation_point_count(mut self, n: u32) -> Self {
        self.interpolation_point_count = n;
        self
    }

    #[must_use]
    pub fn with_min_loop_area(mut self, mm2: f64) -> Self {
        self.min_loop_area_mm2 = mm2;
        self
    }

    #[must_use]
    pub fn with_max_grid_cells(mut self, cells: usize) -> Self {
        self.max_grid_cells = cells;
        self
    }

    #[must_use]
    pub fn with_worker_timeout(mut self, timeout: Duration) -> Self {
        self.worker_timeout = timeout;
        self
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

fn unknown(kind: &str, value: &str) -> RtGeomError {
    OperationError::InvalidInput(format!("unknown {kind} '{value}'")).into()
}

/// How a margin request is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarginType {
    Uniform,
    Directional,
    Anisotropic,
}

impl fmt::Display for MarginType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Uniform => "UNIFORM",
            Self::Directional => "DIRECTIONAL",
            Self::Anisotropic => "ANISOTROPIC",
        })
    }
}

impl FromStr for MarginType {
    type Err = RtGeomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UNIFORM" => Ok(Self::Uniform),
            "DIRECTIONAL" => Ok(Self::Directional),
            "ANISOTROPIC" => Ok(Self::Anisotropic),
            _ => Err(unknown("margin type", s)),
        }
    }
}

/// Six signed margins (mm), one per patient direction.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PerSideMargins {
    pub ant: f64,
    pub post: f64,
    pub left: f64,
    pub right: f64,
    pub sup: f64,
    pub inf: f64,
}

impl PerSideMargins {
    #[must_use]
    pub fn uniform(mm: f64) -> Self {
        Self {
            ant: mm,
            post: mm,
            left: mm,
            right: mm,
            sup: mm,
            inf: mm,
        }
    }

    /// Margins in LPS axis order: `[+x, -x, +y, -y, +z, -z]`
    /// (left, right, posterior, anterior, superior, inferior).
    #[must_use]
    pub fn to_axes(&self) -> [f64; 6] {
        [self.left, self.right, self.post, self.ant, self.sup, self.inf]
    }
}

/// A margin request: uniform, per-direction, or per-axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "marginType", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarginParams {
    Uniform {
        #[serde(rename = "marginValue")]
        value: f64,
    },
    Directional {
        #[serde(rename = "perSideMargins")]
        margins: PerSideMargins,
    },
    Anisotropic { x: f64, y: f64, z: f64 },
}

impl MarginParams {
    #[must_use]
    pub fn margin_type(&self) -> MarginType {
        match self {
            Self::Uniform { .. } => MarginType::Uniform,
            Self::Directional { .. } => MarginType::Directional,
            Self::Anisotropic { .. } => MarginType::Anisotropic,
        }
    }

    /// Resolves the request to per-direction margins.
    #[must_use]
    pub fn per_side(&self) -> PerSideMargins {
        match *self {
            Self::Uniform { value } => PerSideMargins::uniform(value),
            Self::Directional { margins } => margins,
            Self::Anisotropic { x, y, z } => PerSideMargins {
                ant: y,
                post: y,
                left: x,
                right: x,
                sup: z,
                inf: z,
            },
        }
    }
}

/// Boolean operation selector, recognised by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BooleanOp {
    Union,
    Subtract,
    Intersect,
}

impl fmt::Display for BooleanOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Union => "UNION",
            Self::Subtract => "SUBTRACT",
            Self::Intersect => "INTERSECT",
        })
    }
}

impl FromStr for BooleanOp {
    type Err = RtGeomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UNION" => Ok(Self::Union),
            "SUBTRACT" => Ok(Self::Subtract),
            "INTERSECT" => Ok(Self::Intersect),
            _ => Err(unknown("boolean operation", s)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = EngineConfig::default();
        assert!((cfg.slice_tol_mm - 0.5).abs() < f64::EPSILON);
        assert_eq!(cfg.interpolation_point_count, 128);
        assert_eq!(cfg.worker_timeout, Duration::from_secs(30));
    }

    #[test]
    fn config_reads_camel_case_with_defaults() {
        let cfg: EngineConfig =
            serde_json::from_str(r#"{"sliceTolMm": 0.25, "workerTimeout": 1500}"#).unwrap();
        assert!((cfg.slice_tol_mm - 0.25).abs() < f64::EPSILON);
        assert_eq!(cfg.worker_timeout, Duration::from_millis(1500));
        assert_eq!(cfg.interpolation_point_count, 128);
    }

    #[test]
    fn names_parse_and_print() {
        assert_eq!("union".parse::<BooleanOp>().unwrap(), BooleanOp::Union);
        assert_eq!(BooleanOp::Intersect.to_string(), "INTERSECT");
        assert_eq!(
            "ANISOTROPIC".parse::<MarginType>().unwrap(),
            MarginType::Anisotropic
        );
        assert!("XOR".parse::<BooleanOp>().is_err());
        assert_eq!(
            serde_json::to_string(&BooleanOp::Subtract).unwrap(),
            "\"SUBTRACT\""
        );
    }

    #[test]
    fn margin_params_wire_shape() {
        let p: MarginParams =
            serde_json::from_str(r#"{"marginType": "UNIFORM", "marginValue": 5.0}"#).unwrap();
        assert_eq!(p, MarginParams::Uniform { value: 5.0 });
        assert_eq!(p.margin_type(), MarginType::Uniform);

        let p: MarginParams = serde_json::from_str(
            r#"{"marginType": "DIRECTIONAL",
                "perSideMargins": {"ant": 1, "post": 2, "left": 3, "right": 4, "sup": 5, "inf": 6}}"#,
        )
        .unwrap();
        assert_eq!(p.per_side().to_axes(), [3.0, 4.0, 2.0, 1.0, 5.0, 6.0]);
    }

    #[test]
    fn anisotropic_resolves_per_axis() {
        let m = MarginParams::Anisotropic { x: 1.0, y: 2.0, z: 3.0 }.per_side();
        assert_eq!(m.to_axes(), [1.0, 1.0, 2.0, 2.0, 3.0, 3.0]);
    }
}
