//! Camera commands: zoom, center, bearing, pitch, transitions, projection

use serde::Serialize;
use serde_json::Value as Json;

use super::script::{finite, json_blob, number, pair};
use super::{Command, MAP_HANDLE, ValueCommand};
use crate::error::CommandResult;
use crate::types::{LngLat, LngLatBounds, ScreenPoint};

/// Set the zoom level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetZoom {
    zoom: f64,
}

impl SetZoom {
    /// Build the command; the value must be finite
    pub fn new(zoom: f64) -> CommandResult<Self> {
        Ok(Self {
            zoom: finite("zoom", zoom)?,
        })
    }

    /// Target zoom level
    pub fn zoom(&self) -> f64 {
        self.zoom
    }
}

impl Command for SetZoom {
    fn script(&self) -> String {
        format!("{MAP_HANDLE}.setZoom({})", number(self.zoom))
    }
}

/// Read the zoom level
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GetZoom;

impl Command for GetZoom {
    fn script(&self) -> String {
        format!("{MAP_HANDLE}.getZoom()")
    }

    fn expects_value(&self) -> bool {
        true
    }
}

impl ValueCommand for GetZoom {
    type Output = f64;
}

/// Set the bearing in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetBearing {
    bearing: f64,
}

impl SetBearing {
    /// Build the command; the value must be finite
    pub fn new(bearing: f64) -> CommandResult<Self> {
        Ok(Self {
            bearing: finite("bearing", bearing)?,
        })
    }

    /// Bearing, clockwise from north
    pub fn bearing(&self) -> f64 {
        self.bearing
    }
}

impl Command for SetBearing {
    fn script(&self) -> String {
        format!("{MAP_HANDLE}.setBearing({})", number(self.bearing))
    }
}

/// Read the bearing
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GetBearing;

impl Command for GetBearing {
    fn script(&self) -> String {
        format!("{MAP_HANDLE}.getBearing()")
    }

    fn expects_value(&self) -> bool {
        true
    }
}

impl ValueCommand for GetBearing {
    type Output = f64;
}

/// Set the pitch in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetPitch {
    pitch: f64,
}

impl SetPitch {
    /// Build the command; the value must be finite
    pub fn new(pitch: f64) -> CommandResult<Self> {
        Ok(Self {
            pitch: finite("pitch", pitch)?,
        })
    }

    /// Pitch away from straight down
    pub fn pitch(&self) -> f64 {
        self.pitch
    }
}

impl Command for SetPitch {
    fn script(&self) -> String {
        format!("{MAP_HANDLE}.setPitch({})", number(self.pitch))
    }
}

/// Read the pitch
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GetPitch;

impl Command for GetPitch {
    fn script(&self) -> String {
        format!("{MAP_HANDLE}.getPitch()")
    }

    fn expects_value(&self) -> bool {
        true
    }
}

impl ValueCommand for GetPitch {
    type Output = f64;
}

/// Move the map center
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetCenter {
    center: LngLat,
}

impl SetCenter {
    /// Build the command; both components must be finite
    pub fn new(center: LngLat) -> CommandResult<Self> {
        finite("center.lng", center.lng)?;
        finite("center.lat", center.lat)?;
        Ok(Self { center })
    }

    /// Target center
    pub fn center(&self) -> LngLat {
        self.center
    }
}

impl Command for SetCenter {
    fn script(&self) -> String {
        format!(
            "{MAP_HANDLE}.setCenter({})",
            pair(self.center.lng, self.center.lat)
        )
    }
}

/// Read the map center
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GetCenter;

impl Command for GetCenter {
    fn script(&self) -> String {
        format!(
            "(function () {{ var c = {MAP_HANDLE}.getCenter(); return {{ lng: c.lng, lat: c.lat }}; }})()"
        )
    }

    fn expects_value(&self) -> bool {
        true
    }
}

impl ValueCommand for GetCenter {
    type Output = LngLat;
}

/// Camera target shared by [`FlyTo`] and [`JumpTo`]
///
/// Unset fields keep their current value on the host.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CameraOptions {
    /// Target center
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "serialize_center")]
    pub center: Option<LngLat>,
    /// Target zoom
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoom: Option<f64>,
    /// Target bearing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bearing: Option<f64>,
    /// Target pitch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f64>,
}

fn serialize_center<S: serde::Serializer>(
    center: &Option<LngLat>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    center.map(|c| [c.lng, c.lat]).serialize(serializer)
}

impl CameraOptions {
    fn validate(&self) -> CommandResult<()> {
        if let Some(center) = self.center {
            finite("center.lng", center.lng)?;
            finite("center.lat", center.lat)?;
        }
        for (field, value) in [
            ("zoom", self.zoom),
            ("bearing", self.bearing),
            ("pitch", self.pitch),
        ] {
            if let Some(value) = value {
                finite(field, value)?;
            }
        }
        Ok(())
    }

    fn to_json(self) -> serde_json::Map<String, Json> {
        match serde_json::to_value(self) {
            Ok(Json::Object(map)) => map,
            _ => serde_json::Map::new(),
        }
    }
}

/// Animated flight to a camera target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlyTo {
    camera: CameraOptions,
    duration_ms: Option<f64>,
}

impl FlyTo {
    /// Build the command; every set field must be finite
    pub fn new(camera: CameraOptions) -> CommandResult<Self> {
        camera.validate()?;
        Ok(Self {
            camera,
            duration_ms: None,
        })
    }

    /// Fix the animation duration in milliseconds
    pub fn with_duration(mut self, duration_ms: f64) -> CommandResult<Self> {
        self.duration_ms = Some(finite("duration", duration_ms)?);
        Ok(self)
    }
}

impl Command for FlyTo {
    fn script(&self) -> String {
        let mut options = self.camera.to_json();
        if let Some(duration) = self.duration_ms {
            options.insert("duration".to_string(), Json::from(duration));
        }
        format!("{MAP_HANDLE}.flyTo({})", json_blob(&Json::Object(options)))
    }
}

/// Immediate jump to a camera target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JumpTo {
    camera: CameraOptions,
}

impl JumpTo {
    /// Build the command; every set field must be finite
    pub fn new(camera: CameraOptions) -> CommandResult<Self> {
        camera.validate()?;
        Ok(Self { camera })
    }
}

impl Command for JumpTo {
    fn script(&self) -> String {
        format!(
            "{MAP_HANDLE}.jumpTo({})",
            json_blob(&Json::Object(self.camera.to_json()))
        )
    }
}

/// Re-measure the container after a size change
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Resize;

impl Command for Resize {
    fn script(&self) -> String {
        format!("{MAP_HANDLE}.resize()")
    }
}

/// Read the visible bounds
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GetBounds;

impl Command for GetBounds {
    fn script(&self) -> String {
        format!(
            "(function () {{ var b = {MAP_HANDLE}.getBounds(); \
             return {{ west: b.getWest(), south: b.getSouth(), east: b.getEast(), north: b.getNorth() }}; }})()"
        )
    }

    fn expects_value(&self) -> bool {
        true
    }
}

impl ValueCommand for GetBounds {
    type Output = LngLatBounds;
}

/// Project a coordinate to a screen point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Project {
    lng_lat: LngLat,
}

impl Project {
    /// Build the command; both components must be finite
    pub fn new(lng_lat: LngLat) -> CommandResult<Self> {
        finite("lng_lat.lng", lng_lat.lng)?;
        finite("lng_lat.lat", lng_lat.lat)?;
        Ok(Self { lng_lat })
    }

    /// Coordinate to project
    pub fn lng_lat(&self) -> LngLat {
        self.lng_lat
    }
}

impl Command for Project {
    fn script(&self) -> String {
        format!(
            "(function () {{ var p = {MAP_HANDLE}.project({}); return {{ x: p.x, y: p.y }}; }})()",
            pair(self.lng_lat.lng, self.lng_lat.lat)
        )
    }

    fn expects_value(&self) -> bool {
        true
    }
}

impl ValueCommand for Project {
    type Output = ScreenPoint;
}

/// Unproject a screen point to a coordinate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Unproject {
    point: ScreenPoint,
}

impl Unproject {
    /// Build the command; both components must be finite
    pub fn new(point: ScreenPoint) -> CommandResult<Self> {
        finite("point.x", point.x)?;
        finite("point.y", point.y)?;
        Ok(Self { point })
    }

    /// Screen point to unproject
    pub fn point(&self) -> ScreenPoint {
        self.point
    }
}

impl Command for Unproject {
    fn script(&self) -> String {
        format!(
            "(function () {{ var c = {MAP_HANDLE}.unproject({}); return {{ lng: c.lng, lat: c.lat }}; }})()",
            pair(self.point.x, self.point.y)
        )
    }

    fn expects_value(&self) -> bool {
        true
    }
}

impl ValueCommand for Unproject {
    type Output = LngLat;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CommandError;

    #[test]
    fn test_set_zoom_renders_literal() {
        let cmd = SetZoom::new(5.0).unwrap();
        assert_eq!(cmd.script(), "map.setZoom(5)");
        assert!(!cmd.expects_value());
        assert_eq!(cmd.zoom(), 5.0);
    }

    #[test]
    fn test_getters_expect_values() {
        assert!(GetZoom.expects_value());
        assert!(GetCenter.expects_value());
        assert!(GetBounds.expects_value());
        assert_eq!(GetPitch.script(), "map.getPitch()");
    }

    #[test]
    fn test_set_center_rejects_nan() {
        let err = SetCenter::new(LngLat::new(f64::NAN, 0.0)).unwrap_err();
        assert!(matches!(err, CommandError::NonFinite { field: "center.lng", .. }));

        let cmd = SetCenter::new(LngLat::new(-122.4, 37.8)).unwrap();
        assert_eq!(cmd.script(), "map.setCenter([-122.4, 37.8])");
    }

    #[test]
    fn test_fly_to_renders_only_set_fields() {
        let cmd = FlyTo::new(CameraOptions {
            center: Some(LngLat::new(2.35, 48.85)),
            zoom: Some(12.0),
            ..Default::default()
        })
        .unwrap()
        .with_duration(1500.0)
        .unwrap();

        assert_eq!(
            cmd.script(),
            r#"map.flyTo({"center":[2.35,48.85],"duration":1500.0,"zoom":12.0})"#
        );
    }

    #[test]
    fn test_jump_to_validates() {
        assert!(
            JumpTo::new(CameraOptions {
                pitch: Some(f64::INFINITY),
                ..Default::default()
            })
            .is_err()
        );
        let cmd = JumpTo::new(CameraOptions {
            bearing: Some(90.0),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(cmd.script(), r#"map.jumpTo({"bearing":90.0})"#);
    }

    #[test]
    fn test_project_renders_pair() {
        let cmd = Project::new(LngLat::new(1.5, -2.0)).unwrap();
        assert!(cmd.script().contains("map.project([1.5, -2])"));
    }

    #[test]
    fn test_scalar_setters_reject_non_finite() {
        assert!(matches!(
            SetZoom::new(f64::NAN),
            Err(CommandError::NonFinite { field: "zoom", .. })
        ));
        assert!(matches!(
            SetBearing::new(f64::INFINITY),
            Err(CommandError::NonFinite { field: "bearing", .. })
        ));
        assert!(matches!(
            SetPitch::new(f64::NEG_INFINITY),
            Err(CommandError::NonFinite { field: "pitch", .. })
        ));
        assert_eq!(SetBearing::new(-45.5).unwrap().script(), "map.setBearing(-45.5)");
        assert_eq!(SetPitch::new(60.0).unwrap().script(), "map.setPitch(60)");
    }

    #[test]
    fn test_projection_rejects_non_finite() {
        assert!(Project::new(LngLat::new(0.0, f64::NAN)).is_err());
        assert!(matches!(
            Unproject::new(ScreenPoint::new(f64::INFINITY, 0.0)),
            Err(CommandError::NonFinite { field: "point.x", .. })
        ));
        let cmd = Unproject::new(ScreenPoint::new(100.0, 50.0)).unwrap();
        assert!(cmd.script().contains("map.unproject([100, 50])"));
    }
}
