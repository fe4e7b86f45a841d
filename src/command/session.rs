//! Session commands: map creation, event forwarding, raw evaluation

use serde_json::{Value as Json, json};

use super::script::{Identifier, finite, json_blob, string_literal};
use super::{Command, MAP_HANDLE, ValueCommand};
use crate::bridge::value::DecodedValue;
use crate::error::CommandResult;
use crate::events::EventKind;
use crate::types::LngLat;

/// Create the host-side map and bind it to [`MAP_HANDLE`]
#[derive(Debug, Clone, PartialEq)]
pub struct InitializeMap {
    container: String,
    style_url: String,
    access_token: Option<String>,
    center: LngLat,
    zoom: f64,
}

impl InitializeMap {
    /// Build the command for a container element id and style URL
    pub fn new(
        container: impl Into<String>,
        style_url: impl Into<String>,
        center: LngLat,
        zoom: f64,
    ) -> CommandResult<Self> {
        finite("center.lng", center.lng)?;
        finite("center.lat", center.lat)?;
        finite("zoom", zoom)?;
        Ok(Self {
            container: container.into(),
            style_url: style_url.into(),
            access_token: None,
            center,
            zoom,
        })
    }

    /// Set the engine access token before the map is created
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }
}

impl Command for InitializeMap {
    fn script(&self) -> String {
        let options = json!({
            "container": self.container,
            "style": self.style_url,
            "center": [self.center.lng, self.center.lat],
            "zoom": self.zoom,
        });

        let token = match &self.access_token {
            Some(token) => format!("mapboxgl.accessToken = {}; ", string_literal(token)),
            None => String::new(),
        };

        format!(
            "(function () {{ {token}window.{MAP_HANDLE} = new mapboxgl.Map({}); return true; }})()",
            json_blob(&options)
        )
    }

    fn expects_value(&self) -> bool {
        true
    }
}

impl ValueCommand for InitializeMap {
    type Output = bool;
}

/// Install listeners that forward map events to the host message handler
///
/// Messages are `{name, payload}` objects. Hosts with a named script message
/// handler receive the object; hosts with a plain `window.ipc` channel receive
/// it as JSON text.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscribeEvents {
    events: Vec<EventKind>,
    handler: Identifier,
}

const PAYLOAD_EXTRACTOR: &str = "function (e) { \
var out = {}; \
if (!e) { return out; } \
if (e.point) { out.point = { x: e.point.x, y: e.point.y }; } \
if (e.lngLat) { out.lngLat = { lng: e.lngLat.lng, lat: e.lngLat.lat }; } \
if (e.sourceId) { out.sourceId = e.sourceId; out.isSourceLoaded = !!e.isSourceLoaded; \
if (e.sourceDataType) { out.sourceDataType = e.sourceDataType; } } \
if (e.type === 'styleimagemissing' && e.id) { out.id = e.id; } \
if (e.error) { out.message = String(e.error.message || e.error); } \
return out; }";

impl SubscribeEvents {
    /// Forward every event the host can report
    pub fn all(handler: Identifier) -> Self {
        Self::new(EventKind::HOST_EVENTS.to_vec(), handler)
    }

    /// Forward the listed events; synthesized kinds are skipped
    pub fn new(events: Vec<EventKind>, handler: Identifier) -> Self {
        let mut unique: Vec<EventKind> = Vec::with_capacity(events.len());
        for kind in events {
            // One listener per name; a repeated name would double every delivery.
            if !kind.is_synthesized() && !unique.contains(&kind) {
                unique.push(kind);
            }
        }
        Self {
            events: unique,
            handler,
        }
    }

    /// Events that will be forwarded
    pub fn events(&self) -> &[EventKind] {
        &self.events
    }
}

impl Command for SubscribeEvents {
    fn script(&self) -> String {
        let names = Json::from(
            self.events
                .iter()
                .map(|kind| kind.name())
                .collect::<Vec<_>>(),
        );
        let handler = &self.handler;

        format!(
            "(function () {{ \
var handlers = window.webkit && window.webkit.messageHandlers; \
var post = function (msg) {{ \
if (handlers && handlers.{handler}) {{ handlers.{handler}.postMessage(msg); }} \
else if (window.ipc) {{ window.ipc.postMessage(JSON.stringify(msg)); }} }}; \
var payload = {PAYLOAD_EXTRACTOR}; \
{}.forEach(function (name) {{ \
{MAP_HANDLE}.on(name, function (e) {{ post({{ name: name, payload: payload(e) }}); }}); }}); \
return true; }})()",
            json_blob(&names)
        )
    }

    fn expects_value(&self) -> bool {
        true
    }
}

impl ValueCommand for SubscribeEvents {
    type Output = bool;
}

/// Evaluate caller-supplied script text verbatim
///
/// The text is not escaped; callers own its correctness.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluateScript(pub String);

impl Command for EvaluateScript {
    fn script(&self) -> String {
        self.0.clone()
    }

    fn expects_value(&self) -> bool {
        true
    }
}

impl ValueCommand for EvaluateScript {
    type Output = DecodedValue;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_map_binds_handle() {
        let cmd = InitializeMap::new(
            "map-container",
            "mapbox://styles/mapbox/streets-v12",
            LngLat::new(-74.0, 40.7),
            9.0,
        )
        .unwrap()
        .with_access_token("pk.\"token\"");

        let script = cmd.script();
        assert!(script.contains(r#"mapboxgl.accessToken = "pk.\"token\"";"#));
        assert!(script.contains("window.map = new mapboxgl.Map("));
        assert!(script.contains(r#""container":"map-container""#));
        assert!(script.contains(r#""center":[-74.0,40.7]"#));
        assert!(script.ends_with("return true; })()"));
    }

    #[test]
    fn test_initialize_map_rejects_bad_zoom() {
        assert!(InitializeMap::new("c", "s", LngLat::new(0.0, 0.0), f64::NAN).is_err());
    }

    #[test]
    fn test_subscribe_skips_double_tap() {
        let handler = Identifier::new("mapbridge").unwrap();
        let cmd = SubscribeEvents::new(
            vec![EventKind::TouchEnd, EventKind::DoubleTap, EventKind::Idle],
            handler,
        );
        assert_eq!(cmd.events(), &[EventKind::TouchEnd, EventKind::Idle]);

        let script = cmd.script();
        assert!(script.contains(r#"["touchend","idle"].forEach"#));
        assert!(script.contains("handlers.mapbridge.postMessage(msg)"));
        assert!(!script.contains("doubletap"));
    }

    #[test]
    fn test_subscribe_registers_each_name_once() {
        let handler = Identifier::new("mapbridge").unwrap();
        let cmd = SubscribeEvents::new(
            vec![
                EventKind::TouchEnd,
                EventKind::Idle,
                EventKind::TouchEnd,
                EventKind::Idle,
                EventKind::Click,
            ],
            handler,
        );
        assert_eq!(
            cmd.events(),
            &[EventKind::TouchEnd, EventKind::Idle, EventKind::Click]
        );

        let script = cmd.script();
        assert_eq!(script.matches("\"touchend\"").count(), 1);
        assert!(script.contains(r#"["touchend","idle","click"].forEach"#));
    }

    #[test]
    fn test_subscribe_all_covers_host_events() {
        let cmd = SubscribeEvents::all(Identifier::new("h").unwrap());
        assert_eq!(cmd.events().len(), EventKind::HOST_EVENTS.len());
        assert!(cmd.script().contains("\"styleimagemissing\""));
    }

    #[test]
    fn test_evaluate_script_is_verbatim() {
        let cmd = EvaluateScript("1 + 1".to_string());
        assert_eq!(cmd.script(), "1 + 1");
        assert!(cmd.expects_value());
    }
}
