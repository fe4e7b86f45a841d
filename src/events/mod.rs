//! Host event pipeline
//!
//! The script host pushes `{name, payload}` messages out of band. This module
//! classifies them into the closed [`EventKind`] set with typed payloads;
//! [`processor::EventProcessor`] forwards them to the application and
//! synthesizes gestures the host never reports directly.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

use crate::error::{EventError, EventResult};
use crate::types::{LngLat, ScreenPoint};

pub mod buffer;
pub mod processor;

pub use buffer::CircularEventBuffer;
pub use processor::{Clock, EventDelegate, EventProcessor, GestureState, MonotonicClock};

macro_rules! event_kinds {
    ($($(#[$doc:meta])* $kind:ident => $name:literal, $shape:ident;)*) => {
        /// Named map events
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum EventKind {
            $($(#[$doc])* $kind,)*
            /// Two touch-ends in quick succession (synthesized, never sent by the host)
            DoubleTap,
        }

        impl EventKind {
            /// Every kind the host can report directly
            pub const HOST_EVENTS: &'static [EventKind] = &[$(EventKind::$kind,)*];

            /// Event name as used by the host
            pub fn name(&self) -> &'static str {
                match self {
                    $(EventKind::$kind => $name,)*
                    EventKind::DoubleTap => "doubletap",
                }
            }

            /// Look up a host event name
            ///
            /// The synthesized double-tap has no host name and is never returned.
            pub fn from_name(name: &str) -> Option<EventKind> {
                match name {
                    $($name => Some(EventKind::$kind),)*
                    _ => None,
                }
            }

            /// Shape of the payload this kind carries
            pub fn payload_shape(&self) -> PayloadShape {
                match self {
                    $(EventKind::$kind => PayloadShape::$shape,)*
                    EventKind::DoubleTap => PayloadShape::Pointer,
                }
            }
        }
    };
}

event_kinds! {
    /// Map finished its initial load
    Load => "load", None;
    /// Rendering settled; no transitions in progress
    Idle => "idle", None;
    /// A frame was rendered
    Render => "render", None;
    /// Map was removed
    Remove => "remove", None;
    /// Map container was resized
    Resize => "resize", None;
    /// Engine reported an error
    Error => "error", Error;
    /// Pointer click
    Click => "click", Pointer;
    /// Mouse double click
    DoubleClick => "dblclick", Pointer;
    /// Mouse button pressed
    MouseDown => "mousedown", Pointer;
    /// Mouse button released
    MouseUp => "mouseup", Pointer;
    /// Mouse moved
    MouseMove => "mousemove", Pointer;
    /// Mouse entered the map
    MouseOver => "mouseover", Pointer;
    /// Mouse left the map
    MouseOut => "mouseout", Pointer;
    /// Secondary click
    ContextMenu => "contextmenu", Pointer;
    /// Scroll wheel
    Wheel => "wheel", Pointer;
    /// Touch began
    TouchStart => "touchstart", Pointer;
    /// Touch moved
    TouchMove => "touchmove", Pointer;
    /// Touch ended
    TouchEnd => "touchend", Pointer;
    /// Touch cancelled
    TouchCancel => "touchcancel", Pointer;
    /// Camera movement began
    MoveStart => "movestart", None;
    /// Camera moved
    Move => "move", None;
    /// Camera movement ended
    MoveEnd => "moveend", None;
    /// Drag pan began
    DragStart => "dragstart", None;
    /// Drag pan in progress
    Drag => "drag", None;
    /// Drag pan ended
    DragEnd => "dragend", None;
    /// Zoom transition began
    ZoomStart => "zoomstart", None;
    /// Zoom changed
    Zoom => "zoom", None;
    /// Zoom transition ended
    ZoomEnd => "zoomend", None;
    /// Rotation began
    RotateStart => "rotatestart", None;
    /// Bearing changed
    Rotate => "rotate", None;
    /// Rotation ended
    RotateEnd => "rotateend", None;
    /// Pitch transition began
    PitchStart => "pitchstart", None;
    /// Pitch changed
    Pitch => "pitch", None;
    /// Pitch transition ended
    PitchEnd => "pitchend", None;
    /// Box zoom began
    BoxZoomStart => "boxzoomstart", None;
    /// Box zoom finished
    BoxZoomEnd => "boxzoomend", None;
    /// Box zoom cancelled
    BoxZoomCancel => "boxzoomcancel", None;
    /// Rendering context lost
    WebGlContextLost => "webglcontextlost", None;
    /// Rendering context restored
    WebGlContextRestored => "webglcontextrestored", None;
    /// Any style or source data loaded
    Data => "data", None;
    /// Style data loaded
    StyleData => "styledata", None;
    /// Source data loaded
    SourceData => "sourcedata", Source;
    /// Any data began loading
    DataLoading => "dataloading", None;
    /// Style data began loading
    StyleDataLoading => "styledataloading", None;
    /// Source data began loading
    SourceDataLoading => "sourcedataloading", Source;
    /// Style references an image that is not loaded
    StyleImageMissing => "styleimagemissing", StyleImage;
}

impl EventKind {
    /// Whether this kind is only ever produced by synthesis
    pub fn is_synthesized(&self) -> bool {
        matches!(self, EventKind::DoubleTap)
    }
}

/// Payload shape associated with an event kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    /// No payload
    None,
    /// Screen point and coordinate
    Pointer,
    /// Source metadata
    Source,
    /// Missing style image id
    StyleImage,
    /// Error message
    Error,
}

/// Location of a pointer or touch event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerPayload {
    /// Screen position
    #[serde(default)]
    pub point: Option<ScreenPoint>,
    /// Geographic position
    #[serde(default)]
    pub lng_lat: Option<LngLat>,
}

/// Source metadata for source data events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourcePayload {
    /// Source identifier
    pub source_id: String,
    /// Whether the source finished loading
    #[serde(default)]
    pub is_source_loaded: bool,
    /// Kind of data that changed (`metadata`, `content`, ...)
    #[serde(default)]
    pub source_data_type: Option<String>,
}

/// Typed payload attached to a classified event
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EventPayload {
    /// Pointer location
    Pointer(PointerPayload),
    /// Source metadata
    Source(SourcePayload),
    /// Identifier of a missing style image
    StyleImage {
        /// Image identifier
        id: String,
    },
    /// Engine error message
    Error {
        /// Error message
        message: String,
    },
}

#[derive(Deserialize)]
struct StyleImageFields {
    id: String,
}

#[derive(Deserialize)]
struct ErrorFields {
    message: String,
}

impl EventPayload {
    /// Parse a raw payload according to the expected shape
    pub fn parse(shape: PayloadShape, raw: &Map<String, Json>) -> Option<EventPayload> {
        let value = Json::Object(raw.clone());
        match shape {
            PayloadShape::None => None,
            PayloadShape::Pointer => serde_json::from_value::<PointerPayload>(value)
                .ok()
                .filter(|pointer| pointer.point.is_some() || pointer.lng_lat.is_some())
                .map(EventPayload::Pointer),
            PayloadShape::Source => serde_json::from_value(value).ok().map(EventPayload::Source),
            PayloadShape::StyleImage => serde_json::from_value::<StyleImageFields>(value)
                .ok()
                .map(|fields| EventPayload::StyleImage { id: fields.id }),
            PayloadShape::Error => serde_json::from_value::<ErrorFields>(value)
                .ok()
                .map(|fields| EventPayload::Error {
                    message: fields.message,
                }),
        }
    }

    /// Pointer view, when this is a pointer payload
    pub fn as_pointer(&self) -> Option<&PointerPayload> {
        match self {
            EventPayload::Pointer(pointer) => Some(pointer),
            _ => None,
        }
    }
}

/// Event as delivered by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    /// Host event name
    pub name: String,
    /// Optional structured payload
    #[serde(default)]
    pub payload: Option<Map<String, Json>>,
}

impl RawEvent {
    /// Event without payload
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: None,
        }
    }

    /// Attach a payload
    pub fn with_payload(mut self, payload: Map<String, Json>) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Read a host message value
    ///
    /// Accepts the message object itself or a string holding it, since some
    /// hosts only pass text across the message channel.
    pub fn from_json(value: Json) -> EventResult<RawEvent> {
        let mut object = match value {
            Json::Object(object) => object,
            Json::String(text) => return RawEvent::from_json_str(&text),
            _ => return Err(EventError::MissingName),
        };

        let name = match object.remove("name") {
            Some(Json::String(name)) if !name.is_empty() => name,
            _ => return Err(EventError::MissingName),
        };

        let payload = match object.remove("payload") {
            None | Some(Json::Null) => None,
            Some(Json::Object(payload)) => Some(payload),
            Some(_) => return Err(EventError::PayloadNotObject(name)),
        };

        Ok(RawEvent { name, payload })
    }

    /// Parse a host message body
    pub fn from_json_str(text: &str) -> EventResult<RawEvent> {
        let value: Json = serde_json::from_str(text)?;
        RawEvent::from_json(value)
    }
}

/// Event after classification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedEvent {
    /// Event kind
    pub kind: EventKind,
    /// Typed payload, when present and well formed
    pub payload: Option<EventPayload>,
}

impl ClassifiedEvent {
    /// Event without payload
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            payload: None,
        }
    }

    /// Classify a raw host event
    ///
    /// Returns `None` for names outside the known set. A payload that does not
    /// fit its event's shape is dropped; the event itself is still classified.
    pub fn classify(raw: &RawEvent) -> Option<ClassifiedEvent> {
        let kind = EventKind::from_name(&raw.name)?;
        let payload = raw
            .payload
            .as_ref()
            .and_then(|payload| EventPayload::parse(kind.payload_shape(), payload));

        if payload.is_none() && raw.payload.is_some() && kind.payload_shape() != PayloadShape::None
        {
            tracing::debug!("Dropping unreadable payload for '{}' event", raw.name);
        }

        Some(ClassifiedEvent { kind, payload })
    }

    /// Pointer payload, if any
    pub fn pointer(&self) -> Option<&PointerPayload> {
        self.payload.as_ref().and_then(EventPayload::as_pointer)
    }
}
