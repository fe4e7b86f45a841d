//! Typed commands and their script rendering
//!
//! A [`Command`] is an immutable description of one host operation. Rendering
//! is a pure function of the command's fields: no I/O, same text every time.
//! Every command refers to the host-side map through the fixed identifier
//! [`MAP_HANDLE`]; the bridge never holds a native reference to it.

use std::fmt;

use crate::bridge::value::FromDecoded;

pub mod camera;
pub mod script;
pub mod session;
pub mod style;

pub use camera::{
    CameraOptions, FlyTo, GetBearing, GetBounds, GetCenter, GetPitch, GetZoom, JumpTo, Project,
    Resize, SetBearing, SetCenter, SetPitch, SetZoom, Unproject,
};
pub use script::Identifier;
pub use session::{EvaluateScript, InitializeMap, SubscribeEvents};
pub use style::{
    AddLayer, AddSource, GetStyleName, IsStyleLoaded, RemoveLayer, RemoveSource,
    SetLayerVisibility, SetLayoutProperty, SetPaintProperty, SetSourceData, SetStyle,
};

/// Host-side identifier of the current map object
pub const MAP_HANDLE: &str = "map";

/// One host operation, renderable to script text
pub trait Command: fmt::Debug + Send + Sync {
    /// Render the script text for this command
    fn script(&self) -> String;

    /// Whether the caller expects a meaningful return value
    ///
    /// Fire-and-forget commands ignore whatever the host returns.
    fn expects_value(&self) -> bool {
        false
    }
}

/// A command whose result the caller wants back as a typed value
pub trait ValueCommand: Command {
    /// Type the decoded result is converted into
    type Output: FromDecoded;
}

impl<C: Command + ?Sized> Command for &C {
    fn script(&self) -> String {
        (**self).script()
    }

    fn expects_value(&self) -> bool {
        (**self).expects_value()
    }
}

impl<C: Command + ?Sized> Command for Box<C> {
    fn script(&self) -> String {
        (**self).script()
    }

    fn expects_value(&self) -> bool {
        (**self).expects_value()
    }
}
