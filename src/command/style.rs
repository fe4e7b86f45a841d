//! Style, source, and layer commands

use serde_json::Value as Json;

use super::script::{json_blob, string_literal};
use super::{Command, MAP_HANDLE, ValueCommand};
use crate::error::{CommandError, CommandResult};

fn require_object(field: &'static str, value: &Json) -> CommandResult<()> {
    if value.is_object() {
        Ok(())
    } else {
        Err(CommandError::InvalidShape {
            field,
            detail: "expected a JSON object".to_string(),
        })
    }
}

/// Load a new style
#[derive(Debug, Clone, PartialEq)]
pub struct SetStyle {
    /// Style URL
    pub url: String,
}

impl Command for SetStyle {
    fn script(&self) -> String {
        format!("{MAP_HANDLE}.setStyle({})", string_literal(&self.url))
    }
}

/// Whether the current style has finished loading
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IsStyleLoaded;

impl Command for IsStyleLoaded {
    fn script(&self) -> String {
        // Some engine versions answer `undefined` while loading.
        format!("!!{MAP_HANDLE}.isStyleLoaded()")
    }

    fn expects_value(&self) -> bool {
        true
    }
}

impl ValueCommand for IsStyleLoaded {
    type Output = bool;
}

/// Name of the current style
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GetStyleName;

impl Command for GetStyleName {
    fn script(&self) -> String {
        format!("{MAP_HANDLE}.getStyle().name")
    }

    fn expects_value(&self) -> bool {
        true
    }
}

impl ValueCommand for GetStyleName {
    type Output = String;
}

/// Add a data source
#[derive(Debug, Clone, PartialEq)]
pub struct AddSource {
    id: String,
    source: Json,
}

impl AddSource {
    /// Build the command; `source` must be a source definition object
    pub fn new(id: impl Into<String>, source: Json) -> CommandResult<Self> {
        require_object("source", &source)?;
        Ok(Self {
            id: id.into(),
            source,
        })
    }
}

impl Command for AddSource {
    fn script(&self) -> String {
        format!(
            "{MAP_HANDLE}.addSource({}, {})",
            string_literal(&self.id),
            json_blob(&self.source)
        )
    }
}

/// Remove a data source
#[derive(Debug, Clone, PartialEq)]
pub struct RemoveSource {
    /// Source identifier
    pub id: String,
}

impl Command for RemoveSource {
    fn script(&self) -> String {
        format!("{MAP_HANDLE}.removeSource({})", string_literal(&self.id))
    }
}

/// Replace the data of a GeoJSON source
#[derive(Debug, Clone, PartialEq)]
pub struct SetSourceData {
    id: String,
    data: Json,
}

impl SetSourceData {
    /// Build the command; `data` must be a GeoJSON object
    pub fn new(id: impl Into<String>, data: Json) -> CommandResult<Self> {
        require_object("data", &data)?;
        Ok(Self {
            id: id.into(),
            data,
        })
    }
}

impl Command for SetSourceData {
    fn script(&self) -> String {
        format!(
            "{MAP_HANDLE}.getSource({}).setData({})",
            string_literal(&self.id),
            json_blob(&self.data)
        )
    }
}

/// Add a style layer
#[derive(Debug, Clone, PartialEq)]
pub struct AddLayer {
    layer: Json,
    before: Option<String>,
}

impl AddLayer {
    /// Build the command; `layer` must be an object with a string `id`
    pub fn new(layer: Json) -> CommandResult<Self> {
        require_object("layer", &layer)?;
        if !layer.get("id").is_some_and(Json::is_string) {
            return Err(CommandError::InvalidShape {
                field: "layer",
                detail: "missing string \"id\"".to_string(),
            });
        }
        Ok(Self {
            layer,
            before: None,
        })
    }

    /// Insert below the given layer instead of on top
    pub fn before(mut self, layer_id: impl Into<String>) -> Self {
        self.before = Some(layer_id.into());
        self
    }
}

impl Command for AddLayer {
    fn script(&self) -> String {
        match &self.before {
            Some(before) => format!(
                "{MAP_HANDLE}.addLayer({}, {})",
                json_blob(&self.layer),
                string_literal(before)
            ),
            None => format!("{MAP_HANDLE}.addLayer({})", json_blob(&self.layer)),
        }
    }
}

/// Remove a style layer
#[derive(Debug, Clone, PartialEq)]
pub struct RemoveLayer {
    /// Layer identifier
    pub id: String,
}

impl Command for RemoveLayer {
    fn script(&self) -> String {
        format!("{MAP_HANDLE}.removeLayer({})", string_literal(&self.id))
    }
}

/// Set a layout property on a layer
#[derive(Debug, Clone, PartialEq)]
pub struct SetLayoutProperty {
    /// Layer identifier
    pub layer: String,
    /// Property name
    pub name: String,
    /// Property value
    pub value: Json,
}

impl Command for SetLayoutProperty {
    fn script(&self) -> String {
        format!(
            "{MAP_HANDLE}.setLayoutProperty({}, {}, {})",
            string_literal(&self.layer),
            string_literal(&self.name),
            json_blob(&self.value)
        )
    }
}

/// Set a paint property on a layer
#[derive(Debug, Clone, PartialEq)]
pub struct SetPaintProperty {
    /// Layer identifier
    pub layer: String,
    /// Property name
    pub name: String,
    /// Property value
    pub value: Json,
}

impl Command for SetPaintProperty {
    fn script(&self) -> String {
        format!(
            "{MAP_HANDLE}.setPaintProperty({}, {}, {})",
            string_literal(&self.layer),
            string_literal(&self.name),
            json_blob(&self.value)
        )
    }
}

/// Show or hide a layer
#[derive(Debug, Clone, PartialEq)]
pub struct SetLayerVisibility {
    /// Layer identifier
    pub layer: String,
    /// Whether the layer is drawn
    pub visible: bool,
}

impl Command for SetLayerVisibility {
    fn script(&self) -> String {
        let visibility = if self.visible { "visible" } else { "none" };
        format!(
            "{MAP_HANDLE}.setLayoutProperty({}, \"visibility\", \"{visibility}\")",
            string_literal(&self.layer)
        )
    }
}
