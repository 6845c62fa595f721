//! External OWS layer rewriting for print requests
//!
//! Print clients may mix layers of the backend's own project with external
//! WMS and WFS layers in the `<mapName>:LAYERS` parameter:
//!
//! ```text
//! countries,wms:https://example.com/wms?#roads,wfs:https://example.com/wfs#lakes
//! ```
//!
//! Before the request is forwarded, [`ExternalOwsLayers::update_params`]
//! rewrites it into something the rendering backend understands:
//!
//! - **QGIS Server < 3.0**: external layers become `RemoteOWS` UserLayers of an
//!   inline `SLD_BODY`. WFS layers may get a UserStyle matching their geometry
//!   type, which is looked up with one `DescribeFeatureType` request per layer.
//! - **QGIS Server >= 3.0**: external WMS layers are renamed to
//!   `EXTERNAL_WMS:<name>` and described by `<name>:url`, `<name>:layers`, ...
//!   parameters. External WFS layers are not supported and are dropped.
//!
//! Rewriting never fails. Anything that cannot be interpreted is either passed
//! through unchanged or degraded (logged, default styling, dropped layer).

pub mod external_wms;
pub mod layers;
pub mod metrics_defs;
pub mod probe;
pub mod rewriter;
pub mod sld;
pub mod style;
pub mod version;

#[cfg(test)]
mod testutils;

use indexmap::IndexMap;

pub use layers::{LayerEntry, LayerKind, LayerReference};
pub use probe::{GeometryProbe, HttpGeometryProbe, ProbeError};
pub use rewriter::ExternalOwsLayers;
pub use style::{ColorGenerator, RandomColor};
pub use version::RenderBackendVersion;

/// Request parameters with upper-cased keys, in insertion order.
pub type Params = IndexMap<String, String>;

/// Appends `?` or `&` to a base URL so query parameters can be concatenated.
///
/// URLs that already end in `?` or `&` are returned unchanged.
pub fn url_with_suffix(url: &str) -> String {
    if url.ends_with('?') || url.ends_with('&') {
        url.to_string()
    } else if url.contains('?') {
        format!("{url}&")
    } else {
        format!("{url}?")
    }
}
