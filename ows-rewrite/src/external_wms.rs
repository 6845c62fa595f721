//! `EXTERNAL_WMS` parameters, for QGIS Server 3.x
//!
//! Each external WMS layer gets a synthetic name `A`, `B`, ..., `Z`, `AA`,
//! `BB`, ... and is replaced by `EXTERNAL_WMS:<name>` in the layer list. Its
//! source is described by a group of `<name>:<key>` parameters.
//!
//! QGIS Server 3.x cannot render remote WFS layers; they are dropped with a
//! warning.

use crate::Params;
use crate::layers::{LayerEntry, LayerKind};
use crate::metrics_defs::{DROPPED_LAYERS, EXTERNAL_LAYERS};
use crate::url_with_suffix;

const OPACITIES_PARAM: &str = "OPACITIES";

/// Synthetic layer name for the `index`-th external WMS layer (zero-based).
///
/// The letter `A + index % 26` is repeated `index / 26 + 1` times.
pub fn synthetic_name(index: usize) -> String {
    let letter = char::from(b'A' + (index % 26) as u8);
    letter.to_string().repeat(index / 26 + 1)
}

/// Source description of one external WMS layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExternalWmsLayer {
    pub name: String,
    pub url: String,
    pub layers: String,
    pub crs: String,
}

impl ExternalWmsLayer {
    /// Appends the `<name>:<key>` parameter group.
    pub fn write_params(&self, params: &mut Params) {
        let name = &self.name;
        params.insert(format!("{name}:url"), self.url.clone());
        params.insert(format!("{name}:layers"), self.layers.clone());
        params.insert(format!("{name}:format"), "image/png".into());
        params.insert(format!("{name}:crs"), self.crs.clone());
        params.insert(format!("{name}:styles"), String::new());
        params.insert(format!("{name}:dpiMode"), "7".into());
        params.insert(format!("{name}:contextualWMSLegend"), "0".into());
    }

    /// Entry replacing the original layer in the layer list.
    pub fn layer_name(&self) -> String {
        format!("EXTERNAL_WMS:{}", self.name)
    }
}

/// Builds the parameters to merge into the request for QGIS Server 3.x.
///
/// Returns the rewritten `layer_param` and `OPACITIES` values plus one
/// parameter group per external WMS layer. Without external layers nothing
/// needs rewriting and the result is empty.
pub fn external_wms_params(layer_param: &str, entries: &[LayerEntry], crs: &str) -> Params {
    let mut params = Params::new();

    if !entries.iter().any(|entry| entry.layer.is_external()) {
        return params;
    }

    let mut layer_names = Vec::with_capacity(entries.len());
    let mut opacities = Vec::with_capacity(entries.len());
    let mut external_count = 0;

    for entry in entries {
        match &entry.layer.kind {
            LayerKind::Local => {
                layer_names.push(entry.layer.raw.clone());
            }
            LayerKind::ExternalWms { base_url, layers } => {
                let layer = ExternalWmsLayer {
                    name: synthetic_name(external_count),
                    url: url_with_suffix(base_url),
                    layers: layers.clone(),
                    crs: crs.to_string(),
                };
                external_count += 1;

                shared::counter!(EXTERNAL_LAYERS, "kind" => "wms", "protocol" => "external_wms")
                    .increment(1);
                layer.write_params(&mut params);
                layer_names.push(layer.layer_name());
            }
            LayerKind::ExternalWfs { .. } => {
                shared::counter!(DROPPED_LAYERS).increment(1);
                tracing::warn!(
                    layer = %entry.layer.raw,
                    "External WFS layers not supported in QGIS Server 3.x"
                );
                continue;
            }
        }

        if let Some(opacity) = &entry.opacity {
            opacities.push(opacity.clone());
        }
    }

    params.insert(layer_param.to_string(), layer_names.join(","));
    params.insert(OPACITIES_PARAM.to_string(), opacities.join(","));

    params
}
