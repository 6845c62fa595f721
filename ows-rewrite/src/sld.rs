//! Inline SLD with RemoteOWS UserLayers, for QGIS Server 2.x
//!
//! ```text
//! <StyledLayerDescriptor>
//!   <UserLayer>
//!     <Name>wfs:https://example.com/wfs#lakes</Name>
//!     <RemoteOWS>
//!       <Service>WFS</Service>
//!       <OnlineResource xlink:href="https://example.com/wfs?TYPENAME=lakes&amp;srsName=EPSG:2056" />
//!     </RemoteOWS>
//!     <UserStyle>...</UserStyle>
//!   </UserLayer>
//! </StyledLayerDescriptor>
//! ```
//!
//! The document is serialized without whitespace and with a fixed element
//! order. Names, URLs and colors are inserted verbatim, so values containing
//! `<` or `"` produce an invalid document.

use crate::layers::{LayerEntry, LayerKind};
use crate::metrics_defs::EXTERNAL_LAYERS;
use crate::probe::{GeometryProbe, probe_geometry};
use crate::style::{ColorGenerator, GeometryKind, StyleSpec, user_style};
use crate::url_with_suffix;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoteService {
    Wms,
    Wfs,
}

impl RemoteService {
    pub const fn as_str(&self) -> &'static str {
        match self {
            RemoteService::Wms => "WMS",
            RemoteService::Wfs => "WFS",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct UserLayer {
    pub name: String,
    pub service: RemoteService,
    pub online_resource: String,
    /// Serialized UserStyle, empty for automatic styling
    pub style: String,
}

impl UserLayer {
    fn write_xml(&self, out: &mut String) {
        out.push_str("<UserLayer>");
        out.push_str(&format!("<Name>{}</Name>", self.name));
        out.push_str("<RemoteOWS>");
        out.push_str(&format!("<Service>{}</Service>", self.service.as_str()));
        out.push_str(&format!(
            "<OnlineResource xlink:href=\"{}\" />",
            self.online_resource
        ));
        out.push_str("</RemoteOWS>");
        out.push_str(&self.style);
        out.push_str("</UserLayer>");
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SldDocument {
    pub layers: Vec<UserLayer>,
}

impl SldDocument {
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Serializes the document, or returns an empty string without UserLayers.
    pub fn to_xml(&self) -> String {
        if self.is_empty() {
            return String::new();
        }

        let mut out = String::from("<StyledLayerDescriptor>");
        for layer in &self.layers {
            layer.write_xml(&mut out);
        }
        out.push_str("</StyledLayerDescriptor>");
        out
    }
}

/// OnlineResource of an external WMS layer.
pub fn wms_online_resource(base_url: &str, layers: &str, crs: &str) -> String {
    format!(
        "{}LAYERS={layers}&amp;STYLES=&amp;CRS={crs}&amp;FORMAT=image/png",
        url_with_suffix(base_url)
    )
}

/// OnlineResource of an external WFS layer.
pub fn wfs_online_resource(base_url: &str, type_name: &str, crs: &str) -> String {
    format!(
        "{}TYPENAME={type_name}&amp;srsName={crs}",
        url_with_suffix(base_url)
    )
}

/// Builds the SLD for all external layers in `entries`; local layers are skipped.
///
/// The geometry of every WFS layer with a color is probed once. Probes run
/// concurrently and are aborted if the returned future is dropped.
pub async fn sld_layers(
    entries: &[LayerEntry],
    crs: &str,
    dpi: Option<&str>,
    probe: Arc<dyn GeometryProbe>,
    colors: &dyn ColorGenerator,
) -> SldDocument {
    let mut styles: HashMap<usize, StyleSpec> = HashMap::new();
    let mut probes = JoinSet::new();

    for entry in entries {
        let LayerKind::ExternalWfs {
            base_url,
            type_name,
        } = &entry.layer.kind
        else {
            continue;
        };

        let spec = StyleSpec::resolve(
            entry.requested_color(),
            entry.requested_opacity(),
            dpi,
            colors,
        );

        if spec.color.is_some() {
            let probe = probe.clone();
            let wfs_url = url_with_suffix(base_url);
            let type_name = type_name.clone();
            let position = entry.layer.position;

            probes.spawn(async move {
                let kind = probe_geometry(probe.as_ref(), &wfs_url, &type_name).await;
                (position, kind)
            });
        }

        styles.insert(entry.layer.position, spec);
    }

    let mut geometries: HashMap<usize, GeometryKind> = HashMap::new();
    while let Some(result) = probes.join_next().await {
        match result {
            Ok((position, Some(kind))) => {
                geometries.insert(position, kind);
            }
            Ok((_, None)) => {}
            Err(e) => tracing::error!("Probe task panicked: {}", e),
        }
    }

    let mut document = SldDocument::default();

    for entry in entries {
        let position = entry.layer.position;

        match &entry.layer.kind {
            LayerKind::Local => continue,
            LayerKind::ExternalWms { base_url, layers } => {
                shared::counter!(EXTERNAL_LAYERS, "kind" => "wms", "protocol" => "sld")
                    .increment(1);
                document.layers.push(UserLayer {
                    name: entry.layer.raw.clone(),
                    service: RemoteService::Wms,
                    online_resource: wms_online_resource(base_url, layers, crs),
                    style: String::new(),
                });
            }
            LayerKind::ExternalWfs {
                base_url,
                type_name,
            } => {
                shared::counter!(EXTERNAL_LAYERS, "kind" => "wfs", "protocol" => "sld")
                    .increment(1);

                let style = match (styles.get(&position), geometries.get(&position)) {
                    (Some(spec), Some(kind)) => {
                        tracing::debug!(
                            geometry = %kind,
                            color = spec.color.as_deref().unwrap_or_default(),
                            opacity = spec.opacity.unwrap_or(1.0),
                            url = %base_url,
                            type_name = %type_name,
                            "Using {} style", kind
                        );
                        user_style(*kind, spec)
                    }
                    _ => {
                        tracing::debug!(
                            url = %base_url,
                            type_name = %type_name,
                            "Using default automatic style"
                        );
                        String::new()
                    }
                };

                document.layers.push(UserLayer {
                    name: entry.layer.raw.clone(),
                    service: RemoteService::Wfs,
                    online_resource: wfs_online_resource(base_url, type_name, crs),
                    style,
                });
            }
        }
    }

    document
}
