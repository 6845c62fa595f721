//! Parsing of the `<mapName>:LAYERS` list
//!
//! Entries are either names of layers of the backend's own project, or
//! external references of the form `wms:<baseUrl>#<layerNames>` and
//! `wfs:<baseUrl>#<typeName>`. The `#` separating URL and remote name is the
//! first one after the prefix; everything following it belongs to the remote
//! name.

const WMS_PREFIX: &str = "wms:";
const WFS_PREFIX: &str = "wfs:";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LayerKind {
    /// Layer of the backend's own project
    Local,
    ExternalWms { base_url: String, layers: String },
    ExternalWfs { base_url: String, type_name: String },
}

/// One entry of the layer list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerReference {
    pub raw: String,
    pub kind: LayerKind,
    /// Index in the original layer list
    pub position: usize,
}

impl LayerReference {
    pub fn parse(position: usize, raw: &str) -> Self {
        let kind = if let Some((base_url, layers)) = split_external(raw, WMS_PREFIX) {
            LayerKind::ExternalWms { base_url, layers }
        } else if let Some((base_url, type_name)) = split_external(raw, WFS_PREFIX) {
            LayerKind::ExternalWfs {
                base_url,
                type_name,
            }
        } else {
            LayerKind::Local
        };

        LayerReference {
            raw: raw.to_string(),
            kind,
            position,
        }
    }

    pub fn is_external(&self) -> bool {
        !matches!(self.kind, LayerKind::Local)
    }
}

/// Splits `<prefix><baseUrl>#<remote>`, requiring both parts to be non-empty.
fn split_external(raw: &str, prefix: &str) -> Option<(String, String)> {
    let rest = raw.strip_prefix(prefix)?;
    let (base_url, remote) = rest.split_once('#')?;

    if base_url.is_empty() || remote.is_empty() {
        return None;
    }

    Some((base_url.to_string(), remote.to_string()))
}

/// A layer together with the opacity and color at the same list position.
///
/// `None` means the respective list was shorter than the layer list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerEntry {
    pub layer: LayerReference,
    pub opacity: Option<String>,
    pub color: Option<String>,
}

impl LayerEntry {
    /// Opacity as sent by the client, with empty values treated as absent.
    pub fn requested_opacity(&self) -> Option<&str> {
        self.opacity.as_deref().filter(|o| !o.is_empty())
    }

    /// Color as sent by the client, with empty values treated as absent.
    pub fn requested_color(&self) -> Option<&str> {
        self.color.as_deref().filter(|c| !c.is_empty())
    }
}

/// Zips the comma-separated layer, opacity and color lists by position.
///
/// Empty entries are preserved, so an empty layer list yields one empty local
/// layer.
pub fn layer_entries(layers: &str, opacities: &str, colors: &str) -> Vec<LayerEntry> {
    let mut opacities = opacities.split(',');
    let mut colors = colors.split(',');

    layers
        .split(',')
        .enumerate()
        .map(|(position, raw)| LayerEntry {
            layer: LayerReference::parse(position, raw),
            opacity: opacities.next().map(String::from),
            color: colors.next().map(String::from),
        })
        .collect()
}
