use crate::Params;
use crate::external_wms::external_wms_params;
use crate::layers::layer_entries;
use crate::probe::GeometryProbe;
use crate::sld::sld_layers;
use crate::style::{ColorGenerator, RandomColor};
use crate::version::RenderBackendVersion;
use std::sync::Arc;

pub const SLD_BODY_PARAM: &str = "SLD_BODY";
const OPACITIES_PARAM: &str = "OPACITIES";
const COLORS_PARAM: &str = "COLORS";
const SRS_PARAM: &str = "SRS";
const DPI_PARAM: &str = "DPI";

/// Rewrites external WMS/WFS layers of a print request for the configured
/// backend version.
#[derive(Clone)]
pub struct ExternalOwsLayers {
    version: RenderBackendVersion,
    probe: Arc<dyn GeometryProbe>,
    colors: Arc<dyn ColorGenerator>,
}

impl ExternalOwsLayers {
    pub fn new(version: RenderBackendVersion, probe: Arc<dyn GeometryProbe>) -> Self {
        Self {
            version,
            probe,
            colors: Arc::new(RandomColor),
        }
    }

    pub fn with_color_generator(mut self, colors: Arc<dyn ColorGenerator>) -> Self {
        self.colors = colors;
        self
    }

    /// Rewrites the external layers found in `params[layer_param]`.
    ///
    /// `params` must have upper-cased keys. Before QGIS Server 3.0 an
    /// `SLD_BODY` is added if there is at least one external layer; from 3.0
    /// on the layer list, `OPACITIES` and the `EXTERNAL_WMS` parameter groups
    /// are merged in. Other parameters are left untouched.
    pub async fn update_params(&self, params: &mut Params, layer_param: &str) {
        let entries = layer_entries(
            param(params, layer_param),
            param(params, OPACITIES_PARAM),
            param(params, COLORS_PARAM),
        );
        let crs = param(params, SRS_PARAM).to_string();

        if self.version.supports_external_wms() {
            let external_params = external_wms_params(layer_param, &entries, &crs);
            params.extend(external_params);
        } else {
            let dpi = params.get(DPI_PARAM).cloned();
            let document = sld_layers(
                &entries,
                &crs,
                dpi.as_deref(),
                self.probe.clone(),
                self.colors.as_ref(),
            )
            .await;

            if !document.is_empty() {
                tracing::debug!(
                    layers = document.layers.len(),
                    "Adding external layers as SLD UserLayers"
                );
                params.insert(SLD_BODY_PARAM.to_string(), document.to_xml());
            }
        }
    }
}

fn param<'a>(params: &'a Params, key: &str) -> &'a str {
    params.get(key).map(String::as_str).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::{FixedColor, POLYGON_SCHEMA, StubProbe};

    fn print_params(layers: &str) -> Params {
        Params::from_iter(
            [
                ("SERVICE", "WMS"),
                ("REQUEST", "GetPrint"),
                ("DPI", "200"),
                ("SRS", "EPSG:4326"),
                ("TEMPLATE", "A4 Landscape"),
                ("MAP0:LAYERS", layers),
                ("OPACITIES", "255,127,192,255"),
                ("COLORS", ",,#ff0000,"),
            ]
            .map(|(k, v)| (k.to_string(), v.to_string())),
        )
    }

    fn rewriter(version: &str, probe: Arc<StubProbe>) -> ExternalOwsLayers {
        ExternalOwsLayers::new(RenderBackendVersion::parse(version), probe)
            .with_color_generator(Arc::new(FixedColor::new("#112233")))
    }

    #[tokio::test]
    async fn test_local_layers_are_noop() {
        for version in ["2.18.19", "3.22.0"] {
            let probe = Arc::new(StubProbe::with_schema(POLYGON_SCHEMA));
            let mut params = print_params("countries,states,country_names,lines");
            let original = params.clone();

            rewriter(version, probe.clone())
                .update_params(&mut params, "MAP0:LAYERS")
                .await;

            assert_eq!(params, original, "params changed for {version}");
            assert!(probe.requested_urls().is_empty());
        }
    }

    #[tokio::test]
    async fn test_sld_body_for_legacy_backend() {
        let probe = Arc::new(StubProbe::with_schema(POLYGON_SCHEMA));
        let mut params = print_params("a,wms:http://h/wms#b,wfs:http://h/wfs#c,d");
        let original = params.clone();

        rewriter("2.18.19", probe.clone())
            .update_params(&mut params, "MAP0:LAYERS")
            .await;

        let sld = &params[SLD_BODY_PARAM];
        assert!(sld.starts_with("<StyledLayerDescriptor><UserLayer><Name>wms:http://h/wms#b</Name>"));
        assert_eq!(sld.matches("<UserLayer>").count(), 2);
        assert!(sld.contains("<CssParameter name=\"fill\">#ff0000</CssParameter>"));
        assert_eq!(probe.requested_urls().len(), 1);

        // everything else is untouched
        params.shift_remove(SLD_BODY_PARAM);
        assert_eq!(params, original);
    }

    #[tokio::test]
    async fn test_external_wms_for_qgis3() {
        let probe = Arc::new(StubProbe::with_schema(POLYGON_SCHEMA));
        let mut params = print_params("a,wms:http://h/wms#b,wfs:http://h/wfs#c,d");

        rewriter("3.28.1", probe.clone())
            .update_params(&mut params, "MAP0:LAYERS")
            .await;

        assert_eq!(params["MAP0:LAYERS"], "a,EXTERNAL_WMS:A,d");
        assert_eq!(params["OPACITIES"], "255,127,255");
        assert_eq!(params["A:url"], "http://h/wms?");
        assert_eq!(params["A:crs"], "EPSG:4326");
        assert_eq!(params["TEMPLATE"], "A4 Landscape");
        assert!(!params.contains_key(SLD_BODY_PARAM));
        assert!(probe.requested_urls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_layer_param() {
        let probe = Arc::new(StubProbe::with_schema(POLYGON_SCHEMA));
        let mut params = Params::new();

        rewriter("2.18.19", probe.clone())
            .update_params(&mut params, "MAP0:LAYERS")
            .await;
        assert!(params.is_empty());

        rewriter("3.0.0", probe)
            .update_params(&mut params, "MAP0:LAYERS")
            .await;
        assert!(params.is_empty());
    }
}
