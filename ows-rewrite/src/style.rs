//! SLD UserStyles for external WFS layers
//!
//! The symbolizer is chosen from the geometry type advertised by the WFS
//! `DescribeFeatureType` response. The response is scanned for the GML
//! property type names rather than parsed as XML Schema, so an unrelated
//! element whose name contains e.g. `PolygonPropertyType"` is taken as a
//! polygon layer.

use rand::Rng;
use std::fmt;

const DEFAULT_DPI: u32 = 200;
const FULL_OPACITY: i64 = 255;
const STROKE_COLOR: &str = "#000000";
const STROKE_WIDTH: &str = "2";

/// Source of fill colors for transparent WFS layers without an explicit color.
pub trait ColorGenerator: Send + Sync {
    /// Returns a color as `#rrggbb`.
    fn next_color(&self) -> String;
}

/// Uniformly random colors.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomColor;

impl ColorGenerator for RandomColor {
    fn next_color(&self) -> String {
        let rgb: u32 = rand::thread_rng().gen_range(0..=0xFF_FFFF);
        format!("#{rgb:06x}")
    }
}

/// Styling requested for one WFS layer.
#[derive(Clone, Debug, PartialEq)]
pub struct StyleSpec {
    pub color: Option<String>,
    /// Opacity in `[0, 1]`, only set when below full opacity
    pub opacity: Option<f64>,
    pub dpi: u32,
}

impl StyleSpec {
    /// Resolves the client's color, opacity (0-255) and DPI values.
    ///
    /// Unparsable opacities count as fully opaque and unparsable DPIs as 200.
    /// A transparent layer without a color gets one from `colors`.
    pub fn resolve(
        color: Option<&str>,
        opacity: Option<&str>,
        dpi: Option<&str>,
        colors: &dyn ColorGenerator,
    ) -> Self {
        let mut color = color.filter(|c| !c.is_empty()).map(String::from);

        let opacity = opacity.filter(|o| !o.is_empty()).and_then(|o| {
            let value = o.trim().parse::<i64>().unwrap_or_else(|e| {
                tracing::debug!(opacity = o, error = %e, "Invalid opacity, using full opacity");
                FULL_OPACITY
            });
            (value < FULL_OPACITY).then(|| value.max(0) as f64 / FULL_OPACITY as f64)
        });

        if opacity.is_some() && color.is_none() {
            color = Some(colors.next_color());
        }

        let dpi = dpi
            .filter(|d| !d.is_empty())
            .and_then(|d| d.trim().parse::<u32>().ok())
            .unwrap_or(DEFAULT_DPI);

        StyleSpec {
            color,
            opacity,
            dpi,
        }
    }

    /// Mark size for point symbols, scaled from 10px at 96 DPI.
    ///
    /// Written into the SLD with `Debug` formatting so whole sizes keep their
    /// `.0`, e.g. `20.0` at 192 DPI.
    pub fn point_size(&self) -> f64 {
        10.0 * self.dpi as f64 / 96.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeometryKind {
    Polygon,
    Line,
    Point,
}

impl GeometryKind {
    /// Markers searched in the `DescribeFeatureType` response, in priority order.
    const MARKERS: [(&'static str, GeometryKind); 3] = [
        ("PolygonPropertyType\"", GeometryKind::Polygon),
        ("LineStringPropertyType\"", GeometryKind::Line),
        ("PointPropertyType\"", GeometryKind::Point),
    ];

    /// Detects the geometry kind from a raw `DescribeFeatureType` response.
    pub fn detect(schema: &str) -> Option<GeometryKind> {
        Self::MARKERS
            .iter()
            .find(|(marker, _)| schema.contains(marker))
            .map(|(_, kind)| *kind)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            GeometryKind::Polygon => "polygon",
            GeometryKind::Line => "line",
            GeometryKind::Point => "point",
        }
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// URL of the `DescribeFeatureType` request for a `?`/`&` terminated WFS URL.
pub fn describe_feature_type_url(wfs_url: &str, type_name: &str) -> String {
    format!("{wfs_url}TYPENAME={type_name}&SERVICE=WFS&REQUEST=DescribeFeatureType")
}

/// Renders the UserStyle for `kind`, or an empty string if no color is set.
pub fn user_style(kind: GeometryKind, spec: &StyleSpec) -> String {
    let Some(color) = spec.color.as_deref() else {
        return String::new();
    };
    let opacity = spec.opacity.map(|o| o.to_string());
    let opacity = opacity.as_deref();

    let mut sld = String::new();
    sld.push_str("<UserStyle>");
    sld.push_str("<Name></Name>");
    sld.push_str("<FeatureTypeStyle>");
    sld.push_str("<Rule>");

    match kind {
        GeometryKind::Polygon => {
            sld.push_str("<PolygonSymbolizer>");
            push_fill(&mut sld, color, opacity);
            push_stroke(&mut sld, STROKE_COLOR, opacity);
            sld.push_str("</PolygonSymbolizer>");
        }
        GeometryKind::Line => {
            sld.push_str("<LineSymbolizer>");
            push_stroke(&mut sld, color, opacity);
            sld.push_str("</LineSymbolizer>");
        }
        GeometryKind::Point => {
            sld.push_str("<PointSymbolizer>");
            sld.push_str("<Graphic>");
            sld.push_str("<Mark>");
            sld.push_str("<WellKnownName>circle</WellKnownName>");
            push_fill(&mut sld, color, opacity);
            push_stroke(&mut sld, STROKE_COLOR, opacity);
            sld.push_str("</Mark>");
            sld.push_str(&format!("<Size>{:?}</Size>", spec.point_size()));
            sld.push_str("</Graphic>");
            sld.push_str("</PointSymbolizer>");
        }
    }

    sld.push_str("</Rule>");
    sld.push_str("</FeatureTypeStyle>");
    sld.push_str("</UserStyle>");
    sld
}

fn push_fill(sld: &mut String, color: &str, opacity: Option<&str>) {
    sld.push_str("<Fill>");
    push_css_parameter(sld, "fill", color);
    if let Some(opacity) = opacity {
        push_css_parameter(sld, "fill-opacity", opacity);
    }
    sld.push_str("</Fill>");
}

fn push_stroke(sld: &mut String, color: &str, opacity: Option<&str>) {
    sld.push_str("<Stroke>");
    push_css_parameter(sld, "stroke", color);
    push_css_parameter(sld, "stroke-width", STROKE_WIDTH);
    if let Some(opacity) = opacity {
        push_css_parameter(sld, "stroke-opacity", opacity);
    }
    sld.push_str("</Stroke>");
}

fn push_css_parameter(sld: &mut String, name: &str, value: &str) {
    sld.push_str(&format!("<CssParameter name=\"{name}\">{value}</CssParameter>"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::FixedColor;

    fn spec(color: Option<&str>, opacity: Option<f64>, dpi: u32) -> StyleSpec {
        StyleSpec {
            color: color.map(String::from),
            opacity,
            dpi,
        }
    }

    #[test]
    fn test_resolve_opaque_without_color() {
        let colors = FixedColor::new("#123456");
        let resolved = StyleSpec::resolve(None, Some("255"), None, &colors);
        assert_eq!(resolved, spec(None, None, 200));
        assert_eq!(colors.calls(), 0);

        let resolved = StyleSpec::resolve(Some(""), None, Some(""), &colors);
        assert_eq!(resolved, spec(None, None, 200));
    }

    #[test]
    fn test_resolve_transparent_generates_color() {
        let colors = FixedColor::new("#123456");
        let resolved = StyleSpec::resolve(Some(""), Some("127"), Some("300"), &colors);
        assert_eq!(resolved.color.as_deref(), Some("#123456"));
        assert!((resolved.opacity.unwrap() - 0.498).abs() < 0.001);
        assert_eq!(resolved.dpi, 300);
        assert_eq!(colors.calls(), 1);
    }

    #[test]
    fn test_resolve_keeps_explicit_color() {
        let colors = FixedColor::new("#123456");
        let resolved = StyleSpec::resolve(Some("#ff0000"), Some("0"), None, &colors);
        assert_eq!(resolved, spec(Some("#ff0000"), Some(0.0), 200));
        assert_eq!(colors.calls(), 0);

        // full opacity keeps the color but sets no opacity
        let resolved = StyleSpec::resolve(Some("#ff0000"), Some("255"), None, &colors);
        assert_eq!(resolved, spec(Some("#ff0000"), None, 200));
    }

    #[test]
    fn test_resolve_unparsable_values() {
        let colors = FixedColor::new("#123456");
        let resolved = StyleSpec::resolve(None, Some("half"), Some("high"), &colors);
        assert_eq!(resolved, spec(None, None, 200));
        assert_eq!(colors.calls(), 0);
    }

    #[test]
    fn test_random_color_format() {
        for _ in 0..32 {
            let color = RandomColor.next_color();
            assert_eq!(color.len(), 7);
            assert!(color.starts_with('#'));
            assert!(color[1..].chars().all(|c| c.is_ascii_hexdigit()));
        }
    }

    #[test]
    fn test_detect_geometry() {
        let polygon = r#"<element name="geom" type="gml:MultiPolygonPropertyType"/>"#;
        assert_eq!(GeometryKind::detect(polygon), Some(GeometryKind::Polygon));

        let line = r#"<element name="geom" type="gml:LineStringPropertyType"/>"#;
        assert_eq!(GeometryKind::detect(line), Some(GeometryKind::Line));

        let point = r#"<element name="geom" type="gml:PointPropertyType"/>"#;
        assert_eq!(GeometryKind::detect(point), Some(GeometryKind::Point));

        let generic = r#"<element name="geom" type="gml:GeometryPropertyType"/>"#;
        assert_eq!(GeometryKind::detect(generic), None);

        // polygon wins over other markers
        let both = format!("{point}{polygon}");
        assert_eq!(GeometryKind::detect(&both), Some(GeometryKind::Polygon));
    }

    #[test]
    fn test_polygon_style() {
        let style = user_style(GeometryKind::Polygon, &spec(Some("#ff0000"), Some(127.0 / 255.0), 200));
        assert_eq!(
            style,
            "<UserStyle><Name></Name><FeatureTypeStyle><Rule><PolygonSymbolizer>\
             <Fill><CssParameter name=\"fill\">#ff0000</CssParameter>\
             <CssParameter name=\"fill-opacity\">0.4980392156862745</CssParameter></Fill>\
             <Stroke><CssParameter name=\"stroke\">#000000</CssParameter>\
             <CssParameter name=\"stroke-width\">2</CssParameter>\
             <CssParameter name=\"stroke-opacity\">0.4980392156862745</CssParameter></Stroke>\
             </PolygonSymbolizer></Rule></FeatureTypeStyle></UserStyle>"
        );
    }

    #[test]
    fn test_line_style_without_opacity() {
        let style = user_style(GeometryKind::Line, &spec(Some("#00ff00"), None, 200));
        assert_eq!(
            style,
            "<UserStyle><Name></Name><FeatureTypeStyle><Rule><LineSymbolizer>\
             <Stroke><CssParameter name=\"stroke\">#00ff00</CssParameter>\
             <CssParameter name=\"stroke-width\">2</CssParameter></Stroke>\
             </LineSymbolizer></Rule></FeatureTypeStyle></UserStyle>"
        );
    }

    #[test]
    fn test_point_style_scales_with_dpi() {
        let style = user_style(GeometryKind::Point, &spec(Some("#0000ff"), Some(0.5), 192));
        assert!(style.contains("<WellKnownName>circle</WellKnownName>"));
        assert!(style.contains("<CssParameter name=\"fill\">#0000ff</CssParameter>"));
        assert!(style.contains("<CssParameter name=\"fill-opacity\">0.5</CssParameter>"));
        assert!(style.contains("<CssParameter name=\"stroke\">#000000</CssParameter>"));
        assert!(style.contains("</Mark><Size>20.0</Size></Graphic>"));

        let style = user_style(GeometryKind::Point, &spec(Some("#0000ff"), None, 96));
        assert!(style.contains("<Size>10.0</Size>"));

        let default_dpi = spec(Some("#0000ff"), None, 200);
        assert!((default_dpi.point_size() - 20.8333).abs() < 0.001);
    }

    #[test]
    fn test_no_color_no_style() {
        assert_eq!(user_style(GeometryKind::Polygon, &spec(None, Some(0.5), 200)), "");
    }

    #[test]
    fn test_describe_feature_type_url() {
        assert_eq!(
            describe_feature_type_url("http://h/wfs?", "lakes"),
            "http://h/wfs?TYPENAME=lakes&SERVICE=WFS&REQUEST=DescribeFeatureType"
        );
    }
}
