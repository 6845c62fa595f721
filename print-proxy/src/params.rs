//! Conversion of the posted print form into backend GetPrint parameters

use ows_rewrite::Params;
use url::form_urlencoded;

const CONTENT_DISPOSITION_PARAM: &str = "CONTENT_DISPOSITION";
const DEFAULT_CONTENT_DISPOSITION: &str = "attachment";
const LAYERS_PARAM_SUFFIX: &str = ":LAYERS";

/// Parameters of a print request, ready to be rewritten and forwarded
#[derive(Clone, Debug, PartialEq)]
pub struct PrintParams {
    pub params: Params,
    /// `inline` or `attachment`, applied to PDF responses
    pub content_disposition: String,
}

impl PrintParams {
    /// Parses an `application/x-www-form-urlencoded` body.
    ///
    /// Starts from `SERVICE=WMS&VERSION=1.3.0&REQUEST=GetPrint`, overlaid with
    /// the posted fields. Keys are upper-cased. `CONTENT_DISPOSITION` is taken
    /// out of the forwarded parameters.
    pub fn from_form(body: &[u8]) -> Self {
        let mut params = Params::new();
        params.insert("SERVICE".into(), "WMS".into());
        params.insert("VERSION".into(), "1.3.0".into());
        params.insert("REQUEST".into(), "GetPrint".into());

        for (key, value) in form_urlencoded::parse(body) {
            params.insert(key.to_uppercase(), value.into_owned());
        }

        let content_disposition = params
            .shift_remove(CONTENT_DISPOSITION_PARAM)
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_CONTENT_DISPOSITION.to_string());

        PrintParams {
            params,
            content_disposition,
        }
    }

    /// Key of the `<mapName>:LAYERS` parameter, if any.
    pub fn layer_param(&self) -> Option<&str> {
        Self::layer_param_of(&self.params)
    }

    pub fn layer_param_of(params: &Params) -> Option<&str> {
        params
            .keys()
            .find(|key| key.ends_with(LAYERS_PARAM_SUFFIX))
            .map(String::as_str)
    }
}
