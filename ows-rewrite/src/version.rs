use std::fmt;

/// Version of the rendering backend, encoded as `major*10000 + minor*100 + revision`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct RenderBackendVersion(u32);

impl RenderBackendVersion {
    /// First version speaking the `EXTERNAL_WMS` protocol generation.
    pub const EXTERNAL_WMS: RenderBackendVersion = RenderBackendVersion(30000);

    pub const fn new(major: u32, minor: u32, revision: u32) -> Self {
        RenderBackendVersion(
            major
                .saturating_mul(10000)
                .saturating_add(minor.saturating_mul(100))
                .saturating_add(revision),
        )
    }

    /// Parses a dotted `major.minor.revision` string.
    ///
    /// Missing components are 0. Components that are not integers are logged
    /// and treated as 0. Anything after the third component is ignored.
    pub fn parse(version: &str) -> Self {
        let mut components = [0u32; 3];

        for (slot, part) in components.iter_mut().zip(version.split('.')) {
            match part.trim().parse::<u32>() {
                Ok(value) => *slot = value,
                Err(e) => {
                    tracing::error!(
                        version,
                        component = part,
                        error = %e,
                        "Error parsing render backend version"
                    );
                }
            }
        }

        let [major, minor, revision] = components;
        Self::new(major, minor, revision)
    }

    pub const fn as_int(&self) -> u32 {
        self.0
    }

    /// Whether the backend takes external layers as `EXTERNAL_WMS` parameters
    /// instead of an inline SLD.
    pub fn supports_external_wms(&self) -> bool {
        *self >= Self::EXTERNAL_WMS
    }
}

impl fmt::Display for RenderBackendVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}",
            self.0 / 10000,
            self.0 / 100 % 100,
            self.0 % 100
        )
    }
}
