//! Native engine version probe

use planar_sys as native;
use std::sync::OnceLock;

static VERSION: OnceLock<String> = OnceLock::new();

/// Formatted `major.minor.revision` of the native engine
///
/// The triple is probed once per process and cached; this is the minimal
/// call/marshal round trip and runs before anything else touches the
/// engine. A triple the binding cannot have been built against means the
/// native layer is missing or ABI-incompatible. That is fatal, so this
/// panics rather than returning an error.
pub fn version() -> &'static str {
    VERSION.get_or_init(|| {
        let v = native::version();
        if v.major <= 0 {
            panic!(
                "native engine version probe returned {}.{}.{}; libplanar2d is missing or ABI-incompatible",
                v.major, v.minor, v.revision
            );
        }
        format!("{}.{}.{}", v.major, v.minor, v.revision)
    })
}
