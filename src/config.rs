use crate::foundation::error::{BlitError, BlitResult};

/// Environment variable that forces the RGB-only drawing path.
pub const ENV_DISABLE_ANIM: &str = "ANIMBLIT_DISABLE_ANIM";

/// Process-wide drawing configuration, owned by the caller and lent to each
/// [`crate::Blitter`].
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BlitterSettings {
    /// Ignore the animation plane and draw final colours straight into RGB.
    pub disable_anim: bool,
}

impl BlitterSettings {
    pub fn from_json_str(json: &str) -> BlitResult<Self> {
        serde_json::from_str(json).map_err(|e| BlitError::decode(format!("settings json: {e}")))
    }

    /// Defaults overridden by `ANIMBLIT_DISABLE_ANIM` (`1`/`true`/`yes`).
    pub fn from_env() -> Self {
        let disable_anim = std::env::var(ENV_DISABLE_ANIM)
            .ok()
            .map(|v| parse_flag(&v))
            .unwrap_or(false);
        Self { disable_anim }
    }
}

fn parse_flag(v: &str) -> bool {
    matches!(
        v.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
