use serde::Deserialize;

/// Limits applied while parsing and rendering.
///
/// Both the template grammar and the embedded code are recursive, and
/// both recurse on the native stack, so each is capped. The default
/// stack budget leaves room on a 2 MiB thread.
/// Hosts that keep their settings in a file can embed this struct in
/// their own configuration; missing keys fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How deeply blocks, tags and bracket groups may nest in a template.
    pub max_nesting: usize,
    /// How deeply functions may call each other while rendering.
    pub max_calls: usize,
    /// How many bytes of native stack a single render may use.
    /// Frames are much larger in unoptimized builds, where this limit
    /// is usually hit before `max_calls`.
    pub max_stack: usize,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            max_nesting: 128,
            max_calls: 200,
            max_stack: 1024 * 1024,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn missing_keys_use_defaults() {
        let config: Config =
            serde_json::from_str(r#"{ "max_calls": 16 }"#).unwrap();
        assert_eq!(config.max_calls, 16);
        assert_eq!(config.max_nesting, Config::default().max_nesting);
    }
}
