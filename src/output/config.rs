use std::env;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OutputConfig {
    pub pretty: bool,
}

impl OutputConfig {
    pub fn from_env() -> Self {
        Self::from_pretty(env::var("BFEEDS_OUTPUT_PRETTY").ok().as_deref())
    }

    fn from_pretty(raw: Option<&str>) -> Self {
        let pretty = matches!(raw, Some(v) if v == "1" || v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("yes"));
        OutputConfig { pretty }
    }
}
