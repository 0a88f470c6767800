#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Default,
    Custom(String)
}

impl OutputFormat {
    pub fn as_arg(&self) -> Option<String> {
        match self {
            OutputFormat::Default => None,
            OutputFormat::Custom(s) => Some(s.clone())
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Container {
    #[default]
    Default,
    Mp4
}

impl Container {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Container::Default => None,
            Container::Mp4 => Some("mp4")
        }
    }
}

/// Per-download switches layered on top of the client's global arguments.
#[derive(Debug, Clone, Default)]
pub struct DownloadOptions {
    pub format: OutputFormat,
    pub container: Container,
    pub output_template: Option<String>,
    pub extract_audio: bool,
    pub audio_format: Option<String>,
    pub audio_quality: Option<String>,
    pub no_check_certificates: bool,
    pub geo_bypass: bool,
    pub quiet: bool
}

impl DownloadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn container(mut self, container: Container) -> Self {
        self.container = container;
        self
    }

    pub fn output_template(mut self, template: impl Into<String>) -> Self {
        self.output_template = Some(template.into());
        self
    }

    pub fn extract_audio(mut self, extract: bool) -> Self {
        self.extract_audio = extract;
        self
    }

    pub fn audio_format(mut self, format: impl Into<String>) -> Self {
        self.audio_format = Some(format.into());
        self
    }

    pub fn audio_quality(mut self, quality: impl Into<String>) -> Self {
        self.audio_quality = Some(quality.into());
        self
    }

    pub fn no_check_certificates(mut self, skip: bool) -> Self {
        self.no_check_certificates = skip;
        self
    }

    pub fn geo_bypass(mut self, bypass: bool) -> Self {
        self.geo_bypass = bypass;
        self
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }
}
