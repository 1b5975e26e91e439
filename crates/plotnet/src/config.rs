//! Configuration types for PlotNet documents.
//!
//! This module provides configuration structures that control how documents
//! are assembled and compiled. All types implement [`serde::Deserialize`] for
//! loading from external sources.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining document and compiler settings.
//! - [`DocumentConfig`] - Where the layer macro package lives and extra palette colours.
//! - [`CompilerConfig`] - The external TeX compiler, clean-up and viewer.
//!
//! # Example
//!
//! ```
//! # use plotnet::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.document().layers_path(), "../");
//! assert_eq!(config.compiler().program(), "pdflatex");
//! assert!(config.document().palette().unwrap().is_empty());
//! ```

use std::str::FromStr;

use indexmap::IndexMap;
use serde::Deserialize;

use plotnet_core::color::Fill;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Document assembly section.
    #[serde(default)]
    document: DocumentConfig,

    /// External compiler section.
    #[serde(default)]
    compiler: CompilerConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(document: DocumentConfig, compiler: CompilerConfig) -> Self {
        Self { document, compiler }
    }

    /// Returns the document configuration.
    pub fn document(&self) -> &DocumentConfig {
        &self.document
    }

    /// Returns the compiler configuration.
    pub fn compiler(&self) -> &CompilerConfig {
        &self.compiler
    }

    /// Checks the settings that deserialize but cannot work.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first offending setting.
    pub fn validate(&self) -> Result<(), String> {
        self.document.validate()?;
        self.compiler.validate()
    }
}

/// Document assembly configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentConfig {
    /// Project path whose `layers/` directory holds the TikZ macro package.
    #[serde(default = "default_layers_path")]
    layers_path: String,

    /// Extra colour definitions, emitted after the fixed palette in order.
    #[serde(default)]
    palette: IndexMap<String, String>,
}

fn default_layers_path() -> String {
    "../".to_string()
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            layers_path: default_layers_path(),
            palette: IndexMap::new(),
        }
    }
}

impl DocumentConfig {
    /// Creates a document configuration with an empty extra palette.
    pub fn new(layers_path: impl Into<String>) -> Self {
        Self {
            layers_path: layers_path.into(),
            palette: IndexMap::new(),
        }
    }

    /// Returns this configuration with one more palette entry.
    pub fn with_color(mut self, name: impl Into<String>, definition: impl Into<String>) -> Self {
        self.palette.insert(name.into(), definition.into());
        self
    }

    /// Returns the project path of the layer macro package.
    pub fn layers_path(&self) -> &str {
        &self.layers_path
    }

    fn validate(&self) -> Result<(), String> {
        if let Some(name) = self
            .palette
            .keys()
            .find(|name| name.is_empty() || !name.chars().all(|c| c.is_ascii_alphabetic()))
        {
            return Err(format!(
                "palette name `{name}` must be ASCII letters only to be used as a TeX macro"
            ));
        }
        self.palette().map(|_| ())
    }

    /// Returns the extra palette as `(name, tikz definition)` pairs.
    ///
    /// CSS colours (`#rrggbb`, `rgb(..)`) are converted to TikZ colour
    /// expressions and layer keys such as `conv` alias the palette macro.
    /// Anything else is passed through as written.
    ///
    /// # Errors
    ///
    /// Returns an error if a CSS colour cannot be parsed.
    pub fn palette(&self) -> Result<Vec<(String, String)>, String> {
        self.palette
            .iter()
            .map(|(name, definition)| {
                let fill = Fill::from_str(definition)
                    .map_err(|err| format!("Invalid palette colour `{name}`: {err}"))?;
                Ok((name.clone(), fill.to_string()))
            })
            .collect()
    }
}

/// External TeX compiler configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompilerConfig {
    /// Program turning the `.tex` file into a PDF.
    #[serde(default = "default_program")]
    program: String,

    /// Arguments passed before the `.tex` file name.
    #[serde(default = "default_args")]
    args: Vec<String>,

    /// Whether transient build files are deleted after compiling.
    #[serde(default = "default_clean")]
    clean: bool,

    /// Extensions of the transient build files.
    #[serde(default = "default_clean_extensions")]
    clean_extensions: Vec<String>,

    /// Program used to open the PDF. Platform default when unset.
    #[serde(default)]
    viewer: Option<String>,
}

/// Extensions of the files a build reads or produces, never cleaned up.
const PROTECTED_EXTENSIONS: [&str; 2] = ["tex", "pdf"];

fn default_program() -> String {
    "pdflatex".to_string()
}

fn default_args() -> Vec<String> {
    vec![
        "-interaction=nonstopmode".to_string(),
        "-halt-on-error".to_string(),
    ]
}

fn default_clean() -> bool {
    true
}

fn default_clean_extensions() -> Vec<String> {
    vec!["aux".to_string(), "log".to_string()]
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_args(),
            clean: default_clean(),
            clean_extensions: default_clean_extensions(),
            viewer: None,
        }
    }
}

impl CompilerConfig {
    /// Creates a compiler configuration running `program` with no extra arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            ..Self::default()
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_clean(mut self, clean: bool) -> Self {
        self.clean = clean;
        self
    }

    pub fn with_viewer(mut self, viewer: impl Into<String>) -> Self {
        self.viewer = Some(viewer.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn clean(&self) -> bool {
        self.clean
    }

    pub fn clean_extensions(&self) -> &[String] {
        &self.clean_extensions
    }

    pub fn viewer(&self) -> Option<&str> {
        self.viewer.as_deref()
    }

    fn validate(&self) -> Result<(), String> {
        if self.program.trim().is_empty() {
            return Err("`compiler.program` must name a program".to_string());
        }
        for extension in &self.clean_extensions {
            if extension.is_empty() || extension.contains(['.', '/', '\\']) {
                return Err(format!(
                    "clean extension `{extension}` must be a bare extension such as `aux`"
                ));
            }
            if PROTECTED_EXTENSIONS.contains(&extension.to_ascii_lowercase().as_str()) {
                return Err(format!(
                    "clean extension `{extension}` would delete the document or its PDF"
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_sections_keep_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [compiler]
            clean = false
            "#,
        )
        .unwrap();

        assert!(!config.compiler().clean());
        assert_eq!(config.compiler().program(), "pdflatex");
        assert_eq!(config.compiler().clean_extensions(), ["aux", "log"]);
        assert_eq!(config.document().layers_path(), "../");
    }

    #[test]
    fn test_palette_keeps_order_and_converts_css() {
        let config: AppConfig = toml::from_str(
            r##"
            [document.palette]
            AttentionColor = "#ff8000"
            NormColor = "rgb:blue,2;white,3"
            "##,
        )
        .unwrap();

        let palette = config.document().palette().unwrap();
        assert_eq!(
            palette,
            vec![
                (
                    "AttentionColor".to_string(),
                    "{rgb,255:red,255;green,128;blue,0}".to_string()
                ),
                ("NormColor".to_string(), "rgb:blue,2;white,3".to_string()),
            ]
        );
    }

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(AppConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_unusable_settings() {
        let invalid = |src: &str| {
            let config: AppConfig = toml::from_str(src).unwrap();
            config.validate().unwrap_err()
        };

        assert!(invalid("[compiler]\nclean_extensions = [\"aux\", \"PDF\"]").contains("PDF"));
        assert!(invalid("[compiler]\nclean_extensions = [\".log\"]").contains(".log"));
        assert!(invalid("[compiler]\nprogram = \" \"").contains("compiler.program"));
        assert!(invalid("[document.palette]\nhead_color = \"red\"").contains("head_color"));
        assert!(invalid("[document.palette]\nHead = \"#zzz\"").contains("Head"));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(toml::from_str::<AppConfig>("[compiler]\nprogramme = \"xelatex\"").is_err());
        assert!(toml::from_str::<AppConfig>("[render]\nscale = 2").is_err());
    }

    #[test]
    fn test_invalid_css_palette_entry() {
        let document = DocumentConfig::default().with_color("Broken", "#zzz");
        let err = document.palette().unwrap_err();
        assert!(err.contains("Broken"));
    }
}
