//! PlotNet - Compose neural network layer diagrams into TikZ documents.
//!
//! An architecture is described as an ordered list of layers in TOML. Each
//! layer is composed into TikZ fragments, the fragments are wrapped with the
//! fixed preamble and palette, and the document can then be compiled to PDF
//! with an external TeX toolchain.

pub mod arch;
pub mod compose;
pub mod config;
pub mod execute;

mod error;

pub use plotnet_core::{anchor, color, document, draw, geometry, identifier};

pub use error::PlotnetError;
pub use plotnet_core::Error as ComposeError;

use log::{debug, info, trace};

use plotnet_core::document::Document;

use arch::Architecture;
use config::AppConfig;

/// Builder for parsing and rendering PlotNet architectures.
///
/// # Examples
///
/// ```rust
/// use plotnet::{DiagramBuilder, config::AppConfig};
///
/// let source = r#"
///     [[layer]]
///     kind = "conv"
///     name = "conv_1"
///     prev = "origin"
/// "#;
///
/// let builder = DiagramBuilder::new(AppConfig::default());
///
/// // Parse source to an architecture
/// let arch = builder.parse(source).expect("Failed to parse");
///
/// // Render the architecture to a TeX document
/// let tex = builder.render_tex(&arch).expect("Failed to render");
/// assert!(tex.contains("name=conv_1,"));
/// assert!(tex.trim_end().ends_with("\\end{document}"));
/// ```
#[derive(Default)]
pub struct DiagramBuilder {
    config: AppConfig,
}

impl DiagramBuilder {
    /// Create a new diagram builder with the given configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Application configuration including document and compiler settings
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration this builder renders with.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Parse TOML source into an architecture.
    ///
    /// Layers are checked for shape only; names and references are resolved
    /// when the architecture is rendered.
    ///
    /// # Errors
    ///
    /// Returns [`PlotnetError::Parse`], carrying the source, for malformed
    /// TOML or unknown layer kinds and fields.
    pub fn parse(&self, source: &str) -> Result<Architecture, PlotnetError> {
        info!("Parsing architecture");

        let arch: Architecture =
            toml::from_str(source).map_err(|err| PlotnetError::new_parse_error(err, source))?;

        debug!(name:? = arch.name(), layers = arch.layers().len(); "Architecture parsed");
        trace!(arch:?; "Parsed architecture");

        Ok(arch)
    }

    /// Render an architecture to a complete TeX document.
    ///
    /// # Errors
    ///
    /// Returns [`PlotnetError::Config`] for an invalid extra palette and
    /// [`PlotnetError::Compose`] when a layer cannot be composed.
    pub fn render_tex(&self, arch: &Architecture) -> Result<String, PlotnetError> {
        let document_config = self.config.document();
        let mut document = Document::new(document_config.layers_path());

        for (name, definition) in document_config.palette().map_err(PlotnetError::Config)? {
            document.add_color(&name, definition)?;
        }

        info!(name:? = arch.name(), layers = arch.layers().len(); "Composing architecture");
        document.extend(arch.compose()?);

        let tex = document.render();
        info!(bytes = tex.len(); "Document rendered");
        Ok(tex)
    }
}
