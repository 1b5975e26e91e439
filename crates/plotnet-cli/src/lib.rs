//! CLI logic for the PlotNet diagram tool.
//!
//! This module contains the core CLI logic: load the configuration, turn the
//! architecture file into a TeX document and optionally compile and open it.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;
pub use config::{ConfigSource, PROJECT_CONFIG};

use std::{fs, path::Path};

use log::info;

use plotnet::{DiagramBuilder, PlotnetError, execute::TexCompiler};

/// Run the PlotNet CLI application
///
/// This function processes the input file through the PlotNet pipeline,
/// writes the resulting TeX document and, when asked, compiles it.
///
/// # Arguments
///
/// * `args` - Command-line arguments
///
/// # Errors
///
/// Returns `PlotnetError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Parsing errors
/// - Composition errors
/// - A failing TeX compiler
pub fn run(args: &Args) -> Result<(), PlotnetError> {
    let output = args.output_path();
    info!(
        input_path = args.input,
        output_path:? = output;
        "Processing architecture"
    );

    let config_source =
        ConfigSource::discover(args.config.as_deref().map(Path::new), Path::new(&args.input));
    let app_config = config_source.load()?;

    // Read input file
    let source = fs::read_to_string(&args.input)?;

    // Process architecture using DiagramBuilder API
    let builder = DiagramBuilder::new(app_config);
    let arch = builder.parse(&source)?;
    let tex = builder.render_tex(&arch)?;

    let compiler_config = builder.config().compiler().clone();
    let clean = compiler_config.clean() && !args.keep_temp;
    let compiler = TexCompiler::new(compiler_config.with_clean(clean));

    // Write output file
    compiler.write_tex(&output, &tex)?;
    info!(output_file:? = output; "TeX document written");

    if args.compile {
        let pdf = compiler.build(&output)?;
        info!(pdf_file:? = pdf; "PDF compiled");

        if args.open {
            compiler.open_viewer(&pdf);
        }
    }

    Ok(())
}
