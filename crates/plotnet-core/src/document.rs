//! Document assembly.
//!
//! A document is `head + palette + begin marker + body + end marker`. The
//! head, palette and markers are reproduced byte for byte: the layer macro
//! package expects the colour names, arrow macros and connection styles they
//! define.
//!
//! ```
//! # use plotnet_core::document::Document;
//! # use plotnet_core::draw::Fragment;
//! let mut document = Document::new("../");
//! document.push(Fragment::new("        \\coordinate (a) at (0,0,0);\n"));
//!
//! let text = document.render();
//! assert!(text.contains("\\subimport{../layers/}{init}"));
//! assert!(text.ends_with("        \\end{document}\n    "));
//! ```

use log::debug;

use crate::{
    draw::{Fragment, Fragments},
    error::{Error, Result},
};

const HEAD_START: &str = r#"
\documentclass[border=8pt, multi, tikz]{standalone}
\usepackage{import}
\usepackage{graphicx}
\subimport{"#;

const HEAD_END: &str = r#"}{init}
\usetikzlibrary{positioning}
\usetikzlibrary{3d} %for including external image
\usetikzlibrary{decorations,shapes}
\usetikzlibrary{decorations.shapes}
\usetikzlibrary{decorations.markings}
"#;

/// Definitions of the layer palette and of the demo image paths.
pub const PALETTE: &str = r#"
\def\ConvColor{rgb:yellow,5;red,2.5;white,5}
\def\ConvReluColor{rgb:yellow,5;red,5;white,5}
\def\PoolColor{rgb:red,1;black,0.3}
\def\UpsampleColor{rgb:green,5; white,2}
\def\DetectColor{rgb:red,5; white,2}
\def\UnpoolColor{rgb:blue,2;green,1;black,0.3}
\def\FcColor{rgb:blue,5;red,2.5;white,5}
\def\FcReluColor{rgb:blue,5;red,5;white,4}
\def\SoftmaxColor{rgb:magenta,5;black,7}
\def\SumColor{rgb:green, 1}
\def\ShortcutColor{rgb: blue, 3; green, 1; white, 5}
\def\MultColor{rgb: magenta, 1}
\def\ConcColor{rgb:red, 5}
\def\input_image{../examples/input_image.jpg}
\def\output_image{../examples/output_image.png}
\def\skyseg{../examples/sky_segmentation.png}
"#;

/// Arrow macro, connection styles and the opening of the picture.
pub const BEGIN: &str = r#"
\newcommand{\copymidarrow}{\tikz \draw[-Stealth,line width=0.8mm,draw={rgb:blue,4;red,1;green,1;black,3}] (-0.3,0) -- ++ (0.3,0);}

\begin{document}
    \begin{tikzpicture}
        \tikzstyle{fillwhite} = [fill=white,inner sep=0pt, opacity=1]
        \tikzstyle{connection}=[ultra thick,every node/.style={sloped,allow upside down},draw=\edgecolor,opacity=0.7]
        \tikzstyle{fuseconnection}=[ultra thick,every node/.style={sloped,allow upside down},draw=orange, decorate,decoration={markings,
            mark connection node=my node,
            mark=at position .8 with
            {\node [draw, fill=orange, rectangle, minimum height = 4mm, minimum width=1mm,
            transform shape, inner sep=0pt] (my node) {};}}], opacity=0.7]

        %\tikzstyle{fuseconnection}=[ultra thick,every node/.style={sloped,allow upside down},draw=orange, decorate,decoration={shape backgrounds,shape=signal, shape size=.2mm, shape sep={2mm, between borders}}, signal from=west, signal pointer angle = 5]
        %\tikzstyle{fuseconnection}=[ultra thick,every node/.style={sloped,allow upside down},draw=orange]
        \tikzstyle{copyconnection}=[ultra thick,every node/.style={sloped,allow upside down},draw={rgb:blue,4;red,1;green,1;black,3},opacity=0.7]
"#;

/// Closing of the picture and of the document.
pub const END: &str = r#"
        \end{tikzpicture}
        \end{document}
    "#;

/// Directory holding the layer macro package, relative to the `.tex` file.
const LAYERS_DIR: &str = "layers/";

/// Joins `project_path` with the layer package directory.
///
/// Backslashes are normalised to forward slashes so Windows paths survive
/// TeX's parser.
///
/// ```
/// # use plotnet_core::document::layers_path;
/// assert_eq!(layers_path("../"), "../layers/");
/// assert_eq!(layers_path(".."), "../layers/");
/// assert_eq!(layers_path(""), "layers/");
/// assert_eq!(layers_path("C:\\work\\net"), "C:/work/net/layers/");
/// ```
pub fn layers_path(project_path: &str) -> String {
    let joined = if project_path.is_empty() {
        LAYERS_DIR.to_string()
    } else if project_path.ends_with('/') {
        format!("{project_path}{LAYERS_DIR}")
    } else {
        format!("{project_path}/{LAYERS_DIR}")
    };
    joined.replace('\\', "/")
}

/// Renders the document head: class, packages and TikZ libraries.
pub fn head(project_path: &str) -> String {
    format!("{HEAD_START}{}{HEAD_END}", layers_path(project_path))
}

/// Renders everything that precedes the body: head, palette and begin marker.
pub fn preamble(project_path: &str) -> String {
    let mut text = head(project_path);
    text.push_str(PALETTE);
    text.push_str(BEGIN);
    text
}

/// An ordered document body wrapped with the fixed preamble.
#[derive(Debug, Clone, Default)]
pub struct Document {
    project_path: String,
    colors: Vec<(String, String)>,
    body: Fragments,
}

impl Document {
    /// Creates an empty document whose layer package lives under `project_path`
    pub fn new(project_path: impl Into<String>) -> Self {
        Self {
            project_path: project_path.into(),
            ..Self::default()
        }
    }

    /// Adds a colour definition `\def\<name>{<definition>}` after the palette.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidReference`] when `name` is not a valid TeX
    /// control word (ASCII letters only).
    pub fn add_color(&mut self, name: &str, definition: impl Into<String>) -> Result<()> {
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(Error::InvalidReference {
                input: name.to_string(),
                reason: "colour names must consist of ASCII letters".to_string(),
            });
        }
        self.colors.push((name.to_string(), definition.into()));
        Ok(())
    }

    /// Appends one fragment to the body
    pub fn push(&mut self, fragment: Fragment) {
        self.body.push(fragment);
    }

    /// Appends fragments to the body, keeping their order
    pub fn extend(&mut self, fragments: Fragments) {
        self.body.merge(fragments);
    }

    /// Returns the body fragments
    pub fn body(&self) -> &Fragments {
        &self.body
    }

    /// Renders the complete document.
    pub fn render(&self) -> String {
        debug!(
            fragments = self.body.len(),
            colors = self.colors.len();
            "Rendering document"
        );

        let mut text = head(&self.project_path);
        text.push_str(PALETTE);
        for (name, definition) in &self.colors {
            text.push_str(&format!("\\def\\{name}{{{definition}}}\n"));
        }
        text.push_str(BEGIN);
        text.push_str(&self.body.render());
        text.push_str(END);
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_head_is_exact() {
        let expected = concat!(
            "\n",
            "\\documentclass[border=8pt, multi, tikz]{standalone}\n",
            "\\usepackage{import}\n",
            "\\usepackage{graphicx}\n",
            "\\subimport{../layers/}{init}\n",
            "\\usetikzlibrary{positioning}\n",
            "\\usetikzlibrary{3d} %for including external image\n",
            "\\usetikzlibrary{decorations,shapes}\n",
            "\\usetikzlibrary{decorations.shapes}\n",
            "\\usetikzlibrary{decorations.markings}\n",
        );
        assert_eq!(head("../"), expected);
    }

    #[test]
    fn test_palette_defines_every_layer_color() {
        use crate::color::LayerColor;

        for color in [
            LayerColor::Conv,
            LayerColor::ConvRelu,
            LayerColor::Pool,
            LayerColor::Upsample,
            LayerColor::Detect,
            LayerColor::Unpool,
            LayerColor::Fc,
            LayerColor::FcRelu,
            LayerColor::Softmax,
            LayerColor::Sum,
            LayerColor::Shortcut,
            LayerColor::Mult,
            LayerColor::Conc,
        ] {
            assert!(PALETTE.contains(&format!("\\def{color}{{")), "{color} missing");
        }
    }

    #[test]
    fn test_markers() {
        assert!(BEGIN.starts_with("\n\\newcommand{\\copymidarrow}"));
        assert!(BEGIN.contains("\\begin{document}\n    \\begin{tikzpicture}\n"));
        assert!(BEGIN.contains("\\tikzstyle{copyconnection}"));
        assert_eq!(END, "\n        \\end{tikzpicture}\n        \\end{document}\n    ");
    }

    #[test]
    fn test_render_order() {
        let mut document = Document::new("");
        document.push(Fragment::new("BODY-1\n"));
        let mut more = Fragments::new();
        more.push(Fragment::new("BODY-2\n"));
        document.extend(more);

        let text = document.render();
        let expected = format!("{}BODY-1\nBODY-2\n{END}", preamble(""));
        assert_eq!(text, expected);
    }

    #[test]
    fn test_extra_colors_follow_palette() {
        let mut document = Document::new("../");
        document.add_color("AttentionColor", "rgb:cyan,3;white,2").unwrap();
        let text = document.render();

        let palette_end = text.find(PALETTE).unwrap() + PALETTE.len();
        assert!(text[palette_end..].starts_with("\\def\\AttentionColor{rgb:cyan,3;white,2}\n\n\\newcommand"));
    }

    #[test]
    fn test_add_color_rejects_invalid_names() {
        let mut document = Document::new("../");
        assert!(document.add_color("", "red").is_err());
        assert!(document.add_color("my_color", "red").is_err());
        assert!(document.add_color("Color2", "red").is_err());
    }

    #[test]
    fn test_render_is_idempotent() {
        let mut document = Document::new("../");
        document.push(Fragment::new("x\n"));
        assert_eq!(document.render(), document.render());
    }
}
