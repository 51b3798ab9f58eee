//! Command-line interface definitions for scriptor

use clap::{Args, Parser, Subcommand, ValueEnum};
use scriptor::geometry::{CanvasPreset, CanvasSelection, Unit};
use scriptor::renderer::ExportTarget;
use std::path::PathBuf;

/// Canvas size preset
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum CanvasArg {
    /// A4 (8.27 x 11.69 in)
    A4,
    /// A5 (5.83 x 8.27 in)
    A5,
    /// US Letter (8.5 x 11 in)
    #[default]
    Letter,
    /// Workbook (8.5 x 11 in)
    Workbook,
    /// Custom size from --width, --height and --unit
    Custom,
}

impl From<CanvasArg> for CanvasPreset {
    fn from(arg: CanvasArg) -> Self {
        match arg {
            CanvasArg::A4 => CanvasPreset::A4,
            CanvasArg::A5 => CanvasPreset::A5,
            CanvasArg::Letter => CanvasPreset::Letter,
            CanvasArg::Workbook => CanvasPreset::Workbook,
            CanvasArg::Custom => CanvasPreset::Custom,
        }
    }
}

/// Unit of custom canvas dimensions
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum UnitArg {
    /// Inches
    #[default]
    In,
    /// Millimetres
    Mm,
    /// CSS pixels
    Px,
}

impl From<UnitArg> for Unit {
    fn from(arg: UnitArg) -> Self {
        match arg {
            UnitArg::In => Unit::In,
            UnitArg::Mm => Unit::Mm,
            UnitArg::Px => Unit::Px,
        }
    }
}

/// Renderer target for the render command
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TargetArg {
    /// Print CSS pagination only
    Pdf,
    /// Explicit page-break blocks for the DOCX converter
    Docx,
}

impl From<TargetArg> for ExportTarget {
    fn from(arg: TargetArg) -> Self {
        match arg {
            TargetArg::Pdf => ExportTarget::Pdf,
            TargetArg::Docx => ExportTarget::Docx,
        }
    }
}

/// Output format for the export command
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// PDF via the remote export service
    Pdf,
    /// Microsoft Word DOCX via the remote export service
    Docx,
    /// Standalone HTML file
    Html,
    /// Markdown file
    Markdown,
    /// Plain text file
    Txt,
}

impl ExportFormat {
    /// Default file extension for local formats
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Docx => "docx",
            ExportFormat::Html => "html",
            ExportFormat::Markdown => "md",
            ExportFormat::Txt => "txt",
        }
    }
}

/// Page size options shared by commands that render
#[derive(Debug, Clone, Args)]
pub struct CanvasArgs {
    /// Canvas size preset
    #[arg(long, value_enum, default_value = "letter")]
    pub canvas: CanvasArg,

    /// Custom width (with --canvas custom)
    #[arg(long)]
    pub width: Option<String>,

    /// Custom height (with --canvas custom)
    #[arg(long)]
    pub height: Option<String>,

    /// Unit of the custom width and height
    #[arg(long, value_enum, default_value = "in")]
    pub unit: UnitArg,
}

impl CanvasArgs {
    /// The canvas selection these options describe
    pub fn selection(&self) -> CanvasSelection {
        CanvasSelection {
            preset: self.canvas.into(),
            custom_width: self.width.clone(),
            custom_height: self.height.clone(),
            custom_unit: self.unit.into(),
        }
    }
}

/// CLI structure for the scriptor application
#[derive(Parser)]
#[command(name = "scriptor")]
#[command(version)]
#[command(about = "Write books in sections and export them to PDF, DOCX, HTML, Markdown or text", long_about = None)]
pub struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, default_value = "scriptor.toml")]
    pub config: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for scriptor
#[derive(Subcommand)]
pub enum Commands {
    /// Write a configuration file with the default settings
    InitConfig {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Start a new project with the default sections
    New {
        /// Book title
        #[arg(short, long, default_value = "")]
        title: String,

        /// Book subtitle
        #[arg(short, long, default_value = "")]
        subtitle: String,

        /// Replace an existing project
        #[arg(short, long)]
        force: bool,
    },

    /// Show the project outline and word counts
    Show,

    /// Change the book title and/or subtitle
    SetTitle {
        /// New title
        #[arg(short, long, required_unless_present = "subtitle")]
        title: Option<String>,

        /// New subtitle (an empty value removes it)
        #[arg(short, long)]
        subtitle: Option<String>,
    },

    /// Append a section (defaults to the next "Chapter N")
    AddSection {
        /// Section name
        name: Option<String>,
    },

    /// Rename a section, keeping its position
    RenameSection {
        /// Current name
        old: String,

        /// New name
        new: String,
    },

    /// Delete a section and its content
    DeleteSection {
        /// Section name
        name: String,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Delete the whole project and start over
    DeleteProject {
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Set the content of a section
    Write {
        /// Section name (created if missing)
        section: String,

        /// Read the HTML from a file
        #[arg(short, long, conflicts_with = "html", required_unless_present = "html")]
        file: Option<PathBuf>,

        /// HTML given inline
        #[arg(long)]
        html: Option<String>,

        /// Append instead of replacing
        #[arg(short, long)]
        append: bool,
    },

    /// Import a .docx manuscript into a section
    ImportManuscript {
        /// Section receiving the manuscript
        section: String,

        /// Path to the .docx file
        file: PathBuf,
    },

    /// Replace text across the manuscript (case-insensitive)
    Replace {
        /// Text to find
        search: String,

        /// Replacement text
        replacement: String,

        /// Only search this section
        #[arg(short, long)]
        section: Option<String>,
    },

    /// Show word counts
    Stats {
        /// Only count this section
        #[arg(short, long)]
        section: Option<String>,

        /// Word goal for the section
        #[arg(short, long)]
        goal: Option<usize>,
    },

    /// Show a random writing prompt for a niche
    Prompt {
        /// Book niche, e.g. "self-help"
        #[arg(short, long)]
        niche: Option<String>,

        /// List the niches that have prompts
        #[arg(short, long, conflicts_with = "niche")]
        list: bool,
    },

    /// Show the page geometry for a canvas size
    Geometry {
        #[command(flatten)]
        canvas: CanvasArgs,
    },

    /// Print or save the rendered HTML document
    Render {
        /// Renderer the HTML is prepared for
        #[arg(short, long, value_enum, default_value = "pdf")]
        target: TargetArg,

        /// Output file (prints to stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        canvas: CanvasArgs,
    },

    /// Export the project
    Export {
        /// Output format
        #[arg(short, long, value_enum, default_value = "pdf")]
        format: ExportFormat,

        /// Output file for local formats (defaults to the title)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Open the download link in the browser (PDF and DOCX)
        #[arg(long)]
        open: bool,

        #[command(flatten)]
        canvas: CanvasArgs,
    },
}
