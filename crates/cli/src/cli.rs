//! CLI definitions and command dispatch.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use font_family::{
    DEFAULT_REFERENCE_GLYPH, FamilyOptions, Font, ParametricAxis, PreVarFamily, TiePolicy,
};
use font_outline::{DEFAULT_PARALLEL_TOLERANCE, GlyphAnalyzer, ToleranceConfig};
use log::info;

use crate::{
    io::expand_fonts,
    report::{AnalysisView, MastersView, ReportView},
};

#[derive(Parser)]
#[command(name = "varprep")]
#[command(about = "Check TrueType masters for interpolation and derive parametric axis masters")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, clap::Args)]
pub struct ToleranceArgs {
    /// Slack, in font units, for vertical and horizontal alignment tests
    #[arg(long, default_value_t = 0.0)]
    pub tolerance: f64,
    /// Maximum angle, in degrees, between strokes counted as parallel
    #[arg(long, default_value_t = DEFAULT_PARALLEL_TOLERANCE)]
    pub parallel_tolerance: f64,
}

impl ToleranceArgs {
    pub fn config(&self) -> ToleranceConfig {
        ToleranceConfig::uniform(self.tolerance).parallel(self.parallel_tolerance)
    }
}

#[derive(Debug, Clone, clap::Args)]
pub struct FamilyArgs {
    /// Font files or glob patterns
    #[arg(required = true)]
    pub fonts: Vec<String>,
    /// Glyph measured to parametrize axis masters
    #[arg(long, default_value = DEFAULT_REFERENCE_GLYPH)]
    pub reference_glyph: String,
    /// Pick the first of several equally close default candidates instead of failing
    #[arg(long)]
    pub first_found: bool,
    /// Choose the default by weight class alone, without the width-class tie-break
    #[arg(long)]
    pub weight_only: bool,
    #[command(flatten)]
    pub tolerance: ToleranceArgs,
}

impl FamilyArgs {
    pub fn options(&self) -> FamilyOptions {
        let policy = if self.first_found { TiePolicy::FirstFound } else { TiePolicy::Strict };
        FamilyOptions::new()
            .reference_glyph(&self.reference_glyph)
            .tolerance(self.tolerance.config())
            .tie_policy(policy)
            .width_tie_break(!self.weight_only)
    }

    pub fn load(&self, options: FamilyOptions) -> Result<PreVarFamily> {
        let paths = expand_fonts(&self.fonts)?;
        info!("loading {} fonts", paths.len());
        PreVarFamily::load(&paths, options).context("Failed to load family")
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Report glyphs that cannot be interpolated across the masters
    Check {
        #[command(flatten)]
        args: FamilyArgs,
    },
    /// Print the stems, bars and counters measured in one glyph
    Analyze {
        font: PathBuf,
        #[arg(long, default_value = DEFAULT_REFERENCE_GLYPH)]
        glyph: String,
        #[command(flatten)]
        tolerance: ToleranceArgs,
    },
    /// Print the master chosen as the interpolation origin
    Default {
        #[command(flatten)]
        args: FamilyArgs,
    },
    /// Derive the minimum and maximum masters of a parametric axis
    Axis {
        /// Axis tag, e.g. XTRA or YTUC
        #[arg(value_parser = parse_axis)]
        axis: ParametricAxis,
        #[command(flatten)]
        args: FamilyArgs,
        /// Directory for generated masters (default: .varprep-cache beside the origin)
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
}

impl Commands {
    pub fn run(self) -> Result<()> {
        match self {
            Commands::Check { args } => {
                let mut family = args.load(args.options())?;
                let report = family.check_interpolation();
                if report.is_compatible() {
                    println!("{} masters are compatible", family.len());
                    return Ok(());
                }
                print!("{}", ReportView(&report));
                bail!("{} issues in {} glyphs", report.issue_count(), report.len());
            }
            Commands::Analyze { font, glyph, tolerance } => {
                let font = Font::load(&font)
                    .with_context(|| format!("Failed to read font: {}", font.display()))?;
                let outline = font.flatten(&glyph)?;
                let target = font.glyph(&glyph).context("glyph vanished after flattening")?;
                let analysis =
                    GlyphAnalyzer::new(tolerance.config()).analyze_with_outline(target, &outline);
                println!("{glyph} in {}", font.path().display());
                print!("{}", AnalysisView(&analysis));
            }
            Commands::Default { args } => {
                let mut family = args.load(args.options())?;
                let font = family.default_font()?;
                let declared = font.declared_style();
                println!(
                    "{} (weight {}, width {})",
                    font.path().display(),
                    declared.weight_class,
                    declared.width_class
                );
            }
            Commands::Axis { axis, args, cache_dir } => {
                let mut options = args.options();
                if let Some(dir) = cache_dir {
                    options = options.cache_dir(dir);
                }
                let mut family = args.load(options)?;
                let masters = family
                    .axis(axis)
                    .with_context(|| format!("Failed to derive {axis} masters"))?;
                print!("{}", MastersView(masters));
            }
        }
        Ok(())
    }
}

fn parse_axis(tag: &str) -> Result<ParametricAxis, String> {
    tag.parse().map_err(|e: font_family::Error| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_axis_with_shared_flags() {
        let cli = Cli::try_parse_from([
            "varprep",
            "axis",
            "xtra",
            "a.ttf",
            "b.ttf",
            "--first-found",
            "--tolerance",
            "1.5",
            "--cache-dir",
            "out",
        ])
        .unwrap();
        let Commands::Axis { axis, args, cache_dir } = cli.command else {
            panic!("expected the axis command");
        };
        assert_eq!(axis, ParametricAxis::Xtra);
        assert_eq!(args.fonts, ["a.ttf", "b.ttf"]);
        assert_eq!(cache_dir, Some(PathBuf::from("out")));

        let options = args.options();
        assert_eq!(options.tie_policy, TiePolicy::FirstFound);
        assert_eq!(options.tolerance, ToleranceConfig::uniform(1.5));
        assert_eq!(options.reference_glyph, "H");
        assert!(options.width_tie_break);
    }

    #[test]
    fn weight_only_disables_width_tie_break() {
        let cli = Cli::try_parse_from(["varprep", "default", "a.ttf", "--weight-only"]).unwrap();
        let Commands::Default { args } = cli.command else {
            panic!("expected the default command");
        };
        assert!(!args.options().width_tie_break);
    }

    #[test]
    fn rejects_unknown_axis() {
        assert!(Cli::try_parse_from(["varprep", "axis", "wdth", "a.ttf"]).is_err());
    }

    #[test]
    fn check_requires_fonts() {
        assert!(Cli::try_parse_from(["varprep", "check"]).is_err());
    }
}
