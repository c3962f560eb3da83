use anyhow::Result;
use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
use placeholder_gen::{
    generate_placeholder, ColorResolver, ColorTable, FitOptions, PlaceholderConfig, SpleenFont,
    SpleenSize,
};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FontSize {
    /// Spleen 6x12
    Small,
    /// Spleen 8x16
    Medium,
    /// Spleen 12x24
    Large,
}

impl From<FontSize> for SpleenSize {
    fn from(size: FontSize) -> Self {
        match size {
            FontSize::Small => SpleenSize::Small,
            FontSize::Medium => SpleenSize::Medium,
            FontSize::Large => SpleenSize::Large,
        }
    }
}

#[derive(Debug, Parser)]
#[clap(
    name = "placeholder-gen",
    about = "Generate a placeholder PNG labelled with its own dimensions"
)]
struct Args {
    /// The width of the image in pixels
    #[clap(long, default_value_t = 0, allow_negative_numbers = true)]
    width: i64,

    /// The height of the image in pixels
    #[clap(long, default_value_t = 0, allow_negative_numbers = true)]
    height: i64,

    /// Background color (e.g. grey, #FF0000)
    #[clap(long, alias = "bgColor", default_value = "grey")]
    bg_color: String,

    /// Text color (e.g. white, #00FF00)
    #[clap(long, alias = "textColor", default_value = "white")]
    text_color: String,

    /// The output filename
    #[clap(short = 'o', long, value_name = "FILE", default_value = "placeholder.png")]
    filename: PathBuf,

    /// Share of the image width the label should span, in (0, 1]
    #[clap(long, default_value_t = 0.5, value_parser = parse_fit_fraction)]
    fit_fraction: f64,

    /// Bitmap font used for the label
    #[clap(long, value_enum, default_value_t = FontSize::Small)]
    font: FontSize,

    /// JSON file with extra named colors: {"colors": {"name": "#RRGGBB"}}
    #[clap(long, value_name = "FILE")]
    color_table: Option<PathBuf>,

    /// Resolve unknown color names with CSS color syntax (e.g. orange, rgb(1, 2, 3))
    #[clap(long)]
    css_colors: bool,
}

fn parse_fit_fraction(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|_| format!("'{s}' is not a number"))?;
    if value > 0.0 && value <= 1.0 {
        Ok(value)
    } else {
        Err(format!("fit fraction must be in (0, 1], got {value}"))
    }
}

fn main() -> Result<()> {
    // RUST_LOG=debug shows the label layout
    env_logger::init();

    let args = Args::parse();

    let (width, height) = match (u32::try_from(args.width), u32::try_from(args.height)) {
        (Ok(w), Ok(h)) if w > 0 && h > 0 => (w, h),
        _ => Args::command()
            .error(
                ErrorKind::InvalidValue,
                "Width and height must be greater than 0",
            )
            .exit(),
    };

    let table = match &args.color_table {
        Some(path) => ColorTable::from_json_file(path)?,
        None => ColorTable::basic(),
    };
    let resolver = ColorResolver::new(table).with_css_fallback(args.css_colors);

    let resolve = |input: &str| {
        let resolution = resolver.resolve(input);
        if let Some(diagnostic) = &resolution.diagnostic {
            eprintln!("Warning: {diagnostic}");
        }
        resolution.color
    };
    let bg_color = resolve(&args.bg_color);
    let text_color = resolve(&args.text_color);

    let fit = FitOptions {
        fit_fraction: args.fit_fraction,
        ..FitOptions::default()
    };
    let config = PlaceholderConfig::new(width, height, bg_color, text_color, args.filename.clone())?
        .with_fit(fit);
    let font = SpleenFont::new(args.font.into())?;

    println!("Generating {}x{} placeholder...", width, height);
    generate_placeholder(&config, &font)?;
    println!(
        "✓ Placeholder image '{}' created successfully.",
        config.output().display()
    );

    Ok(())
}
