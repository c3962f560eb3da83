use anyhow::{Context, Result};
use image::io::Reader as ImageReader;

fn main() -> Result<()> {
    let Some(path) = std::env::args().nth(1) else {
        eprintln!("Usage: inspect-placeholder <IMAGE>");
        std::process::exit(2);
    };

    let img = ImageReader::open(&path)
        .with_context(|| format!("Failed to open image {path}"))?
        .decode()
        .context("Failed to decode image")?;

    let rgba_img = img.to_rgba8();
    let width = img.width();
    let height = img.height();

    // The corner is always background unless the label overflows the canvas
    let background = *rgba_img.get_pixel(0, 0);

    println!("Checking placeholder: {}", path);
    println!("Image dimensions: {}x{}", width, height);
    println!(
        "Background pixel: RGBA [{}, {}, {}, {}]",
        background[0], background[1], background[2], background[3]
    );

    let mut ink: Option<(u32, u32, u32, u32)> = None;
    for (x, y, pixel) in rgba_img.enumerate_pixels() {
        if *pixel == background {
            continue;
        }
        ink = Some(match ink {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }

    let Some((x0, y0, x1, y1)) = ink else {
        println!("⚠ No label ink found");
        return Ok(());
    };

    let ink_width = x1 - x0 + 1;
    let ink_height = y1 - y0 + 1;
    println!("\nLabel analysis:");
    println!(
        "  Ink box: x={}..={}, y={}..={} ({}x{})",
        x0, x1, y0, y1, ink_width, ink_height
    );
    println!(
        "  Ink spans {:.1}% of the image width",
        100.0 * ink_width as f64 / width as f64
    );

    let offset_x = (x0 + x1) as f64 / 2.0 - (width as f64 - 1.0) / 2.0;
    let offset_y = (y0 + y1) as f64 / 2.0 - (height as f64 - 1.0) / 2.0;
    println!("  Ink center offset: ({:+.1}, {:+.1})", offset_x, offset_y);

    if offset_x.abs() <= 2.0 && offset_y.abs() <= 2.0 {
        println!("✓ Label is centered");
    } else {
        println!("⚠ Label may be off-center");
    }

    Ok(())
}
