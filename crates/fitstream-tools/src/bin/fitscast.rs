use fitstream::{Card, ImageBuffer, PixelType};
use std::process;

const USAGE: &str = "\
Usage: fitscast <input.fits> <type> <output.fits>

Re-encode a FITS image file with a different pixel type.
Types: u8, i16, u16, i32, u32, f32, f64.
Values are widened to f64 and cast back with saturation.";

/// Cast every pixel to the target type through `f64`.
///
/// Uses Rust's saturating float-to-int casts, so out-of-range values clamp
/// to the target's bounds instead of wrapping.
fn cast_image(image: &ImageBuffer, ty: PixelType) -> ImageBuffer {
    let (width, height) = (image.width(), image.height());
    let mut values = Vec::with_capacity(image.len());
    for row in 0..height {
        for col in 0..width {
            values.push(image.value_at(row, col).unwrap_or(0.0));
        }
    }

    let built = match ty {
        PixelType::U8 => ImageBuffer::from_pixels(
            values.iter().map(|&v| v as u8).collect::<Vec<_>>(),
            width,
            height,
        ),
        PixelType::I16 => ImageBuffer::from_pixels(
            values.iter().map(|&v| v as i16).collect::<Vec<_>>(),
            width,
            height,
        ),
        PixelType::U16 => ImageBuffer::from_pixels(
            values.iter().map(|&v| v as u16).collect::<Vec<_>>(),
            width,
            height,
        ),
        PixelType::I32 => ImageBuffer::from_pixels(
            values.iter().map(|&v| v as i32).collect::<Vec<_>>(),
            width,
            height,
        ),
        PixelType::U32 => ImageBuffer::from_pixels(
            values.iter().map(|&v| v as u32).collect::<Vec<_>>(),
            width,
            height,
        ),
        PixelType::F32 => ImageBuffer::from_pixels(
            values.iter().map(|&v| v as f32).collect::<Vec<_>>(),
            width,
            height,
        ),
        PixelType::F64 => ImageBuffer::from_pixels(values, width, height),
    };
    // Geometry and length come from a valid source image.
    built.unwrap_or_else(|_| image.clone())
}

fn numeric_card(cards: &[Card], name: &str) -> Option<f64> {
    let card = cards.iter().find(|c| c.name_str() == name)?;
    card.integer().map(|n| n as f64).or_else(|| card.float())
}

/// True when BSCALE/BZERO carry real physical scaling, beyond the BZERO
/// offset convention the writer regenerates for unsigned types. Such
/// scaling must be folded into the cast or the output would silently keep
/// raw values with the scaling cards dropped.
fn has_physical_scaling(ty: PixelType, cards: &[Card]) -> bool {
    let bscale = numeric_card(cards, "BSCALE").unwrap_or(1.0);
    let bzero = numeric_card(cards, "BZERO").unwrap_or(0.0);
    let convention = ty.bzero().map_or(0.0, |z| z as f64);
    bscale != 1.0 || bzero != convention
}

/// Keep caller cards that the writer does not regenerate itself.
fn carried_cards(cards: &[Card]) -> Vec<Card> {
    const REGENERATED: [&str; 7] = [
        "SIMPLE", "BITPIX", "NAXIS", "NAXIS1", "NAXIS2", "BZERO", "BSCALE",
    ];
    cards
        .iter()
        .filter(|c| !REGENERATED.contains(&c.name_str()))
        .cloned()
        .collect()
}

fn run(args: &[String]) -> Result<String, String> {
    if args.len() != 3 {
        return Err(USAGE.to_string());
    }
    let input = &args[0];
    let ty: PixelType = args[1]
        .parse()
        .map_err(|_| format!("Unknown pixel type '{}'\n\n{}", args[1], USAGE))?;
    let output = &args[2];

    let (image, cards) = fitstream::stream::read_image_from_path(input)
        .map_err(|e| format!("Error reading '{}': {}", input, e))?;

    // Scaled files are cast on their physical values, not the raw ones.
    let source_ty = image.pixel_type();
    let source = if has_physical_scaling(source_ty, &cards) {
        let file = std::fs::File::open(input)
            .map_err(|e| format!("Error reading '{}': {}", input, e))?;
        let (physical, _) =
            fitstream::stream::read_image_physical(&mut std::io::BufReader::new(file))
                .map_err(|e| format!("Error reading '{}': {}", input, e))?;
        physical
    } else {
        image
    };

    let cast = cast_image(&source, ty);
    let extras = carried_cards(&cards);
    fitstream::stream::write_image_to_path(output, &cast, &extras)
        .map_err(|e| format!("Error writing '{}': {}", output, e))?;

    Ok(format!(
        "{} ({}) -> {} ({})\n",
        input,
        source_ty.name(),
        output,
        ty.name()
    ))
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(output) => print!("{}", output),
        Err(msg) => {
            eprintln!("{}", msg);
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitstream::CardValue;

    #[test]
    fn cast_widens_and_narrows() {
        let image = ImageBuffer::from_pixels(vec![0i16, 100, -5, 3000], 2, 2).unwrap();

        let wide = cast_image(&image, PixelType::F64);
        assert_eq!(wide.pixel_type(), PixelType::F64);
        assert_eq!(wide.value_at(1, 1), Some(3000.0));

        let narrow = cast_image(&image, PixelType::U8);
        assert_eq!(narrow.pixel_type(), PixelType::U8);
        assert_eq!(narrow.value_at(0, 1), Some(100.0));
        // Saturating casts clamp instead of wrapping.
        assert_eq!(narrow.value_at(1, 0), Some(0.0));
        assert_eq!(narrow.value_at(1, 1), Some(255.0));
    }

    #[test]
    fn carried_cards_drop_regenerated_keywords() {
        let cards = vec![
            Card::new("SIMPLE", CardValue::Logical(true)).unwrap(),
            Card::new("BITPIX", CardValue::Integer(16)).unwrap(),
            Card::new("EXPTIME", CardValue::Float(1.0)).unwrap(),
            Card::with_comment("COMMENT", CardValue::Blank, "keep me").unwrap(),
        ];
        let carried = carried_cards(&cards);
        let names: Vec<&str> = carried.iter().map(|c| c.name_str()).collect();
        assert_eq!(names, ["EXPTIME", "COMMENT"]);
    }

    #[test]
    fn scaling_detection_ignores_the_unsigned_convention() {
        let plain = [Card::new("BITPIX", CardValue::Integer(16)).unwrap()];
        assert!(!has_physical_scaling(PixelType::I16, &plain));

        // BZERO=32768 on a u16 image is the writer's own convention.
        let convention = [Card::new("BZERO", CardValue::Integer(32768)).unwrap()];
        assert!(!has_physical_scaling(PixelType::U16, &convention));
        // The same card on a signed image is real scaling.
        assert!(has_physical_scaling(PixelType::I16, &convention));

        let scaled = [Card::new("BSCALE", CardValue::Float(0.5)).unwrap()];
        assert!(has_physical_scaling(PixelType::I16, &scaled));
    }

    #[test]
    fn run_folds_physical_scaling_into_the_cast() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("scaled.fits");
        let output = dir.path().join("out.fits");

        let image = ImageBuffer::from_pixels(vec![100i16, 200, 300, 400], 2, 2).unwrap();
        let extras = [
            Card::new("BSCALE", CardValue::Float(0.5)).unwrap(),
            Card::new("BZERO", CardValue::Integer(1000)).unwrap(),
        ];
        fitstream::stream::write_image_to_path(&input, &image, &extras).unwrap();

        let args = vec![
            input.to_str().unwrap().to_string(),
            "f64".to_string(),
            output.to_str().unwrap().to_string(),
        ];
        run(&args).unwrap();

        let (cast, cards) = fitstream::stream::read_image_from_path(&output).unwrap();
        assert_eq!(cast.pixel_type(), PixelType::F64);
        // physical = 1000 + 0.5 * raw, not the raw values.
        assert_eq!(cast.value_at(0, 0), Some(1050.0));
        assert_eq!(cast.value_at(1, 1), Some(1200.0));
        // The consumed scaling cards are not carried into the output.
        assert!(cards.iter().all(|c| c.name_str() != "BSCALE"));
        assert!(cards.iter().all(|c| c.name_str() != "BZERO"));
    }

    #[test]
    fn run_requires_three_args() {
        assert!(run(&[]).unwrap_err().contains("Usage:"));
        assert!(run(&["a.fits".to_string()]).unwrap_err().contains("Usage:"));
    }

    #[test]
    fn run_rejects_unknown_type() {
        let args = vec![
            "in.fits".to_string(),
            "i64".to_string(),
            "out.fits".to_string(),
        ];
        assert!(run(&args).unwrap_err().contains("Unknown pixel type"));
    }

    #[test]
    fn run_converts_a_real_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.fits");
        let output = dir.path().join("out.fits");

        let image = ImageBuffer::from_pixels(vec![7u16; 16], 4, 4).unwrap();
        let extras = [Card::new("EXPTIME", CardValue::Float(2.0)).unwrap()];
        fitstream::stream::write_image_to_path(&input, &image, &extras).unwrap();

        let args = vec![
            input.to_str().unwrap().to_string(),
            "f32".to_string(),
            output.to_str().unwrap().to_string(),
        ];
        let msg = run(&args).unwrap();
        assert!(msg.contains("(u16) ->"));
        assert!(msg.contains("(f32)"));

        let (cast, cards) = fitstream::stream::read_image_from_path(&output).unwrap();
        assert_eq!(cast.pixel_type(), PixelType::F32);
        assert_eq!(cast.value_at(0, 0), Some(7.0));
        assert!(cards.iter().any(|c| c.name_str() == "EXPTIME"));
    }
}
