use fitstream::{Card, CardValue, ImageBuffer};
use std::process;

fn format_value(value: &CardValue) -> String {
    match value {
        CardValue::Logical(true) => "T".to_string(),
        CardValue::Logical(false) => "F".to_string(),
        CardValue::Integer(n) => n.to_string(),
        CardValue::Float(f) => format!("{}", f),
        CardValue::Text(s) => format!("'{}'", s),
        CardValue::Complex(re, im) => format!("({}, {})", re, im),
        CardValue::Blank => String::new(),
    }
}

fn format_cards(cards: &[Card]) -> String {
    let mut out = String::new();
    for card in cards {
        match (&card.value, &card.comment) {
            (CardValue::Blank, Some(comment)) => {
                out.push_str(&format!("{:<8} {}\n", card.name_str(), comment));
            }
            (CardValue::Blank, None) => {
                out.push_str(&format!("{}\n", card.name_str()));
            }
            (value, Some(comment)) => {
                out.push_str(&format!(
                    "{:<8} = {} / {}\n",
                    card.name_str(),
                    format_value(value),
                    comment
                ));
            }
            (value, None) => {
                out.push_str(&format!("{:<8} = {}\n", card.name_str(), format_value(value)));
            }
        }
    }
    out
}

fn format_summary(path: &str, image: &ImageBuffer) -> String {
    format!(
        "{}: {}x{} {}, {} bytes of pixel data\n",
        path,
        image.width(),
        image.height(),
        image.pixel_type().name(),
        image.byte_len()
    )
}

fn run(args: &[String]) -> Result<String, String> {
    let mut summary_only = false;
    let mut file_path = None;

    for arg in args {
        if arg == "-s" || arg == "--summary" {
            summary_only = true;
        } else if arg.starts_with('-') {
            return Err(format!("Unknown option: {}", arg));
        } else {
            if file_path.is_some() {
                return Err("Too many arguments".to_string());
            }
            file_path = Some(arg.as_str());
        }
    }

    let path = file_path.ok_or_else(|| {
        "Usage: fitshead [-s] <file.fits>\n\nPrint the header cards of a FITS image file."
            .to_string()
    })?;

    let (image, cards) = fitstream::stream::read_image_from_path(path)
        .map_err(|e| format!("Error reading '{}': {}", path, e))?;

    let mut out = format_summary(path, &image);
    if !summary_only {
        out.push_str(&format_cards(&cards));
    }
    Ok(out)
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
