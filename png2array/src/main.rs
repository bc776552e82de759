use std::env;
use std::fmt::Write as _;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use image::RgbaImage;
use log::info;

const DEFAULT_WIDTH: u32 = 80;
const DEFAULT_HEIGHT: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Rgb565,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    /// Raw little-endian RGB565, ready for `include_bytes!`
    Bin,
    /// Rust source with a word-aligned byte array
    Txt,
}

#[derive(Debug)]
struct Options {
    mode: Mode,
    format: Format,
    width: u32,
    height: u32,
    output: Option<PathBuf>,
    inputs: Vec<PathBuf>,
}

fn usage() -> ! {
    eprintln!(
        "Usage:\n  png2array [-m rgb565] [-f txt|bin] [--size WxH] [-o output] <page.png>...\n\nEach input is one page; pages are written in the order given.\nDefaults: -m rgb565 -f txt --size {DEFAULT_WIDTH}x{DEFAULT_HEIGHT}, output to stdout"
    );
    std::process::exit(2);
}

fn parse_size(value: &str) -> Option<(u32, u32)> {
    let (w, h) = value.split_once('x')?;
    Some((w.parse().ok()?, h.parse().ok()?))
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Option<Options> {
    let mut options = Options {
        mode: Mode::Rgb565,
        format: Format::Txt,
        width: DEFAULT_WIDTH,
        height: DEFAULT_HEIGHT,
        output: None,
        inputs: Vec::new(),
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-m" => {
                options.mode = match args.next()?.as_str() {
                    "rgb565" => Mode::Rgb565,
                    _ => return None,
                };
            }
            "-f" => {
                options.format = match args.next()?.as_str() {
                    "bin" => Format::Bin,
                    "txt" => Format::Txt,
                    _ => return None,
                };
            }
            "--size" => {
                let (w, h) = parse_size(&args.next()?)?;
                options.width = w;
                options.height = h;
            }
            "-o" => options.output = Some(PathBuf::from(args.next()?)),
            _ if arg.starts_with('-') => return None,
            _ => options.inputs.push(PathBuf::from(arg)),
        }
    }

    if options.inputs.is_empty() {
        return None;
    }
    Some(options)
}

/// Scale a colour channel by alpha, so transparent pixels come out black
fn premultiply(channel: u8, alpha: u8) -> u8 {
    (u16::from(channel) * u16::from(alpha) / 255) as u8
}

/// Convert one page to little-endian RGB565 bytes
fn encode_page(image: &RgbaImage) -> Vec<u8> {
    image
        .pixels()
        .flat_map(|p| {
            let [r, g, b, a] = p.0;
            pager::rgb565(premultiply(r, a), premultiply(g, a), premultiply(b, a)).to_le_bytes()
        })
        .collect()
}

fn load_page(path: &Path, width: u32, height: u32) -> Result<Vec<u8>> {
    let image = image::open(path)
        .with_context(|| format!("failed to decode '{}'", path.display()))?
        .to_rgba8();
    if image.dimensions() != (width, height) {
        bail!(
            "'{}' is {}x{}, expected {}x{}",
            path.display(),
            image.width(),
            image.height(),
            width,
            height
        );
    }
    Ok(encode_page(&image))
}

/// Name of the generated static, taken from the output (or first input) file
fn array_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("pages");
    let name: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{name}")
    } else {
        name
    }
}

fn render_txt(name: &str, bytes: &[u8], width: u32) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "// Generated by png2array, do not edit");
    let _ = writeln!(out, "#[repr(C, align(4))]");
    let _ = writeln!(out, "pub struct Aligned<T: ?Sized>(pub T);");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "pub static {name}: Aligned<[u8; {}]> = Aligned([",
        bytes.len()
    );
    // one image row per source line
    for row in bytes.chunks(width as usize * pager::image::PIXEL_BYTES) {
        out.push_str("   ");
        for b in row {
            let _ = write!(out, " 0x{b:02x},");
        }
        out.push('\n');
    }
    let _ = writeln!(out, "]);");
    out
}

fn run(options: &Options) -> Result<()> {
    info!(
        "mode {:?}, format {:?}, {}x{} pixels, {} page(s)",
        options.mode,
        options.format,
        options.width,
        options.height,
        options.inputs.len()
    );

    let mut bytes = Vec::new();
    for input in &options.inputs {
        bytes.extend(load_page(input, options.width, options.height)?);
        info!("encoded '{}'", input.display());
    }

    let rendered = match options.format {
        Format::Bin => bytes,
        Format::Txt => {
            let name_source = options.output.as_deref().unwrap_or(&options.inputs[0]);
            render_txt(&array_name(name_source), &bytes, options.width).into_bytes()
        }
    };

    match &options.output {
        Some(path) => fs::write(path, &rendered)
            .with_context(|| format!("failed to write '{}'", path.display()))?,
        None => io::stdout()
            .write_all(&rendered)
            .context("failed to write to stdout")?,
    }
    info!("wrote {} bytes", rendered.len());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let Some(options) = parse_args(env::args().skip(1)) else {
        usage();
    };
    run(&options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn test_parse_args_defaults() {
        let options = parse_args(args(&["a.png", "b.png"])).unwrap();
        assert_eq!(options.mode, Mode::Rgb565);
        assert_eq!(options.format, Format::Txt);
        assert_eq!((options.width, options.height), (80, 60));
        assert_eq!(options.inputs.len(), 2);
        assert!(options.output.is_none());
    }

    #[test]
    fn test_parse_args_flags() {
        let options = parse_args(args(&[
            "-m", "rgb565", "-f", "bin", "--size", "4x2", "-o", "out.bin", "a.png",
        ]))
        .unwrap();
        assert_eq!(options.mode, Mode::Rgb565);
        assert_eq!(options.format, Format::Bin);
        assert_eq!((options.width, options.height), (4, 2));
        assert_eq!(options.output, Some(PathBuf::from("out.bin")));
    }

    #[test]
    fn test_parse_args_rejects_bad_input() {
        assert!(parse_args(args(&[])).is_none());
        assert!(parse_args(args(&["-f", "jpeg", "a.png"])).is_none());
        assert!(parse_args(args(&["-m", "rgb888", "a.png"])).is_none());
        assert!(parse_args(args(&["--size", "80", "a.png"])).is_none());
        assert!(parse_args(args(&["-x", "a.png"])).is_none());
    }

    #[test]
    fn test_encode_page_row_major_little_endian() {
        let mut image = RgbaImage::new(2, 1);
        image.put_pixel(0, 0, Rgba([0xFF, 0, 0, 0xFF]));
        image.put_pixel(1, 0, Rgba([0, 0, 0xFF, 0xFF]));
        assert_eq!(encode_page(&image), [0x00, 0xF8, 0x1F, 0x00]);
    }

    #[test]
    fn test_encode_page_premultiplies_alpha() {
        let mut image = RgbaImage::new(2, 1);
        image.put_pixel(0, 0, Rgba([0xFF, 0xFF, 0xFF, 0]));
        image.put_pixel(1, 0, Rgba([0xFF, 0xFF, 0xFF, 0x80]));
        let half = pager::rgb565(0x80, 0x80, 0x80).to_le_bytes();
        assert_eq!(encode_page(&image), [0x00, 0x00, half[0], half[1]]);
    }

    #[test]
    fn test_load_page_transparent_pixel_is_black() {
        let name = format!("png2array-{}-transparent.png", std::process::id());
        let path = env::temp_dir().join(name);
        RgbaImage::from_pixel(1, 1, Rgba([0xFF, 0xFF, 0xFF, 0]))
            .save(&path)
            .unwrap();

        let encoded = load_page(&path, 1, 1);
        let mismatch = load_page(&path, 2, 1);
        let _ = fs::remove_file(&path);

        assert_eq!(encoded.unwrap(), [0x00, 0x00]);
        assert!(mismatch.is_err());
    }

    #[test]
    fn test_array_name() {
        assert_eq!(array_name(Path::new("assets/pages.bin")), "PAGES");
        assert_eq!(array_name(Path::new("page-1.png")), "PAGE_1");
        assert_eq!(array_name(Path::new("0.png")), "_0");
    }

    #[test]
    fn test_render_txt_splits_rows() {
        let text = render_txt("PAGES", &[1, 2, 3, 4, 5, 6, 7, 8], 2);
        assert!(text.contains("pub static PAGES: Aligned<[u8; 8]>"));
        assert!(text.contains("    0x01, 0x02, 0x03, 0x04,\n    0x05, 0x06, 0x07, 0x08,\n"));
        assert!(text.ends_with("]);\n"));
    }
}
