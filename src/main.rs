use clap::{Parser, Subcommand, ValueEnum};
use docscan::{CoordsOrderer, DocScanner, Effect, GlobalConfig, Point2f, Shape};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "docscan")]
#[command(about = "docscan - find a document in a photo and flatten it", long_about = None)]
struct Cli {
    /// JSON file with detector, effect and output settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log progress at info level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the four document corners
    Detect {
        /// Input image path
        image: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// Detect (or take) the corners, rectify and write the page
    Scan {
        /// Input image path
        image: PathBuf,

        /// Output image path
        #[arg(short, long)]
        output: PathBuf,

        /// Corners as x1,y1,x2,y2,x3,y3,x4,y4 in any order
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        corners: Option<Vec<f32>>,

        #[arg(long, value_enum, default_value_t = EffectArg::None)]
        effect: EffectArg,

        #[arg(long, requires = "max_height")]
        max_width: Option<u32>,

        #[arg(long, requires = "max_width")]
        max_height: Option<u32>,

        /// Clockwise rotation applied before detection, multiple of 90
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        rotate: i32,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum OutputFormat {
    /// JSON object with the four named corners
    Json,
    /// One corner per line: role x y
    Text,
    /// TSV format: x1\ty1\t...\tx4\ty4 (TL, TR, BL, BR)
    Tsv,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum EffectArg {
    None,
    Grayscale,
    Binary,
    Adaptive,
}

impl From<EffectArg> for Effect {
    fn from(e: EffectArg) -> Self {
        match e {
            EffectArg::None => Effect::None,
            EffectArg::Grayscale => Effect::Grayscale,
            EffectArg::Binary => Effect::Binary,
            EffectArg::Adaptive => Effect::Adaptive,
        }
    }
}

fn print_shape(shape: &Shape, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(shape)?);
        }
        OutputFormat::Text => {
            println!("top_left {} {}", shape.top_left.x, shape.top_left.y);
            println!("top_right {} {}", shape.top_right.x, shape.top_right.y);
            println!("bottom_left {} {}", shape.bottom_left.x, shape.bottom_left.y);
            println!("bottom_right {} {}", shape.bottom_right.x, shape.bottom_right.y);
        }
        OutputFormat::Tsv => {
            let fields: Vec<String> = shape
                .to_points()
                .iter()
                .map(|p| format!("{:.1}\t{:.1}", p.x, p.y))
                .collect();
            println!("{}", fields.join("\t"));
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => GlobalConfig::from_json_file(path)?,
        None => GlobalConfig::default(),
    };

    match cli.command {
        Command::Detect { image, format } => {
            let scanner = DocScanner::new(config);
            let img = docscan::imread(&image)?;
            let shape = scanner.detect(&img)?;
            print_shape(&shape, format)?;
        }
        Command::Scan {
            image,
            output,
            corners,
            effect,
            max_width,
            max_height,
            rotate,
        } => {
            if let (Some(w), Some(h)) = (max_width, max_height) {
                config.output.max_width = Some(w);
                config.output.max_height = Some(h);
            }
            let scanner = DocScanner::new(config);

            let img = docscan::ImageRequest::builder()
                .source(docscan::Source::File(image))
                .rotate(rotate)
                .build()?
                .load()?;

            let shape = match corners {
                Some(c) => {
                    if c.len() != 8 {
                        return Err(format!("expected 8 corner values, got {}", c.len()).into());
                    }
                    let points: Vec<Point2f> =
                        c.chunks(2).map(|xy| Point2f::new(xy[0], xy[1])).collect();
                    docscan::CentroidOrderer
                        .order(&points)
                        .ok_or("corners do not form a quadrilateral")?
                }
                None => scanner.detect(&img)?,
            };

            let page = scanner.scan(&img, &shape)?;
            let page = scanner.apply_effect(&page, effect.into())?;
            docscan::imwrite(&output, &page)?;
            eprintln!(
                "{} -> {} ({}x{})",
                shape,
                output.display(),
                page.cols(),
                page.rows()
            );
        }
    }

    Ok(())
}
