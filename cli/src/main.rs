use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use image::{Rgba, RgbaImage};
use jigsnap_core::config::PUZZLE_SIZE_RATIO;
use jigsnap_core::raster::image_from_pixmap;
use jigsnap_core::{Board, BoardConfig, IntroAnimation, OutlineFade, Piece, Point};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tiny_skia::{Color, Pixmap, PixmapPaint, Transform};

mod solver;

const FRAME_DT: f32 = 1.0 / 60.0;
const GATHER_SECONDS: f32 = 6.0;
const BACKGROUND: (u8, u8, u8) = (0x22, 0x22, 0x26);

#[derive(Parser)]
#[command(name = "jigsnap", version, about = "Headless jigsaw puzzle driver")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Shuffle a puzzle, play the intro and render the scattered pieces.
    Scatter {
        #[command(flatten)]
        puzzle: PuzzleArgs,
    },
    /// Shuffle, then drag every piece home and render the gathered result.
    Solve {
        #[command(flatten)]
        puzzle: PuzzleArgs,
        #[arg(long, default_value_t = 1.0)]
        jitter_px: f32,
    },
}

#[derive(clap::Args)]
struct PuzzleArgs {
    /// Source image; a generated pattern is used when omitted.
    #[arg(long)]
    image: Option<PathBuf>,
    /// Pieces per side.
    #[arg(long, default_value_t = 4)]
    pieces: usize,
    #[arg(long)]
    rotation: bool,
    #[arg(long, default_value_t = 1024)]
    width: u32,
    #[arg(long, default_value_t = 768)]
    height: u32,
    #[arg(long)]
    seed: Option<String>,
    /// TOML file with board tunables.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(short, long, default_value = "jigsnap.png")]
    output: PathBuf,
}

struct Session {
    board: Board,
    rng: StdRng,
    width: u32,
    height: u32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Scatter { puzzle } => {
            let mut session = start_session(&puzzle)?;
            let surface = render(&mut session, 1.0)?;
            save(&surface, &puzzle.output)?;
        }
        Commands::Solve { puzzle, jitter_px } => {
            if !jitter_px.is_finite() || jitter_px < 0.0 {
                return Err(format!("jitter must be a non-negative number, got {jitter_px}").into());
            }
            let mut session = start_session(&puzzle)?;
            let report = solver::solve(&mut session.board, &mut session.rng, jitter_px);
            println!("taps: {}", report.taps);
            println!("drags: {}", report.drags);
            println!("links: {}", report.links);
            println!("complete: {}", report.complete);
            let alpha = if report.complete {
                log::info!("puzzle complete after {} drags", report.drags);
                finish(&mut session)
            } else {
                log::warn!("puzzle left incomplete after {} drags", report.drags);
                1.0
            };
            let surface = render(&mut session, alpha)?;
            save(&surface, &puzzle.output)?;
        }
    }

    Ok(())
}

fn start_session(args: &PuzzleArgs) -> Result<Session, Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => toml::from_str::<BoardConfig>(&fs::read_to_string(path)?)?,
        None => BoardConfig::default(),
    };
    let mut rng = match args.seed.as_deref() {
        Some(raw) => StdRng::seed_from_u64(parse_seed_arg(raw)?),
        None => StdRng::from_rng(&mut rand::rng()),
    };
    let source = match &args.image {
        Some(path) => image::open(path)?.to_rgba8(),
        None => generated_image(512),
    };

    let board_rng = StdRng::from_rng(&mut rng);
    let mut board = Board::with_config(args.pieces, args.pieces, config, board_rng)?;
    board.set_size(
        args.width as f32 * PUZZLE_SIZE_RATIO,
        args.height as f32 * PUZZLE_SIZE_RATIO,
    )?;
    board.set_image(&source)?;
    board.shuffle(args.rotation);
    println!("pieces: {}", board.pieces().len());

    let mut intro = IntroAnimation::new();
    while let Some(ratio) = intro.tick(FRAME_DT) {
        board.advance_shuffle(ratio);
    }
    log::debug!("intro finished, pieces selectable: {}", intro.can_select());

    Ok(Session {
        board,
        rng,
        width: args.width,
        height: args.height,
    })
}

/// Runs the completion animation and returns the final contour alpha.
fn finish(session: &mut Session) -> f32 {
    let center = Point::new(session.width as f32 * 0.5, session.height as f32 * 0.5);
    let mut fade = OutlineFade::new();
    let mut alpha = fade.alpha();
    let frames = (GATHER_SECONDS / FRAME_DT).ceil() as usize;
    for _ in 0..frames {
        alpha = fade.tick(FRAME_DT);
        session.board.advance_completion_gather(center, FRAME_DT);
    }
    let first = session.board.piece(0).map(Piece::position);
    log::debug!("gathered first piece at {first:?}, contour alpha {alpha}");
    alpha
}

fn render(session: &mut Session, outline_alpha: f32) -> Result<Pixmap, Box<dyn std::error::Error>> {
    let mut surface = Pixmap::new(session.width, session.height).ok_or("surface size must be non-zero")?;
    let (r, g, b) = BACKGROUND;
    surface.fill(Color::from_rgba8(r, g, b, 255));
    draw_preview(&mut surface, &session.board);
    session.board.draw_all(&mut surface, outline_alpha);
    Ok(surface)
}

/// Thumbnail of the full picture in the strip kept free by the scatter.
fn draw_preview(surface: &mut Pixmap, board: &Board) {
    let Some(baked) = board.layout().baked() else {
        return;
    };
    let layout = board.layout();
    let strip = layout.config().preview_strip_ratio * layout.width().min(layout.height());
    if strip < 1.0 || baked.width() == 0 {
        return;
    }
    let scale = strip / baked.width() as f32;
    surface.draw_pixmap(
        0,
        0,
        baked.as_ref(),
        &PixmapPaint::default(),
        Transform::from_scale(scale, scale),
        None,
    );
}

fn save(surface: &Pixmap, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    image_from_pixmap(surface).save(path)?;
    println!("output: {}", path.display());
    Ok(())
}

/// Diagonal gradient with a checker overlay so every piece looks different.
fn generated_image(size: u32) -> RgbaImage {
    let cell = (size / 8).max(1);
    RgbaImage::from_fn(size, size, |x, y| {
        let r = (x * 255 / size) as u8;
        let b = (y * 255 / size) as u8;
        let g = if (x / cell + y / cell) % 2 == 0 { 180 } else { 60 };
        Rgba([r, g, b, 255])
    })
}

fn parse_seed_arg(raw: &str) -> Result<u64, Box<dyn std::error::Error>> {
    let trimmed = raw.trim();
    let value = if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X"))
    {
        u64::from_str_radix(hex, 16)?
    } else {
        trimmed.parse::<u64>()?
    };
    Ok(value)
}
