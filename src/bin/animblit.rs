use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

use animblit::{
    Blitter, BlitterMode, BlitterParams, BlitterSettings, Colour, EncodedSprite, Palette,
    RemapTable, Screen, SourceSprite, SpriteCollection, SpriteEncoder, ZoomLevel,
};

#[derive(Parser, Debug)]
#[command(name = "animblit", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode a PNG into a sprite blob.
    Encode(EncodeArgs),
    /// Print a sprite blob's metadata as JSON.
    Info(InfoArgs),
    /// Draw a sprite blob onto a blank screen and write the presented frame.
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct EncodeArgs {
    /// Input RGBA PNG.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Greyscale PNG whose values are per-pixel remap indices.
    #[arg(long)]
    mask: Option<PathBuf>,

    /// Output sprite blob.
    #[arg(long)]
    out: PathBuf,

    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    x_offs: i32,

    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    y_offs: i32,
}

#[derive(Parser, Debug)]
struct InfoArgs {
    /// Sprite blob to inspect.
    #[arg(long)]
    sprite: PathBuf,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Sprite blob to draw.
    #[arg(long)]
    sprite: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[arg(long, default_value_t = 64)]
    width: usize,

    #[arg(long, default_value_t = 64)]
    height: usize,

    /// Screen column of the sprite's top-left corner.
    #[arg(long, default_value_t = 0)]
    x: usize,

    /// Screen row of the sprite's top-left corner.
    #[arg(long, default_value_t = 0)]
    y: usize,

    #[arg(long, value_enum, default_value_t = ModeChoice::Normal)]
    mode: ModeChoice,

    /// Palette JSON (`[[r, g, b], ...]`, 256 entries). Built-in palette otherwise.
    #[arg(long)]
    palette: Option<PathBuf>,

    /// Remap source indices, paired with `--remap-to`.
    #[arg(long, value_delimiter = ',')]
    remap_from: Vec<u8>,

    #[arg(long, value_delimiter = ',')]
    remap_to: Vec<u8>,

    /// Draw on the RGB-only path.
    #[arg(long)]
    no_anim: bool,

    /// Palette index the screen is filled with before drawing.
    #[arg(long)]
    background: Option<u8>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeChoice {
    Normal,
    ColourRemap,
    Transparent,
    TransparentRemap,
    CrashRemap,
    BlackRemap,
}

impl From<ModeChoice> for BlitterMode {
    fn from(m: ModeChoice) -> Self {
        match m {
            ModeChoice::Normal => Self::Normal,
            ModeChoice::ColourRemap => Self::ColourRemap,
            ModeChoice::Transparent => Self::Transparent,
            ModeChoice::TransparentRemap => Self::TransparentRemap,
            ModeChoice::CrashRemap => Self::CrashRemap,
            ModeChoice::BlackRemap => Self::BlackRemap,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Encode(args) => cmd_encode(args),
        Command::Info(args) => cmd_info(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn cmd_encode(args: EncodeArgs) -> anyhow::Result<()> {
    let img = image::open(&args.in_path)
        .with_context(|| format!("open image '{}'", args.in_path.display()))?
        .to_rgba8();
    let mask = match &args.mask {
        Some(p) => Some(
            image::open(p)
                .with_context(|| format!("open mask '{}'", p.display()))?
                .to_luma8(),
        ),
        None => None,
    };

    let src = SourceSprite::from_rgba_image(&img, mask.as_ref())?.with_offsets(args.x_offs, args.y_offs);
    let sprite = SpriteEncoder::new().encode(&SpriteCollection::single(ZoomLevel::Normal, src))?;

    create_parent_dir(&args.out)?;
    std::fs::write(&args.out, sprite.to_bytes())
        .with_context(|| format!("write sprite '{}'", args.out.display()))?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_info(args: InfoArgs) -> anyhow::Result<()> {
    let sprite = read_sprite(&args.sprite)?;
    let levels: Vec<_> = sprite
        .zoom_levels()
        .filter_map(|z| sprite.level(z).map(|l| (z, l)))
        .map(|(z, l)| {
            serde_json::json!({
                "zoom": z,
                "width": l.width,
                "height": l.height,
                "colour_bytes": l.px_len,
                "index_bytes": l.n_len,
            })
        })
        .collect();
    let info = serde_json::json!({
        "width": sprite.width(),
        "height": sprite.height(),
        "x_offs": sprite.x_offs(),
        "y_offs": sprite.y_offs(),
        "flags": sprite.flags().bits(),
        "levels": levels,
    });
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let sprite = read_sprite(&args.sprite)?;
    let palette = match &args.palette {
        Some(p) => Palette::load_json(p)?,
        None => Palette::default(),
    };
    let remap = RemapTable::with_mapping(&args.remap_from, &args.remap_to)?;

    let mut settings = BlitterSettings::from_env();
    settings.disable_anim |= args.no_anim;

    let mut screen = Screen::new(args.width, args.height)?;
    if let Some(bg) = args.background {
        screen.clear(palette.lookup(bg));
    } else {
        screen.clear(Colour::BLACK);
    }

    let zoom = sprite
        .zoom_levels()
        .next()
        .context("sprite has no zoom levels")?;
    let bp = BlitterParams::whole(&sprite, zoom, args.x, args.y)?.with_remap(&remap);
    let blitter = Blitter::new(&palette, &settings);
    blitter
        .draw(&mut screen, &bp, args.mode.into(), zoom)
        .with_context(|| format!("draw sprite at ({}, {})", args.x, args.y))?;

    create_parent_dir(&args.out)?;
    screen
        .to_rgba_image(&palette)?
        .save(&args.out)
        .with_context(|| format!("write png '{}'", args.out.display()))?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn read_sprite(path: &Path) -> anyhow::Result<EncodedSprite> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read sprite '{}'", path.display()))?;
    EncodedSprite::from_bytes(&bytes).with_context(|| format!("decode sprite '{}'", path.display()))
}

fn create_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}
