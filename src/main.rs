use clap::{Parser, Subcommand};
use face_builder::imaging::rust_backend::supported_output_extensions;
use face_builder::imaging::{ImageBackend, RustBackend};
use face_builder::{FaceBuilder, Selection, config, output};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Shared flags for commands that write a portrait.
#[derive(clap::Args, Clone)]
struct OutputArgs {
    /// Where to write the composited PNG
    #[arg(short, long, default_value = "face.png", value_parser = parse_output_path)]
    output: PathBuf,
}

#[derive(Parser)]
#[command(name = "face-builder")]
#[command(about = "Composite character portraits from layered part images")]
#[command(long_about = "\
Composite character portraits from layered part images

Every image in the layers directory is one variant of one part category. The
category is a token of the file name: with the default settings
face_eyes2.png is the second 'eyes' variant. A face takes one variant per
category and paints them bottom to top in the order given by the definition.

Layers directory:

  layers/
  ├── face-builder.toml            # Naming rules, seed, workers (optional)
  ├── face_definition.json         # {\"order\": [\"head\", \"eyes\", ...]} (optional)
  ├── face_head1.png               # head 0
  ├── face_head1.png.import        # Import sidecar, ignored
  ├── face_head2.png               # head 1
  ├── face_eyes1.ase_layer_tex.png # eyes 0 (marker stripped)
  └── face_eyes2.png               # eyes 1

All layers must share one size. Without a definition, random faces stack
categories in file-name order and explicit selections produce nothing.

Run 'face-builder gen-config' to generate a documented face-builder.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Layers directory
    #[arg(long, default_value = "layers", global = true)]
    layers: PathBuf,

    /// Log more (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Pick one random variant per category and composite them
    Random {
        #[command(flatten)]
        out: OutputArgs,
        /// RNG seed (overrides [render] seed)
        #[arg(long)]
        seed: Option<u64>,
        /// Save the chosen indices as JSON for `compose --selection`
        #[arg(long)]
        selection_out: Option<PathBuf>,
    },
    /// Composite explicitly chosen variants
    Compose {
        #[command(flatten)]
        out: OutputArgs,
        /// Variant to use, as category=index (repeatable)
        #[arg(long = "select", value_name = "CATEGORY=INDEX", value_parser = parse_select)]
        select: Vec<(String, usize)>,
        /// Start from a selection saved by `random --selection-out`
        #[arg(long)]
        selection: Option<PathBuf>,
    },
    /// List categories, their indexed variants, and the stacking order
    Parts,
    /// Print a stock face-builder.toml with all options documented
    GenConfig,
}

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Random {
            out,
            seed,
            selection_out,
        } => {
            run_random(&cli.layers, seed, &out.output, selection_out.as_deref())?;
        }
        Command::Compose {
            out,
            select,
            selection,
        } => {
            run_compose(&cli.layers, select, selection.as_deref(), &out.output)?;
        }
        Command::Parts => {
            let (_, builder) = open_layers(&cli.layers)?;
            output::print_parts_output(&builder);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Build a random face, write it, and optionally save the selection.
/// Returns the recorded selection.
fn run_random(
    layers: &Path,
    seed: Option<u64>,
    output_path: &Path,
    selection_out: Option<&Path>,
) -> Result<Selection, Box<dyn std::error::Error>> {
    let (face_config, mut builder) = open_layers(layers)?;
    let mut rng = match config::effective_seed(seed, &face_config.render) {
        Some(seed) => {
            info!(seed, "Using fixed seed");
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_entropy(),
    };
    let face = builder.build_random_face(&mut rng)?;
    output::print_selection_output(&builder, builder.current_selection());
    save_face(face.as_ref(), output_path)?;

    if let Some(path) = selection_out {
        write_selection(path, builder.current_selection())?;
        println!("Selection → {}", path.display());
    }
    Ok(builder.current_selection().clone())
}

/// Build a face from a saved selection overlaid with `--select` entries.
fn run_compose(
    layers: &Path,
    select: Vec<(String, usize)>,
    selection: Option<&Path>,
    output_path: &Path,
) -> Result<Selection, Box<dyn std::error::Error>> {
    let (_, builder) = open_layers(layers)?;
    let mut chosen = match selection {
        Some(path) => read_selection(path)?,
        None => Selection::new(),
    };
    chosen.merge(select.into_iter().collect());
    debug!(?chosen, "Composing selection");

    let face = builder.build_face_by_indices(&chosen)?;
    output::print_selection_output(&builder, &chosen);
    save_face(face.as_ref(), output_path)?;
    Ok(chosen)
}

fn write_selection(path: &Path, selection: &Selection) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(selection)?;
    std::fs::write(path, json)?;
    Ok(())
}

fn read_selection(path: &Path) -> Result<Selection, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Load the layers directory's config, size the worker pool, and scan.
fn open_layers(
    layers: &Path,
) -> Result<(config::FaceConfig, FaceBuilder), Box<dyn std::error::Error>> {
    let face_config = config::load_config(layers)?;
    init_thread_pool(&face_config.processing);
    let builder = FaceBuilder::from_config(layers, &face_config)?;
    Ok((face_config, builder))
}

/// Write the face if there is one, and report either way.
fn save_face(
    face: Option<&face_builder::CompositeImage>,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(face) = face {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        RustBackend::new().save(face, path)?;
    }
    output::print_face_output(face, path);
    Ok(())
}

/// Accept only paths the backend can encode, before any layer is loaded.
fn parse_output_path(arg: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(arg);
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    let supported = supported_output_extensions();
    if supported.iter().any(|s| *s == ext) {
        Ok(path)
    } else {
        Err(format!(
            "unsupported output format '{ext}' (expected one of: {})",
            supported.join(", ")
        ))
    }
}

/// Parse a `category=index` argument.
fn parse_select(arg: &str) -> Result<(String, usize), String> {
    let (category, index) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected CATEGORY=INDEX, got '{arg}'"))?;
    if category.is_empty() {
        return Err(format!("missing category in '{arg}'"));
    }
    let index = index
        .parse::<usize>()
        .map_err(|e| format!("bad index in '{arg}': {e}"))?;
    Ok((category.to_string(), index))
}

/// Log to stderr so stdout stays a clean listing.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use std::fs;
    use tempfile::TempDir;

    fn write_layer(dir: &Path, name: &str, rgba: [u8; 4]) {
        RgbaImage::from_pixel(2, 2, Rgba(rgba))
            .save_with_format(dir.join(name), image::ImageFormat::Png)
            .unwrap();
    }

    /// Three heads and three eyes, so different seeds pick different faces.
    fn layers_dir() -> TempDir {
        let tmp = TempDir::new().unwrap();
        for (i, rgba) in [[255, 0, 0, 255], [0, 255, 0, 255], [0, 0, 255, 255]]
            .into_iter()
            .enumerate()
        {
            write_layer(tmp.path(), &format!("face_head{}.png", i + 1), rgba);
            write_layer(tmp.path(), &format!("face_eyes{}.png", i + 1), rgba);
        }
        fs::write(
            tmp.path().join("face_definition.json"),
            r#"{"order": ["head", "eyes"]}"#,
        )
        .unwrap();
        tmp
    }

    fn seeded_selection(layers: &Path, seed: u64) -> Selection {
        let mut builder = FaceBuilder::open(layers).unwrap();
        builder
            .build_random_face(&mut StdRng::seed_from_u64(seed))
            .unwrap();
        builder.current_selection().clone()
    }

    // =========================================================================
    // Layers directory loading
    // =========================================================================

    #[test]
    fn open_layers_without_config_uses_defaults() {
        let tmp = layers_dir();
        let (face_config, builder) = open_layers(tmp.path()).unwrap();
        assert_eq!(face_config, config::FaceConfig::default());
        assert_eq!(builder.part_counts().get("head"), Some(&3));
        assert!(builder.order().is_some());
    }

    #[test]
    fn open_layers_reads_config_file() {
        let tmp = TempDir::new().unwrap();
        write_layer(tmp.path(), "npc_elf_head1.png", [255, 0, 0, 255]);
        fs::write(
            tmp.path().join(config::CONFIG_FILENAME),
            "[parts]\ntoken_index = 2\n\n[render]\nseed = 9\n",
        )
        .unwrap();

        let (face_config, builder) = open_layers(tmp.path()).unwrap();
        assert_eq!(face_config.render.seed, Some(9));
        assert_eq!(builder.part_counts().get("head"), Some(&1));
    }

    #[test]
    fn open_layers_rejects_bad_config() {
        let tmp = layers_dir();
        fs::write(tmp.path().join(config::CONFIG_FILENAME), "[render]\nsed = 1\n").unwrap();
        assert!(open_layers(tmp.path()).is_err());
    }

    // =========================================================================
    // Commands
    // =========================================================================

    #[test]
    fn random_seed_flag_beats_config_seed() {
        let tmp = layers_dir();
        fs::write(tmp.path().join(config::CONFIG_FILENAME), "[render]\nseed = 1\n").unwrap();
        let out = tmp.path().join("face.png");

        let from_config = run_random(tmp.path(), None, &out, None).unwrap();
        assert_eq!(from_config, seeded_selection(tmp.path(), 1));

        let from_flag = run_random(tmp.path(), Some(77), &out, None).unwrap();
        assert_eq!(from_flag, seeded_selection(tmp.path(), 77));
    }

    #[test]
    fn random_selection_replays_through_compose() {
        let tmp = layers_dir();
        let random_png = tmp.path().join("out/random.png");
        let composed_png = tmp.path().join("out/composed.png");
        let saved = tmp.path().join("selection.json");

        let saved = Some(saved.as_path());

        let picked = run_random(tmp.path(), Some(5), &random_png, saved).unwrap();
        let replayed = run_compose(tmp.path(), Vec::new(), saved, &composed_png).unwrap();

        assert_eq!(replayed, picked);
        let random = image::open(&random_png).unwrap().to_rgba8();
        let composed = image::open(&composed_png).unwrap().to_rgba8();
        assert_eq!(random, composed);
    }

    #[test]
    fn compose_select_flags_override_saved_selection() {
        let tmp = layers_dir();
        let saved = tmp.path().join("selection.json");
        let first: Selection = [("head", 0), ("eyes", 0)].into_iter().collect();
        write_selection(&saved, &first).unwrap();

        let out = tmp.path().join("face.png");
        let select = vec![("eyes".to_string(), 2)];
        let chosen = run_compose(tmp.path(), select, Some(saved.as_path()), &out).unwrap();

        let expected: Selection = [("head", 0), ("eyes", 2)].into_iter().collect();
        assert_eq!(chosen, expected);
        // Opaque blue eyes (variant 3) cover the head
        let face = image::open(&out).unwrap().to_rgba8();
        assert_eq!(face.get_pixel(0, 0).0, [0, 0, 255, 255]);
    }

    #[test]
    fn save_face_skips_empty_result() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("face.png");
        save_face(None, &out).unwrap();
        assert!(!out.exists());
    }

    #[test]
    fn read_selection_drops_negative_entries() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("selection.json");
        fs::write(&path, r#"{"head": -1, "eyes": 1}"#).unwrap();
        let expected: Selection = [("eyes", 1)].into_iter().collect();
        assert_eq!(read_selection(&path).unwrap(), expected);
    }

    #[test]
    fn version_string_is_not_empty() {
        assert!(!version_string().is_empty());
    }

    // =========================================================================
    // Argument parsing
    // =========================================================================

    #[test]
    fn select_parses_category_and_index() {
        assert_eq!(parse_select("eyes=2"), Ok(("eyes".to_string(), 2)));
    }

    #[test]
    fn select_rejects_malformed() {
        assert!(parse_select("eyes").is_err());
        assert!(parse_select("=2").is_err());
        assert!(parse_select("eyes=-1").is_err());
        assert!(parse_select("eyes=two").is_err());
    }

    #[test]
    fn output_path_must_be_png() {
        assert_eq!(
            parse_output_path("out/Face.PNG"),
            Ok(PathBuf::from("out/Face.PNG"))
        );
        assert!(parse_output_path("face.jpg").is_err());
        assert!(parse_output_path("face").is_err());
    }

    #[test]
    fn cli_parses_compose_selects() {
        let cli = Cli::try_parse_from([
            "face-builder",
            "--layers",
            "art/layers",
            "compose",
            "--select",
            "head=1",
            "--select",
            "eyes=0",
            "-o",
            "npc.png",
        ])
        .unwrap();
        assert_eq!(cli.layers, PathBuf::from("art/layers"));
        match cli.command {
            Command::Compose { out, select, .. } => {
                assert_eq!(out.output, PathBuf::from("npc.png"));
                assert_eq!(
                    select,
                    vec![("head".to_string(), 1), ("eyes".to_string(), 0)]
                );
            }
            _ => panic!("expected compose"),
        }
    }
}
