use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use songpst::dataset::{load_syllable_csv, present_songs, song_sequences_simple};
use songpst::{ExportOptions, Pst, PstConfig};

#[derive(Parser, Debug)]
#[command(name = "songpst", about = "Probabilistic suffix trees for birdsong syllable sequences")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Learn a tree from a song corpus and print the retained contexts.
    Train {
        /// Corpus file: one song per line (whitespace-separated syllables),
        /// or a `.csv` syllable annotation table.
        corpus: PathBuf,
        /// Maximum context length L.
        #[arg(long, default_value_t = 3)]
        order: usize,
        /// Minimum context probability for exploration.
        #[arg(long, default_value_t = 0.00073)]
        p_min: f64,
        /// Smoothing floor per symbol.
        #[arg(long, default_value_t = 0.01)]
        g_min: f64,
        /// Divergence ratio threshold.
        #[arg(long, default_value_t = 1.6)]
        r: f64,
        /// Frequency-adequacy multiplier.
        #[arg(long, default_value_t = 17.5)]
        alpha: f64,
        /// Score with raw instead of smoothed distributions.
        #[arg(long)]
        no_smoothing: bool,
        /// Also write Cytoscape files into this directory.
        #[arg(long)]
        export_dir: Option<PathBuf>,
    },
    /// Learn a tree from a training corpus, then score held-out songs.
    Score {
        /// Training corpus file.
        corpus: PathBuf,
        /// Songs to score (same format).
        heldout: PathBuf,
        /// Maximum context length L.
        #[arg(long, default_value_t = 3)]
        order: usize,
        /// Minimum context probability for exploration.
        #[arg(long, default_value_t = 0.00073)]
        p_min: f64,
        /// Smoothing floor per symbol.
        #[arg(long, default_value_t = 0.01)]
        g_min: f64,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train {
            corpus,
            order,
            p_min,
            g_min,
            r,
            alpha,
            no_smoothing,
            export_dir,
        } => {
            let config = PstConfig {
                max_order: order,
                p_min,
                g_min,
                r,
                alpha,
                smoothing: !no_smoothing,
            };
            run_train(corpus, config, export_dir)?
        }
        Commands::Score {
            corpus,
            heldout,
            order,
            p_min,
            g_min,
        } => {
            let config = PstConfig {
                max_order: order,
                p_min,
                g_min,
                ..PstConfig::trainer_defaults(order)
            };
            run_score(corpus, heldout, config)?
        }
    }

    Ok(())
}

fn run_train(corpus_path: PathBuf, config: PstConfig, export_dir: Option<PathBuf>) -> Result<()> {
    let songs = read_song_file(&corpus_path)
        .with_context(|| format!("failed to read corpus from {}", corpus_path.display()))?;
    let model = Pst::fit(&songs, config).context("learning failed")?;

    println!(
        "{} songs, {} syllable types, {} retained contexts",
        songs.len(),
        model.alphabet().len(),
        model.tree().node_count()
    );
    println!("depth\tcontext\tinternal\tp\tf");
    for (at, node) in model.tree().iter() {
        println!(
            "{}\t{}\t{}\t{:.4}\t{}",
            at.depth,
            node.label,
            if node.internal { "yes" } else { "no" },
            node.context_probability,
            node.occurrence_count
        );
    }

    if let Some(dir) = export_dir {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        let files = model
            .export_cytoscape(&dir, &ExportOptions::default())
            .context("Cytoscape export failed")?;
        println!(
            "wrote {}, {}, {}",
            files.sif.display(),
            files.noa.display(),
            files.script.display()
        );
    }

    Ok(())
}

fn run_score(corpus_path: PathBuf, heldout_path: PathBuf, config: PstConfig) -> Result<()> {
    let songs = read_song_file(&corpus_path)
        .with_context(|| format!("failed to read corpus from {}", corpus_path.display()))?;
    let model = Pst::fit(&songs, config).context("learning failed")?;

    let heldout = read_song_file(&heldout_path)
        .with_context(|| format!("failed to read songs from {}", heldout_path.display()))?;

    for (idx, song) in heldout.iter().enumerate() {
        let ll = model
            .log_likelihood(song)
            .with_context(|| format!("scoring failed for song {}", idx + 1))?;
        let nats = model.cross_entropy(song)?;
        println!(
            "song {}\tsyllables={}\tlog_likelihood={:.4}\tcross_entropy={:.4}",
            idx + 1,
            song.len(),
            ll,
            nats
        );
    }

    Ok(())
}

fn read_song_file(path: &PathBuf) -> Result<Vec<Vec<String>>> {
    if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv")) {
        let records = load_syllable_csv(path)?;
        return Ok(song_sequences_simple(&present_songs(&records)));
    }
    let reader = BufReader::new(File::open(path)?);
    let mut songs = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let song: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        if !song.is_empty() {
            songs.push(song);
        }
    }
    Ok(songs)
}
