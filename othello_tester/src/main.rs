// THEORY:
// `othello_tester` drives the `othello_vision` engine from the command line. It
// reads a board from still images (one, or many in parallel) and tracks the
// moves of a video, printing what it saw and writing the reports, annotated
// output and diagnostic masks into an output directory.
//
// The engine is blocking, so every job runs on a `spawn_blocking` worker while
// the async side waits for either the result or Ctrl-C. An interrupted job is
// abandoned: its result is discarded and the process exits with status 130.

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use futures::stream::{self, StreamExt};
use othello_vision::{
    annotate_frame, BoardGrid, BoardProcessor, BoardSize, DebugSink, DirectorySink, FrameSink,
    ImageReport, ImageSequence, ImageSequenceWriter, ProcessorConfig, VideoReport,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "othello_tester", version)]
#[command(about = "Read Othello positions from board images and track moves in videos")]
struct Cli {
    #[command(flatten)]
    opts: GlobalOpts,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read the position shown in one image.
    Image { path: PathBuf },

    /// Track the moves of a video file or a directory of frames.
    Video { path: PathBuf },

    /// Read many images concurrently.
    Batch {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

#[derive(Debug, Clone, Args)]
struct GlobalOpts {
    /// Board cells per side: 4 or 8.
    #[arg(long, global = true)]
    board_size: Option<u32>,

    /// Sample every Nth frame of a video.
    #[arg(long, global = true)]
    skip_frames: Option<u32>,

    /// Fraction of a cell that must match a piece color.
    #[arg(long, global = true)]
    color_threshold: Option<f64>,

    /// Summed frame difference above which a frame counts as moving.
    #[arg(long, global = true)]
    motion_threshold: Option<u64>,

    /// Width frames are resized to before the grid is read.
    #[arg(long, global = true)]
    resize_width: Option<u32>,

    /// JSON file with processor settings. Flags override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for reports, annotated output and masks.
    #[arg(long, global = true, default_value = "output")]
    output: PathBuf,

    /// Write a JSON report next to the other outputs.
    #[arg(long, global = true)]
    json: bool,

    /// Write annotated images or frames.
    #[arg(long, global = true)]
    annotate: bool,

    /// Write intermediate masks into `<output>/masks`.
    #[arg(long, global = true)]
    debug: bool,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

impl GlobalOpts {
    fn processor_config(&self) -> Result<ProcessorConfig> {
        let mut config = match &self.config {
            Some(path) => ProcessorConfig::from_json_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => ProcessorConfig::default(),
        };
        if let Some(size) = self.board_size {
            config.board_size = BoardSize::try_from(size)?;
        }
        if let Some(skip) = self.skip_frames {
            config.skip_frames = skip;
        }
        if let Some(threshold) = self.color_threshold {
            config.color_threshold = threshold;
        }
        if let Some(threshold) = self.motion_threshold {
            config.motion_threshold = threshold;
        }
        if let Some(width) = self.resize_width {
            config.resize_width = width;
        }
        config.validate()?;
        Ok(config)
    }

    fn outputs(&self) -> Outputs {
        Outputs {
            dir: self.output.clone(),
            json: self.json,
            annotate: self.annotate,
            debug: self.debug,
        }
    }
}

/// What to write for each job, and where.
#[derive(Debug, Clone)]
struct Outputs {
    dir: PathBuf,
    json: bool,
    annotate: bool,
    debug: bool,
}

impl Outputs {
    fn file(&self, stem: &str, suffix: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating {}", self.dir.display()))?;
        Ok(self.dir.join(format!("{stem}_{suffix}")))
    }

    fn debug_sink(&self) -> Result<Option<DirectorySink>> {
        if !self.debug {
            return Ok(None);
        }
        let sink = DirectorySink::new(self.dir.join("masks"))?;
        Ok(Some(sink))
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("input")
        .to_string()
}

/// Default log filter for the number of `-v` flags. `RUST_LOG` overrides it.
fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

fn init_logging(verbose: u8) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level(verbose)))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.opts.verbose);

    let config = cli.opts.processor_config()?;
    let processor = Arc::new(BoardProcessor::new(config)?);
    let outputs = cli.opts.outputs();

    match cli.command {
        Command::Image { path } => {
            let report = until_interrupted(blocking(move || read_image(&processor, &outputs, &path))).await?;
            print_image_report(&report)?;
        }
        Command::Video { path } => {
            let report = until_interrupted(blocking(move || track_video(&processor, &outputs, &path))).await?;
            print_video_report(&report);
        }
        Command::Batch { paths } => {
            let total = paths.len();
            let failed = until_interrupted(run_batch(processor, outputs, paths)).await?;
            if failed > 0 {
                bail!("{failed} of {total} images failed");
            }
        }
    }
    Ok(())
}

/// Runs `job` on the blocking pool.
async fn blocking<T, F>(job: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .context("worker thread panicked")?
}

/// Waits for `work` unless Ctrl-C comes first.
async fn until_interrupted<T>(work: impl std::future::Future<Output = Result<T>>) -> Result<T> {
    tokio::select! {
        result = work => result,
        signal = tokio::signal::ctrl_c() => {
            signal.context("listening for Ctrl-C")?;
            log::warn!("interrupted, abandoning the running job");
            // The runtime waits for running blocking workers on drop.
            std::process::exit(130);
        }
    }
}

/// Processes every image with at most one worker per CPU. Returns how many failed.
async fn run_batch(processor: Arc<BoardProcessor>, outputs: Outputs, paths: Vec<PathBuf>) -> Result<usize> {
    let workers = num_cpus::get().max(1);
    log::info!("reading {} images on {workers} workers", paths.len());

    let results: Vec<(PathBuf, Result<ImageReport>)> = stream::iter(paths)
        .map(|path| {
            let processor = Arc::clone(&processor);
            let outputs = outputs.clone();
            async move {
                let job_path = path.clone();
                let result = blocking(move || read_image(&processor, &outputs, &job_path)).await;
                (path, result)
            }
        })
        .buffer_unordered(workers)
        .collect()
        .await;

    let mut failed = 0;
    for (path, result) in results {
        match result {
            Ok(report) => println!("{}: {}", path.display(), report.state),
            Err(e) => {
                failed += 1;
                eprintln!("{}: {e:#}", path.display());
            }
        }
    }
    Ok(failed)
}

fn read_image(processor: &BoardProcessor, outputs: &Outputs, path: &Path) -> Result<ImageReport> {
    let mut debug = outputs.debug_sink()?;
    let report = processor.process_image(path, debug.as_mut().map(|s| s as &mut dyn DebugSink))?;
    let stem = file_stem(path);

    if outputs.json {
        let out = outputs.file(&stem, "result.json")?;
        std::fs::write(&out, report.to_json(true)?)
            .with_context(|| format!("writing {}", out.display()))?;
    }
    if outputs.annotate {
        let frame = image::open(path)
            .with_context(|| format!("reloading {}", path.display()))?
            .to_rgb8();
        let grid = BoardGrid::decode(&report.state, report.board_size)?;
        let out = outputs.file(&stem, "annotated.png")?;
        annotate_frame(&frame, &grid)
            .save(&out)
            .with_context(|| format!("writing {}", out.display()))?;
    }
    Ok(report)
}

fn track_video(processor: &BoardProcessor, outputs: &Outputs, path: &Path) -> Result<VideoReport> {
    let stem = file_stem(path);
    let mut debug = outputs.debug_sink()?;
    let debug = debug.as_mut().map(|s| s as &mut dyn DebugSink);

    let mut report = if path.is_dir() {
        let mut source = ImageSequence::from_dir(path)?;
        let annotated_dir = outputs.dir.join(format!("{stem}_annotated"));
        let mut writer = if outputs.annotate {
            Some(ImageSequenceWriter::create(&annotated_dir)?)
        } else {
            None
        };
        let mut report = processor.process_video(
            &mut source,
            writer.as_mut().map(|w| w as &mut dyn FrameSink),
            debug,
        )?;
        report.video_path = Some(path.to_path_buf());
        report.output_video = writer.map(|_| annotated_dir);
        report
    } else {
        track_video_file(processor, outputs, path, &stem, debug)?
    };
    if report.video_path.is_none() {
        report.video_path = Some(path.to_path_buf());
    }

    let moves = outputs.file(&stem, "moves.txt")?;
    std::fs::write(&moves, report.moves_as_text())
        .with_context(|| format!("writing {}", moves.display()))?;
    if outputs.json {
        let out = outputs.file(&stem, "result.json")?;
        std::fs::write(&out, report.to_json(true)?)
            .with_context(|| format!("writing {}", out.display()))?;
    }
    Ok(report)
}

#[cfg(feature = "video")]
fn track_video_file(
    processor: &BoardProcessor,
    outputs: &Outputs,
    path: &Path,
    stem: &str,
    debug: Option<&mut dyn DebugSink>,
) -> Result<VideoReport> {
    let annotated = if outputs.annotate {
        Some(outputs.file(stem, "annotated.mp4")?)
    } else {
        None
    };
    let report = processor
        .process_video_file(path, annotated.as_deref(), debug)
        .with_context(|| format!("tracking {}", path.display()))?;
    Ok(report)
}

#[cfg(not(feature = "video"))]
fn track_video_file(
    _processor: &BoardProcessor,
    _outputs: &Outputs,
    path: &Path,
    _stem: &str,
    _debug: Option<&mut dyn DebugSink>,
) -> Result<VideoReport> {
    bail!(
        "{} is not a frame directory; video files need the `video` feature",
        path.display()
    )
}

fn print_image_report(report: &ImageReport) -> Result<()> {
    let grid = BoardGrid::decode(&report.state, report.board_size)?;
    println!("{grid}");
    println!("State: {}", report.state);
    println!(
        "Pieces: {} black, {} white, {} empty",
        report.piece_count.black, report.piece_count.white, report.piece_count.empty
    );
    Ok(())
}

fn print_video_report(report: &VideoReport) {
    println!(
        "{} moves over {} frames",
        report.total_moves, report.total_frames
    );
    if !report.moves.is_empty() {
        println!("{}", report.moves_as_text());
    }
    if let Some(out) = &report.output_video {
        println!("Annotated output: {}", out.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_raises_the_log_level_from_info() {
        assert_eq!(log_level(0), "info");
        assert_eq!(log_level(1), "debug");
        assert_eq!(log_level(2), "trace");
        assert_eq!(log_level(5), "trace");
    }

    #[test]
    fn verbose_flag_is_counted_after_a_subcommand() {
        let cli = Cli::parse_from(["othello_tester", "image", "board.png", "-vv"]);
        assert_eq!(cli.opts.verbose, 2);
        assert_eq!(log_level(cli.opts.verbose), "trace");
    }
}
