//! Command line tool for the quevedo tagger.
//!
//! Applies auto-annotation results to stored records and prints record
//! summaries, going through the same editing session as the web editor.

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::path::{Path, PathBuf};

    use anyhow::{Context, Result, bail};
    use clap::Parser;

    use quevedo_tagger::config::TaggerConfig;
    use quevedo_tagger::model::{AnnotationId, AnnotationKind, AutoAnnotation};
    use quevedo_tagger::session::AnnotationSession;
    use quevedo_tagger::store::{AnnotationStore, JsonFileStore};

    #[derive(Parser, Debug)]
    #[clap(author, version, about, long_about = None)]
    struct Args {
        /// Configuration file (defaults to the user config directory)
        #[clap(long)]
        config: Option<PathBuf>,

        #[clap(subcommand)]
        cmd: Command,
    }

    #[derive(clap::Subcommand, Debug)]
    enum Command {
        /// Replace the boxes of a record with detections from a JSON file
        AutoAnnotate {
            /// Dataset root directory
            root: PathBuf,
            /// Record id, as <dir>/<num>
            id: AnnotationId,
            /// File with `{"symbols": [{"box": [...], "name": ...}], "tag_index": n}`
            detections: PathBuf,
            #[clap(long, value_enum, default_value_t = Kind::Transcription)]
            kind: Kind,
            /// Tag schema column names, comma separated
            #[clap(long, value_delimiter = ',')]
            columns: Vec<String>,
            /// Overwrite existing annotations
            #[clap(long)]
            force: bool,
        },
        /// Print a summary of a record
        Show {
            /// Dataset root directory
            root: PathBuf,
            /// Record id, as <dir>/<num>
            id: AnnotationId,
            #[clap(long, value_enum, default_value_t = Kind::Transcription)]
            kind: Kind,
            /// Tag schema column names, comma separated
            #[clap(long, value_delimiter = ',')]
            columns: Vec<String>,
        },
    }

    #[derive(clap::ValueEnum, Clone, Copy, Debug)]
    enum Kind {
        Transcription,
        Grapheme,
        Logogram,
    }

    impl From<Kind> for AnnotationKind {
        fn from(kind: Kind) -> Self {
            match kind {
                Kind::Transcription => AnnotationKind::Transcription,
                Kind::Grapheme => AnnotationKind::Grapheme,
                Kind::Logogram => AnnotationKind::Logogram,
            }
        }
    }

    fn load_config(path: Option<&Path>) -> TaggerConfig {
        match path {
            Some(path) => TaggerConfig::load_from(path),
            None => TaggerConfig::load_from_default_path(),
        }
        .unwrap_or_default()
    }

    fn open_session(
        store: &JsonFileStore,
        id: AnnotationId,
        kind: Kind,
        columns: Vec<String>,
        config: &TaggerConfig,
    ) -> Result<AnnotationSession> {
        let payload = store
            .load(&id)
            .with_context(|| format!("failed to load {}", id))?;
        Ok(AnnotationSession::builder(kind.into(), id)
            .columns(columns)
            .config(config)
            .build(payload))
    }

    fn auto_annotate(
        config: &TaggerConfig,
        root: PathBuf,
        id: AnnotationId,
        detections: &Path,
        kind: Kind,
        columns: Vec<String>,
        force: bool,
    ) -> Result<()> {
        let json = std::fs::read_to_string(detections)
            .with_context(|| format!("failed to read {:?}", detections))?;
        let result: AutoAnnotation = serde_json::from_str(&json)
            .with_context(|| format!("failed to parse {:?}", detections))?;

        let mut store = JsonFileStore::new(root);
        let mut session = open_session(&store, id, kind, columns, config)?;
        if session.needs_overwrite_confirmation() && !force {
            bail!(
                "{} already has {} annotated elements; pass --force to overwrite them",
                session.id(),
                session.elements().len()
            );
        }

        session.apply_auto_annotation(result);
        session.save_to(&mut store)?;
        println!(
            "{}: {} ({} elements)",
            session.id(),
            session.status(),
            session.elements().len()
        );
        Ok(())
    }

    fn show(
        config: &TaggerConfig,
        root: PathBuf,
        id: AnnotationId,
        kind: Kind,
        columns: Vec<String>,
    ) -> Result<()> {
        let store = JsonFileStore::new(root);
        let session = open_session(&store, id, kind, columns, config)?;

        println!("{} ({})", session.id(), session.kind().name());
        let notes = session.notes().get();
        if !notes.is_empty() {
            println!("notes: {}", notes);
        }
        for (i, element) in session.elements().borrow().iter().enumerate() {
            let bbox = element
                .bbox
                .map(|b| format!("[{:.3}, {:.3}, {:.3}, {:.3}]", b.cx, b.cy, b.w, b.h))
                .unwrap_or_else(|| "-".to_string());
            let tags = serde_json::to_string(&element.tags)?;
            println!("  {:>3} {} {} {}", i, session.color(i), bbox, tags);
        }
        for edge in session.edges().borrow().iter() {
            println!("  {} -> {} {}", edge.start, edge.end, serde_json::to_string(&edge.tags)?);
        }
        for (column, value) in session.tags().borrow().to_named(session.columns()) {
            println!("  tag {} = {}", column, value);
        }
        for (field, value) in session.meta().borrow().iter() {
            println!("  meta {} = {}", field, value);
        }
        Ok(())
    }

    pub fn run() -> Result<()> {
        let args = Args::parse();
        let config = load_config(args.config.as_deref());

        env_logger::Builder::new()
            .filter_level(config.log_level.to_level_filter())
            .parse_default_env()
            .init();

        match args.cmd {
            Command::AutoAnnotate {
                root,
                id,
                detections,
                kind,
                columns,
                force,
            } => auto_annotate(&config, root, id, &detections, kind, columns, force),
            Command::Show {
                root,
                id,
                kind,
                columns,
            } => show(&config, root, id, kind, columns),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    cli::run()
}

// WASM doesn't use main(), it uses wasm_bindgen's start function
#[cfg(target_arch = "wasm32")]
fn main() {}
