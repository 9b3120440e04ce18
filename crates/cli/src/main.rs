//! landmix CLI - land-use diversity from OpenStreetMap points of interest

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use geo_types::Geometry;
use geojson::{GeoJson, JsonValue};
use landmix_algorithms::entropy::{category_counts, parse_metrics, MetricName};
use landmix_algorithms::pipeline::{AreaAmenityPipeline, PipelineOptions};
use landmix_algorithms::spatial::SpatialEntropyParams;
use landmix_cloud::blocking::OverpassSource;
use landmix_cloud::{OverpassClientOptions, OverpassEndpoint};
use landmix_core::{
    BoundingBox, CategoryLevel, RawRecord, RecordSource, StaticSource, TaxonomyClassifier,
    TaxonomyTable,
};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "landmix")]
#[command(author, version, about = "Land-use diversity from points of interest", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a single tag set
    Classify {
        /// Taxonomy table (CSV)
        #[arg(short, long)]
        taxonomy: PathBuf,
        /// Tags as key=value, repeatable
        #[arg(long = "tag", required = true)]
        tags: Vec<String>,
    },
    /// Compute entropy metrics for one area
    Entropy {
        #[command(flatten)]
        run: RunArgs,
        /// GeoJSON file with a Polygon or MultiPolygon (geometry, feature or first feature of a collection)
        #[arg(short, long)]
        area: PathBuf,
        /// Comma-separated metric names
        #[arg(short, long, value_delimiter = ',', default_value = "L0_shannon,L1_shannon,L0_altieri,L1_altieri,L0_leibovici,L1_leibovici")]
        metrics: Vec<String>,
    },
    /// Count categories inside one area after filtering
    Categorize {
        #[command(flatten)]
        run: RunArgs,
        /// GeoJSON file with a Polygon or MultiPolygon
        #[arg(short, long)]
        area: PathBuf,
    },
    /// Compute entropy metrics for every feature of a collection
    Batch {
        #[command(flatten)]
        run: RunArgs,
        /// GeoJSON FeatureCollection of areas
        #[arg(long)]
        areas: PathBuf,
        /// Feature property used as the row name
        #[arg(long, default_value = "name")]
        name_property: String,
        /// Output CSV file
        #[arg(short, long)]
        output: PathBuf,
        /// Comma-separated metric names
        #[arg(short, long, value_delimiter = ',', default_value = "L0_shannon,L1_shannon,L0_altieri,L1_altieri,L0_leibovici,L1_leibovici")]
        metrics: Vec<String>,
    },
}

/// Inputs shared by every command that runs the pipeline
#[derive(Args)]
struct RunArgs {
    /// Taxonomy table (CSV)
    #[arg(short, long)]
    taxonomy: PathBuf,
    /// Filter profile: 0, 1 or 2
    #[arg(short, long, default_value = "0")]
    filter: u8,
    /// Overpass endpoint: main, kumi, or an interpreter URL
    #[arg(short, long, default_value = "main")]
    endpoint: String,
    /// Request timeout in seconds
    #[arg(long, default_value = "60")]
    timeout: u64,
    /// Retries on transient failures
    #[arg(long, default_value = "3")]
    retries: u32,
    /// Read records from a saved Overpass JSON response instead of querying
    #[arg(long)]
    records: Option<PathBuf>,
    /// Leibovici neighbourhood distance, in degrees of lon/lat
    /// (0.001 is roughly 100 m)
    #[arg(long, default_value = "10.0")]
    leibovici_distance: f64,
    /// Number of Altieri distance classes
    #[arg(long, default_value = "3")]
    altieri_cut: usize,
}

// ─── Record source ──────────────────────────────────────────────────────

enum Source {
    Overpass(OverpassSource),
    Saved(StaticSource),
}

impl RecordSource for Source {
    fn fetch_amenities(&self, bbox: &BoundingBox) -> landmix_core::Result<Vec<RawRecord>> {
        match self {
            Self::Overpass(s) => s.fetch_amenities(bbox),
            Self::Saved(s) => s.fetch_amenities(bbox),
        }
    }

    fn fetch_buildings(&self, bbox: &BoundingBox) -> landmix_core::Result<Vec<RawRecord>> {
        match self {
            Self::Overpass(s) => s.fetch_buildings(bbox),
            Self::Saved(s) => s.fetch_buildings(bbox),
        }
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn load_classifier(path: &Path) -> Result<TaxonomyClassifier> {
    let table = TaxonomyTable::from_path(path)
        .with_context(|| format!("Failed to read taxonomy {}", path.display()))?;
    info!("Taxonomy: {} rows, {} primary tags", table.len(), table.primary_tags().len());
    Ok(TaxonomyClassifier::new(Arc::new(table)))
}

fn build_pipeline(args: &RunArgs) -> Result<AreaAmenityPipeline<Source>> {
    let classifier = load_classifier(&args.taxonomy)?;

    let source = match &args.records {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read records {}", path.display()))?;
            Source::Saved(StaticSource::from_overpass_json(&json).context("Failed to parse records")?)
        }
        None => {
            let endpoint = OverpassEndpoint::from_str_or_url(&args.endpoint);
            info!("Endpoint: {}", endpoint);
            let options = OverpassClientOptions {
                request_timeout: Duration::from_secs(args.timeout),
                max_retries: args.retries,
            };
            Source::Overpass(OverpassSource::new(endpoint, options).context("Failed to create Overpass client")?)
        }
    };

    let options = PipelineOptions {
        spatial: SpatialEntropyParams {
            leibovici_distance: args.leibovici_distance,
            altieri_cut: args.altieri_cut,
            ..Default::default()
        },
    };
    AreaAmenityPipeline::new(source, classifier, options).context("Invalid pipeline options")
}

fn read_geojson(path: &Path) -> Result<GeoJson> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    text.parse::<GeoJson>()
        .with_context(|| format!("Invalid GeoJSON in {}", path.display()))
}

fn to_geometry(geometry: geojson::Geometry) -> Result<Geometry<f64>> {
    Geometry::<f64>::try_from(geometry).context("Unsupported GeoJSON geometry")
}

/// A single area: a bare geometry, a feature, or the first feature of a collection
fn read_area(path: &Path) -> Result<Geometry<f64>> {
    let geometry = match read_geojson(path)? {
        GeoJson::Geometry(g) => g,
        GeoJson::Feature(f) => f.geometry.context("Feature has no geometry")?,
        GeoJson::FeatureCollection(fc) => {
            if fc.features.len() > 1 {
                warn!("{} features in {}, using the first", fc.features.len(), path.display());
            }
            fc.features
                .into_iter()
                .next()
                .and_then(|f| f.geometry)
                .context("FeatureCollection has no feature with a geometry")?
        }
    };
    to_geometry(geometry)
}

/// Named areas from a feature collection
fn read_areas(path: &Path, name_property: &str) -> Result<Vec<(String, Geometry<f64>)>> {
    let GeoJson::FeatureCollection(fc) = read_geojson(path)? else {
        anyhow::bail!("{} is not a FeatureCollection", path.display());
    };

    fc.features
        .into_iter()
        .enumerate()
        .map(|(i, feature)| {
            let name = match feature.property(name_property) {
                Some(JsonValue::String(s)) => s.clone(),
                Some(JsonValue::Null) | None => format!("area_{i}"),
                Some(other) => other.to_string(),
            };
            let geometry = feature
                .geometry
                .with_context(|| format!("Feature {name} has no geometry"))?;
            Ok((name, to_geometry(geometry)?))
        })
        .collect()
}

fn parse_tags(tags: &[String]) -> Result<HashMap<String, String>> {
    tags.iter()
        .map(|t| {
            let (key, value) = t
                .split_once('=')
                .with_context(|| format!("Tag must be 'key=value', got: {t}"))?;
            Ok((key.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

fn print_counts(title: &str, counts: &BTreeMap<String, usize>) {
    println!("{title}:");
    for (category, count) in counts {
        println!("  {category:<40} {count:>6}");
    }
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        // ── Classify ─────────────────────────────────────────────────
        Commands::Classify { taxonomy, tags } => {
            let classifier = load_classifier(&taxonomy)?;
            let tags = parse_tags(&tags)?;
            let c = classifier.classify(&tags);

            println!("Primary tag:   {}", c.primary_tag.as_deref().unwrap_or("-"));
            println!("Secondary tag: {}", c.secondary_tag.as_deref().unwrap_or("-"));
            println!("L0 category:   {}", c.l0);
            println!("L1 category:   {}", c.l1);
        }

        // ── Entropy ──────────────────────────────────────────────────
        Commands::Entropy { run, area, metrics } => {
            let area = read_area(&area)?;
            let pipeline = build_pipeline(&run)?;

            let pb = spinner("Computing entropies...");
            let start = Instant::now();
            let result = pipeline
                .compute_area_entropies(&area, run.filter, &metrics)
                .context("Failed to compute entropies")?;
            pb.finish_and_clear();

            for (metric, value) in result.iter() {
                println!("{:<14} {:.6}", metric.to_string(), value);
            }
            println!("  Processing time: {:.2?}", start.elapsed());
        }

        // ── Categorize ───────────────────────────────────────────────
        Commands::Categorize { run, area } => {
            let area = read_area(&area)?;
            let pipeline = build_pipeline(&run)?;

            let pb = spinner("Categorizing...");
            let records = pipeline
                .categorize(&area, run.filter)
                .context("Failed to categorize")?;
            pb.finish_and_clear();

            println!("{} records after filter level {}", records.len(), run.filter);
            print_counts("L0", &category_counts(&records, CategoryLevel::L0));
            print_counts("L1", &category_counts(&records, CategoryLevel::L1));
        }

        // ── Batch ────────────────────────────────────────────────────
        Commands::Batch {
            run,
            areas,
            name_property,
            output,
            metrics,
        } => {
            let metric_names: Vec<MetricName> = parse_metrics(&metrics)?;
            let areas = read_areas(&areas, &name_property)?;
            let pipeline = build_pipeline(&run)?;
            info!("{} areas, {} metrics", areas.len(), metric_names.len());

            let mut writer = csv::Writer::from_path(&output)
                .with_context(|| format!("Failed to create {}", output.display()))?;
            let mut header = vec!["name".to_string()];
            header.extend(metric_names.iter().map(MetricName::to_string));
            writer.write_record(&header)?;

            let pb = ProgressBar::new(areas.len() as u64);
            if let Ok(style) = ProgressStyle::default_bar().template("{bar:40.green} {pos}/{len} {msg}") {
                pb.set_style(style);
            }

            let start = Instant::now();
            let mut failed = 0usize;
            // One area at a time: public Overpass instances rate-limit per client
            for (name, area) in &areas {
                pb.set_message(name.clone());
                match pipeline.compute_area_entropies(area, run.filter, &metrics) {
                    Ok(result) => {
                        let mut row = vec![name.clone()];
                        row.extend(result.values().iter().map(|v| v.to_string()));
                        writer.write_record(&row)?;
                    }
                    Err(e) => {
                        warn!("Skipping {}: {}", name, e);
                        failed += 1;
                    }
                }
                pb.inc(1);
            }
            pb.finish_and_clear();
            writer.flush()?;

            println!("Results saved to: {}", output.display());
            if failed > 0 {
                println!("  Skipped areas: {}", failed);
            }
            println!("  Processing time: {:.2?}", start.elapsed());
        }
    }

    Ok(())
}
