use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use medstat_rs::models::{AgeGroup, Gender, Region, SearchVariable, Sector};
use medstat_rs::scrape::Scraper;
use medstat_rs::viz::{self, RenderConfig};
use medstat_rs::{QueryBuilder, ResultTable, query, stats, storage};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "medstat",
    version,
    about = "Fetch, tabulate & chart medicine statistics from medstat.dk"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the valid option values for every query parameter.
    Options,
    /// Print the query URL for the given parameters.
    Url(QueryArgs),
    /// Fetch a table (and optionally save, plot, and print stats).
    Get(GetArgs),
}

#[derive(ValueEnum, Clone, Debug)]
enum OutFormat {
    Csv,
    Json,
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// ATC codes separated by comma or semicolon (e.g., N06A,N06AB)
    #[arg(short, long)]
    atc: Option<String>,
    /// Years separated by comma (1996-2023). Defaults to the three most recent.
    #[arg(short, long)]
    years: Option<String>,
    /// Region code (0 = Denmark, 1-5 = regions)
    #[arg(long, default_value = "0")]
    region: String,
    /// Sector code (0 = primary, 1 = hospital, 2 = total)
    #[arg(long, default_value = "0")]
    sector: String,
    /// Gender code(s): A, 1, 2 (comma separated for several)
    #[arg(long, default_value = "A")]
    gender: String,
    /// Age group: A or a comma separated list of ages (e.g., 15,16,17)
    #[arg(long, default_value = "A")]
    age_group: String,
    /// Measurement to retrieve (e.g., sold_volume, people_count)
    #[arg(long, default_value = "sold_volume")]
    search_variable: String,
}

#[derive(Args, Debug)]
struct GetArgs {
    #[command(flatten)]
    query: QueryArgs,
    /// Fetch this URL instead of building one from the query flags.
    #[arg(long, conflicts_with = "html")]
    url: Option<String>,
    /// Read a saved HTML page instead of fetching.
    #[arg(long)]
    html: Option<PathBuf>,
    /// Request timeout in seconds (no timeout by default).
    #[arg(long)]
    timeout: Option<u64>,
    /// Save the table to file (format inferred by --format or extension).
    #[arg(long)]
    out: Option<PathBuf>,
    /// Output format (csv or json). If omitted, inferred from --out extension.
    #[arg(long, value_enum)]
    format: Option<OutFormat>,
    /// Create a chart at the given path (.svg or .png).
    #[arg(long)]
    plot: Option<PathBuf>,
    /// Resolution of the saved chart.
    #[arg(long, default_value_t = viz::DEFAULT_DPI)]
    dpi: u32,
    /// Open the chart in the system image viewer.
    #[arg(long, default_value_t = false)]
    show: bool,
    /// Print per-code statistics to stdout.
    #[arg(long, default_value_t = false)]
    stats: bool,
}

fn fmt_opt(v: Option<f64>) -> String {
    match v {
        Some(x) if x.is_finite() => {
            // Format up to 4 decimals, then trim trailing zeros and trailing dot.
            let s = format!("{:.4}", x);
            s.trim_end_matches('0').trim_end_matches('.').to_string()
        }
        _ => "NA".to_string(),
    }
}

fn parse_list(s: &str) -> Vec<String> {
    s.split([',', ';'])
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

fn build_url(args: &QueryArgs) -> Result<String> {
    let atc = args
        .atc
        .as_deref()
        .map(parse_list)
        .ok_or_else(|| anyhow::anyhow!("--atc is required unless --url or --html is given"))?;

    let parsed = (|| -> medstat_rs::Result<QueryBuilder> {
        let genders = parse_list(&args.gender)
            .iter()
            .map(|g| g.parse::<Gender>())
            .collect::<medstat_rs::Result<Vec<_>>>()?;
        let mut builder = QueryBuilder::new(atc)
            .region(args.region.parse::<Region>()?)
            .sector(args.sector.parse::<Sector>()?)
            .genders(genders)
            .age_group(args.age_group.parse::<AgeGroup>()?)
            .search_variable(args.search_variable.parse::<SearchVariable>()?);
        if let Some(years) = &args.years {
            builder = builder.years(parse_list(years));
        }
        Ok(builder)
    })();

    let builder = parsed.inspect_err(|e| {
        eprintln!("\nError: {e}");
        query::print_options();
    })?;
    Ok(builder.generate_url()?)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Options => {
            print!("{}", query::options_table());
            Ok(())
        }
        Command::Url(args) => {
            println!("{}", build_url(&args)?);
            Ok(())
        }
        Command::Get(args) => cmd_get(args),
    }
}

fn load_table(args: &GetArgs) -> Result<ResultTable> {
    if let Some(path) = &args.html {
        let html = std::fs::read_to_string(path)
            .with_context(|| format!("read {}", path.display()))?;
        let mut scraper = Scraper::from_html(path.display().to_string(), html);
        return Ok(scraper.run()?);
    }

    let url = match &args.url {
        Some(u) => u.clone(),
        None => build_url(&args.query)?,
    };
    let config = medstat_rs::scrape::FetchConfig {
        timeout: args.timeout.map(std::time::Duration::from_secs),
        ..Default::default()
    };
    let mut scraper = Scraper::with_config(url, config);
    Ok(scraper.run()?)
}

fn cmd_get(args: GetArgs) -> Result<()> {
    let table = load_table(&args)?;

    if let Some(path) = args.out.as_ref() {
        let fmt = match args.format {
            Some(OutFormat::Csv) => "csv",
            Some(OutFormat::Json) => "json",
            None => path.extension().and_then(|e| e.to_str()).unwrap_or("csv"),
        }
        .to_ascii_lowercase();
        match fmt.as_str() {
            "csv" => storage::save_csv(&table, path)?,
            "json" => storage::save_json(&table, path)?,
            other => anyhow::bail!("unsupported format: {}", other),
        }
        eprintln!("Saved {} rows to {}", table.len(), path.display());
    }

    if args.plot.is_some() || args.show {
        let fig = viz::render(&table, &RenderConfig::default())?;
        if let Some(plot_path) = args.plot.as_ref() {
            fig.save(plot_path, args.dpi)?;
            eprintln!("Wrote plot to {}", plot_path.display());
        }
        if args.show {
            let preview = fig.show()?;
            eprintln!("Opened preview {}", preview.display());
        }
    }

    if args.stats {
        for s in stats::row_summaries(&table) {
            println!(
                "{}  count={} missing={}  min={} max={} mean={} median={}",
                s.atc_code,
                s.count,
                s.missing,
                fmt_opt(s.min),
                fmt_opt(s.max),
                fmt_opt(s.mean),
                fmt_opt(s.median)
            );
        }
    }

    if args.out.is_none() && args.plot.is_none() && !args.show && !args.stats {
        print!("{table}");
    }

    Ok(())
}
