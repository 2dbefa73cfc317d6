use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use firma_scraper::batch::{run_batch, BatchOptions, RecordOutcome};
use firma_scraper::generate::{CompanyProfile, EmailWriter, GeminiClient, GenerateError, PromptBook};
use firma_scraper::output::{write_output, OutputFormat, SiteReport};
use firma_scraper::sheet::{default_output_path, ColumnMapping, Sheet};
use firma_scraper::url_utils::normalize;
use firma_scraper::{CompanyRecord, CompanyScraper, Config, ExtractorOptions, Field, ScraperError};

/// CLI arguments
#[derive(Parser, Debug)]
#[command(name = "firma-scraper")]
#[command(about = "Find company websites and scrape their contact details", long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Write log output to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process a CSV company table and write the results back
    Run {
        /// Input CSV with at least the name and website columns
        input: PathBuf,

        /// Output CSV (default: <input>_updated.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Do not search for companies without a website
        #[arg(long)]
        no_search: bool,

        /// Which search result to use, 0 = first
        #[arg(long, default_value = "0")]
        result_index: usize,

        /// Minimum delay between website fetches in seconds
        #[arg(long)]
        delay_min: Option<f64>,

        /// Maximum delay between website fetches in seconds
        #[arg(long)]
        delay_max: Option<f64>,

        /// Output field to leave untouched (email, instagram, linkedin, phone, address, about)
        #[arg(long = "skip", value_parser = parse_field)]
        skip: Vec<Field>,

        /// Custom email regex
        #[arg(long)]
        email_pattern: Option<String>,

        /// Custom phone regex (can specify multiple)
        #[arg(long = "phone-pattern")]
        phone_patterns: Vec<String>,

        /// Company name column header
        #[arg(long)]
        name_column: Option<String>,

        /// Website column header
        #[arg(long)]
        url_column: Option<String>,
    },

    /// Scrape contact details from one or more websites
    Scrape {
        /// URL(s) to scrape (can provide multiple)
        #[arg(required = true)]
        urls: Vec<String>,

        /// Output format: json, csv, or text
        #[arg(short, long, default_value = "json")]
        format: String,

        /// Save output to file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Find the website of a company by name
    Find {
        name: String,

        /// Which search result to use, 0 = first
        #[arg(long, default_value = "0")]
        result_index: usize,

        /// Number of results requested from the search engine
        #[arg(long)]
        max_results: Option<usize>,
    },

    /// Extract a company website from a Facebook, Instagram or LinkedIn profile
    Resolve { profile_url: String },

    /// Draft a company analysis and sales email
    Email {
        #[arg(long)]
        name: String,

        #[arg(long)]
        website: Option<String>,

        #[arg(long)]
        about: Option<String>,

        /// Find and scrape the website first to fill in missing details
        #[arg(long)]
        scrape: bool,

        /// Gemini API key (overrides the config file, GEMINI_API_KEY and api_key.txt)
        #[arg(long)]
        api_key: Option<String>,
    },
}

fn parse_field(s: &str) -> Result<Field, String> {
    Field::parse(s).ok_or_else(|| format!("unknown field '{}'", s))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    log::info!("Firma Scraper v{}", env!("CARGO_PKG_VERSION"));

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    match args.command {
        Command::Run {
            input,
            output,
            no_search,
            result_index,
            delay_min,
            delay_max,
            skip,
            email_pattern,
            phone_patterns,
            name_column,
            url_column,
        } => {
            let mut config = config;
            if let Some(min) = delay_min {
                config.delay_min_secs = min;
            }
            if let Some(max) = delay_max {
                config.delay_max_secs = max;
            }
            config.validate()?;

            let mut columns = ColumnMapping::default();
            if let Some(name) = name_column {
                columns.name = name;
            }
            if let Some(url) = url_column {
                columns.website = url;
            }

            let phones = if phone_patterns.is_empty() {
                &config.phone_patterns
            } else {
                &phone_patterns
            };
            let extractors = ExtractorOptions::new(
                Some(email_pattern.as_deref().unwrap_or(&config.email_pattern)),
                Some(phones.as_slice()),
            )?;

            let skip: BTreeSet<Field> = skip.into_iter().collect();
            let options = BatchOptions {
                columns,
                fields: Field::ALL.into_iter().filter(|f| !skip.contains(f)).collect(),
                search_missing: !no_search,
                result_index,
                extractors,
                checkpoint_every: config.checkpoint_every,
            };

            let output = output.unwrap_or_else(|| default_output_path(&input));
            run_table(config, &input, &output, &options, args.quiet).await?;
        }

        Command::Scrape {
            urls,
            format,
            output,
        } => {
            let format: OutputFormat = format.parse()?;
            for url in &urls {
                if normalize(url).is_none() {
                    return Err(ScraperError::InvalidUrl(url.clone()).into());
                }
            }

            let options = ExtractorOptions::from_config(&config)?;
            let scraper = CompanyScraper::new(config)?;
            log::info!("Scraping {} URL(s)", urls.len());

            let mut reports = Vec::with_capacity(urls.len());
            for (i, url) in urls.iter().enumerate() {
                let data = scraper.scrape_with(url, &options).await;
                reports.push(SiteReport {
                    url: url.clone(),
                    data,
                });

                if i + 1 < urls.len() {
                    let delay = scraper.config().fetch_delay();
                    log::debug!("Waiting {:.1}s before next request", delay.as_secs_f64());
                    tokio::time::sleep(delay).await;
                }
            }

            write_output(&reports, format, output.as_deref())?;
            let with_data = reports.iter().filter(|r| !r.data.is_empty()).count();
            log::info!("Scraped {} site(s), {} with contact data", reports.len(), with_data);
        }

        Command::Find {
            name,
            result_index,
            max_results,
        } => {
            if name.trim().is_empty() {
                return Err(ScraperError::EmptyCompanyName.into());
            }
            let max_results = max_results.unwrap_or(config.max_results);
            let scraper = CompanyScraper::new(config)?;
            match scraper.find_website(&name, result_index, max_results).await {
                Some(url) => println!("{}", url),
                None => println!("No website found for {}", name),
            }
        }

        Command::Resolve { profile_url } => {
            let scraper = CompanyScraper::new(config)?;
            match scraper.resolve_website_from_social_profile(&profile_url).await {
                Some(url) => println!("{}", url),
                None => println!("No website found on {}", profile_url),
            }
        }

        Command::Email {
            name,
            website,
            about,
            scrape,
            api_key,
        } => {
            if name.trim().is_empty() {
                return Err(ScraperError::EmptyCompanyName.into());
            }
            let prompts = match &config.generative.prompt_file {
                Some(path) => PromptBook::load(Path::new(path))?,
                None => PromptBook::default(),
            };
            let mut client = GeminiClient::new(&config.generative);
            if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
                client = client.with_api_key(key.trim());
            }
            if !client.is_configured() {
                return Err(GenerateError::NotConfigured).context(
                    "Set generative.api_key in the config, GEMINI_API_KEY, api_key.txt or --api-key",
                );
            }

            let mut company = CompanyProfile {
                name: name.clone(),
                website,
                about,
            };
            if scrape {
                let options = ExtractorOptions::from_config(&config)?;
                let scraper = CompanyScraper::new(config)?;
                let record = CompanyRecord::new(name, company.website.clone());
                let (found, data) = scraper.process_record(&record, 0, &options).await;
                company.website = found;
                if company.about.is_none() {
                    company.about = data.about_text;
                }
            }

            let writer = EmailWriter::new(&client, prompts);
            let analysis = writer
                .analyze(&company)
                .await
                .context("Company analysis failed")?;
            let email = writer
                .write_email(&company, &analysis)
                .await
                .context("Email generation failed")?;

            println!("== Analysis ==\n{}\n\n== Email ==\n{}", analysis.trim(), email.trim());
        }
    }

    Ok(())
}

async fn run_table(
    config: Config,
    input: &Path,
    output: &Path,
    options: &BatchOptions,
    quiet: bool,
) -> Result<()> {
    let mut sheet = Sheet::read_csv(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    log::info!("Loaded {} rows from {}", sheet.len(), input.display());

    let scraper = CompanyScraper::new(config)?;

    let stop = Arc::new(AtomicBool::new(false));
    let stop_on_signal = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Ctrl+C received, stopping after the current company");
            stop_on_signal.store(true, Ordering::SeqCst);
        }
    });

    let summary = run_batch(&scraper, &mut sheet, output, options, stop, |report| {
        if quiet {
            return;
        }
        let status = match report.outcome {
            RecordOutcome::Skipped => "skipped".to_string(),
            RecordOutcome::NoWebsite => "no website".to_string(),
            RecordOutcome::Scraped if report.fields_found.is_empty() => "no data".to_string(),
            RecordOutcome::Scraped => report
                .fields_found
                .iter()
                .map(Field::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        };
        println!(
            "[{}/{}] {} - {}",
            report.row + 1,
            report.total,
            report.name,
            status
        );
    })
    .await?;

    if summary.stopped {
        log::warn!("Batch stopped early; partial results saved to {}", output.display());
    }
    println!(
        "Processed {} companies ({} skipped, {} websites found by search, {} with data) in {:.1}s -> {}",
        summary.processed,
        summary.skipped,
        summary.found_via_search,
        summary.rows_with_data,
        summary.elapsed.as_secs_f64(),
        output.display()
    );
    Ok(())
}

fn init_logging(args: &Args) -> Result<()> {
    let log_level = if args.verbose {
        "debug"
    } else if args.quiet {
        "error"
    } else {
        "info"
    };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level));

    if let Some(path) = &args.log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.init();
    Ok(())
}
