//! qpcr_rq command-line interface

use std::io;

use clap::Parser;
use log::{info, LevelFilter};

use qpcr_rq::cli::{prompt_controls, prompt_housekeeping, Cli, Commands};
use qpcr_rq::io::{
    cleaned_sheet_name, default_cleaned_csv_name, default_report_name, with_default_extension,
};
use qpcr_rq::prelude::*;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    let result = match cli.command {
        Some(Commands::Clean {
            input,
            fluidigm,
            skip_rows,
            output,
            canonical,
            excel,
            preview,
            no_export,
        }) => run_clean(
            &input,
            fluidigm,
            skip_rows,
            output.as_deref(),
            canonical,
            excel.as_deref(),
            preview,
            no_export,
        ),
        Some(Commands::Rq {
            input,
            controls,
            housekeeping,
            output,
            json,
        }) => run_rq(
            &input,
            controls,
            housekeeping,
            output.as_deref(),
            json.as_deref(),
        ),
        None => {
            print_no_args();
            return;
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        if e.is_lookup_error() {
            eprintln!("Check control sample and housekeeping names against the matrix preview.");
        }
        std::process::exit(1);
    }
}

fn print_no_args() {
    println!("qpcr_rq v{}", VERSION);
    println!("Run `qpcr_rq clean -h` or `qpcr_rq rq -h` for usage.");
}

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
fn run_clean(
    input: &str,
    fluidigm: bool,
    skip_rows: Option<usize>,
    output: Option<&str>,
    canonical: bool,
    excel: Option<&str>,
    preview: usize,
    no_export: bool,
) -> Result<()> {
    let format = if fluidigm {
        ExportFormat::Fluidigm
    } else {
        ExportFormat::Generic
    };
    let params = CleanParams::new(format);

    let input_path = with_default_extension(input, "csv");
    let skip = skip_rows.unwrap_or_else(|| format.skip_rows());
    let table = read_raw_export(&input_path, skip)?;
    let matrix = clean_table(&table, &params)?;

    if preview > 0 {
        println!("{}", matrix.preview(preview));
    }

    if !no_export {
        let csv_path = match output {
            Some(name) => with_default_extension(name, "csv"),
            None => default_cleaned_csv_name(today()).into(),
        };
        if canonical {
            write_ct_matrix(&csv_path, &matrix)?;
        } else {
            write_regional_csv(&csv_path, &matrix)?;
        }
        info!("Wrote cleaned Ct matrix: {}", csv_path.display());
    }

    if let Some(excel_name) = excel {
        let xlsx_path = with_default_extension(excel_name, "xlsx");
        write_ct_matrix_xlsx(&xlsx_path, &matrix, &cleaned_sheet_name(excel_name))?;
    }

    Ok(())
}

fn run_rq(
    input: &str,
    controls: Vec<String>,
    housekeeping: Option<String>,
    output: Option<&str>,
    json: Option<&str>,
) -> Result<()> {
    let input_path = with_default_extension(input, "csv");
    let matrix = load_ct_matrix(&input_path)?;
    println!("{}", matrix.preview(5));

    let stdin = io::stdin();
    let mut input_lines = stdin.lock();
    let mut stdout = io::stdout();

    let controls = if controls.is_empty() {
        prompt_controls(&mut input_lines, &mut stdout)?
    } else {
        controls
    };
    let housekeeping = match housekeeping {
        Some(name) => name,
        None => prompt_housekeeping(&mut input_lines, &mut stdout)?,
    };

    let params = RqParams::new(controls, &housekeeping);
    let reports = calculate_rq(&matrix, &params)?;

    let xlsx_path = match output {
        Some(name) => with_default_extension(name, "xlsx"),
        None => with_default_extension(&default_report_name(today()), "xlsx"),
    };
    write_reports_xlsx(&xlsx_path, &reports)?;

    if let Some(json_path) = json {
        write_reports_json(json_path, &reports)?;
        info!("Wrote JSON reports: {}", json_path);
    }

    Ok(())
}
