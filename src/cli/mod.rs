//! Command-line interface for qpcr_rq

use std::io::{self, BufRead, Write};

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "qpcr_rq")]
#[command(version)]
#[command(about = "qPCR Ct cleaning and relative quantification (ddCt)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Clean an instrument export into a sample x gene Ct matrix
    #[command(
        long_about = "Clean an instrument export into a sample x gene Ct matrix.\n\n\
            Water blanks (H2O/H20) are removed, unreadable Ct values and Ct > 50\n\
            become missing, and technical replicates are numbered GENE_1, GENE_2, ...",
        after_long_help = "\
Examples:
  # Generic export, regional CSV named after today's date
  qpcr_rq clean -i run42.csv

  # Fluidigm export, canonical CSV for the rq subcommand plus an Excel copy
  qpcr_rq clean -i chip7.csv --fluidigm --canonical -o chip7_ct --excel chip7"
    )]
    Clean {
        /// Path to the instrument export CSV
        #[arg(short, long)]
        input: String,

        /// Input is a Fluidigm export (Name / Name.1 / Value columns)
        #[arg(long)]
        fluidigm: bool,

        /// Preamble lines before the header [default: 36 generic, 11 Fluidigm]
        #[arg(long, value_name = "N")]
        skip_rows: Option<usize>,

        /// Output CSV file [default: "{date} Cleaned_Fluidigm_data.csv"]
        #[arg(short, long)]
        output: Option<String>,

        /// Write the canonical layout (`,` separated, `.` decimal) instead of the regional one
        #[arg(long,
            long_help = "Write the canonical layout read by the rq subcommand:\n\
                `,` separated, `.` decimal, full precision.\n\
                Without this flag the CSV is `;` separated with a decimal comma\n\
                and two decimals (rq reads both).")]
        canonical: bool,

        /// Also write an Excel workbook "<NAME>.xlsx" with sheet "Cleaned <NAME>"
        #[arg(long, value_name = "NAME")]
        excel: Option<String>,

        /// Number of rows to preview on stdout (0 disables) [default: 5]
        #[arg(long, default_value = "5")]
        preview: usize,

        /// Do not write the CSV export
        #[arg(long)]
        no_export: bool,
    },

    /// Compute relative expression (RQ) per target gene
    #[command(
        long_about = "Compute relative expression (RQ) per target gene with the ddCt method.\n\n\
            Columns containing the housekeeping name are averaged as reference;\n\
            every other gene gets its own sheet in the output workbook.\n\
            Controls and housekeeping gene are asked for interactively when not given.",
        after_long_help = "\
Examples:
  qpcr_rq rq -i cleaned.csv -c Ctrl1 Ctrl2 Ctrl3 -k Gapdh
  qpcr_rq rq -i cleaned.csv -k Actb -o results --json results.json"
    )]
    Rq {
        /// Path to the Ct matrix CSV
        #[arg(short, long)]
        input: String,

        /// Control sample(s); the first carries the summary means
        #[arg(short, long, num_args = 1..)]
        controls: Vec<String>,

        /// Housekeeping gene (matched as a substring of column names)
        #[arg(short = 'k', long)]
        housekeeping: Option<String>,

        /// Output workbook [default: "Auswertung Realtime {date}.xlsx"]
        #[arg(short, long)]
        output: Option<String>,

        /// Also write all reports as JSON
        #[arg(long, value_name = "PATH")]
        json: Option<String>,
    },
}

/// Ask a question and return the trimmed answer line
pub fn prompt<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> io::Result<String> {
    write!(output, "{}", question)?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Ask for whitespace separated control samples
pub fn prompt_controls<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<Vec<String>> {
    let answer = prompt(input, output, "Control samples (separated by space): ")?;
    Ok(answer.split_whitespace().map(String::from).collect())
}

/// Ask for the housekeeping gene name
pub fn prompt_housekeeping<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<String> {
    prompt(input, output, "What is the name of the housekeeping gene: ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_prompt_controls() {
        let mut input = Cursor::new("Ctrl1  Ctrl2\tCtrl3\n");
        let mut output = Vec::new();
        let controls = prompt_controls(&mut input, &mut output).unwrap();
        assert_eq!(controls, vec!["Ctrl1", "Ctrl2", "Ctrl3"]);
        assert!(String::from_utf8(output).unwrap().starts_with("Control samples"));
    }

    #[test]
    fn test_prompt_housekeeping_trims() {
        let mut input = Cursor::new(" Gapdh \r\n");
        let mut output = Vec::new();
        assert_eq!(prompt_housekeeping(&mut input, &mut output).unwrap(), "Gapdh");
    }

    #[test]
    fn test_parse_rq_command() {
        let cli = Cli::try_parse_from([
            "qpcr_rq", "rq", "-i", "m.csv", "-c", "C1", "C2", "-k", "Gapdh",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Rq { controls, housekeeping, .. }) => {
                assert_eq!(controls, vec!["C1", "C2"]);
                assert_eq!(housekeeping.as_deref(), Some("Gapdh"));
            }
            _ => panic!("expected rq subcommand"),
        }
    }

    #[test]
    fn test_parse_clean_command() {
        let cli = Cli::try_parse_from(["qpcr_rq", "-v", "clean", "-i", "x.csv", "--fluidigm"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Some(Commands::Clean { fluidigm, preview, skip_rows, .. }) => {
                assert!(fluidigm);
                assert_eq!(preview, 5);
                assert_eq!(skip_rows, None);
            }
            _ => panic!("expected clean subcommand"),
        }
    }
}
